//! wizardwatch main entry point.
//!
//! A looping pixel-art scene reacting to coding-agent activity, built with:
//! - **raylib** for windowing and graphics
//! - **bevy_ecs** for resources, messages and the per-frame schedule
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (CLI flags override it) and resolve the scene
//! 2. Build the ECS world and schedule, start the event feed and asset loader
//! 3. Every frame: update window size, tick the [`GameLoop`], upload finished
//!    images and draw the scene
//! 4. While the window is minimised, events are still applied so the scene is
//!    current when it reappears
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --demo
//! agent-log | cargo run --release -- --events -
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};
use raylib::prelude::{Color, RaylibDraw};

use wizardwatch::app::{build_schedule, build_world, step};
use wizardwatch::gameloop::{Clock, Frame, GameLoop, ManualClock, SystemClock};
use wizardwatch::render::recording::RecordingCanvas;
use wizardwatch::resources::assetloader::{AssetLoader, shutdown_asset_loader};
use wizardwatch::resources::eventfeed::{EventFeed, FeedSource};
use wizardwatch::resources::gameconfig::GameConfig;
use wizardwatch::resources::scenecatalog::SceneCatalog;
use wizardwatch::resources::scenemanager::SceneManager;
use wizardwatch::resources::windowsize::WindowSize;
use wizardwatch::systems::assets::{RaylibUploader, request_scene_assets, upload_loaded_assets};
use wizardwatch::systems::render::{render_frame, render_to_window};

/// A wizard that acts out what your coding agent is doing.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (default: ./config.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Scene to show; overrides the config file.
    #[arg(long, value_name = "ID")]
    scene: Option<String>,

    /// Read JSON-lines events from a file, or from stdin with `-`.
    #[arg(long, value_name = "PATH|-", conflicts_with = "demo")]
    events: Option<String>,

    /// Play a scripted demo session in a loop.
    #[arg(long)]
    demo: bool,

    /// Speed factor for the demo session.
    #[arg(long, default_value_t = 1.0)]
    demo_speed: f32,

    /// List the built-in scenes and exit.
    #[arg(long)]
    list_scenes: bool,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    write_config: bool,

    /// Run N frames without a window and print a summary.
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let catalog = SceneCatalog::builtin();

    if cli.list_scenes {
        for id in catalog.ids() {
            if let Ok(scene) = catalog.get(id) {
                println!("{:<12} {}", id, scene.title);
            }
        }
        return;
    }

    let mut config = match &cli.config {
        Some(path) => GameConfig::with_path(path),
        None => GameConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        if cli.config.is_some() {
            warn!("{}; using defaults", e);
        } else {
            info!("no config file ({}), using defaults", e);
        }
    }
    if let Some(scene) = &cli.scene {
        config.scene_id = scene.clone();
    }

    if cli.write_config {
        if let Err(e) = config.save_to_file() {
            error!("{}", e);
            std::process::exit(1);
        }
        return;
    }

    let scene_config = match catalog.get(&config.scene_id) {
        Ok(scene) => scene.clone(),
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let mut world = match build_world(&config, scene_config) {
        Ok(world) => world,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let schedule = match build_schedule(&mut world) {
        Ok(schedule) => schedule,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let source = if cli.demo {
        Some(FeedSource::Demo {
            speed: cli.demo_speed,
        })
    } else {
        cli.events.as_deref().map(FeedSource::from_arg)
    };
    match source.map(EventFeed::spawn) {
        Some(Ok(feed)) => {
            world.insert_resource(feed);
        }
        Some(Err(e)) => {
            error!("{}", e);
            std::process::exit(1);
        }
        None => info!("no event source; pass --events PATH|- or --demo"),
    }

    match cli.headless {
        Some(frames) => run_headless(world, schedule, frames),
        None => run_window(world, schedule, &config),
    }
}

/// Step the scene with a manual clock at 60 fps, drawing into a recording canvas.
fn run_headless(mut world: World, mut schedule: Schedule, frames: u32) {
    world.resource_mut::<SceneManager>().activate(0.0);

    let drawn = Rc::new(Cell::new(0usize));
    let mut game_loop: GameLoop<World, ManualClock> = GameLoop::new(ManualClock::new());
    game_loop.on_update(move |world: &mut World, frame: &Frame| step(world, &mut schedule, frame));
    let counter = Rc::clone(&drawn);
    game_loop.on_render(move |world: &mut World, _frame: &Frame| {
        let mut canvas = RecordingCanvas::new();
        render_frame(world, &mut canvas);
        counter.set(counter.get() + canvas.ops().len());
    });

    game_loop.start();
    game_loop.tick(&mut world, true);
    for _ in 0..frames {
        game_loop.clock().advance(1.0 / 60.0);
        game_loop.tick(&mut world, true);
    }
    game_loop.stop();

    let scene = world.resource::<SceneManager>();
    println!(
        "{} frames, {} draw ops, state={}, particles={}, status='{}'",
        game_loop.frames(),
        drawn.get(),
        scene.state(),
        scene.particles().active_count(),
        scene.status()
    );
}

fn run_window(mut world: World, schedule: Schedule, config: &GameConfig) {
    let mut builder = raylib::init();
    builder
        .size(config.window_width as i32, config.window_height as i32)
        .resizable()
        .title("wizardwatch");
    if config.vsync {
        builder.vsync();
    }
    if config.fullscreen {
        builder.fullscreen();
    }
    let (mut rl, thread) = builder.build();
    rl.set_target_fps(config.target_fps);

    world.insert_resource(AssetLoader::spawn());
    request_scene_assets(&mut world);

    let clock = SystemClock::new();
    world.resource_mut::<SceneManager>().activate(clock.now());

    // Shared with the hidden-window path so message cursors stay in one place.
    let schedule = Rc::new(RefCell::new(schedule));
    let mut game_loop: GameLoop<World, SystemClock> = GameLoop::new(clock);
    let looped = Rc::clone(&schedule);
    game_loop.on_update(move |world: &mut World, frame: &Frame| {
        step(world, &mut looped.borrow_mut(), frame)
    });
    game_loop.start();

    while !rl.window_should_close() {
        {
            let mut window = world.resource_mut::<WindowSize>();
            window.w = rl.get_screen_width();
            window.h = rl.get_screen_height();
        }
        let visible = !rl.is_window_minimized() && !rl.is_window_hidden();
        game_loop.tick(&mut world, visible);

        if visible {
            let mut uploader = RaylibUploader {
                rl: &mut rl,
                thread: &thread,
            };
            upload_loaded_assets(&mut world, &mut uploader);
            render_to_window(&world, &mut rl, &thread);
        } else {
            let frame = Frame {
                dt: 0.0,
                now: game_loop.clock().now(),
                fps: 0.0,
            };
            step(&mut world, &mut schedule.borrow_mut(), &frame);
            // raylib only polls window events at the end of a drawing scope.
            let mut d = rl.begin_drawing(&thread);
            d.clear_background(Color::BLACK);
        }
    }
    game_loop.stop();

    world.resource_mut::<SceneManager>().destroy();
    shutdown_asset_loader(&mut world);
}

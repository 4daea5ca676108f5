//! Scene integration tests: events through the schedule, drawing, deferred
//! actions and asset generations with a manual clock.

use bevy_ecs::prelude::*;
use crossbeam_channel::Sender;

use wizardwatch::app::{build_schedule, build_world, step};
use wizardwatch::components::animationstate::AnimationState;
use wizardwatch::components::transition::TransitionKind;
use wizardwatch::events::agentevent::{AgentEvent, EventKind};
use wizardwatch::gameloop::{Clock, Frame, ManualClock};
use wizardwatch::render::canvas::DrawLayer;
use wizardwatch::render::recording::RecordingCanvas;
use wizardwatch::resources::assetloader::{AssetLoader, LoadedAsset};
use wizardwatch::resources::assetstore::{AssetStore, ImageInfo};
use wizardwatch::resources::eventfeed::EventFeed;
use wizardwatch::resources::gameconfig::GameConfig;
use wizardwatch::resources::scenecatalog::SceneCatalog;
use wizardwatch::resources::scenemanager::{ENTER_IDLE_DELAY, SceneManager, VICTORY_BANNER_DELAY};
use wizardwatch::resources::texturestore::TextureStore;
use wizardwatch::systems::assets::{TextureUploader, upload_loaded_assets};
use wizardwatch::systems::render::render_frame;

const DT: f64 = 1.0 / 60.0;

struct Harness {
    world: World,
    schedule: Schedule,
    clock: ManualClock,
    events: Sender<AgentEvent>,
}

impl Harness {
    fn new(scene: &str) -> Self {
        let config = GameConfig::new();
        let scene = SceneCatalog::builtin().get(scene).unwrap().clone();
        let mut world = build_world(&config, scene).unwrap();
        let (feed, events) = EventFeed::manual();
        world.insert_resource(feed);
        let schedule = build_schedule(&mut world).unwrap();
        world.resource_mut::<SceneManager>().activate(0.0);
        Self {
            world,
            schedule,
            clock: ManualClock::new(),
            events,
        }
    }

    fn frame(&mut self) {
        self.clock.advance(DT);
        let frame = Frame {
            dt: DT as f32,
            now: self.clock.now(),
            fps: 60.0,
        };
        step(&mut self.world, &mut self.schedule, &frame);
    }

    fn run(&mut self, seconds: f64) {
        let frames = (seconds / DT).ceil() as usize;
        for _ in 0..frames {
            self.frame();
        }
    }

    fn send(&mut self, event: AgentEvent) {
        self.events.send(event).unwrap();
        self.frame();
    }

    fn scene(&self) -> &SceneManager {
        self.world.resource::<SceneManager>()
    }

    fn draw(&self) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        render_frame(&self.world, &mut canvas);
        canvas
    }
}

#[test]
fn event_sequence_drives_states() {
    let mut h = Harness::new("library");
    let mut seen = Vec::new();
    for event in [
        AgentEvent::new(EventKind::SessionStart),
        AgentEvent::tool_use("Edit"),
        AgentEvent::new(EventKind::Error).with_message("build failed"),
        AgentEvent::tool_use("Bash"),
    ] {
        h.send(event);
        seen.push(h.scene().state());
    }
    assert_eq!(
        seen,
        vec![
            AnimationState::Enter,
            AnimationState::Inscribe,
            AnimationState::Stagger,
            AnimationState::Forge,
        ]
    );
    assert!(h.scene().status().contains("Bash"));
}

#[test]
fn several_events_in_one_frame_apply_in_order() {
    let mut h = Harness::new("forge");
    h.events.send(AgentEvent::tool_use("Read")).unwrap();
    h.events.send(AgentEvent::tool_use("Write")).unwrap();
    h.frame();
    assert_eq!(h.scene().state(), AnimationState::Inscribe);
    // Consumed once; the next frame sees nothing new.
    h.frame();
    assert_eq!(h.scene().state(), AnimationState::Inscribe);
}

#[test]
fn layers_follow_fixed_order_and_balance() {
    let mut h = Harness::new("observatory");
    h.run(0.5);
    h.send(AgentEvent::new(EventKind::Error));
    let canvas = h.draw();
    assert_eq!(canvas.depth(), 0);
    assert_eq!(canvas.layers(), DrawLayer::ORDER.to_vec());
}

#[test]
fn entry_falls_back_to_idle_unless_superseded() {
    let mut h = Harness::new("library");
    let entry = TransitionKind::Entry.total_duration() as f64;
    h.run(entry + ENTER_IDLE_DELAY + 0.2);
    assert_eq!(h.scene().state(), AnimationState::Idle);

    // Restart, then act during the walk-in: the pending fallback must not fire.
    h.send(AgentEvent::new(EventKind::SessionStart));
    h.run(entry + 0.1);
    assert_eq!(h.scene().state(), AnimationState::Enter);
    h.send(AgentEvent::tool_use("Grep"));
    h.run(ENTER_IDLE_DELAY + 0.5);
    assert_eq!(h.scene().state(), AnimationState::Read);
}

#[test]
fn superseded_victory_shows_no_banner() {
    let mut h = Harness::new("forge");
    h.run(4.0);
    h.send(AgentEvent::new(EventKind::TaskComplete));
    assert_eq!(h.scene().state(), AnimationState::Victory);
    h.send(AgentEvent::tool_use("Edit"));
    h.run(VICTORY_BANNER_DELAY + 0.2);
    assert_ne!(h.scene().transition().kind(), Some(TransitionKind::Victory));
    assert_eq!(h.scene().deferred_count(), 0);
}

#[test]
fn session_end_plays_death_once() {
    let mut h = Harness::new("library");
    h.run(4.0);
    h.send(AgentEvent::new(EventKind::SessionEnd));
    assert_eq!(h.scene().state(), AnimationState::Exit);
    assert_eq!(h.scene().transition().kind(), Some(TransitionKind::Death));

    h.run(TransitionKind::Death.total_duration() as f64 + 0.2);
    assert!(!h.scene().transition().is_active());
    h.run(2.0);
    assert!(!h.scene().transition().is_active());
    assert_eq!(h.scene().state(), AnimationState::Exit);
}

struct CountingUploader {
    calls: usize,
}

impl TextureUploader for CountingUploader {
    fn upload(
        &mut self,
        _: &mut TextureStore,
        _: &str,
        _: &[u8],
        _: &str,
    ) -> Result<ImageInfo, String> {
        self.calls += 1;
        Ok(ImageInfo {
            width: 320,
            height: 180,
        })
    }
}

#[test]
fn loads_from_a_destroyed_scene_are_dropped() {
    let mut h = Harness::new("library");
    let (loader, _cmds, loaded) = AssetLoader::detached();
    h.world.insert_resource(loader);

    let old = h.scene().generation();
    h.world.resource_mut::<SceneManager>().destroy();
    loaded
        .send(LoadedAsset {
            key: "bg_library".to_string(),
            path: "backgrounds/library.png".into(),
            generation: old,
            bytes: Ok(vec![0x89, b'P', b'N', b'G']),
        })
        .unwrap();

    let mut uploader = CountingUploader { calls: 0 };
    assert_eq!(upload_loaded_assets(&mut h.world, &mut uploader), 0);
    assert_eq!(uploader.calls, 0);
    assert!(h.world.resource::<AssetStore>().image_slot("bg_library").is_none());

    // A destroyed scene also ignores further events.
    h.send(AgentEvent::tool_use("Bash"));
    assert!(!h.scene().is_active());
    assert_ne!(h.scene().state(), AnimationState::Forge);
}

//! Static scene configuration.
//!
//! A scene is pure data: palette, where the wizard stands for each state,
//! lights, particle emitters, props and the optional image assets. The
//! [`SceneManager`](crate::resources::scenemanager::SceneManager) is built
//! from one [`SceneConfig`]; nothing here changes at runtime.
//!
//! Built-in scenes: `library`, `forge`, `observatory`. All of them are
//! authored for a 320x180 world with the floor line at [`FLOOR_Y`].

use raylib::prelude::{Color, Vector2};
use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::components::animationstate::AnimationState;
use crate::components::light::Light;
use crate::components::particles::{EmitterConfig, EmitterShape};

/// Feet line of the character, in world units.
pub const FLOOR_Y: f32 = 150.0;
/// Most lights a scene may register.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("unknown scene '{id}' (available: {known})")]
    UnknownScene { id: String, known: String },
    #[error("scene '{scene}' has no action positions")]
    NoActions { scene: String },
    #[error("scene '{scene}': action position for {state} at ({x}, {y}) is outside the world")]
    ActionOutOfBounds {
        scene: String,
        state: AnimationState,
        x: f32,
        y: f32,
    },
    #[error("scene '{scene}' defines {count} lights, at most {max} are supported")]
    TooManyLights {
        scene: String,
        count: usize,
        max: usize,
    },
    #[error("scene '{scene}': emitter {index} is invalid: {reason}")]
    InvalidEmitter {
        scene: String,
        index: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub wall_top: Color,
    pub wall_bottom: Color,
    pub floor_a: Color,
    pub floor_b: Color,
    pub fog: Color,
    /// Darkness laid over the scene before lights are added.
    pub ambient: Color,
    pub vignette: Color,
    pub letterbox: Color,
    pub text: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    Bookshelf,
    Desk,
    Candle,
    Lectern,
    Rug,
    Armchair,
    Anvil,
    Furnace,
    Barrel,
    Telescope,
    StarChart,
    Orrery,
    Window,
}

impl PropKind {
    pub const ALL: [PropKind; 13] = [
        PropKind::Bookshelf,
        PropKind::Desk,
        PropKind::Candle,
        PropKind::Lectern,
        PropKind::Rug,
        PropKind::Armchair,
        PropKind::Anvil,
        PropKind::Furnace,
        PropKind::Barrel,
        PropKind::Telescope,
        PropKind::StarChart,
        PropKind::Orrery,
        PropKind::Window,
    ];

    /// Sprite key in the asset store.
    pub fn key(self) -> &'static str {
        match self {
            PropKind::Bookshelf => "prop_bookshelf",
            PropKind::Desk => "prop_desk",
            PropKind::Candle => "prop_candle",
            PropKind::Lectern => "prop_lectern",
            PropKind::Rug => "prop_rug",
            PropKind::Armchair => "prop_armchair",
            PropKind::Anvil => "prop_anvil",
            PropKind::Furnace => "prop_furnace",
            PropKind::Barrel => "prop_barrel",
            PropKind::Telescope => "prop_telescope",
            PropKind::StarChart => "prop_starchart",
            PropKind::Orrery => "prop_orrery",
            PropKind::Window => "prop_window",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropLayer {
    /// Behind the character.
    Back,
    /// In front of the character.
    Fore,
}

/// A prop anchored at its bottom centre.
#[derive(Debug, Clone, Copy)]
pub struct Prop {
    pub kind: PropKind,
    pub position: Vector2,
    pub layer: PropLayer,
}

/// Background image, optionally a horizontal strip of animation frames.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundAsset {
    pub key: String,
    /// Relative to the configured assets directory.
    pub path: String,
    pub frame_count: u32,
    /// Wall-clock seconds per frame.
    pub frame_interval: f64,
}

impl BackgroundAsset {
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// Character sheet image.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetAsset {
    pub key: String,
    pub path: String,
    pub cell_width: u32,
    pub cell_height: u32,
}

/// Soft glow painted into the procedural background.
#[derive(Debug, Clone, Copy)]
pub struct Glow {
    pub position: Vector2,
    pub radius: f32,
    pub color: Color,
}

/// Extra procedural background detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    None,
    /// Tall arched windows.
    Arches,
    /// Brick courses on the wall.
    Bricks,
    /// A starfield through an open dome.
    Stars,
}

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub palette: Palette,
    /// Off-stage position the character starts each session from.
    pub spawn: Vector2,
    pub actions: FxHashMap<AnimationState, Vector2>,
    pub lights: Vec<Light>,
    pub emitters: SmallVec<[EmitterConfig; 4]>,
    /// Burst spawned around the character on an error.
    pub stagger_burst: EmitterConfig,
    /// Burst spawned around the character on victory.
    pub victory_burst: EmitterConfig,
    pub props: Vec<Prop>,
    pub glows: SmallVec<[Glow; 4]>,
    pub decoration: Decoration,
    pub background: Option<BackgroundAsset>,
    pub sheet: Option<SheetAsset>,
}

impl SceneConfig {
    /// Check construction-time invariants against the world size.
    pub fn validate(&self, world_width: f32, world_height: f32) -> Result<(), SceneError> {
        if self.actions.is_empty() {
            return Err(SceneError::NoActions {
                scene: self.id.clone(),
            });
        }
        let mut actions: Vec<_> = self.actions.iter().collect();
        actions.sort_by_key(|(state, _)| state.as_str());
        for (state, pos) in actions {
            let inside =
                pos.x >= 0.0 && pos.x <= world_width && pos.y >= 0.0 && pos.y <= world_height;
            if !inside {
                return Err(SceneError::ActionOutOfBounds {
                    scene: self.id.clone(),
                    state: *state,
                    x: pos.x,
                    y: pos.y,
                });
            }
        }
        if self.lights.len() > MAX_LIGHTS {
            return Err(SceneError::TooManyLights {
                scene: self.id.clone(),
                count: self.lights.len(),
                max: MAX_LIGHTS,
            });
        }
        for (index, e) in self.emitters.iter().enumerate() {
            let reason = if e.rate < 0.0 {
                Some("negative rate")
            } else if e.lifetime_min <= 0.0 || e.lifetime_max < e.lifetime_min {
                Some("lifetime range must be positive and ordered")
            } else if e.speed_max < e.speed_min || e.size_max < e.size_min {
                Some("min exceeds max")
            } else if e.colors.is_empty() {
                Some("empty palette")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SceneError::InvalidEmitter {
                    scene: self.id.clone(),
                    index,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Registry of the static scene configurations.
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    scenes: Vec<SceneConfig>,
}

impl SceneCatalog {
    pub fn builtin() -> Self {
        Self {
            scenes: vec![library(), forge(), observatory()],
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Result<&SceneConfig, SceneError> {
        let wanted = id.trim().to_ascii_lowercase();
        self.scenes
            .iter()
            .find(|s| s.id == wanted)
            .ok_or_else(|| SceneError::UnknownScene {
                id: id.to_string(),
                known: self.ids().join(", "),
            })
    }
}

fn at(x: f32, y: f32) -> Vector2 {
    Vector2 { x, y }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::new(r, g, b, 255)
}

fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
    Color::new(r, g, b, a)
}

fn prop(kind: PropKind, x: f32, y: f32, layer: PropLayer) -> Prop {
    Prop {
        kind,
        position: at(x, y),
        layer,
    }
}

fn wizard_sheet() -> Option<SheetAsset> {
    Some(SheetAsset {
        key: "wizard_sheet".to_string(),
        path: "sprites/wizard_sheet.png".to_string(),
        cell_width: 32,
        cell_height: 32,
    })
}

fn sparks(color: Color) -> EmitterConfig {
    EmitterConfig {
        angle: 0.0,
        spread: 140.0,
        speed_min: 30.0,
        speed_max: 70.0,
        colors: smallvec![color, rgb(255, 255, 255)],
        lifetime_min: 0.3,
        lifetime_max: 0.7,
        gravity: 120.0,
        size_min: 1.0,
        size_max: 2.0,
        ..Default::default()
    }
}

fn library() -> SceneConfig {
    let actions = [
        (AnimationState::Idle, at(160.0, FLOOR_Y)),
        (AnimationState::Enter, at(40.0, FLOOR_Y)),
        (AnimationState::Inscribe, at(96.0, FLOOR_Y)),
        (AnimationState::Read, at(44.0, FLOOR_Y)),
        (AnimationState::Forge, at(262.0, FLOOR_Y)),
        (AnimationState::Meditate, at(160.0, FLOOR_Y + 4.0)),
        (AnimationState::Rest, at(214.0, FLOOR_Y)),
        (AnimationState::Victory, at(160.0, FLOOR_Y)),
    ];
    SceneConfig {
        id: "library".to_string(),
        title: "The Library".to_string(),
        subtitle: "a new session begins".to_string(),
        palette: Palette {
            wall_top: rgb(28, 22, 44),
            wall_bottom: rgb(52, 38, 62),
            floor_a: rgb(74, 50, 38),
            floor_b: rgb(62, 42, 32),
            fog: rgba(140, 120, 180, 40),
            ambient: rgba(10, 6, 24, 110),
            vignette: rgb(4, 2, 10),
            letterbox: rgb(0, 0, 0),
            text: rgb(236, 222, 180),
        },
        spawn: at(-24.0, FLOOR_Y),
        actions: actions.into_iter().collect(),
        lights: vec![
            Light::new(96.0, 118.0, 46.0, rgb(255, 180, 90), 0.7).with_flicker(0.25, 0.0),
            Light::new(230.0, 110.0, 40.0, rgb(255, 170, 80), 0.6).with_flicker(0.3, 2.1),
            Light::new(160.0, 40.0, 70.0, rgb(150, 160, 255), 0.35),
        ],
        emitters: smallvec![EmitterConfig {
            rate: 4.0,
            origin: at(160.0, 90.0),
            shape: EmitterShape::Rect {
                width: 300.0,
                height: 120.0,
            },
            angle: 0.0,
            spread: 360.0,
            speed_min: 1.0,
            speed_max: 4.0,
            colors: smallvec![rgba(255, 240, 200, 255), rgba(200, 190, 255, 255)],
            lifetime_min: 3.0,
            lifetime_max: 6.0,
            gravity: -0.5,
            size_min: 1.0,
            size_max: 1.0,
            max_particles: Some(40),
            alpha_max: Some(0.5),
        }],
        stagger_burst: sparks(rgb(190, 120, 255)),
        victory_burst: sparks(rgb(255, 220, 120)),
        props: vec![
            prop(PropKind::Window, 160.0, 84.0, PropLayer::Back),
            prop(PropKind::Bookshelf, 24.0, FLOOR_Y - 2.0, PropLayer::Back),
            prop(PropKind::Bookshelf, 58.0, FLOOR_Y - 2.0, PropLayer::Back),
            prop(PropKind::Desk, 100.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Candle, 92.0, FLOOR_Y - 16.0, PropLayer::Back),
            prop(PropKind::Rug, 160.0, FLOOR_Y + 8.0, PropLayer::Back),
            prop(PropKind::Armchair, 226.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Candle, 230.0, FLOOR_Y - 24.0, PropLayer::Back),
            prop(PropKind::Lectern, 280.0, FLOOR_Y + 12.0, PropLayer::Fore),
        ],
        glows: smallvec![Glow {
            position: at(160.0, 60.0),
            radius: 60.0,
            color: rgba(120, 130, 220, 90),
        }],
        decoration: Decoration::Arches,
        background: Some(BackgroundAsset {
            key: "bg_library".to_string(),
            path: "backgrounds/library.png".to_string(),
            frame_count: 1,
            frame_interval: 0.15,
        }),
        sheet: wizard_sheet(),
    }
}

fn forge() -> SceneConfig {
    let actions = [
        (AnimationState::Idle, at(150.0, FLOOR_Y)),
        (AnimationState::Enter, at(36.0, FLOOR_Y)),
        (AnimationState::Inscribe, at(60.0, FLOOR_Y)),
        (AnimationState::Read, at(84.0, FLOOR_Y)),
        (AnimationState::Forge, at(214.0, FLOOR_Y)),
        (AnimationState::Meditate, at(150.0, FLOOR_Y + 4.0)),
        (AnimationState::Rest, at(110.0, FLOOR_Y)),
        (AnimationState::Victory, at(160.0, FLOOR_Y)),
    ];
    SceneConfig {
        id: "forge".to_string(),
        title: "The Forge".to_string(),
        subtitle: "the anvil awaits".to_string(),
        palette: Palette {
            wall_top: rgb(30, 18, 16),
            wall_bottom: rgb(60, 30, 22),
            floor_a: rgb(52, 46, 44),
            floor_b: rgb(42, 38, 36),
            fog: rgba(200, 110, 60, 36),
            ambient: rgba(20, 6, 4, 120),
            vignette: rgb(10, 2, 0),
            letterbox: rgb(0, 0, 0),
            text: rgb(255, 200, 140),
        },
        spawn: at(-24.0, FLOOR_Y),
        actions: actions.into_iter().collect(),
        lights: vec![
            Light::new(262.0, 122.0, 80.0, rgb(255, 120, 40), 0.85).with_flicker(0.35, 0.0),
            Light::new(214.0, 136.0, 30.0, rgb(255, 200, 120), 0.4).with_flicker(0.5, 1.3),
            Light::new(60.0, 110.0, 36.0, rgb(255, 170, 80), 0.5).with_flicker(0.2, 3.0),
        ],
        emitters: smallvec![
            EmitterConfig {
                rate: 14.0,
                origin: at(262.0, 120.0),
                shape: EmitterShape::Rect {
                    width: 20.0,
                    height: 4.0,
                },
                angle: 0.0,
                spread: 50.0,
                speed_min: 18.0,
                speed_max: 40.0,
                colors: smallvec![rgb(255, 200, 80), rgb(255, 120, 40), rgb(255, 80, 20)],
                lifetime_min: 0.8,
                lifetime_max: 1.8,
                gravity: -12.0,
                size_min: 1.0,
                size_max: 2.0,
                max_particles: Some(90),
                alpha_max: Some(0.9),
            },
            EmitterConfig {
                rate: 2.0,
                origin: at(262.0, 96.0),
                shape: EmitterShape::Rect {
                    width: 12.0,
                    height: 2.0,
                },
                angle: 0.0,
                spread: 30.0,
                speed_min: 6.0,
                speed_max: 10.0,
                colors: smallvec![rgba(90, 80, 80, 255)],
                lifetime_min: 2.0,
                lifetime_max: 3.5,
                gravity: -2.0,
                size_min: 3.0,
                size_max: 5.0,
                max_particles: Some(12),
                alpha_max: Some(0.3),
            },
        ],
        stagger_burst: sparks(rgb(255, 90, 40)),
        victory_burst: sparks(rgb(255, 220, 120)),
        props: vec![
            prop(PropKind::Furnace, 262.0, FLOOR_Y, PropLayer::Back),
            prop(PropKind::Barrel, 300.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Desk, 62.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Candle, 56.0, FLOOR_Y - 16.0, PropLayer::Back),
            prop(PropKind::Bookshelf, 90.0, FLOOR_Y - 2.0, PropLayer::Back),
            prop(PropKind::Anvil, 226.0, FLOOR_Y + 6.0, PropLayer::Fore),
            prop(PropKind::Barrel, 18.0, FLOOR_Y + 10.0, PropLayer::Fore),
        ],
        glows: smallvec![Glow {
            position: at(262.0, 110.0),
            radius: 70.0,
            color: rgba(255, 110, 40, 110),
        }],
        decoration: Decoration::Bricks,
        background: Some(BackgroundAsset {
            key: "bg_forge".to_string(),
            path: "backgrounds/forge.png".to_string(),
            frame_count: 4,
            frame_interval: 0.15,
        }),
        sheet: wizard_sheet(),
    }
}

fn observatory() -> SceneConfig {
    let actions = [
        (AnimationState::Idle, at(170.0, FLOOR_Y)),
        (AnimationState::Enter, at(40.0, FLOOR_Y)),
        (AnimationState::Inscribe, at(90.0, FLOOR_Y)),
        (AnimationState::Read, at(246.0, FLOOR_Y)),
        (AnimationState::Forge, at(130.0, FLOOR_Y)),
        (AnimationState::Meditate, at(170.0, FLOOR_Y + 4.0)),
        (AnimationState::Rest, at(56.0, FLOOR_Y)),
        (AnimationState::Victory, at(170.0, FLOOR_Y)),
    ];
    SceneConfig {
        id: "observatory".to_string(),
        title: "The Observatory".to_string(),
        subtitle: "the stars are listening".to_string(),
        palette: Palette {
            wall_top: rgb(8, 10, 30),
            wall_bottom: rgb(26, 30, 62),
            floor_a: rgb(40, 44, 70),
            floor_b: rgb(32, 36, 60),
            fog: rgba(120, 150, 255, 30),
            ambient: rgba(4, 6, 20, 100),
            vignette: rgb(0, 0, 8),
            letterbox: rgb(0, 0, 0),
            text: rgb(200, 220, 255),
        },
        spawn: at(-24.0, FLOOR_Y),
        actions: actions.into_iter().collect(),
        lights: vec![
            Light::new(246.0, 60.0, 90.0, rgb(160, 190, 255), 0.45),
            Light::new(90.0, 120.0, 34.0, rgb(255, 190, 110), 0.55).with_flicker(0.25, 0.7),
        ],
        emitters: smallvec![EmitterConfig {
            rate: 3.0,
            origin: at(160.0, 40.0),
            shape: EmitterShape::Rect {
                width: 280.0,
                height: 60.0,
            },
            angle: 0.0,
            spread: 360.0,
            speed_min: 0.5,
            speed_max: 2.0,
            colors: smallvec![rgb(255, 255, 255), rgb(180, 200, 255)],
            lifetime_min: 1.5,
            lifetime_max: 3.0,
            gravity: 0.0,
            size_min: 1.0,
            size_max: 1.0,
            max_particles: Some(30),
            alpha_max: Some(0.8),
        }],
        stagger_burst: sparks(rgb(120, 160, 255)),
        victory_burst: sparks(rgb(255, 240, 160)),
        props: vec![
            prop(PropKind::StarChart, 120.0, 100.0, PropLayer::Back),
            prop(PropKind::Telescope, 256.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Desk, 92.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Candle, 86.0, FLOOR_Y - 16.0, PropLayer::Back),
            prop(PropKind::Armchair, 44.0, FLOOR_Y + 2.0, PropLayer::Back),
            prop(PropKind::Orrery, 136.0, FLOOR_Y + 10.0, PropLayer::Fore),
        ],
        glows: smallvec![
            Glow {
                position: at(246.0, 36.0),
                radius: 40.0,
                color: rgba(220, 230, 255, 120),
            },
            Glow {
                position: at(60.0, 30.0),
                radius: 50.0,
                color: rgba(120, 80, 200, 60),
            },
        ],
        decoration: Decoration::Stars,
        background: Some(BackgroundAsset {
            key: "bg_observatory".to_string(),
            path: "backgrounds/observatory.png".to_string(),
            frame_count: 1,
            frame_interval: 0.15,
        }),
        sheet: wizard_sheet(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scenes_are_valid() {
        let catalog = SceneCatalog::builtin();
        assert_eq!(catalog.ids(), vec!["library", "forge", "observatory"]);
        for id in catalog.ids() {
            catalog.get(id).unwrap().validate(320.0, 180.0).unwrap();
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = SceneCatalog::builtin();
        assert_eq!(catalog.get(" Forge ").unwrap().id, "forge");
    }

    #[test]
    fn unknown_scene_fails_fast() {
        let catalog = SceneCatalog::builtin();
        let err = catalog.get("dungeon").unwrap_err();
        assert!(matches!(err, SceneError::UnknownScene { .. }));
        assert!(err.to_string().contains("library"));
    }

    #[test]
    fn out_of_bounds_action_is_rejected() {
        let mut cfg = library();
        cfg.actions.insert(AnimationState::Read, at(500.0, FLOOR_Y));
        assert!(matches!(
            cfg.validate(320.0, 180.0),
            Err(SceneError::ActionOutOfBounds {
                state: AnimationState::Read,
                ..
            })
        ));
    }

    #[test]
    fn too_many_lights_is_rejected() {
        let mut cfg = forge();
        cfg.lights = vec![Light::new(0.0, 0.0, 1.0, Color::WHITE, 1.0); MAX_LIGHTS + 1];
        assert!(matches!(
            cfg.validate(320.0, 180.0),
            Err(SceneError::TooManyLights { .. })
        ));
    }

    #[test]
    fn invalid_emitter_is_rejected() {
        let mut cfg = observatory();
        cfg.emitters[0].lifetime_min = 0.0;
        assert!(matches!(
            cfg.validate(320.0, 180.0),
            Err(SceneError::InvalidEmitter { index: 0, .. })
        ));
    }

    #[test]
    fn empty_action_table_is_rejected() {
        let mut cfg = library();
        cfg.actions.clear();
        assert!(matches!(
            cfg.validate(320.0, 180.0),
            Err(SceneError::NoActions { .. })
        ));
    }
}

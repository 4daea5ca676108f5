//! Procedural pixel art.
//!
//! Everything the scene needs to be drawable without any image file: the
//! wizard's frames for every animation and the props. Wizard frames are
//! generated from a small [`Pose`] description so each animation is just a
//! list of poses.
//!
//! Frame keys are `wizard_<animation>_<index>`; prop keys come from
//! [`PropKind::key`].

use raylib::prelude::Color;

use crate::components::animation::{AnimationController, AnimationDefinition};
use crate::components::imageanimator::{ImageAnimationDefinition, ImageAnimator};
use crate::resources::assetstore::SpriteData;
use crate::resources::scenecatalog::PropKind;

pub const WIZARD_WIDTH: u32 = 24;
pub const WIZARD_HEIGHT: u32 = 32;

const ROBE: Color = Color::new(64, 58, 150, 255);
const ROBE_DARK: Color = Color::new(44, 38, 110, 255);
const TRIM: Color = Color::new(226, 186, 72, 255);
const SKIN: Color = Color::new(238, 196, 160, 255);
const BEARD: Color = Color::new(232, 232, 240, 255);
const EYE: Color = Color::new(30, 24, 40, 255);
const BOOT: Color = Color::new(60, 40, 30, 255);
const WOOD: Color = Color::new(110, 72, 44, 255);
const WOOD_DARK: Color = Color::new(78, 50, 32, 255);
const IRON: Color = Color::new(120, 124, 134, 255);
const IRON_DARK: Color = Color::new(70, 72, 80, 255);
const PAPER: Color = Color::new(240, 230, 200, 255);
const FLAME: Color = Color::new(255, 196, 80, 255);
const ARCANE: Color = Color::new(140, 220, 255, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Arms {
    #[default]
    Down,
    /// Writing; the value nudges the hand.
    Quill(i32),
    Book,
    /// Hammer raised (`true`) or struck (`false`).
    Hammer(bool),
    Raised,
    Spread,
}

/// Parameters of one wizard frame.
#[derive(Debug, Clone, Copy, Default)]
struct Pose {
    /// Whole-body vertical offset, positive is down.
    bob: i32,
    /// Feet offset for walking.
    stride: i32,
    arms: Arms,
    /// Upper-body horizontal offset.
    lean: i32,
    /// Lowers the upper body; the robe hem stays on the floor.
    crouch: i32,
    eyes_closed: bool,
    sparkle: bool,
}

const fn pose(bob: i32, stride: i32, arms: Arms) -> Pose {
    Pose {
        bob,
        stride,
        arms,
        lean: 0,
        crouch: 0,
        eyes_closed: false,
        sparkle: false,
    }
}

struct WizardAnim {
    name: &'static str,
    poses: &'static [Pose],
    frame_duration: f32,
    looped: bool,
    /// Row in the image sheet.
    row: u32,
    /// Follow-up once a one-shot ends.
    next: Option<&'static str>,
}

const fn crouched(crouch: i32, arms: Arms, eyes_closed: bool) -> Pose {
    Pose {
        bob: 0,
        stride: 0,
        arms,
        lean: 0,
        crouch,
        eyes_closed,
        sparkle: false,
    }
}

const fn leaning(lean: i32, arms: Arms) -> Pose {
    Pose {
        bob: 0,
        stride: 0,
        arms,
        lean,
        crouch: 0,
        eyes_closed: true,
        sparkle: false,
    }
}

const fn floating(bob: i32, sparkle: bool) -> Pose {
    Pose {
        bob,
        stride: 0,
        arms: Arms::Spread,
        lean: 0,
        crouch: 0,
        eyes_closed: true,
        sparkle,
    }
}

const WIZARD_ANIMS: &[WizardAnim] = &[
    WizardAnim {
        name: "idle",
        poses: &[
            pose(0, 0, Arms::Down),
            pose(0, 0, Arms::Down),
            pose(1, 0, Arms::Down),
            pose(1, 0, Arms::Down),
        ],
        frame_duration: 0.25,
        looped: true,
        row: 0,
        next: None,
    },
    WizardAnim {
        name: "walk",
        poses: &[
            pose(0, -1, Arms::Down),
            pose(1, 0, Arms::Down),
            pose(0, 1, Arms::Down),
            pose(1, 0, Arms::Down),
        ],
        frame_duration: 0.12,
        looped: true,
        row: 1,
        next: None,
    },
    WizardAnim {
        name: "enter",
        poses: &[
            pose(0, 0, Arms::Raised),
            pose(0, 0, Arms::Down),
            pose(0, 0, Arms::Raised),
            pose(0, 0, Arms::Down),
        ],
        frame_duration: 0.3,
        looped: true,
        row: 1,
        next: None,
    },
    WizardAnim {
        name: "inscribe",
        poses: &[
            pose(0, 0, Arms::Quill(0)),
            pose(0, 0, Arms::Quill(1)),
            pose(0, 0, Arms::Quill(2)),
            pose(0, 0, Arms::Quill(1)),
        ],
        frame_duration: 0.15,
        looped: true,
        row: 3,
        next: None,
    },
    WizardAnim {
        name: "read",
        poses: &[pose(0, 0, Arms::Book), pose(1, 0, Arms::Book)],
        frame_duration: 0.6,
        looped: true,
        row: 4,
        next: None,
    },
    WizardAnim {
        name: "forge",
        poses: &[
            pose(0, 0, Arms::Hammer(true)),
            pose(0, 0, Arms::Hammer(true)),
            pose(1, 0, Arms::Hammer(false)),
            pose(0, 0, Arms::Hammer(false)),
        ],
        frame_duration: 0.12,
        looped: true,
        row: 5,
        next: None,
    },
    WizardAnim {
        name: "meditate",
        poses: &[floating(-1, false), floating(-2, true), floating(-3, false), floating(-2, true)],
        frame_duration: 0.3,
        looped: true,
        row: 6,
        next: None,
    },
    WizardAnim {
        name: "stagger",
        poses: &[
            leaning(-1, Arms::Spread),
            leaning(-2, Arms::Spread),
            leaning(-3, Arms::Spread),
            leaning(-1, Arms::Down),
        ],
        frame_duration: 0.1,
        looped: false,
        row: 7,
        next: Some("idle"),
    },
    WizardAnim {
        name: "victory",
        poses: &[
            pose(0, 0, Arms::Raised),
            pose(-1, 0, Arms::Raised),
            pose(-2, 0, Arms::Raised),
            pose(-1, 0, Arms::Raised),
        ],
        frame_duration: 0.2,
        looped: true,
        row: 8,
        next: None,
    },
    WizardAnim {
        name: "sit",
        poses: &[crouched(2, Arms::Down, false), crouched(4, Arms::Down, false)],
        frame_duration: 0.2,
        looped: false,
        row: 9,
        next: None,
    },
    WizardAnim {
        name: "rest",
        poses: &[crouched(4, Arms::Down, true), crouched(5, Arms::Down, true)],
        frame_duration: 0.8,
        looped: true,
        row: 9,
        next: None,
    },
    WizardAnim {
        name: "exit",
        poses: &[
            crouched(2, Arms::Spread, true),
            crouched(5, Arms::Down, true),
            crouched(8, Arms::Down, true),
            crouched(10, Arms::Down, true),
        ],
        frame_duration: 0.2,
        looped: false,
        row: 2,
        next: None,
    },
];

pub fn wizard_frame_key(animation: &str, index: usize) -> String {
    format!("wizard_{}_{}", animation, index)
}

/// Procedural animation table for the wizard. Resting sits down first and a
/// stagger recovers to idle.
pub fn wizard_animations() -> AnimationController {
    let mut controller = AnimationController::new().with_transition("rest", "sit");
    for anim in WIZARD_ANIMS {
        let keys = (0..anim.poses.len()).map(|i| wizard_frame_key(anim.name, i));
        let Some(mut def) = AnimationDefinition::new(keys, anim.frame_duration, anim.looped) else {
            continue;
        };
        if let Some(next) = anim.next {
            def = def.with_next(next);
        }
        controller.insert(anim.name, def);
    }
    controller
}

/// Sheet animations for the wizard sheet, one row per animation.
///
/// Row 1 walks right and row 2 walks left; they double as the `enter` and
/// `exit` walk variants.
pub fn wizard_sheet_animator(sheet: &str) -> ImageAnimator {
    let mut animator = ImageAnimator::new();
    for anim in WIZARD_ANIMS {
        if matches!(anim.name, "sit" | "exit") {
            continue;
        }
        let def = ImageAnimationDefinition::new(
            sheet,
            anim.row,
            0,
            anim.poses.len() as u32,
            anim.frame_duration,
            anim.looped,
        );
        if let Some(mut def) = def {
            if let Some(next) = anim.next {
                def = def.with_next(next);
            }
            animator = animator.with_animation(anim.name, def);
        }
    }
    if let Some(def) = ImageAnimationDefinition::new(sheet, 2, 0, 4, 0.12, true) {
        animator = animator.with_animation("exit", def);
    }
    animator
}

/// Every procedural sprite: all wizard frames plus all props.
pub fn builtin_sprites() -> Vec<(String, SpriteData)> {
    let mut out = Vec::new();
    for anim in WIZARD_ANIMS {
        for (i, p) in anim.poses.iter().enumerate() {
            out.push((wizard_frame_key(anim.name, i), wizard_frame(p)));
        }
    }
    for kind in PropKind::ALL {
        out.push((kind.key().to_string(), prop_sprite(kind)));
    }
    out
}

fn wizard_frame(p: &Pose) -> SpriteData {
    let mut s = SpriteData::new(WIZARD_WIDTH, WIZARD_HEIGHT);
    let base = p.bob + p.crouch;
    let cx = 12;

    // feet
    let feet_y = 30 + p.bob.min(0);
    s.fill(7 + p.stride, feet_y, 4, 2, BOOT);
    s.fill(13 - p.stride, feet_y, 4, 2, BOOT);

    // robe, widening toward the hem
    let top = 17 + base;
    let hem = 29 + p.bob.min(0);
    for y in top..=hem {
        let half = 4 + (y - top) / 3;
        let shift = if y < top + 6 { p.lean } else { 0 };
        s.fill(cx - half + shift, y, half * 2, 1, ROBE);
        s.set(cx - half + shift, y, ROBE_DARK);
    }
    s.fill(cx - 7, hem, 14, 1, TRIM);
    if top + 5 < hem {
        s.fill(cx - 5 + p.lean, top + 5, 10, 1, TRIM);
    }

    // head and beard
    let hx = cx - 3 + p.lean;
    let hy = 11 + base;
    s.fill(hx, hy, 6, 5, SKIN);
    if p.eyes_closed {
        s.fill(hx + 1, hy + 2, 2, 1, EYE);
        s.fill(hx + 4, hy + 2, 1, 1, EYE);
    } else {
        s.set(hx + 1, hy + 2, EYE);
        s.set(hx + 4, hy + 2, EYE);
    }
    for (i, w) in [6, 6, 4, 4, 2].iter().enumerate() {
        let y = hy + 3 + i as i32;
        s.fill(cx - w / 2 + p.lean, y, *w, 1, BEARD);
    }

    // hat: brim and a cone whose tip droops right
    let brim = hy - 1;
    s.fill(cx - 6 + p.lean, brim, 12, 1, ROBE_DARK);
    for r in 0..8 {
        let y = brim - 1 - r;
        let half = 4 - r / 2;
        let tip = r / 3;
        s.fill(cx - half + p.lean + tip, y, (half * 2).max(1), 1, ROBE);
    }
    s.set(cx + p.lean, brim - 3, TRIM);

    draw_arms(&mut s, p, cx + p.lean, top);

    if p.sparkle {
        for (x, y) in [(3, top - 4), (20, top - 6), (5, top + 6), (19, top + 4)] {
            s.set(x, y, ARCANE);
        }
    }
    s
}

fn draw_arms(s: &mut SpriteData, p: &Pose, cx: i32, top: i32) {
    match p.arms {
        Arms::Down => {
            s.fill(cx - 6, top + 1, 2, 7, ROBE_DARK);
            s.fill(cx + 4, top + 1, 2, 7, ROBE_DARK);
            s.fill(cx - 6, top + 8, 2, 1, SKIN);
            s.fill(cx + 4, top + 8, 2, 1, SKIN);
        }
        Arms::Quill(phase) => {
            s.fill(cx - 6, top + 1, 2, 7, ROBE_DARK);
            s.fill(cx + 3, top + 3, 6, 2, ROBE_DARK);
            let hand = cx + 9 + phase % 2;
            s.fill(hand, top + 3, 2, 2, SKIN);
            // quill feather
            s.set(hand + 1, top + 2, PAPER);
            s.set(hand + 2, top + 1, PAPER);
            s.set(hand + 2, top, PAPER);
        }
        Arms::Book => {
            s.fill(cx - 6, top + 3, 3, 2, ROBE_DARK);
            s.fill(cx + 3, top + 3, 3, 2, ROBE_DARK);
            s.fill(cx - 4, top + 2, 8, 5, WOOD);
            s.fill(cx - 3, top + 2, 3, 4, PAPER);
            s.fill(cx + 1, top + 2, 2, 4, PAPER);
        }
        Arms::Hammer(raised) => {
            s.fill(cx - 6, top + 1, 2, 7, ROBE_DARK);
            if raised {
                s.fill(cx + 4, top - 8, 2, 9, ROBE_DARK);
                s.fill(cx + 4, top - 9, 2, 1, SKIN);
                s.fill(cx + 4, top - 12, 2, 3, WOOD);
                s.fill(cx + 2, top - 15, 7, 3, IRON);
                s.fill(cx + 2, top - 13, 7, 1, IRON_DARK);
            } else {
                s.fill(cx + 3, top + 5, 6, 2, ROBE_DARK);
                s.fill(cx + 9, top + 5, 2, 2, SKIN);
                s.fill(cx + 9, top + 7, 1, 3, WOOD);
                s.fill(cx + 7, top + 10, 5, 3, IRON);
            }
        }
        Arms::Raised => {
            s.fill(cx - 8, top - 8, 2, 9, ROBE_DARK);
            s.fill(cx + 6, top - 8, 2, 9, ROBE_DARK);
            s.fill(cx - 8, top - 10, 2, 2, SKIN);
            s.fill(cx + 6, top - 10, 2, 2, SKIN);
        }
        Arms::Spread => {
            s.fill(cx - 10, top + 2, 6, 2, ROBE_DARK);
            s.fill(cx + 4, top + 2, 6, 2, ROBE_DARK);
            s.fill(cx - 11, top + 2, 1, 2, SKIN);
            s.fill(cx + 10, top + 2, 1, 2, SKIN);
            s.set(cx - 11, top, ARCANE);
            s.set(cx + 10, top, ARCANE);
        }
    }
}

/// Pixel art for a prop, anchored at its bottom centre when drawn.
pub fn prop_sprite(kind: PropKind) -> SpriteData {
    match kind {
        PropKind::Bookshelf => {
            let mut s = SpriteData::new(30, 56);
            s.fill(0, 0, 30, 56, WOOD_DARK);
            s.fill(2, 2, 26, 52, WOOD);
            let spines = [
                Color::new(150, 40, 40, 255),
                Color::new(40, 90, 150, 255),
                Color::new(60, 130, 70, 255),
                Color::new(190, 150, 60, 255),
                Color::new(110, 60, 140, 255),
            ];
            for shelf in 0..4 {
                let y = 4 + shelf * 13;
                let mut x = 3;
                let mut i = shelf as usize;
                while x < 26 {
                    let w = 2 + (i % 2) as i32;
                    let h = 9 + (i % 3) as i32;
                    s.fill(x, y + 11 - h, w, h, spines[i % spines.len()]);
                    x += w + 1;
                    i += 3;
                }
                s.fill(2, y + 11, 26, 2, WOOD_DARK);
            }
            s
        }
        PropKind::Desk => {
            let mut s = SpriteData::new(36, 18);
            s.fill(0, 0, 36, 4, WOOD);
            s.fill(0, 3, 36, 1, WOOD_DARK);
            s.fill(2, 4, 3, 14, WOOD_DARK);
            s.fill(31, 4, 3, 14, WOOD_DARK);
            s.fill(20, 4, 11, 6, WOOD);
            s.fill(6, -1, 8, 1, PAPER);
            s
        }
        PropKind::Candle => {
            let mut s = SpriteData::new(4, 10);
            s.fill(1, 4, 2, 6, PAPER);
            s.fill(1, 1, 2, 3, FLAME);
            s.set(1, 0, Color::new(255, 240, 180, 255));
            s
        }
        PropKind::Lectern => {
            let mut s = SpriteData::new(16, 28);
            s.fill(0, 0, 16, 4, WOOD);
            s.fill(6, 4, 4, 20, WOOD_DARK);
            s.fill(2, 24, 12, 4, WOOD);
            s.fill(2, -1, 12, 1, PAPER);
            s
        }
        PropKind::Rug => {
            let mut s = SpriteData::new(64, 8);
            s.fill(0, 0, 64, 8, Color::new(120, 30, 40, 255));
            s.fill(2, 2, 60, 4, Color::new(160, 60, 50, 255));
            for x in (4..60).step_by(8) {
                s.fill(x, 3, 4, 2, TRIM);
            }
            s
        }
        PropKind::Armchair => {
            let mut s = SpriteData::new(24, 26);
            let cloth = Color::new(120, 40, 50, 255);
            s.fill(2, 0, 20, 14, cloth);
            s.fill(0, 10, 24, 10, cloth);
            s.fill(4, 12, 16, 4, Color::new(150, 60, 70, 255));
            s.fill(2, 20, 3, 6, WOOD_DARK);
            s.fill(19, 20, 3, 6, WOOD_DARK);
            s
        }
        PropKind::Anvil => {
            let mut s = SpriteData::new(22, 16);
            s.fill(0, 0, 22, 4, IRON);
            s.fill(0, 3, 22, 1, IRON_DARK);
            s.fill(6, 4, 10, 6, IRON_DARK);
            s.fill(3, 10, 16, 6, WOOD_DARK);
            s
        }
        PropKind::Furnace => {
            let mut s = SpriteData::new(44, 60);
            let stone = Color::new(90, 80, 76, 255);
            let stone_dark = Color::new(64, 56, 54, 255);
            s.fill(0, 0, 44, 60, stone);
            for row in 0..10 {
                let offset = if row % 2 == 0 { 0 } else { 5 };
                for col in 0..5 {
                    s.fill(offset + col * 10, row * 6, 1, 6, stone_dark);
                }
                s.fill(0, row * 6, 44, 1, stone_dark);
            }
            s.fill(10, 28, 24, 24, Color::new(40, 14, 8, 255));
            s.fill(12, 38, 20, 14, Color::new(255, 110, 30, 255));
            s.fill(15, 42, 14, 10, FLAME);
            s
        }
        PropKind::Barrel => {
            let mut s = SpriteData::new(16, 20);
            s.fill(1, 0, 14, 20, WOOD);
            s.fill(0, 3, 16, 14, WOOD);
            s.fill(0, 4, 16, 1, IRON_DARK);
            s.fill(0, 15, 16, 1, IRON_DARK);
            s
        }
        PropKind::Telescope => {
            let mut s = SpriteData::new(30, 40);
            let brass = Color::new(200, 160, 70, 255);
            for i in 0..22 {
                s.fill(4 + i, 20 - i * 2 / 3, 4, 3, brass);
            }
            s.fill(24, 4, 6, 5, Color::new(230, 190, 90, 255));
            s.fill(13, 20, 2, 20, WOOD_DARK);
            s.fill(7, 38, 14, 2, WOOD_DARK);
            s
        }
        PropKind::StarChart => {
            let mut s = SpriteData::new(40, 30);
            s.fill(0, 0, 40, 30, Color::new(20, 24, 60, 255));
            s.fill(1, 1, 38, 28, Color::new(30, 36, 86, 255));
            for (x, y) in [(6, 6), (12, 20), (20, 10), (28, 22), (33, 7), (25, 15), (9, 14)] {
                s.set(x, y, PAPER);
            }
            s.fill(19, 9, 3, 3, TRIM);
            s
        }
        PropKind::Orrery => {
            let mut s = SpriteData::new(20, 24);
            let brass = Color::new(200, 160, 70, 255);
            s.fill(0, 7, 20, 1, brass);
            s.fill(9, 0, 1, 16, brass);
            s.fill(8, 6, 4, 4, FLAME);
            s.fill(1, 5, 3, 3, ARCANE);
            s.fill(16, 8, 2, 2, Color::new(200, 90, 70, 255));
            s.fill(6, 16, 8, 8, WOOD_DARK);
            s
        }
        PropKind::Window => {
            let mut s = SpriteData::new(36, 54);
            let stone = Color::new(70, 64, 84, 255);
            let glass = Color::new(40, 50, 100, 255);
            s.fill(0, 8, 36, 46, stone);
            s.fill(4, 0, 28, 8, stone);
            s.fill(4, 10, 28, 42, glass);
            s.fill(8, 4, 20, 6, glass);
            s.fill(17, 4, 2, 48, stone);
            s.fill(4, 28, 28, 2, stone);
            s.set(10, 16, PAPER);
            s.set(25, 36, PAPER);
            s
        }
    }
}

//! Scene building blocks.
//!
//! Submodules overview:
//! - [`animation`] – procedural frame-list animation player with transitions
//! - [`animationstate`] – the character's state vocabulary
//! - [`animator`] – capability shared by both animation players
//! - [`character`] – walk-to-station-then-act controller
//! - [`imageanimator`] – sheet-based animation player
//! - [`light`] – flickering point lights
//! - [`particles`] – pooled particle simulator
//! - [`transition`] – fade and banner sequences

pub mod animation;
pub mod animationstate;
pub mod animator;
pub mod character;
pub mod imageanimator;
pub mod light;
pub mod particles;
pub mod transition;

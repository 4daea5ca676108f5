//! The closed vocabulary of character states.
//!
//! External events never touch the scene directly; they are reduced to one
//! [`AnimationState`] (see [`crate::events::agentevent::event_to_animation_state`])
//! which the scene then acts on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Walk,
    Inscribe,
    Read,
    Forge,
    Meditate,
    Stagger,
    Victory,
    Rest,
    Enter,
    Exit,
}

impl AnimationState {
    pub const ALL: [AnimationState; 11] = [
        AnimationState::Idle,
        AnimationState::Walk,
        AnimationState::Inscribe,
        AnimationState::Read,
        AnimationState::Forge,
        AnimationState::Meditate,
        AnimationState::Stagger,
        AnimationState::Victory,
        AnimationState::Rest,
        AnimationState::Enter,
        AnimationState::Exit,
    ];

    /// Animation table key for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Walk => "walk",
            AnimationState::Inscribe => "inscribe",
            AnimationState::Read => "read",
            AnimationState::Forge => "forge",
            AnimationState::Meditate => "meditate",
            AnimationState::Stagger => "stagger",
            AnimationState::Victory => "victory",
            AnimationState::Rest => "rest",
            AnimationState::Enter => "enter",
            AnimationState::Exit => "exit",
        }
    }

    /// Short label shown in the status bar.
    pub fn label(self) -> &'static str {
        match self {
            AnimationState::Idle => "waiting",
            AnimationState::Walk => "walking",
            AnimationState::Inscribe => "inscribing",
            AnimationState::Read => "reading",
            AnimationState::Forge => "forging",
            AnimationState::Meditate => "pondering",
            AnimationState::Stagger => "staggered",
            AnimationState::Victory => "triumphant",
            AnimationState::Rest => "resting",
            AnimationState::Enter => "arriving",
            AnimationState::Exit => "departing",
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimationState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown animation state '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for state in AnimationState::ALL {
            assert_eq!(state.as_str().parse::<AnimationState>(), Ok(state));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!("dance".parse::<AnimationState>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&AnimationState::Inscribe).unwrap();
        assert_eq!(json, "\"inscribe\"");
        let back: AnimationState = serde_json::from_str("\"victory\"").unwrap();
        assert_eq!(back, AnimationState::Victory);
    }
}

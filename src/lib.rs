//! Molecule Match - find the molecule that matches the rotating target
//!
//! Core modules:
//! - `sim`: Deterministic game core (seeded rotations, round planning, session state machine)
//! - `catalog`: Molecule references, leveled dataset and the offline level builder
//! - `molecule`: MOL2 parsing and the built-in fallback structure
//! - `renderer`: Renderer capability (3D library bridge, 2D fallback)
//! - `stage`: Slot collection that applies models/rotations once assets arrive
//! - `assets`: Async asset loading with caching and fallbacks
//! - `persistence`: Key-value storage (LocalStorage on web)
//! - `ranking`: Persisted leaderboard
//! - `settings`: Persisted preferences
//! - `platform`: Wall-clock sources

pub mod assets;
pub mod catalog;
pub mod molecule;
pub mod persistence;
pub mod platform;
pub mod ranking;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod stage;

pub use catalog::{Catalog, Level, LevelSet, MoleculeRef};
pub use ranking::Ranking;
pub use settings::{RenderStyle, RendererPreference, Settings};

/// Game configuration constants
pub mod consts {
    /// Session length in seconds
    pub const TIME_LIMIT_SECS: u32 = 60;
    /// Delay before the next round after a correct answer
    pub const ADVANCE_DELAY_MS: u32 = 600;
    /// How long a wrong option stays flagged before it can be picked again
    pub const WRONG_FLASH_MS: u32 = 800;
    /// Countdown refresh interval
    pub const TICK_INTERVAL_MS: u32 = 200;
    /// Retry delay when the catalog cannot fill a round
    pub const RETRY_DELAY_MS: u32 = 1500;

    /// Options presented per round (target + two decoys)
    pub const OPTION_COUNT: usize = 3;
    /// Decoys per level
    pub const DECOYS_PER_LEVEL: usize = OPTION_COUNT - 1;

    /// Multiplier applied to the molecule path hash when deriving a slot seed
    pub const PATH_HASH_MULTIPLIER: i64 = 777;
    /// Per-slot seed stride so neighbouring slots never share a seed
    pub const SLOT_SEED_STRIDE: i64 = 1000;

    /// Slot identifier of the target viewer
    pub const TARGET_SLOT: &str = "target";
}

/// Slot identifier for the option viewer at `index`
#[inline]
pub fn option_slot(index: usize) -> String {
    format!("option-{index}")
}

/// Accuracy in percent, 0 when nothing was attempted
#[inline]
pub fn accuracy_percent(score: u32, attempts: u32) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        score as f64 / attempts as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_no_attempts() {
        assert_eq!(accuracy_percent(0, 0), 0.0);
    }

    #[test]
    fn test_accuracy_ratio() {
        assert!((accuracy_percent(7, 10) - 70.0).abs() < 1e-9);
        assert!((accuracy_percent(3, 3) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_option_slot_names() {
        assert_eq!(option_slot(0), "option-0");
        assert_eq!(option_slot(2), "option-2");
        assert_ne!(option_slot(1), consts::TARGET_SLOT);
    }
}

//! Deterministic game core
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Seeded RNG only
//! - Time comes in as an argument, never read from a clock
//! - No DOM or platform dependencies

pub mod controller;
pub mod hash;
pub mod rng;
pub mod rotation;
pub mod round;
pub mod state;
pub mod timer;

pub use controller::{Effect, Game, GameEvent, GameSetup};
pub use hash::hash_str;
pub use rng::SeededRng;
pub use rotation::{AxisTwist, Orientation, RotationPlan, rotate_about_centroid, slot_seed};
pub use round::{RoundError, RoundPlan, plan_round};
pub use state::{
    Feedback, GamePhase, Hud, RoundState, RoundView, Screen, Session, SessionSummary, SlotRequest,
};
pub use timer::{Countdown, RoundId, TimerBook, TimerKind, TimerTicket};

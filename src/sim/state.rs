//! Session and round state
//!
//! Everything the controller mutates lives here. Views handed to the host
//! (`RoundView`, `Hud`, `SessionSummary`) are plain snapshots.

use serde::{Deserialize, Serialize};

use super::round::RoundPlan;
use super::timer::{Countdown, RoundId};
use crate::catalog::MoleculeRef;
use crate::consts::TARGET_SLOT;
use crate::ranking::RankingEntry;
use crate::{accuracy_percent, option_slot};

/// Outcome shown after a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a player name
    Welcome,
    /// Options open for selection
    InRound,
    /// Showing the result of the last selection
    Feedback(Feedback),
    /// Time ran out
    Ended,
}

/// Screen the host should display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Welcome,
    Game,
    Summary,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Welcome => "welcome",
            Screen::Game => "game",
            Screen::Summary => "summary",
        }
    }
}

/// One player's run
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub player: String,
    /// Correct answers
    pub score: u32,
    /// All answers; always >= score
    pub attempts: u32,
    pub countdown: Countdown,
    pub ended: bool,
}

impl Session {
    pub fn new(player: String, now_ms: f64, limit_secs: u32) -> Self {
        Self {
            player,
            score: 0,
            attempts: 0,
            countdown: Countdown::start(now_ms, limit_secs),
            ended: false,
        }
    }

    pub fn accuracy(&self) -> f64 {
        accuracy_percent(self.score, self.attempts)
    }

    pub fn record_hit(&mut self) {
        self.score += 1;
        self.attempts += 1;
    }

    pub fn record_miss(&mut self) {
        self.attempts += 1;
    }
}

/// The round currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    pub id: RoundId,
    pub target: MoleculeRef,
    pub options: Vec<MoleculeRef>,
    pub correct_index: usize,
    pub level_index: Option<usize>,
    /// Per-option selectable flag
    pub enabled: Vec<bool>,
    pub solved: bool,
}

impl RoundState {
    pub fn new(id: RoundId, plan: RoundPlan) -> Self {
        let enabled = vec![true; plan.options.len()];
        Self {
            id,
            target: plan.target,
            options: plan.options,
            correct_index: plan.correct_index,
            level_index: plan.level_index,
            enabled,
            solved: false,
        }
    }

    pub fn is_selectable(&self, index: usize) -> bool {
        !self.solved && self.enabled.get(index).copied().unwrap_or(false)
    }

    /// Render requests: the target first, then each option in display order
    pub fn view(&self, molecule_dir: &str) -> RoundView {
        let target = SlotRequest {
            slot: TARGET_SLOT.to_string(),
            path: self.target.resolve(molecule_dir),
            index: 0,
        };
        let options = self.options.iter().enumerate().map(|(i, m)| SlotRequest {
            slot: option_slot(i),
            path: m.resolve(molecule_dir),
            index: i + 1,
        });

        RoundView {
            round: self.id,
            level: self.level_index,
            names: self.options.iter().map(|m| m.name.clone()).collect(),
            slots: std::iter::once(target).chain(options).collect(),
        }
    }
}

/// A molecule to load into a viewer slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRequest {
    pub slot: String,
    pub path: String,
    /// Position among the round's viewers; feeds the rotation seed
    pub index: usize,
}

/// What the host needs to lay out a new round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundView {
    pub round: RoundId,
    pub level: Option<usize>,
    /// Option labels in display order
    pub names: Vec<String>,
    pub slots: Vec<SlotRequest>,
}

/// Score line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub score: u32,
    pub attempts: u32,
    pub accuracy: f64,
    pub remaining_secs: f64,
}

impl Hud {
    pub fn of(session: &Session, now_ms: f64) -> Self {
        Self {
            score: session.score,
            attempts: session.attempts,
            accuracy: session.accuracy(),
            remaining_secs: session.countdown.remaining_secs(now_ms),
        }
    }

    /// Remaining time as shown on screen (whole seconds, rounded up)
    pub fn remaining_label(&self) -> String {
        format!("{}", self.remaining_secs.ceil() as u32)
    }
}

/// Final result of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub entry: RankingEntry,
    /// Leaderboard position (1-indexed), None when it did not make the cut
    pub rank: Option<usize>,
}

//! Game controller
//!
//! Event-in, effects-out state machine:
//! `Welcome -> InRound -> Feedback(..) -> InRound | Ended -> Welcome`.
//!
//! The host feeds `GameEvent`s with the current wall-clock time and applies
//! the returned `Effect`s in order (DOM updates, timers, rendering). Delayed
//! actions come back as `TimerFired` with the ticket that was scheduled; any
//! ticket not issued for the current round is ignored.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::round::plan_round;
use super::state::{
    Feedback, GamePhase, Hud, RoundState, RoundView, Screen, Session, SessionSummary,
};
use super::timer::{RoundId, TimerBook, TimerKind, TimerTicket};
use crate::catalog::{Catalog, LevelSet};
use crate::ranking::{Ranking, RankingEntry};
use crate::settings::Settings;

/// Injected dependencies for a game
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub settings: Settings,
    /// Leveled dataset; None switches to random catalog rounds
    pub levels: Option<LevelSet>,
    pub catalog: Catalog,
    pub ranking: Ranking,
    pub seed: u64,
}

/// Input from the host
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SubmitName(String),
    SelectOption(usize),
    /// Periodic countdown refresh
    Tick,
    TimerFired(TimerTicket),
    PlayAgain,
}

/// Output for the host, applied in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowScreen(Screen),
    /// Lay out a new round and load its viewers
    PresentRound(RoundView),
    Hud(Hud),
    MarkCorrect(usize),
    MarkWrong(usize),
    Reenable(usize),
    /// Disable every option of the current round
    LockOptions,
    Schedule { ticket: TimerTicket, delay_ms: u32 },
    /// Host timers for this round can be cleared
    CancelTimers(RoundId),
    Notice(String),
    SessionEnded(SessionSummary),
}

pub struct Game {
    settings: Settings,
    levels: Option<LevelSet>,
    catalog: Catalog,
    ranking: Ranking,
    rng: Pcg32,
    phase: GamePhase,
    session: Option<Session>,
    round: Option<RoundState>,
    /// Id of the latest round set up (also used for a failed setup awaiting retry)
    current: Option<RoundId>,
    next_round: u64,
    timers: TimerBook,
}

impl Game {
    pub fn new(setup: GameSetup) -> Self {
        match &setup.levels {
            Some(levels) => log::info!("Game ready with {} levels", levels.len()),
            None => log::info!(
                "No leveled dataset, using random rounds from {} molecules",
                setup.catalog.len()
            ),
        }
        Self {
            settings: setup.settings,
            levels: setup.levels,
            catalog: setup.catalog,
            ranking: setup.ranking,
            rng: Pcg32::seed_from_u64(setup.seed),
            phase: GamePhase::Welcome,
            session: None,
            round: None,
            current: None,
            next_round: 0,
            timers: TimerBook::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn handle(&mut self, event: GameEvent, now_ms: f64) -> Vec<Effect> {
        let mut fx = Vec::new();
        match event {
            GameEvent::SubmitName(name) => self.submit_name(&name, now_ms, &mut fx),
            GameEvent::SelectOption(index) => {
                if !self.end_if_expired(now_ms, &mut fx) {
                    self.select(index, now_ms, &mut fx);
                }
            }
            GameEvent::Tick => {
                if !self.end_if_expired(now_ms, &mut fx) {
                    if let Some(session) = self.active_session() {
                        fx.push(Effect::Hud(Hud::of(session, now_ms)));
                    }
                }
            }
            GameEvent::TimerFired(ticket) => {
                if !self.end_if_expired(now_ms, &mut fx) {
                    self.timer_fired(ticket, &mut fx);
                }
            }
            GameEvent::PlayAgain => self.play_again(&mut fx),
        }
        fx
    }

    fn active_session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|s| !s.ended)
    }

    fn submit_name(&mut self, name: &str, now_ms: f64, fx: &mut Vec<Effect>) {
        if self.phase != GamePhase::Welcome {
            log::debug!("Name submitted outside the welcome screen");
            return;
        }
        let name = name.trim();
        if name.is_empty() {
            fx.push(Effect::Notice("Please enter your name".to_string()));
            return;
        }

        log::info!("Session started for '{name}'");
        let session = Session::new(name.to_string(), now_ms, self.settings.time_limit_secs);
        fx.push(Effect::ShowScreen(Screen::Game));
        fx.push(Effect::Hud(Hud::of(&session, now_ms)));
        self.session = Some(session);
        self.start_round(fx);
    }

    /// Replace the current round; every outstanding ticket becomes stale
    fn start_round(&mut self, fx: &mut Vec<Effect>) {
        self.timers.disarm_all();
        if let Some(previous) = self.current {
            fx.push(Effect::CancelTimers(previous));
        }
        self.next_round += 1;
        let id = RoundId(self.next_round);
        self.current = Some(id);
        self.phase = GamePhase::InRound;

        let score = self.session.as_ref().map_or(0, |s| s.score);
        match plan_round(self.levels.as_ref(), &self.catalog, score, &mut self.rng) {
            Ok(plan) => {
                log::debug!(
                    "Round {} target '{}' level {:?}",
                    id.0,
                    plan.target.name,
                    plan.level_index
                );
                let round = RoundState::new(id, plan);
                fx.push(Effect::PresentRound(round.view(&self.settings.molecule_dir)));
                self.round = Some(round);
            }
            Err(e) => {
                log::warn!("Round setup failed: {e}");
                self.round = None;
                fx.push(Effect::Notice(format!("{e}; retrying")));
                let ticket = self.timers.arm(id, TimerKind::Retry);
                fx.push(Effect::Schedule {
                    ticket,
                    delay_ms: self.settings.retry_delay_ms,
                });
            }
        }
    }

    fn select(&mut self, index: usize, now_ms: f64, fx: &mut Vec<Effect>) {
        if !matches!(
            self.phase,
            GamePhase::InRound | GamePhase::Feedback(Feedback::Incorrect)
        ) {
            return;
        }
        let (Some(round), Some(session)) = (self.round.as_mut(), self.session.as_mut()) else {
            return;
        };
        if !round.is_selectable(index) {
            log::debug!("Option {index} is not selectable");
            return;
        }

        if index == round.correct_index {
            session.record_hit();
            round.solved = true;
            self.phase = GamePhase::Feedback(Feedback::Correct);
            fx.push(Effect::MarkCorrect(index));
            fx.push(Effect::LockOptions);
            fx.push(Effect::Hud(Hud::of(session, now_ms)));
            // Pending flashes must not reopen a locked round
            if self.timers.disarm_round(round.id) > 0 {
                fx.push(Effect::CancelTimers(round.id));
            }
            let ticket = self.timers.arm(round.id, TimerKind::Advance);
            fx.push(Effect::Schedule {
                ticket,
                delay_ms: self.settings.advance_delay_ms,
            });
        } else {
            session.record_miss();
            round.enabled[index] = false;
            self.phase = GamePhase::Feedback(Feedback::Incorrect);
            fx.push(Effect::MarkWrong(index));
            fx.push(Effect::Hud(Hud::of(session, now_ms)));
            let ticket = self.timers.arm(round.id, TimerKind::Reenable(index));
            fx.push(Effect::Schedule {
                ticket,
                delay_ms: self.settings.wrong_flash_ms,
            });
        }
    }

    fn timer_fired(&mut self, ticket: TimerTicket, fx: &mut Vec<Effect>) {
        if Some(ticket.round) != self.current || !self.timers.redeem(&ticket) {
            log::debug!("Ignoring stale timer {:?}", ticket);
            return;
        }

        match ticket.kind {
            TimerKind::Advance | TimerKind::Retry => self.start_round(fx),
            TimerKind::Reenable(index) => {
                let Some(round) = self.round.as_mut().filter(|r| !r.solved) else {
                    return;
                };
                if let Some(flag) = round.enabled.get_mut(index) {
                    *flag = true;
                    fx.push(Effect::Reenable(index));
                }
                if self.phase == GamePhase::Feedback(Feedback::Incorrect)
                    && self.timers.pending_flashes(round.id) == 0
                {
                    self.phase = GamePhase::InRound;
                }
            }
        }
    }

    /// End the session once the countdown has run out. Returns true when the
    /// session is over (now or earlier).
    fn end_if_expired(&mut self, now_ms: f64, fx: &mut Vec<Effect>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.ended {
            return true;
        }
        if !session.countdown.expired(now_ms) {
            return false;
        }

        session.ended = true;
        self.phase = GamePhase::Ended;
        self.timers.disarm_all();
        if let Some(current) = self.current {
            fx.push(Effect::CancelTimers(current));
        }

        let elapsed = session
            .countdown
            .elapsed_secs(now_ms)
            .min(session.countdown.limit_secs());
        let entry = RankingEntry::new(
            &session.player,
            session.score,
            session.attempts,
            elapsed,
            now_ms,
        );
        log::info!(
            "Session over for '{}': {}/{} ({:.1}%)",
            entry.player,
            entry.score,
            entry.attempts,
            entry.accuracy
        );
        let rank = self.ranking.insert(entry.clone());

        fx.push(Effect::LockOptions);
        fx.push(Effect::Hud(Hud::of(session, now_ms)));
        fx.push(Effect::SessionEnded(SessionSummary { entry, rank }));
        fx.push(Effect::ShowScreen(Screen::Summary));
        true
    }

    fn play_again(&mut self, fx: &mut Vec<Effect>) {
        if self.phase != GamePhase::Ended {
            return;
        }
        self.timers.disarm_all();
        if let Some(current) = self.current.take() {
            fx.push(Effect::CancelTimers(current));
        }
        self.session = None;
        self.round = None;
        self.phase = GamePhase::Welcome;
        fx.push(Effect::ShowScreen(Screen::Welcome));
    }
}

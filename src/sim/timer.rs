//! Countdown and delayed-action tickets
//!
//! The host schedules real timeouts; the game only hands out tickets and
//! remembers which are still live. A ticket from a finished round is never
//! redeemed, so late callbacks cannot touch the current round.

/// Identifies one round within a session (monotonic across sessions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundId(pub u64);

/// What a ticket does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Move on after a correct answer
    Advance,
    /// Clear the wrong-answer flag on an option
    Reenable(usize),
    /// Try again to set up a round
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket {
    pub id: u64,
    pub round: RoundId,
    pub kind: TimerKind,
}

/// Live tickets
#[derive(Debug, Default)]
pub struct TimerBook {
    next_id: u64,
    live: Vec<TimerTicket>,
}

impl TimerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `round`
    pub fn arm(&mut self, round: RoundId, kind: TimerKind) -> TimerTicket {
        self.next_id += 1;
        let ticket = TimerTicket {
            id: self.next_id,
            round,
            kind,
        };
        self.live.push(ticket);
        ticket
    }

    /// Consume a fired ticket. False if it was disarmed or already redeemed.
    pub fn redeem(&mut self, ticket: &TimerTicket) -> bool {
        match self.live.iter().position(|t| t == ticket) {
            Some(i) => {
                self.live.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Drop every ticket belonging to `round`; returns how many were dropped
    pub fn disarm_round(&mut self, round: RoundId) -> usize {
        let before = self.live.len();
        self.live.retain(|t| t.round != round);
        before - self.live.len()
    }

    pub fn disarm_all(&mut self) {
        self.live.clear();
    }

    pub fn is_live(&self, ticket: &TimerTicket) -> bool {
        self.live.contains(ticket)
    }

    /// Pending wrong-answer flashes for `round`
    pub fn pending_flashes(&self, round: RoundId) -> usize {
        self.live
            .iter()
            .filter(|t| t.round == round && matches!(t.kind, TimerKind::Reenable(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

/// Session countdown measured against wall-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    started_at_ms: f64,
    limit_secs: f64,
}

impl Countdown {
    pub fn start(now_ms: f64, limit_secs: u32) -> Self {
        Self {
            started_at_ms: now_ms,
            limit_secs: limit_secs as f64,
        }
    }

    pub fn limit_secs(&self) -> f64 {
        self.limit_secs
    }

    /// Seconds since start (never negative, even if the clock goes backwards)
    pub fn elapsed_secs(&self, now_ms: f64) -> f64 {
        ((now_ms - self.started_at_ms) / 1000.0).max(0.0)
    }

    pub fn remaining_secs(&self, now_ms: f64) -> f64 {
        (self.limit_secs - self.elapsed_secs(now_ms)).max(0.0)
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        self.elapsed_secs(now_ms) >= self.limit_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_redeems_once() {
        let mut book = TimerBook::new();
        let t = book.arm(RoundId(1), TimerKind::Advance);
        assert!(book.is_live(&t));
        assert!(book.redeem(&t));
        assert!(!book.redeem(&t));
        assert!(book.is_empty());
    }

    #[test]
    fn test_disarm_round_only_hits_that_round() {
        let mut book = TimerBook::new();
        let old = book.arm(RoundId(1), TimerKind::Reenable(0));
        let old2 = book.arm(RoundId(1), TimerKind::Advance);
        let new = book.arm(RoundId(2), TimerKind::Reenable(1));

        assert_eq!(book.disarm_round(RoundId(1)), 2);
        assert!(!book.redeem(&old));
        assert!(!book.redeem(&old2));
        assert!(book.redeem(&new));
    }

    #[test]
    fn test_tickets_are_unique() {
        let mut book = TimerBook::new();
        let a = book.arm(RoundId(3), TimerKind::Reenable(2));
        let b = book.arm(RoundId(3), TimerKind::Reenable(2));
        assert_ne!(a, b);
        assert_eq!(book.pending_flashes(RoundId(3)), 2);
        book.redeem(&a);
        assert_eq!(book.pending_flashes(RoundId(3)), 1);
    }

    #[test]
    fn test_countdown_uses_wall_clock() {
        let c = Countdown::start(1_000.0, 60);
        assert_eq!(c.remaining_secs(1_000.0), 60.0);
        assert_eq!(c.remaining_secs(31_000.0), 30.0);
        assert!(!c.expired(60_999.0));
        assert!(c.expired(61_000.0));
        // Large jump (host suspended) still lands on zero
        assert_eq!(c.remaining_secs(1_000_000.0), 0.0);
        // Clock skew backwards
        assert_eq!(c.elapsed_secs(0.0), 0.0);
    }
}

//! Ranking leaderboard
//!
//! Persisted to LocalStorage, keeps the best 20 sessions ordered by
//! accuracy, then score, then time.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, save_json};

/// Maximum number of ranking entries to keep
pub const MAX_RANKING_ENTRIES: usize = 20;

/// A finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player: String,
    /// Correct answers
    pub score: u32,
    pub attempts: u32,
    /// Percent, 0 when nothing was attempted
    pub accuracy: f64,
    /// Session length in seconds
    pub elapsed_secs: f64,
    /// Unix timestamp (ms) when recorded
    pub timestamp: f64,
}

impl RankingEntry {
    pub fn new(player: &str, score: u32, attempts: u32, elapsed_secs: f64, timestamp: f64) -> Self {
        Self {
            player: player.to_string(),
            score,
            attempts,
            accuracy: crate::accuracy_percent(score, attempts),
            elapsed_secs,
            timestamp,
        }
    }

    /// Leaderboard order: accuracy desc, score desc, time asc
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .accuracy
            .total_cmp(&self.accuracy)
            .then_with(|| other.score.cmp(&self.score))
            .then_with(|| self.elapsed_secs.total_cmp(&other.elapsed_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Ranking {
    pub entries: Vec<RankingEntry>,
}

impl Ranking {
    /// LocalStorage key
    pub const STORAGE_KEY: &'static str = "molecule_match_ranking";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Decode a stored ranking. Corrupt data yields an empty ranking; a valid
    /// but oversized or unordered list is normalized.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Ranking>(json) {
            Ok(mut ranking) => {
                ranking.normalize();
                ranking
            }
            Err(e) => {
                log::warn!("Discarding corrupt ranking data: {e}");
                Self::new()
            }
        }
    }

    /// Add an entry, re-sort and truncate.
    /// Returns the rank achieved (1-indexed) or None if it fell off the list.
    pub fn insert(&mut self, entry: RankingEntry) -> Option<usize> {
        // Later entries lose ties against earlier ones
        let pos = self
            .entries
            .iter()
            .position(|e| entry.rank_cmp(e) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_RANKING_ENTRIES);

        (pos < MAX_RANKING_ENTRIES).then_some(pos + 1)
    }

    fn normalize(&mut self) {
        self.entries.sort_by(RankingEntry::rank_cmp);
        self.entries.truncate(MAX_RANKING_ENTRIES);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn best(&self) -> Option<&RankingEntry> {
        self.entries.first()
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Some(json) => {
                let ranking = Self::from_json(&json);
                log::info!("Loaded {} ranking entries", ranking.len());
                ranking
            }
            None => {
                log::info!("No ranking found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Ranking saved ({} entries)", self.entries.len()),
            Err(e) => log::warn!("Ranking not saved: {e}"),
        }
    }
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_date(now: f64, timestamp: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn entry(player: &str, score: u32, attempts: u32, secs: f64) -> RankingEntry {
        RankingEntry::new(player, score, attempts, secs, 0.0)
    }

    fn is_sorted(r: &Ranking) -> bool {
        r.entries
            .windows(2)
            .all(|w| w[0].rank_cmp(&w[1]) != Ordering::Greater)
    }

    #[test]
    fn test_entry_accuracy() {
        assert_eq!(entry("a", 0, 0, 60.0).accuracy, 0.0);
        assert!((entry("a", 7, 10, 60.0).accuracy - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_accuracy_then_score_then_time() {
        let mut r = Ranking::new();
        r.insert(entry("slow", 5, 5, 60.0));
        r.insert(entry("sloppy", 9, 10, 60.0));
        r.insert(entry("fast", 5, 5, 40.0));
        r.insert(entry("more", 8, 8, 60.0));

        let names: Vec<_> = r.entries.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names, ["more", "fast", "slow", "sloppy"]);
        assert!(is_sorted(&r));
    }

    #[test]
    fn test_insert_returns_rank() {
        let mut r = Ranking::new();
        assert_eq!(r.insert(entry("a", 1, 2, 60.0)), Some(1));
        assert_eq!(r.insert(entry("b", 2, 2, 60.0)), Some(1));
        assert_eq!(r.insert(entry("c", 0, 3, 60.0)), Some(3));
        // Exact tie lands after the existing entry
        assert_eq!(r.insert(entry("d", 2, 2, 60.0)), Some(2));
    }

    #[test]
    fn test_capped_at_twenty() {
        let mut r = Ranking::new();
        for i in 0..30u32 {
            r.insert(entry(&format!("p{i}"), i, 30, 60.0));
            assert!(r.len() <= MAX_RANKING_ENTRIES);
        }
        assert_eq!(r.len(), MAX_RANKING_ENTRIES);
        assert!(is_sorted(&r));
        assert_eq!(r.best().unwrap().player, "p29");

        // Worse than everything: not ranked
        assert_eq!(r.insert(entry("zero", 0, 30, 60.0)), None);
        assert_eq!(r.len(), MAX_RANKING_ENTRIES);
    }

    #[test]
    fn test_corrupt_json_is_empty() {
        assert!(Ranking::from_json("garbage").is_empty());
        assert!(Ranking::from_json(r#"{"entries": 5}"#).is_empty());
    }

    #[test]
    fn test_stored_list_is_normalized() {
        let mut r = Ranking::new();
        r.entries = (0..25u32).map(|i| entry("p", i, 25, 60.0)).collect();
        let json = serde_json::to_string(&r).unwrap();
        let loaded = Ranking::from_json(&json);
        assert_eq!(loaded.len(), MAX_RANKING_ENTRIES);
        assert!(is_sorted(&loaded));
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let mut r = Ranking::new();
        r.insert(RankingEntry::new("ada", 3, 4, 60.0, 1_700_000_000_000.0));
        r.save(&mut store);
        assert_eq!(Ranking::load(&store), r);
    }

    #[test]
    fn test_load_absent_and_corrupt() {
        let mut store = MemoryStore::new();
        assert!(Ranking::load(&store).is_empty());
        store.set(Ranking::STORAGE_KEY, "{{{").unwrap();
        assert!(Ranking::load(&store).is_empty());
    }

    #[test]
    fn test_format_date() {
        let now = 10.0 * 86_400_000.0;
        assert_eq!(format_date(now, now - 10_000.0), "Just now");
        assert_eq!(format_date(now, now - 90_000.0), "1 min ago");
        assert_eq!(format_date(now, now - 3.0 * 3_600_000.0), "3 hours ago");
        assert_eq!(format_date(now, now - 86_400_000.0), "Yesterday");
        assert_eq!(format_date(now, now - 4.0 * 86_400_000.0), "4 days ago");
    }
}

//! Recent run history
//!
//! Keeps the last few final scores, newest first, and can present them
//! ranked for a leaderboard. Persisted as JSON.

use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;

/// Number of runs kept by default
pub const DEFAULT_CAPACITY: usize = 15;

/// One finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEntry {
    /// 1-based run counter, never reused
    pub run: u32,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    capacity: usize,
    total_runs: u32,
    /// Newest first
    entries: VecDeque<RunEntry>,
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RunHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            total_runs: 0,
            entries: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs recorded over the lifetime of this history, including evicted ones
    pub fn total_runs(&self) -> u32 {
        self.total_runs
    }

    /// Append a final score, dropping the oldest beyond capacity
    pub fn record(&mut self, score: i64) -> RunEntry {
        self.total_runs += 1;
        let entry = RunEntry {
            run: self.total_runs,
            score,
        };
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        entry
    }

    /// Newest first
    pub fn recent(&self) -> impl Iterator<Item = &RunEntry> {
        self.entries.iter()
    }

    /// Highest first; equal scores keep newest first
    pub fn ranked(&self) -> Vec<RunEntry> {
        let mut ranked: Vec<RunEntry> = self.entries.iter().copied().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn best(&self) -> Option<RunEntry> {
        self.ranked().first().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// "Run n: score" lines, highest first
    pub fn leaderboard_lines(&self) -> Vec<String> {
        self.ranked()
            .iter()
            .map(|e| format!("Run {}: {}", e.run, e.score))
            .collect()
    }

    pub fn to_json(&self) -> RunnerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a saved history. Entries beyond the stored capacity are dropped.
    pub fn from_json(json: &str) -> RunnerResult<Self> {
        let mut history: Self = serde_json::from_str(json)?;
        history.capacity = history.capacity.max(1);
        history.entries.truncate(history.capacity);
        Ok(history)
    }

    /// Load from disk; a missing file starts a fresh history
    pub fn load(path: impl AsRef<Path>, capacity: usize) -> RunnerResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let mut history = Self::from_json(&json)?;
                if history.capacity != capacity {
                    history.capacity = capacity.max(1);
                    history.entries.truncate(history.capacity);
                }
                log::info!("Loaded {} runs from {}", history.len(), path.display());
                Ok(history)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No run history at {}, starting fresh", path.display());
                Ok(Self::new(capacity))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> RunnerResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Run history saved ({} entries)", self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_newest_first() {
        let mut history = RunHistory::default();
        history.record(100);
        history.record(250);
        let recent: Vec<i64> = history.recent().map(|e| e.score).collect();
        assert_eq!(recent, vec![250, 100]);
        assert_eq!(history.recent().next().map(|e| e.run), Some(2));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = RunHistory::default();
        for score in 0..20 {
            history.record(score);
        }
        assert_eq!(history.len(), 15);
        assert_eq!(history.total_runs(), 20);
        // Runs 1..=5 are gone
        assert!(history.recent().all(|e| e.run > 5));
        assert_eq!(history.recent().last().map(|e| e.score), Some(5));
    }

    #[test]
    fn test_ranked_is_descending() {
        let mut history = RunHistory::default();
        for score in [40, -10, 300, 40, 120] {
            history.record(score);
        }
        let scores: Vec<i64> = history.ranked().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 120, 40, 40, -10]);
        assert_eq!(history.best().map(|e| e.run), Some(3));
        assert_eq!(history.leaderboard_lines()[0], "Run 3: 300");
    }

    #[test]
    fn test_empty_history() {
        let history = RunHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.best(), None);
        assert!(history.leaderboard_lines().is_empty());
    }

    #[test]
    fn test_json_roundtrip_and_truncation() {
        let mut history = RunHistory::new(3);
        for score in [1, 2, 3, 4] {
            history.record(score);
        }
        let back = RunHistory::from_json(&history.to_json().unwrap()).unwrap();
        assert_eq!(back, history);

        let json = r#"{"capacity":2,"total_runs":3,"entries":[{"run":3,"score":9},{"run":2,"score":8},{"run":1,"score":7}]}"#;
        let trimmed = RunHistory::from_json(json).unwrap();
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn test_load_missing_file_starts_fresh() {
        let path = std::env::temp_dir().join("coin_dash_missing_history_test.json");
        let _ = fs::remove_file(&path);
        let history = RunHistory::load(&path, 15).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("coin_dash_history_{}.json", std::process::id()));
        let mut history = RunHistory::default();
        history.record(42);
        history.save(&path).unwrap();
        let loaded = RunHistory::load(&path, 15).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, history);
    }
}

//! High score leaderboard
//!
//! Top 10 runs. Persisted as JSON: a file on native, LocalStorage in the
//! browser, or nowhere for in-memory boards (tests, demo sessions).

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score
    pub score: u64,
    /// Longest combo in the run
    pub max_combo: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Where a board is saved
#[derive(Debug, Clone, Default)]
enum Backing {
    #[default]
    Memory,
    #[cfg(not(target_arch = "wasm32"))]
    File(std::path::PathBuf),
    #[cfg(target_arch = "wasm32")]
    LocalStorage,
}

/// Receives finished runs
pub trait ScoreStore {
    /// Record a run. Returns the rank achieved (1-indexed) or `None` if it
    /// didn't make the board. `Err` means the board updated but didn't persist.
    fn submit(&mut self, score: u64, max_combo: u32, timestamp: f64) -> Result<Option<usize>>;

    /// Best score on record
    fn best(&self) -> Option<u64>;
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
    #[serde(skip)]
    backing: Backing,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "shatter_run_highscores";

    /// Create empty in-memory leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, max_combo: u32, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            max_combo,
            timestamp,
        };

        // Sorted descending; ties keep the older run first
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    fn from_json(json: &str) -> Result<Self> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }

    /// Load from a JSON file. A missing file is an empty board; the board
    /// saves back to `path` afterwards.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut scores = match std::fs::read_to_string(&path) {
            Ok(json) => {
                let scores = Self::from_json(&json)?;
                log::info!("Loaded {} high scores from {}", scores.entries.len(), path.display());
                scores
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores at {}, starting fresh", path.display());
                Self::new()
            }
            Err(e) => return Err(e.into()),
        };
        scores.backing = Backing::File(path);
        Ok(scores)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let mut scores = local_storage()
            .and_then(|storage| storage.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|json| match Self::from_json(&json) {
                Ok(scores) => Some(scores),
                Err(e) => {
                    log::warn!("Discarding unreadable high scores: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        log::info!("Loaded {} high scores", scores.entries.len());
        scores.backing = Backing::LocalStorage;
        scores
    }

    /// Write to wherever this board came from
    pub fn save(&self) -> Result<()> {
        match &self.backing {
            Backing::Memory => Ok(()),
            #[cfg(not(target_arch = "wasm32"))]
            Backing::File(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)?;
                }
                std::fs::write(path, serde_json::to_string_pretty(self)?)?;
                log::info!("High scores saved ({} entries)", self.entries.len());
                Ok(())
            }
            #[cfg(target_arch = "wasm32")]
            Backing::LocalStorage => {
                let storage = local_storage().ok_or_else(|| {
                    crate::Error::StorageUnavailable("LocalStorage".to_string())
                })?;
                let json = serde_json::to_string(self)?;
                storage
                    .set_item(Self::STORAGE_KEY, &json)
                    .map_err(|_| crate::Error::StorageUnavailable("quota exceeded".to_string()))?;
                log::info!("High scores saved ({} entries)", self.entries.len());
                Ok(())
            }
        }
    }
}

impl ScoreStore for HighScores {
    fn submit(&mut self, score: u64, max_combo: u32, timestamp: f64) -> Result<Option<usize>> {
        let rank = self.add_score(score, max_combo, timestamp);
        if rank.is_some() {
            self.save()?;
        }
        Ok(rank)
    }

    fn best(&self) -> Option<u64> {
        self.top_score()
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

/// Wall-clock time in Unix milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Format how long ago `timestamp` was, relative to `now` (both Unix ms)
pub fn format_age(now: f64, timestamp: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        match diff_days.floor() as i64 {
            1 => "Yesterday".to_string(),
            days => format!("{} days ago", days),
        }
    } else if diff_hours >= 1.0 {
        match diff_hours.floor() as i64 {
            1 => "1 hour ago".to_string(),
            hours => format!("{} hours ago", hours),
        }
    } else if diff_mins >= 1.0 {
        match diff_mins.floor() as i64 {
            1 => "1 min ago".to_string(),
            mins => format!("{} mins ago", mins),
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_and_truncation() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        for i in 1..=12u64 {
            scores.add_score(i * 100, i as u32, i as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1200));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(300));

        assert!(!scores.qualifies(300));
        assert_eq!(scores.add_score(650, 7, 0.0), Some(6));
        assert_eq!(scores.entries[5].max_combo, 7);
    }

    #[test]
    fn test_submit_in_memory() {
        let mut scores = HighScores::new();
        assert_eq!(scores.submit(500, 12, 1.0).unwrap(), Some(1));
        assert_eq!(scores.submit(0, 0, 2.0).unwrap(), None);
        assert_eq!(scores.best(), Some(500));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "shatter_run_scores_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut scores = HighScores::load_file(&path).unwrap();
        assert!(scores.is_empty());
        scores.submit(900, 15, 42.0).unwrap();

        let reloaded = HighScores::load_file(&path).unwrap();
        assert_eq!(reloaded.entries, scores.entries);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let path = std::env::temp_dir().join(format!(
            "shatter_run_bad_scores_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            HighScores::load_file(&path),
            Err(crate::Error::Json(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_format_age() {
        let now = 10.0 * 86_400_000.0;
        assert_eq!(format_age(now, now - 5_000.0), "Just now");
        assert_eq!(format_age(now, now - 90_000.0), "1 min ago");
        assert_eq!(format_age(now, now - 3.0 * 3_600_000.0), "3 hours ago");
        assert_eq!(format_age(now, now - 86_400_000.0), "Yesterday");
        assert_eq!(format_age(now, now - 4.0 * 86_400_000.0), "4 days ago");
    }
}

//! Weekly Play Limits and Lifetime Progression
//!
//! Multiplayer sessions are rationed per calendar week (Sunday 00:00 UTC
//! reset). Lifetime XP accumulates across sessions and maps onto expertise
//! levels. Both persist through the injected [`KvStore`]; all time
//! arithmetic takes `now` as a parameter so tests control the clock.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::storage::KvStore;

/// Default multiplayer ration per week.
pub const MAX_WEEKLY_PLAYS: usize = 1;

const WEEKLY_KEY: &str = "verdict_arena_weekly_plays";
const TOTAL_XP_KEY: &str = "verdict_arena_total_xp";

/// One completed rationed session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlayRecord {
    /// When the session finished.
    pub played_at: DateTime<Utc>,
    /// Room the session was played in.
    pub room_code: String,
    /// Final score.
    pub score: u32,
    /// XP earned.
    pub xp: u32,
}

/// Start of the current week: the most recent Sunday, 00:00 UTC.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_sunday = now.weekday().num_days_from_sunday() as i64;
    (now - Duration::days(days_since_sunday))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

/// Tracks rationed plays for the current week.
pub struct WeeklyTracker {
    store: Arc<dyn KvStore>,
    key: String,
}

impl WeeklyTracker {
    /// Tracker under the default storage key.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_key(store, WEEKLY_KEY)
    }

    /// Tracker under a custom storage key.
    pub fn with_key(store: Arc<dyn KvStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Plays recorded this week. Prior weeks are filtered out on read.
    pub fn plays(&self, now: DateTime<Utc>) -> Vec<WeeklyPlayRecord> {
        let Some(raw) = self.store.get(&self.key) else {
            return Vec::new();
        };
        let records: Vec<WeeklyPlayRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "weekly play storage corrupt, starting empty");
                return Vec::new();
            }
        };
        let start = week_start(now);
        records
            .into_iter()
            .filter(|r| r.played_at >= start)
            .collect()
    }

    /// Can the player start another rationed session this week?
    pub fn can_play(&self, max_plays_per_week: usize, now: DateTime<Utc>) -> bool {
        self.plays(now).len() < max_plays_per_week
    }

    /// Rationed sessions left this week.
    pub fn remaining_plays(&self, max_plays_per_week: usize, now: DateTime<Utc>) -> usize {
        max_plays_per_week.saturating_sub(self.plays(now).len())
    }

    /// Time until the weekly reset.
    pub fn time_until_reset(&self, now: DateTime<Utc>) -> Duration {
        week_start(now) + Duration::days(7) - now
    }

    /// Record a completed session.
    pub fn record_play(&self, room_code: &str, score: u32, xp: u32, now: DateTime<Utc>) {
        let mut plays = self.plays(now);
        plays.push(WeeklyPlayRecord {
            played_at: now,
            room_code: room_code.to_string(),
            score,
            xp,
        });
        match serde_json::to_string(&plays) {
            Ok(json) => {
                if let Err(err) = self.store.set(&self.key, json) {
                    warn!(error = %err, "weekly play record not persisted");
                }
            }
            Err(err) => warn!(error = %err, "weekly play record not serializable"),
        }
    }

    /// Best score this week.
    pub fn best_score(&self, now: DateTime<Utc>) -> u32 {
        self.plays(now).iter().map(|p| p.score).max().unwrap_or(0)
    }

    /// Total XP earned this week.
    pub fn xp_this_week(&self, now: DateTime<Utc>) -> u32 {
        self.plays(now).iter().map(|p| p.xp).sum()
    }
}

/// Lifetime XP total behind the injected store.
pub struct XpLedger {
    store: Arc<dyn KvStore>,
    key: String,
}

impl XpLedger {
    /// Ledger under the default storage key.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            key: TOTAL_XP_KEY.to_string(),
        }
    }

    /// Lifetime XP. Unreadable storage counts as zero.
    pub fn total_xp(&self) -> u32 {
        self.store
            .get(&self.key)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    /// Add earned XP; returns the new total.
    pub fn add_xp(&self, xp: u32) -> u32 {
        let total = self.total_xp().saturating_add(xp);
        if let Err(err) = self.store.set(&self.key, total.to_string()) {
            warn!(error = %err, "lifetime xp not persisted");
        }
        total
    }
}

/// An expertise tier on the lifetime XP ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExpertiseLevel {
    /// Tier number, 1-based.
    pub level: u32,
    /// Display title.
    pub title: &'static str,
    /// XP required to reach this tier.
    pub min_xp: u32,
}

/// The expertise ladder, lowest tier first.
pub const EXPERTISE_LEVELS: [ExpertiseLevel; 7] = [
    ExpertiseLevel { level: 1, title: "Novice", min_xp: 0 },
    ExpertiseLevel { level: 2, title: "Apprentice", min_xp: 100 },
    ExpertiseLevel { level: 3, title: "Analyst", min_xp: 300 },
    ExpertiseLevel { level: 4, title: "Expert", min_xp: 600 },
    ExpertiseLevel { level: 5, title: "Master", min_xp: 1000 },
    ExpertiseLevel { level: 6, title: "Grandmaster", min_xp: 1500 },
    ExpertiseLevel { level: 7, title: "Legend", min_xp: 2500 },
];

/// The tier a lifetime XP total sits in.
pub fn level_for(total_xp: u32) -> ExpertiseLevel {
    EXPERTISE_LEVELS
        .iter()
        .rev()
        .find(|l| total_xp >= l.min_xp)
        .copied()
        .unwrap_or(EXPERTISE_LEVELS[0])
}

/// Progress toward the next tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    /// XP accumulated past the current tier's threshold.
    pub current: u32,
    /// XP between the current and next tier.
    pub needed: u32,
    /// Rounded percentage toward the next tier.
    pub progress: u32,
}

/// Progress toward the next tier, `None` at the top of the ladder.
pub fn xp_to_next_level(total_xp: u32) -> Option<LevelProgress> {
    let current_level = level_for(total_xp);
    let next = EXPERTISE_LEVELS
        .iter()
        .find(|l| l.level == current_level.level + 1)?;

    let current = total_xp - current_level.min_xp;
    let needed = next.min_xp - current_level.min_xp;
    Some(LevelProgress {
        current,
        needed,
        progress: (current * 100 + needed / 2) / needed,
    })
}

// =============================================================================
// TESTS
// =============================================================================

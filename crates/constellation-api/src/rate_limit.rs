use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use constellation_db::Database;
use constellation_types::models::ActionCategory;

/// Thresholds per identity hash within one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub max_posts: u64,
    pub max_reactions: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_posts: 3,
            max_reactions: 20,
        }
    }
}

impl RateLimits {
    pub fn threshold(&self, category: ActionCategory) -> u64 {
        match category {
            ActionCategory::Post => self.max_posts,
            ActionCategory::React => self.max_reactions,
        }
    }
}

/// Length of the trailing window every check looks back over.
pub fn window() -> Duration {
    Duration::hours(1)
}

/// Sliding-window limiter counted against persisted stars and reactions.
/// It keeps no state of its own: every check re-counts recent history.
pub struct RateLimiter {
    db: Arc<Database>,
    limits: RateLimits,
}

impl RateLimiter {
    pub fn new(db: Arc<Database>, limits: RateLimits) -> Self {
        Self { db, limits }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Whether `identity_hash` may perform another `category` action at
    /// `now`. A failed count lets the action through; the write that follows
    /// will surface a broken store on its own.
    pub fn check(&self, identity_hash: &str, category: ActionCategory, now: DateTime<Utc>) -> bool {
        let window_start = now - window();
        match self.db.count_recent_actions(identity_hash, category, window_start) {
            Ok(count) => count < self.limits.threshold(category),
            Err(e) => {
                warn!("Rate limit count for {} failed: {:#}", category, e);
                true
            }
        }
    }
}

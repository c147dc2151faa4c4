//! Database row types. These map directly to SQLite rows and still carry the
//! hashes; the API layer decides what leaves the process.

use chrono::{DateTime, Utc};
use constellation_types::models::Theme;

#[derive(Debug, Clone, PartialEq)]
pub struct StarRow {
    pub id: String,
    pub message: String,
    pub theme: Theme,
    pub code_hash: Option<String>,
    pub pos_x: f64,
    pub pos_y: f64,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when inserting a star; the store assigns
/// the id.
#[derive(Debug, Clone)]
pub struct NewStar {
    pub message: String,
    pub theme: Theme,
    pub code_hash: Option<String>,
    pub pos_x: f64,
    pub pos_y: f64,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionRow {
    pub id: String,
    pub star_id: String,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwinLinkRow {
    pub id: String,
    pub star_a_id: String,
    pub star_b_id: String,
    pub created_at: DateTime<Utc>,
}

impl TwinLinkRow {
    /// The id on the other side of the link, if `star_id` is part of it.
    pub fn other(&self, star_id: &str) -> Option<&str> {
        if self.star_a_id == star_id {
            Some(&self.star_b_id)
        } else if self.star_b_id == star_id {
            Some(&self.star_a_id)
        } else {
            None
        }
    }
}

/// Position-only view of a twin. Message and hashes are never selected.
#[derive(Debug, Clone, PartialEq)]
pub struct TwinPosition {
    pub id: String,
    pub pos_x: f64,
    pub pos_y: f64,
}

/// A star joined with its computed brightness and resolved twin.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedStarRow {
    pub id: String,
    pub message: String,
    pub theme: Theme,
    pub pos_x: f64,
    pub pos_y: f64,
    pub created_at: DateTime<Utc>,
    pub brightness: u64,
    pub twin: Option<TwinPosition>,
}

/// Result of a successful twin match: the new link plus where the partner
/// sits on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct TwinMatch {
    pub link: TwinLinkRow,
    pub partner: TwinPosition,
}

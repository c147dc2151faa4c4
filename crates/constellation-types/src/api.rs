use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Theme;

// -- Stars --

/// Body of `POST /api/stars`. Every field is optional at the wire level so
/// that missing fields surface as validation errors rather than as JSON
/// rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStarRequest {
    pub message: Option<String>,
    pub theme: Option<String>,
    pub initials: Option<String>,
    pub birth_month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListStarsQuery {
    pub theme: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Public position of a star's twin. Deliberately carries nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwinRef {
    pub id: String,
    pub pos_x: f64,
    pub pos_y: f64,
}

/// A star as clients see it: no identity or code hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarView {
    pub id: String,
    pub message: String,
    pub theme: Theme,
    pub pos_x: f64,
    pub pos_y: f64,
    pub brightness: u64,
    pub created_at: DateTime<Utc>,
    pub has_twin: bool,
    pub twin_link: Option<TwinRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStarResponse {
    pub star: StarView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StarResponse {
    pub star: StarView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListStarsResponse {
    pub stars: Vec<StarView>,
}

// -- Reactions --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionView {
    pub id: String,
    pub star_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactResponse {
    pub reaction: ReactionView,
    pub brightness: u64,
}

// -- Themes --

#[derive(Debug, Serialize)]
pub struct ThemeInfo {
    pub value: Theme,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<Theme> for ThemeInfo {
    fn from(theme: Theme) -> Self {
        Self {
            value: theme,
            label: theme.label(),
            description: theme.description(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

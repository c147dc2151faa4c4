use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use constellation_crypto::{hash_ip, hash_secret_code};
use constellation_db::Database;
use constellation_db::models::{EnrichedStarRow, NewStar, TwinPosition};
use constellation_types::api::{CreateStarRequest, ReactResponse, ReactionView, StarView, TwinRef};
use constellation_types::models::{ActionCategory, Theme};

use crate::clock::Clock;
use crate::error::StarError;
use crate::rate_limit::{self, RateLimiter, RateLimits};
use crate::twin::{SerializedTwinMatcher, TwinMatcher};

pub const MIN_MESSAGE_LENGTH: usize = 10;
pub const MAX_MESSAGE_LENGTH: usize = 500;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub limits: RateLimits,
    pub max_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            limits: RateLimits::default(),
            max_page_size: 500,
        }
    }
}

/// Orchestrates star creation, reactions and listing on top of the store,
/// the rate limiter and the twin matcher. All methods block on SQLite and
/// are meant to be called from `spawn_blocking`.
pub struct StarService {
    db: Arc<Database>,
    limiter: RateLimiter,
    matcher: Arc<dyn TwinMatcher>,
    clock: Arc<dyn Clock>,
    max_page_size: u32,
}

impl StarService {
    pub fn new(db: Arc<Database>, config: ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        let matcher = Arc::new(SerializedTwinMatcher::new(db.clone(), clock.clone()));
        Self {
            limiter: RateLimiter::new(db.clone(), config.limits),
            db,
            matcher,
            clock,
            max_page_size: config.max_page_size,
        }
    }

    pub fn with_twin_matcher(mut self, matcher: Arc<dyn TwinMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn create_star(&self, req: CreateStarRequest, client_ip: &str) -> Result<StarView, StarError> {
        let (message, theme) = validate_star(&req)?;

        let ip_hash = hash_ip(client_ip);
        let now = self.clock.now();
        if !self.limiter.check(&ip_hash, ActionCategory::Post, now) {
            debug!("Post rate limit hit");
            return Err(StarError::RateLimited {
                category: ActionCategory::Post,
            });
        }

        let code_hash = match (non_empty(req.initials.as_deref()), non_empty(req.birth_month.as_deref())) {
            (Some(initials), Some(month)) => Some(hash_secret_code(initials, month)),
            _ => None,
        };

        let (pos_x, pos_y) = random_position(&mut rand::rng());

        let star = self.db.create_star(&NewStar {
            message,
            theme,
            code_hash,
            pos_x,
            pos_y,
            ip_hash,
            created_at: now,
        })?;
        info!("Star {} created ({})", star.id, star.theme);

        let twin = self
            .matcher
            .try_link_twin(&star.id, star.code_hash.as_deref())
            .map(|matched| matched.partner);

        Ok(StarView {
            id: star.id,
            message: star.message,
            theme: star.theme,
            pos_x: star.pos_x,
            pos_y: star.pos_y,
            brightness: 0,
            created_at: star.created_at,
            has_twin: twin.is_some(),
            twin_link: twin.map(twin_ref),
        })
    }

    pub fn react_to_star(&self, star_id: &str, client_ip: &str) -> Result<ReactResponse, StarError> {
        if self.db.find_star_by_id(star_id)?.is_none() {
            return Err(StarError::NotFound {
                id: star_id.to_string(),
            });
        }

        let ip_hash = hash_ip(client_ip);
        let now = self.clock.now();
        if !self.limiter.check(&ip_hash, ActionCategory::React, now) {
            debug!("React rate limit hit");
            return Err(StarError::RateLimited {
                category: ActionCategory::React,
            });
        }

        let window_start = now - rate_limit::window();
        if self
            .db
            .find_reaction_in_window(star_id, &ip_hash, window_start)?
            .is_some()
        {
            return Err(StarError::Duplicate);
        }

        let reaction = self.db.create_reaction(star_id, &ip_hash, now)?;
        let brightness = self.db.count_reactions(star_id)?;

        Ok(ReactResponse {
            reaction: ReactionView {
                id: reaction.id,
                star_id: reaction.star_id,
                created_at: reaction.created_at,
            },
            brightness,
        })
    }

    /// Newest first. An empty theme means "all themes"; an unknown one is a
    /// validation error. `limit` defaults to 100 and is capped by config.
    pub fn list_stars(
        &self,
        theme: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<StarView>, StarError> {
        let theme = match non_empty(theme) {
            Some(raw) => Some(parse_theme(raw)?),
            None => None,
        };
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).min(self.max_page_size);
        let offset = offset.unwrap_or(0);

        let rows = self.db.list_stars(theme, limit, offset)?;
        Ok(rows.into_iter().map(star_view).collect())
    }

    pub fn get_star(&self, star_id: &str) -> Result<StarView, StarError> {
        self.db
            .find_enriched_star(star_id)?
            .map(star_view)
            .ok_or_else(|| StarError::NotFound {
                id: star_id.to_string(),
            })
    }
}

/// Checks presence, theme and length, in that order.
fn validate_star(req: &CreateStarRequest) -> Result<(String, Theme), StarError> {
    let (Some(message), Some(theme)) = (non_empty(req.message.as_deref()), non_empty(req.theme.as_deref()))
    else {
        return Err(StarError::validation("Message and theme are required"));
    };

    let theme = parse_theme(theme)?;

    let len = message.chars().count();
    if !(MIN_MESSAGE_LENGTH..=MAX_MESSAGE_LENGTH).contains(&len) {
        return Err(StarError::validation(format!(
            "Message must be between {} and {} characters",
            MIN_MESSAGE_LENGTH, MAX_MESSAGE_LENGTH
        )));
    }

    Ok((message.to_string(), theme))
}

fn parse_theme(raw: &str) -> Result<Theme, StarError> {
    Theme::parse(raw).ok_or_else(|| StarError::validation(format!("Unknown theme: {}", raw)))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Uniform in [0, 100) on both axes. Overlaps are fine.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
}

fn twin_ref(twin: TwinPosition) -> TwinRef {
    TwinRef {
        id: twin.id,
        pos_x: twin.pos_x,
        pos_y: twin.pos_y,
    }
}

fn star_view(row: EnrichedStarRow) -> StarView {
    StarView {
        id: row.id,
        message: row.message,
        theme: row.theme,
        pos_x: row.pos_x,
        pos_y: row.pos_y,
        brightness: row.brightness,
        created_at: row.created_at,
        has_twin: row.twin.is_some(),
        twin_link: row.twin.map(twin_ref),
    }
}

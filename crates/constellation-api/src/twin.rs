use std::sync::Arc;

use tracing::{info, warn};

use constellation_db::Database;
use constellation_db::models::TwinMatch;

use crate::clock::Clock;

/// Pairs a freshly created star with an earlier star that carries the same
/// secret-code hash. Matching is best effort: implementations swallow their
/// own failures and report "no twin".
pub trait TwinMatcher: Send + Sync {
    fn try_link_twin(&self, new_star_id: &str, code_hash: Option<&str>) -> Option<TwinMatch>;
}

/// Runs find-candidate and insert-link as one transaction on the store's
/// single writer, so matching is serialized across concurrent posts.
pub struct SerializedTwinMatcher {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl SerializedTwinMatcher {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

impl TwinMatcher for SerializedTwinMatcher {
    fn try_link_twin(&self, new_star_id: &str, code_hash: Option<&str>) -> Option<TwinMatch> {
        let code_hash = code_hash?;

        match self.db.link_unlinked_twin(new_star_id, code_hash, self.clock.now()) {
            Ok(Some(matched)) => {
                info!("Star {} twinned with {}", new_star_id, matched.partner.id);
                Some(matched)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Twin matching for star {} skipped: {:#}", new_star_id, e);
                None
            }
        }
    }
}

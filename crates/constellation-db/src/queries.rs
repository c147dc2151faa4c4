use crate::models::{
    EnrichedStarRow, NewStar, ReactionRow, StarRow, TwinLinkRow, TwinMatch, TwinPosition,
};
use crate::{Database, format_timestamp, parse_timestamp};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use constellation_types::models::{ActionCategory, Theme};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, TransactionBehavior};
use uuid::Uuid;

/// Star columns plus computed brightness and the twin's position, resolved
/// through whichever side of `twin_links` the star sits on.
const ENRICHED_STAR_SELECT: &str = "
    SELECT s.id, s.message, s.theme, s.pos_x, s.pos_y, s.created_at,
           (SELECT COUNT(*) FROM reactions r WHERE r.star_id = s.id) AS brightness,
           t.id, t.pos_x, t.pos_y
    FROM stars s
    LEFT JOIN stars t ON t.id = (
        SELECT CASE WHEN l.star_a_id = s.id THEN l.star_b_id ELSE l.star_a_id END
        FROM twin_links l
        WHERE l.star_a_id = s.id OR l.star_b_id = s.id
        ORDER BY l.created_at
        LIMIT 1
    )";

impl Database {
    // -- Stars --

    pub fn create_star(&self, new: &NewStar) -> Result<StarRow> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO stars (id, message, theme, code_hash, pos_x, pos_y, ip_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id,
                    new.message,
                    new.theme.as_str(),
                    new.code_hash,
                    new.pos_x,
                    new.pos_y,
                    new.ip_hash,
                    format_timestamp(new.created_at),
                ],
            )?;
            Ok(())
        })?;

        Ok(StarRow {
            id,
            message: new.message.clone(),
            theme: new.theme,
            code_hash: new.code_hash.clone(),
            pos_x: new.pos_x,
            pos_y: new.pos_y,
            ip_hash: new.ip_hash.clone(),
            created_at: new.created_at,
        })
    }

    pub fn find_star_by_id(&self, id: &str) -> Result<Option<StarRow>> {
        self.with_conn(|conn| query_star_by_id(conn, id))
    }

    pub fn find_enriched_star(&self, id: &str) -> Result<Option<EnrichedStarRow>> {
        self.with_conn(|conn| {
            let sql = format!("{ENRICHED_STAR_SELECT} WHERE s.id = ?1");
            let row = conn
                .query_row(&sql, [id], enriched_star_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Newest first, optionally restricted to one theme.
    pub fn list_stars(
        &self,
        theme: Option<Theme>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EnrichedStarRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{ENRICHED_STAR_SELECT}
                 WHERE (?1 IS NULL OR s.theme = ?1)
                 ORDER BY s.created_at DESC, s.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![theme.map(|t| t.as_str()), limit, offset],
                    enriched_star_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reactions --

    pub fn count_reactions(&self, star_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM reactions WHERE star_id = ?1",
                [star_id],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }

    /// Number of actions of `category` by `identity_hash` at or after
    /// `window_start`.
    pub fn count_recent_actions(
        &self,
        identity_hash: &str,
        category: ActionCategory,
        window_start: DateTime<Utc>,
    ) -> Result<u64> {
        let sql = match category {
            ActionCategory::Post => {
                "SELECT COUNT(*) FROM stars WHERE ip_hash = ?1 AND created_at >= ?2"
            }
            ActionCategory::React => {
                "SELECT COUNT(*) FROM reactions WHERE ip_hash = ?1 AND created_at >= ?2"
            }
        };
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                sql,
                rusqlite::params![identity_hash, format_timestamp(window_start)],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }

    pub fn find_reaction_in_window(
        &self,
        star_id: &str,
        identity_hash: &str,
        window_start: DateTime<Utc>,
    ) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, star_id, ip_hash, created_at FROM reactions
                     WHERE star_id = ?1 AND ip_hash = ?2 AND created_at >= ?3
                     ORDER BY created_at DESC
                     LIMIT 1",
                    rusqlite::params![star_id, identity_hash, format_timestamp(window_start)],
                    reaction_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn create_reaction(
        &self,
        star_id: &str,
        identity_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<ReactionRow> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reactions (id, star_id, ip_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, star_id, identity_hash, format_timestamp(created_at)],
            )?;
            Ok(())
        })?;

        Ok(ReactionRow {
            id,
            star_id: star_id.to_string(),
            ip_hash: identity_hash.to_string(),
            created_at,
        })
    }

    // -- Twin links --

    /// Link two stars. Refuses self-links and stars that already have a twin.
    pub fn create_twin_link(
        &self,
        star_a_id: &str,
        star_b_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<TwinLinkRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let link = insert_twin_link(&tx, star_a_id, star_b_id, created_at)?;
            tx.commit()?;
            Ok(link)
        })
    }

    /// A star sharing `code_hash`, other than `exclude_star_id`, that is not
    /// on either side of any twin link. Oldest first.
    pub fn find_unlinked_twin_candidate(
        &self,
        code_hash: &str,
        exclude_star_id: &str,
    ) -> Result<Option<StarRow>> {
        self.with_conn(|conn| query_unlinked_twin_candidate(conn, code_hash, exclude_star_id))
    }

    pub fn find_twin_link_for_star(&self, star_id: &str) -> Result<Option<TwinLinkRow>> {
        self.with_conn(|conn| query_twin_link_for_star(conn, star_id))
    }

    /// Find-then-link as one immediate transaction under the writer lock, so
    /// two stars posted concurrently with the same code cannot both miss
    /// each other or both claim the same candidate.
    pub fn link_unlinked_twin(
        &self,
        star_id: &str,
        code_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Option<TwinMatch>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if query_twin_link_for_star(&tx, star_id)?.is_some() {
                return Ok(None);
            }
            let Some(candidate) = query_unlinked_twin_candidate(&tx, code_hash, star_id)? else {
                return Ok(None);
            };

            let link = insert_twin_link(&tx, star_id, &candidate.id, created_at)?;
            tx.commit()?;
            Ok(Some(TwinMatch {
                link,
                partner: TwinPosition {
                    id: candidate.id,
                    pos_x: candidate.pos_x,
                    pos_y: candidate.pos_y,
                },
            }))
        })
    }
}

fn query_star_by_id(conn: &Connection, id: &str) -> Result<Option<StarRow>> {
    let row = conn
        .query_row(
            "SELECT id, message, theme, code_hash, pos_x, pos_y, ip_hash, created_at
             FROM stars WHERE id = ?1",
            [id],
            star_from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_unlinked_twin_candidate(
    conn: &Connection,
    code_hash: &str,
    exclude_star_id: &str,
) -> Result<Option<StarRow>> {
    let row = conn
        .query_row(
            "SELECT s.id, s.message, s.theme, s.code_hash, s.pos_x, s.pos_y, s.ip_hash, s.created_at
             FROM stars s
             WHERE s.code_hash = ?1
               AND s.id <> ?2
               AND NOT EXISTS (
                   SELECT 1 FROM twin_links l
                   WHERE l.star_a_id = s.id OR l.star_b_id = s.id
               )
             ORDER BY s.created_at ASC, s.rowid ASC
             LIMIT 1",
            rusqlite::params![code_hash, exclude_star_id],
            star_from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_twin_link_for_star(conn: &Connection, star_id: &str) -> Result<Option<TwinLinkRow>> {
    let row = conn
        .query_row(
            "SELECT id, star_a_id, star_b_id, created_at FROM twin_links
             WHERE star_a_id = ?1 OR star_b_id = ?1
             ORDER BY created_at
             LIMIT 1",
            [star_id],
            twin_link_from_row,
        )
        .optional()?;
    Ok(row)
}

fn insert_twin_link(
    conn: &Connection,
    star_a_id: &str,
    star_b_id: &str,
    created_at: DateTime<Utc>,
) -> Result<TwinLinkRow> {
    if star_a_id == star_b_id {
        bail!("Refusing to link star {} to itself", star_a_id);
    }
    for star_id in [star_a_id, star_b_id] {
        if query_twin_link_for_star(conn, star_id)?.is_some() {
            bail!("Star {} already has a twin", star_id);
        }
    }

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO twin_links (id, star_a_id, star_b_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id, star_a_id, star_b_id, format_timestamp(created_at)],
    )?;

    Ok(TwinLinkRow {
        id,
        star_a_id: star_a_id.to_string(),
        star_b_id: star_b_id.to_string(),
        created_at,
    })
}

// -- Row mapping --

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn theme_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Theme> {
    let raw: String = row.get(idx)?;
    Theme::parse(&raw).ok_or_else(|| conversion_error(idx, format!("unknown theme '{}'", raw)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| conversion_error(idx, format!("bad timestamp '{}': {}", raw, e)))
}

fn star_from_row(row: &Row<'_>) -> rusqlite::Result<StarRow> {
    Ok(StarRow {
        id: row.get(0)?,
        message: row.get(1)?,
        theme: theme_column(row, 2)?,
        code_hash: row.get(3)?,
        pos_x: row.get(4)?,
        pos_y: row.get(5)?,
        ip_hash: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
    })
}

fn enriched_star_from_row(row: &Row<'_>) -> rusqlite::Result<EnrichedStarRow> {
    let brightness: i64 = row.get(6)?;
    let twin_id: Option<String> = row.get(7)?;
    let twin = match twin_id {
        Some(id) => Some(TwinPosition {
            id,
            pos_x: row.get(8)?,
            pos_y: row.get(9)?,
        }),
        None => None,
    };

    Ok(EnrichedStarRow {
        id: row.get(0)?,
        message: row.get(1)?,
        theme: theme_column(row, 2)?,
        pos_x: row.get(3)?,
        pos_y: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        brightness: brightness as u64,
        twin,
    })
}

fn reaction_from_row(row: &Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        id: row.get(0)?,
        star_id: row.get(1)?,
        ip_hash: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}

fn twin_link_from_row(row: &Row<'_>) -> rusqlite::Result<TwinLinkRow> {
    Ok(TwinLinkRow {
        id: row.get(0)?,
        star_a_id: row.get(1)?,
        star_b_id: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (stars, reactions, twin links)");
        conn.execute_batch(
            "
            CREATE TABLE stars (
                id          TEXT PRIMARY KEY,
                message     TEXT NOT NULL,
                theme       TEXT NOT NULL CHECK (theme IN (
                                'CRUSH', 'FIRST_LOVE', 'UNSENT_APOLOGY', 'LONG_DISTANCE',
                                'SECRET_ADMIRER', 'MOVING_ON', 'WHAT_IF', 'GRATITUDE')),
                code_hash   TEXT,
                pos_x       REAL NOT NULL,
                pos_y       REAL NOT NULL,
                ip_hash     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_stars_created ON stars(created_at);
            CREATE INDEX idx_stars_theme ON stars(theme, created_at);
            CREATE INDEX idx_stars_ip ON stars(ip_hash, created_at);
            CREATE INDEX idx_stars_code ON stars(code_hash) WHERE code_hash IS NOT NULL;

            -- No uniqueness on (star_id, ip_hash): the same visitor may react
            -- again once the hourly window has passed.
            CREATE TABLE reactions (
                id          TEXT PRIMARY KEY,
                star_id     TEXT NOT NULL REFERENCES stars(id),
                ip_hash     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_reactions_star ON reactions(star_id, ip_hash, created_at);
            CREATE INDEX idx_reactions_ip ON reactions(ip_hash, created_at);

            CREATE TABLE twin_links (
                id          TEXT PRIMARY KEY,
                star_a_id   TEXT NOT NULL UNIQUE REFERENCES stars(id),
                star_b_id   TEXT NOT NULL UNIQUE REFERENCES stars(id),
                created_at  TEXT NOT NULL,
                CHECK (star_a_id <> star_b_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

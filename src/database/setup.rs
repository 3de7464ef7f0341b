use anyhow::{Context, Result, bail};

use super::connection::DbConn;

/// Bumped whenever `schema.sql` changes shape
pub const SCHEMA_VERSION: i64 = 1;

/// Create any missing tables; existing data is left untouched.
///
/// Refuses databases written by a newer schema.
pub fn initialize_schema(conn: &mut DbConn) -> Result<()> {
    let found = schema_version(conn)?;
    if found > SCHEMA_VERSION {
        bail!("Database schema v{} is newer than supported v{}", found, SCHEMA_VERSION);
    }

    let tx = conn.transaction().context("Failed to start schema transaction")?;
    tx.execute_batch(include_str!("schema.sql"))
        .context("Failed to apply schema.sql")?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("Failed to record schema version")?;
    tx.commit().context("Failed to commit schema")?;

    if found < SCHEMA_VERSION {
        log::info!("Database schema upgraded v{} → v{}", found, SCHEMA_VERSION);
    }
    Ok(())
}

pub fn schema_version(conn: &DbConn) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read schema version")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::{create_memory_pool, get_connection};

    #[test]
    fn applying_twice_keeps_rows() {
        let pool = create_memory_pool().unwrap();
        let mut conn = get_connection(&pool).unwrap();

        initialize_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO run_records (player_id, player_name, tier, wave, recorded_at)
             VALUES ('p1', 'one', 3, 40, '2026-10-14T01:00:00Z')",
            [],
        )
        .unwrap();
        initialize_schema(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM run_records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let pool = create_memory_pool().unwrap();
        let mut conn = get_connection(&pool).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();

        assert!(initialize_schema(&mut conn).is_err());
    }
}

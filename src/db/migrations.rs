use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Schema scripts in order; script `n` upgrades `user_version` `n` to `n + 1`.
const SCHEMAS: &[(&str, &str)] = &[("schema_v1.sql", include_str!("schemas/schema_v1.sql"))];

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = SCHEMAS.len() as i32;

fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")
}

/// Bring the reading store schema up to `CURRENT_SCHEMA_VERSION` in one transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;
    let Ok(applied) = usize::try_from(found) else {
        bail!("database reports negative schema version {found}");
    };
    if found > CURRENT_SCHEMA_VERSION {
        bail!("database version ({found}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})");
    }

    let pending = &SCHEMAS[applied..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;
    for (name, sql) in pending {
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply {name}"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    log::info!(
        "Reading store schema migrated from v{found} to v{CURRENT_SCHEMA_VERSION}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('location_readings')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(columns.iter().any(|c| c == "location"));
        assert!(columns.iter().any(|c| c == "signal_strength"));
    }

    #[test]
    fn rejects_newer_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
        let err = run_migrations(&mut conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported schema"));
    }
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (accounts, follows, verify tokens)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                mail            TEXT NOT NULL,
                nickname        TEXT NOT NULL,
                passphrase_hash TEXT NOT NULL,
                bio             TEXT NOT NULL DEFAULT '',
                role            TEXT NOT NULL CHECK (role IN ('normal', 'moderator', 'admin')),
                frozen          TEXT NOT NULL CHECK (frozen IN ('normal', 'frozen')),
                silenced        TEXT NOT NULL CHECK (silenced IN ('normal', 'silenced')),
                status          TEXT NOT NULL CHECK (status IN ('notActivated', 'active', 'deleted')),
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                deleted_at      TEXT
            );

            CREATE TABLE account_follows (
                from_id     TEXT NOT NULL REFERENCES accounts(id),
                target_id   TEXT NOT NULL REFERENCES accounts(id),
                created_at  TEXT NOT NULL,
                PRIMARY KEY (from_id, target_id),
                CHECK (from_id <> target_id)
            );

            CREATE INDEX idx_account_follows_target
                ON account_follows(target_id, created_at);

            CREATE TABLE verify_tokens (
                account_id  TEXT PRIMARY KEY REFERENCES accounts(id),
                token       TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

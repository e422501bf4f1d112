use crate::Database;
use crate::models::{AccountRow, FollowRow, VerifyTokenRow};
use anyhow::Result;
use rusqlite::{Connection, Row, ffi};

/// Stays under SQLite's bound-parameter limit for any build.
const MAX_IDS_PER_QUERY: usize = 500;

const ACCOUNT_COLUMNS: &str = "id, name, mail, nickname, passphrase_hash, bio, role, frozen, \
                               silenced, status, created_at, updated_at, deleted_at";

impl Database {
    // -- Accounts --

    /// Returns `false` when the id or name is already taken.
    pub fn insert_account(&self, row: &AccountRow) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                &format!(
                    "INSERT INTO accounts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    ACCOUNT_COLUMNS
                ),
                rusqlite::params![
                    row.id,
                    row.name,
                    row.mail,
                    row.nickname,
                    row.passphrase_hash,
                    row.bio,
                    row.role,
                    row.frozen,
                    row.silenced,
                    row.status,
                    row.created_at,
                    row.updated_at,
                    row.deleted_at,
                ],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_account_by_name(&self, name: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "name", name))
    }

    pub fn get_account_by_id(&self, id: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "id", id))
    }

    /// Batch-fetch accounts for a set of ids, one query per chunk.
    pub fn get_accounts_by_ids(&self, ids: &[String]) -> Result<Vec<AccountRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
                let placeholders: Vec<String> =
                    (1..=chunk.len()).map(|i| format!("?{}", i)).collect();
                let sql = format!(
                    "SELECT {} FROM accounts WHERE id IN ({})",
                    ACCOUNT_COLUMNS,
                    placeholders.join(", ")
                );

                let mut stmt = conn.prepare_cached(&sql)?;
                let found = stmt
                    .query_map(rusqlite::params_from_iter(chunk.iter()), account_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows.extend(found);
            }

            Ok(rows)
        })
    }

    /// Overwrite every mutable column. Returns the number of rows changed.
    pub fn update_account(&self, row: &AccountRow) -> Result<usize> {
        self.with_conn(|conn| update_account(conn, row, None))
    }

    /// Like [`Database::update_account`] but only while the stored
    /// `updated_at` still equals `observed`.
    pub fn update_account_unmodified_since(&self, row: &AccountRow, observed: &str) -> Result<usize> {
        self.with_conn(|conn| update_account(conn, row, Some(observed)))
    }

    // -- Follows --

    /// Inserting an existing edge is ignored.
    pub fn insert_follow(&self, row: &FollowRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO account_follows (from_id, target_id, created_at) VALUES (?1, ?2, ?3)",
                (&row.from_id, &row.target_id, &row.created_at),
            )?;
            Ok(())
        })
    }

    pub fn delete_follow(&self, from_id: &str, target_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM account_follows WHERE from_id = ?1 AND target_id = ?2",
                (from_id, target_id),
            )?;
            Ok(())
        })
    }

    pub fn get_followings(&self, from_id: &str) -> Result<Vec<FollowRow>> {
        self.with_conn(|conn| query_follows(conn, "from_id", from_id))
    }

    pub fn get_followers(&self, target_id: &str) -> Result<Vec<FollowRow>> {
        self.with_conn(|conn| query_follows(conn, "target_id", target_id))
    }

    // -- Verify tokens --

    /// Store `row` as the account's only token.
    pub fn upsert_verify_token(&self, row: &VerifyTokenRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO verify_tokens (account_id, token, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(account_id) DO UPDATE SET token = excluded.token, expires_at = excluded.expires_at",
                (&row.account_id, &row.token, &row.expires_at),
            )?;
            Ok(())
        })
    }

    pub fn get_verify_token(&self, account_id: &str) -> Result<Option<VerifyTokenRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT account_id, token, expires_at FROM verify_tokens WHERE account_id = ?1",
                [account_id],
                |row| {
                    Ok(VerifyTokenRow {
                        account_id: row.get(0)?,
                        token: row.get(1)?,
                        expires_at: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn delete_verify_token(&self, account_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM verify_tokens WHERE account_id = ?1", [account_id])?;
            Ok(())
        })
    }
}

/// Only a taken id or name counts as "already exists"; other constraint
/// failures are real errors.
fn is_unique_violation(e: &ffi::Error) -> bool {
    matches!(
        e.extended_code,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn account_row(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        name: row.get(1)?,
        mail: row.get(2)?,
        nickname: row.get(3)?,
        passphrase_hash: row.get(4)?,
        bio: row.get(5)?,
        role: row.get(6)?,
        frozen: row.get(7)?,
        silenced: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        deleted_at: row.get(12)?,
    })
}

/// `column` is always one of our own literals, never user input.
fn query_account(conn: &Connection, column: &str, value: &str) -> Result<Option<AccountRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts WHERE {} = ?1",
        ACCOUNT_COLUMNS, column
    ))?;

    stmt.query_row([value], account_row).optional()
}

fn update_account(conn: &Connection, row: &AccountRow, observed: Option<&str>) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE accounts
         SET mail = ?2, nickname = ?3, passphrase_hash = ?4, bio = ?5, role = ?6, frozen = ?7,
             silenced = ?8, status = ?9, updated_at = ?10, deleted_at = ?11
         WHERE id = ?1 AND (?12 IS NULL OR updated_at = ?12)",
        rusqlite::params![
            row.id,
            row.mail,
            row.nickname,
            row.passphrase_hash,
            row.bio,
            row.role,
            row.frozen,
            row.silenced,
            row.status,
            row.updated_at,
            row.deleted_at,
            observed,
        ],
    )?;
    Ok(changed)
}

fn query_follows(conn: &Connection, column: &str, value: &str) -> Result<Vec<FollowRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT from_id, target_id, created_at FROM account_follows
         WHERE {} = ?1
         ORDER BY created_at, rowid",
        column
    ))?;

    let rows = stmt
        .query_map([value], |row| {
            Ok(FollowRow {
                from_id: row.get(0)?,
                target_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
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

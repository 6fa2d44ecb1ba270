//! Table layout for candidates, voters and the vote log
//!
//! Statements are idempotent and run on every connect.

use sqlx::SqlitePool;

use crate::Result;

const CREATE_CANDIDATES: &str = r#"
CREATE TABLE IF NOT EXISTS candidates (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT    NOT NULL,
    party          TEXT    NOT NULL,
    ballot_number  INTEGER NOT NULL UNIQUE,
    office         TEXT    NOT NULL,
    vote_count     INTEGER NOT NULL DEFAULT 0 CHECK (vote_count >= 0),
    active         BOOLEAN NOT NULL DEFAULT TRUE,
    registered_at  TEXT    NOT NULL
)
"#;

const CREATE_VOTERS: &str = r#"
CREATE TABLE IF NOT EXISTS voters (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier     TEXT    NOT NULL UNIQUE,
    name           TEXT    NOT NULL,
    email          TEXT    NULL,
    has_voted      BOOLEAN NOT NULL DEFAULT FALSE,
    registered_at  TEXT    NOT NULL
)
"#;

const CREATE_VOTES: &str = r#"
CREATE TABLE IF NOT EXISTS votes (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    voter_identifier  TEXT    NOT NULL REFERENCES voters (identifier),
    candidate_id      INTEGER NOT NULL REFERENCES candidates (id),
    office            TEXT    NOT NULL,
    cast_at           TEXT    NOT NULL
)
"#;

// One vote per voter per office.
const CREATE_VOTES_VOTER_OFFICE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS votes_voter_office
    ON votes (voter_identifier, office)
"#;

// One vote per voter per candidate, whatever office the candidate holds later.
const CREATE_VOTES_VOTER_CANDIDATE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS votes_voter_candidate
    ON votes (voter_identifier, candidate_id)
"#;

const CREATE_VOTES_CANDIDATE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS votes_candidate
    ON votes (candidate_id)
"#;

const CREATE_VOTES_NO_UPDATE: &str = r#"
CREATE TRIGGER IF NOT EXISTS votes_append_only_update
BEFORE UPDATE ON votes
BEGIN
    SELECT RAISE(ABORT, 'votes are append-only');
END
"#;

const CREATE_VOTES_NO_DELETE: &str = r#"
CREATE TRIGGER IF NOT EXISTS votes_append_only_delete
BEFORE DELETE ON votes
BEGIN
    SELECT RAISE(ABORT, 'votes are append-only');
END
"#;

const CREATE_HAS_VOTED_STICKY: &str = r#"
CREATE TRIGGER IF NOT EXISTS voters_has_voted_sticky
BEFORE UPDATE OF has_voted ON voters
WHEN OLD.has_voted AND NOT NEW.has_voted
BEGIN
    SELECT RAISE(ABORT, 'has_voted cannot be reset');
END
"#;

const STATEMENTS: &[(&str, &str)] = &[
    ("candidates", CREATE_CANDIDATES),
    ("voters", CREATE_VOTERS),
    ("votes", CREATE_VOTES),
    ("votes_voter_office", CREATE_VOTES_VOTER_OFFICE_INDEX),
    ("votes_voter_candidate", CREATE_VOTES_VOTER_CANDIDATE_INDEX),
    ("votes_candidate", CREATE_VOTES_CANDIDATE_INDEX),
    ("votes_append_only_update", CREATE_VOTES_NO_UPDATE),
    ("votes_append_only_delete", CREATE_VOTES_NO_DELETE),
    ("voters_has_voted_sticky", CREATE_HAS_VOTED_STICKY),
];

/// Create every table, index and trigger that does not exist yet
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for (name, statement) in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
        tracing::debug!(object = name, "schema object ensured");
    }
    Ok(())
}

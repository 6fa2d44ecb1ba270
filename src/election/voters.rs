//! Voter registry

use chrono::Utc;

use crate::storage::{self, Store};
use crate::types::{NewVoter, Voter, VoterId, VoterIdentifier, VotingStatus};
use crate::{Error, Result, validation_error};

/// Registry of voters backed by the `voters` table
#[derive(Debug, Clone)]
pub struct VoterRegistry {
    store: Store,
}

impl VoterRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Register a voter under an externally assigned identifier
    ///
    /// Fails with [`Error::DuplicateIdentifier`] when the identifier is taken.
    /// A blank email is stored as absent.
    pub async fn register(&self, voter: NewVoter) -> Result<VoterId> {
        let name = voter.name.trim();
        if name.is_empty() {
            return Err(validation_error!("name", "must not be blank"));
        }
        let email = voter
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());

        let mut tx = self.store.begin_write("register_voter").await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO voters (identifier, name, email, registered_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(voter.identifier.as_str())
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .execute(tx.conn())
        .await;

        let id = match inserted {
            Ok(done) => VoterId(done.last_insert_rowid()),
            Err(err) if storage::is_unique_violation(&err) => {
                tx.rollback().await?;
                tracing::warn!("voter rejected: identifier already registered");
                return Err(Error::DuplicateIdentifier {
                    identifier: voter.identifier.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;
        tracing::info!(voter_id = id.0, "Voter registered");
        Ok(id)
    }

    /// Has this identifier voted, not voted, or never been registered?
    pub async fn has_voted(&self, identifier: &VoterIdentifier) -> Result<VotingStatus> {
        let has_voted: Option<bool> =
            sqlx::query_scalar("SELECT has_voted FROM voters WHERE identifier = ?1")
                .bind(identifier.as_str())
                .fetch_optional(self.store.pool())
                .await?;

        Ok(match has_voted {
            Some(true) => VotingStatus::Voted,
            Some(false) => VotingStatus::NotVoted,
            None => VotingStatus::UnknownVoter,
        })
    }

    pub async fn find(&self, identifier: &VoterIdentifier) -> Result<Option<Voter>> {
        let row = sqlx::query(
            r#"
            SELECT id, identifier, name, email, has_voted, registered_at
            FROM voters
            WHERE identifier = ?1
            "#,
        )
        .bind(identifier.as_str())
        .fetch_optional(self.store.pool())
        .await?;

        row.as_ref().map(storage::voter_from_row).transpose()
    }
}

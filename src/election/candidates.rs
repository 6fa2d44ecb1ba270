//! Candidate registry
//!
//! Registers, lists, rewrites and soft-deletes candidates. Ballot numbers are
//! reserved permanently: the unique constraint covers inactive rows too.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::ElectionRules;
use crate::storage::{self, Store};
use crate::types::{Candidate, CandidateId, NewCandidate};
use crate::{Error, Result, validation_error};

const SELECT_CANDIDATE: &str = r#"
SELECT id, name, party, ballot_number, office, vote_count, active, registered_at
FROM candidates
"#;

/// Registry of candidates backed by the `candidates` table
#[derive(Debug, Clone)]
pub struct CandidateRegistry {
    store: Store,
    rules: ElectionRules,
}

impl CandidateRegistry {
    pub fn new(store: Store, rules: ElectionRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> &ElectionRules {
        &self.rules
    }

    /// Register a new active candidate with a zero tally
    ///
    /// Fails with [`Error::DuplicateBallotNumber`] when any candidate, active
    /// or not, already holds the ballot number.
    pub async fn register(&self, candidate: NewCandidate) -> Result<CandidateId> {
        let candidate = self.validate(candidate)?;

        let mut tx = self.store.begin_write("register_candidate").await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO candidates (name, party, ballot_number, office, registered_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&candidate.name)
        .bind(&candidate.party)
        .bind(candidate.ballot_number)
        .bind(&candidate.office)
        .bind(Utc::now())
        .execute(tx.conn())
        .await;

        let id = match inserted {
            Ok(done) => CandidateId(done.last_insert_rowid()),
            Err(err) if storage::is_unique_violation(&err) => {
                tx.rollback().await?;
                tracing::warn!(
                    ballot_number = candidate.ballot_number,
                    "candidate rejected: ballot number already registered"
                );
                return Err(Error::DuplicateBallotNumber {
                    ballot_number: candidate.ballot_number,
                });
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;

        tracing::info!(
            candidate_id = id.0,
            ballot_number = candidate.ballot_number,
            office = %candidate.office,
            "Candidate registered"
        );

        Ok(id)
    }

    /// Candidates ordered by office, then ballot number
    ///
    /// With `active_only = false` inactive candidates are included.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Candidate>> {
        let query = if active_only {
            format!("{SELECT_CANDIDATE} WHERE active = TRUE ORDER BY office, ballot_number")
        } else {
            format!("{SELECT_CANDIDATE} ORDER BY office, ballot_number")
        };

        let rows = sqlx::query(&query).fetch_all(self.store.pool()).await?;
        rows.iter().map(storage::candidate_from_row).collect()
    }

    pub async fn get(&self, id: CandidateId) -> Result<Option<Candidate>> {
        let row = sqlx::query(&format!("{SELECT_CANDIDATE} WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(self.store.pool())
            .await?;

        row.as_ref().map(storage::candidate_from_row).transpose()
    }

    /// Rewrite a candidate's name, party, ballot number and office
    ///
    /// The tally and the active flag are left alone. The office can only
    /// change while the candidate has no votes.
    pub async fn update(&self, id: CandidateId, candidate: NewCandidate) -> Result<()> {
        let candidate = self.validate(candidate)?;

        let mut tx = self.store.begin_write("update_candidate").await?;

        let current: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT office, (SELECT COUNT(*) FROM votes WHERE candidate_id = ?1)
            FROM candidates
            WHERE id = ?1
            "#,
        )
        .bind(id.0)
        .fetch_optional(tx.conn())
        .await?;

        let Some((office, votes)) = current else {
            tx.rollback().await?;
            return Err(Error::CandidateNotFound { id: id.0 });
        };
        if votes > 0 && office != candidate.office {
            tx.rollback().await?;
            return Err(validation_error!(
                "office",
                "candidate {} already has {} vote(s) for '{}'",
                id,
                votes,
                office
            ));
        }

        let updated = sqlx::query(
            r#"
            UPDATE candidates
            SET name = ?1, party = ?2, ballot_number = ?3, office = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&candidate.name)
        .bind(&candidate.party)
        .bind(candidate.ballot_number)
        .bind(&candidate.office)
        .bind(id.0)
        .execute(tx.conn())
        .await;

        let rows = match updated {
            Ok(done) => done.rows_affected(),
            Err(err) if storage::is_unique_violation(&err) => {
                tx.rollback().await?;
                return Err(Error::DuplicateBallotNumber {
                    ballot_number: candidate.ballot_number,
                });
            }
            Err(err) => return Err(err.into()),
        };

        if rows == 0 {
            tx.rollback().await?;
            return Err(Error::CandidateNotFound { id: id.0 });
        }

        tx.commit().await?;
        tracing::info!(candidate_id = id.0, "Candidate updated");
        Ok(())
    }

    /// Soft-delete a candidate
    ///
    /// The row, its ballot number and its tally are kept. Deactivating an
    /// already inactive candidate succeeds.
    pub async fn deactivate(&self, id: CandidateId) -> Result<()> {
        let mut tx = self.store.begin_write("deactivate_candidate").await?;

        let rows = sqlx::query("UPDATE candidates SET active = FALSE WHERE id = ?1")
            .bind(id.0)
            .execute(tx.conn())
            .await?
            .rows_affected();

        if rows == 0 {
            tx.rollback().await?;
            return Err(Error::CandidateNotFound { id: id.0 });
        }

        tx.commit().await?;
        tracing::info!(candidate_id = id.0, "Candidate deactivated");
        Ok(())
    }

    /// Active candidates grouped by office, each group in ballot-number order
    pub async fn ballot(&self) -> Result<BTreeMap<String, Vec<Candidate>>> {
        let mut offices: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
        for candidate in self.list(true).await? {
            offices
                .entry(candidate.office.clone())
                .or_default()
                .push(candidate);
        }
        Ok(offices)
    }

    fn validate(&self, candidate: NewCandidate) -> Result<NewCandidate> {
        let name = required("name", &candidate.name)?;
        let party = required("party", &candidate.party)?;
        let office = required("office", &candidate.office)?;

        if !self.rules.ballot_number_in_range(candidate.ballot_number) {
            return Err(validation_error!(
                "ballot_number",
                "{} is outside {}..={}",
                candidate.ballot_number,
                self.rules.ballot_number_min,
                self.rules.ballot_number_max
            ));
        }

        if !self.rules.allows_office(&office) {
            return Err(validation_error!("office", "'{}' is not contested", office));
        }

        Ok(NewCandidate {
            name,
            party,
            ballot_number: candidate.ballot_number,
            office,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(validation_error!(field, "must not be blank"));
    }
    Ok(value.to_string())
}

//! Results aggregation
//!
//! Read-only. Rankings come from the materialized `vote_count` of active
//! candidates; [`ResultsAggregator::verify_tallies`] cross-checks those
//! counts against the vote log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::Result;
use crate::storage::{self, Store};
use crate::types::{CandidateId, ElectionSummary, ResultEntry, Vote, VoterIdentifier};

/// Rankings plus totals, ready for a presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ResultsReport {
    pub generated_at: DateTime<Utc>,
    pub offices: BTreeMap<String, Vec<ResultEntry>>,
    pub summary: ElectionSummary,
}

impl ResultsReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A candidate whose stored tally disagrees with the vote log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyDiscrepancy {
    pub candidate_id: CandidateId,
    pub ballot_number: i64,
    pub stored: i64,
    pub recomputed: i64,
}

/// Outcome of [`ResultsAggregator::verify_tallies`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyAudit {
    pub candidates_checked: usize,
    pub votes_in_log: i64,
    pub discrepancies: Vec<TallyDiscrepancy>,
}

impl TallyAudit {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ResultsAggregator {
    store: Store,
}

impl ResultsAggregator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Active candidates ranked per office
    ///
    /// Highest `vote_count` first; equal counts are ordered by ballot number.
    /// Offices whose candidates are all inactive do not appear.
    pub async fn results_by_office(&self) -> Result<BTreeMap<String, Vec<ResultEntry>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, party, ballot_number, office, vote_count
            FROM candidates
            WHERE active = TRUE
            ORDER BY office, vote_count DESC, ballot_number ASC
            "#,
        )
        .fetch_all(self.store.pool())
        .await?;

        let mut offices: BTreeMap<String, Vec<ResultEntry>> = BTreeMap::new();
        for row in &rows {
            let office: String = row.try_get("office")?;
            let entries = offices.entry(office).or_default();
            entries.push(ResultEntry {
                position: entries.len() + 1,
                candidate_id: CandidateId(row.try_get("id")?),
                name: row.try_get("name")?,
                party: row.try_get("party")?,
                ballot_number: row.try_get("ballot_number")?,
                vote_count: row.try_get("vote_count")?,
                percentage: 0.0,
            });
        }

        for entries in offices.values_mut() {
            let office_total: i64 = entries.iter().map(|entry| entry.vote_count).sum();
            if office_total > 0 {
                for entry in entries.iter_mut() {
                    entry.percentage = entry.vote_count as f64 * 100.0 / office_total as f64;
                }
            }
        }

        Ok(offices)
    }

    pub async fn total_voters(&self) -> Result<i64> {
        let total = sqlx::query_scalar("SELECT COUNT(*) FROM voters")
            .fetch_one(self.store.pool())
            .await?;
        Ok(total)
    }

    /// Number of vote rows, one per voter per office
    pub async fn total_votes_cast(&self) -> Result<i64> {
        let total = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(self.store.pool())
            .await?;
        Ok(total)
    }

    /// Vote log rows cast by one voter, oldest first
    pub async fn votes_for(&self, voter: &VoterIdentifier) -> Result<Vec<Vote>> {
        let rows = sqlx::query(
            r#"
            SELECT id, voter_identifier, candidate_id, office, cast_at
            FROM votes
            WHERE voter_identifier = ?1
            ORDER BY id
            "#,
        )
        .bind(voter.as_str())
        .fetch_all(self.store.pool())
        .await?;

        rows.iter().map(storage::vote_from_row).collect()
    }

    pub async fn summary(&self) -> Result<ElectionSummary> {
        let (total_voters, voters_who_voted, total_votes_cast, active_candidates): (
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM voters),
                (SELECT COUNT(*) FROM voters WHERE has_voted = TRUE),
                (SELECT COUNT(*) FROM votes),
                (SELECT COUNT(*) FROM candidates WHERE active = TRUE)
            "#,
        )
        .fetch_one(self.store.pool())
        .await?;

        let turnout = if total_voters > 0 {
            voters_who_voted as f64 * 100.0 / total_voters as f64
        } else {
            0.0
        };

        Ok(ElectionSummary {
            total_voters,
            voters_who_voted,
            total_votes_cast,
            active_candidates,
            turnout,
        })
    }

    /// Recount every candidate, active or not, from the vote log
    pub async fn verify_tallies(&self) -> Result<TallyAudit> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.ballot_number, c.vote_count, COUNT(v.id) AS recomputed
            FROM candidates c
            LEFT JOIN votes v ON v.candidate_id = c.id
            GROUP BY c.id
            ORDER BY c.id
            "#,
        )
        .fetch_all(self.store.pool())
        .await?;

        let mut votes_in_log = 0;
        let mut discrepancies = Vec::new();
        for row in &rows {
            let stored: i64 = row.try_get("vote_count")?;
            let recomputed: i64 = row.try_get("recomputed")?;
            votes_in_log += recomputed;

            if stored != recomputed {
                discrepancies.push(TallyDiscrepancy {
                    candidate_id: CandidateId(row.try_get("id")?),
                    ballot_number: row.try_get("ballot_number")?,
                    stored,
                    recomputed,
                });
            }
        }

        if !discrepancies.is_empty() {
            tracing::error!(
                count = discrepancies.len(),
                "🚨 Stored tallies disagree with the vote log"
            );
        }

        Ok(TallyAudit {
            candidates_checked: rows.len(),
            votes_in_log,
            discrepancies,
        })
    }

    /// Rankings and summary in one report
    pub async fn report(&self) -> Result<ResultsReport> {
        Ok(ResultsReport {
            generated_at: Utc::now(),
            offices: self.results_by_office().await?,
            summary: self.summary().await?,
        })
    }
}

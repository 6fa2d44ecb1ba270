//! Vote transaction engine
//!
//! Every vote is one atomic transaction that:
//! 1. Appends a row to the vote log
//! 2. Increments the candidate's tally
//! 3. Marks the voter as having voted
//!
//! All three commit together or none do. Voting happens inside a
//! [`BallotSession`]: the session is refused if the voter had already voted
//! when it was opened, and may then cast at most one vote per office. The
//! session's first commit flips `has_voted` with a conditional update, so two
//! sessions racing for the same voter cannot both commit. There is no
//! cross-office atomicity: if a later office aborts, earlier commits stand.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::storage::{self, Store};
use crate::types::{CandidateId, VoteId, VoterIdentifier};
use crate::{Result, voting_error};

/// Why a cast (or a session) was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum AbortReason {
    #[error("voter is not registered")]
    UnknownVoter,

    #[error("candidate does not exist or is inactive")]
    UnknownCandidate,

    #[error("voter has already voted")]
    AlreadyVoted,

    #[error("voter has already voted for {office}")]
    AlreadyVotedForOffice { office: String },

    #[error("candidate runs for {actual}, not {expected}")]
    OfficeMismatch { expected: String, actual: String },

    #[error("storage failure: {message}")]
    StorageFailure { message: String },
}

/// Proof of a committed vote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteReceipt {
    pub vote_id: VoteId,
    pub session_id: Uuid,
    pub voter_identifier: VoterIdentifier,
    pub candidate_id: CandidateId,
    pub office: String,
    pub cast_at: DateTime<Utc>,
}

/// Result of one per-office cast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CastOutcome {
    /// Vote row, tally and has-voted flag are all durable
    Committed(VoteReceipt),

    /// Nothing changed
    Aborted(AbortReason),
}

impl CastOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn receipt(&self) -> Option<&VoteReceipt> {
        match self {
            Self::Committed(receipt) => Some(receipt),
            Self::Aborted(_) => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Self::Committed(_) => None,
            Self::Aborted(reason) => Some(reason),
        }
    }
}

/// Result of opening a ballot session
#[derive(Debug)]
pub enum SessionResult<'e> {
    Opened(BallotSession<'e>),
    Rejected(AbortReason),
}

/// A voter's choices, one line per office
///
/// `None` is an abstention (blank vote): nothing is recorded for that office.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ballot {
    choices: BTreeMap<String, Option<CandidateId>>,
}

impl Ballot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose(mut self, office: impl Into<String>, candidate_id: CandidateId) -> Self {
        self.choices.insert(office.into(), Some(candidate_id));
        self
    }

    pub fn abstain(mut self, office: impl Into<String>) -> Self {
        self.choices.insert(office.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Lines in office order
    pub fn lines(&self) -> impl Iterator<Item = (&str, Option<CandidateId>)> {
        self.choices
            .iter()
            .map(|(office, choice)| (office.as_str(), *choice))
    }
}

/// What happened to one office of a ballot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LineOutcome {
    Abstained,
    Cast(CastOutcome),
}

/// Per-office outcome of [`VoteEngine::cast_ballot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallotReport {
    /// `None` when the session was refused
    pub session_id: Option<Uuid>,
    pub lines: Vec<(String, LineOutcome)>,
}

impl BallotReport {
    /// Every non-abstention line committed
    pub fn is_complete(&self) -> bool {
        self.lines.iter().all(|(_, outcome)| match outcome {
            LineOutcome::Abstained => true,
            LineOutcome::Cast(cast) => cast.is_committed(),
        })
    }

    pub fn committed(&self) -> usize {
        self.lines
            .iter()
            .filter(|(_, outcome)| matches!(outcome, LineOutcome::Cast(cast) if cast.is_committed()))
            .count()
    }

    pub fn outcome(&self, office: &str) -> Option<&LineOutcome> {
        self.lines
            .iter()
            .find(|(line_office, _)| line_office == office)
            .map(|(_, outcome)| outcome)
    }
}

/// Records votes against storage
#[derive(Debug, Clone)]
pub struct VoteEngine {
    store: Store,
}

impl VoteEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Cast a single vote as its own one-shot session
    ///
    /// Rejected with [`AbortReason::AlreadyVoted`] if the voter's has-voted
    /// flag is already set. Storage failures roll back and come back as
    /// [`AbortReason::StorageFailure`]; this never retries.
    pub async fn cast_vote(
        &self,
        voter: &VoterIdentifier,
        candidate_id: CandidateId,
    ) -> CastOutcome {
        let session_id = Uuid::new_v4();
        self.commit_or_abort(voter, candidate_id, None, session_id, true)
            .await
    }

    /// Start a ballot-casting session for a registered voter who has not voted
    pub async fn open_session(&self, voter: &VoterIdentifier) -> SessionResult<'_> {
        let has_voted: std::result::Result<Option<bool>, sqlx::Error> =
            sqlx::query_scalar("SELECT has_voted FROM voters WHERE identifier = ?1")
                .bind(voter.as_str())
                .fetch_optional(self.store.pool())
                .await;

        match has_voted {
            Ok(Some(false)) => {
                let session = BallotSession {
                    engine: self,
                    voter: voter.clone(),
                    session_id: Uuid::new_v4(),
                    committed_offices: BTreeSet::new(),
                };
                tracing::debug!(session_id = %session.session_id, "Ballot session opened");
                SessionResult::Opened(session)
            }
            Ok(Some(true)) => {
                tracing::warn!("🚫 Ballot session refused: voter has already voted");
                SessionResult::Rejected(AbortReason::AlreadyVoted)
            }
            Ok(None) => SessionResult::Rejected(AbortReason::UnknownVoter),
            Err(err) => {
                tracing::warn!(error = %err, "Ballot session refused: storage failure");
                SessionResult::Rejected(AbortReason::StorageFailure {
                    message: err.to_string(),
                })
            }
        }
    }

    /// Cast every non-abstention line of `ballot` in one session, office by office
    ///
    /// Each office is its own transaction. A failed office does not undo the
    /// offices committed before it, and the remaining offices are still tried.
    pub async fn cast_ballot(&self, voter: &VoterIdentifier, ballot: &Ballot) -> BallotReport {
        let mut session = match self.open_session(voter).await {
            SessionResult::Opened(session) => session,
            SessionResult::Rejected(reason) => {
                let lines = ballot
                    .lines()
                    .map(|(office, choice)| {
                        let outcome = match choice {
                            Some(_) => LineOutcome::Cast(CastOutcome::Aborted(reason.clone())),
                            None => LineOutcome::Abstained,
                        };
                        (office.to_string(), outcome)
                    })
                    .collect();
                return BallotReport {
                    session_id: None,
                    lines,
                };
            }
        };

        let mut lines = Vec::new();
        for (office, choice) in ballot.lines() {
            let outcome = match choice {
                Some(candidate_id) => {
                    LineOutcome::Cast(session.cast_for_office(office, candidate_id).await)
                }
                None => LineOutcome::Abstained,
            };
            lines.push((office.to_string(), outcome));
        }

        let report = BallotReport {
            session_id: Some(session.session_id()),
            lines,
        };

        if report.is_complete() {
            tracing::info!(
                session_id = %session.session_id(),
                committed = report.committed(),
                "✅ Ballot cast"
            );
        } else {
            tracing::warn!(
                session_id = %session.session_id(),
                committed = report.committed(),
                "Ballot partially cast"
            );
        }

        report
    }

    async fn commit_or_abort(
        &self,
        voter: &VoterIdentifier,
        candidate_id: CandidateId,
        expected_office: Option<&str>,
        session_id: Uuid,
        first_in_session: bool,
    ) -> CastOutcome {
        match self
            .commit_vote(voter, candidate_id, expected_office, session_id, first_in_session)
            .await
        {
            Ok(CastOutcome::Committed(receipt)) => {
                tracing::info!(
                    session_id = %session_id,
                    vote_id = receipt.vote_id.0,
                    candidate_id = candidate_id.0,
                    office = %receipt.office,
                    "🗳️ Vote committed"
                );
                CastOutcome::Committed(receipt)
            }
            Ok(CastOutcome::Aborted(reason)) => {
                tracing::warn!(
                    session_id = %session_id,
                    candidate_id = candidate_id.0,
                    reason = %reason,
                    "Vote aborted"
                );
                CastOutcome::Aborted(reason)
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    candidate_id = candidate_id.0,
                    error = %err,
                    "Vote aborted: transaction rolled back"
                );
                CastOutcome::Aborted(AbortReason::StorageFailure {
                    message: err.to_string(),
                })
            }
        }
    }

    /// The transaction itself. Any `Err` drops `tx`, which rolls back.
    async fn commit_vote(
        &self,
        voter: &VoterIdentifier,
        candidate_id: CandidateId,
        expected_office: Option<&str>,
        session_id: Uuid,
        first_in_session: bool,
    ) -> Result<CastOutcome> {
        let mut tx = self.store.begin_write("cast_vote").await?;

        let has_voted: Option<bool> =
            sqlx::query_scalar("SELECT has_voted FROM voters WHERE identifier = ?1")
                .bind(voter.as_str())
                .fetch_optional(tx.conn())
                .await?;
        let Some(has_voted) = has_voted else {
            tx.rollback().await?;
            return Ok(CastOutcome::Aborted(AbortReason::UnknownVoter));
        };

        let office: Option<String> =
            sqlx::query_scalar("SELECT office FROM candidates WHERE id = ?1 AND active = TRUE")
                .bind(candidate_id.0)
                .fetch_optional(tx.conn())
                .await?;
        let Some(office) = office else {
            tx.rollback().await?;
            return Ok(CastOutcome::Aborted(AbortReason::UnknownCandidate));
        };

        if let Some(expected) = expected_office {
            if expected != office {
                tx.rollback().await?;
                return Ok(CastOutcome::Aborted(AbortReason::OfficeMismatch {
                    expected: expected.to_string(),
                    actual: office,
                }));
            }
        }

        if first_in_session && has_voted {
            tx.rollback().await?;
            return Ok(CastOutcome::Aborted(AbortReason::AlreadyVoted));
        }

        // A vote for this candidate counts even if it was cast under an earlier office
        let office_taken: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM votes
            WHERE voter_identifier = ?1 AND (office = ?2 OR candidate_id = ?3)
            "#,
        )
        .bind(voter.as_str())
        .bind(&office)
        .bind(candidate_id.0)
        .fetch_one(tx.conn())
        .await?;
        if office_taken > 0 {
            tx.rollback().await?;
            return Ok(CastOutcome::Aborted(AbortReason::AlreadyVotedForOffice {
                office,
            }));
        }

        // Step 1: append to the vote log
        let cast_at = Utc::now();
        let inserted = sqlx::query(
            r#"
            INSERT INTO votes (voter_identifier, candidate_id, office, cast_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(voter.as_str())
        .bind(candidate_id.0)
        .bind(&office)
        .bind(cast_at)
        .execute(tx.conn())
        .await;

        let vote_id = match inserted {
            Ok(done) => VoteId(done.last_insert_rowid()),
            Err(err) if storage::is_unique_violation(&err) => {
                tx.rollback().await?;
                return Ok(CastOutcome::Aborted(AbortReason::AlreadyVotedForOffice {
                    office,
                }));
            }
            Err(err) => return Err(err.into()),
        };

        // Step 2: tally
        let tallied = sqlx::query(
            "UPDATE candidates SET vote_count = vote_count + 1 WHERE id = ?1 AND active = TRUE",
        )
        .bind(candidate_id.0)
        .execute(tx.conn())
        .await?
        .rows_affected();
        if tallied != 1 {
            return Err(voting_error!(
                "tally for candidate {} not updated",
                candidate_id
            ));
        }

        // Step 3: has-voted flag; a session's first commit only wins while it is still unset
        let marked = if first_in_session {
            sqlx::query(
                "UPDATE voters SET has_voted = TRUE WHERE identifier = ?1 AND has_voted = FALSE",
            )
        } else {
            sqlx::query("UPDATE voters SET has_voted = TRUE WHERE identifier = ?1")
        }
        .bind(voter.as_str())
        .execute(tx.conn())
        .await?
        .rows_affected();
        if marked != 1 {
            tx.rollback().await?;
            return Ok(CastOutcome::Aborted(AbortReason::AlreadyVoted));
        }

        tx.commit().await?;

        Ok(CastOutcome::Committed(VoteReceipt {
            vote_id,
            session_id,
            voter_identifier: voter.clone(),
            candidate_id,
            office,
            cast_at,
        }))
    }
}

/// One voter's ballot-casting visit
///
/// Obtained from [`VoteEngine::open_session`]. Each [`cast`](Self::cast) is
/// its own atomic transaction; the session only remembers which offices it
/// has committed.
#[derive(Debug)]
pub struct BallotSession<'e> {
    engine: &'e VoteEngine,
    voter: VoterIdentifier,
    session_id: Uuid,
    committed_offices: BTreeSet<String>,
}

impl BallotSession<'_> {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn voter(&self) -> &VoterIdentifier {
        &self.voter
    }

    /// Offices this session has committed a vote for
    pub fn committed_offices(&self) -> impl Iterator<Item = &str> {
        self.committed_offices.iter().map(String::as_str)
    }

    /// Cast a vote for `candidate_id` in whatever office the candidate contests
    pub async fn cast(&mut self, candidate_id: CandidateId) -> CastOutcome {
        self.cast_inner(candidate_id, None).await
    }

    /// Cast a vote, aborting with [`AbortReason::OfficeMismatch`] if the
    /// candidate does not run for `office`
    pub async fn cast_for_office(&mut self, office: &str, candidate_id: CandidateId) -> CastOutcome {
        self.cast_inner(candidate_id, Some(office)).await
    }

    async fn cast_inner(&mut self, candidate_id: CandidateId, office: Option<&str>) -> CastOutcome {
        let first_in_session = self.committed_offices.is_empty();
        let outcome = self
            .engine
            .commit_or_abort(
                &self.voter,
                candidate_id,
                office,
                self.session_id,
                first_in_session,
            )
            .await;

        if let CastOutcome::Committed(receipt) = &outcome {
            self.committed_offices.insert(receipt.office.clone());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElectionRules;
    use crate::election::{CandidateRegistry, VoterRegistry};
    use crate::types::{NewCandidate, NewVoter, VotingStatus};

    struct Fixture {
        store: Store,
        candidates: CandidateRegistry,
        voters: VoterRegistry,
        engine: VoteEngine,
    }

    async fn fixture() -> Fixture {
        let store = Store::in_memory().await.unwrap();
        Fixture {
            candidates: CandidateRegistry::new(store.clone(), ElectionRules::default()),
            voters: VoterRegistry::new(store.clone()),
            engine: VoteEngine::new(store.clone()),
            store,
        }
    }

    async fn voter(f: &Fixture, raw: &str) -> VoterIdentifier {
        let id = VoterIdentifier::parse(raw).unwrap();
        f.voters
            .register(NewVoter::new(id.clone(), "Test Voter"))
            .await
            .unwrap();
        id
    }

    async fn vote_count(f: &Fixture, id: CandidateId) -> i64 {
        f.candidates.get(id).await.unwrap().unwrap().vote_count
    }

    #[tokio::test]
    async fn test_cast_vote_commits_all_three_effects() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let mayor = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();

        let outcome = f.engine.cast_vote(&ana, mayor).await;
        let receipt = outcome.receipt().expect("vote should commit").clone();
        assert_eq!(receipt.office, "Mayor");
        assert_eq!(receipt.candidate_id, mayor);

        assert_eq!(vote_count(&f, mayor).await, 1);
        assert_eq!(f.voters.has_voted(&ana).await.unwrap(), VotingStatus::Voted);

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM votes WHERE voter_identifier = ?1 AND candidate_id = ?2",
        )
        .bind(ana.as_str())
        .bind(mayor.0)
        .fetch_one(f.store.pool())
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_preconditions() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let mayor = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();

        let stranger = VoterIdentifier::parse("99999999999").unwrap();
        assert_eq!(
            f.engine.cast_vote(&stranger, mayor).await,
            CastOutcome::Aborted(AbortReason::UnknownVoter)
        );

        assert_eq!(
            f.engine.cast_vote(&ana, CandidateId(777)).await,
            CastOutcome::Aborted(AbortReason::UnknownCandidate)
        );

        f.candidates.deactivate(mayor).await.unwrap();
        assert_eq!(
            f.engine.cast_vote(&ana, mayor).await,
            CastOutcome::Aborted(AbortReason::UnknownCandidate)
        );

        // Nothing above touched the voter
        assert_eq!(f.voters.has_voted(&ana).await.unwrap(), VotingStatus::NotVoted);
    }

    #[tokio::test]
    async fn test_second_one_shot_vote_is_rejected() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let mayor = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();
        let councillor = f
            .candidates
            .register(NewCandidate::new("Lia", "Red", 20, "Councillor"))
            .await
            .unwrap();

        assert!(f.engine.cast_vote(&ana, mayor).await.is_committed());
        assert_eq!(
            f.engine.cast_vote(&ana, councillor).await,
            CastOutcome::Aborted(AbortReason::AlreadyVoted)
        );
        assert_eq!(vote_count(&f, councillor).await, 0);
    }

    #[tokio::test]
    async fn test_session_casts_several_offices_once_each() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let mayor_a = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();
        let mayor_b = f
            .candidates
            .register(NewCandidate::new("Ivo", "Green", 11, "Mayor"))
            .await
            .unwrap();
        let councillor = f
            .candidates
            .register(NewCandidate::new("Lia", "Red", 20, "Councillor"))
            .await
            .unwrap();

        let SessionResult::Opened(mut session) = f.engine.open_session(&ana).await else {
            panic!("Expected session to open");
        };

        assert!(session.cast(mayor_a).await.is_committed());
        // has_voted is now set, yet the same session may continue
        assert_eq!(f.voters.has_voted(&ana).await.unwrap(), VotingStatus::Voted);
        assert!(session.cast(councillor).await.is_committed());

        assert_eq!(
            session.cast(mayor_b).await,
            CastOutcome::Aborted(AbortReason::AlreadyVotedForOffice {
                office: "Mayor".to_string()
            })
        );

        let offices: Vec<&str> = session.committed_offices().collect();
        assert_eq!(offices, vec!["Councillor", "Mayor"]);

        // A separate session is refused outright
        assert!(matches!(
            f.engine.open_session(&ana).await,
            SessionResult::Rejected(AbortReason::AlreadyVoted)
        ));
    }

    #[tokio::test]
    async fn test_office_change_mid_session_cannot_reopen_candidate() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let rui = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();

        let SessionResult::Opened(mut session) = f.engine.open_session(&ana).await else {
            panic!("Expected session to open");
        };
        assert!(session.cast(rui).await.is_committed());

        let moved = f
            .candidates
            .update(rui, NewCandidate::new("Rui", "Blue", 10, "Governor"))
            .await;
        assert!(matches!(moved, Err(crate::Error::Validation { .. })));

        // Other fields stay editable
        f.candidates
            .update(rui, NewCandidate::new("Rui Costa", "Blue", 10, "Mayor"))
            .await
            .unwrap();

        assert_eq!(
            session.cast(rui).await,
            CastOutcome::Aborted(AbortReason::AlreadyVotedForOffice {
                office: "Mayor".to_string()
            })
        );

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM votes WHERE voter_identifier = ?1 AND candidate_id = ?2",
        )
        .bind(ana.as_str())
        .bind(rui.0)
        .fetch_one(f.store.pool())
        .await
        .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(vote_count(&f, rui).await, 1);
    }

    #[tokio::test]
    async fn test_cast_for_office_checks_the_office() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let councillor = f
            .candidates
            .register(NewCandidate::new("Lia", "Red", 20, "Councillor"))
            .await
            .unwrap();

        let SessionResult::Opened(mut session) = f.engine.open_session(&ana).await else {
            panic!("Expected session to open");
        };

        assert_eq!(
            session.cast_for_office("Mayor", councillor).await,
            CastOutcome::Aborted(AbortReason::OfficeMismatch {
                expected: "Mayor".to_string(),
                actual: "Councillor".to_string(),
            })
        );
        assert_eq!(f.voters.has_voted(&ana).await.unwrap(), VotingStatus::NotVoted);
    }

    #[tokio::test]
    async fn test_racing_sessions_commit_once() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let mayor = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();
        let councillor = f
            .candidates
            .register(NewCandidate::new("Lia", "Red", 20, "Councillor"))
            .await
            .unwrap();

        // Both sessions open before either commits
        let SessionResult::Opened(mut first) = f.engine.open_session(&ana).await else {
            panic!("Expected first session to open");
        };
        let SessionResult::Opened(mut second) = f.engine.open_session(&ana).await else {
            panic!("Expected second session to open");
        };

        assert!(first.cast(mayor).await.is_committed());
        assert_eq!(
            second.cast(councillor).await,
            CastOutcome::Aborted(AbortReason::AlreadyVoted)
        );
        assert_eq!(vote_count(&f, councillor).await, 0);
    }

    #[tokio::test]
    async fn test_cast_ballot_with_abstention() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;
        let mayor = f
            .candidates
            .register(NewCandidate::new("Rui", "Blue", 10, "Mayor"))
            .await
            .unwrap();

        let ballot = Ballot::new().choose("Mayor", mayor).abstain("Councillor");
        let report = f.engine.cast_ballot(&ana, &ballot).await;

        assert!(report.is_complete());
        assert_eq!(report.committed(), 1);
        assert_eq!(report.outcome("Councillor"), Some(&LineOutcome::Abstained));
        assert!(report.session_id.is_some());
    }

    #[tokio::test]
    async fn test_all_abstain_ballot_leaves_voter_unvoted() {
        let f = fixture().await;
        let ana = voter(&f, "12345678901").await;

        let ballot = Ballot::new().abstain("Mayor");
        let report = f.engine.cast_ballot(&ana, &ballot).await;

        assert!(report.is_complete());
        assert_eq!(report.committed(), 0);
        assert_eq!(f.voters.has_voted(&ana).await.unwrap(), VotingStatus::NotVoted);
    }
}

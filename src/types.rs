//! # Core Types for the Election System
//!
//! This module defines the data model shared by the registries, the vote
//! transaction engine and the results aggregator. Every value here is a
//! snapshot read from storage; nothing in this module caches mutable state.
//!
//! ## Type Categories
//!
//! ### Identifiers
//! - [`CandidateId`], [`VoterId`], [`VoteId`]: surrogate keys assigned by storage
//! - [`VoterIdentifier`]: the externally assigned 11-digit voter token
//!
//! ### Core Entities
//! - [`Candidate`]: a person running for an office, with a running tally
//! - [`Voter`]: a registered voter and their has-voted flag
//! - [`Vote`]: one append-only row of the vote log
//!
//! ### Reporting
//! - [`ResultEntry`]: one ranked line of an office's results
//! - [`ElectionSummary`]: dashboard totals
//!
//! ## Usage Examples
//!
//! ```rust
//! use votebox::types::{NewCandidate, VoterIdentifier};
//!
//! let identifier: VoterIdentifier = "12345678901".parse().unwrap();
//! assert_eq!(identifier.as_str(), "12345678901");
//!
//! let candidate = NewCandidate::new("Ana Lima", "Green", 10, "Mayor");
//! assert_eq!(candidate.ballot_number, 10);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Number of digits in a voter identifier
pub const VOTER_IDENTIFIER_LEN: usize = 11;

/// Surrogate key of a candidate row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub i64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate key of a voter row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(pub i64);

/// Surrogate key of a vote row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteId(pub i64);

/// Externally assigned voter token: exactly 11 ASCII digits
///
/// The identifier is chosen by the registrant, never generated by the system.
/// Construction validates the format, so every `VoterIdentifier` that reaches
/// a registry or the engine is well formed.
///
/// ```rust
/// use votebox::types::VoterIdentifier;
///
/// assert!(VoterIdentifier::parse("00000000000").is_ok());
/// assert!(VoterIdentifier::parse("1234567890").is_err());   // 10 digits
/// assert!(VoterIdentifier::parse("1234567890a").is_err());  // not numeric
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoterIdentifier(String);

impl VoterIdentifier {
    /// Validate and wrap a voter identifier
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != VOTER_IDENTIFIER_LEN {
            return Err(Error::validation(
                "identifier",
                format!("must contain exactly {VOTER_IDENTIFIER_LEN} digits"),
            ));
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation("identifier", "must contain only digits"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VoterIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VoterIdentifier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VoterIdentifier> for String {
    fn from(value: VoterIdentifier) -> Self {
        value.0
    }
}

impl fmt::Display for VoterIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate as stored
///
/// Candidates are never deleted. Deactivation flips `active` and keeps the
/// row, so its ballot number stays reserved and the votes it received remain
/// attributable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Surrogate id, immutable once assigned
    pub id: CandidateId,

    /// Display name as printed on the ballot
    pub name: String,

    /// Party the candidate runs for
    pub party: String,

    /// Unique ballot number, reserved for the lifetime of the table
    pub ballot_number: i64,

    /// Office the candidate contests
    pub office: String,

    /// Materialized tally; equals the number of vote rows referencing this candidate
    pub vote_count: i64,

    /// `false` once soft-deleted
    pub active: bool,

    /// When the candidate was registered
    pub registered_at: DateTime<Utc>,
}

/// Input for registering or rewriting a candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCandidate {
    pub name: String,
    pub party: String,
    pub ballot_number: i64,
    pub office: String,
}

impl NewCandidate {
    pub fn new(
        name: impl Into<String>,
        party: impl Into<String>,
        ballot_number: i64,
        office: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            party: party.into(),
            ballot_number,
            office: office.into(),
        }
    }
}

/// A registered voter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voter {
    pub id: VoterId,
    pub identifier: VoterIdentifier,
    pub name: String,
    pub email: Option<String>,

    /// Set by the first committed vote, never reset
    pub has_voted: bool,

    pub registered_at: DateTime<Utc>,
}

/// Input for registering a voter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVoter {
    pub identifier: VoterIdentifier,
    pub name: String,
    pub email: Option<String>,
}

impl NewVoter {
    pub fn new(identifier: VoterIdentifier, name: impl Into<String>) -> Self {
        Self {
            identifier,
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// One row of the append-only vote log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub id: VoteId,
    pub voter_identifier: VoterIdentifier,
    pub candidate_id: CandidateId,

    /// Office of the candidate at the moment the vote was cast
    pub office: String,

    pub cast_at: DateTime<Utc>,
}

/// Three-way answer to "has this voter voted?"
///
/// Callers must be able to tell an unregistered identifier apart from a
/// registered voter who has not voted yet, so this is not a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingStatus {
    Voted,
    NotVoted,
    UnknownVoter,
}

impl VotingStatus {
    /// Only registered voters who have not voted may open a ballot session
    pub fn can_vote(&self) -> bool {
        matches!(self, Self::NotVoted)
    }
}

/// One ranked line of an office's results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultEntry {
    /// 1-based rank within the office
    pub position: usize,
    pub candidate_id: CandidateId,
    pub name: String,
    pub party: String,
    pub ballot_number: i64,
    pub vote_count: i64,

    /// Share of the office's counted votes, 0.0 when the office has none
    pub percentage: f64,
}

/// Dashboard totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElectionSummary {
    pub total_voters: i64,
    pub voters_who_voted: i64,

    /// Count of vote rows (one per voter per office), not of voters
    pub total_votes_cast: i64,

    pub active_candidates: i64,

    /// `voters_who_voted / total_voters` as a percentage, 0.0 with no voters
    pub turnout: f64,
}

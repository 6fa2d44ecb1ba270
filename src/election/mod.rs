//! Candidate and voter registries, the vote engine and results

pub mod candidates;
pub mod engine;
pub mod results;
pub mod voters;

use crate::Result;
use crate::config::{Config, ElectionRules};
use crate::storage::Store;

pub use candidates::CandidateRegistry;
pub use voters::VoterRegistry;

// Re-export engine types
pub use engine::{
    AbortReason, Ballot, BallotReport, BallotSession, CastOutcome, LineOutcome, SessionResult,
    VoteEngine, VoteReceipt,
};

// Re-export results types
pub use results::{ResultsAggregator, ResultsReport, TallyAudit, TallyDiscrepancy};

/// Every election component wired to one store
#[derive(Debug, Clone)]
pub struct Election {
    store: Store,
    pub candidates: CandidateRegistry,
    pub voters: VoterRegistry,
    pub engine: VoteEngine,
    pub results: ResultsAggregator,
}

impl Election {
    /// Open the configured database and build the components on top of it
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = Store::connect(&config.database).await?;
        Ok(Self::new(store, config.rules.clone()))
    }

    pub fn new(store: Store, rules: ElectionRules) -> Self {
        Self {
            candidates: CandidateRegistry::new(store.clone(), rules),
            voters: VoterRegistry::new(store.clone()),
            engine: VoteEngine::new(store.clone()),
            results: ResultsAggregator::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

//! Simple test to verify the crate wires together

use votebox::{
    Election, Result,
    config::Config,
    election::CastOutcome,
    types::{NewCandidate, NewVoter, VoterIdentifier, VotingStatus},
};

#[tokio::test]
async fn test_basic_functionality() -> Result<()> {
    println!("🔧 Testing basic functionality...");

    let config = Config::for_testing();
    assert!(config.database.is_in_memory());
    println!("✅ Configuration works");

    let election = Election::connect(&config).await?;
    println!("✅ In-memory store connected");

    let candidate = election
        .candidates
        .register(NewCandidate::new("Alice", "Blue", 10, "Mayor"))
        .await?;
    println!("✅ Candidate registration works");

    let voter = VoterIdentifier::parse("12345678901")?;
    election
        .voters
        .register(NewVoter::new(voter.clone(), "Bob"))
        .await?;
    assert_eq!(election.voters.has_voted(&voter).await?, VotingStatus::NotVoted);
    println!("✅ Voter registration works");

    let outcome = election.engine.cast_vote(&voter, candidate).await;
    assert!(matches!(outcome, CastOutcome::Committed(_)));
    assert_eq!(election.voters.has_voted(&voter).await?, VotingStatus::Voted);
    println!("✅ Vote casting works");

    let results = election.results.results_by_office().await?;
    assert_eq!(results["Mayor"][0].vote_count, 1);
    assert_eq!(results["Mayor"][0].percentage, 100.0);
    println!("✅ Results work");

    election.store().close().await;
    println!("🎉 All basic functionality tests passed!");
    Ok(())
}

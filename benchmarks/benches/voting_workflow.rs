use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use votebox::{
    Election,
    config::Config,
    election::{Ballot, CastOutcome},
    types::{CandidateId, NewCandidate, NewVoter, VoterIdentifier},
};

async fn election_with_candidates() -> (Election, CandidateId, CandidateId) {
    let election = Election::connect(&Config::for_testing()).await.unwrap();
    let mayor = election
        .candidates
        .register(NewCandidate::new("Mayor A", "Blue", 10, "Mayor"))
        .await
        .unwrap();
    let councillor = election
        .candidates
        .register(NewCandidate::new("Councillor A", "Red", 50, "Councillor"))
        .await
        .unwrap();
    (election, mayor, councillor)
}

async fn new_voter(election: &Election, n: u64) -> VoterIdentifier {
    let identifier = VoterIdentifier::parse(&format!("{n:011}")).unwrap();
    election
        .voters
        .register(NewVoter::new(identifier.clone(), "Bench Voter"))
        .await
        .unwrap();
    identifier
}

/// Single-transaction cost of registering and voting
fn bench_vote_transaction(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (election, mayor, councillor) = rt.block_on(election_with_candidates());
    let next_voter = AtomicU64::new(1);

    let mut group = c.benchmark_group("vote_transaction");
    group.warm_up_time(Duration::from_millis(200));

    group.bench_function("register_and_cast_vote", |b| {
        b.to_async(&rt).iter(|| async {
            let n = next_voter.fetch_add(1, Ordering::Relaxed);
            let voter = new_voter(&election, n).await;
            let outcome = election.engine.cast_vote(black_box(&voter), mayor).await;
            assert!(outcome.is_committed());
            black_box(outcome);
        })
    });

    group.bench_function("register_and_cast_ballot", |b| {
        b.to_async(&rt).iter(|| async {
            let n = next_voter.fetch_add(1, Ordering::Relaxed);
            let voter = new_voter(&election, n).await;
            let ballot = Ballot::new()
                .choose("Mayor", mayor)
                .choose("Councillor", councillor);
            let report = election.engine.cast_ballot(black_box(&voter), &ballot).await;
            black_box(report);
        })
    });

    // Double vote rejection performance
    let voted = rt.block_on(async {
        let voter = new_voter(&election, 99_999_999_999).await;
        election.engine.cast_vote(&voter, mayor).await;
        voter
    });
    group.bench_function("double_vote_rejection", |b| {
        b.to_async(&rt).iter(|| async {
            let outcome = election.engine.cast_vote(black_box(&voted), mayor).await;
            assert!(matches!(outcome, CastOutcome::Aborted(_)));
            black_box(outcome);
        })
    });

    group.finish();
}

fn bench_results(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (election, mayor, _) = rt.block_on(async {
        let (election, mayor, councillor) = election_with_candidates().await;
        for n in 0..1_000u64 {
            let voter = new_voter(&election, n).await;
            let candidate = if n % 3 == 0 { councillor } else { mayor };
            election.engine.cast_vote(&voter, candidate).await;
        }
        (election, mayor, councillor)
    });
    black_box(mayor);

    let mut group = c.benchmark_group("results");

    group.bench_function("results_by_office", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(election.results.results_by_office().await.unwrap()) })
    });

    group.bench_function("verify_tallies", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(election.results.verify_tallies().await.unwrap()) })
    });

    group.finish();
}

fn bench_concurrent_voting(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent_voting");
    group.sample_size(20); // Each sample builds a fresh election

    for num_voters in [10u64, 50, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("concurrent_voters", num_voters),
            num_voters,
            |b, &num_voters| {
                b.to_async(&rt).iter(|| async move {
                    let (election, mayor, _) = election_with_candidates().await;
                    let election = Arc::new(election);

                    let mut voters = Vec::new();
                    for n in 0..num_voters {
                        voters.push(new_voter(&election, n).await);
                    }

                    let mut handles = Vec::new();
                    for voter in voters {
                        let election = election.clone();
                        handles.push(tokio::spawn(async move {
                            election.engine.cast_vote(&voter, mayor).await
                        }));
                    }

                    for handle in handles {
                        black_box(handle.await.unwrap());
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_vote_transaction,
    bench_results,
    bench_concurrent_voting
);

criterion_main!(benches);

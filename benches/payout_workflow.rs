//! Benchmark suite for the payout workflow
//!
//! Compares the review aggregation and the two execution strategies for bulk
//! transitions using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```
//!
//! # Generated Ledgers
//!
//! Ledgers are generated in memory with 100, 1,000 and 100,000 pending
//! requests spread over 50 beneficiaries.

use chrono::{TimeZone, Utc};
use payout_engine::cli::StrategyType;
use payout_engine::core::aggregate;
use payout_engine::strategy::{create_strategy, BatchConfig};
use payout_engine::{InMemoryLedger, PayoutRequest, PayoutStatus, Period, RequestId};
use rust_decimal::Decimal;

const SIZES: &[u64] = &[100, 1_000, 100_000];
const BENEFICIARIES: u64 = 50;

fn main() {
    divan::main();
}

fn requests(count: u64) -> Vec<PayoutRequest> {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (1..=count)
        .map(|id| {
            PayoutRequest::new(
                id,
                Some(id % BENEFICIARIES),
                Decimal::new((id % 10_000) as i64, 2),
                Decimal::new((id % 300) as i64, 2),
                Period::new((id % 12) as u32 + 1, 2024),
                created,
            )
        })
        .collect()
}

/// Aggregate every pending request into per-beneficiary units
#[divan::bench(args = SIZES)]
fn aggregate_review(bencher: divan::Bencher, count: u64) {
    let requests = requests(count);

    bencher.bench_local(|| aggregate(divan::black_box(&requests)));
}

/// Approve every request sequentially
#[divan::bench(args = SIZES)]
fn sync_bulk_approve(bencher: divan::Bencher, count: u64) {
    bulk_approve(bencher, count, StrategyType::Sync);
}

/// Approve every request with beneficiary partitions on tokio workers
#[divan::bench(args = SIZES)]
fn async_bulk_approve(bencher: divan::Bencher, count: u64) {
    bulk_approve(bencher, count, StrategyType::Async);
}

fn bulk_approve(bencher: divan::Bencher, count: u64, strategy_type: StrategyType) {
    let strategy = create_strategy(strategy_type, Some(BatchConfig::default()));
    let ids: Vec<RequestId> = (1..=count).collect();

    bencher
        .with_inputs(|| InMemoryLedger::from_requests(requests(count)))
        .bench_local_values(|mut ledger| {
            let result = strategy
                .bulk_transition(&mut ledger, &ids, PayoutStatus::Approved)
                .expect("Bulk transition failed");
            assert!(result.is_complete_success());
            ledger
        });
}

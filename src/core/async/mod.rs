//! Concurrent implementations of core components
//!
//! This module provides thread-safe counterparts of the in-memory ledger and
//! the bulk coordinator, using DashMap for per-record locking.
//!
//! # Architecture
//!
//! - **SharedLedger**: Thread-safe payout ledger using DashMap
//! - **BulkProcessor**: Runs bulk transitions and report imports across tokio
//!   tasks, partitioned by beneficiary
//!
//! # Thread Safety
//!
//! - Operations on different requests proceed in parallel
//! - Operations on the same request are serialized by its entry lock
//! - No global locks
//!
//! Results are identical to the sequential path: same succeeded/failed
//! lists, same order, same warnings.

pub mod bulk_processor;
pub mod shared_ledger;

pub use bulk_processor::BulkProcessor;
pub use shared_ledger::SharedLedger;

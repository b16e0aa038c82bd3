// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod alignment;
pub mod app_dirs;
pub mod config;
pub mod generator;
pub mod metrics;
pub mod miner;
pub mod persist;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod util;
pub mod viewport;
pub mod word_bank;

/// UI tick interval; metric sampling is derived from it in `session`.
pub const TICK_RATE_MS: u64 = 100;

//! Settlement Config

use std::time::Duration;

use clap::Args;
use storefront_app::domain::settlement::SimulatedGateway;

/// Simulated payment settings.
#[derive(Debug, Args)]
pub(crate) struct SettlementConfig {
    /// Time the simulated gateway takes to decide, in milliseconds
    #[arg(long, env = "SETTLEMENT_DELAY_MS", default_value_t = 2_000)]
    pub(crate) settlement_delay_ms: u64,

    /// Share of payments the simulated gateway approves, in [0.0, 1.0]
    #[arg(long, env = "SETTLEMENT_SUCCESS_RATE", default_value_t = 0.95)]
    pub(crate) settlement_success_rate: f64,

    /// Gateway calls slower than this settle as failed, in milliseconds
    #[arg(long, env = "SETTLEMENT_TIMEOUT_MS", default_value_t = 10_000)]
    pub(crate) settlement_timeout_ms: u64,
}

impl SettlementConfig {
    pub(crate) fn gateway(&self) -> SimulatedGateway {
        SimulatedGateway::new(
            Duration::from_millis(self.settlement_delay_ms),
            self.settlement_success_rate,
        )
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(self.settlement_timeout_ms)
    }
}

//! Settlement Dispatcher

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    mem,
    sync::Arc,
    time::Duration,
};

use storefront::status::SettlementOutcome;
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{Instrument, error, info, info_span, warn};

use crate::domain::settlement::{
    gateway::{ChargeRequest, PaymentGateway},
    service::SettlementService,
};

const RESOLVE_ATTEMPTS: u32 = 2;
const RESOLVE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Runs payment settlement in the background and tracks the spawned tasks.
#[derive(Clone)]
pub struct SettlementDispatcher {
    gateway: Arc<dyn PaymentGateway>,
    settlement: Arc<dyn SettlementService>,
    timeout: Duration,
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl SettlementDispatcher {
    /// A gateway call that takes longer than `timeout` settles as failed.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        settlement: Arc<dyn SettlementService>,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            settlement,
            timeout,
            tasks: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Start settling an order. Returns without waiting for the outcome.
    pub async fn dispatch(&self, request: ChargeRequest) {
        let gateway = Arc::clone(&self.gateway);
        let settlement = Arc::clone(&self.settlement);
        let timeout = self.timeout;

        let span = info_span!(
            "settlement",
            order = %request.order,
            order_number = %request.order_number
        );

        let mut tasks = self.tasks.lock().await;

        // Reap finished tasks so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}

        tasks.spawn(
            async move {
                let outcome = charge(gateway.as_ref(), &request, timeout).await;

                record(settlement.as_ref(), &request, outcome).await;
            }
            .instrument(span),
        );
    }

    /// Wait until every dispatched settlement has finished, including ones
    /// dispatched while waiting.
    pub async fn wait_idle(&self) {
        loop {
            let mut running = mem::take(&mut *self.tasks.lock().await);

            if running.is_empty() {
                return;
            }

            while let Some(result) = running.join_next().await {
                if let Err(source) = result {
                    error!("settlement task failed: {source}");
                }
            }
        }
    }
}

impl Debug for SettlementDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SettlementDispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Apply the outcome, retrying once after a storage error.
async fn record(
    settlement: &dyn SettlementService,
    request: &ChargeRequest,
    outcome: SettlementOutcome,
) {
    for attempt in 1..=RESOLVE_ATTEMPTS {
        match settlement.resolve(request.order, outcome).await {
            Ok(resolution) => {
                info!(?outcome, ?resolution, "settlement finished");
                return;
            }
            Err(source) if attempt < RESOLVE_ATTEMPTS => {
                warn!(?outcome, attempt, "failed to record settlement, retrying: {source}");
                tokio::time::sleep(RESOLVE_RETRY_DELAY).await;
            }
            Err(source) => {
                error!(
                    order = %request.order,
                    order_number = %request.order_number,
                    ?outcome,
                    "failed to record settlement, order stays PENDING with its stock reserved: {source}"
                );
            }
        }
    }
}

async fn charge(
    gateway: &dyn PaymentGateway,
    request: &ChargeRequest,
    timeout: Duration,
) -> SettlementOutcome {
    match tokio::time::timeout(timeout, gateway.charge(request)).await {
        Ok(Ok(())) => SettlementOutcome::Succeeded,
        Ok(Err(source)) => {
            warn!("payment failed: {source}");
            SettlementOutcome::Failed
        }
        Err(elapsed) => {
            warn!(?timeout, "payment timed out: {elapsed}");
            SettlementOutcome::Failed
        }
    }
}

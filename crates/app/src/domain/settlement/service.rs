//! Settlement service.

use async_trait::async_trait;
use mockall::automock;
use storefront::status::{OrderStatus, PaymentStatus, SettlementOutcome};
use tracing::{debug, info, instrument};

use crate::{
    database::Db,
    domain::{
        inventory::PgInventoryRepository,
        orders::{records::OrderUuid, repository::PgOrdersRepository},
        settlement::errors::SettlementError,
    },
};

/// What resolving a payment did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The order moved to this status.
    Applied(OrderStatus),

    /// The order had already left `PENDING`; nothing changed.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct PgSettlementService {
    db: Db,
    orders: PgOrdersRepository,
    inventory: PgInventoryRepository,
}

impl PgSettlementService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            inventory: PgInventoryRepository::new(),
        }
    }
}

#[async_trait]
impl SettlementService for PgSettlementService {
    #[instrument(skip_all, fields(order = %order, outcome = ?outcome), err)]
    async fn resolve(
        &self,
        order: OrderUuid,
        outcome: SettlementOutcome,
    ) -> Result<Resolution, SettlementError> {
        let mut tx = self.db.begin_transaction().await?;

        let (status, payment_status) = outcome.statuses();

        let applied = self
            .orders
            .transition_status(
                &mut tx,
                order,
                (OrderStatus::Pending, PaymentStatus::Pending),
                (status, payment_status),
            )
            .await?;

        if !applied {
            debug!("order already resolved");

            return Ok(Resolution::Skipped);
        }

        if outcome == SettlementOutcome::Failed {
            let released = self.inventory.release_reservation(&mut tx, order).await?;

            info!(released, "released reserved stock");
        }

        tx.commit().await?;

        info!(%status, %payment_status, "settlement applied");

        Ok(Resolution::Applied(status))
    }
}

#[automock]
#[async_trait]
pub trait SettlementService: Send + Sync {
    /// Apply a payment outcome to a pending order.
    ///
    /// Only orders still `PENDING` are changed, so resolving twice, or after
    /// a cancellation, is a no-op. A failed payment releases the order's
    /// reserved stock.
    async fn resolve(
        &self,
        order: OrderUuid,
        outcome: SettlementOutcome,
    ) -> Result<Resolution, SettlementError>;
}

//! App Context

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

use storefront::assembly::PricingRules;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        checkout::{CheckoutService, PgCheckoutService},
        orders::{OrdersService, PgOrdersService},
        settlement::{PaymentGateway, PgSettlementService, SettlementDispatcher},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub checkout: Arc<dyn CheckoutService>,
    pub orders: Arc<dyn OrdersService>,
    pub settlement: SettlementDispatcher,
}

impl AppContext {
    /// Wire the services over an existing database handle.
    #[must_use]
    pub fn new(
        db: Db,
        rules: PricingRules,
        gateway: Arc<dyn PaymentGateway>,
        settlement_timeout: Duration,
    ) -> Self {
        let settlement = SettlementDispatcher::new(
            gateway,
            Arc::new(PgSettlementService::new(db.clone())),
            settlement_timeout,
        );

        Self {
            orders: Arc::new(PgOrdersService::new(db.clone(), rules.currency)),
            checkout: Arc::new(PgCheckoutService::new(db, rules, settlement.clone())),
            settlement,
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        rules: PricingRules,
        gateway: Arc<dyn PaymentGateway>,
        settlement_timeout: Duration,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), rules, gateway, settlement_timeout))
    }
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AppContext")
            .field("settlement", &self.settlement)
            .finish_non_exhaustive()
    }
}

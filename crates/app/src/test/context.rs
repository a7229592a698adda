//! Test context for service-level integration tests.

use std::{sync::Arc, time::Duration};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::USD;
use storefront::{assembly::PricingRules, pricing::TaxRate};

use crate::{
    database::Db,
    domain::{
        checkout::PgCheckoutService,
        orders::PgOrdersService,
        settlement::{PaymentGateway, PgSettlementService, SettlementDispatcher, SimulatedGateway},
    },
};

use super::db::TestDb;

/// Long enough that settlement never resolves during a test unless the test waits for it.
const HELD: Duration = Duration::from_secs(60 * 60);

pub(crate) struct TestContext {
    pub db: TestDb,
    pub checkout: PgCheckoutService,
    pub orders: PgOrdersService,
    pub settlement: PgSettlementService,
    pub dispatcher: SettlementDispatcher,
}

impl TestContext {
    /// USD at 8% tax with free shipping. Payment never settles on its own.
    pub async fn new() -> Self {
        Self::build(
            default_rules(),
            Arc::new(SimulatedGateway::new(HELD, 1.0)),
            HELD * 2,
        )
        .await
    }

    /// Settle payments through `gateway`, failing any call slower than `timeout`.
    pub async fn with_gateway(gateway: Arc<dyn PaymentGateway>, timeout: Duration) -> Self {
        Self::build(default_rules(), gateway, timeout).await
    }

    /// Price orders with `rules`.
    pub async fn with_rules(rules: PricingRules) -> Self {
        Self::build(rules, Arc::new(SimulatedGateway::new(HELD, 1.0)), HELD * 2).await
    }

    async fn build(
        rules: PricingRules,
        gateway: Arc<dyn PaymentGateway>,
        timeout: Duration,
    ) -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let settlement = PgSettlementService::new(db.clone());
        let dispatcher =
            SettlementDispatcher::new(gateway, Arc::new(settlement.clone()), timeout);

        Self {
            orders: PgOrdersService::new(db.clone(), rules.currency),
            checkout: PgCheckoutService::new(db, rules, dispatcher.clone()),
            settlement,
            dispatcher,
            db: test_db,
        }
    }
}

pub(crate) fn default_rules() -> PricingRules {
    PricingRules::new(USD, TaxRate::from(Percentage::from(Decimal::new(8, 2))))
}

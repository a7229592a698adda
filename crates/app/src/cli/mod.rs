use std::sync::Arc;

use clap::{Parser, Subcommand};
use storefront_app::context::AppContext;

use crate::config::{CheckoutConfig, DatabaseConfig, LoggingConfig, SettlementConfig};

mod cart;
mod db;
mod order;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront checkout CLI", long_about = None)]
pub(crate) struct Cli {
    /// Logging output settings.
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    database: DatabaseConfig,

    /// Pricing settings.
    #[command(flatten)]
    checkout: CheckoutConfig,

    /// Payment settlement settings.
    #[command(flatten)]
    settlement: SettlementConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Cart(cart::CartCommand),
    Order(order::OrderCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(ref command) => db::run(command, &self.database).await,
            Commands::Cart(ref command) => cart::run(command, &self.context().await?).await,
            Commands::Order(ref command) => order::run(command, &self.context().await?).await,
        }
    }

    async fn context(&self) -> Result<AppContext, String> {
        let rules = self
            .checkout
            .pricing_rules()
            .map_err(|error| format!("invalid checkout configuration: {error}"))?;

        AppContext::from_database_url(
            &self.database.database_url,
            rules,
            Arc::new(self.settlement.gateway()),
            self.settlement.timeout(),
        )
        .await
        .map_err(|error| format!("failed to initialise: {error}"))
    }
}

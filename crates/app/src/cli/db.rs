use clap::{Args, Subcommand};
use storefront_app::database;

use crate::config::DatabaseConfig;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply pending schema migrations
    Migrate,
}

pub(crate) async fn run(command: &DbCommand, config: &DatabaseConfig) -> Result<(), String> {
    match command.command {
        DbSubcommand::Migrate => {
            let pool = database::connect(&config.database_url)
                .await
                .map_err(|error| format!("failed to connect to database: {error}"))?;

            database::migrate(&pool)
                .await
                .map_err(|error| format!("failed to apply migrations: {error}"))?;

            println!("migrations applied");

            Ok(())
        }
    }
}

use clap::{Args, Subcommand};
use storefront_app::{context::AppContext, domain::users::UserUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Check the cart against current product state
    Validate(CartArgs),

    /// Show line count, item count and subtotal
    Summary(CartArgs),
}

#[derive(Debug, Args)]
struct CartArgs {
    /// Owner of the cart
    #[arg(long)]
    user: Uuid,
}

pub(crate) async fn run(command: &CartCommand, ctx: &AppContext) -> Result<(), String> {
    match &command.command {
        CartSubcommand::Validate(args) => validate(args, ctx).await,
        CartSubcommand::Summary(args) => summary(args, ctx).await,
    }
}

async fn validate(args: &CartArgs, ctx: &AppContext) -> Result<(), String> {
    let validation = ctx
        .checkout
        .validate_cart(UserUuid::from_uuid(args.user))
        .await
        .map_err(|error| format!("failed to validate cart: {error}"))?;

    println!("valid: {}", validation.is_valid());

    for issue in validation.issues() {
        println!(
            "{} line={} product={}: {}",
            issue.reason, issue.line, issue.product, issue.detail
        );
    }

    Ok(())
}

async fn summary(args: &CartArgs, ctx: &AppContext) -> Result<(), String> {
    let summary = ctx
        .checkout
        .cart_summary(UserUuid::from_uuid(args.user))
        .await
        .map_err(|error| format!("failed to summarise cart: {error}"))?;

    println!("lines: {}", summary.lines);
    println!("items: {}", summary.items);
    println!("subtotal: {}", summary.subtotal);

    Ok(())
}

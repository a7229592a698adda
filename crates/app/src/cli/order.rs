use clap::{Args, Subcommand};
use storefront::{
    order_number::OrderNumber,
    status::{OrderStatus, PaymentStatus},
};
use storefront_app::{
    context::AppContext,
    domain::{
        addresses::records::AddressUuid,
        checkout::{CheckoutError, PlaceOrder},
        orders::{
            data::{OrderFilter, OrderStatusUpdate, Page, Paginated},
            records::{OrderRecord, OrderUuid},
        },
        users::UserUuid,
    },
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Check out the user's cart and wait for payment to settle
    Place(PlaceArgs),

    /// Cancel a pending order
    Cancel(CancelArgs),

    /// Show one order
    Show(ShowArgs),

    /// List orders, newest first
    List(ListArgs),

    /// Change an order's status
    Status(StatusArgs),

    /// Show order counters and revenue
    Stats,
}

#[derive(Debug, Args)]
struct PlaceArgs {
    /// User placing the order
    #[arg(long)]
    user: Uuid,

    /// Shipping address owned by the user
    #[arg(long)]
    shipping_address: Uuid,

    /// Billing address owned by the user; defaults to the shipping address
    #[arg(long)]
    billing_address: Option<Uuid>,

    /// Free-text note for the order
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Args)]
struct CancelArgs {
    /// Owner of the order
    #[arg(long)]
    user: Uuid,

    /// Order to cancel
    #[arg(long)]
    order: Uuid,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Owner of the order
    #[arg(long)]
    user: Uuid,

    /// Order UUID
    #[arg(long, conflicts_with = "number", required_unless_present = "number")]
    order: Option<Uuid>,

    /// Order number, e.g. ORD-1700000000000-4F7K2Q
    #[arg(long)]
    number: Option<OrderNumber>,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only list this user's orders; lists every order when omitted
    #[arg(long)]
    user: Option<Uuid>,

    /// Page number, from 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Orders per page (at most 100)
    #[arg(long, default_value_t = 10)]
    per_page: u32,

    /// Filter by order status (all orders only)
    #[arg(long, conflicts_with = "user")]
    status: Option<OrderStatus>,

    /// Filter by payment status (all orders only)
    #[arg(long, conflicts_with = "user")]
    payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Order to update
    #[arg(long)]
    order: Uuid,

    /// New order status
    #[arg(long, required_unless_present = "payment_status")]
    status: Option<OrderStatus>,

    /// New payment status
    #[arg(long)]
    payment_status: Option<PaymentStatus>,
}

pub(crate) async fn run(command: &OrderCommand, ctx: &AppContext) -> Result<(), String> {
    match &command.command {
        OrderSubcommand::Place(args) => place(args, ctx).await,
        OrderSubcommand::Cancel(args) => cancel(args, ctx).await,
        OrderSubcommand::Show(args) => show(args, ctx).await,
        OrderSubcommand::List(args) => list(args, ctx).await,
        OrderSubcommand::Status(args) => status(args, ctx).await,
        OrderSubcommand::Stats => stats(ctx).await,
    }
}

fn checkout_failure(action: &str, error: &CheckoutError) -> String {
    match error {
        CheckoutError::CartInvalid(issues) => {
            let details: Vec<String> = issues
                .iter()
                .map(|issue| format!("  {} product={}: {}", issue.reason, issue.product, issue.detail))
                .collect();

            format!("failed to {action}: {} ({error})\n{}", error.code(), details.join("\n"))
        }
        _ => format!("failed to {action}: {} ({error})", error.code()),
    }
}

async fn place(args: &PlaceArgs, ctx: &AppContext) -> Result<(), String> {
    let user = UserUuid::from_uuid(args.user);
    let shipping_address = AddressUuid::from_uuid(args.shipping_address);

    let order = ctx
        .checkout
        .place_order(
            user,
            PlaceOrder {
                shipping_address,
                billing_address: args
                    .billing_address
                    .map_or(shipping_address, AddressUuid::from_uuid),
                notes: args.notes.clone(),
            },
        )
        .await
        .map_err(|error| checkout_failure("place order", &error))?;

    println!("placed {} ({})", order.order_number, order.uuid);
    println!("waiting for payment to settle...");

    ctx.settlement.wait_idle().await;

    let settled = ctx
        .orders
        .get_order(user, order.uuid)
        .await
        .map_err(|error| format!("failed to reload order: {error}"))?;

    print_order(&settled);

    Ok(())
}

async fn cancel(args: &CancelArgs, ctx: &AppContext) -> Result<(), String> {
    let order = ctx
        .checkout
        .cancel_order(
            UserUuid::from_uuid(args.user),
            OrderUuid::from_uuid(args.order),
        )
        .await
        .map_err(|error| checkout_failure("cancel order", &error))?;

    print_order(&order);

    Ok(())
}

async fn show(args: &ShowArgs, ctx: &AppContext) -> Result<(), String> {
    let user = UserUuid::from_uuid(args.user);

    let order = match (&args.order, &args.number) {
        (Some(order), _) => ctx.orders.get_order(user, OrderUuid::from_uuid(*order)).await,
        (None, Some(number)) => ctx.orders.get_order_by_number(user, number.clone()).await,
        (None, None) => return Err("either --order or --number is required".to_string()),
    }
    .map_err(|error| format!("failed to load order: {error}"))?;

    print_order(&order);

    Ok(())
}

async fn list(args: &ListArgs, ctx: &AppContext) -> Result<(), String> {
    let page = Page::new(args.page, args.per_page);

    let orders = match args.user {
        Some(user) => ctx.orders.list_orders(UserUuid::from_uuid(user), page).await,
        None => {
            ctx.orders
                .list_all_orders(
                    page,
                    OrderFilter {
                        status: args.status,
                        payment_status: args.payment_status,
                    },
                )
                .await
        }
    }
    .map_err(|error| format!("failed to list orders: {error}"))?;

    print_page(&orders);

    Ok(())
}

async fn status(args: &StatusArgs, ctx: &AppContext) -> Result<(), String> {
    let order = ctx
        .orders
        .update_order_status(
            OrderUuid::from_uuid(args.order),
            OrderStatusUpdate {
                status: args.status,
                payment_status: args.payment_status,
            },
        )
        .await
        .map_err(|error| format!("failed to update order: {error}"))?;

    print_order(&order);

    Ok(())
}

async fn stats(ctx: &AppContext) -> Result<(), String> {
    let stats = ctx
        .orders
        .order_stats()
        .await
        .map_err(|error| format!("failed to load stats: {error}"))?;

    println!("total_orders: {}", stats.total_orders);
    println!("pending_orders: {}", stats.pending_orders);
    println!("delivered_orders: {}", stats.delivered_orders);
    println!("cancelled_orders: {}", stats.cancelled_orders);
    println!("revenue: {}", stats.revenue);

    Ok(())
}

fn print_page(orders: &Paginated<OrderRecord>) {
    println!(
        "page {} of {} ({} orders)",
        orders.page, orders.total_pages, orders.total
    );

    for order in &orders.items {
        println!(
            "{}  {}  {}/{}  {}",
            order.order_number, order.created_at, order.status, order.payment_status, order.total
        );
    }
}

fn print_order(order: &OrderRecord) {
    println!("order_uuid: {}", order.uuid);
    println!("order_number: {}", order.order_number);
    println!("status: {}", order.status);
    println!("payment_status: {}", order.payment_status);
    println!("subtotal: {}", order.subtotal);
    println!("tax: {}", order.tax_amount);
    println!("shipping: {}", order.shipping_amount);
    println!("total: {}", order.total);

    if let Some(notes) = &order.notes {
        println!("notes: {notes}");
    }

    for item in &order.items {
        println!("  {} × {} @ {}", item.quantity, item.product, item.price);
    }
}

//! Test Helpers

use sqlx::{query, query_scalar};
use uuid::Uuid;

use crate::{
    domain::{addresses::records::AddressUuid, checkout::PlaceOrder, users::UserUuid},
    test::TestContext,
};

/// A user with an address to ship and bill to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shopper {
    pub user: UserUuid,
    pub address: AddressUuid,
}

impl Shopper {
    pub(crate) fn place_order(&self) -> PlaceOrder {
        PlaceOrder {
            shipping_address: self.address,
            billing_address: self.address,
            notes: None,
        }
    }
}

pub(crate) async fn create_shopper(ctx: &TestContext) -> Shopper {
    let user = UserUuid::new();

    Shopper {
        user,
        address: create_address(ctx, user).await,
    }
}

pub(crate) async fn create_address(ctx: &TestContext, user: UserUuid) -> AddressUuid {
    let uuid = AddressUuid::new();

    query(
        "INSERT INTO addresses (uuid, user_uuid, line1, city, postal_code, country) \
         VALUES ($1, $2, '1 Test Street', 'Testville', 'T1 1ST', 'GB')",
    )
    .bind(uuid.into_uuid())
    .bind(user.into_uuid())
    .execute(ctx.db.pool())
    .await
    .expect("Failed to create address");

    uuid
}

/// A tracked, active product.
pub(crate) async fn create_product(ctx: &TestContext, price: i64, quantity: i32) -> Uuid {
    insert_product(ctx, price, quantity, true).await
}

/// An active product whose stock is not counted.
pub(crate) async fn create_untracked_product(ctx: &TestContext, price: i64) -> Uuid {
    insert_product(ctx, price, 0, false).await
}

async fn insert_product(ctx: &TestContext, price: i64, quantity: i32, track_quantity: bool) -> Uuid {
    let uuid = Uuid::now_v7();

    query(
        "INSERT INTO products (uuid, price, track_quantity, quantity, is_active) \
         VALUES ($1, $2, $3, $4, TRUE)",
    )
    .bind(uuid)
    .bind(price)
    .bind(track_quantity)
    .bind(quantity)
    .execute(ctx.db.pool())
    .await
    .expect("Failed to create product");

    uuid
}

pub(crate) async fn deactivate_product(ctx: &TestContext, product: Uuid) {
    query("UPDATE products SET is_active = FALSE WHERE uuid = $1")
        .bind(product)
        .execute(ctx.db.pool())
        .await
        .expect("Failed to deactivate product");
}

pub(crate) async fn delete_product(ctx: &TestContext, product: Uuid) {
    query("UPDATE products SET deleted_at = now() WHERE uuid = $1")
        .bind(product)
        .execute(ctx.db.pool())
        .await
        .expect("Failed to delete product");
}

pub(crate) async fn set_product_quantity(ctx: &TestContext, product: Uuid, quantity: i32) {
    query("UPDATE products SET quantity = $2 WHERE uuid = $1")
        .bind(product)
        .bind(quantity)
        .execute(ctx.db.pool())
        .await
        .expect("Failed to set product quantity");
}

pub(crate) async fn set_product_tracking(ctx: &TestContext, product: Uuid, track_quantity: bool) {
    query("UPDATE products SET track_quantity = $2 WHERE uuid = $1")
        .bind(product)
        .bind(track_quantity)
        .execute(ctx.db.pool())
        .await
        .expect("Failed to set product tracking");
}

pub(crate) async fn product_quantity(ctx: &TestContext, product: Uuid) -> i32 {
    query_scalar("SELECT quantity FROM products WHERE uuid = $1")
        .bind(product)
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to read product quantity")
}

/// Add a line to the user's cart, creating the cart if needed. The line is
/// priced from the product.
pub(crate) async fn add_to_cart(
    ctx: &TestContext,
    user: UserUuid,
    product: Uuid,
    quantity: i32,
) -> Uuid {
    let cart: Uuid = query_scalar(
        "INSERT INTO carts (uuid, user_uuid) VALUES ($1, $2) \
         ON CONFLICT (user_uuid) DO UPDATE SET updated_at = now() \
         RETURNING uuid",
    )
    .bind(Uuid::now_v7())
    .bind(user.into_uuid())
    .fetch_one(ctx.db.pool())
    .await
    .expect("Failed to create cart");

    let line = Uuid::now_v7();

    query(
        "INSERT INTO cart_items (uuid, cart_uuid, product_uuid, quantity, price) \
         SELECT $1, $2, $3, $4, COALESCE((SELECT price FROM products WHERE uuid = $3), 0)",
    )
    .bind(line)
    .bind(cart)
    .bind(product)
    .bind(quantity)
    .execute(ctx.db.pool())
    .await
    .expect("Failed to add cart item");

    line
}

pub(crate) async fn cart_item_count(ctx: &TestContext, user: UserUuid) -> i64 {
    query_scalar(
        "SELECT COUNT(*) FROM cart_items ci JOIN carts c ON c.uuid = ci.cart_uuid \
         WHERE c.user_uuid = $1",
    )
    .bind(user.into_uuid())
    .fetch_one(ctx.db.pool())
    .await
    .expect("Failed to count cart items")
}

pub(crate) async fn order_count(ctx: &TestContext) -> i64 {
    query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to count orders")
}

//! Repository tests using `#[sqlx::test]`.
//!
//! Each test gets a fresh database with the storefront migrations applied.
//! The harness needs `DATABASE_URL` pointing at a Postgres server it can
//! create databases on.

use impacto33_core::{OrderId, ProductId, UserId, VariationId};
use impacto33_storefront::db::{
    CartRepository, OrderRepository, ProfileRepository, RepositoryError, SearchHistoryRepository,
    ViewedProductRepository, WishlistRepository,
};
use impacto33_storefront::models::NewCartItem;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user() -> UserId {
    UserId::new(Uuid::new_v4())
}

/// A cart line priced at 12.10 with VAT (10.00 without).
fn line(product_id: i32, variation_id: Option<i32>, quantity: i32) -> NewCartItem {
    NewCartItem {
        product_id: ProductId::new(product_id),
        variation_id: variation_id.map(VariationId::new),
        product_name: format!("Producto {product_id}"),
        product_sku: None,
        product_image: None,
        variation_attributes: serde_json::json!({}),
        quantity,
        unit_price_with_vat: Decimal::new(1210, 2),
        customization: None,
    }
}

async fn insert_order(pool: &PgPool, user_id: UserId, lines: &[(i32, i32)]) -> OrderId {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO public.orders (user_id, subtotal, vat_amount, total) \
         VALUES ($1, 0, 0, 0) RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_order failed: {e}"));

    for &(product_id, quantity) in lines {
        let qty = Decimal::from(quantity);
        sqlx::query(
            "INSERT INTO public.order_items (order_id, product_id, product_name, quantity, \
             unit_price_without_vat, unit_price_with_vat, total_price_without_vat, total_price_with_vat) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(product_id)
        .bind(format!("Pedido {product_id}"))
        .bind(quantity)
        .bind(Decimal::new(1000, 2))
        .bind(Decimal::new(1210, 2))
        .bind(Decimal::new(1000, 2) * qty)
        .bind(Decimal::new(1210, 2) * qty)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("insert order item failed: {e}"));
    }

    OrderId::new(id)
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_same_line_is_merged(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    repo.add_item(user, &line(10, Some(101), 2)).await.unwrap();
    let totals = repo.add_item(user, &line(10, Some(101), 3)).await.unwrap();

    let cart = repo.get_active_cart_with_items(user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.items[0].unit_price_without_vat, Decimal::new(1000, 2));
    assert_eq!(cart.items[0].total_price_with_vat, Decimal::new(6050, 2));

    assert_eq!(totals.subtotal, Decimal::new(5000, 2));
    assert_eq!(totals.total, Decimal::new(6050, 2));
    assert_eq!(cart.cart.total, totals.total);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_other_variation_is_a_new_line(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    repo.add_item(user, &line(10, Some(101), 1)).await.unwrap();
    repo.add_item(user, &line(10, Some(102), 1)).await.unwrap();
    repo.add_item(user, &line(10, None, 1)).await.unwrap();

    let cart = repo.get_active_cart_with_items(user).await.unwrap();
    assert_eq!(cart.items.len(), 3);
    assert_eq!(repo.item_count(user).await.unwrap(), 3);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_vat_is_total_minus_subtotal(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    let mut odd = line(20, None, 3);
    odd.unit_price_with_vat = Decimal::new(999, 2);
    repo.add_item(user, &odd).await.unwrap();
    let totals = repo.add_item(user, &line(21, None, 7)).await.unwrap();

    assert_eq!(totals.vat_amount, totals.total - totals.subtotal);

    let cart = repo.get_active_cart_with_items(user).await.unwrap().cart;
    assert_eq!(cart.subtotal, totals.subtotal);
    assert_eq!(cart.vat_amount, cart.total - cart.subtotal);
    assert_eq!(cart.total, Decimal::new(999 * 3 + 1210 * 7, 2));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_update_to_zero_or_less_removes_line(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    repo.add_item(user, &line(30, None, 4)).await.unwrap();
    repo.add_item(user, &line(31, None, 1)).await.unwrap();
    let cart = repo.get_active_cart_with_items(user).await.unwrap();
    let first = cart.items.iter().find(|i| i.product_id == ProductId::new(30)).unwrap().id;
    let second = cart.items.iter().find(|i| i.product_id == ProductId::new(31)).unwrap().id;

    let totals = repo.update_item_quantity(user, first, 2).await.unwrap();
    assert_eq!(totals.total, Decimal::new(1210 * 3, 2));

    repo.update_item_quantity(user, first, 0).await.unwrap();
    let totals = repo.update_item_quantity(user, second, -3).await.unwrap();

    assert!(repo.get_active_cart_with_items(user).await.unwrap().items.is_empty());
    assert_eq!(totals.total, Decimal::ZERO);
    assert_eq!(repo.item_count(user).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_lines_of_other_users_are_not_found(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let owner = new_user();
    let stranger = new_user();

    repo.add_item(owner, &line(40, None, 1)).await.unwrap();
    let item = repo.get_active_cart_with_items(owner).await.unwrap().items[0].id;

    let err = repo.update_item_quantity(stranger, item, 9).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    let err = repo.remove_item(stranger, item).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    assert_eq!(repo.item_count(owner).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_add_items_writes_every_size(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    let totals = repo
        .add_items(user, &[line(50, Some(501), 10), line(50, Some(502), 15)])
        .await
        .unwrap();

    assert_eq!(repo.item_count(user).await.unwrap(), 25);
    assert_eq!(totals.total, Decimal::new(1210 * 25, 2));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_add_items_is_all_or_nothing(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    let mut big = line(60, None, i32::MAX - 1);
    big.unit_price_with_vat = Decimal::new(1, 2);
    repo.add_item(user, &big).await.unwrap();

    // The second line overflows the existing quantity after the first
    // line was already written inside the transaction.
    let err = repo
        .add_items(user, &[line(61, None, 1), line(60, None, 5)])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Invalid(_)));

    let cart = repo.get_active_cart_with_items(user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, ProductId::new(60));

    let err = repo.add_items(user, &[line(62, None, 1), line(63, None, 0)]).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Invalid(_)));
    assert!(matches!(
        repo.add_items(user, &[]).await.unwrap_err(),
        RepositoryError::Invalid(_)
    ));
    assert_eq!(repo.get_active_cart_with_items(user).await.unwrap().items.len(), 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn cart_clear_zeroes_totals(pool: PgPool) {
    let repo = CartRepository::new(&pool);
    let user = new_user();

    repo.add_item(user, &line(70, None, 2)).await.unwrap();
    repo.clear_cart(user).await.unwrap();

    let cart = repo.get_active_cart_with_items(user).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.cart.total, Decimal::ZERO);
    assert_eq!(cart.cart.subtotal, Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn repeat_order_replaces_cart_items(pool: PgPool) {
    let carts = CartRepository::new(&pool);
    let orders = OrderRepository::new(&pool);
    let user = new_user();

    carts.add_item(user, &line(80, None, 1)).await.unwrap();
    let order_id = insert_order(&pool, user, &[(81, 2), (82, 3)]).await;

    let (cart_id, copied) = orders.repeat_order(user, order_id).await.unwrap();
    assert_eq!(copied, 2);

    let cart = carts.get_cart_with_items(cart_id).await.unwrap();
    let mut products: Vec<i32> = cart.items.iter().map(|i| i.product_id.into()).collect();
    products.sort_unstable();
    assert_eq!(products, vec![81, 82]);
    assert_eq!(cart.cart.subtotal, Decimal::new(5000, 2));
    assert_eq!(cart.cart.total, Decimal::new(6050, 2));
    assert_eq!(cart.cart.vat_amount, cart.cart.total - cart.cart.subtotal);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn repeat_order_rejects_empty_and_foreign_orders(pool: PgPool) {
    let carts = CartRepository::new(&pool);
    let orders = OrderRepository::new(&pool);
    let user = new_user();

    carts.add_item(user, &line(90, None, 1)).await.unwrap();

    let empty = insert_order(&pool, user, &[]).await;
    let err = orders.repeat_order(user, empty).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Invalid(_)));

    let foreign = insert_order(&pool, new_user(), &[(91, 1)]).await;
    let err = orders.repeat_order(user, foreign).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));

    // Cart untouched by the failed attempts
    let cart = carts.get_active_cart_with_items(user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, ProductId::new(90));
}

// ---------------------------------------------------------------------------
// Wishlist
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn wishlist_toggle_and_add_are_idempotent(pool: PgPool) {
    let repo = WishlistRepository::new(&pool);
    let user = new_user();
    let product = ProductId::new(100);

    assert!(repo.toggle(user, product).await.unwrap());
    assert!(repo.is_in_wishlist(user, product).await.unwrap());
    assert!(!repo.toggle(user, product).await.unwrap());
    assert!(!repo.is_in_wishlist(user, product).await.unwrap());

    repo.add(user, product).await.unwrap();
    repo.add(user, product).await.unwrap();
    assert_eq!(repo.product_ids(user, None).await.unwrap(), vec![product]);

    let err = repo.toggle(user, ProductId::new(0)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Invalid(_)));
    assert_eq!(repo.clear(user).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn search_history_dedupes_within_five_minutes(pool: PgPool) {
    let repo = SearchHistoryRepository::new(&pool);
    let user = new_user();

    assert!(repo.track(user, "Camisetas").await.unwrap());
    assert!(!repo.track(user, "  camisetas ").await.unwrap());
    assert!(!repo.track(user, "   ").await.unwrap());
    assert!(repo.track(user, "tazas").await.unwrap());

    let recent = repo.recent(user, 5).await.unwrap();
    let queries: Vec<&str> = recent.iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["tazas", "camisetas"]);

    // Outside the window the same query is stored again
    sqlx::query("UPDATE public.search_history SET created_at = NOW() - INTERVAL '6 minutes'")
        .execute(&pool)
        .await
        .unwrap();
    assert!(repo.track(user, "camisetas").await.unwrap());
    assert_eq!(repo.recent(user, 5).await.unwrap().len(), 3);

    // Another user's identical query is independent
    assert!(repo.track(new_user(), "camisetas").await.unwrap());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn viewed_products_upsert_refreshes_order(pool: PgPool) {
    let repo = ViewedProductRepository::new(&pool);
    let user = new_user();

    repo.track(user, ProductId::new(1)).await.unwrap();
    repo.track(user, ProductId::new(2)).await.unwrap();
    repo.track(user, ProductId::new(1)).await.unwrap();

    let recent = repo.recent(user, 8).await.unwrap();
    let ids: Vec<ProductId> = recent.iter().map(|v| v.product_id).collect();
    assert_eq!(ids, vec![ProductId::new(1), ProductId::new(2)]);

    let err = repo.track(user, ProductId::new(-4)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Invalid(_)));
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL"]
async fn profile_created_once_and_newsletter_consent_tracked(pool: PgPool) {
    let repo = ProfileRepository::new(&pool);
    let user = new_user();
    let email = impacto33_core::Email::parse("ana@empresa.es").unwrap();

    let first = repo.get_or_create(user, &email).await.unwrap();
    let again = repo.get_or_create(user, &email).await.unwrap();
    assert_eq!(first.created_at, again.created_at);
    assert!(!first.onboarding.completed);

    repo.update_newsletter(user, true, "footer").await.unwrap();
    let profile = repo.get_or_create(user, &email).await.unwrap();
    assert!(profile.is_newsletter_subscribed);
    assert!(profile.newsletter_consent_at.is_some());
    assert_eq!(profile.newsletter_source.as_deref(), Some("footer"));

    repo.update_newsletter(user, false, "footer").await.unwrap();
    let profile = repo.get_or_create(user, &email).await.unwrap();
    assert!(profile.newsletter_consent_at.is_none());

    let err = repo.skip_onboarding(new_user()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

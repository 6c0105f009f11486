//! End-to-end tests for cart mutations and reads.
//!
//! Each test starts its own in-memory cart server; no external services needed.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use storefront_cart_client::{Control, Notification, NotificationKind, Outcome, messages};
use storefront_cart_core::{CartItemId, Money, ProductId};
use storefront_cart_integration_tests::{
    Canned, CartServer, RecordingUi, Route, UiEvent, client_for, unreachable_base_url,
};

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_item_sets_badge_to_server_count() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.add_item(ProductId::new(1), 1).await, Outcome::Succeeded);
    assert_eq!(client.add_item(ProductId::new(2), 1).await, Outcome::Succeeded);
    assert_eq!(client.add_item(ProductId::new(42), 1).await, Outcome::Succeeded);

    assert_eq!(ui.last_count(), Some(3));
    assert_eq!(
        ui.last_notification(),
        Some(Notification::success(messages::ADDED))
    );
    assert_eq!(
        ui.control_states(Control::AddToCart(ProductId::new(42))),
        vec![false, true]
    );
}

#[tokio::test]
async fn test_add_item_canned_success_count() {
    let server = CartServer::start_default().await;
    server.respond_next(
        Route::Add,
        Canned::Json(StatusCode::OK, json!({"success": true, "cart_count": 3})),
    );
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.add_item(ProductId::new(42), 1).await, Outcome::Succeeded);
    assert_eq!(ui.last_count(), Some(3));
    assert_eq!(
        ui.last_notification().map(|n| n.kind),
        Some(NotificationKind::Success)
    );
}

#[tokio::test]
async fn test_add_item_application_failure_shows_server_message() {
    let server = CartServer::start_default().await;
    server.respond_next(
        Route::Add,
        Canned::Json(
            StatusCode::OK,
            json!({"success": false, "error": "Out of stock"}),
        ),
    );
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.add_item(ProductId::new(42), 1).await, Outcome::Failed);

    let errors = ui.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Out of stock"));
    assert_eq!(
        ui.control_states(Control::AddToCart(ProductId::new(42))),
        vec![false, true]
    );
    assert_eq!(ui.last_count(), None);
}

#[tokio::test]
async fn test_add_item_error_body_without_success_flag() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    // Product 42 has 5 in stock
    assert_eq!(client.add_item(ProductId::new(42), 6).await, Outcome::Failed);
    assert_eq!(ui.errors(), vec!["Error: Insufficient stock".to_string()]);

    assert_eq!(client.add_item(ProductId::new(999), 1).await, Outcome::Failed);
    assert_eq!(
        ui.errors().last().map(String::as_str),
        Some("Error: Product not found")
    );
}

#[tokio::test]
async fn test_add_item_network_failure_shows_generic_message() {
    let base_url = unreachable_base_url().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&base_url, ui.clone());

    assert_eq!(client.add_item(ProductId::new(42), 1).await, Outcome::Failed);
    assert_eq!(ui.errors(), vec![messages::ADD_FAILED.to_string()]);
    assert_eq!(
        ui.control_states(Control::AddToCart(ProductId::new(42))),
        vec![false, true]
    );
}

#[tokio::test]
async fn test_add_item_non_json_error_shows_generic_message() {
    let server = CartServer::start_default().await;
    server.respond_next(
        Route::Add,
        Canned::Text(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>Internal Server Error</html>".to_string(),
        ),
    );
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.add_item(ProductId::new(1), 1).await, Outcome::Failed);
    assert_eq!(ui.errors(), vec![messages::ADD_FAILED.to_string()]);
}

#[tokio::test]
async fn test_add_same_product_merges_line() {
    let server = CartServer::start_default().await;
    let client = client_for(&server.base_url(), RecordingUi::confirming());

    client.add_item(ProductId::new(1), 1).await;
    client.add_item(ProductId::new(1), 2).await;

    let snapshot = client.fetch_items().await;
    assert_eq!(snapshot.item_count(), 1);
    assert_eq!(snapshot.total_quantity(), 3);
    assert_eq!(snapshot.total(), Money::from_cents(5997));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_below_one_routes_to_remove_flow() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::declining();
    let client = client_for(&server.base_url(), ui.clone());

    client.add_item(ProductId::new(1), 1).await;
    let item_id = client.fetch_items().await.items()[0].id;

    for quantity in [0, -1, -100] {
        assert_eq!(
            client.update_quantity(item_id, quantity).await,
            Outcome::Declined
        );
    }

    assert_eq!(ui.prompts(), vec![messages::CONFIRM_REMOVE.to_string(); 3]);
    assert_eq!(server.request_count("/cart/update"), 0);
    assert_eq!(server.request_count("/cart/remove"), 0);

    ui.answer_next(&[true]);
    assert_eq!(client.update_quantity(item_id, 0).await, Outcome::Succeeded);
    assert_eq!(server.request_count("/cart/update"), 0);
    assert_eq!(
        server.requests().iter().filter(|r| **r == format!("POST /cart/remove/{item_id}")).count(),
        1
    );
    assert!(client.fetch_items().await.is_empty());
}

#[tokio::test]
async fn test_update_quantity_refreshes_view() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    client.add_item(ProductId::new(1), 1).await;
    let item_id = client.fetch_items().await.items()[0].id;
    ui.clear_events();

    assert_eq!(client.update_quantity(item_id, 4).await, Outcome::Succeeded);

    let rendered = ui.last_render().expect("view should be re-rendered");
    assert_eq!(rendered.get(item_id).map(|i| i.quantity), Some(4));
    assert_eq!(rendered.total(), Money::from_cents(4 * 1999));
    assert_eq!(ui.last_count(), Some(1));
    assert_eq!(ui.control_states(Control::Quantity(item_id)), vec![false, true]);
    assert!(ui.errors().is_empty());
}

#[tokio::test]
async fn test_update_quantity_over_stock_surfaces_server_error() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    client.add_item(ProductId::new(42), 1).await;
    let item_id = client.fetch_items().await.items()[0].id;
    ui.clear_events();

    assert_eq!(client.update_quantity(item_id, 50).await, Outcome::Failed);
    assert_eq!(ui.errors(), vec!["Error: Insufficient stock".to_string()]);
    assert_eq!(ui.last_render(), None);
    assert_eq!(ui.control_states(Control::Quantity(item_id)), vec![false, true]);
}

#[tokio::test]
async fn test_update_quantity_network_failure() {
    let ui = RecordingUi::confirming();
    let client = client_for(&unreachable_base_url().await, ui.clone());

    assert_eq!(
        client.update_quantity(CartItemId::new(1), 2).await,
        Outcome::Failed
    );
    assert_eq!(ui.errors(), vec![messages::UPDATE_FAILED.to_string()]);
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn test_remove_declined_sends_nothing_and_changes_nothing() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::declining();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.remove_item(CartItemId::new(7)).await, Outcome::Declined);

    assert!(server.requests().is_empty());
    assert_eq!(
        ui.events(),
        vec![UiEvent::Confirmed {
            prompt: messages::CONFIRM_REMOVE.to_string(),
            answer: false,
        }]
    );
}

#[tokio::test]
async fn test_remove_confirmed_removes_row_and_refreshes() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    client.add_item(ProductId::new(1), 1).await;
    client.add_item(ProductId::new(2), 1).await;
    let item_id = client.fetch_items().await.items()[0].id;
    ui.clear_events();

    assert_eq!(client.remove_item(item_id).await, Outcome::Succeeded);

    let events = ui.events();
    assert!(events.contains(&UiEvent::RowRemoved(item_id)));
    assert!(events.contains(&UiEvent::Notified(Notification::success(messages::REMOVED))));

    let rendered = ui.last_render().expect("view should be re-rendered");
    assert_eq!(rendered.item_count(), 1);
    assert!(rendered.get(item_id).is_none());
    assert_eq!(ui.last_count(), Some(1));
}

#[tokio::test]
async fn test_remove_unknown_item_surfaces_server_error() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.remove_item(CartItemId::new(7)).await, Outcome::Failed);
    assert_eq!(ui.errors(), vec!["Error: Cart item not found".to_string()]);
    assert!(!ui.events().iter().any(|e| matches!(e, UiEvent::RowRemoved(_))));
    assert_eq!(
        ui.control_states(Control::Remove(CartItemId::new(7))),
        vec![false, true]
    );
}

// ============================================================================
// Clear
// ============================================================================

#[tokio::test]
async fn test_clear_twice_is_idempotent() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    client.add_item(ProductId::new(1), 2).await;
    client.add_item(ProductId::new(2), 1).await;

    assert_eq!(client.clear_cart().await, Outcome::Succeeded);
    assert_eq!(client.clear_cart().await, Outcome::Succeeded);

    assert!(ui.errors().is_empty());
    assert_eq!(ui.last_count(), Some(0));
    assert_eq!(
        ui.notifications()
            .iter()
            .filter(|n| n.message == messages::CLEARED)
            .count(),
        2
    );
    assert_eq!(client.fetch_count().await, 0);
}

#[tokio::test]
async fn test_clear_declined_sends_nothing() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::declining();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.clear_cart().await, Outcome::Declined);
    assert_eq!(server.request_count("/cart/clear"), 0);
}

#[tokio::test]
async fn test_clear_failure_shows_server_message() {
    let server = CartServer::start_default().await;
    server.respond_next(
        Route::Clear,
        Canned::Json(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"success": false, "error": "Maintenance in progress"}),
        ),
    );
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.clear_cart().await, Outcome::Failed);
    assert_eq!(ui.errors(), vec!["Error: Maintenance in progress".to_string()]);
    assert_eq!(ui.control_states(Control::ClearCart), vec![false, true]);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_fetch_items_network_error_returns_empty() {
    let ui = RecordingUi::confirming();
    let client = client_for(&unreachable_base_url().await, ui.clone());

    let snapshot = client.fetch_items().await;
    assert!(snapshot.is_empty());
    assert!(client.try_fetch_items().await.is_err());
    assert_eq!(client.fetch_count().await, 0);
    assert!(ui.events().is_empty());
}

#[tokio::test]
async fn test_fetch_items_malformed_body_returns_empty() {
    let server = CartServer::start_default().await;
    server.respond_next(
        Route::Items,
        Canned::Json(StatusCode::OK, json!({"unexpected": true})),
    );
    let client = client_for(&server.base_url(), RecordingUi::confirming());

    assert!(client.fetch_items().await.is_empty());
}

#[tokio::test]
async fn test_refresh_count_updates_badge() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    client.add_item(ProductId::new(1), 1).await;
    ui.clear_events();

    client.refresh_count().await;
    assert_eq!(ui.counts(), vec![1]);
}

#[tokio::test]
async fn test_refresh_count_failure_keeps_badge() {
    let ui = RecordingUi::confirming();
    let client = client_for(&unreachable_base_url().await, ui.clone());

    client.refresh_count().await;
    assert!(ui.counts().is_empty());
}

#[tokio::test]
async fn test_cart_total_and_mini_cart() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.cart_total().await, Money::ZERO);
    assert!(client.mini_cart().await.is_empty());
    assert_eq!(
        ui.last_notification(),
        Some(Notification::info(messages::EMPTY_CART))
    );

    client.add_item(ProductId::new(1), 2).await;
    client.add_item(ProductId::new(2), 1).await;

    assert_eq!(client.cart_total().await, Money::from_cents(2 * 1999 + 850));

    let lines = client.mini_cart().await;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].label, "Quantum Mug x 2");
    assert_eq!(lines[0].subtotal, "$39.98");
    assert_eq!(lines[1].label, "Entangled Socks x 1");
    assert_eq!(lines[1].subtotal, "$8.50");
}

// ============================================================================
// Sessions & concurrency
// ============================================================================

#[tokio::test]
async fn test_clients_have_separate_sessions() {
    let server = CartServer::start_default().await;
    let first = client_for(&server.base_url(), RecordingUi::confirming());
    let second = client_for(&server.base_url(), RecordingUi::confirming());

    first.add_item(ProductId::new(1), 1).await;
    first.add_item(ProductId::new(2), 1).await;
    second.add_item(ProductId::new(42), 1).await;

    assert_eq!(first.fetch_count().await, 2);
    assert_eq!(second.fetch_count().await, 1);

    // Clones share the session
    assert_eq!(first.clone().fetch_count().await, 2);
}

#[tokio::test]
async fn test_same_control_allows_one_request_in_flight() {
    let server = CartServer::start_default().await;
    server.set_delay(Duration::from_millis(200));
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    let (first, second) = tokio::join!(
        client.add_item(ProductId::new(1), 1),
        client.add_item(ProductId::new(1), 1),
    );

    assert_eq!(first, Outcome::Succeeded);
    assert_eq!(second, Outcome::InFlight);
    assert_eq!(server.request_count("/cart/add"), 1);
    assert!(!client.is_in_flight(Control::AddToCart(ProductId::new(1))));
    assert_eq!(
        ui.control_states(Control::AddToCart(ProductId::new(1))),
        vec![false, true]
    );
}

#[tokio::test]
async fn test_different_controls_run_concurrently() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    // Establish the session first so both adds land in the same cart
    assert_eq!(client.fetch_count().await, 0);
    server.set_delay(Duration::from_millis(100));

    let (first, second) = tokio::join!(
        client.add_item(ProductId::new(1), 1),
        client.add_item(ProductId::new(2), 1),
    );

    assert_eq!(first, Outcome::Succeeded);
    assert_eq!(second, Outcome::Succeeded);
    assert_eq!(server.request_count("/cart/add"), 2);
    assert_eq!(client.fetch_count().await, 2);
}

#[tokio::test]
async fn test_zero_quantity_add_sends_nothing() {
    let server = CartServer::start_default().await;
    let ui = RecordingUi::confirming();
    let client = client_for(&server.base_url(), ui.clone());

    assert_eq!(client.add_item(ProductId::new(1), 0).await, Outcome::Rejected);
    assert!(server.requests().is_empty());
    assert_eq!(ui.errors(), vec![messages::INVALID_QUANTITY.to_string()]);
}

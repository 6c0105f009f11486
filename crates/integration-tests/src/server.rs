//! In-memory cart API server.
//!
//! Behaves like the storefront's cart routes: carts are keyed by a session
//! cookie, adding an existing product increments its line, stock is checked
//! against the requested quantity, and error responses are `{"error": ...}`
//! bodies with a 4xx status and no `success` flag.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use storefront_cart_core::{CartItem, CartItemId, Money, ProductId, ProductRef};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

const SESSION_KEY: &str = "cart_session";

/// A product in the fixture catalog.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl CatalogProduct {
    #[must_use]
    pub fn new(id: i64, name: &str, price_cents: i64, stock: u32) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock,
        }
    }

    fn to_ref(&self) -> ProductRef {
        ProductRef {
            id: self.id,
            name: self.name.clone(),
            in_stock: self.stock > 0,
            stock: self.stock,
            price: Some(self.price),
            price_formatted: Some(self.price.to_string()),
        }
    }
}

/// Endpoints a canned response can be queued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Add,
    Update,
    Remove,
    Clear,
    Items,
    Count,
}

impl Route {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/cart/add" => Some(Self::Add),
            "/cart/update" => Some(Self::Update),
            "/cart/clear" => Some(Self::Clear),
            "/api/cart/items" => Some(Self::Items),
            "/api/cart/count" => Some(Self::Count),
            p if p.starts_with("/cart/remove/") => Some(Self::Remove),
            _ => None,
        }
    }
}

/// A response served instead of the real handler.
#[derive(Debug, Clone)]
pub enum Canned {
    Json(StatusCode, Value),
    Text(StatusCode, String),
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        match self {
            Self::Json(status, body) => (status, Json(body)).into_response(),
            Self::Text(status, body) => (status, body).into_response(),
        }
    }
}

#[derive(Debug, Clone)]
struct Line {
    id: CartItemId,
    product_id: ProductId,
    quantity: u32,
}

#[derive(Default)]
struct Store {
    catalog: BTreeMap<ProductId, CatalogProduct>,
    carts: HashMap<u64, Vec<Line>>,
    next_line_id: i64,
    next_session: u64,
    requests: Vec<String>,
    canned: HashMap<Route, VecDeque<Canned>>,
    delay: Duration,
}

impl Store {
    fn cart(&mut self, session: u64) -> &mut Vec<Line> {
        self.carts.entry(session).or_default()
    }

    fn item_json(&self, line: &Line) -> CartItem {
        let product = self.catalog.get(&line.product_id);
        let subtotal = product.map_or(Money::ZERO, |p| {
            Money::from_cents(p.price.cents() * i64::from(line.quantity))
        });

        CartItem {
            id: line.id,
            product_id: line.product_id,
            product: product.map(CatalogProduct::to_ref),
            quantity: line.quantity,
            subtotal,
            subtotal_formatted: subtotal.to_string(),
        }
    }
}

#[derive(Clone, Default)]
struct ServerState {
    store: Arc<Mutex<Store>>,
}

impl ServerState {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Find or assign the cart key for this session.
    async fn session_key(&self, session: &Session) -> u64 {
        if let Ok(Some(key)) = session.get::<u64>(SESSION_KEY).await {
            return key;
        }

        let key = {
            let mut store = self.lock();
            store.next_session += 1;
            store.next_session
        };
        let _ = session.insert(SESSION_KEY, key).await;
        key
    }
}

/// A running fixture server. Aborted on drop.
pub struct CartServer {
    addr: SocketAddr,
    state: ServerState,
    task: JoinHandle<()>,
}

impl Drop for CartServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl CartServer {
    /// Start a server on an ephemeral port with the given catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    #[allow(clippy::expect_used)]
    pub async fn start(catalog: &[CatalogProduct]) -> Self {
        let state = ServerState::default();
        {
            let mut store = state.lock();
            for product in catalog {
                store.catalog.insert(product.id, product.clone());
            }
        }

        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

        let app = Router::new()
            .route("/cart/add", post(add))
            .route("/cart/update", post(update))
            .route("/cart/remove/{id}", post(remove))
            .route("/cart/clear", post(clear))
            .route("/api/cart/items", get(items))
            .route("/api/cart/count", get(count))
            .layer(middleware::from_fn_with_state(state.clone(), intercept))
            .layer(session_layer)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fixture server");
        let addr = listener.local_addr().expect("Failed to read local address");

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// Start a server with a small default catalog.
    ///
    /// | id | name | price | stock |
    /// |---|---|---|---|
    /// | 1 | Quantum Mug | $19.99 | 10 |
    /// | 2 | Entangled Socks | $8.50 | 10 |
    /// | 42 | Answer Poster | $42.00 | 5 |
    pub async fn start_default() -> Self {
        Self::start(&[
            CatalogProduct::new(1, "Quantum Mug", 1999, 10),
            CatalogProduct::new(2, "Entangled Socks", 850, 10),
            CatalogProduct::new(42, "Answer Poster", 4200, 5),
        ])
        .await
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    /// Number of received requests whose path starts with `prefix`.
    #[must_use]
    pub fn request_count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.split_once(' ').is_some_and(|(_, path)| path.starts_with(prefix)))
            .count()
    }

    /// Serve `response` for the next request to `route` instead of handling it.
    pub fn respond_next(&self, route: Route, response: Canned) {
        self.state
            .lock()
            .canned
            .entry(route)
            .or_default()
            .push_back(response);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = delay;
    }

    /// Change a product's stock, e.g. after it was added to a cart.
    pub fn set_stock(&self, product_id: ProductId, stock: u32) {
        if let Some(product) = self.state.lock().catalog.get_mut(&product_id) {
            product.stock = stock;
        }
    }

    /// Drop a product from the catalog so its cart lines lose their product.
    pub fn delete_product(&self, product_id: ProductId) {
        self.state.lock().catalog.remove(&product_id);
    }
}

/// A base URL nothing is listening on.
///
/// # Panics
///
/// Panics if no ephemeral port can be bound.
#[allow(clippy::expect_used)]
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    format!("http://{addr}")
}

// =============================================================================
// Middleware
// =============================================================================

/// Log the request, apply the configured delay, and serve canned responses.
async fn intercept(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let (delay, canned) = {
        let mut store = state.lock();
        store.requests.push(format!("{} {path}", request.method()));
        let canned = match Route::from_path(&path) {
            Some(route) => store.canned.get_mut(&route).and_then(VecDeque::pop_front),
            None => None,
        };
        (store.delay, canned)
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match canned {
        Some(response) => response.into_response(),
        None => next.run(request).await,
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

const fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct AddBody {
    product_id: Option<ProductId>,
    #[serde(default = "default_quantity")]
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    cart_item_id: Option<CartItemId>,
    #[serde(default = "default_quantity")]
    quantity: i64,
}

async fn add(State(state): State<ServerState>, session: Session, Json(body): Json<AddBody>) -> Response {
    let Some(product_id) = body.product_id else {
        return error_response(StatusCode::BAD_REQUEST, "Product ID required");
    };

    let key = state.session_key(&session).await;
    let mut store = state.lock();

    let Some(stock) = store.catalog.get(&product_id).map(|p| p.stock) else {
        return error_response(StatusCode::NOT_FOUND, "Product not found");
    };

    if i64::from(stock) < body.quantity {
        return error_response(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    let quantity = u32::try_from(body.quantity).unwrap_or(0);
    let existing = store
        .cart(key)
        .iter()
        .position(|line| line.product_id == product_id);

    let line = if let Some(index) = existing {
        let cart = store.cart(key);
        let Some(line) = cart.get_mut(index) else {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Cart corrupted");
        };
        line.quantity += quantity;
        line.clone()
    } else {
        store.next_line_id += 1;
        let line = Line {
            id: CartItemId::new(store.next_line_id),
            product_id,
            quantity,
        };
        store.cart(key).push(line.clone());
        line
    };

    let cart_count = store.cart(key).len();
    let cart_item = store.item_json(&line);

    Json(json!({
        "success": true,
        "message": "Product added to cart",
        "cart_count": cart_count,
        "cart_item": cart_item,
    }))
    .into_response()
}

async fn update(
    State(state): State<ServerState>,
    session: Session,
    Json(body): Json<UpdateBody>,
) -> Response {
    let Some(item_id) = body.cart_item_id else {
        return error_response(StatusCode::BAD_REQUEST, "Cart item ID required");
    };

    let key = state.session_key(&session).await;
    let mut store = state.lock();

    let Some(index) = store.cart(key).iter().position(|line| line.id == item_id) else {
        return error_response(StatusCode::NOT_FOUND, "Cart item not found");
    };

    let product_id = store.cart(key).get(index).map(|line| line.product_id);
    let stock = product_id
        .and_then(|id| store.catalog.get(&id))
        .map_or(0, |p| p.stock);

    if i64::from(stock) < body.quantity {
        return error_response(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    let cart = store.cart(key);
    if body.quantity <= 0 {
        cart.remove(index);
    } else if let Some(line) = cart.get_mut(index) {
        line.quantity = u32::try_from(body.quantity).unwrap_or(u32::MAX);
    }

    Json(json!({ "success": true, "message": "Cart updated" })).into_response()
}

async fn remove(
    State(state): State<ServerState>,
    session: Session,
    Path(item_id): Path<CartItemId>,
) -> Response {
    let key = state.session_key(&session).await;
    let mut store = state.lock();
    let cart = store.cart(key);

    let Some(index) = cart.iter().position(|line| line.id == item_id) else {
        return error_response(StatusCode::NOT_FOUND, "Cart item not found");
    };
    cart.remove(index);

    Json(json!({ "success": true, "message": "Item removed from cart" })).into_response()
}

async fn clear(State(state): State<ServerState>, session: Session) -> Response {
    let key = state.session_key(&session).await;
    state.lock().cart(key).clear();

    Json(json!({ "success": true, "message": "Cart cleared" })).into_response()
}

async fn items(State(state): State<ServerState>, session: Session) -> Response {
    let key = state.session_key(&session).await;
    let mut store = state.lock();
    let lines = store.cart(key).clone();
    let items: Vec<CartItem> = lines.iter().map(|line| store.item_json(line)).collect();

    Json(items).into_response()
}

async fn count(State(state): State<ServerState>, session: Session) -> Response {
    let key = state.session_key(&session).await;
    let count = state.lock().cart(key).len();

    Json(json!({ "count": count })).into_response()
}

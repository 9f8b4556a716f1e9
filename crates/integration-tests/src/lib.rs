//! In-process inventory backend for end-to-end tests.
//!
//! [`FakeBackend`] serves the REST endpoints and the product websocket that
//! the client talks to, on an ephemeral localhost port. State lives in
//! memory and every successful product mutation is pushed to connected
//! websocket subscribers, like the real server does.
//!
//! ```rust,ignore
//! let backend = FakeBackend::start().await?;
//! backend.add_user("alice", "alice@example.com", "s3cret-pass").await;
//! let config = backend.config(session_file)?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Multipart, Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use inventory_client::{ClientConfig, ConfigError};
use inventory_core::{Category, Price, Product, ProductId, UserId};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

const REQUIRED: &str = "This field is required.";
const EVENT_BUFFER: usize = 64;

/// Something pushed to every websocket subscriber.
#[derive(Debug, Clone)]
enum Push {
    Frame(String),
    Close,
}

#[derive(Debug, Clone)]
struct User {
    id: UserId,
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct Db {
    users: Vec<User>,
    /// Newest first.
    products: Vec<Product>,
    access_tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
    next_user: i32,
    next_product: i32,
    issued: u32,
}

impl Db {
    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn issue_access(&mut self, user: UserId) -> String {
        self.issued += 1;
        let token = format!("access-{}-{}", user.as_i32(), self.issued);
        self.access_tokens.insert(token.clone(), user);
        token
    }

    fn issue_refresh(&mut self, user: UserId) -> String {
        self.issued += 1;
        let token = format!("refresh-{}-{}", user.as_i32(), self.issued);
        self.refresh_tokens.insert(token.clone(), user);
        token
    }

    fn product_index(&self, id: ProductId) -> Option<usize> {
        self.products.iter().position(|p| p.id == id)
    }

    fn name_taken(&self, name: &str, except: Option<ProductId>) -> bool {
        self.products
            .iter()
            .any(|p| p.name == name && Some(p.id) != except)
    }
}

#[derive(Clone)]
struct BackendState {
    db: Arc<Mutex<Db>>,
    events: broadcast::Sender<Push>,
}

impl BackendState {
    fn publish(&self, action: &str, data: &Value) {
        let frame = json!({ "action": action, "data": data }).to_string();
        // No subscribers is fine.
        let _ = self.events.send(Push::Frame(frame));
    }
}

/// A running fake backend. The server stops when this is dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    state: BackendState,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let state = BackendState {
            db: Arc::new(Mutex::new(Db::default())),
            events,
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router().with_state(state.clone());

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Fake backend stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// REST base URL, with trailing slash.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Errors
    ///
    /// Returns error if the generated URLs do not parse.
    pub fn config(&self, session_file: PathBuf) -> Result<ClientConfig, ConfigError> {
        ClientConfig::new(&self.api_url(), None, session_file)
    }

    /// Like [`FakeBackend::config`], but with the websocket base pointing
    /// somewhere else.
    ///
    /// # Errors
    ///
    /// Returns error if the URLs do not parse.
    pub fn config_with_ws(
        &self,
        session_file: PathBuf,
        ws_url: &str,
    ) -> Result<ClientConfig, ConfigError> {
        ClientConfig::new(&self.api_url(), Some(ws_url), session_file)
    }

    /// Register an account directly.
    pub async fn add_user(&self, username: &str, email: &str, password: &str) -> UserId {
        let mut db = self.state.db.lock().await;
        db.next_user += 1;
        let id = UserId::new(db.next_user);
        db.users.push(User {
            id,
            username: username.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        });
        id
    }

    /// Insert a product without notifying subscribers.
    pub async fn seed_product(
        &self,
        owner: UserId,
        name: &str,
        category: Category,
        price: Price,
        quantity: u32,
    ) -> Product {
        let mut db = self.state.db.lock().await;
        db.next_product += 1;
        let product = Product {
            id: ProductId::new(db.next_product),
            name: name.to_owned(),
            description: format!("{name} description"),
            category,
            price,
            quantity,
            image: None,
            is_active: true,
            created_at: Some(chrono::Utc::now()),
            updated_at: None,
            created_by: Some(owner),
        };
        db.products.insert(0, product.clone());
        product
    }

    /// Current products, newest first.
    pub async fn products(&self) -> Vec<Product> {
        self.state.db.lock().await.products.clone()
    }

    /// Refresh tokens that have been issued and not blacklisted.
    pub async fn live_refresh_tokens(&self) -> usize {
        self.state.db.lock().await.refresh_tokens.len()
    }

    /// Invalidate every access token, as if they had all expired.
    pub async fn expire_access_tokens(&self) {
        self.state.db.lock().await.access_tokens.clear();
    }

    /// Send a raw text frame to every websocket subscriber.
    pub fn push_frame(&self, frame: impl Into<String>) {
        let _ = self.state.events.send(Push::Frame(frame.into()));
    }

    /// Close every websocket connection from the server side.
    pub fn close_live(&self) {
        let _ = self.state.events.send(Push::Close);
    }

    /// Number of open websocket subscriptions.
    #[must_use]
    pub fn live_subscribers(&self) -> usize {
        self.state.events.receiver_count()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A websocket endpoint that accepts TCP connections and never answers the
/// upgrade, leaving clients stuck in the handshake.
pub struct StalledEndpoint {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl StalledEndpoint {
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Ok(Self { addr, task })
    }

    /// Websocket base URL, with trailing slash.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }
}

impl Drop for StalledEndpoint {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router() -> Router<BackendState> {
    Router::new()
        .route("/api/token/", post(obtain_token))
        .route("/api/token/refresh/", post(refresh_token))
        .route("/api/token/blacklist/", post(blacklist_token))
        .route("/api/user/register/", post(register))
        .route("/api/user/", get(user_info))
        .route("/api/products/", get(list_products).post(create_product))
        .route("/api/products/my_products/", get(my_products))
        .route(
            "/api/products/{id}/",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/ws/products/", get(live_products))
}

// ============================================================================
// Helpers
// ============================================================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn field_error(field: &str, message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ field: [message] }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(db: &Db, headers: &HeaderMap) -> Result<UserId, Response> {
    bearer(headers)
        .and_then(|token| db.access_tokens.get(token).copied())
        .ok_or_else(|| {
            detail(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            )
        })
}

/// Product fields from a form or JSON body. `None` means not provided.
#[derive(Debug, Default)]
struct Draft {
    name: Option<String>,
    description: Option<String>,
    category: Option<Category>,
    price: Option<Price>,
    quantity: Option<u32>,
    is_active: Option<bool>,
    image: Option<String>,
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Validate a product body. With `full` set, name and price are required.
fn parse_draft(body: &Map<String, Value>, full: bool) -> Result<Draft, Response> {
    let mut errors = Map::new();
    let mut draft = Draft::default();
    let mut reject = |field: &str, message: &str| {
        errors.insert(field.to_owned(), json!([message]));
    };

    match body.get("name").and_then(text_of) {
        Some(name) if !name.trim().is_empty() => draft.name = Some(name),
        Some(_) => reject("name", REQUIRED),
        None if full => reject("name", REQUIRED),
        None => {}
    }
    draft.description = body.get("description").and_then(text_of);
    if let Some(raw) = body.get("category").and_then(text_of) {
        match raw.parse::<Category>() {
            Ok(category) => draft.category = Some(category),
            Err(e) => reject("category", &e.to_string()),
        }
    }
    match body.get("price").and_then(text_of) {
        Some(raw) => match Price::parse(&raw) {
            Ok(price) => draft.price = Some(price),
            Err(_) => reject("price", "A valid number is required."),
        },
        None if full => reject("price", REQUIRED),
        None => {}
    }
    if let Some(raw) = body.get("quantity").and_then(text_of) {
        match raw.parse::<u32>() {
            Ok(quantity) => draft.quantity = Some(quantity),
            Err(_) => reject("quantity", "A valid integer is required."),
        }
    }
    draft.is_active = body.get("is_active").and_then(Value::as_bool);
    draft.image = body.get("image").and_then(text_of);

    if errors.is_empty() {
        Ok(draft)
    } else {
        Err((StatusCode::BAD_REQUEST, Json(Value::Object(errors))).into_response())
    }
}

/// Collect multipart text fields; a file part becomes a media path.
async fn read_form(mut multipart: Multipart) -> Result<Map<String, Value>, Response> {
    let mut body = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.body_text()))?;
            if bytes.is_empty() {
                return Err(field_error(&name, "The submitted file is empty."));
            }
            body.insert(name, Value::String(format!("/media/product/{file_name}")));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.body_text()))?;
            body.insert(name, Value::String(text));
        }
    }
    Ok(body)
}

fn to_json(product: &Product) -> Value {
    serde_json::to_value(product).unwrap_or(Value::Null)
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    #[serde(default)]
    email: String,
    password: String,
}

async fn obtain_token(State(state): State<BackendState>, Json(body): Json<LoginBody>) -> Response {
    let mut db = state.db.lock().await;
    let Some(user) = db
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .map(|u| u.id)
    else {
        return detail(
            StatusCode::UNAUTHORIZED,
            "No active account found with the given credentials",
        );
    };
    let access = db.issue_access(user);
    let refresh = db.issue_refresh(user);
    Json(json!({ "access": access, "refresh": refresh })).into_response()
}

async fn refresh_token(State(state): State<BackendState>, Json(body): Json<RefreshBody>) -> Response {
    let mut db = state.db.lock().await;
    let Some(user) = db.refresh_tokens.get(&body.refresh).copied() else {
        return detail(StatusCode::UNAUTHORIZED, "Token is invalid or expired");
    };
    let access = db.issue_access(user);
    Json(json!({ "access": access })).into_response()
}

async fn blacklist_token(
    State(state): State<BackendState>,
    Json(body): Json<RefreshBody>,
) -> Response {
    let mut db = state.db.lock().await;
    if db.refresh_tokens.remove(&body.refresh).is_none() {
        return detail(StatusCode::UNAUTHORIZED, "Token is blacklisted");
    }
    Json(json!({})).into_response()
}

async fn register(State(state): State<BackendState>, Json(body): Json<RegisterBody>) -> Response {
    let mut db = state.db.lock().await;
    if db.users.iter().any(|u| u.username == body.username) {
        return field_error("username", "A user with that username already exists.");
    }
    db.next_user += 1;
    let id = UserId::new(db.next_user);
    db.users.push(User {
        id,
        username: body.username.clone(),
        email: body.email.clone(),
        password: body.password,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "username": body.username, "email": body.email })),
    )
        .into_response()
}

async fn user_info(State(state): State<BackendState>, headers: HeaderMap) -> Response {
    let db = state.db.lock().await;
    let user = match authenticate(&db, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match db.user(user) {
        Some(u) => Json(json!({ "id": u.id, "username": u.username, "email": u.email }))
            .into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "User not found"),
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    category: Option<String>,
    is_active: Option<String>,
    search: Option<String>,
    ordering: Option<String>,
}

async fn list_products(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    let db = state.db.lock().await;
    if let Err(response) = authenticate(&db, &headers) {
        return response;
    }

    let category = match params.category.as_deref().map(str::parse::<Category>) {
        Some(Err(_)) => {
            return field_error(
                "category",
                "Select a valid choice. That choice is not one of the available choices.",
            );
        }
        Some(Ok(category)) => Some(category),
        None => None,
    };
    let is_active = match params.is_active.as_deref() {
        Some("true" | "True" | "1") => Some(true),
        Some("false" | "False" | "0") => Some(false),
        Some(_) => return field_error("is_active", "Enter a valid boolean."),
        None => None,
    };
    let needle = params.search.as_deref().map(str::to_lowercase);

    let mut products: Vec<&Product> = db
        .products
        .iter()
        .filter(|p| category.is_none_or(|c| p.category == c))
        .filter(|p| is_active.is_none_or(|a| p.is_active == a))
        .filter(|p| {
            needle.as_deref().is_none_or(|n| {
                p.name.to_lowercase().contains(n) || p.description.to_lowercase().contains(n)
            })
        })
        .collect();

    // Unknown ordering fields are ignored, like the real filter backend.
    if let Some(ordering) = params.ordering.as_deref() {
        let (descending, field) = match ordering.strip_prefix('-') {
            Some(field) => (true, field),
            None => (false, ordering),
        };
        let known = match field {
            "name" => {
                products.sort_by(|a, b| a.name.cmp(&b.name));
                true
            }
            "price" => {
                products.sort_by_key(|p| p.price);
                true
            }
            "quantity" => {
                products.sort_by_key(|p| p.quantity);
                true
            }
            "created_at" => {
                products.sort_by_key(|p| p.created_at);
                true
            }
            _ => false,
        };
        if known && descending {
            products.reverse();
        }
    }

    Json(products).into_response()
}

/// Paginated, so both list shapes get exercised.
async fn my_products(State(state): State<BackendState>, headers: HeaderMap) -> Response {
    let db = state.db.lock().await;
    let user = match authenticate(&db, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mine: Vec<&Product> = db
        .products
        .iter()
        .filter(|p| p.created_by == Some(user))
        .collect();
    Json(json!({ "count": mine.len(), "next": null, "previous": null, "results": mine }))
        .into_response()
}

async fn get_product(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let db = state.db.lock().await;
    if let Err(response) = authenticate(&db, &headers) {
        return response;
    }
    db.product_index(ProductId::new(id))
        .and_then(|i| db.products.get(i))
        .map_or_else(
            || detail(StatusCode::NOT_FOUND, "No Product matches the given query."),
            |p| Json(p).into_response(),
        )
}

async fn create_product(
    State(state): State<BackendState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let body = match read_form(multipart).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let mut db = state.db.lock().await;
    let user = match authenticate(&db, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let draft = match parse_draft(&body, true) {
        Ok(draft) => draft,
        Err(response) => return response,
    };
    let (Some(name), Some(price)) = (draft.name, draft.price) else {
        return field_error("name", REQUIRED);
    };
    if db.name_taken(&name, None) {
        return field_error("name", "product with this name already exists.");
    }

    db.next_product += 1;
    let product = Product {
        id: ProductId::new(db.next_product),
        name,
        description: draft.description.unwrap_or_default(),
        category: draft.category.unwrap_or_default(),
        price,
        quantity: draft.quantity.unwrap_or_default(),
        image: draft.image,
        is_active: draft.is_active.unwrap_or(true),
        created_at: Some(chrono::Utc::now()),
        updated_at: None,
        created_by: Some(user),
    };
    db.products.insert(0, product.clone());
    drop(db);

    state.publish("create", &to_json(&product));
    (StatusCode::CREATED, Json(product)).into_response()
}

/// Shared body of PUT and PATCH once the draft is parsed.
async fn update_with(
    state: &BackendState,
    headers: &HeaderMap,
    id: ProductId,
    draft: Draft,
) -> Response {
    let mut db = state.db.lock().await;
    let user = match authenticate(&db, headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(index) = db.product_index(id) else {
        return detail(StatusCode::NOT_FOUND, "No Product matches the given query.");
    };
    if let Some(name) = &draft.name
        && db.name_taken(name, Some(id))
    {
        return field_error("name", "product with this name already exists.");
    }
    let Some(product) = db.products.get_mut(index) else {
        return detail(StatusCode::NOT_FOUND, "No Product matches the given query.");
    };
    if product.created_by != Some(user) {
        return detail(
            StatusCode::FORBIDDEN,
            "You do not have permission to perform this action.",
        );
    }

    if let Some(name) = draft.name {
        product.name = name;
    }
    if let Some(description) = draft.description {
        product.description = description;
    }
    if let Some(category) = draft.category {
        product.category = category;
    }
    if let Some(price) = draft.price {
        product.price = price;
    }
    if let Some(quantity) = draft.quantity {
        product.quantity = quantity;
    }
    if let Some(is_active) = draft.is_active {
        product.is_active = is_active;
    }
    if let Some(image) = draft.image {
        product.image = Some(image);
    }
    product.updated_at = Some(chrono::Utc::now());
    let updated = product.clone();
    drop(db);

    state.publish("update", &to_json(&updated));
    Json(updated).into_response()
}

async fn replace_product(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Response {
    let draft = match read_form(multipart).await {
        Ok(body) => parse_draft(&body, true),
        Err(response) => return response,
    };
    match draft {
        Ok(draft) => update_with(&state, &headers, ProductId::new(id), draft).await,
        Err(response) => response,
    }
}

async fn patch_product(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    match parse_draft(&body, false) {
        Ok(draft) => update_with(&state, &headers, ProductId::new(id), draft).await,
        Err(response) => response,
    }
}

async fn delete_product(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let id = ProductId::new(id);
    let mut db = state.db.lock().await;
    let user = match authenticate(&db, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(index) = db.product_index(id) else {
        return detail(StatusCode::NOT_FOUND, "No Product matches the given query.");
    };
    if db.products.get(index).and_then(|p| p.created_by) != Some(user) {
        return detail(
            StatusCode::FORBIDDEN,
            "You do not have permission to perform this action.",
        );
    }
    db.products.remove(index);
    drop(db);

    state.publish("delete", &json!({ "id": id }));
    StatusCode::NO_CONTENT.into_response()
}

// ============================================================================
// Live channel
// ============================================================================

#[derive(Deserialize)]
struct LiveParams {
    token: Option<String>,
}

async fn live_products(
    State(state): State<BackendState>,
    Query(params): Query<LiveParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let authorized = {
        let db = state.db.lock().await;
        params
            .token
            .as_deref()
            .is_some_and(|token| db.access_tokens.contains_key(token))
    };
    if !authorized {
        return StatusCode::FORBIDDEN.into_response();
    }

    // Subscribe before the upgrade completes so no event is missed.
    let events = state.events.subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, events))
}

async fn stream_events(mut socket: WebSocket, mut events: broadcast::Receiver<Push>) {
    let hello = json!({
        "type": "connection_established",
        "message": "Connected to product updates",
    });
    if socket
        .send(Message::Text(hello.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            push = events.recv() => match push {
                Ok(Push::Frame(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(Push::Close) | Err(broadcast::error::RecvError::Closed) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Live subscriber lagged");
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

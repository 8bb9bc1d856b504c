//! Integration tests for the RYJ Computer storefront.
//!
//! The tests run the storefront library against [`MockBackend`], an in-process
//! axum server that speaks the backend's REST API:
//!
//! - `GET /products`, `GET /products/{id}`
//! - `POST /products`, `PUT /products/{id}` (bearer token)
//! - `POST /products/{id}/image` (bearer token, multipart field `image`)
//! - `POST /auth/login`, `POST /auth/register`
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ryj-integration-tests
//! ```
//!
//! Every request is recorded so tests can assert on what was sent.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ryj_storefront::StorefrontConfig;
use serde_json::{Value, json};
use url::Url;

pub use axum::http::Method;

/// Token handed out to the admin account.
pub const ADMIN_TOKEN: &str = "admin-token";
/// Token handed out to the customer account.
pub const CUSTOMER_TOKEN: &str = "customer-token";

pub const ADMIN_EMAIL: &str = "admin@ryjcomputer.pe";
pub const CUSTOMER_EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secreto123";

/// A request the mock backend received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    /// JSON body, or `{"field", "file_name", "size"}` for multipart uploads.
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct MockState {
    products: Mutex<Vec<Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    listing_fails: Mutex<bool>,
    next_id: Mutex<u64>,
}

impl MockState {
    fn record(&self, method: Method, path: String, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        lock(&self.requests).push(RecordedRequest {
            method,
            path,
            authorization,
            body,
        });
    }

    fn find(&self, id: &str) -> Option<Value> {
        lock(&self.products)
            .iter()
            .find(|p| product_id(p).as_deref() == Some(id))
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn product_id(product: &Value) -> Option<String> {
    match product.get("_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// In-process stand-in for the backend REST API.
#[derive(Debug, Clone)]
pub struct MockBackend {
    base_url: Url,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend serving [`sample_products`] on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        Self::with_products(sample_products()).await
    }

    /// Start a backend serving `products` (backend wire shape).
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn with_products(products: Vec<Value>) -> std::io::Result<Self> {
        let state = Arc::new(MockState {
            products: Mutex::new(products),
            next_id: Mutex::new(100),
            ..MockState::default()
        });

        let app = Router::new()
            .route("/products", get(list_products).post(create_product))
            .route("/products/{id}", get(get_product).put(update_product))
            .route("/products/{id}/image", post(upload_image))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        let base_url = Url::parse(&format!("http://{addr}"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Ok(Self { base_url, state })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A storefront configuration pointing at this backend, storing session
    /// records under `storage_dir`.
    #[must_use]
    pub fn config(&self, storage_dir: &Path) -> StorefrontConfig {
        StorefrontConfig::new(self.base_url.clone(), storage_dir)
    }

    /// Change a product's stock as the backend reports it.
    pub fn set_stock(&self, id: &str, stock: u32) {
        for product in lock(&self.state.products).iter_mut() {
            if product_id(product).as_deref() == Some(id) {
                product["stock"] = json!(stock);
            }
        }
    }

    /// Drop a product from the backend.
    pub fn remove_product(&self, id: &str) {
        lock(&self.state.products).retain(|p| product_id(p).as_deref() != Some(id));
    }

    /// Make `GET /products` answer 500 until switched back.
    pub fn fail_listing(&self, fail: bool) {
        *lock(&self.state.listing_fails) = fail;
    }

    /// Current backend record for `id`.
    #[must_use]
    pub fn product(&self, id: &str) -> Option<Value> {
        self.state.find(id)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Requests matching `method` and `path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }
}

/// Catalog in the loose shape the real backend produces: `_id` keys, prices
/// as numbers or strings, services with `priceFrom` and no stock.
#[must_use]
pub fn sample_products() -> Vec<Value> {
    vec![
        json!({
            "_id": "lap-1",
            "title": "Laptop Dell Inspiron 15",
            "price": 1571.08,
            "stock": 5,
            "categories": ["Laptops", "Oficina"],
            "thumb": "/uploads/dell-inspiron.jpg",
            "featured": true,
            "summary": "Intel Core i5, 8 GB RAM, SSD 512 GB",
            "specs": { "Procesador": "Intel Core i5-1235U", "Memoria RAM": "8 GB" }
        }),
        json!({
            "_id": "lap-2",
            "title": "Laptop Lenovo IdeaPad 3",
            "price": "1299.90",
            "stock": 3,
            "category": "Laptops",
            "thumb": "lenovo-ideapad.jpg",
            "specs": ["Procesador: AMD Ryzen 5", "Pantalla: 15.6\""]
        }),
        json!({
            "_id": 7,
            "title": "Impresora Epson EcoTank L3250",
            "price": 799,
            "stock": 0,
            "category": "Impresoras"
        }),
        json!({
            "_id": "srv-1",
            "title": "Mantenimiento de laptop",
            "kind": "service",
            "priceFrom": 79,
            "categories": ["Servicios"],
            "specs": "Limpieza interna, cambio de pasta térmica y diagnóstico."
        }),
    ]
}

// =============================================================================
// Handlers
// =============================================================================

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {ADMIN_TOKEN}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "Acceso denegado")),
        None => Err(error(StatusCode::UNAUTHORIZED, "Token requerido")),
    }
}

async fn list_products(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(Method::GET, "/products".to_string(), &headers, None);
    if *lock(&state.listing_fails) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Error del servidor");
    }
    let products = lock(&state.products).clone();
    Json(Value::Array(products)).into_response()
}

async fn get_product(
    State(state): State<Arc<MockState>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    state.record(Method::GET, format!("/products/{id}"), &headers, None);
    match state.find(&id) {
        Some(product) => Json(product).into_response(),
        None => error(StatusCode::NOT_FOUND, "Producto no encontrado"),
    }
}

async fn create_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, "/products".to_string(), &headers, Some(body.clone()));
    if let Err(response) = authorized(&headers) {
        return response;
    }

    let id = {
        let mut next = lock(&state.next_id);
        *next += 1;
        format!("p-{next}")
    };
    let mut product = body;
    product["_id"] = json!(id);
    lock(&state.products).push(product.clone());

    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(state): State<Arc<MockState>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::PUT, format!("/products/{id}"), &headers, Some(body.clone()));
    if let Err(response) = authorized(&headers) {
        return response;
    }

    let mut products = lock(&state.products);
    let Some(existing) = products
        .iter_mut()
        .find(|p| product_id(p).as_deref() == Some(id.as_str()))
    else {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    };

    if let (Some(target), Value::Object(fields)) = (existing.as_object_mut(), body) {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
    Json(existing.clone()).into_response()
}

async fn upload_image(
    State(state): State<Arc<MockState>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let path = format!("/products/{id}/image");
    if let Err(response) = authorized(&headers) {
        state.record(Method::POST, path, &headers, None);
        return response;
    }

    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let Ok(bytes) = field.bytes().await else {
            return error(StatusCode::BAD_REQUEST, "Archivo inválido");
        };
        if name == "image" {
            upload = Some(json!({
                "field": name,
                "file_name": file_name,
                "content_type": content_type,
                "size": bytes.len(),
            }));
        }
    }
    state.record(Method::POST, path, &headers, upload.clone());

    let Some(upload) = upload else {
        return error(StatusCode::BAD_REQUEST, "Falta el campo image");
    };
    if state.find(&id).is_none() {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    }

    let url = format!("/uploads/{}", upload["file_name"].as_str().unwrap_or("upload"));
    for product in lock(&state.products).iter_mut() {
        if product_id(product).as_deref() == Some(id.as_str()) {
            product["thumb"] = json!(url);
        }
    }
    Json(json!({ "url": url })).into_response()
}

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, "/auth/login".to_string(), &headers, Some(body.clone()));

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Credenciales inválidas");
    }

    match email {
        ADMIN_EMAIL => Json(json!({
            "token": ADMIN_TOKEN,
            "user": {
                "_id": 1,
                "name": "Rosa",
                "lastName": "Jiménez",
                "email": ADMIN_EMAIL,
                "role": "admin"
            }
        }))
        .into_response(),
        CUSTOMER_EMAIL => Json(json!({
            "token": CUSTOMER_TOKEN,
            "user": {
                "_id": "u-2",
                "name": "Ana",
                "lastName": "Torres",
                "email": CUSTOMER_EMAIL,
                "role": "user"
            }
        }))
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Credenciales inválidas"),
    }
}

async fn register(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, "/auth/register".to_string(), &headers, Some(body.clone()));

    if body["email"].as_str() == Some(CUSTOMER_EMAIL) {
        return error(StatusCode::CONFLICT, "El correo ya está registrado");
    }
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Usuario registrado", "email": body["email"] })),
    )
        .into_response()
}

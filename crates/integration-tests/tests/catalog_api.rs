//! Integration tests for the REST client and the stock directory.
//!
//! These run against the in-process mock backend and check that the loose
//! backend shapes are normalized on the way in.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use ryj_core::{ProductId, ProductKind, StockLevel};
use ryj_integration_tests::{Method, MockBackend};
use ryj_storefront::api::{ApiClient, ApiError};
use ryj_storefront::catalog::{self, Catalog, CatalogError, ProductSource, StockDirectory};

async fn client() -> (MockBackend, ApiClient, tempfile::TempDir) {
    let backend = MockBackend::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(&backend.config(dir.path())).unwrap();
    (backend, api, dir)
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_normalizes_backend_shapes() {
    let (_backend, api, _dir) = client().await;

    let products = api.list_products().await.unwrap();
    assert_eq!(products.len(), 4);

    let dell = &products[0];
    assert_eq!(dell.id.as_str(), "lap-1");
    assert_eq!(dell.price, Decimal::new(157_108, 2));
    assert_eq!(dell.stock, StockLevel::Finite(5));
    assert_eq!(dell.categories, vec!["Laptops", "Oficina"]);
    assert!(dell.featured);
    assert_eq!(dell.specs.get("Procesador"), Some("Intel Core i5-1235U"));

    let lenovo = &products[1];
    assert_eq!(lenovo.price, Decimal::new(129_990, 2));
    assert_eq!(lenovo.stock, StockLevel::Finite(3));
    assert_eq!(lenovo.specs.get("Pantalla"), Some("15.6\""));

    let printer = &products[2];
    assert_eq!(printer.id.as_str(), "7");
    assert!(!printer.is_available());

    let service = &products[3];
    assert_eq!(service.kind, ProductKind::Service);
    assert_eq!(service.price, Decimal::new(79, 0));
    assert!(service.stock.is_unlimited());
}

#[tokio::test]
async fn test_listing_is_not_cached() {
    let (backend, api, _dir) = client().await;

    api.list_products().await.unwrap();
    api.list_products().await.unwrap();

    assert_eq!(backend.requests_to(&Method::GET, "/products").len(), 2);
}

#[tokio::test]
async fn test_listing_failure_is_an_api_error() {
    let (backend, api, _dir) = client().await;
    backend.fail_listing(true);

    let err = api.list_products().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Api { status: 500, ref message } if message == "Error del servidor"
    ));
}

// =============================================================================
// Product detail
// =============================================================================

#[tokio::test]
async fn test_product_detail_is_cached() {
    let (backend, api, _dir) = client().await;
    let id = ProductId::new("lap-2");

    let first = api.get_product(&id).await.unwrap();
    let second = api.get_product(&id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.requests_to(&Method::GET, "/products/lap-2").len(), 1);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (_backend, api, _dir) = client().await;
    let id = ProductId::new("nope");

    let err = api.get_product(&id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref message) if message == "Producto no encontrado"));

    let err = ProductSource::get_product(&api, &id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref missing) if *missing == id));
}

#[tokio::test]
async fn test_image_urls_resolve_against_backend() {
    let (backend, api, _dir) = client().await;
    let base = backend.base_url().as_str().trim_end_matches('/').to_string();

    assert_eq!(
        api.image_url("/uploads/dell-inspiron.jpg"),
        Some(format!("{base}/uploads/dell-inspiron.jpg"))
    );
    assert_eq!(
        api.image_url("lenovo-ideapad.jpg"),
        Some(format!("{base}/uploads/lenovo-ideapad.jpg"))
    );
    assert_eq!(
        api.image_url("https://cdn.example.com/a.png"),
        Some("https://cdn.example.com/a.png".to_string())
    );
    assert_eq!(api.image_url("  "), None);
}

// =============================================================================
// Catalog helpers over live data
// =============================================================================

#[tokio::test]
async fn test_search_and_related_over_backend_catalog() {
    let (_backend, api, _dir) = client().await;
    let products = Catalog::Api(api).list_products().await.unwrap();

    let found = catalog::search(&products, "laptop");
    let titles: Vec<&str> = found.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Laptop Dell Inspiron 15",
            "Laptop Lenovo IdeaPad 3",
            "Mantenimiento de laptop"
        ]
    );

    let dell = &products[0];
    let related = catalog::related(&products, dell, 4);
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id.as_str(), "lap-2");

    assert_eq!(
        catalog::categories(&products),
        vec!["Laptops", "Oficina", "Impresoras", "Servicios"]
    );
}

// =============================================================================
// Stock directory
// =============================================================================

#[tokio::test]
async fn test_stock_refresh_tracks_backend() {
    let (backend, api, _dir) = client().await;
    let mut stock = StockDirectory::new();

    stock.refresh(&api).await.unwrap();
    assert_eq!(stock.lookup(&ProductId::new("lap-1")), StockLevel::Finite(5));
    assert_eq!(stock.lookup(&ProductId::new("srv-1")), StockLevel::Unlimited);
    assert_eq!(stock.lookup(&ProductId::new("missing")), StockLevel::Finite(0));

    backend.set_stock("lap-1", 1);
    stock.refresh(&api).await.unwrap();
    assert_eq!(stock.lookup(&ProductId::new("lap-1")), StockLevel::Finite(1));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let (backend, api, _dir) = client().await;
    let mut stock = StockDirectory::new();
    stock.refresh(&api).await.unwrap();
    let taken_at = stock.snapshot().taken_at();

    backend.fail_listing(true);
    backend.set_stock("lap-1", 0);
    assert!(stock.refresh(&api).await.is_err());

    assert_eq!(stock.lookup(&ProductId::new("lap-1")), StockLevel::Finite(5));
    assert_eq!(stock.snapshot().taken_at(), taken_at);
}

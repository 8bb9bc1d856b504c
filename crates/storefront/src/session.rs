//! Storefront session lifecycle.
//!
//! A [`StorefrontSession`] owns everything one shopper interacts with: the
//! catalog source, the stock directory, the cart and the login. It is opened
//! explicitly, refreshed explicitly and ended explicitly; nothing is global.

use std::sync::Arc;

use ryj_core::{Product, ProductId};
use tracing::instrument;

use crate::admin::{self, ProductDraft};
use crate::api::{ApiClient, UserProfile};
use crate::auth::AuthSession;
use crate::cart::{CartChange, CartStore};
use crate::catalog::{Catalog, ProductSource, StaticCatalog, StockDirectory};
use crate::checkout::{self, CheckoutForm, OrderConfirmation, OrderHandler};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::storage::{FileStorage, SessionStorage};

/// One shopper's session.
pub struct StorefrontSession {
    config: StorefrontConfig,
    api: ApiClient,
    catalog: Catalog,
    stock: StockDirectory,
    cart: CartStore,
    auth: AuthSession,
}

impl std::fmt::Debug for StorefrontSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontSession")
            .field("api", &self.api)
            .field("cart", &self.cart)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl StorefrontSession {
    /// Open a session from configuration.
    ///
    /// Restores the persisted cart and login from `storage_dir`, then tries
    /// one stock refresh. A failed refresh is logged; the cart stays enforced
    /// against the snapshot it was persisted with until a later refresh
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the static
    /// catalog file cannot be loaded.
    #[instrument(skip_all, fields(api = %config.api_base_url))]
    pub async fn open(config: StorefrontConfig) -> Result<Self> {
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::new(&config.storage_dir));
        let api = ApiClient::new(&config)?;
        let catalog = match &config.catalog_file {
            Some(path) => Catalog::File(StaticCatalog::from_file(path)?),
            None => Catalog::Api(api.clone()),
        };

        let mut session = Self::with_parts(config, api, catalog, storage);
        if let Err(e) = session.refresh_stock().await {
            tracing::warn!(error = %e, "Initial stock refresh failed");
        }
        Ok(session)
    }

    /// Assemble a session from explicit parts. Nothing is fetched; the stock
    /// directory starts from the restored cart's snapshot.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        api: ApiClient,
        catalog: Catalog,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let cart = CartStore::restore(Arc::clone(&storage), config.currency);
        let auth = AuthSession::restore(storage);
        let stock = StockDirectory::with_snapshot(cart.snapshot().clone());

        Self {
            config,
            api,
            catalog,
            stock,
            cart,
            auth,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn stock(&self) -> &StockDirectory {
        &self.stock
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Resolve an image reference against the backend.
    #[must_use]
    pub fn image_url(&self, reference: &str) -> Option<String> {
        self.api.image_url(reference)
    }

    // =========================================================================
    // Catalog & stock
    // =========================================================================

    /// Refresh the stock directory and re-clamp the cart against it.
    ///
    /// # Errors
    ///
    /// Returns the catalog error; the previous snapshot stays in force.
    #[instrument(skip(self))]
    pub async fn refresh_stock(&mut self) -> Result<CartChange> {
        let snapshot = self.stock.refresh(&self.catalog).await?;
        Ok(self.cart.apply_snapshot(snapshot))
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.catalog.list_products().await?)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns [`crate::catalog::CatalogError::NotFound`] for unknown ids.
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        Ok(self.catalog.get_product(id).await?)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Look up `id` and add `quantity` units of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched. Stock limits are
    /// never errors; see [`CartChange`].
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_to_cart(&mut self, id: &ProductId, quantity: u32) -> Result<CartChange> {
        let product = self.product(id).await?;
        Ok(self.cart.add(&product, quantity))
    }

    /// Validate the form, hand the order to `handler` and empty the cart
    /// once the handler accepts it.
    ///
    /// # Errors
    ///
    /// Returns a checkout error; the cart is kept on failure.
    pub async fn checkout<H>(
        &mut self,
        form: &CheckoutForm,
        handler: &H,
    ) -> Result<OrderConfirmation>
    where
        H: OrderHandler,
    {
        let confirmation = checkout::submit_order(&self.cart, form, handler).await?;
        self.cart.clear();
        Ok(confirmation)
    }

    // =========================================================================
    // Auth & admin
    // =========================================================================

    /// Log in against the backend.
    ///
    /// # Errors
    ///
    /// Returns an auth error for malformed input or rejected credentials.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile> {
        Ok(self.auth.login(&self.api, email, password).await?.clone())
    }

    /// Forget the login.
    pub fn logout(&mut self) {
        self.auth.logout();
    }

    /// Create or update a product as the logged-in admin.
    ///
    /// # Errors
    ///
    /// Returns an admin error (validation, missing role, backend failure).
    pub async fn save_product(&self, draft: &ProductDraft) -> Result<Product> {
        Ok(admin::save_product(&self.api, &self.auth, draft).await?)
    }

    /// Upload a product image as the logged-in admin.
    ///
    /// # Errors
    ///
    /// Returns an admin error (missing role, backend failure).
    pub async fn upload_image(
        &self,
        id: &ProductId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        Ok(admin::upload_image(&self.api, &self.auth, id, file_name, bytes).await?)
    }

    /// End the session: the cart and its persisted record are discarded.
    /// The login survives.
    pub fn end(mut self) {
        self.cart.discard();
        tracing::info!("Session ended");
    }
}

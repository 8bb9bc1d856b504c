//! Product endpoints.

use ryj_core::{Product, ProductId};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use super::wire::{ProductList, ProductPayload, RawProduct, UploadResponse};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// List every product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint("products")?;
        let list: ProductList = self.send_json(self.inner.client.get(url)).await?;
        let products = list.into_products();
        debug!(count = products.len(), "Fetched product listing");
        Ok(products)
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the backend does not know the id, or
    /// an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint(&product_path(id))?;
        let raw: RawProduct = self.send_json(self.inner.client.get(url)).await?;
        let product = raw
            .into_product()
            .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

        self.inner
            .products
            .insert(id.clone(), product.clone())
            .await;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected, or an
    /// error if the request fails.
    #[instrument(skip(self, token, payload), fields(title = %payload.title))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint("products")?;
        let request = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(payload);

        let raw: RawProduct = self.send_json(request).await?;
        let product = raw.into_product().ok_or_else(|| ApiError::Api {
            status: 200,
            message: "created product has no id".to_string(),
        })?;

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    /// Replace a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown ids,
    /// [`ApiError::Unauthorized`] if the token is rejected, or an error if the
    /// request fails.
    #[instrument(skip(self, token, payload), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&product_path(id))?;
        let request = self
            .inner
            .client
            .put(url)
            .bearer_auth(token.expose_secret())
            .json(payload);

        let raw: RawProduct = self.send_json(request).await?;
        self.inner.products.invalidate(id).await;

        // Some backends answer updates without echoing the id.
        let product = raw
            .into_product()
            .unwrap_or_else(|| payload_product(id, payload));

        tracing::info!(product_id = %id, "Updated product");
        Ok(product)
    }

    /// Upload a product image as multipart field `image`. Returns the URL
    /// the backend stored it under.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected, or an
    /// error if the request fails.
    #[instrument(skip(self, token, bytes), fields(product_id = %id, size = bytes.len()))]
    pub async fn upload_product_image(
        &self,
        token: &SecretString,
        id: &ProductId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(&format!("{}/image", product_path(id)))?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .multipart(form);

        let response: UploadResponse = self.send_json(request).await?;
        self.inner.products.invalidate(id).await;

        tracing::info!(product_id = %id, url = %response.url, "Uploaded product image");
        Ok(response.url)
    }
}

fn product_path(id: &ProductId) -> String {
    format!("products/{}", urlencoding::encode(id.as_str()))
}

/// Build the product the backend should now hold from what was sent.
fn payload_product(id: &ProductId, payload: &ProductPayload) -> Product {
    let mut product = Product::new(id.clone(), payload.title.clone(), payload.price, payload.stock)
        .with_categories(payload.categories.iter().cloned())
        .featured(payload.featured);
    product.kind = payload.kind;
    if product.kind == ryj_core::ProductKind::Service {
        product.stock = ryj_core::StockLevel::Unlimited;
    }
    product.thumbnail.clone_from(&payload.thumb);
    product.summary = Some(payload.summary.clone()).filter(|s| !s.is_empty());
    product.description = Some(payload.description.clone()).filter(|s| !s.is_empty());
    product.specs = payload.specs.clone().into();
    product
}

fn image_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_path_encodes_id() {
        assert_eq!(product_path(&ProductId::new("lap-1")), "products/lap-1");
        assert_eq!(product_path(&ProductId::new("a b/c")), "products/a%20b%2Fc");
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime("foto.JPG"), "image/jpeg");
        assert_eq!(image_mime("mouse1.webp"), "image/webp");
        assert_eq!(image_mime("noext"), "application/octet-stream");
    }
}

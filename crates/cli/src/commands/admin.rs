//! Catalog management commands.
//!
//! All of them need a login with the admin role (`ryj auth login`).

use std::path::Path;

use rust_decimal::Decimal;
use ryj_core::{ProductId, ProductKind};
use ryj_storefront::StorefrontSession;
use ryj_storefront::admin::{BulkImport, ProductDraft};

use super::{CliError, Output, add_breadcrumb};

/// Field changes applied to a draft. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct DraftEdit {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    /// Empty keeps the current categories.
    pub categories: Vec<String>,
    pub featured: Option<bool>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Specs as JSON text.
    pub specs: Option<String>,
}

impl DraftEdit {
    fn apply(self, draft: &mut ProductDraft) -> Result<(), CliError> {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(stock) = self.stock {
            draft.stock = stock;
        }
        if !self.categories.is_empty() {
            draft.set_categories(self.categories);
        }
        if let Some(featured) = self.featured {
            draft.featured = featured;
        }
        if let Some(summary) = self.summary {
            draft.summary = summary;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(specs) = self.specs {
            draft.edit_specs_json(&specs)?;
        }
        Ok(())
    }
}

/// Create a product.
pub async fn create(
    session: &StorefrontSession,
    out: &Output,
    kind: ProductKind,
    edit: DraftEdit,
    template: bool,
) -> Result<(), CliError> {
    let mut draft = ProductDraft {
        kind,
        ..ProductDraft::default()
    };
    edit.apply(&mut draft)?;
    if template {
        apply_template(&mut draft);
    }

    save(session, out, &draft).await
}

/// Fetch a product, apply `edit` and save it back.
pub async fn update(
    session: &StorefrontSession,
    out: &Output,
    id: &str,
    edit: DraftEdit,
) -> Result<(), CliError> {
    let product = session.product(&ProductId::new(id)).await?;
    let mut draft = ProductDraft::from_product(&product);
    edit.apply(&mut draft)?;

    save(session, out, &draft).await
}

/// Upload an image file for a product.
pub async fn upload(
    session: &StorefrontSession,
    out: &Output,
    id: &str,
    path: &Path,
) -> Result<(), CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

    let url = session
        .upload_image(&ProductId::new(id), &file_name, bytes)
        .await?;
    add_breadcrumb("admin", "image uploaded", &[("product_id", id)]);

    let resolved = session.image_url(&url).unwrap_or_else(|| url.clone());
    out.render(&serde_json::json!({ "url": url }), |out| {
        out.line(format!("Uploaded: {resolved}"));
    });
    Ok(())
}

/// Save every draft in a JSON file, one at a time.
///
/// Stops at the first failure; drafts before it stay saved.
pub async fn bulk(
    session: &StorefrontSession,
    out: &Output,
    path: &Path,
    template: bool,
) -> Result<(), CliError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let mut import = BulkImport::parse(&text)?;
    tracing::info!(drafts = import.len(), "Bulk import loaded");

    let mut saved = Vec::with_capacity(import.len());
    loop {
        let (position, total) = import.progress();
        let Some(draft) = import.current_mut() else {
            break;
        };
        if template && draft.specs.is_empty() {
            apply_template(draft);
        }
        let product = session.save_product(draft).await?;
        out.line(format!("[{position}/{total}] Saved {} [{}]", product.title, product.id));
        saved.push(product);

        if !import.advance() {
            break;
        }
    }

    out.render(&saved, |out| out.line(format!("Imported {} product(s).", saved.len())));
    Ok(())
}

async fn save(
    session: &StorefrontSession,
    out: &Output,
    draft: &ProductDraft,
) -> Result<(), CliError> {
    let product = session.save_product(draft).await?;
    add_breadcrumb("admin", "product saved", &[("product_id", product.id.as_str())]);

    out.render(&product, |out| {
        out.line(format!("Saved {} [{}]", product.title, product.id));
    });
    Ok(())
}

fn apply_template(draft: &mut ProductDraft) {
    match draft.apply_spec_template() {
        Some(product_type) => tracing::debug!(?product_type, "Applied spec template"),
        None => tracing::debug!(title = %draft.title, "No spec template for categories"),
    }
}

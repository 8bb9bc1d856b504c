//! Catalog browsing commands.

use ryj_core::{Price, Product, ProductId, ProductKind};
use ryj_storefront::catalog;
use ryj_storefront::StorefrontSession;

use super::{CliError, Output};

/// List products, optionally filtered by category or featured flag.
pub async fn list(
    session: &StorefrontSession,
    out: &Output,
    category: Option<&str>,
    featured_only: bool,
) -> Result<(), CliError> {
    let products = session.products().await?;
    let mut selected: Vec<&Product> = match category {
        Some(category) => catalog::in_category(&products, category),
        None => products.iter().collect(),
    };
    if featured_only {
        selected.retain(|p| p.featured);
    }

    out.render(&selected, |out| print_products(session, out, &selected));
    Ok(())
}

/// Search titles, then categories.
pub async fn search(
    session: &StorefrontSession,
    out: &Output,
    query: &str,
) -> Result<(), CliError> {
    let products = session.products().await?;
    let found = catalog::search(&products, query);

    out.render(&found, |out| {
        if found.is_empty() {
            out.line(format!("No results for \"{}\"", query.trim()));
        } else {
            out.line(format!("{} result(s) for \"{}\"", found.len(), query.trim()));
            print_products(session, out, &found);
        }
    });
    Ok(())
}

/// Show one product, its specs and related products.
pub async fn show(
    session: &StorefrontSession,
    out: &Output,
    id: &str,
    related_limit: usize,
) -> Result<(), CliError> {
    let id = ProductId::new(id);
    let product = session.product(&id).await?;
    let products = session.products().await?;
    let related = catalog::related(&products, &product, related_limit);

    let body = serde_json::json!({ "product": &product, "related": &related });
    out.render(&body, |out| {
        let currency = session.config().currency;
        out.line(format!("{} [{}]", product.title, product.id));
        out.line(format!("  Price: {}", price_label(&product, currency)));
        out.line(format!("  Stock: {}", product.stock));
        if !product.categories.is_empty() {
            out.line(format!("  Categories: {}", product.categories.join(", ")));
        }
        if let Some(url) = product.thumbnail.as_deref().and_then(|t| session.image_url(t)) {
            out.line(format!("  Image: {url}"));
        }
        if let Some(summary) = &product.summary {
            out.line(format!("  {summary}"));
        }
        let specs = product.specs.rows();
        if !specs.is_empty() {
            out.line("  Specs:");
            for (label, value) in specs {
                out.line(format!("    {label}: {value}"));
            }
        }
        if !related.is_empty() {
            out.line("  Related:");
            for p in &related {
                out.line(format!("    {} [{}]", p.title, p.id));
            }
        }
    });
    Ok(())
}

/// List every category in use.
pub async fn categories(session: &StorefrontSession, out: &Output) -> Result<(), CliError> {
    let products = session.products().await?;
    let names = catalog::categories(&products);

    out.render(&names, |out| {
        for name in &names {
            out.line(name);
        }
    });
    Ok(())
}

fn print_products(session: &StorefrontSession, out: &Output, products: &[&Product]) {
    let currency = session.config().currency;
    for product in products {
        let marker = if product.featured { "*" } else { " " };
        let availability = if product.is_available() {
            format!("stock {}", product.stock)
        } else {
            "out of stock".to_string()
        };
        out.line(format!(
            "{marker} {:<24} {:<40} {:>14}  {availability}",
            product.id.as_str(),
            product.title,
            price_label(product, currency),
        ));
    }
}

fn price_label(product: &Product, currency: ryj_core::CurrencyCode) -> String {
    let price = Price::new(product.price, currency);
    match product.kind {
        ProductKind::Service => format!("from {price}"),
        ProductKind::Product => price.to_string(),
    }
}

//! Case-insensitive substring search over product snapshots.

use ryj_core::Product;

/// Find products whose title or categories contain `query`.
///
/// Title matches come first, then products that only match on a category.
/// Each product appears at most once. A blank query matches nothing.
#[must_use]
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let (by_title, rest): (Vec<&Product>, Vec<&Product>) = products
        .iter()
        .partition(|p| p.title.to_lowercase().contains(&needle));

    let by_category = rest.into_iter().filter(|p| {
        p.categories
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
    });

    by_title.into_iter().chain(by_category).collect()
}

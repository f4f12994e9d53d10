//! Catalog route handlers.
//!
//! The full product list is fetched once (cached by the backend client) and
//! filtered in memory; the filter state lives in the query string so links
//! and the back button keep it.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, RawQuery, State};
use climatech_core::content::{active_only, sort_for_display};
use climatech_core::{Content, ContentId, ContentType, FilterOptions, PriceBounds, ProductFilters};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::PageContext;
use crate::state::AppState;

/// Related products shown under a product.
const RELATED_LIMIT: usize = 4;

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: ContentId,
    pub title: String,
    pub summary: String,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub btu_capacity: Option<String>,
    /// Has a numeric price, so it can go in the cart.
    pub purchasable: bool,
}

impl From<&Content> for ProductCard {
    fn from(product: &Content) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            summary: summarize(&product.description, 140),
            price: product.price_display(),
            image_url: product.image_url.clone(),
            category: product.category(),
            btu_capacity: product.btu_capacity(),
            purchasable: product.price_value().is_some(),
        }
    }
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductDetail {
    pub card: ProductCard,
    pub description: String,
    pub condition: Option<String>,
    pub features: Vec<String>,
}

impl From<&Content> for ProductDetail {
    fn from(product: &Content) -> Self {
        Self {
            card: ProductCard::from(product),
            description: product.description.clone(),
            condition: product.condition(),
            features: product.features(),
        }
    }
}

/// A filter checkbox.
#[derive(Clone)]
pub struct FilterChoice {
    pub value: String,
    pub checked: bool,
}

/// Sidebar filter state for templates.
#[derive(Clone)]
pub struct FilterPanel {
    pub search: String,
    pub categories: Vec<FilterChoice>,
    pub btu: Vec<FilterChoice>,
    pub min_price: String,
    pub max_price: String,
    pub price_hint: Option<String>,
    pub active: bool,
}

impl FilterPanel {
    fn new(filters: &ProductFilters, options: &FilterOptions, bounds: Option<PriceBounds>) -> Self {
        let choices = |values: &[String], selected: &std::collections::BTreeSet<String>| {
            values
                .iter()
                .map(|v| FilterChoice {
                    value: v.clone(),
                    checked: selected.iter().any(|s| s.eq_ignore_ascii_case(v)),
                })
                .collect()
        };

        Self {
            search: filters.search.clone().unwrap_or_default(),
            categories: choices(&options.categories, &filters.categories),
            btu: choices(&options.btu, &filters.btu),
            min_price: filters.min_price.map(|p| p.to_string()).unwrap_or_default(),
            max_price: filters.max_price.map(|p| p.to_string()).unwrap_or_default(),
            price_hint: bounds.map(|b| {
                format!(
                    "{} – {}",
                    climatech_core::Price::cop(b.min).display(),
                    climatech_core::Price::cop(b.max).display()
                )
            }),
            active: !filters.is_empty(),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub panel: FilterPanel,
    pub total_count: usize,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetail,
    pub related: Vec<ProductCard>,
}

/// Active products in display order.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn active_products(state: &AppState) -> std::result::Result<Vec<Content>, BackendError> {
    let mut products = active_only(state.backend().list_content(ContentType::Product).await?);
    sort_for_display(&mut products);
    Ok(products)
}

/// Filter choices from the backend taxonomy, or derived from the products
/// when the taxonomy is empty or unavailable.
async fn filter_options(state: &AppState, products: &[Content]) -> FilterOptions {
    match state.backend().product_options().await {
        Ok(options) => {
            let grouped = FilterOptions::from_options(options);
            if grouped.is_empty() {
                FilterOptions::from_products(products)
            } else {
                grouped
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load product options");
            FilterOptions::from_products(products)
        }
    }
}

/// Display product listing page.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RawQuery(query): RawQuery,
) -> Result<ProductsIndexTemplate> {
    let filters = ProductFilters::from_query_pairs(url::form_urlencoded::parse(
        query.as_deref().unwrap_or_default().as_bytes(),
    ));

    let products = active_products(&state).await?;
    let options = filter_options(&state, &products).await;
    let bounds = PriceBounds::of(&products);
    let matching = filters.apply(&products);

    tracing::debug!(
        total = products.len(),
        matching = matching.len(),
        "Catalog filtered"
    );

    Ok(ProductsIndexTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        products: matching.iter().map(ProductCard::from).collect(),
        panel: FilterPanel::new(&filters, &options, bounds),
        total_count: products.len(),
    })
}

/// Display product detail page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Path(id): Path<i64>,
) -> Result<ProductShowTemplate> {
    let id = ContentId::new(id);
    let product = state
        .backend()
        .get_content(ContentType::Product, id)
        .await?;
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let related = match active_products(&state).await {
        Ok(products) => related_products(&product, &products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load related products");
            Vec::new()
        }
    };

    Ok(ProductShowTemplate {
        page: PageContext::load(&state, &session, nonce).await,
        product: ProductDetail::from(&product),
        related,
    })
}

/// Other products in the same category.
fn related_products(product: &Content, products: &[Content]) -> Vec<ProductCard> {
    let Some(category) = product.category() else {
        return Vec::new();
    };
    products
        .iter()
        .filter(|p| p.id != product.id)
        .filter(|p| p.category().is_some_and(|c| c.eq_ignore_ascii_case(&category)))
        .take(RELATED_LIMIT)
        .map(ProductCard::from)
        .collect()
}

/// Shorten text to `max` characters on a word boundary.
#[must_use]
pub fn summarize(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let cut = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
    format!("{}…", cut.trim_end_matches([',', '.', ';']))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(id: i64, category: &str) -> Content {
        serde_json::from_value(json!({
            "id": id, "type": "product", "title": format!("P{id}"),
            "priceNumeric": 100_000, "data": {"category": category}
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize_cuts_on_word_boundary() {
        assert_eq!(summarize("Aire acondicionado", 50), "Aire acondicionado");
        assert_eq!(summarize("Equipo inverter de alta eficiencia", 20), "Equipo inverter de…");
    }

    #[test]
    fn test_related_products_same_category_excluding_self() {
        let products = vec![
            product(1, "Split"),
            product(2, "split"),
            product(3, "Ventana"),
        ];
        let related = related_products(&products[0], &products);
        let ids: Vec<i64> = related.iter().map(|c| c.id.as_i64()).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_filter_panel_marks_checked_choices() {
        let filters = ProductFilters::from_query_pairs([("category", "split")]);
        let options = FilterOptions {
            categories: vec!["Split".into(), "Ventana".into()],
            btu: vec![],
            conditions: vec![],
        };
        let panel = FilterPanel::new(&filters, &options, None);
        assert!(panel.active);
        assert!(panel.categories[0].checked);
        assert!(!panel.categories[1].checked);
    }

    #[test]
    fn test_card_marks_unpriced_products() {
        let quote: Content =
            serde_json::from_value(json!({"id": 8, "type": "product", "title": "Proyecto"}))
                .unwrap();
        assert!(!ProductCard::from(&quote).purchasable);
        assert!(ProductCard::from(&product(1, "Split")).purchasable);
    }
}

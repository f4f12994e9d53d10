//! Catalog filtering.
//!
//! Filters are pure predicates over the product list already fetched from the
//! backend: search text, category membership, BTU membership and an inclusive
//! price range. An empty filter set returns the full list.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::content::Content;
use crate::types::parse_price_text;
use crate::records::{OptionKind, ProductOption};

/// Active catalog filters, parsed from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub categories: BTreeSet<String>,
    pub btu: BTreeSet<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilters {
    /// Build filters from decoded query pairs.
    ///
    /// `category` and `btu` may repeat (one checkbox each). Empty values and
    /// unparseable prices are ignored.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "q" | "search" => filters.search = Some(value.to_string()),
                "category" => {
                    filters.categories.insert(value.to_string());
                }
                "btu" => {
                    filters.btu.insert(value.to_string());
                }
                "min_price" => filters.min_price = parse_bound(value),
                "max_price" => filters.max_price = parse_bound(value),
                _ => {}
            }
        }
        filters
    }

    /// Whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.categories.is_empty()
            && self.btu.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Whether a product passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Content) -> bool {
        self.matches_search(product)
            && matches_set(&self.categories, product.category())
            && matches_set(&self.btu, product.btu_capacity())
            && self.matches_price(product)
    }

    /// Products passing every active filter, in their original order.
    #[must_use]
    pub fn apply(&self, products: &[Content]) -> Vec<Content> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }

    /// Re-encode the filters as a query string (without the leading `?`),
    /// used to keep filters across pagination and "remove filter" links.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &self.search {
            serializer.append_pair("q", search);
        }
        for category in &self.categories {
            serializer.append_pair("category", category);
        }
        for btu in &self.btu {
            serializer.append_pair("btu", btu);
        }
        if let Some(min) = self.min_price {
            serializer.append_pair("min_price", &min.to_string());
        }
        if let Some(max) = self.max_price {
            serializer.append_pair("max_price", &max.to_string());
        }
        serializer.finish()
    }

    fn matches_search(&self, product: &Content) -> bool {
        let Some(search) = &self.search else {
            return true;
        };
        let needle = search.to_lowercase();
        [
            Some(product.title.clone()),
            Some(product.description.clone()),
            product.category(),
            product.btu_capacity(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_price(&self, product: &Content) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return true;
        }
        let Some(price) = product.price_value() else {
            return false;
        };
        self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }
}

fn matches_set(selected: &BTreeSet<String>, value: Option<String>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.iter().any(|s| s.eq_ignore_ascii_case(&v)))
}

/// Price bounds accept what a visitor types: `900000`, `900.000`, `$1.500.000`.
fn parse_bound(value: &str) -> Option<Decimal> {
    parse_price_text(value)
}

/// Filter choices grouped by kind, for rendering the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub btu: Vec<String>,
    pub conditions: Vec<String>,
}

impl FilterOptions {
    /// Group backend taxonomy values by kind, sorted by their `order`.
    #[must_use]
    pub fn from_options(mut options: Vec<ProductOption>) -> Self {
        options.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.value.cmp(&b.value)));
        let mut grouped = Self::default();
        for option in options {
            let bucket = match option.kind {
                OptionKind::Category => &mut grouped.categories,
                OptionKind::Btu => &mut grouped.btu,
                OptionKind::Condition => &mut grouped.conditions,
            };
            if !bucket.contains(&option.value) {
                bucket.push(option.value);
            }
        }
        grouped
    }

    /// Derive choices from the products themselves, used when the backend
    /// has no taxonomy configured yet.
    #[must_use]
    pub fn from_products(products: &[Content]) -> Self {
        let categories: BTreeSet<String> = products.iter().filter_map(Content::category).collect();
        let btu: BTreeSet<String> = products.iter().filter_map(Content::btu_capacity).collect();
        let conditions: BTreeSet<String> = products.iter().filter_map(Content::condition).collect();
        Self {
            categories: categories.into_iter().collect(),
            btu: btu.into_iter().collect(),
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Whether there is nothing to offer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.btu.is_empty() && self.conditions.is_empty()
    }
}

/// Lowest and highest price in a product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBounds {
    /// Bounds over priced products, or `None` if none has a price.
    #[must_use]
    pub fn of(products: &[Content]) -> Option<Self> {
        let mut prices = products.iter().filter_map(Content::price_value);
        let first = prices.next()?;
        Some(prices.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::OptionId;
    use serde_json::json;

    fn catalog() -> Vec<Content> {
        serde_json::from_value(json!([
            {"id": 1, "type": "product", "title": "Mini split Inverter", "priceNumeric": 1_500_000,
             "data": {"category": "Mini split", "btuCapacity": "12000"}},
            {"id": 2, "type": "product", "title": "Aire de ventana", "priceNumeric": 900_000,
             "data": {"category": "Ventana", "btuCapacity": "9000"}},
            {"id": 3, "type": "product", "title": "Cassette comercial", "priceNumeric": 4_800_000,
             "data": {"category": "Cassette", "btuCapacity": "36000"}},
            {"id": 4, "type": "product", "title": "Mini split básico", "price": "A convenir",
             "data": {"category": "Mini split", "btuCapacity": 18000}}
        ]))
        .unwrap()
    }

    fn ids(items: &[Content]) -> Vec<i64> {
        items.iter().map(|c| c.id.as_i64()).collect()
    }

    #[test]
    fn test_empty_filters_return_full_list() {
        let filters = ProductFilters::from_query_pairs(Vec::<(&str, &str)>::new());
        assert!(filters.is_empty());
        assert_eq!(ids(&filters.apply(&catalog())), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let filters = ProductFilters::from_query_pairs([("q", "MINI")]);
        assert_eq!(ids(&filters.apply(&catalog())), vec![1, 4]);

        let filters = ProductFilters::from_query_pairs([("q", "36000")]);
        assert_eq!(ids(&filters.apply(&catalog())), vec![3]);
    }

    #[test]
    fn test_category_membership_with_repeated_keys() {
        let filters =
            ProductFilters::from_query_pairs([("category", "Ventana"), ("category", "Cassette")]);
        assert_eq!(ids(&filters.apply(&catalog())), vec![2, 3]);
    }

    #[test]
    fn test_category_without_matches_yields_empty() {
        let filters = ProductFilters::from_query_pairs([("category", "Calefactor")]);
        assert!(filters.apply(&catalog()).is_empty());
    }

    #[test]
    fn test_btu_membership_accepts_numeric_data() {
        let filters = ProductFilters::from_query_pairs([("btu", "18000")]);
        assert_eq!(ids(&filters.apply(&catalog())), vec![4]);
    }

    #[test]
    fn test_price_range_is_inclusive_and_skips_unpriced() {
        let filters =
            ProductFilters::from_query_pairs([("min_price", "900000"), ("max_price", "1500000")]);
        assert_eq!(filters.min_price, Some(Decimal::from(900_000)));
        assert_eq!(ids(&filters.apply(&catalog())), vec![1, 2]);

        let above = ProductFilters::from_query_pairs([("min_price", "900001")]);
        assert_eq!(ids(&above.apply(&catalog())), vec![1, 3]);
    }

    #[test]
    fn test_price_bounds_accept_thousands_separators() {
        let filters = ProductFilters::from_query_pairs([
            ("min_price", "900.000"),
            ("max_price", "$1.500.000"),
        ]);
        assert_eq!(filters.min_price, Some(Decimal::from(900_000)));
        assert_eq!(filters.max_price, Some(Decimal::from(1_500_000)));
        assert_eq!(ids(&filters.apply(&catalog())), vec![1, 2]);

        let dotted_max = ProductFilters::from_query_pairs([("max_price", "1.500.000")]);
        assert!(!ids(&dotted_max.apply(&catalog())).contains(&3));
    }

    #[test]
    fn test_clearing_filters_restores_list() {
        let narrowed = ProductFilters::from_query_pairs([("category", "Cassette")]);
        assert_eq!(narrowed.apply(&catalog()).len(), 1);
        let cleared = ProductFilters::default();
        assert_eq!(cleared.apply(&catalog()).len(), 4);
    }

    #[test]
    fn test_query_string_preserves_filters() {
        let filters = ProductFilters::from_query_pairs([
            ("q", "split inverter"),
            ("category", "Mini split"),
            ("btu", ""),
        ]);
        let qs = filters.to_query_string();
        assert_eq!(qs, "q=split+inverter&category=Mini+split");
        let reparsed = ProductFilters::from_query_pairs(url::form_urlencoded::parse(qs.as_bytes()));
        assert_eq!(reparsed, filters);
    }

    #[test]
    fn test_filter_options_grouping() {
        let options = vec![
            ProductOption { id: OptionId::new(1), kind: OptionKind::Btu, value: "18000".into(), order: 2 },
            ProductOption { id: OptionId::new(2), kind: OptionKind::Btu, value: "9000".into(), order: 1 },
            ProductOption { id: OptionId::new(3), kind: OptionKind::Category, value: "Split".into(), order: 0 },
        ];
        let grouped = FilterOptions::from_options(options);
        assert_eq!(grouped.btu, vec!["9000", "18000"]);
        assert_eq!(grouped.categories, vec!["Split"]);
        assert!(grouped.conditions.is_empty());
    }

    #[test]
    fn test_price_bounds() {
        let bounds = PriceBounds::of(&catalog()).unwrap();
        assert_eq!(bounds.min, Decimal::from(900_000));
        assert_eq!(bounds.max, Decimal::from(4_800_000));
        assert!(PriceBounds::of(&[]).is_none());
    }
}

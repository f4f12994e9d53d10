//! CMS-style content records served by `/api/content/:type`.
//!
//! Slides, products, services, FAQs and advantages share one record shape.
//! Type-specific attributes (product category, BTU capacity, advantage icon)
//! live in the free-form `data` bag and are read through accessors here so
//! templates and filters never poke at raw JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{ContentId, Price, parse_price_text};

/// The kinds of content managed through the generic content endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Slide,
    Product,
    Service,
    Faq,
    Advantage,
    Setting,
}

impl ContentType {
    /// Types editable through the generic admin content screens.
    pub const EDITABLE: &'static [Self] = &[
        Self::Slide,
        Self::Product,
        Self::Service,
        Self::Faq,
        Self::Advantage,
    ];

    /// URL segment used by the backend (`/api/content/{segment}`) and by the
    /// admin routes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Slide => "slide",
            Self::Product => "product",
            Self::Service => "service",
            Self::Faq => "faq",
            Self::Advantage => "advantage",
            Self::Setting => "setting",
        }
    }

    /// Singular label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Slide => "Slide",
            Self::Product => "Producto",
            Self::Service => "Servicio",
            Self::Faq => "Pregunta frecuente",
            Self::Advantage => "Ventaja",
            Self::Setting => "Ajuste",
        }
    }

    /// Plural label used for navigation and page titles.
    #[must_use]
    pub const fn plural_label(&self) -> &'static str {
        match self {
            Self::Slide => "Slides",
            Self::Product => "Productos",
            Self::Service => "Servicios",
            Self::Faq => "Preguntas frecuentes",
            Self::Advantage => "Ventajas",
            Self::Setting => "Ajustes",
        }
    }

    /// Whether records of this type carry a price.
    #[must_use]
    pub const fn has_price(&self) -> bool {
        matches!(self, Self::Product | Self::Service)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slide" | "slides" => Ok(Self::Slide),
            "product" | "products" => Ok(Self::Product),
            "service" | "services" => Ok(Self::Service),
            "faq" | "faqs" => Ok(Self::Faq),
            "advantage" | "advantages" => Ok(Self::Advantage),
            "setting" | "settings" => Ok(Self::Setting),
            other => Err(format!("unknown content type: {other}")),
        }
    }
}

/// A content record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: ContentId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Display price as entered by staff (e.g. `"$1.250.000"`).
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub price_numeric: Option<Decimal>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
}

const fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Content {
    /// Read a string attribute from the `data` bag. Numbers are stringified so
    /// `"btuCapacity": 12000` and `"btuCapacity": "12000"` read the same.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Product category (e.g. `"Mini split"`).
    #[must_use]
    pub fn category(&self) -> Option<String> {
        self.data_str("category")
    }

    /// Cooling capacity in BTU (e.g. `"12000"`).
    #[must_use]
    pub fn btu_capacity(&self) -> Option<String> {
        self.data_str("btuCapacity")
    }

    /// Product condition (new, refurbished...).
    #[must_use]
    pub fn condition(&self) -> Option<String> {
        self.data_str("condition")
    }

    /// Icon name for advantages.
    #[must_use]
    pub fn icon(&self) -> Option<String> {
        self.data_str("icon")
    }

    /// Link target for slides (call-to-action button).
    #[must_use]
    pub fn link_url(&self) -> Option<String> {
        self.data_str("linkUrl")
    }

    /// Bullet-point features listed on the product detail page.
    #[must_use]
    pub fn features(&self) -> Vec<String> {
        match self.data.get("features") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Some(Value::String(s)) => s
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Numeric price used for totals and filtering.
    ///
    /// Prefers `priceNumeric`, then `data.priceNumeric`, then the display text.
    #[must_use]
    pub fn price_value(&self) -> Option<Decimal> {
        self.price_numeric
            .or_else(|| self.data_str("priceNumeric").and_then(|s| s.parse().ok()))
            .or_else(|| self.price.as_deref().and_then(parse_price_text))
    }

    /// Display price: the staff-entered text when present, otherwise the
    /// formatted numeric value.
    #[must_use]
    pub fn price_display(&self) -> Option<String> {
        self.price
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .or_else(|| self.price_value().map(|v| Price::cop(v).display()))
    }
}

/// Keep only records flagged active.
#[must_use]
pub fn active_only(items: Vec<Content>) -> Vec<Content> {
    items.into_iter().filter(|c| c.is_active).collect()
}

/// Sort records by their `order` position, then by id for a stable layout.
pub fn sort_for_display(items: &mut [Content]) {
    items.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
}

/// Body for creating or updating a content record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_numeric: Option<Decimal>,
    pub order: i32,
    pub is_active: bool,
    pub data: Map<String, Value>,
}

impl From<&Content> for ContentInput {
    fn from(content: &Content) -> Self {
        Self {
            title: content.title.clone(),
            description: content.description.clone(),
            image_url: content.image_url.clone(),
            price: content.price.clone(),
            price_numeric: content.price_numeric,
            order: content.order,
            is_active: content.is_active,
            data: content.data.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(value: Value) -> Content {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let c = product(json!({
            "id": 3,
            "type": "product",
            "title": "Mini split 12.000 BTU",
            "description": null,
            "imageUrl": "https://cdn.example.co/a.png",
            "price": "$1.890.000",
            "priceNumeric": 1_890_000,
            "order": 2,
            "isActive": true,
            "data": {"category": "Mini split", "btuCapacity": 12000, "features": ["Inverter", " "]}
        }));
        assert_eq!(c.content_type, ContentType::Product);
        assert_eq!(c.description, "");
        assert_eq!(c.category().as_deref(), Some("Mini split"));
        assert_eq!(c.btu_capacity().as_deref(), Some("12000"));
        assert_eq!(c.features(), vec!["Inverter".to_string()]);
        assert_eq!(c.price_value(), Some(Decimal::from(1_890_000)));
    }

    #[test]
    fn test_missing_fields_default() {
        let c = product(json!({"id": 1, "type": "faq", "title": "¿Instalan?", "data": null}));
        assert!(c.is_active);
        assert!(c.data.is_empty());
        assert_eq!(c.price_value(), None);
        assert_eq!(c.price_display(), None);
    }

    #[test]
    fn test_price_value_falls_back_to_text() {
        let c = product(json!({"id": 1, "type": "service", "price": "$150.000"}));
        assert_eq!(c.price_value(), Some(Decimal::from(150_000)));
        assert_eq!(c.price_display().as_deref(), Some("$150.000"));
    }

    #[test]
    fn test_sort_for_display_orders_by_position_then_id() {
        let mut items = vec![
            product(json!({"id": 5, "type": "slide", "order": 2})),
            product(json!({"id": 9, "type": "slide", "order": 1})),
            product(json!({"id": 2, "type": "slide", "order": 2})),
        ];
        sort_for_display(&mut items);
        let ids: Vec<i64> = items.iter().map(|c| c.id.as_i64()).collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[test]
    fn test_content_type_accepts_plural_segments() {
        assert_eq!("faqs".parse::<ContentType>(), Ok(ContentType::Faq));
        assert!("blog".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_input_serializes_price_as_number() {
        let input = ContentInput {
            title: "Kit".into(),
            price_numeric: Some(Decimal::from(2500)),
            ..ContentInput::default()
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["priceNumeric"], json!(2500.0));
        assert!(value.get("imageUrl").is_none());
        assert_eq!(value["isActive"], json!(false));
    }
}

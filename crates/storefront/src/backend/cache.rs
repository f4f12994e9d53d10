//! Cache types for public backend reads.

use climatech_core::records::{ProductOption, StoreSettings};
use climatech_core::{Content, ContentId, ContentType};

/// Cache key for catalog and site content.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    ContentList(ContentType),
    Content(ContentType, ContentId),
    ProductOptions,
    StoreSettings,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    ContentList(Vec<Content>),
    Content(Box<Content>),
    ProductOptions(Vec<ProductOption>),
    StoreSettings(Box<StoreSettings>),
}

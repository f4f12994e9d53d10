//! Rate limiting for form submissions using governor and `tower_governor`.
//!
//! Checkout and appointment requests each create a record on the backend, so
//! they get a per-IP budget. Browsing is not limited here.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the client IP, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "fly-client-ip", "x-real-ip"];

/// Key extractor that reads the client IP from proxy headers, then from the
/// peer address (requires `into_make_service_with_connect_info`).
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Resolve the client IP from proxy headers.
#[must_use]
pub fn client_ip(headers: &axum::http::HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| header(name).and_then(|s| s.trim().parse().ok()))
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for checkout and appointment POSTs: one token every 6 seconds
/// (~10 per minute) with a burst of 5.
///
/// # Panics
///
/// Never in practice: both parameters are non-zero constants, which is all
/// `GovernorConfigBuilder::finish` checks.
#[must_use]
pub fn form_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("non-zero rate limiter parameters");
    GovernorLayer::new(Arc::new(config))
}

//! Security headers middleware.
//!
//! Locked-down defaults, opened only for what the storefront needs: the
//! Wompi widget (script, iframe and API), the HTMX script, and product
//! images served from the backend's storage host.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Build the CSP for a request nonce.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let script_nonce = nonce
        .filter(|n| !n.is_empty())
        .map(|n| format!(" 'nonce-{n}'"))
        .unwrap_or_default();
    format!(
        "default-src 'none'; \
         script-src 'self'{script_nonce} https://checkout.wompi.co https://unpkg.com; \
         style-src 'self' 'unsafe-inline'; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self' https://*.wompi.co; \
         frame-src https://checkout.wompi.co; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' https://checkout.wompi.co; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    let policy = content_security_policy(nonce.as_ref().map(CspNonce::value));
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), microphone=(), geolocation=(), usb=(), payment=(self \"https://checkout.wompi.co\")",
        ),
    );

    // The Wompi widget opens a popup for some payment methods (PSE, Nequi).
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_includes_nonce_and_wompi() {
        let policy = content_security_policy(Some("abc123"));
        assert!(policy.contains("script-src 'self' 'nonce-abc123' https://checkout.wompi.co"));
        assert!(policy.contains("frame-src https://checkout.wompi.co"));
        assert!(policy.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_policy_without_nonce() {
        let policy = content_security_policy(None);
        assert!(!policy.contains("nonce-"));
        assert!(HeaderValue::from_str(&policy).is_ok());
    }
}

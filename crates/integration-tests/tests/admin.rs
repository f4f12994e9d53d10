//! Admin panel end-to-end tests.
//!
//! Require a running admin server (`cargo run -p climatech-admin`). Tests
//! that sign in also need `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD`.

#![allow(clippy::unwrap_used)]

use climatech_integration_tests::{admin_credentials, admin_login, admin_url, client};
use reqwest::{StatusCode, header::LOCATION};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_protected_pages_redirect_to_login() {
    let client = client().unwrap();
    let base = admin_url();

    for path in ["/", "/content/product", "/orders", "/customers", "/settings"] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert!(response.status().is_redirection(), "GET {path}");
        assert_eq!(response.headers()[LOCATION], "/auth/login", "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_page_renders() {
    let client = client().unwrap();
    let response = client
        .get(format!("{}/auth/login", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("password"));
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_wrong_password_stays_on_login() {
    let client = client().unwrap();
    let signed_in = admin_login(&client, "nadie@example.com", "incorrecta")
        .await
        .unwrap();
    assert!(!signed_in);

    let response = client.get(admin_url()).send().await.unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
#[ignore = "Requires running admin server and staff credentials"]
async fn test_signed_in_staff_can_browse_sections() {
    let Some((email, password)) = admin_credentials() else {
        return;
    };
    let client = client().unwrap();
    assert!(admin_login(&client, &email, &password).await.unwrap());

    let base = admin_url();
    for path in [
        "/",
        "/content/slide",
        "/content/product",
        "/content/service",
        "/content/faq",
        "/content/advantage",
        "/orders",
        "/customers",
        "/appointments",
        "/technicians",
        "/product-options",
        "/settings",
    ] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
    }

    let unknown = client
        .get(format!("{base}/content/setting"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and staff credentials"]
async fn test_slide_reorder_rejects_unknown_ids() {
    let Some((email, password)) = admin_credentials() else {
        return;
    };
    let client = client().unwrap();
    assert!(admin_login(&client, &email, &password).await.unwrap());

    // An id that is not a slide never reaches the backend
    let response = client
        .post(format!("{}/slides/reorder", admin_url()))
        .json(&json!({"ids": [999_999_999]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let slides = client
        .get(format!("{}/content/slide", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(slides.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server and staff credentials"]
async fn test_logout_ends_session() {
    let Some((email, password)) = admin_credentials() else {
        return;
    };
    let client = client().unwrap();
    assert!(admin_login(&client, &email, &password).await.unwrap());

    let logout = client
        .post(format!("{}/auth/logout", admin_url()))
        .send()
        .await
        .unwrap();
    assert!(logout.status().is_redirection());

    let after = client.get(admin_url()).send().await.unwrap();
    assert_eq!(after.headers()[LOCATION], "/auth/login");
}

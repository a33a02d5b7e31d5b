//! Sign-up, sign-in, sign-out and the identity gate over HTTP.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use gastro_serra_integration_tests::{PASSWORD, TestApp};

#[tokio::test]
async fn test_anonymous_admin_redirects_to_login() {
    let app = TestApp::spawn().await;

    let resp = app.raw.get(app.url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/login");

    let resp = app.raw.post(app.url("/admin/new")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/login");
}

#[tokio::test]
async fn test_sign_up_flashes_success_once() {
    let app = TestApp::spawn().await;

    let resp = app
        .post(
            "/login",
            &[
                ("mode", "signup"),
                ("email", "nova@serra.com.br"),
                ("password", PASSWORD),
            ],
        )
        .await;
    assert_eq!(resp.url().path(), "/login");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Conta criada com sucesso! Faça login para continuar."));
    assert!(body.contains("banner-success"));

    // Sign-up does not sign in
    assert!(body.contains(r#"href="/login""#));

    let again = app.page("/login").await;
    assert!(!again.contains("Conta criada com sucesso!"));
}

#[tokio::test]
async fn test_sign_up_rejects_short_password_locally() {
    let app = TestApp::spawn().await;

    let resp = app
        .post(
            "/login",
            &[
                ("mode", "signup"),
                ("email", "curta@serra.com.br"),
                ("password", "123"),
            ],
        )
        .await;
    assert_eq!(resp.url().query(), Some("mode=signup"));
    let body = resp.text().await.unwrap();
    assert!(body.contains("banner-error"));

    let resp = app.login("curta@serra.com.br").await;
    assert_eq!(resp.url().path(), "/login");
}

#[tokio::test]
async fn test_wrong_password_shows_provider_message() {
    let app = TestApp::spawn().await;
    app.register("ana@serra.com.br").await;

    let resp = app
        .post(
            "/login",
            &[
                ("mode", "login"),
                ("email", "ana@serra.com.br"),
                ("password", "errada123"),
            ],
        )
        .await;
    assert_eq!(resp.url().path(), "/login");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid login credentials"));
}

#[tokio::test]
async fn test_login_then_logout() {
    let app = TestApp::spawn().await;
    app.register_and_login("ana@serra.com.br").await;

    let body = app.page("/admin").await;
    assert!(body.contains("Meus Restaurantes"));
    assert!(body.contains("Nenhum restaurante cadastrado ainda."));
    assert!(body.contains(r#"href="/admin""#));
    assert!(body.contains(r#"action="/logout""#));

    let resp = app.post("/logout", &[]).await;
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains(r#"href="/login""#));

    let resp = app.raw.get(app.url("/admin")).send().await.unwrap();
    assert_eq!(resp.headers()["location"], "/login");
}

#[tokio::test]
async fn test_revoked_token_is_anonymous() {
    let app = TestApp::spawn().await;
    app.register_and_login("ana@serra.com.br").await;

    app.backend.revoke_all_tokens();

    let resp = app.raw.get(app.url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/login");
}

#[tokio::test]
async fn test_unreachable_provider_renders_pending_page() {
    let app = TestApp::spawn().await;
    app.register_and_login("ana@serra.com.br").await;

    app.backend.set_auth_unavailable(true);

    let resp = app.raw.get(app.url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.headers()["retry-after"], "5");
    let body = resp.text().await.unwrap();
    assert!(!body.contains("Meus Restaurantes"));
    assert!(!body.contains(r#"href="/login""#));
    assert!(!body.contains(r#"href="/admin""#));

    // Once the provider answers again the session is still valid
    app.backend.set_auth_unavailable(false);
    let body = app.page("/admin").await;
    assert!(body.contains("Meus Restaurantes"));
}

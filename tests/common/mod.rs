use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use formsink::config::{Config, StoreConfig};
use formsink::forms::collect::ValidationPolicy;
use formsink::store::memory::MemoryStore;

pub const ADMIN_SECRET: &str = "test-admin-secret";

/// A running test server instance backed by the in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Login with the test admin secret, return the access token.
    pub async fn login(&self) -> String {
        let (body, status) = self.try_login(ADMIN_SECRET).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn try_login(&self, secret: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/admin/login"))
            .json(&json!({ "secret": secret }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit a form as JSON, return (body, status).
    pub async fn submit(&self, form: &str, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/v1/f/{form}")))
            .json(data)
            .send()
            .await
            .expect("submit failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data, return (body, status).
    pub async fn submit_form(&self, form: &str, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/v1/f/{form}")))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Spawn a test app on a random port with the default configuration.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|config| config).await
}

/// Spawn a test app, letting the caller adjust the configuration first.
pub async fn spawn_app_with(tweak: impl FnOnce(Config) -> Config) -> TestApp {
    let config = tweak(Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to a random port
        admin_secret: ADMIN_SECRET.to_string(),
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        store: StoreConfig::Memory,
        validation: ValidationPolicy::RequireAll,
        feedback_required: None,
        survey_required: None,
        max_body_size: 65536,
        log_level: "warn".to_string(),
    });

    let store = Arc::new(MemoryStore::new());
    let app = formsink::build_app(store, config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { addr, client }
}

/// A feedback submission with all 11 fields filled.
pub fn full_feedback() -> Value {
    json!({
        "fb-satisfaction": "Good",
        "fb-ease": "Easy",
        "fb-speed": "Fast",
        "fb-design": "Excellent",
        "fb-support": "Fair",
        "fb-value": "Good",
        "fb-recommend": "Definitely",
        "fb-return": "Yes",
        "fb-liked": "the speed",
        "fb-improve": "more themes",
        "fb-comments": "keep it up",
    })
}

/// A survey submission with all 17 active fields (hear != Other).
pub fn full_survey() -> Value {
    json!({
        "survey-age": "25-34",
        "survey-gender": "Female",
        "survey-role": "Employed",
        "survey-hear": "Friend",
        "survey-usage": "Both",
        "survey-frequency": "Daily",
        "survey-device": "Laptop",
        "survey-browser": "Firefox",
        "survey-performance": "Good",
        "survey-reliability": "Excellent",
        "survey-design": "Good",
        "survey-pricing": "Fair",
        "survey-support": "Good",
        "survey-recommend": "Probably",
        "survey-liked": "search",
        "survey-missing": "exports",
        "survey-suggestions": "none",
    })
}

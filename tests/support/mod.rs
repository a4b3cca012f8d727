#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use soko::api::ApiClient;
use soko::auth::{Credentials, MemoryCredentialStore};
use soko::config::SokoConfig;
use wiremock::MockServer;

/// Credential store preloaded with a token pair.
pub fn seeded_store(access: &str, refresh: Option<&str>) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        access,
        refresh.map(str::to_string),
    )))
}

pub fn empty_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new())
}

pub fn config_for(server: &MockServer) -> SokoConfig {
    SokoConfig::new()
        .with_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(5))
}

/// Client pointed at `server`, persisting into `store`.
pub fn client_for(server: &MockServer, store: Arc<MemoryCredentialStore>) -> ApiClient {
    ApiClient::with_store(config_for(server), store).expect("client builds")
}

pub fn user_json(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.co.tz"),
        "firstname": "Test"
    })
}

pub fn product_json(id: i64, name: &str, prices: &[&str]) -> Value {
    let lines: Vec<Value> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| json!({"sku": format!("{name}-{i}"), "current_price": price}))
        .collect();
    json!({"id": id, "name": name, "product_lines": lines})
}

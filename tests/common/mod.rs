#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

use todo_api::auth::{hash_password, MIN_PASSWORD_HASH_COST};
use todo_api::config::AppConfig;
use todo_api::database::UserRepository;
use todo_api::{router, AppState};

pub const PASSWORD: &str = "correct horse";

/// Router served in-process on a free port, backed by a fresh in-memory store.
///
/// Each `#[tokio::test]` owns its runtime, so every test gets its own server.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development()).await
    }

    pub async fn start_with(mut config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;

        let state = AppState::in_memory(config);
        let app = router(state.clone())?;
        let listener = tokio::net::TcpListener::bind(state.config.bind_address()).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a user directly in the store and obtain a token over HTTP.
    pub async fn user_token(&self, username: &str) -> Result<String> {
        self.state
            .store
            .insert_user(username, &hash_password(PASSWORD, MIN_PASSWORD_HASH_COST)?)
            .await?;

        let res = self
            .client
            .post(self.url("/api/token/"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "token request failed: {}", res.status());

        let body: Value = res.json().await?;
        body["access"]
            .as_str()
            .map(str::to_string)
            .context("token response missing access")
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn put(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Create a todo and return the response body.
    pub async fn create_todo(&self, token: &str, title: &str, description: &str) -> Result<Value> {
        let res = self
            .post("/api/todos/", token)
            .json(&json!({ "title": title, "description": description }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        Ok(res.json().await?)
    }
}

pub fn todo_path(id: &Value) -> String {
    format!("/api/todos/{}/", id.as_str().unwrap_or_default())
}

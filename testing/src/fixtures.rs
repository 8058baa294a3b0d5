use config::{ExportConfig, OutputFormat};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/oauth/token";
pub const API_PREFIX: &str = "/api/v2";

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// Mock Genesys Cloud organization backed by a fresh `MockServer`.
pub struct PlatformMock {
    server: MockServer
}

impl PlatformMock {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        tracing::debug!(uri = %server.uri(), "Platform mock started");
        Self { server }
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn api_base_url(&self) -> String {
        format!("{}{}", self.server.uri(), API_PREFIX)
    }

    pub fn auth_url(&self) -> String {
        format!("{}{}", self.server.uri(), TOKEN_PATH)
    }

    /// Path of a listing endpoint as the server sees it.
    pub fn endpoint_path(endpoint: &str) -> String {
        format!("{}/{}", API_PREFIX, endpoint.trim_start_matches('/'))
    }

    /// Configuration pointing at this server, with millisecond backoff so
    /// retry tests stay fast.
    pub fn export_config(&self, output_dir: &Path) -> ExportConfig {
        let mut config = ExportConfig::default();
        config.platform.client_id = "test-client".to_string();
        config.platform.client_secret = "test-secret".to_string();
        config.platform.api_base_url = Some(self.api_base_url());
        config.platform.auth_url = Some(self.auth_url());
        config.platform.timeout_seconds = 5;
        config.api.retry.initial_backoff_ms = 10;
        config.api.retry.max_backoff_ms = 50;
        config.api.retry.rate_limit_default_secs = 0;
        config.output.directory = output_dir.display().to_string();
        config.output.filename = "users".to_string();
        config.output.format = OutputFormat::Csv;
        config
    }

    /// Token endpoint that always issues `access_token`.
    pub async fn mount_token(&self, access_token: &str, expires_in: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
                access_token,
                expires_in
            )))
            .mount(&self.server)
            .await;
    }

    /// Serves `pages` as pages 1..=n with `pageCount` set to n.
    pub async fn mount_pages(&self, endpoint: &str, pages: Vec<Vec<Value>>) {
        let count = pages.len() as u32;
        for (index, entities) in pages.into_iter().enumerate() {
            let number = index as u32 + 1;
            self.mount_page(endpoint, number, page(entities, number, Some(count)))
                .await;
        }
    }

    /// Serves `pages` without `pageCount`, followed by an empty terminal page.
    pub async fn mount_pages_until_empty(&self, endpoint: &str, pages: Vec<Vec<Value>>) {
        let count = pages.len() as u32;
        for (index, entities) in pages.into_iter().enumerate() {
            let number = index as u32 + 1;
            self.mount_page(endpoint, number, page(entities, number, None))
                .await;
        }
        self.mount_page(endpoint, count + 1, page(Vec::new(), count + 1, None))
            .await;
    }

    pub async fn mount_page(&self, endpoint: &str, page_number: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path(Self::endpoint_path(endpoint)))
            .and(query_param("pageNumber", page_number.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mounts a single-page listing for every reference kind.
    pub async fn mount_references(&self, divisions: Vec<Value>, skills: Vec<Value>, queues: Vec<Value>) {
        self.mount_pages("authorization/divisions", vec![divisions])
            .await;
        self.mount_pages("routing/skills", vec![skills]).await;
        self.mount_pages("routing/queues", vec![queues]).await;
    }

    /// Serves `pages` of users and, for every user, a one-page
    /// `users/{id}/queues` listing holding the ids of its `queues` field.
    pub async fn mount_users(&self, pages: Vec<Vec<Value>>) {
        for entities in &pages {
            for user in entities {
                self.mount_user_queues(user).await;
            }
        }
        self.mount_pages("users", pages).await;
    }

    async fn mount_user_queues(&self, user: &Value) {
        let Some(id) = user["id"].as_str() else {
            return;
        };
        let queues: Vec<Value> = user["queues"]
            .as_array()
            .map(|queues| {
                queues
                    .iter()
                    .map(|q| json!({ "id": q["id"], "name": "from membership", "joined": true }))
                    .collect()
            })
            .unwrap_or_default();
        self.mount_pages(&format!("users/{id}/queues"), vec![queues])
            .await;
    }

    /// Answers the first `times` requests for `page_number` of `endpoint`
    /// with `status`. Mount before the success mock so it takes priority.
    pub async fn mount_failures(
        &self,
        endpoint: &str,
        page_number: u32,
        status: u16,
        retry_after: Option<&str>,
        times: u64
    ) {
        let mut response = ResponseTemplate::new(status).set_body_json(json!({
            "message": format!("mock status {}", status),
            "status": status
        }));
        if let Some(value) = retry_after {
            response = response.insert_header("Retry-After", value);
        }
        Mock::given(method("GET"))
            .and(path(Self::endpoint_path(endpoint)))
            .and(query_param("pageNumber", page_number.to_string()))
            .respond_with(response)
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Number of requests the server received for `endpoint`.
    pub async fn request_count(&self, endpoint: &str) -> usize {
        let wanted = Self::endpoint_path(endpoint);
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == wanted)
            .count()
    }
}

pub fn token_body(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in
    })
}

pub fn page(entities: Vec<Value>, page_number: u32, page_count: Option<u32>) -> Value {
    let mut body = json!({
        "entities": entities,
        "pageSize": 100,
        "pageNumber": page_number
    });
    if let Some(count) = page_count {
        body["pageCount"] = json!(count);
    }
    body
}

pub fn reference(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "selfUri": format!("/api/v2/x/{}", id) })
}

pub fn user(
    id: &str,
    name: &str,
    email: &str,
    division: Option<&str>,
    skills: &[&str],
    queues: &[&str]
) -> Value {
    let mut body = json!({
        "id": id,
        "name": name,
        "email": email,
        "state": "active",
        "skills": skills.iter().map(|s| json!({ "id": s, "proficiency": 1.0 })).collect::<Vec<_>>(),
        "queues": queues.iter().map(|q| json!({ "id": q })).collect::<Vec<_>>()
    });
    if let Some(division) = division {
        body["division"] = json!({ "id": division, "name": "from user payload" });
    }
    body
}

//! Remote API transport.
//!
//! `RemoteApi` executes the requests `simpledo_core::ApiClient` builds, using
//! one shared reqwest client with a bounded timeout. All outcome policy
//! (401 as "no data", error text as message) stays in the core parser.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use simpledo_core::{
    ApiClient, ApiError, AuthResponse, CreateTodo, HttpMethod, HttpRequest, HttpResponse,
    LoginRequest, RegisterRequest, RequestConfig, Todo, TodoEnvelope, TodoListEnvelope,
    TodoStatus, UpdateTodo, User, UserEnvelope,
};
use url::Url;

#[derive(Debug, Clone)]
pub struct RemoteApi {
    client: ApiClient,
    http: reqwest::Client,
}

impl RemoteApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client: ApiClient::new(base_url),
            http,
        })
    }

    /// Issue one request and normalize the outcome. `Ok(None)` means the
    /// remote API answered 401.
    pub async fn request(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> Result<Option<Value>, ApiError> {
        let request = self.client.build_request(endpoint, &config)?;
        let response = self.execute(request).await?;
        self.client.parse_response(response)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> Result<Option<T>, ApiError> {
        let request = self.client.build_request(endpoint, &config)?;
        let response = self.execute(request).await?;
        self.client.parse_json(response)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        tracing::debug!(method = %request.method, url = %request.url, "remote api call");

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        tracing::debug!(status, url = %request.url, "remote api response");
        Ok(HttpResponse { status, body })
    }

    pub async fn login(&self, input: &LoginRequest) -> Result<Option<AuthResponse>, ApiError> {
        self.request_json("/auth/login", RequestConfig::new().with_json(input)?)
            .await
    }

    pub async fn register(
        &self,
        input: &RegisterRequest,
    ) -> Result<Option<AuthResponse>, ApiError> {
        self.request_json("/auth/register", RequestConfig::new().with_json(input)?)
            .await
    }

    /// Resolve a token into its user; `Ok(None)` when the token is rejected.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>, ApiError> {
        let envelope: Option<UserEnvelope> = self
            .request_json("/users/me", RequestConfig::new().with_token(token))
            .await?;
        Ok(envelope.map(|e| e.user))
    }

    pub async fn list_todos(
        &self,
        token: &str,
        status: Option<TodoStatus>,
    ) -> Result<Option<Vec<Todo>>, ApiError> {
        let endpoint = match status {
            Some(status) => format!("/todos?status={}", status.as_str().to_ascii_lowercase()),
            None => "/todos".to_string(),
        };
        let envelope: Option<TodoListEnvelope> = self
            .request_json(&endpoint, RequestConfig::new().with_token(token))
            .await?;
        Ok(envelope.map(|e| e.todos))
    }

    pub async fn get_todo(&self, token: &str, id: &str) -> Result<Option<Todo>, ApiError> {
        let envelope: Option<TodoEnvelope> = self
            .request_json(&todo_endpoint(id)?, RequestConfig::new().with_token(token))
            .await?;
        Ok(envelope.map(|e| e.todo))
    }

    pub async fn create_todo(
        &self,
        token: &str,
        input: &CreateTodo,
    ) -> Result<Option<Todo>, ApiError> {
        let config = RequestConfig::new().with_token(token).with_json(input)?;
        let envelope: Option<TodoEnvelope> = self.request_json("/todos", config).await?;
        Ok(envelope.map(|e| e.todo))
    }

    pub async fn update_todo(
        &self,
        token: &str,
        id: &str,
        input: &UpdateTodo,
    ) -> Result<Option<Todo>, ApiError> {
        let config = RequestConfig::new()
            .with_token(token)
            .with_method(HttpMethod::Patch)
            .with_json(input)?;
        let envelope: Option<TodoEnvelope> = self.request_json(&todo_endpoint(id)?, config).await?;
        Ok(envelope.map(|e| e.todo))
    }

    /// Delete a todo. `Ok(false)` when the token was rejected.
    pub async fn delete_todo(&self, token: &str, id: &str) -> Result<bool, ApiError> {
        let config = RequestConfig::new()
            .with_token(token)
            .with_method(HttpMethod::Delete);
        Ok(self.request(&todo_endpoint(id)?, config).await?.is_some())
    }
}

/// `/todos/{id}` with `id` percent-encoded as a single path segment.
///
/// Dot segments would resolve to another endpoint, so they are treated as a
/// missing todo.
fn todo_endpoint(id: &str) -> Result<String, ApiError> {
    if matches!(id, "" | "." | "..") {
        return Err(ApiError::Status {
            status: 404,
            message: "Todo not found".to_string(),
        });
    }
    let mut url = Url::parse("http://localhost/todos")
        .map_err(|err| ApiError::Transport(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Transport("todo path cannot have segments".to_string()))?
        .push(id);
    Ok(url.path().to_string())
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport(format!("request timed out: {err}"))
    } else {
        ApiError::Transport(err.to_string())
    }
}

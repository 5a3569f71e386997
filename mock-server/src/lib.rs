//! In-memory stand-in for the remote SimpleDo REST API.
//!
//! Implements `/auth/login`, `/auth/register`, `/users/me` and `/todos*`
//! with bearer-token auth. Error bodies are plain text, which is what the
//! web client surfaces to users. State lives only as long as the process.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Completed,
    Incompleted,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub status: Status,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub fullname: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Register {
    pub fullname: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    pub body: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<Status>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

struct Account {
    user: User,
    password: String,
}

struct OwnedTodo {
    owner: String,
    todo: Todo,
}

/// Accounts, issued tokens and todos. Todos keep insertion order.
#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    todos: Vec<OwnedTodo>,
}

impl Store {
    /// Create an account and return it with a fresh token.
    pub fn register(
        &mut self,
        fullname: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), String> {
        if self.accounts.values().any(|a| a.user.email == email) {
            return Err("Email already registered".to_string());
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            fullname: fullname.to_string(),
        };
        self.accounts.insert(
            user.id.clone(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        let token = self.issue_token(&user.id);
        Ok((user, token))
    }

    pub fn issue_token(&mut self, user_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    pub fn revoke_token(&mut self, token: &str) {
        self.tokens.remove(token);
    }

    fn user_for_token(&self, token: &str) -> Option<&User> {
        let user_id = self.tokens.get(token)?;
        self.accounts.get(user_id).map(|a| &a.user)
    }

    fn todos_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Todo> + 'a {
        self.todos
            .iter()
            .filter(move |t| t.owner == owner)
            .map(|t| &t.todo)
    }

    fn todo_mut(&mut self, owner: &str, id: &str) -> Option<&mut Todo> {
        self.todos
            .iter_mut()
            .find(|t| t.owner == owner && t.todo.id == id)
            .map(|t| &mut t.todo)
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    app_with_store(Db::default())
}

/// Router over an existing store, so tests can seed accounts and tokens.
pub fn app_with_store(db: Db) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/users/me", get(me))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

fn todo_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Todo not found".to_string())
}

/// Resolve the caller's user id from the bearer token.
fn caller(store: &Store, headers: &HeaderMap) -> ApiResult<String> {
    bearer(headers)
        .and_then(|token| store.user_for_token(token))
        .map(|user| user.id.clone())
        .ok_or_else(unauthorized)
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let user = store
        .accounts
        .values()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .map(|a| a.user.clone())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ))?;
    let token = store.issue_token(&user.id);
    tracing::debug!(user_id = %user.id, "login");
    Ok(Json(json!({ "user": user, "token": token })))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Register>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if input.fullname.trim().is_empty() || input.email.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Full name and email are required".to_string(),
        ));
    }
    if input.password1.is_empty() || input.password1 != input.password2 {
        return Err((StatusCode::BAD_REQUEST, "Passwords don't match".to_string()));
    }
    let (user, token) = db
        .write()
        .await
        .register(&input.fullname, &input.email, &input.password1)
        .map_err(|msg| (StatusCode::CONFLICT, msg))?;
    tracing::debug!(user_id = %user.id, "registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    ))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let user_id = caller(&store, &headers)?;
    let user = store.accounts.get(&user_id).ok_or_else(unauthorized)?;
    let todos: Vec<&Todo> = store.todos_of(&user_id).collect();
    Ok(Json(json!({
        "user": {
            "id": user.user.id,
            "email": user.user.email,
            "fullname": user.user.fullname,
            "todos": todos,
        }
    })))
}

async fn list_todos(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let filter = match query.status.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => None,
        Some("completed") => Some(Status::Completed),
        Some("incompleted") => Some(Status::Incompleted),
        Some(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Invalid status filter".to_string(),
            ))
        }
    };
    let store = db.read().await;
    let user_id = caller(&store, &headers)?;
    let todos: Vec<&Todo> = store
        .todos_of(&user_id)
        .filter(|t| filter.map_or(true, |s| t.status == s))
        .collect();
    Ok(Json(json!({ "todos": todos })))
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTodo>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let owner = caller(&store, &headers)?;
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    let todo = Todo {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        body: input.body,
        status: Status::Incompleted,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    store.todos.push(OwnedTodo {
        owner,
        todo: todo.clone(),
    });
    Ok((StatusCode::CREATED, Json(json!({ "todo": todo }))))
}

async fn get_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let owner = caller(&store, &headers)?;
    let todo = store
        .todos_of(&owner)
        .find(|t| t.id == id)
        .ok_or_else(todo_not_found)?;
    Ok(Json(json!({ "todo": todo })))
}

async fn update_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateTodo>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let owner = caller(&store, &headers)?;
    let todo = store.todo_mut(&owner, &id).ok_or_else(todo_not_found)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(body) = input.body {
        todo.body = Some(body);
    }
    if let Some(status) = input.status {
        todo.status = status;
    }
    Ok(Json(json!({ "todo": todo })))
}

async fn delete_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let owner = caller(&store, &headers)?;
    let index = store
        .todos
        .iter()
        .position(|t| t.owner == owner && t.todo.id == id)
        .ok_or_else(todo_not_found)?;
    let removed = store.todos.remove(index);
    Ok(Json(json!({ "todo": removed.todo })))
}

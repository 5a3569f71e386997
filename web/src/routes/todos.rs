use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use simpledo_core::{
    safe_redirect, ApiError, CreateTodo, Todo, TodoStatus, User, DEFAULT_REDIRECT,
};

use super::page;
use crate::{
    error::PageError,
    forms::{FieldErrors, FormMethod, NewTodoForm, TodoForm},
    session::{self, CurrentUser, UserToken},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct FilterLink {
    label: &'static str,
    href: &'static str,
    active: bool,
}

fn filter_links(active: Option<TodoStatus>) -> [FilterLink; 3] {
    [
        FilterLink {
            label: "All",
            href: "/todos",
            active: active.is_none(),
        },
        FilterLink {
            label: "Completed",
            href: "/todos?q=completed",
            active: active == Some(TodoStatus::Completed),
        },
        FilterLink {
            label: "Incompleted",
            href: "/todos?q=incompleted",
            active: active == Some(TodoStatus::Incompleted),
        },
    ]
}

/// Map an API error on a single todo: 404 becomes the not-found page.
fn todo_error(err: ApiError) -> PageError {
    if err.is_not_found() {
        PageError::NotFound
    } else {
        PageError::Remote(err)
    }
}

async fn load_todos(
    state: &AppState,
    token: &str,
    filter: Option<TodoStatus>,
) -> Result<Vec<Todo>, PageError> {
    match state.api.list_todos(token, filter).await? {
        Some(todos) => Ok(todos),
        None => Err(session::rejected_call(&state.api, token, state.secure_cookies()).await),
    }
}

fn render_list(
    status: StatusCode,
    user: &User,
    todos: &[Todo],
    filter: Option<TodoStatus>,
    errors: &FieldErrors,
) -> Result<Response, PageError> {
    page(
        status,
        "todos.html",
        context! {
            user,
            initials => user.initials(),
            todos,
            filters => filter_links(filter),
            errors,
        },
    )
}

/// `GET /todos?q=completed|incompleted`
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, PageError> {
    let filter = query.q.as_deref().and_then(TodoStatus::parse);
    let todos = load_todos(&state, &current.token, filter).await?;
    render_list(StatusCode::OK, &current.user, &todos, filter, &FieldErrors::new())
}

/// `POST /todos/new`
pub async fn create(
    State(state): State<AppState>,
    UserToken(token): UserToken,
    Form(form): Form<NewTodoForm>,
) -> Result<Response, PageError> {
    let title = form.title.trim();
    if title.is_empty() {
        let user = session::user_for_token(&state.api, &token, state.secure_cookies()).await?;
        let todos = load_todos(&state, &token, None).await?;
        let errors = FieldErrors::single("title", "Title is required");
        return render_list(StatusCode::BAD_REQUEST, &user, &todos, None, &errors);
    }

    let input = CreateTodo {
        title: title.to_string(),
        body: Some(form.body.trim())
            .filter(|body| !body.is_empty())
            .map(str::to_string),
    };
    match state.api.create_todo(&token, &input).await? {
        Some(todo) => {
            tracing::debug!(todo_id = %todo.id, "todo created");
            Ok(Redirect::to("/todos").into_response())
        }
        None => Err(session::rejected_call(&state.api, &token, state.secure_cookies()).await),
    }
}

/// `GET /todos/{id}`
pub async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let Some(todo) = state
        .api
        .get_todo(&current.token, &id)
        .await
        .map_err(todo_error)?
    else {
        return Err(session::rejected_call(&state.api, &current.token, state.secure_cookies()).await);
    };
    let completed = todo.is_completed();
    let next_status = todo.status.toggled().as_str();
    page(
        StatusCode::OK,
        "todo.html",
        context! {
            user => &current.user,
            initials => current.user.initials(),
            todo,
            completed,
            next_status,
        },
    )
}

/// `POST /todos/{id}`: HTML forms cannot send PATCH or DELETE, so `_method`
/// picks the operation (PATCH when absent).
pub async fn submit(
    state: State<AppState>,
    token: UserToken,
    id: Path<String>,
    Form(form): Form<TodoForm>,
) -> Result<Response, PageError> {
    match form.method() {
        Some(FormMethod::Patch) => update(state, token, id, Form(form)).await,
        Some(FormMethod::Delete) => delete(state, token, id).await,
        None => Ok((StatusCode::METHOD_NOT_ALLOWED, "Unsupported _method").into_response()),
    }
}

/// `PATCH /todos/{id}`
pub async fn update(
    State(state): State<AppState>,
    UserToken(token): UserToken,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> Result<Response, PageError> {
    let input = form.update();
    let updated = state
        .api
        .update_todo(&token, &id, &input)
        .await
        .map_err(todo_error)?;
    if updated.is_none() {
        return Err(session::rejected_call(&state.api, &token, state.secure_cookies()).await);
    }
    let target = safe_redirect(form.redirect_to.as_deref(), DEFAULT_REDIRECT);
    Ok(Redirect::to(target).into_response())
}

/// `DELETE /todos/{id}`
pub async fn delete(
    State(state): State<AppState>,
    UserToken(token): UserToken,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let deleted = state
        .api
        .delete_todo(&token, &id)
        .await
        .map_err(todo_error)?;
    if !deleted {
        return Err(session::rejected_call(&state.api, &token, state.secure_cookies()).await);
    }
    tracing::debug!(todo_id = %id, "todo deleted");
    Ok(Redirect::to("/todos").into_response())
}

mod common;

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get as get_route, patch, post},
    Json, Router,
};
use common::*;
use serde_json::{json, Value};
use simpledo_web::{session::SessionData, AppState, Config};
use tower::ServiceExt;

const JOIN: &str = "fullname=Ada+Lovelace&email=ada%40example.com&password1=Abcdef1%21&password2=Abcdef1%21";

/// Sign up through the web app against `api` and return the session cookie.
async fn join(api: &str) -> String {
    let response = web_app(api)
        .oneshot(form("POST", "/join", None, JOIN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/todos");
    request_cookie(&response)
}

/// The id of the first todo linked from a rendered list.
fn first_todo_id(html: &str) -> String {
    let start = html.find(r#"href="/todos/"#).expect("todo link") + r#"href="/todos/"#.len();
    let end = start + html[start..].find('"').unwrap();
    html[start..end].to_string()
}

// --- guards ---

#[tokio::test]
async fn no_session_redirects_to_login_without_calling_api() {
    let app = web_app(&closed_port());

    let response = app.clone().oneshot(get("/todos", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirectTo=%2Ftodos");

    let response = app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(location(&response), "/login?redirectTo=%2F");
}

#[tokio::test]
async fn unreadable_cookie_counts_as_no_session() {
    let response = web_app(&closed_port())
        .oneshot(get("/todos/abc", Some("__session=garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirectTo=%2Ftodos%2Fabc");
}

#[tokio::test]
async fn index_with_token_goes_to_todos() {
    let response = web_app(&closed_port())
        .oneshot(get("/", Some(&cookie_for("u1", "tok"))))
        .await
        .unwrap();
    assert_eq!(location(&response), "/todos");
}

#[tokio::test]
async fn rejected_token_clears_session_and_goes_home() {
    let api = mock_api().await;
    let response = web_app(&api)
        .oneshot(get("/todos", Some(&cookie_for("u1", "revoked"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cleared = session_set_cookie(&response).expect("clearing cookie");
    assert!(cleared.starts_with("__session=;"), "{cleared}");
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn revoked_token_ends_a_real_session() {
    let db = mock_server::Db::default();
    let api = spawn(mock_server::app_with_store(db.clone())).await;
    let response = web_app(&api)
        .oneshot(form("POST", "/join", None, JOIN))
        .await
        .unwrap();
    let session = decrypt_session(&response).unwrap();
    let cookie = request_cookie(&response);

    let response = web_app(&api).oneshot(get("/todos", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    db.write().await.revoke_token(&session.user_jwt);

    let response = web_app(&api).oneshot(get("/todos", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), "/");
    assert!(session_set_cookie(&response).unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn remote_failure_renders_error_page() {
    let api = spawn(Router::new().route(
        "/users/me",
        get_route(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database down") }),
    ))
    .await;

    let response = web_app(&api)
        .oneshot(get("/todos", Some(&cookie_for("u1", "tok"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // a remote failure never ends the session
    assert!(session_set_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Ups! Something happened. Please try again."));
}

/// `/users/me` answers with `users_me`; every todo update answers 401.
async fn api_rejecting_todo_updates(users_me: StatusCode) -> String {
    let me = move || async move {
        if users_me.is_success() {
            Json(json!({ "user": { "id": "u1", "email": "a@b.co", "fullname": "Ada" } }))
                .into_response()
        } else {
            users_me.into_response()
        }
    };
    spawn(
        Router::new()
            .route("/users/me", get_route(me))
            .route("/todos/{id}", patch(|| async { StatusCode::UNAUTHORIZED })),
    )
    .await
}

#[tokio::test]
async fn todo_401_with_valid_user_keeps_session() {
    let api = api_rejecting_todo_updates(StatusCode::OK).await;
    let response = web_app(&api)
        .oneshot(form(
            "POST",
            "/todos/t1",
            Some(&cookie_for("u1", "tok")),
            "_method=patch&status=COMPLETED",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_set_cookie(&response).is_none());
}

#[tokio::test]
async fn todo_401_ends_session_once_users_me_rejects_too() {
    let api = api_rejecting_todo_updates(StatusCode::UNAUTHORIZED).await;
    let response = web_app(&api)
        .oneshot(form(
            "POST",
            "/todos/t1",
            Some(&cookie_for("u1", "tok")),
            "_method=patch&status=COMPLETED",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(session_set_cookie(&response).unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn dot_segment_todo_id_is_not_found() {
    let api = api_rejecting_todo_updates(StatusCode::OK).await;
    let cookie = cookie_for("u1", "tok");
    for uri in ["/todos/%2E", "/todos/%2E%2E"] {
        let response = web_app(&api).oneshot(get(uri, Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn slow_api_times_out_into_error_page() {
    let api = spawn(Router::new().route(
        "/users/me",
        get_route(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK
        }),
    ))
    .await;
    let config = Config {
        api_timeout: Duration::from_millis(200),
        ..config(&api)
    };
    let app = simpledo_web::app(AppState::new(config).unwrap());

    let response = app
        .oneshot(get("/todos", Some(&cookie_for("u1", "tok"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_set_cookie(&response).is_none());
}

#[tokio::test]
async fn healthz_is_ok() {
    let response = web_app(&closed_port()).oneshot(get("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

// --- login / join / logout ---

#[tokio::test]
async fn login_creates_session_from_api_response() {
    let api = spawn(Router::new().route(
        "/auth/login",
        post(|Json(body): Json<Value>| async move {
            if body["email"] == "ada@example.com" && body["password"] == "secret" {
                Json(json!({"user": {"id": "u1"}, "token": "tok"})).into_response()
            } else {
                StatusCode::BAD_REQUEST.into_response()
            }
        }),
    ))
    .await;

    let response = web_app(&api)
        .oneshot(form(
            "POST",
            "/login",
            None,
            "email=ada%40example.com&password=secret&redirectTo=%2Ftodos",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/todos");
    assert_eq!(
        decrypt_session(&response),
        Some(SessionData {
            user_id: "u1".to_string(),
            user_jwt: "tok".to_string(),
        })
    );
    let raw = session_set_cookie(&response).unwrap();
    assert!(raw.contains("HttpOnly"));
    assert!(!raw.contains("Max-Age"), "session cookie without remember");
}

#[tokio::test]
async fn login_with_remember_and_unsafe_redirect() {
    let api = spawn(Router::new().route(
        "/auth/login",
        post(|| async { Json(json!({"user": {"id": "u1"}, "token": "tok"})) }),
    ))
    .await;

    let response = web_app(&api)
        .oneshot(form(
            "POST",
            "/login",
            None,
            "email=ada%40example.com&password=x&remember=on&redirectTo=https%3A%2F%2Fevil.com",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/todos");
    assert!(session_set_cookie(&response).unwrap().contains("Max-Age=604800"));
}

#[tokio::test]
async fn invalid_forms_are_rejected_before_any_remote_call() {
    let app = web_app(&closed_port());

    let response = app
        .clone()
        .oneshot(form("POST", "/login", None, "email=nope&password=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Email is invalid"));

    let response = app
        .clone()
        .oneshot(form("POST", "/login", None, "email=ada%40example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Password is required"));

    let response = app
        .clone()
        .oneshot(form(
            "POST",
            "/join",
            None,
            "fullname=Ada&email=ada%40example.com&password1=abcdef1%21&password2=abcdef1%21",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response)
        .await
        .contains("Password should contain at least 1 uppercase letter"));

    let response = app
        .oneshot(form("POST", "/join", None, "email=ada%40example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Full Name is required"));
}

#[tokio::test]
async fn login_transport_failure_shows_banner() {
    let response = web_app(&closed_port())
        .oneshot(form("POST", "/login", None, "email=ada%40example.com&password=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Ups! Something happened. Please try again."));
    // the email survives the round trip, the password does not
    assert!(html.contains(r#"value="ada@example.com""#));
}

#[tokio::test]
async fn join_then_login_against_mock_api() {
    let api = mock_api().await;
    let app = web_app(&api);
    join(&api).await;

    let response = app
        .clone()
        .oneshot(form("POST", "/join", None, JOIN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("Email already registered"));

    let response = app
        .clone()
        .oneshot(form("POST", "/login", None, "email=ada%40example.com&password=wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Invalid email or password"));

    let response = app
        .oneshot(form("POST", "/login", None, "email=ada%40example.com&password=Abcdef1%21"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let session = decrypt_session(&response).unwrap();
    assert!(!session.user_id.is_empty());
    assert!(!session.user_jwt.is_empty());
}

#[tokio::test]
async fn login_page_redirects_when_signed_in() {
    let app = web_app(&closed_port());

    let response = app
        .clone()
        .oneshot(get("/login", Some(&cookie_for("u1", "tok"))))
        .await
        .unwrap();
    assert_eq!(location(&response), "/todos");

    let response = app
        .clone()
        .oneshot(get("/login?redirectTo=%2Ftodos%2F42", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="redirectTo" value="&#x2f;todos&#x2f;42""#));

    let response = app.oneshot(get("/join", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"name="password2""#));
}

#[tokio::test]
async fn logout_clears_cookie() {
    let response = web_app(&closed_port())
        .oneshot(form("POST", "/logout", Some(&cookie_for("u1", "tok")), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(session_set_cookie(&response).unwrap().contains("Max-Age=0"));
}

// --- todos ---

#[tokio::test]
async fn todo_pages_end_to_end() {
    let api = mock_api().await;
    let app = web_app(&api);
    let cookie = join(&api).await;
    let cookie = Some(cookie.as_str());

    // empty list with the header
    let response = app.clone().oneshot(get("/todos", cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Ada Lovelace"));
    assert!(html.contains(">AL<"));
    assert!(html.contains("Nothing to do."));

    // blank title is a field error
    let response = app
        .clone()
        .oneshot(form("POST", "/todos/new", cookie, "title=+++"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Title is required"));

    // create
    let response = app
        .clone()
        .oneshot(form("POST", "/todos/new", cookie, "title=Walk+the+dog"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/todos");

    let response = app.clone().oneshot(get("/todos", cookie)).await.unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Walk the dog"));
    let id = first_todo_id(&html);

    // toggle through the form fallback
    let response = app
        .clone()
        .oneshot(form(
            "POST",
            &format!("/todos/{id}"),
            cookie,
            "_method=patch&status=COMPLETED",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/todos");

    let response = app
        .clone()
        .oneshot(get("/todos?q=completed", cookie))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Walk the dog"));
    let response = app
        .clone()
        .oneshot(get("/todos?q=incompleted", cookie))
        .await
        .unwrap();
    assert!(!body_text(response).await.contains("Walk the dog"));

    // rename with PATCH, back to the detail page
    let redirect = format!("%2Ftodos%2F{id}");
    let response = app
        .clone()
        .oneshot(form(
            "PATCH",
            &format!("/todos/{id}"),
            cookie,
            &format!("title=Walk+the+cat&redirectTo={redirect}"),
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/todos/{id}"));

    let response = app
        .clone()
        .oneshot(get(&format!("/todos/{id}"), cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Walk the cat"));
    assert!(html.contains("Mark incomplete"));

    // delete, then the detail page is gone
    let response = app
        .clone()
        .oneshot(delete(&format!("/todos/{id}"), cookie))
        .await
        .unwrap();
    assert_eq!(location(&response), "/todos");

    let response = app
        .clone()
        .oneshot(get(&format!("/todos/{id}"), cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Todo not found"));

    let response = app
        .oneshot(form("POST", &format!("/todos/{id}"), cookie, "_method=delete"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_form_method_is_refused() {
    let response = web_app(&closed_port())
        .oneshot(form("POST", "/todos/1", Some(&cookie_for("u1", "tok")), "_method=put"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

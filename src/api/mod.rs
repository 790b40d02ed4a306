// REST API endpoints for the auth service

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::auth::{
    AuthError, AuthService, CookieDirective, LoginRequest, RegisterRequest,
    session_token_from_headers,
};

pub type AppState = Arc<AuthService>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/protected", get(protected))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
        .with_state(state)
}

/// Browsers only send the session cookie cross-origin when the response
/// names the exact origin and allows credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        } else {
            debug!(error = %self, "Request rejected");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

fn with_cookie(status: StatusCode, cookie: &CookieDirective, body: Value) -> Response {
    (
        status,
        [(header::SET_COOKIE, cookie.to_header_value())],
        Json(body),
    )
        .into_response()
}

fn decode_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            debug!(%rejection, "Unreadable request body");
            AuthError::validation("invalid request body")
        })
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Cookie session authentication API",
        "endpoints": {
            "register": "POST /api/auth/register",
            "login": "POST /api/auth/login (sets cookie)",
            "logout": "POST /api/auth/logout (clears cookie)",
            "profile": "GET /api/auth/me (reads cookie)",
            "protected": "GET /api/protected (reads cookie)",
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn register(
    State(auth): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let outcome = auth.register(decode_body(payload)?).await?;

    Ok(with_cookie(
        StatusCode::CREATED,
        &outcome.cookie,
        json!({
            "message": "User registered successfully",
            "user": outcome.user,
        }),
    ))
}

async fn login(
    State(auth): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let outcome = auth.login(decode_body(payload)?).await?;

    Ok(with_cookie(
        StatusCode::OK,
        &outcome.cookie,
        json!({
            "message": "Login successful",
            "user": outcome.user,
        }),
    ))
}

async fn logout(State(auth): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token_from_headers(&headers);
    let cookie = auth.logout(token.as_deref()).await;

    with_cookie(
        StatusCode::OK,
        &cookie,
        json!({ "message": "Logged out successfully" }),
    )
}

async fn me(State(auth): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, AuthError> {
    let token = session_token_from_headers(&headers);
    let identity = auth.identify(token.as_deref()).await?;

    Ok(Json(json!({ "user": identity.user })))
}

/// Example gated route: answers from the token's claims alone.
async fn protected(
    State(auth): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthError> {
    let token = session_token_from_headers(&headers);
    let claims = auth.authenticate(token.as_deref()).await?;

    Ok(Json(json!({
        "message": "Access granted to protected content",
        "user": claims,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryUserStore;
    use crate::config::{AuthSettings, Environment};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-jwt-key-min-32-chars!!";

    fn app_with(settings: AuthSettings) -> Router {
        let auth = AuthService::new(Arc::new(MemoryUserStore::new()), &settings).unwrap();
        create_router(Arc::new(auth))
    }

    fn app() -> Router {
        app_with(AuthSettings::new(SECRET))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// `token=...` pair from the response's Set-Cookie header.
    fn session_cookie(response: &Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn register_ann(app: &Router) -> (String, Value) {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "email": "a@b.com", "password": "secret1", "name": "Ann" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = session_cookie(&response);
        (cookie, body_json(response).await)
    }

    #[tokio::test]
    async fn test_register_login_me_scenario() {
        let app = app();

        let (_, body) = register_ann(&app).await;
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["name"], "Ann");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
        let user_id = body["user"]["id"].clone();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "a@b.com", "password": "secret1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=86400"));
        assert!(!set_cookie.contains("Secure"));
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "a@b.com", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let response = app
            .clone()
            .oneshot(get_with_cookie("/api/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["id"], user_id);
    }

    #[tokio::test]
    async fn test_register_errors_are_400() {
        let app = app();
        register_ann(&app).await;

        let duplicate = app
            .clone()
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "email": "a@b.com", "password": "another1", "name": "Ann" }),
            ))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(duplicate).await["error"], "email already registered");

        let missing = app
            .clone()
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "email": "c@d.com", "password": "secret1" }),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(missing).await["error"], "missing field");

        let malformed = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_non_enumeration() {
        let app = app();
        register_ann(&app).await;

        let wrong_password = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "a@b.com", "password": "nope-nope" }),
            ))
            .await
            .unwrap();
        let unknown_email = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "ghost@b.com", "password": "nope-nope" }),
            ))
            .await
            .unwrap();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong_password).await, body_json(unknown_email).await);
    }

    #[tokio::test]
    async fn test_login_missing_fields_is_400() {
        let response = app()
            .oneshot(post_json("/api/auth/login", json!({ "email": "a@b.com" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let app = app();

        let missing = app
            .clone()
            .oneshot(get_with_cookie("/api/auth/me", None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(missing).await["error"], "missing session");

        let invalid = app
            .clone()
            .oneshot(get_with_cookie("/api/auth/me", Some("token=forged.token.value")))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(invalid).await["error"],
            "invalid or expired session"
        );
    }

    #[tokio::test]
    async fn test_me_for_vanished_user_is_404() {
        let (cookie, _) = register_ann(&app()).await;

        // Same secret, fresh store.
        let response = app()
            .oneshot(get_with_cookie("/api/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = app();
        let (cookie, _) = register_ann(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("token=;"));
        assert!(set_cookie.contains("Max-Age=0"));

        // Stateless sessions: the old token still works until it expires.
        let response = app
            .clone()
            .oneshot(get_with_cookie("/api/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_without_cookie_succeeds() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_revoking_logout_rejects_old_cookie() {
        let app = app_with(AuthSettings::new(SECRET).with_revoke_on_logout(true));
        let (cookie, _) = register_ann(&app).await;

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(get_with_cookie("/api/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route() {
        let app = app();
        let (cookie, body) = register_ann(&app).await;

        let denied = app
            .clone()
            .oneshot(get_with_cookie("/api/protected", None))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(get_with_cookie("/api/protected", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["user"]["userId"], body["user"]["id"]);
        assert_eq!(payload["user"]["email"], "a@b.com");
        assert!(payload["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_production_cookie_is_secure() {
        let app = app_with(AuthSettings::new(SECRET).with_environment(Environment::Production));
        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "email": "a@b.com", "password": "secret1", "name": "Ann" }),
            ))
            .await
            .unwrap();
        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(set_cookie.to_str().unwrap().contains("; Secure"));
    }

    #[tokio::test]
    async fn test_cors_allows_credentials_for_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let response = app()
            .oneshot(get_with_cookie("/", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["endpoints"]["login"].is_string());
    }
}

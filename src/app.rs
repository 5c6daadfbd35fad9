use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{appointments, auth, clients};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(clients::router())
                .merge(appointments::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, value)
    }

    async fn sign_up(app: &Router, name: &str, email: &str) -> String {
        let (status, _) = send(
            app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn haircut() -> Value {
        json!({
            "clientName": "Joana",
            "clientEmail": "joana@example.com",
            "serviceDescription": "Haircut",
            "startTime": "2030-05-10T14:00:00Z",
            "endTime": "2030-05-10T15:00:00Z",
            "price": 50.0,
            "status": "COMPLETED"
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let app = build_app(AppState::fake());
        let token = sign_up(&app, "Maria Silva", "Maria@Example.com").await;

        let (status, me) = send(&app, Method::GET, "/api/v1/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "maria@example.com");
        assert!(me.get("passwordHash").is_none() && me.get("password_hash").is_none());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "Maria Again", "email": "maria@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "maria@example.com", "password": "wrong-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = build_app(AppState::fake());
        for uri in ["/api/v1/appointments", "/api/v1/clients", "/api/v1/users/me"] {
            let (status, body) = send(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert!(body["error"].is_string());
        }
        let (status, _) =
            send(&app, Method::GET, "/api/v1/appointments", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn appointment_lifecycle_over_http() {
        let app = build_app(AppState::fake());
        let token = sign_up(&app, "Maria Silva", "maria@example.com").await;

        let (status, created) =
            send(&app, Method::POST, "/api/v1/appointments", Some(&token), Some(haircut())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "PENDING");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, list) =
            send(&app, Method::GET, "/api/v1/appointments", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/appointments/{id}"),
            Some(&token),
            Some(json!({ "notes": "bring photos" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["notes"], "bring photos");
        assert_eq!(updated["serviceDescription"], "Haircut");

        let cancel = format!("/api/v1/appointments/{id}/cancel");
        let (status, cancelled) = send(&app, Method::PATCH, &cancel, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "CANCELLED");

        let (status, body) = send(&app, Method::PATCH, &cancel, Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn invalid_appointment_is_rejected() {
        let app = build_app(AppState::fake());
        let token = sign_up(&app, "Maria Silva", "maria@example.com").await;

        let mut body = haircut();
        body["endTime"] = json!("2030-05-10T13:00:00Z");
        let (status, _) =
            send(&app, Method::POST, "/api/v1/appointments", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn foreign_records_look_missing() {
        let app = build_app(AppState::fake());
        let owner = sign_up(&app, "Maria Silva", "maria@example.com").await;
        let intruder = sign_up(&app, "Pedro Souza", "pedro@example.com").await;

        let (_, appt) =
            send(&app, Method::POST, "/api/v1/appointments", Some(&owner), Some(haircut())).await;
        let appt_uri = format!("/api/v1/appointments/{}", appt["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::GET, &appt_uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, client) = send(
            &app,
            Method::POST,
            "/api/v1/clients",
            Some(&owner),
            Some(json!({ "name": "Joana", "email": "joana@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let client_uri = format!("/api/v1/clients/{}", client["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::DELETE, &client_uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &client_uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &client_uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

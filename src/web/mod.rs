pub mod handlers;
pub mod views;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::RosterClient;
use crate::controller::Timings;
use crate::models::Config;
use crate::runtime::Session;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) session: Arc<Session<RosterClient>>,
    pub(crate) refresh_secs: u64,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/reload", post(handlers::reload))
        .route("/modal/open", post(handlers::open_modal))
        .route("/modal/close", post(handlers::close_modal))
        .route("/modal/click", post(handlers::modal_click))
        .route("/keys", post(handlers::key_pressed))
        .route("/signup", post(handlers::signup))
        .route("/unregister", post(handlers::unregister))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, addr: &str) -> Result<()> {
    let client = RosterClient::new(&config.api)?;
    let (session, _pump) = Session::start(client, Timings::from(&config.ui));

    info!("Using activities API at {}", config.api.base_url);

    let state = AppState {
        session,
        refresh_secs: config.ui.refresh_secs,
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Roster page listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::extract::{Path, Query, State};
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::delete;
    use axum::Json;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::models::ApiConfig;

    type Backend = Arc<Mutex<Vec<(String, Vec<String>)>>>;

    async fn list(State(db): State<Backend>) -> impl IntoResponse {
        let db = db.lock().unwrap();
        let mut body = serde_json::Map::new();
        for (name, participants) in db.iter() {
            body.insert(
                name.clone(),
                json!({
                    "description": "Learn strategies",
                    "schedule": "Fridays",
                    "max_participants": 12,
                    "participants": participants,
                }),
            );
        }
        Json(serde_json::Value::Object(body))
    }

    async fn backend_signup(
        State(db): State<Backend>,
        Path(activity): Path<String>,
        Query(q): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let email = q.get("email").cloned().unwrap_or_default();
        let mut db = db.lock().unwrap();
        let Some((_, participants)) = db.iter_mut().find(|(n, _)| *n == activity) else {
            return (StatusCode::NOT_FOUND, Json(json!({"detail": "Activity not found"})));
        };
        if participants.contains(&email) {
            return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Already registered"})));
        }
        participants.push(email.clone());
        (
            StatusCode::OK,
            Json(json!({"message": format!("Signed up {email} for {activity}")})),
        )
    }

    async fn backend_unregister() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
    }

    async fn spawn_backend(db: Backend) -> String {
        let app = Router::new()
            .route("/activities", get(list))
            .route("/activities/{activity}/signup", post(backend_signup))
            .route("/activities/{activity}/unregister", delete(backend_unregister))
            .with_state(db);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn frontend(db: Backend) -> (Router, Arc<Session<RosterClient>>) {
        let base_url = spawn_backend(db).await;
        let client = RosterClient::new(&ApiConfig {
            base_url,
            timeout_secs: Some(5),
        })
        .unwrap();
        let (session, _pump) = Session::start(client, Timings::default());
        let state = AppState {
            session: Arc::clone(&session),
            refresh_secs: 2,
        };
        (router(state), session)
    }

    async fn post_form(app: &Router, uri: &str, body: &str) -> StatusCode {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.clone().oneshot(req).await.unwrap().status()
    }

    async fn page(app: &Router, uri: &str) -> String {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_page_lists_backend_activities() {
        let db: Backend = Arc::new(Mutex::new(vec![
            ("Chess Club".into(), vec!["a@b.com".into()]),
            ("Gym Class".into(), vec![]),
        ]));
        let (app, _session) = frontend(db).await;

        assert_eq!(post_form(&app, "/reload", "").await, StatusCode::SEE_OTHER);
        let html = page(&app, handlers::AFTER_ACTION).await;
        assert_eq!(html.matches("class=\"activity-card\"").count(), 2);
        assert!(html.contains("11 spots left"));
        assert!(html.contains("No participants yet"));
    }

    #[tokio::test]
    async fn test_signup_through_modal() {
        let db: Backend = Arc::new(Mutex::new(vec![("Chess Club".into(), vec![])]));
        let (app, session) = frontend(Arc::clone(&db)).await;

        post_form(&app, "/reload", "").await;
        post_form(&app, "/modal/open", "activity=Chess+Club").await;
        assert!(page(&app, handlers::AFTER_ACTION).await.contains("Register for Chess Club"));

        let status = post_form(&app, "/signup", "email=a%40b.com").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(db.lock().unwrap()[0].1, vec!["a@b.com".to_string()]);

        let html = page(&app, handlers::AFTER_ACTION).await;
        assert!(html.contains("Signed up a@b.com for Chess Club"));
        assert!(session.snapshot().is_modal_open());

        // duplicate signup is rejected by the server and shown inline
        post_form(&app, "/signup", "email=a%40b.com").await;
        let state = session.snapshot();
        let feedback = state.intent().unwrap().feedback.clone().unwrap();
        assert_eq!(feedback.text, "Already registered");
    }

    #[tokio::test]
    async fn test_unregister_failure_shows_fallback_notice() {
        let db: Backend = Arc::new(Mutex::new(vec![("Chess Club".into(), vec!["a@b.com".into()])]));
        let (app, session) = frontend(db).await;

        post_form(&app, "/unregister", "activity=Chess+Club&email=a%40b.com").await;
        let html = page(&app, handlers::AFTER_ACTION).await;
        assert!(html.contains(crate::controller::GENERIC_ERROR));
        assert!(html.contains("http-equiv"));
        assert_eq!(session.snapshot().notices.len(), 1);
    }

    #[tokio::test]
    async fn test_escape_and_overlay_close_modal() {
        let db: Backend = Arc::new(Mutex::new(vec![("Chess Club".into(), vec![])]));
        let (app, session) = frontend(db).await;

        post_form(&app, "/modal/open", "activity=Chess+Club").await;
        post_form(&app, "/modal/click", "target=panel").await;
        assert!(session.snapshot().is_modal_open());
        post_form(&app, "/keys", "key=Escape").await;
        assert!(!session.snapshot().is_modal_open());

        post_form(&app, "/modal/open", "activity=Chess+Club").await;
        post_form(&app, "/modal/click", "target=overlay").await;
        assert!(!session.snapshot().is_modal_open());
    }

    #[tokio::test]
    async fn test_fresh_page_load_refetches_roster() {
        let db: Backend = Arc::new(Mutex::new(vec![("Chess Club".into(), vec!["a@b.com".into()])]));
        let (app, _session) = frontend(Arc::clone(&db)).await;

        let html = page(&app, "/").await;
        assert!(html.contains("11 spots left"));

        db.lock().unwrap()[0].1.push("other@x.com".into());
        let html = page(&app, "/").await;
        assert!(html.contains("other@x.com"));
        assert!(html.contains("10 spots left"));
    }

    #[tokio::test]
    async fn test_redirect_after_rejected_signup_keeps_snapshot() {
        let db: Backend = Arc::new(Mutex::new(vec![("Chess Club".into(), vec!["a@b.com".into()])]));
        let (app, _session) = frontend(Arc::clone(&db)).await;

        page(&app, "/").await;
        post_form(&app, "/modal/open", "activity=Chess+Club").await;
        db.lock().unwrap()[0].1.push("other@x.com".into());

        let req = Request::builder()
            .method("POST")
            .uri("/signup")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=a%40b.com"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], handlers::AFTER_ACTION);

        // the rejected signup must not trigger a refetch
        let html = page(&app, handlers::AFTER_ACTION).await;
        assert!(html.contains("Already registered"));
        assert!(!html.contains("other@x.com"));
    }
}

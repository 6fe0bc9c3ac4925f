use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use roam_core::relay::{PlannerCommand, run_planner};

use crate::config::RelaySettings;

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>roam trip planner</title>
</head>
<body>
<h1>Plan a trip</h1>
<form id="tripForm">
  <label>Destination <input id="destination" name="destination" required></label>
  <label>Days <input id="days" name="days" type="number" min="1" value="3"></label>
  <label>Budget <input id="budget" name="budget" type="number" min="0" value="10000"></label>
  <button type="submit">Plan</button>
</form>
<div id="result"></div>
<script>
document.querySelector("#tripForm").addEventListener("submit", async (e) => {
  e.preventDefault();
  const body = JSON.stringify({
    destination: document.querySelector("#destination").value,
    days: document.querySelector("#days").value,
    budget: document.querySelector("#budget").value,
  });
  const response = await fetch("/plan", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body,
  });
  const result = await response.json();
  const out = document.querySelector("#result");
  out.textContent = "";
  const h = document.createElement("h3");
  h.textContent = result.error ? "Error: " + result.error : "Trip plan for " + result.destination;
  out.appendChild(h);
  if (!result.error) {
    const p = document.createElement("p");
    p.textContent = "Total budget: " + result.total_budget;
    out.appendChild(p);
  }
});
</script>
</body>
</html>
"##;

#[derive(Clone)]
struct AppState {
    planner: Arc<PlannerCommand>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Planner stdout, passed through untouched.
struct PlanOutput(Vec<u8>);

impl IntoResponse for PlanOutput {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            self.0,
        )
            .into_response()
    }
}

struct NotFound;

impl IntoResponse for NotFound {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(planner: PlannerCommand) -> Router {
    let state = AppState {
        planner: Arc::new(planner),
    };
    Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/plan", post(plan).fallback(not_found))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(settings: RelaySettings) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.bind, settings.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", settings.bind, settings.port))?;
    let app = build_router(settings.planner.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        planner = %settings.planner.program,
        "roam serve listening on http://{addr}"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("roam serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn not_found() -> NotFound {
    NotFound
}

/// Pipe the raw body through the planner and answer with its stdout.
/// The status is 200 whatever the planner did.
async fn plan(State(state): State<AppState>, body: Bytes) -> PlanOutput {
    let stdout = match run_planner(&state.planner, &body).await {
        Ok(out) => {
            if out.timed_out {
                tracing::warn!(duration_ms = out.duration_ms, "planner timed out");
            } else if !out.success() {
                tracing::warn!(
                    exit_code = ?out.exit_code,
                    stderr = %out.stderr.trim(),
                    "planner exited unsuccessfully"
                );
            } else {
                tracing::debug!(duration_ms = out.duration_ms, "planner finished");
            }
            out.stdout
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "planner could not be run");
            Vec::new()
        }
    };
    PlanOutput(stdout)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn planner(program: &str, args: &[&str]) -> PlannerCommand {
        PlannerCommand::new(program, args.iter().map(|s| (*s).to_owned()).collect())
    }

    async fn send(
        planner: PlannerCommand,
        method: Method,
        uri: &str,
        body: &'static str,
    ) -> Response {
        build_router(planner)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get("content-type")
            .expect("should have content-type header")
            .to_str()
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn index_returns_form() {
        let resp = send(planner("cat", &[]), Method::GET, "/", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(content_type(&resp).contains("text/html"));
        assert!(body_string(resp).await.contains("id=\"tripForm\""));
    }

    #[tokio::test]
    async fn plan_returns_planner_stdout_verbatim() {
        let body = r#"{"destination":"Goa","days":"2","budget":500}"#;
        let resp = send(planner("cat", &[]), Method::POST, "/plan", body).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(content_type(&resp), "application/json");
        assert_eq!(body_string(resp).await, body);
    }

    #[tokio::test]
    async fn failing_planner_still_answers_200() {
        let p = planner("sh", &["-c", "printf '{\"error\":\"boom\"}'; exit 1"]);
        let resp = send(p, Method::POST, "/plan", "{}").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, r#"{"error":"boom"}"#);
    }

    #[tokio::test]
    async fn missing_planner_gives_empty_200() {
        let resp = send(
            planner("roam_relay_planner_missing", &[]),
            Method::POST,
            "/plan",
            "{}",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "");
    }

    #[tokio::test]
    async fn unknown_route_is_plain_404() {
        let resp = send(planner("cat", &[]), Method::GET, "/nope", "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(resp).await, "Not Found");
    }

    #[tokio::test]
    async fn wrong_method_is_plain_404() {
        let resp = send(planner("cat", &[]), Method::GET, "/plan", "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(resp).await, "Not Found");

        let resp = send(planner("cat", &[]), Method::POST, "/", "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

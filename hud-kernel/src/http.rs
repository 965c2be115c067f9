/**
 * HTTP API - Inspection and control surface of the HUD kernel
 *
 * ROLE:
 * Lets a presentation layer, a control panel or a developer read the current
 * snapshot and push inputs without an MQTT broker.
 *
 * ROUTES:
 * - GET  /health, /state, /view, /theme
 * - POST /message                 one `{action, data}` envelope
 * - POST /control/{input}         accelerate | brake | release-accelerate | release-brake | release
 *                                 | shoot | release-trigger
 * - POST /dashboard/{action}      save | reset | close
 * - POST /dashboard/color         `{slot, color}` draft edit
 * - POST /key/escape
 *
 * SECURITY:
 * When HUD_KERNEL_API_KEY is set every route except /health requires a
 * matching `x-api-key` header. Unset means open (local overlay use).
 */

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::engine::{DashboardAction, Input};
use crate::envelope::decode_bytes;
use crate::health::{HealthTracker, KernelHealth};
use crate::kinematics::DriveInput;
use crate::models::HudSnapshot;
use crate::state::Shared;
use crate::style::{AppliedStyle, StyleSurface};
use crate::theme::{ThemeColorMap, ThemeSlot, ThemeSource};
use crate::view::{project, HudView};
use crate::weapon::TriggerInput;

pub const API_KEY_ENV: &str = "HUD_KERNEL_API_KEY";

#[derive(Clone)]
pub struct AppState {
    pub inputs: mpsc::Sender<Input>,
    pub snapshots: watch::Receiver<HudSnapshot>,
    pub style: Shared<StyleSurface>,
    pub health: HealthTracker,
}

impl AppState {
    async fn submit(&self, input: Input) -> Result<StatusCode, StatusCode> {
        self.inputs.send(input).await.map_err(|_| {
            warn!("[http] engine stopped, rejecting input");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
        Ok(StatusCode::ACCEPTED)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThemeView {
    effective: ThemeColorMap,
    sources: BTreeMap<ThemeSlot, ThemeSource>,
    dashboard_open: bool,
    applied: BTreeMap<String, AppliedStyle>,
}

#[derive(Debug, Deserialize)]
struct ColorBody {
    slot: String,
    color: String,
}

async fn require_api_key(req: Request, next: Next) -> Result<Response, StatusCode> {
    let expected = std::env::var(API_KEY_ENV).unwrap_or_default();
    if expected.is_empty() || req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        warn!("[http] rejected request to {} without valid api key", req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/state", get(get_state))
        .route("/view", get(get_view))
        .route("/theme", get(get_theme))
        .route("/message", post(post_message))
        .route("/control/{input}", post(post_control))
        .route("/dashboard/color", post(post_dashboard_color))
        .route("/dashboard/{action}", post(post_dashboard))
        .route("/key/escape", post(post_escape))
        .with_state(app_state)
        .layer(middleware::from_fn(require_api_key))
}

// GET /health
async fn get_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health.report())
}

// GET /state (raw snapshot)
async fn get_state(State(app): State<AppState>) -> Json<HudSnapshot> {
    Json(app.snapshots.borrow().clone())
}

// GET /view (what each widget shows)
async fn get_view(State(app): State<AppState>) -> Json<HudView> {
    Json(project(&app.snapshots.borrow()))
}

// GET /theme
async fn get_theme(State(app): State<AppState>) -> Json<ThemeView> {
    let (effective, sources, dashboard_open) = {
        let snap = app.snapshots.borrow();
        (snap.theme.clone(), snap.theme_sources.clone(), snap.theme_dashboard_open)
    };
    Json(ThemeView {
        effective,
        sources,
        dashboard_open,
        applied: app.style.lock().properties().clone(),
    })
}

// POST /message
async fn post_message(State(app): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Value>), StatusCode> {
    match decode_bytes(&body) {
        Some(command) => {
            let action = command.action();
            let code = app.submit(Input::Command(command)).await?;
            Ok((code, Json(json!({ "accepted": true, "action": action }))))
        }
        None => {
            app.health.record_ignored();
            Ok((StatusCode::OK, Json(json!({ "accepted": false }))))
        }
    }
}

// POST /control/{input}
async fn post_control(State(app): State<AppState>, Path(input): Path<String>) -> Result<StatusCode, StatusCode> {
    let input = DriveInput::parse(&input)
        .map(Input::Drive)
        .or_else(|| TriggerInput::parse(&input).map(Input::Trigger))
        .ok_or(StatusCode::NOT_FOUND)?;
    app.submit(input).await
}

// POST /dashboard/{action}
async fn post_dashboard(State(app): State<AppState>, Path(action): Path<String>) -> Result<StatusCode, StatusCode> {
    let action = match action.as_str() {
        "save" => DashboardAction::Save,
        "reset" => DashboardAction::Reset,
        "close" => DashboardAction::Close,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    app.submit(Input::Dashboard(action)).await
}

// POST /dashboard/color
async fn post_dashboard_color(State(app): State<AppState>, Json(body): Json<ColorBody>) -> Result<StatusCode, StatusCode> {
    app.submit(Input::Dashboard(DashboardAction::SetColor { slot: body.slot, color: body.color }))
        .await
}

// POST /key/escape
async fn post_escape(State(app): State<AppState>) -> Result<StatusCode, StatusCode> {
    app.submit(Input::Escape).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Authority;
    use crate::engine::Engine;
    use crate::envelope::Command;
    use crate::state::new_state;
    use std::time::Instant;

    fn app() -> (AppState, mpsc::Receiver<Input>) {
        let (tx, rx) = mpsc::channel(8);
        let snapshot = Engine::new(Authority::Host, None, Instant::now()).snapshot();
        let (_snap_tx, snap_rx) = watch::channel(snapshot);
        let state = AppState {
            inputs: tx,
            snapshots: snap_rx,
            style: new_state(StyleSurface::new()),
            health: HealthTracker::new(),
        };
        (state, rx)
    }

    #[tokio::test]
    async fn message_endpoint_forwards_decoded_commands() {
        let (state, mut rx) = app();
        let body = Bytes::from_static(br#"{"action":"cruiseToggle","data":{"enabled":true}}"#);
        let (code, Json(reply)) = post_message(State(state), body).await.unwrap();
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(reply["action"], "cruiseToggle");
        assert!(matches!(
            rx.recv().await,
            Some(Input::Command(Command::CruiseToggle { enabled: true }))
        ));
    }

    #[tokio::test]
    async fn unknown_messages_are_acknowledged_but_dropped() {
        let (state, mut rx) = app();
        let health = state.health.clone();
        let (code, Json(reply)) = post_message(State(state), Bytes::from_static(b"{}")).await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(reply["accepted"], false);
        assert_eq!(health.report().messages_ignored, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn control_routes_map_to_drive_inputs() {
        let (state, mut rx) = app();
        assert_eq!(
            post_control(State(state.clone()), Path("brake".into())).await,
            Ok(StatusCode::ACCEPTED)
        );
        assert!(matches!(rx.recv().await, Some(Input::Drive(DriveInput::Brake))));
        post_control(State(state.clone()), Path("shoot".into())).await.unwrap();
        assert!(matches!(rx.recv().await, Some(Input::Trigger(TriggerInput::Shoot))));
        post_control(State(state.clone()), Path("release-trigger".into())).await.unwrap();
        assert!(matches!(rx.recv().await, Some(Input::Trigger(TriggerInput::ReleaseTrigger))));
        assert_eq!(
            post_control(State(state), Path("turbo".into())).await,
            Err(StatusCode::NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn dashboard_routes() {
        let (state, mut rx) = app();
        post_dashboard(State(state.clone()), Path("save".into())).await.unwrap();
        assert!(matches!(rx.recv().await, Some(Input::Dashboard(DashboardAction::Save))));

        let body = ColorBody { slot: "ammo".into(), color: "#123123".into() };
        post_dashboard_color(State(state.clone()), Json(body)).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(Input::Dashboard(DashboardAction::SetColor { ref slot, .. })) if slot == "ammo"
        ));
        assert_eq!(post_dashboard(State(state), Path("open".into())).await, Err(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn stopped_engine_yields_503() {
        let (state, rx) = app();
        drop(rx);
        assert_eq!(post_escape(State(state)).await, Err(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn theme_endpoint_reports_effective_and_applied() {
        let (state, _rx) = app();
        let Json(view) = get_theme(State(state)).await;
        assert_eq!(view.effective, ThemeColorMap::default());
        assert!(view.applied.is_empty());
        assert!(view.sources.values().all(|s| *s == ThemeSource::Default));
        assert_eq!(view.sources.len(), 8);
        assert!(!view.dashboard_open);
    }
}

/**
 * HUD KERNEL - Service entry point
 *
 * ROLE: wires config, the engine runtime, the host bridge, the MQTT listener
 * and the HTTP API together, then serves until Ctrl-C.
 */

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use hud_kernel::bridge::HttpBridge;
use hud_kernel::config::load_config;
use hud_kernel::engine::Engine;
use hud_kernel::health::HealthTracker;
use hud_kernel::http::{self, AppState};
use hud_kernel::legacy::read_legacy_theme;
use hud_kernel::mqtt;
use hud_kernel::runtime::{self, spawn_runtime};
use hud_kernel::state::new_state;
use hud_kernel::style::StyleSurface;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let cfg = load_config().await;
    info!("[kernel] authority: {:?}", cfg.authority);

    let legacy_theme = match &cfg.legacy_theme_path {
        Some(path) => read_legacy_theme(path).await,
        None => None,
    };

    let bridge = HttpBridge::new(&cfg.bridge).context("building host bridge client")?;
    let health = HealthTracker::new();
    let style = new_state(StyleSurface::new());

    let engine = Engine::new(cfg.authority, legacy_theme, runtime::now());
    let handle = spawn_runtime(engine, Arc::new(bridge), style.clone(), health.clone());

    match cfg.mqtt.clone() {
        Some(mqtt_cfg) => {
            mqtt::spawn_mqtt_listener(mqtt_cfg, handle.inputs.clone(), health.clone());
        }
        None => warn!("[kernel] no mqtt section, only the HTTP API feeds the engine"),
    }

    let app = http::build_router(AppState {
        inputs: handle.inputs.clone(),
        snapshots: handle.snapshots.clone(),
        style,
        health,
    });

    let listener = TcpListener::bind(&cfg.http.bind)
        .await
        .with_context(|| format!("binding {}", cfg.http.bind))?;
    info!("[kernel] listening on http://{}", cfg.http.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("[kernel] ctrl-c handler failed: {e}");
            }
        })
        .await
        .context("http server")?;

    info!("[kernel] shutting down");
    handle.shutdown().await;
    Ok(())
}

mod app;
mod appliance;
mod bridge;
mod config;
mod erd;
mod feed;
mod format;
mod handlers;
mod models;
mod snapshot;
mod state;
#[cfg(test)]
mod testing;

use laundry_common::{bind_listener, init_tracing, shutdown_signal};
use tokio::sync::mpsc;

use crate::bridge::EventBridge;
use crate::config::DashboardConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    let _guards = init_tracing("dashboard-service");

    let config = DashboardConfig::from_env();
    let state = AppState::new(config.broadcast_capacity, config.keepalive);

    // Vendor events are applied strictly one at a time by a single bridge task.
    let (vendor_tx, vendor_rx) = mpsc::channel(config.vendor_event_capacity);
    tokio::spawn(EventBridge::new(state.clone()).run(vendor_rx));
    tokio::spawn(feed::run_feed(config.feed_source.clone(), vendor_tx));

    let app = app::build_router(state);
    let listener = bind_listener(config.port).await.expect("bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("serve");
}

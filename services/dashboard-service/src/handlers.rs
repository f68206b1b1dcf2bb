use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{
        sse::{Event, Sse},
        Html, IntoResponse,
    },
    Json,
};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::{Stream, StreamExt};

use crate::models::{AppliancesResponse, Envelope};
use crate::state::AppState;

const DASHBOARD_PAGE: &str = include_str!("../static/dashboard.html");

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn readyz() -> StatusCode {
    StatusCode::OK
}

pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

pub async fn appliances(State(state): State<AppState>) -> Json<AppliancesResponse> {
    Json(state.view().await)
}

// Subscribed before the stream is first polled, so nothing published in
// between is lost.
pub fn envelopes(state: AppState) -> impl Stream<Item = Envelope> {
    let mut updates = state.updates.subscribe();
    let keepalive = state.keepalive;

    async_stream::stream! {
        let view = state.view().await;
        yield Envelope::Init {
            connection: view.connection,
            appliances: view.appliances,
        };

        loop {
            match tokio::time::timeout(keepalive, updates.recv()).await {
                Ok(Ok(envelope)) => yield envelope,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "stream subscriber lagged, oldest updates dropped");
                }
                Ok(Err(RecvError::Closed)) => break,
                Err(_) => yield Envelope::Keepalive,
            }
        }
    }
}

pub async fn stream(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("stream subscriber connected");
    let events = envelopes(state).filter_map(|envelope| {
        match Event::default().json_data(&envelope) {
            Ok(event) => Some(Ok::<_, Infallible>(event)),
            Err(err) => {
                tracing::warn!(event = envelope.kind(), error = %err, "envelope not serializable");
                None
            }
        }
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{EventBridge, VendorEvent};
    use crate::testing::{FakeAppliance, DRYER_MAC};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn snapshot_read_returns_connection_and_appliances() {
        let state = AppState::new(8, Duration::from_secs(30));
        EventBridge::new(state.clone())
            .handle(VendorEvent::ApplianceAdded(Arc::new(FakeAppliance::dryer())))
            .await;

        let Json(body) = appliances(State(state)).await;
        let body = serde_json::to_value(body).expect("json");

        assert_eq!(body["connection"], json!({ "connected": false, "last_update": null }));
        assert_eq!(body["appliances"][DRYER_MAC]["type"], "dryer");
        assert_eq!(
            body["appliances"][DRYER_MAC]["controls"]["temperature"]["options"],
            json!(["Low", "High"])
        );
    }

    #[tokio::test]
    async fn added_appliance_follows_init_exactly_once() {
        let state = AppState::new(8, Duration::from_secs(30));
        let bridge = EventBridge::new(state.clone());
        let updates = envelopes(state.clone());
        tokio::pin!(updates);

        bridge
            .handle(VendorEvent::ApplianceAdded(Arc::new(FakeAppliance::dryer())))
            .await;

        let init = updates.next().await.expect("init");
        assert_eq!(init.kind(), "init");

        match timeout(Duration::from_secs(1), updates.next()).await {
            Ok(Some(Envelope::ApplianceAdded { mac, data })) => {
                assert_eq!(mac, DRYER_MAC);
                assert_eq!(data.mac, DRYER_MAC);
                assert!(data.controls.contains_key("temperature"));
            }
            other => panic!("expected appliance_added, got {other:?}"),
        }

        assert!(timeout(Duration::from_millis(100), updates.next())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn idle_stream_sends_keepalives_and_stays_open() {
        let state = AppState::new(8, Duration::from_millis(50));
        let updates = envelopes(state.clone());
        tokio::pin!(updates);

        assert_eq!(updates.next().await.expect("init").kind(), "init");
        assert_eq!(updates.next().await.expect("keepalive").kind(), "keepalive");
        assert_eq!(updates.next().await.expect("keepalive").kind(), "keepalive");

        state.publish(Envelope::Connected);
        assert_eq!(updates.next().await.expect("connected").kind(), "connected");
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_oldest_and_continues() {
        let state = AppState::new(2, Duration::from_secs(30));
        let updates = envelopes(state.clone());
        tokio::pin!(updates);
        assert_eq!(updates.next().await.expect("init").kind(), "init");

        state.publish(Envelope::Connected);
        state.publish(Envelope::Disconnected);
        state.publish(Envelope::Error {
            message: "gone".to_string(),
        });

        assert_eq!(updates.next().await.expect("disconnected").kind(), "disconnected");
        assert_eq!(updates.next().await.expect("error").kind(), "error");
    }

    #[tokio::test]
    async fn stream_response_is_event_stream_without_buffering() {
        let state = AppState::new(8, Duration::from_secs(30));
        let response = stream(State(state)).await.into_response();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");

        let mut body = response.into_body().into_data_stream();
        let chunk = body.next().await.expect("frame").expect("bytes");
        let frame = String::from_utf8(chunk.to_vec()).expect("utf8");
        assert!(frame.starts_with("data: {\"event\":\"init\""));
        assert!(frame.ends_with("\n\n"));
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::appliance::Appliance;
use crate::erd::{ErdCode, ErdValue};
use crate::format::stringify_value;
use crate::models::{timestamp, Envelope};
use crate::snapshot::build_snapshot;
use crate::state::AppState;

pub enum VendorEvent {
    ApplianceAdded(Arc<dyn Appliance>),
    StateChanged {
        appliance: Arc<dyn Appliance>,
        changes: Vec<(ErdCode, Option<ErdValue>)>,
    },
    Available(Arc<dyn Appliance>),
    Unavailable(Arc<dyn Appliance>),
    Connected,
    Disconnected,
    /// The vendor transport died and will not come back on its own.
    TransportFailed(String),
}

pub struct EventBridge {
    state: AppState,
}

impl EventBridge {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn run(self, mut events: mpsc::Receiver<VendorEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        tracing::info!("vendor event channel closed");
    }

    pub async fn handle(&self, event: VendorEvent) {
        match event {
            VendorEvent::ApplianceAdded(appliance) => self.appliance_added(appliance.as_ref()).await,
            VendorEvent::StateChanged { appliance, changes } => {
                self.state_changed(appliance.as_ref(), changes).await
            }
            VendorEvent::Available(appliance) => {
                self.set_available(appliance.mac_addr(), true).await
            }
            VendorEvent::Unavailable(appliance) => {
                self.set_available(appliance.mac_addr(), false).await
            }
            VendorEvent::Connected => {
                tracing::info!("connected to appliance cloud");
                {
                    let mut store = self.state.store.write().await;
                    store.connection.connected = true;
                    store.connection.last_update = Some(timestamp());
                }
                self.state.publish(Envelope::Connected);
            }
            VendorEvent::Disconnected => {
                tracing::info!("disconnected from appliance cloud");
                self.state.store.write().await.connection.connected = false;
                self.state.publish(Envelope::Disconnected);
            }
            VendorEvent::TransportFailed(message) => {
                tracing::error!(error = %message, "appliance cloud client stopped");
                self.state.store.write().await.connection.connected = false;
                self.state.publish(Envelope::Error { message });
            }
        }
    }

    async fn appliance_added(&self, appliance: &dyn Appliance) {
        let mac = appliance.mac_addr().to_string();
        let snapshot = build_snapshot(appliance);
        tracing::info!(mac = %mac, kind = snapshot.kind.as_str(), "appliance added");

        self.state
            .store
            .write()
            .await
            .appliances
            .insert(mac.clone(), snapshot.clone());
        self.state.publish(Envelope::ApplianceAdded {
            mac,
            data: snapshot,
        });
    }

    async fn state_changed(
        &self,
        appliance: &dyn Appliance,
        changes: Vec<(ErdCode, Option<ErdValue>)>,
    ) {
        let mac = appliance.mac_addr().to_string();
        tracing::info!(mac = %mac, changed = changes.len(), "appliance state change");

        let snapshot = build_snapshot(appliance);
        let changes: BTreeMap<String, String> = changes
            .iter()
            .map(|(code, value)| {
                (
                    code.name().to_string(),
                    stringify_value(appliance, code, value.as_ref()),
                )
            })
            .collect();

        self.state
            .store
            .write()
            .await
            .appliances
            .insert(mac.clone(), snapshot.clone());
        self.state.publish(Envelope::StateChange {
            mac,
            changes,
            data: snapshot,
        });
    }

    async fn set_available(&self, mac: &str, available: bool) {
        tracing::info!(mac = %mac, available, "appliance availability");
        {
            let mut store = self.state.store.write().await;
            match store.appliances.get_mut(mac) {
                Some(snapshot) => {
                    snapshot.available = available;
                    snapshot.last_update = timestamp();
                }
                None => tracing::debug!(mac = %mac, "availability for unseen appliance"),
            }
        }

        let mac = mac.to_string();
        self.state.publish(if available {
            Envelope::Available { mac }
        } else {
            Envelope::Unavailable { mac }
        });
    }
}

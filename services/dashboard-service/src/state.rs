use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::sync::{broadcast, RwLock};

use crate::models::{AppliancesResponse, ApplianceSnapshot, ConnectionStatus, Envelope};

#[derive(Default)]
pub struct DashboardStore {
    pub connection: ConnectionStatus,
    pub appliances: BTreeMap<String, ApplianceSnapshot>,
}

impl DashboardStore {
    pub fn view(&self) -> AppliancesResponse {
        AppliancesResponse {
            connection: self.connection.clone(),
            appliances: self.appliances.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<DashboardStore>>,
    pub updates: broadcast::Sender<Envelope>,
    pub keepalive: Duration,
}

impl AppState {
    pub fn new(broadcast_capacity: usize, keepalive: Duration) -> Self {
        let (updates, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            store: Arc::new(RwLock::new(DashboardStore::default())),
            updates,
            keepalive,
        }
    }

    pub fn publish(&self, envelope: Envelope) {
        let kind = envelope.kind();
        match self.updates.send(envelope) {
            Ok(receivers) => tracing::debug!(event = kind, receivers, "envelope published"),
            Err(_) => tracing::trace!(event = kind, "no stream subscribers"),
        }
    }

    pub async fn view(&self) -> AppliancesResponse {
        self.store.read().await.view()
    }
}

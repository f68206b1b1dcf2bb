use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::appliance::{Appliance, ErdError};
use crate::bridge::VendorEvent;
use crate::erd::{ErdCode, ErdValue};

pub const STDIN_SOURCE: &str = "-";

type RawProperties = BTreeMap<ErdCode, serde_json::Value>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot open appliance feed {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("appliance feed read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("vendor event consumer is gone")]
    Closed,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedMessage {
    Connected,
    Disconnected,
    Appliance {
        mac: String,
        #[serde(default = "online")]
        available: bool,
        #[serde(default)]
        properties: RawProperties,
    },
    Update {
        mac: String,
        properties: RawProperties,
    },
    Available {
        mac: String,
    },
    Unavailable {
        mac: String,
    },
}

fn online() -> bool {
    true
}

#[derive(Clone, Debug)]
enum Slot {
    Value(Option<ErdValue>),
    Undecodable(String),
}

impl Slot {
    fn decode(raw: serde_json::Value) -> Self {
        if raw.is_null() {
            return Slot::Value(None);
        }
        match serde_json::from_value::<ErdValue>(raw) {
            Ok(value) => Slot::Value(Some(value)),
            Err(err) => Slot::Undecodable(err.to_string()),
        }
    }
}

pub struct FeedAppliance {
    mac: String,
    properties: RwLock<BTreeMap<ErdCode, Slot>>,
    available: AtomicBool,
}

impl FeedAppliance {
    fn new(mac: String, available: bool) -> Self {
        Self {
            mac,
            properties: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(available),
        }
    }

    fn apply(&self, updates: RawProperties) -> Vec<(ErdCode, Option<ErdValue>)> {
        let mut properties = self.properties.write();
        let mut changes = Vec::with_capacity(updates.len());
        for (code, raw) in updates {
            let slot = Slot::decode(raw);
            match &slot {
                Slot::Value(value) => changes.push((code.clone(), value.clone())),
                Slot::Undecodable(reason) => {
                    tracing::warn!(mac = %self.mac, code = %code, reason = %reason, "undecodable property value");
                }
            }
            properties.insert(code, slot);
        }
        changes
    }

    fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Appliance for FeedAppliance {
    fn mac_addr(&self) -> &str {
        &self.mac
    }

    fn erd_value(&self, code: &ErdCode) -> Result<Option<ErdValue>, ErdError> {
        match self.properties.read().get(code) {
            Some(Slot::Value(value)) => Ok(value.clone()),
            Some(Slot::Undecodable(reason)) => Err(ErdError::Query {
                code: code.to_string(),
                message: reason.clone(),
            }),
            None => Err(ErdError::UnknownCode(code.to_string())),
        }
    }

    fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn known_properties(&self) -> Vec<ErdCode> {
        self.properties.read().keys().cloned().collect()
    }
}

#[derive(Default)]
struct FeedAppliances {
    by_mac: HashMap<String, Arc<FeedAppliance>>,
}

impl FeedAppliances {
    fn apply(&mut self, message: FeedMessage) -> Option<VendorEvent> {
        match message {
            FeedMessage::Connected => Some(VendorEvent::Connected),
            FeedMessage::Disconnected => Some(VendorEvent::Disconnected),
            FeedMessage::Appliance {
                mac,
                available,
                properties,
            } => {
                if let Some(existing) = self.by_mac.get(&mac) {
                    existing.set_available(available);
                    let changes = existing.apply(properties);
                    return Some(VendorEvent::StateChanged {
                        appliance: existing.clone(),
                        changes,
                    });
                }
                let appliance = Arc::new(FeedAppliance::new(mac.clone(), available));
                appliance.apply(properties);
                self.by_mac.insert(mac, appliance.clone());
                Some(VendorEvent::ApplianceAdded(appliance))
            }
            FeedMessage::Update { mac, properties } => {
                let appliance = self.known(&mac)?;
                let changes = appliance.apply(properties);
                Some(VendorEvent::StateChanged { appliance, changes })
            }
            FeedMessage::Available { mac } => {
                let appliance = self.known(&mac)?;
                appliance.set_available(true);
                Some(VendorEvent::Available(appliance))
            }
            FeedMessage::Unavailable { mac } => {
                let appliance = self.known(&mac)?;
                appliance.set_available(false);
                Some(VendorEvent::Unavailable(appliance))
            }
        }
    }

    fn known(&self, mac: &str) -> Option<Arc<FeedAppliance>> {
        let appliance = self.by_mac.get(mac).cloned();
        if appliance.is_none() {
            tracing::warn!(mac = %mac, "feed message for unannounced appliance");
        }
        appliance
    }
}

pub struct FeedClient<R> {
    reader: R,
    appliances: FeedAppliances,
}

impl FeedClient<Box<dyn AsyncBufRead + Send + Unpin>> {
    pub async fn open(source: &str) -> Result<Self, FeedError> {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = if source == STDIN_SOURCE {
            Box::new(BufReader::new(tokio::io::stdin()))
        } else {
            let file = tokio::fs::File::open(source)
                .await
                .map_err(|source_err| FeedError::Open {
                    path: source.to_string(),
                    source: source_err,
                })?;
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: AsyncBufRead + Unpin> FeedClient<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            appliances: FeedAppliances::default(),
        }
    }

    /// Returns at end of input; an I/O error is fatal to the feed.
    pub async fn run(self, events: mpsc::Sender<VendorEvent>) -> Result<(), FeedError> {
        let FeedClient {
            reader,
            mut appliances,
        } = self;
        let mut lines = reader.split(b'\n');
        let mut line_number = 0usize;

        while let Some(bytes) = lines.next_segment().await? {
            line_number += 1;
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(line = line_number, error = %err, "skipping non-utf8 feed line");
                    continue;
                }
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let message = match serde_json::from_str::<FeedMessage>(line) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(line = line_number, error = %err, "skipping malformed feed line");
                    continue;
                }
            };

            if let Some(event) = appliances.apply(message) {
                events.send(event).await.map_err(|_| FeedError::Closed)?;
            }
        }

        Ok(())
    }
}

pub async fn run_feed(source: String, events: mpsc::Sender<VendorEvent>) {
    tracing::info!(source = %source, "connecting to appliance feed");
    let result = match FeedClient::open(&source).await {
        Ok(client) => client.run(events.clone()).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => tracing::info!("appliance feed ended"),
        Err(FeedError::Closed) => tracing::debug!("appliance feed stopped: consumer gone"),
        Err(err) => {
            let _ = events.send(VendorEvent::TransportFailed(err.to_string())).await;
        }
    }
}

use serde::Serialize;
use std::collections::BTreeMap;

pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplianceKind {
    Washer,
    Dryer,
    Unknown,
}

impl ApplianceKind {
    // Dryer wins when a type string names both (combo units).
    pub fn classify(type_display: &str) -> Self {
        let upper = type_display.to_uppercase();
        if upper.contains("DRYER") {
            ApplianceKind::Dryer
        } else if upper.contains("WASHER") {
            ApplianceKind::Washer
        } else {
            ApplianceKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplianceKind::Washer => "washer",
            ApplianceKind::Dryer => "dryer",
            ApplianceKind::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyValue {
    pub raw: String,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Control {
    Options {
        current: String,
        options: Vec<String>,
    },
    Toggle {
        current: String,
        can_toggle: bool,
    },
    Available {
        current: String,
        available: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApplianceSnapshot {
    pub mac: String,
    #[serde(rename = "type")]
    pub kind: ApplianceKind,
    pub type_display: String,
    pub available: bool,
    pub last_update: String,
    pub properties: BTreeMap<String, PropertyValue>,
    pub controls: BTreeMap<String, Control>,
    pub stats: BTreeMap<String, u64>,
    pub remote_enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub last_update: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AppliancesResponse {
    pub connection: ConnectionStatus,
    pub appliances: BTreeMap<String, ApplianceSnapshot>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Envelope {
    Init {
        connection: ConnectionStatus,
        appliances: BTreeMap<String, ApplianceSnapshot>,
    },
    ApplianceAdded {
        mac: String,
        data: ApplianceSnapshot,
    },
    StateChange {
        mac: String,
        changes: BTreeMap<String, String>,
        data: ApplianceSnapshot,
    },
    Available {
        mac: String,
    },
    Unavailable {
        mac: String,
    },
    Connected,
    Disconnected,
    Error {
        message: String,
    },
    Keepalive,
}

impl Envelope {
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Init { .. } => "init",
            Envelope::ApplianceAdded { .. } => "appliance_added",
            Envelope::StateChange { .. } => "state_change",
            Envelope::Available { .. } => "available",
            Envelope::Unavailable { .. } => "unavailable",
            Envelope::Connected => "connected",
            Envelope::Disconnected => "disconnected",
            Envelope::Error { .. } => "error",
            Envelope::Keepalive => "keepalive",
        }
    }
}

use std::collections::BTreeMap;

use crate::appliance::{Appliance, ErdError};
use crate::erd::{AllowableFlag, Allowables, EnumMember, ErdCode, ErdValue, WasherLinkData};

pub const DRYER_MAC: &str = "D8:28:C9:00:00:02";
pub const WASHER_MAC: &str = "D8:28:C9:00:00:01";

/// In-memory appliance. Codes listed in `broken` fail every query.
#[derive(Clone)]
pub struct FakeAppliance {
    mac: String,
    values: BTreeMap<ErdCode, Option<ErdValue>>,
    broken: Vec<ErdCode>,
    available: bool,
}

impl FakeAppliance {
    pub fn new(mac: &str) -> Self {
        Self {
            mac: mac.to_string(),
            values: BTreeMap::new(),
            broken: Vec::new(),
            available: true,
        }
    }

    pub fn with(mut self, code: ErdCode, value: ErdValue) -> Self {
        self.values.insert(code, Some(value));
        self
    }

    pub fn with_absent(mut self, code: ErdCode) -> Self {
        self.values.insert(code, None);
        self
    }

    pub fn with_broken(mut self, code: ErdCode) -> Self {
        self.broken.push(code);
        self
    }

    pub fn offline(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn dryer() -> Self {
        Self::new(DRYER_MAC)
            .with(ErdCode::ApplianceType, appliance_type("ELECTRIC_DRYER"))
            .with(ErdCode::LaundryRemoteStatus, ErdValue::Bool(true))
            .with(ErdCode::DryerTemperatureOption, member("ErdTemperatureNewOption", "HIGH"))
            .with(
                ErdCode::DryerTemperatureOptionAllowables,
                allowables(
                    "ErdDryerTemperatureOptionAllowables",
                    &[("low_allowed", true), ("medium_allowed", false), ("high_allowed", true)],
                ),
            )
    }

    pub fn washer() -> Self {
        Self::new(WASHER_MAC)
            .with(ErdCode::ApplianceType, appliance_type("WASHER"))
            .with(ErdCode::LaundryRemoteStatus, ErdValue::Bool(false))
            .with(
                ErdCode::WasherLinkData,
                ErdValue::WasherLink(WasherLinkData {
                    washer_cycle_count: 412,
                    water_extraction_level_index: 2,
                    washer_load_size_index: 3,
                    base_cycle_type: "COTTONS".to_string(),
                }),
            )
    }
}

impl Appliance for FakeAppliance {
    fn mac_addr(&self) -> &str {
        &self.mac
    }

    fn erd_value(&self, code: &ErdCode) -> Result<Option<ErdValue>, ErdError> {
        if self.broken.contains(code) {
            return Err(ErdError::Query {
                code: code.to_string(),
                message: "decode failure".to_string(),
            });
        }
        self.values
            .get(code)
            .cloned()
            .ok_or_else(|| ErdError::UnknownCode(code.to_string()))
    }

    fn available(&self) -> bool {
        self.available
    }

    fn known_properties(&self) -> Vec<ErdCode> {
        self.values
            .keys()
            .chain(self.broken.iter())
            .cloned()
            .collect()
    }
}

pub fn member(type_name: &str, variant: &str) -> ErdValue {
    ErdValue::Enum(EnumMember {
        type_name: type_name.to_string(),
        variant: variant.to_string(),
    })
}

pub fn appliance_type(variant: &str) -> ErdValue {
    member("ErdApplianceType", variant)
}

pub fn allowables(type_name: &str, flags: &[(&str, bool)]) -> ErdValue {
    ErdValue::Allowables(Allowables {
        type_name: type_name.to_string(),
        flags: flags
            .iter()
            .map(|(name, allowed)| AllowableFlag {
                name: (*name).to_string(),
                allowed: *allowed,
            })
            .collect(),
    })
}

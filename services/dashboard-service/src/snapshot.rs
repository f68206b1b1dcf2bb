use std::collections::{BTreeMap, BTreeSet};

use crate::appliance::Appliance;
use crate::erd::{ErdCode, ErdValue, COMMON_ERDS, DRYER_ERDS, WASHER_ERDS};
use crate::format::{int_field, stringify_value, true_flags, ParsedValue};
use crate::models::{ApplianceKind, ApplianceSnapshot, Control, PropertyValue};

const TEMPERATURE_OPTIONS: &[(&str, &str)] = &[
    ("low_allowed", "Low"),
    ("medium_allowed", "Medium"),
    ("high_allowed", "High"),
    ("noheat_allowed", "No Heat"),
    ("extralow_allowed", "Extra Low"),
];

const DRYNESS_OPTIONS: &[(&str, &str)] = &[
    ("damp_allowed", "Damp"),
    ("lessdry_allowed", "Less Dry"),
    ("dry_allowed", "Dry"),
    ("moredry_allowed", "More Dry"),
    ("extradry_allowed", "Extra Dry"),
];

const ENABLE: &str = "enable_allowed";
const DISABLE: &str = "disable_allowed";

pub fn build_snapshot(appliance: &dyn Appliance) -> ApplianceSnapshot {
    let type_value = appliance.erd_value(&ErdCode::ApplianceType).ok().flatten();
    let type_display = stringify_value(appliance, &ErdCode::ApplianceType, type_value.as_ref());
    let kind = ApplianceKind::classify(&type_display);

    let mut properties = PropertySet::new(appliance);
    let specific: &[ErdCode] = match kind {
        ApplianceKind::Dryer => DRYER_ERDS,
        ApplianceKind::Washer => WASHER_ERDS,
        ApplianceKind::Unknown => &[],
    };
    for code in COMMON_ERDS.iter().chain(specific) {
        properties.collect(code);
    }
    for code in appliance.known_properties() {
        properties.collect(&code);
    }

    let controls = if kind == ApplianceKind::Dryer {
        dryer_controls(&properties)
    } else {
        BTreeMap::new()
    };
    let stats = stats(&properties);
    let remote_enabled = properties.display(&ErdCode::LaundryRemoteStatus) == "True";

    ApplianceSnapshot {
        mac: appliance.mac_addr().to_string(),
        kind,
        type_display,
        available: appliance.available(),
        last_update: crate::models::timestamp(),
        properties: properties.into_values(),
        controls,
        stats,
        remote_enabled,
    }
}

struct PropertySet<'a> {
    appliance: &'a dyn Appliance,
    values: BTreeMap<String, (ErdValue, PropertyValue)>,
}

impl<'a> PropertySet<'a> {
    fn new(appliance: &'a dyn Appliance) -> Self {
        Self {
            appliance,
            values: BTreeMap::new(),
        }
    }

    fn collect(&mut self, code: &ErdCode) {
        if self.values.contains_key(code.name()) {
            return;
        }
        let value = match self.appliance.erd_value(code) {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(err) => {
                tracing::trace!(mac = self.appliance.mac_addr(), error = %err, "property skipped");
                return;
            }
        };

        let parsed = ParsedValue::from_value(&value);
        let property = PropertyValue {
            raw: value.to_string(),
            display: stringify_value(self.appliance, code, Some(&value)),
            details: parsed.as_ref().and_then(ParsedValue::details),
        };
        self.values.insert(code.name().to_string(), (value, property));
    }

    fn get(&self, code: &ErdCode) -> Option<&(ErdValue, PropertyValue)> {
        self.values.get(code.name())
    }

    fn display(&self, code: &ErdCode) -> String {
        self.get(code)
            .map(|(_, property)| property.display.clone())
            .unwrap_or_default()
    }

    fn allowed_flags(&self, code: &ErdCode) -> Option<BTreeSet<String>> {
        let (value, property) = self.get(code)?;
        let flags = match value {
            ErdValue::Allowables(allowables) => allowables
                .flags
                .iter()
                .filter(|flag| flag.allowed)
                .map(|flag| flag.name.clone())
                .collect(),
            _ => true_flags(&property.raw).map(str::to_string).collect(),
        };
        Some(flags)
    }

    fn into_values(self) -> BTreeMap<String, PropertyValue> {
        self.values
            .into_iter()
            .map(|(name, (_, property))| (name, property))
            .collect()
    }
}

fn dryer_controls(properties: &PropertySet<'_>) -> BTreeMap<String, Control> {
    let mut controls = BTreeMap::new();

    let option_controls = [
        (
            "temperature",
            ErdCode::DryerTemperatureOptionAllowables,
            ErdCode::DryerTemperatureOption,
            TEMPERATURE_OPTIONS,
        ),
        (
            "dryness",
            ErdCode::DryerDrynessOptionAllowables,
            ErdCode::DryerDrynessLevel,
            DRYNESS_OPTIONS,
        ),
    ];
    for (name, allowables, setting, table) in option_controls {
        let Some(flags) = properties.allowed_flags(&allowables) else {
            continue;
        };
        let options: Vec<String> = table
            .iter()
            .filter(|(flag, _)| flags.contains(*flag))
            .map(|(_, label)| (*label).to_string())
            .collect();
        if !options.is_empty() {
            controls.insert(
                name.to_string(),
                Control::Options {
                    current: properties.display(&setting),
                    options,
                },
            );
        }
    }

    if let Some(flags) = properties.allowed_flags(&ErdCode::DryerEcoDryOptionAllowables) {
        let (enable, disable) = (flags.contains(ENABLE), flags.contains(DISABLE));
        if enable || disable {
            controls.insert(
                "ecodry".to_string(),
                Control::Toggle {
                    current: properties.display(&ErdCode::DryerEcoDryOptionSelection),
                    can_toggle: enable && disable,
                },
            );
        }
    }

    if let Some(flags) = properties.allowed_flags(&ErdCode::DryerExtendedTumbleOptionAllowables) {
        if flags.contains(ENABLE) {
            controls.insert(
                "extended_tumble".to_string(),
                Control::Available {
                    current: properties.display(&ErdCode::DryerExtendedTumbleOptionSelection),
                    available: true,
                },
            );
        }
    }

    if let Some(flags) = properties.allowed_flags(&ErdCode::DryerDampAlertOptionAllowables) {
        if flags.contains(ENABLE) && flags.contains(DISABLE) {
            controls.insert(
                "damp_alert".to_string(),
                Control::Toggle {
                    current: properties.display(&ErdCode::DryerDampAlertOptionSelection),
                    can_toggle: true,
                },
            );
        }
    }

    controls
}

fn stats(properties: &PropertySet<'_>) -> BTreeMap<String, u64> {
    let mut stats = BTreeMap::new();
    if let Some((value, link)) = properties.get(&ErdCode::WasherLinkData) {
        let cycles = ParsedValue::from_value(value)
            .and_then(|parsed| parsed.cycle_count())
            .or_else(|| int_field::<u64>(&link.raw, "washer_cycle_count"));
        if let Some(cycles) = cycles {
            stats.insert("total_cycles".to_string(), cycles);
        }
    }
    stats
}

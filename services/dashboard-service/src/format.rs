use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::appliance::Appliance;
use crate::erd::{ErdCode, ErdValue};

pub const NOT_AVAILABLE: &str = "N/A";
const PLACEHOLDER: &str = "?";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedValue {
    DispenseTank {
        loads_left: Option<u32>,
        tank_percent: Option<u32>,
    },
    Toggle {
        enabled: bool,
    },
    LoadSizes {
        small: Option<u32>,
        medium: Option<u32>,
        large: Option<u32>,
        extra_large: Option<u32>,
    },
    UsageLink {
        cycle_count: Option<u64>,
        extraction_level: Option<u32>,
        load_size_index: Option<u32>,
        base_cycle: Option<String>,
    },
    Dosage(Option<String>),
    Allowed(Vec<String>),
    RawBytes {
        active: bool,
    },
}

impl ParsedValue {
    pub fn from_value(value: &ErdValue) -> Option<Self> {
        let parsed = match value {
            ErdValue::SmartDispense(tank) => ParsedValue::DispenseTank {
                loads_left: Some(tank.loads_left),
                tank_percent: Some(tank.signal),
            },
            ErdValue::OptionSelection(selection) => ParsedValue::Toggle {
                enabled: selection.enabled,
            },
            ErdValue::SheetUsage(sizes) => ParsedValue::LoadSizes {
                small: Some(sizes.small_load_size),
                medium: Some(sizes.medium_load_size),
                large: Some(sizes.large_load_size),
                extra_large: Some(sizes.extra_large_load_size),
            },
            ErdValue::WasherLink(link) => ParsedValue::UsageLink {
                cycle_count: Some(link.washer_cycle_count),
                extraction_level: Some(link.water_extraction_level_index),
                load_size_index: Some(link.washer_load_size_index),
                base_cycle: Some(link.base_cycle_type.clone()),
            },
            ErdValue::DispenseAdjustability(option) => {
                ParsedValue::Dosage(Some(option.dosage.clone()).filter(|d| !d.is_empty()))
            }
            ErdValue::Allowables(allowables) => ParsedValue::Allowed(
                allowables
                    .flags
                    .iter()
                    .filter(|flag| flag.allowed)
                    .filter_map(|flag| option_label(&flag.name))
                    .collect(),
            ),
            ErdValue::Bytes(bytes) => ParsedValue::RawBytes {
                active: !is_idle_bytes(bytes),
            },
            ErdValue::Text(raw) => return Self::from_text(raw),
            ErdValue::Bool(_) | ErdValue::Int(_) | ErdValue::Enum(_) | ErdValue::Duration(_) => {
                return None
            }
        };
        Some(parsed)
    }

    pub fn from_text(raw: &str) -> Option<Self> {
        // The adjustability signature contains the tank one, so it goes first.
        if raw.contains("ErdSmartDispenseAdjustabilityOption") {
            let dosage = capture(dosage_pattern(), raw).map(str::to_string);
            return Some(ParsedValue::Dosage(dosage));
        }

        if raw.contains("ErdSmartDispense") {
            return Some(ParsedValue::DispenseTank {
                loads_left: int_field(raw, "loads_left"),
                tank_percent: int_field(raw, "signal"),
            });
        }

        if raw.contains("OptionSelection") {
            return Some(ParsedValue::Toggle {
                enabled: raw.contains("ENABLED"),
            });
        }

        if raw.contains("ErdSheetUsageConfiguration") {
            return Some(ParsedValue::LoadSizes {
                small: int_field(raw, "small_load_size"),
                medium: int_field(raw, "medium_load_size"),
                large: int_field(raw, "large_load_size"),
                extra_large: int_field(raw, "extra_large_load_size"),
            });
        }

        if raw.contains("ErdWasherLinkData") {
            return Some(ParsedValue::UsageLink {
                cycle_count: int_field(raw, "washer_cycle_count"),
                extraction_level: int_field(raw, "water_extraction_level_index"),
                load_size_index: int_field(raw, "washer_load_size_index"),
                base_cycle: capture(base_cycle_pattern(), raw).map(str::to_string),
            });
        }

        if raw.contains("Allowables") {
            let options = true_flags(raw).filter_map(option_label).collect();
            return Some(ParsedValue::Allowed(options));
        }

        if raw.starts_with("b'") {
            let idle = raw == "b'\\x00\\x00'" || raw == "b'\\x00'";
            return Some(ParsedValue::RawBytes { active: !idle });
        }

        None
    }

    pub fn display(&self) -> String {
        match self {
            ParsedValue::DispenseTank {
                loads_left,
                tank_percent,
            } => format!(
                "{} loads left ({}%)",
                or_placeholder(loads_left),
                or_placeholder(tank_percent)
            ),
            ParsedValue::Toggle { enabled: true } => "Enabled".to_string(),
            ParsedValue::Toggle { enabled: false } => "Disabled".to_string(),
            ParsedValue::LoadSizes {
                small,
                medium,
                large,
                extra_large,
            } => format!(
                "S:{} M:{} L:{} XL:{}",
                or_placeholder(small),
                or_placeholder(medium),
                or_placeholder(large),
                or_placeholder(extra_large)
            ),
            ParsedValue::UsageLink { cycle_count, .. } => {
                format!("Cycles: {}", or_placeholder(cycle_count))
            }
            ParsedValue::Dosage(dosage) => format!(
                "Dosage: {}",
                dosage.as_deref().map(title_case).unwrap_or_else(|| "Auto".to_string())
            ),
            ParsedValue::Allowed(options) if options.is_empty() => "None".to_string(),
            ParsedValue::Allowed(options) => options.join(", "),
            ParsedValue::RawBytes { active: true } => "Active".to_string(),
            ParsedValue::RawBytes { active: false } => "Inactive".to_string(),
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            ParsedValue::DispenseTank {
                loads_left,
                tank_percent,
            } => Some(json!({
                "loads_left": loads_left.unwrap_or(0),
                "tank_percent": tank_percent.unwrap_or(0),
            })),
            ParsedValue::LoadSizes {
                small,
                medium,
                large,
                extra_large,
            } => Some(json!({
                "small": small.unwrap_or(0),
                "medium": medium.unwrap_or(0),
                "large": large.unwrap_or(0),
                "xl": extra_large.unwrap_or(0),
            })),
            ParsedValue::UsageLink {
                cycle_count,
                extraction_level,
                load_size_index,
                base_cycle,
            } => Some(json!({
                "cycle_count": cycle_count.unwrap_or(0),
                "extraction_level": extraction_level.unwrap_or(0),
                "load_size_index": load_size_index.unwrap_or(0),
                "base_cycle": base_cycle.as_deref().unwrap_or("Unknown"),
            })),
            ParsedValue::Allowed(options) => Some(json!({ "options": options })),
            ParsedValue::Toggle { .. } | ParsedValue::Dosage(_) | ParsedValue::RawBytes { .. } => {
                None
            }
        }
    }

    pub fn cycle_count(&self) -> Option<u64> {
        match self {
            ParsedValue::UsageLink { cycle_count, .. } => *cycle_count,
            _ => None,
        }
    }
}

pub fn stringify_value(appliance: &dyn Appliance, code: &ErdCode, value: Option<&ErdValue>) -> String {
    let Some(value) = value else {
        return NOT_AVAILABLE.to_string();
    };

    if let Some(parsed) = ParsedValue::from_value(value) {
        return parsed.display();
    }

    appliance
        .stringify_erd_value(code, value)
        .filter(|display| !display.is_empty())
        .unwrap_or_else(|| value.to_string())
}

pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_idle_bytes(bytes: &[u8]) -> bool {
    (1..=2).contains(&bytes.len()) && bytes.iter().all(|byte| *byte == 0)
}

fn option_label(flag: &str) -> Option<String> {
    if flag.to_lowercase().contains("raw") {
        return None;
    }
    let name = flag.strip_suffix("_allowed").unwrap_or(flag);
    Some(title_case(name))
}

fn or_placeholder<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn int_field<T: std::str::FromStr>(raw: &str, name: &str) -> Option<T> {
    integer_field_pattern()
        .captures_iter(raw)
        .find(|caps| caps.get(1).map(|m| m.as_str()) == Some(name))
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn true_flags(raw: &str) -> impl Iterator<Item = &str> {
    allowed_pattern()
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
}

fn capture<'a>(pattern: &Regex, raw: &'a str) -> Option<&'a str> {
    pattern
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn integer_field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\w+)=(\d+)").expect("integer field pattern"))
}

fn allowed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\w+)=True").expect("allowed flag pattern"))
}

fn dosage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"dosage=<ErdSmartDispenseDosageType\.(\w+)").expect("dosage pattern")
    })
}

fn base_cycle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"base_cycle_type=<BaseCycleType\.(\w+)").expect("base cycle pattern")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appliance::ErdError;
    use crate::erd::{
        AllowableFlag, Allowables, DispenseAdjustability, EnumMember, OptionSelection,
        SheetUsageConfiguration, SmartDispense, WasherLinkData,
    };

    struct Bare;

    impl Appliance for Bare {
        fn mac_addr(&self) -> &str {
            "00:00:00:00:00:00"
        }

        fn erd_value(&self, code: &ErdCode) -> Result<Option<ErdValue>, ErdError> {
            Err(ErdError::UnknownCode(code.to_string()))
        }

        fn available(&self) -> bool {
            true
        }

        fn known_properties(&self) -> Vec<ErdCode> {
            Vec::new()
        }
    }

    struct Mute;

    impl Appliance for Mute {
        fn mac_addr(&self) -> &str {
            "00:00:00:00:00:01"
        }

        fn erd_value(&self, _code: &ErdCode) -> Result<Option<ErdValue>, ErdError> {
            Ok(None)
        }

        fn available(&self) -> bool {
            true
        }

        fn known_properties(&self) -> Vec<ErdCode> {
            Vec::new()
        }

        fn stringify_erd_value(&self, _code: &ErdCode, _value: &ErdValue) -> Option<String> {
            Some(String::new())
        }
    }

    fn show(value: ErdValue) -> String {
        stringify_value(&Bare, &ErdCode::Raw("0x0000".to_string()), Some(&value))
    }

    fn show_text(raw: &str) -> String {
        show(ErdValue::Text(raw.to_string()))
    }

    #[test]
    fn absent_is_not_available_for_any_code() {
        assert_eq!(stringify_value(&Bare, &ErdCode::LaundryDoor, None), "N/A");
        assert_eq!(stringify_value(&Bare, &ErdCode::ApplianceType, None), "N/A");
    }

    #[test]
    fn dispense_tank() {
        let typed = show(ErdValue::SmartDispense(SmartDispense {
            loads_left: 62,
            signal: 80,
        }));
        assert_eq!(typed, "62 loads left (80%)");
        assert_eq!(
            show_text("ErdSmartDispense(loads_left=62, signal=80)"),
            "62 loads left (80%)"
        );
        assert_eq!(show_text("ErdSmartDispense(signal=80)"), "? loads left (80%)");
    }

    #[test]
    fn dispense_tank_details_default_to_zero() {
        let parsed = ParsedValue::from_text("ErdSmartDispense(loads_left=7)").expect("parsed");
        assert_eq!(
            parsed.details(),
            Some(json!({ "loads_left": 7, "tank_percent": 0 }))
        );
    }

    #[test]
    fn toggles() {
        let enabled = show(ErdValue::OptionSelection(OptionSelection {
            type_name: "ErdEcoDryOptionSelection".to_string(),
            enabled: true,
        }));
        assert_eq!(enabled, "Enabled");
        assert_eq!(show_text("ErdEcoDryOptionSelection.ENABLED"), "Enabled");
        assert_eq!(show_text("ErdEcoDryOptionSelection.DISABLED"), "Disabled");
    }

    #[test]
    fn load_sizes() {
        let typed = show(ErdValue::SheetUsage(SheetUsageConfiguration {
            small_load_size: 1,
            medium_load_size: 2,
            large_load_size: 3,
            extra_large_load_size: 4,
        }));
        assert_eq!(typed, "S:1 M:2 L:3 XL:4");
        assert_eq!(
            show_text("ErdSheetUsageConfiguration(small_load_size=1, large_load_size=3)"),
            "S:1 M:? L:3 XL:?"
        );
    }

    #[test]
    fn usage_link() {
        let value = ErdValue::WasherLink(WasherLinkData {
            washer_cycle_count: 412,
            water_extraction_level_index: 2,
            washer_load_size_index: 3,
            base_cycle_type: "COTTONS".to_string(),
        });
        assert_eq!(show(value.clone()), "Cycles: 412");

        let reparsed = ParsedValue::from_text(&value.to_string()).expect("parsed");
        assert_eq!(reparsed.cycle_count(), Some(412));
        assert_eq!(
            reparsed.details(),
            Some(json!({
                "cycle_count": 412,
                "extraction_level": 2,
                "load_size_index": 3,
                "base_cycle": "COTTONS",
            }))
        );
        assert_eq!(show_text("ErdWasherLinkData()"), "Cycles: ?");
    }

    #[test]
    fn dosage() {
        let typed = show(ErdValue::DispenseAdjustability(DispenseAdjustability {
            dosage: "EXTRA_LOW".to_string(),
        }));
        assert_eq!(typed, "Dosage: Extra Low");
        assert_eq!(
            show_text(
                "ErdSmartDispenseAdjustabilityOption(dosage=<ErdSmartDispenseDosageType.HIGH: 3>)"
            ),
            "Dosage: High"
        );
        assert_eq!(
            show_text("ErdSmartDispenseAdjustabilityOption()"),
            "Dosage: Auto"
        );
    }

    #[test]
    fn allowables() {
        let typed = show(ErdValue::Allowables(Allowables {
            type_name: "ErdDryerTemperatureOptionAllowables".to_string(),
            flags: vec![
                AllowableFlag {
                    name: "extralow_allowed".to_string(),
                    allowed: true,
                },
                AllowableFlag {
                    name: "medium_allowed".to_string(),
                    allowed: false,
                },
                AllowableFlag {
                    name: "no_heat_allowed".to_string(),
                    allowed: true,
                },
            ],
        }));
        // Labels drop the `_allowed` suffix: "Extralow", not "Extralow Allowed".
        assert_eq!(typed, "Extralow, No Heat");
        assert_eq!(
            show_text("ErdDrynessAllowables(damp_allowed=True, dry_allowed=False, raw_value=True)"),
            "Damp"
        );
        assert_eq!(show_text("ErdDrynessAllowables(damp_allowed=False)"), "None");
    }

    #[test]
    fn raw_bytes() {
        assert_eq!(show(ErdValue::Bytes(vec![0, 0])), "Inactive");
        assert_eq!(show(ErdValue::Bytes(vec![0])), "Inactive");
        assert_eq!(show(ErdValue::Bytes(vec![0, 1])), "Active");
        assert_eq!(show(ErdValue::Bytes(vec![0, 0, 0])), "Active");
        assert_eq!(show_text("b'\\x00\\x00'"), "Inactive");
        assert_eq!(show_text("b'\\x01\\x00'"), "Active");
    }

    #[test]
    fn unknown_shapes_use_vendor_stringify() {
        let member = ErdValue::Enum(EnumMember {
            type_name: "ErdMachineState".to_string(),
            variant: "DELAY_RUN".to_string(),
        });
        assert_eq!(show(member), "Delay Run");
        assert_eq!(show(ErdValue::Bool(true)), "True");
        assert_eq!(show_text("GFW850SPNRS"), "GFW850SPNRS");
    }

    #[test]
    fn empty_vendor_stringify_falls_back_to_raw() {
        let value = ErdValue::Duration(600);
        assert_eq!(
            stringify_value(&Mute, &ErdCode::LaundryTimeRemaining, Some(&value)),
            "0:10:00"
        );
    }

    #[test]
    fn title_case_handles_separators() {
        assert_eq!(title_case("ELECTRIC_DRYER"), "Electric Dryer");
        assert_eq!(title_case("more dry"), "More Dry");
        assert_eq!(title_case(""), "");
    }
}

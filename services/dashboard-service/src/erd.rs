use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! erd_codes {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ErdCode {
            $($variant,)+
            Raw(String),
        }

        impl ErdCode {
            pub fn name(&self) -> &str {
                match self {
                    $(ErdCode::$variant => $name,)+
                    ErdCode::Raw(id) => id.as_str(),
                }
            }

            pub fn from_name(name: &str) -> Self {
                match name {
                    $($name => ErdCode::$variant,)+
                    other => ErdCode::Raw(other.to_string()),
                }
            }
        }
    };
}

erd_codes! {
    ModelNumber => "MODEL_NUMBER",
    SerialNumber => "SERIAL_NUMBER",
    ApplianceType => "APPLIANCE_TYPE",
    LaundryMachineState => "LAUNDRY_MACHINE_STATE",
    LaundrySubCycle => "LAUNDRY_SUB_CYCLE",
    LaundryCycle => "LAUNDRY_CYCLE",
    LaundryTimeRemaining => "LAUNDRY_TIME_REMAINING",
    LaundryDoor => "LAUNDRY_DOOR",
    LaundryRemoteStatus => "LAUNDRY_REMOTE_STATUS",

    WasherSoilLevel => "LAUNDRY_WASHER_SOIL_LEVEL",
    WasherWashTempLevel => "LAUNDRY_WASHER_WASHTEMP_LEVEL",
    WasherRinseOption => "LAUNDRY_WASHER_RINSE_OPTION",
    WasherSpinTimeLevel => "LAUNDRY_WASHER_SPINTIME_LEVEL",
    WasherTankStatus => "LAUNDRY_WASHER_TANK_STATUS",
    WasherTankSelected => "LAUNDRY_WASHER_TANK_SELECTED",
    WasherSmartDispense => "LAUNDRY_WASHER_SMART_DISPENSE",
    WasherSmartDispenseTankStatus => "LAUNDRY_WASHER_SMART_DISPENSE_TANK_STATUS",
    WasherSmartDispenseAdjustabilityOption => "LAUNDRY_WASHER_SMART_DISPENSE_ADJUSTABILITY_OPTION",
    WasherLinkData => "LAUNDRY_WASHER_LINK_DATA",
    WasherDoorLock => "LAUNDRY_WASHER_DOOR_LOCK",
    WasherPowerSteam => "LAUNDRY_WASHER_POWERSTEAM",
    WasherPrewash => "LAUNDRY_WASHER_PREWASH",
    WasherTimeSaver => "LAUNDRY_WASHER_TIMESAVER",

    DryerTemperatureOption => "LAUNDRY_DRYER_TEMPERATURENEW_OPTION",
    DryerDrynessLevel => "LAUNDRY_DRYER_DRYNESSNEW_LEVEL",
    DryerEcoDryOptionSelection => "LAUNDRY_DRYER_ECODRY_OPTION_SELECTION",
    DryerExtendedTumbleOptionSelection => "LAUNDRY_DRYER_EXTENDED_TUMBLE_OPTION_SELECTION",
    DryerSheetInventory => "LAUNDRY_DRYER_SHEET_INVENTORY",
    DryerWasherLinkStatus => "LAUNDRY_DRYER_WASHERLINK_STATUS",
    DryerDampAlertStatus => "LAUNDRY_DRYER_DAMP_ALERT_STATUS",
    DryerDampAlertOptionSelection => "LAUNDRY_DRYER_DAMP_ALERT_OPTION_SELECTION",
    DryerTemperatureOptionAllowables => "LAUNDRY_DRYER_TEMPERATURE_OPTION_ALLOWABLES",
    DryerDrynessOptionAllowables => "LAUNDRY_DRYER_DRYNESS_OPTION_ALLOWABLES",
    DryerEcoDryOptionAllowables => "LAUNDRY_DRYER_ECODRY_OPTION_ALLOWABLES",
    DryerExtendedTumbleOptionAllowables => "LAUNDRY_DRYER_EXTENDED_TUMBLE_OPTION_ALLOWABLES",
    DryerDampAlertOptionAllowables => "LAUNDRY_DRYER_DAMP_ALERT_OPTION_ALLOWABLES",
    DryerSheetUsageConfiguration => "LAUNDRY_DRYER_SHEET_USAGE_CONFIGURATION",
    DryerWasherLinkControl => "LAUNDRY_DRYER_WASHERLINK_CONTROL",
    DryerRecommendedWasherLinkCycle => "LAUNDRY_DRYER_RECOMMENDED_WASHERLINK_CYCLE",
    DryerBlockedVentFault => "LAUNDRY_DRYER_BLOCKED_VENT_FAULT",
}

impl From<String> for ErdCode {
    fn from(name: String) -> Self {
        ErdCode::from_name(&name)
    }
}

impl From<ErdCode> for String {
    fn from(code: ErdCode) -> Self {
        code.name().to_string()
    }
}

impl fmt::Display for ErdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const COMMON_ERDS: &[ErdCode] = &[
    ErdCode::ModelNumber,
    ErdCode::SerialNumber,
    ErdCode::ApplianceType,
    ErdCode::LaundryMachineState,
    ErdCode::LaundrySubCycle,
    ErdCode::LaundryCycle,
    ErdCode::LaundryTimeRemaining,
    ErdCode::LaundryDoor,
    ErdCode::LaundryRemoteStatus,
];

pub const WASHER_ERDS: &[ErdCode] = &[
    ErdCode::WasherSoilLevel,
    ErdCode::WasherWashTempLevel,
    ErdCode::WasherRinseOption,
    ErdCode::WasherSpinTimeLevel,
    ErdCode::WasherTankStatus,
    ErdCode::WasherTankSelected,
    ErdCode::WasherSmartDispense,
    ErdCode::WasherSmartDispenseTankStatus,
    ErdCode::WasherSmartDispenseAdjustabilityOption,
    ErdCode::WasherLinkData,
    ErdCode::WasherDoorLock,
    ErdCode::WasherPowerSteam,
    ErdCode::WasherPrewash,
    ErdCode::WasherTimeSaver,
];

pub const DRYER_ERDS: &[ErdCode] = &[
    ErdCode::DryerTemperatureOption,
    ErdCode::DryerDrynessLevel,
    ErdCode::DryerEcoDryOptionSelection,
    ErdCode::DryerExtendedTumbleOptionSelection,
    ErdCode::DryerSheetInventory,
    ErdCode::DryerWasherLinkStatus,
    ErdCode::DryerDampAlertStatus,
    // Allowables: what the dryer currently lets a user change.
    ErdCode::DryerTemperatureOptionAllowables,
    ErdCode::DryerDrynessOptionAllowables,
    ErdCode::DryerEcoDryOptionAllowables,
    ErdCode::DryerExtendedTumbleOptionAllowables,
    ErdCode::DryerDampAlertOptionAllowables,
    ErdCode::DryerSheetUsageConfiguration,
    ErdCode::DryerWasherLinkControl,
    ErdCode::DryerRecommendedWasherLinkCycle,
    ErdCode::DryerBlockedVentFault,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub type_name: String,
    pub variant: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartDispense {
    pub loads_left: u32,
    pub signal: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub type_name: String,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetUsageConfiguration {
    pub small_load_size: u32,
    pub medium_load_size: u32,
    pub large_load_size: u32,
    pub extra_large_load_size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasherLinkData {
    pub washer_cycle_count: u64,
    pub water_extraction_level_index: u32,
    pub washer_load_size_index: u32,
    pub base_cycle_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseAdjustability {
    pub dosage: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowableFlag {
    pub name: String,
    pub allowed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowables {
    pub type_name: String,
    pub flags: Vec<AllowableFlag>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ErdValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Enum(EnumMember),
    // Seconds.
    Duration(u64),
    Bytes(Vec<u8>),
    SmartDispense(SmartDispense),
    OptionSelection(OptionSelection),
    SheetUsage(SheetUsageConfiguration),
    WasherLink(WasherLinkData),
    DispenseAdjustability(DispenseAdjustability),
    Allowables(Allowables),
}

impl fmt::Display for ErdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErdValue::Bool(true) => f.write_str("True"),
            ErdValue::Bool(false) => f.write_str("False"),
            ErdValue::Int(value) => write!(f, "{value}"),
            ErdValue::Text(value) => f.write_str(value),
            ErdValue::Enum(member) => write!(f, "{}.{}", member.type_name, member.variant),
            ErdValue::Duration(seconds) => write!(
                f,
                "{}:{:02}:{:02}",
                seconds / 3600,
                (seconds % 3600) / 60,
                seconds % 60
            ),
            ErdValue::Bytes(bytes) => {
                f.write_str("b'")?;
                for byte in bytes {
                    write!(f, "\\x{byte:02x}")?;
                }
                f.write_str("'")
            }
            ErdValue::SmartDispense(tank) => write!(
                f,
                "ErdSmartDispense(loads_left={}, signal={})",
                tank.loads_left, tank.signal
            ),
            ErdValue::OptionSelection(selection) => write!(
                f,
                "{}.{}",
                selection.type_name,
                if selection.enabled { "ENABLED" } else { "DISABLED" }
            ),
            ErdValue::SheetUsage(sizes) => write!(
                f,
                "ErdSheetUsageConfiguration(small_load_size={}, medium_load_size={}, large_load_size={}, extra_large_load_size={})",
                sizes.small_load_size,
                sizes.medium_load_size,
                sizes.large_load_size,
                sizes.extra_large_load_size
            ),
            ErdValue::WasherLink(link) => write!(
                f,
                "ErdWasherLinkData(washer_cycle_count={}, water_extraction_level_index={}, washer_load_size_index={}, base_cycle_type=<BaseCycleType.{}>)",
                link.washer_cycle_count,
                link.water_extraction_level_index,
                link.washer_load_size_index,
                link.base_cycle_type
            ),
            ErdValue::DispenseAdjustability(option) => write!(
                f,
                "ErdSmartDispenseAdjustabilityOption(dosage=<ErdSmartDispenseDosageType.{}>)",
                option.dosage
            ),
            ErdValue::Allowables(allowables) => {
                write!(f, "{}(", allowables.type_name)?;
                for (index, flag) in allowables.flags.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    let allowed = if flag.allowed { "True" } else { "False" };
                    write!(f, "{}={allowed}", flag.name)?;
                }
                f.write_str(")")
            }
        }
    }
}

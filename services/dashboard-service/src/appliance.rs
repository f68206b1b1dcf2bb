use thiserror::Error;

use crate::erd::{ErdCode, ErdValue};
use crate::format::title_case;

#[derive(Debug, Error)]
pub enum ErdError {
    #[error("code {0} is not known to this appliance")]
    UnknownCode(String),
    #[error("query for {code} failed: {message}")]
    Query { code: String, message: String },
}

pub trait Appliance: Send + Sync {
    fn mac_addr(&self) -> &str;

    /// `Ok(None)` means the code is known but currently has no value.
    fn erd_value(&self, code: &ErdCode) -> Result<Option<ErdValue>, ErdError>;

    fn available(&self) -> bool;

    fn known_properties(&self) -> Vec<ErdCode>;

    fn stringify_erd_value(&self, _code: &ErdCode, value: &ErdValue) -> Option<String> {
        match value {
            ErdValue::Enum(member) => Some(title_case(&member.variant)),
            other => Some(other.to_string()),
        }
    }
}

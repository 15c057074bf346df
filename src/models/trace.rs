use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

////////////////////////////////////// RPC Data ////////////////////////////////////////
// Raw `callTracer` frame, quantities still hex encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCall {
    #[serde(rename = "type")]
    pub r#type: String,
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub gas: String,
    pub gas_used: String,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<RawLog>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<RawCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/////////////////////////////////// Normalized Data ///////////////////////////////////
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    Call,
    StaticCall,
    DelegateCall,
    CallCode,
    Create,
    Create2,
    SelfDestruct,
    Other(String),
}

impl CallKind {
    pub fn from_tracer_type(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "CALL" => Self::Call,
            "STATICCALL" => Self::StaticCall,
            "DELEGATECALL" => Self::DelegateCall,
            "CALLCODE" => Self::CallCode,
            "CREATE" => Self::Create,
            "CREATE2" => Self::Create2,
            "SELFDESTRUCT" => Self::SelfDestruct,
            _ => Self::Other(value.to_string()),
        }
    }

    /// True for both deployment opcodes.
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create | Self::Create2)
    }

    /// Lowercase label rendered after a message call, `None` for kinds without one.
    pub fn call_label(&self) -> Option<&'static str> {
        match self {
            Self::Call => Some("call"),
            Self::StaticCall => Some("staticcall"),
            Self::DelegateCall => Some("delegatecall"),
            Self::CallCode => Some("callcode"),
            Self::Create | Self::Create2 | Self::SelfDestruct | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => f.write_str("CALL"),
            Self::StaticCall => f.write_str("STATICCALL"),
            Self::DelegateCall => f.write_str("DELEGATECALL"),
            Self::CallCode => f.write_str("CALLCODE"),
            Self::Create => f.write_str("CREATE"),
            Self::Create2 => f.write_str("CREATE2"),
            Self::SelfDestruct => f.write_str("SELFDESTRUCT"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

// Normalized call frame: quantities parsed, shape identical to the raw frame
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: CallKind,
    pub from: Address,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub gas: U256,
    pub gas_used: U256,
    pub input: Bytes,
    pub output: Option<Bytes>,
    pub error: Option<String>,
    pub revert_reason: Option<String>,
    pub logs: Vec<Log>,
    pub calls: Vec<Call>,
}

impl Call {
    pub fn is_reverted(&self) -> bool {
        self.error.is_some()
    }

    /// Output bytes, treating an empty `0x` the same as an absent field.
    pub fn output_data(&self) -> Option<&Bytes> {
        self.output.as_ref().filter(|output| !output.is_empty())
    }

    /// Moves a non-zero native value.
    pub fn transfers_value(&self) -> bool {
        self.value.is_some_and(|value| !value.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub position: Option<U256>,
}

use alloy_json_abi::{Constructor, Error as AbiError, Event, Function, JsonAbi};
use alloy_primitives::{Address, B256, Bytes, Selector, hex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

////////////////////////////////////// Artifacts ///////////////////////////////////////
// Compiler output for one locally built contract (`out/<File>.sol/<Contract>.json`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub abi: JsonAbi,
    #[serde(default)]
    pub deployed_bytecode: Option<BytecodeObject>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(skip)]
    pub artifact_name: String,
}

impl Artifact {
    /// Runtime bytecode, `None` when absent or still carrying link placeholders.
    pub fn deployed_code(&self) -> Option<Bytes> {
        self.deployed_bytecode.as_ref().and_then(BytecodeObject::to_bytes)
    }

    /// Contract name from the compilation target, falling back to the artifact file name.
    pub fn contract_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(Metadata::target_name)
            .map(str::to_string)
            .unwrap_or_else(|| self.artifact_name.clone())
    }
}

// Foundry nests the hex under `object`, Hardhat stores it directly
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BytecodeObject {
    Object { object: String },
    Hex(String),
}

impl BytecodeObject {
    pub fn to_bytes(&self) -> Option<Bytes> {
        let raw = match self {
            Self::Object { object } => object,
            Self::Hex(hex) => hex,
        };
        hex::decode(raw).ok().map(Bytes::from)
    }
}

/////////////////////////////////// Solc Metadata ////////////////////////////////////
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub compiler: CompilerMetadata,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub settings: MetadataSettings,
    #[serde(default)]
    pub sources: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub output: Option<MetadataOutput>,
}

impl Metadata {
    pub fn target_name(&self) -> Option<&str> {
        self.settings
            .compilation_target
            .values()
            .next()
            .map(String::as_str)
    }

    pub fn info(&self) -> ContractInfo {
        ContractInfo {
            compiler_version: self.compiler.version.clone(),
            evm_version: self.settings.evm_version.clone(),
            optimizer: self.settings.optimizer.clone(),
            language: self.language.clone(),
        }
    }

    pub fn abi(&self) -> JsonAbi {
        self.output
            .as_ref()
            .map(|output| output.abi.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilerMetadata {
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSettings {
    #[serde(default)]
    pub evm_version: Option<String>,
    #[serde(default)]
    pub optimizer: Option<OptimizerSettings>,
    #[serde(default)]
    pub compilation_target: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub runs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataOutput {
    #[serde(default)]
    pub abi: JsonAbi,
}

////////////////////////////////////// Contracts ///////////////////////////////////////
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    LocalExact,
    RemotePerfect,
    RemotePartial,
    Unknown,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalExact => "local-exact",
            Self::RemotePerfect => "remote-perfect",
            Self::RemotePartial => "remote-partial",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSource {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractInfo {
    pub compiler_version: String,
    pub evm_version: Option<String>,
    pub optimizer: Option<OptimizerSettings>,
    pub language: Option<String>,
}

/// Resolved interface for one address.
///
/// Built once per address and shared read-only by every call that targets it. Lookups
/// go through an [`AbiIndex`] computed at construction.
#[derive(Debug, Clone)]
pub struct Contract {
    pub address: Address,
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    pub sources: Vec<ContractSource>,
    pub info: Option<ContractInfo>,
    pub provenance: MatchKind,
    index: AbiIndex,
}

impl Contract {
    pub fn new(
        address: Address,
        name: impl Into<String>,
        abi: JsonAbi,
        bytecode: Bytes,
        provenance: MatchKind,
    ) -> Self {
        let index = AbiIndex::new(&abi);
        Self {
            address,
            name: name.into(),
            abi,
            bytecode,
            sources: Vec::new(),
            info: None,
            provenance,
            index,
        }
    }

    /// Stub for an address nothing could identify. Every decode against it falls back to raw hex.
    pub fn unknown(address: Address, bytecode: Bytes) -> Self {
        Self::new(
            address,
            address.to_string(),
            JsonAbi::default(),
            bytecode,
            MatchKind::Unknown,
        )
    }

    pub fn with_sources(mut self, sources: Vec<ContractSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_info(mut self, info: ContractInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.provenance == MatchKind::Unknown
    }

    pub fn function(&self, selector: &Selector) -> Option<&Function> {
        self.index.functions.get(selector)
    }

    pub fn error(&self, selector: &Selector) -> Option<&AbiError> {
        self.index.errors.get(selector)
    }

    /// Event whose signature hash is `topic` and whose indexed parameter count matches.
    pub fn event(&self, topic: &B256, indexed: usize) -> Option<&Event> {
        self.index.events.get(topic).and_then(|candidates| {
            candidates
                .iter()
                .find(|event| event.inputs.iter().filter(|input| input.indexed).count() == indexed)
        })
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor.as_ref()
    }

    pub fn has_receive(&self) -> bool {
        self.abi.receive.is_some()
    }

    pub fn has_fallback(&self) -> bool {
        self.abi.fallback.is_some()
    }
}

// Selector keyed views over a contract ABI
#[derive(Debug, Clone, Default)]
struct AbiIndex {
    functions: HashMap<Selector, Function>,
    events: HashMap<B256, Vec<Event>>,
    errors: HashMap<Selector, AbiError>,
}

impl AbiIndex {
    fn new(abi: &JsonAbi) -> Self {
        let mut index = Self::default();
        for function in abi.functions() {
            index
                .functions
                .entry(function.selector())
                .or_insert_with(|| function.clone());
        }
        // Anonymous events carry no signature topic
        for event in abi.events().filter(|event| !event.anonymous) {
            index
                .events
                .entry(event.selector())
                .or_default()
                .push(event.clone());
        }
        for error in abi.errors() {
            index
                .errors
                .entry(error.selector())
                .or_insert_with(|| error.clone());
        }
        index
    }
}

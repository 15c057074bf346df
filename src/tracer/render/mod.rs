pub mod revert;
pub mod values;

use alloy_dyn_abi::{DecodedEvent, DynSolValue, EventExt, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Event, Function};
use alloy_primitives::{Address, LogData, Selector, U256, hex};
use colored::Colorize;
use std::collections::HashMap;
use tracing::debug;

use crate::models::contract::Contract;
use crate::models::errors::{DecodeError, RenderError};
use crate::models::trace::{Call, CallKind, Log};
use revert::format_revert;
use values::{format_event_param, format_params};

const ITEM: &str = " ├─ ";
const LAST: &str = " └─ ";
const NEST: &str = " │  ";

/// ANSI styling, disabled for plain output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub const fn plain() -> Self {
        Self { color: false }
    }

    pub const fn colored() -> Self {
        Self { color: true }
    }

    pub fn ty(self, text: &str) -> String {
        if self.color { text.cyan().to_string() } else { text.to_string() }
    }

    pub fn name(self, text: &str) -> String {
        if self.color { text.magenta().to_string() } else { text.to_string() }
    }

    pub fn ok(self, text: &str) -> String {
        if self.color { text.green().to_string() } else { text.to_string() }
    }

    pub fn fail(self, text: &str) -> String {
        if self.color { text.red().to_string() } else { text.to_string() }
    }

    pub fn kind(self, text: &str) -> String {
        if self.color { text.yellow().to_string() } else { text.to_string() }
    }
}

enum Item<'t> {
    Log(&'t Log),
    Call(&'t Call),
}

/// Renders a normalized call tree against the resolved contracts.
///
/// Decode failures degrade to raw hex for the affected value. A call whose target was never
/// resolved renders an error line in place of its subtree.
pub struct TraceRenderer<'a> {
    contracts: &'a HashMap<Address, Contract>,
    style: Style,
}

impl<'a> TraceRenderer<'a> {
    pub fn new(contracts: &'a HashMap<Address, Contract>) -> Self {
        Self {
            contracts,
            style: Style::plain(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.style = if color { Style::colored() } else { Style::plain() };
        self
    }

    pub fn render(&self, root: &Call) -> String {
        let mut lines = Vec::new();
        self.render_call(root, "", "", &mut lines);
        lines.join("\n")
    }

    fn render_call(&self, call: &Call, lead: &str, prefix: &str, lines: &mut Vec<String>) {
        // Unresolved target: mark the line and skip the subtree
        let target = match self.target(call) {
            Ok(target) => target,
            Err(e) => {
                lines.push(format!("{lead}{}", self.style.fail(&format!("Error: {e}"))));
                return;
            }
        };

        // Callee ABI first, then the implementation it forwards to
        let mut candidates: Vec<&Contract> = target.into_iter().collect();
        if !call.kind.is_create() {
            if let Some(implementation) = self.forwarded_to(call, target) {
                candidates.push(implementation);
            }
        }

        let (header, function) = if call.kind.is_create() {
            (self.create_header(call, target), None)
        } else {
            self.call_header(call, target, &candidates)
        };
        lines.push(format!("{lead}[{}] {}", call.gas_used, header));

        // Logs and child calls share one level under the header
        let item_lead = format!("{prefix}{ITEM}");
        let child_prefix = format!("{prefix}{NEST}");
        for item in interleave(call) {
            match item {
                Item::Log(log) => {
                    lines.push(format!("{item_lead}{}", self.format_log(log, &candidates)))
                }
                Item::Call(child) => self.render_call(child, &item_lead, &child_prefix, lines),
            }
        }

        lines.push(format!(
            "{prefix}{LAST}{}",
            self.exit_line(call, function, &candidates)
        ));
    }

    fn target(&self, call: &Call) -> Result<Option<&'a Contract>, RenderError> {
        match call.to {
            Some(address) => self
                .contracts
                .get(&address)
                .map(Some)
                .ok_or(RenderError::MissingContract { address }),
            None => Ok(None),
        }
    }

    // A proxy that does not know the selector and delegates the same calldata
    fn forwarded_to(&self, call: &Call, target: Option<&Contract>) -> Option<&'a Contract> {
        let selector = selector_of(&call.input)?;
        if target.is_some_and(|contract| contract.function(&selector).is_some()) {
            return None;
        }
        call.calls
            .iter()
            .filter(|child| child.kind == CallKind::DelegateCall && child.input == call.input)
            .find_map(|child| child.to.and_then(|to| self.contracts.get(&to)))
    }

    fn create_header(&self, call: &Call, target: Option<&Contract>) -> String {
        let new = self.style.kind("→ new");
        match target {
            // `to` is the address being deployed
            Some(contract) => format!(
                "{} {}({})@{}",
                new,
                contract.name,
                self.constructor_args(&call.input, contract),
                contract.address
            ),
            None => format!("{new} <unknown>()"),
        }
    }

    fn constructor_args(&self, input: &[u8], contract: &Contract) -> String {
        let Some(args) = constructor_arg_bytes(&contract.bytecode, input).filter(|args| !args.is_empty())
        else {
            return String::new();
        };

        let decoded = contract
            .constructor()
            .ok_or(DecodeError::MissingConstructor)
            .and_then(|constructor| Ok((constructor, constructor.abi_decode_input(args)?)));
        match decoded {
            Ok((constructor, values)) => format_params(&constructor.inputs, &values, self.style),
            Err(DecodeError::MissingConstructor) => String::new(),
            Err(e) => {
                debug!("Constructor arguments of {} not decoded: {}", contract.address, e);
                hex::encode_prefixed(args)
            }
        }
    }

    fn call_header<'c>(
        &self,
        call: &Call,
        target: Option<&Contract>,
        candidates: &[&'c Contract],
    ) -> (String, Option<&'c Function>) {
        let (function_name, args, function) = match decode_function(&call.input, candidates) {
            Ok((function, values)) => (
                function.name.clone(),
                format_params(&function.inputs, &values, self.style),
                Some(function),
            ),
            Err(DecodeError::EmptyCalldata { .. }) => {
                (fallback_name(&call.input, candidates), String::new(), None)
            }
            Err(e) => {
                debug!("Calldata to {:?} not decoded: {}", call.to, e);
                (hex::encode_prefixed(&call.input[..4]), String::new(), None)
            }
        };

        let paint = |text: &str| {
            if call.is_reverted() {
                self.style.fail(text)
            } else {
                self.style.ok(text)
            }
        };
        let name = target.map_or("<unknown>", |contract| contract.name.as_str());
        let mut header = format!("{}::{}({})", paint(name), paint(&function_name), args);

        if call.transfers_value() {
            header.push_str(&format!(" {{value: {}}}", call.value.unwrap_or_default()));
        }
        if let Some(label) = call.kind.call_label() {
            header.push_str(&format!(" {}", self.style.kind(&format!("[{label}]"))));
        }
        (header, function)
    }

    fn format_log(&self, log: &Log, candidates: &[&Contract]) -> String {
        // Delegatecall frames emit from the caller's address
        let mut sources = candidates.to_vec();
        if let Some(emitter) = self.contracts.get(&log.address) {
            if !sources.iter().any(|contract| contract.address == emitter.address) {
                sources.push(emitter);
            }
        }

        match decode_event(log, &sources) {
            Ok((event, decoded)) => {
                let mut indexed = decoded.indexed.iter();
                let mut body = decoded.body.iter();
                let params: Vec<String> = event
                    .inputs
                    .iter()
                    .filter_map(|input| {
                        let value = if input.indexed {
                            indexed.next()
                        } else {
                            body.next()
                        }?;
                        Some(format_event_param(input, value, self.style))
                    })
                    .collect();
                format!("emit {}({})", event.name, params.join(", "))
            }
            Err(e) => {
                debug!("Log of {} not decoded: {}", log.address, e);
                format_raw_log(log)
            }
        }
    }

    fn exit_line(&self, call: &Call, function: Option<&Function>, candidates: &[&Contract]) -> String {
        if let Some(error) = &call.error {
            // Revert data first, then the node's decoded reason, then the raw error text
            let reason = match (call.output_data(), &call.revert_reason) {
                (Some(output), _) => format_revert(output, candidates, self.style),
                (None, Some(reason)) => format!("Error: \"{reason}\""),
                (None, None) => error.clone(),
            };
            return format!("{} {}", self.style.fail("← [Revert]"), reason);
        }

        let Some(output) = call.output_data() else {
            return self.style.ok("← [Stop]");
        };
        let returned = self.style.ok("← [Return]");
        if call.kind.is_create() {
            return format!("{} {} bytes of code", returned, output.len());
        }

        let values = match function {
            Some(function) if !function.outputs.is_empty() => {
                match function.abi_decode_output(output) {
                    Ok(values) => format_params(&function.outputs, &values, self.style),
                    Err(e) => {
                        debug!("Return data of {} not decoded: {}", function.name, e);
                        hex::encode_prefixed(output)
                    }
                }
            }
            _ => hex::encode_prefixed(output),
        };
        format!("{returned} {values}")
    }
}

// Logs carry the number of child calls made before them; unpositioned logs go last
fn interleave(call: &Call) -> Vec<Item<'_>> {
    let mut items = Vec::with_capacity(call.logs.len() + call.calls.len());
    let mut logs = call.logs.iter().peekable();
    for (index, child) in call.calls.iter().enumerate() {
        let index = U256::from(index);
        while let Some(log) = logs.next_if(|log| log.position.is_some_and(|position| position <= index)) {
            items.push(Item::Log(log));
        }
        items.push(Item::Call(child));
    }
    items.extend(logs.map(Item::Log));
    items
}

fn selector_of(input: &[u8]) -> Option<Selector> {
    (input.len() >= 4).then(|| Selector::from_slice(&input[..4]))
}

fn decode_function<'c>(
    input: &[u8],
    candidates: &[&'c Contract],
) -> Result<(&'c Function, Vec<DynSolValue>), DecodeError> {
    let selector = selector_of(input).ok_or(DecodeError::EmptyCalldata { len: input.len() })?;
    let function = candidates
        .iter()
        .find_map(|contract| contract.function(&selector))
        .ok_or(DecodeError::UnknownSelector { selector })?;
    let values = function.abi_decode_input(&input[4..])?;
    Ok((function, values))
}

// Calldata too short for a selector
fn fallback_name(input: &[u8], candidates: &[&Contract]) -> String {
    if input.is_empty() && candidates.iter().any(|contract| contract.has_receive()) {
        "receive".to_string()
    } else if candidates.iter().any(|contract| contract.has_fallback()) {
        "fallback".to_string()
    } else {
        hex::encode_prefixed(input)
    }
}

fn decode_event<'c>(
    log: &Log,
    sources: &[&'c Contract],
) -> Result<(&'c Event, DecodedEvent), DecodeError> {
    let topic = log.topics.first().ok_or(DecodeError::AnonymousLog)?;
    let indexed = log.topics.len() - 1;
    let event = sources
        .iter()
        .find_map(|contract| contract.event(topic, indexed))
        .ok_or(DecodeError::UnknownEvent {
            topic: *topic,
            indexed,
        })?;
    let data = LogData::new_unchecked(log.topics.clone(), log.data.clone());
    let decoded = event.decode_log(&data)?;
    Ok((event, decoded))
}

fn format_raw_log(log: &Log) -> String {
    let data = hex::encode_prefixed(&log.data);
    match log.topics.split_first() {
        Some((topic, rest)) => {
            let rest: Vec<String> = rest.iter().map(ToString::to_string).collect();
            format!("emit {}(topics: [{}], data: {})", topic, rest.join(", "), data)
        }
        None => format!("emit <anonymous>(data: {data})"),
    }
}

/// Constructor arguments appended to init code.
///
/// The runtime code ends with its CBOR metadata followed by the metadata length as a big-endian
/// `u16`. Everything in `input` after the first occurrence of that suffix is the ABI-encoded
/// argument list. Returns `None` when the suffix cannot be located.
pub fn constructor_arg_bytes<'i>(runtime_code: &[u8], input: &'i [u8]) -> Option<&'i [u8]> {
    let len = runtime_code.len();
    if len < 2 {
        return None;
    }
    let metadata_len = u16::from_be_bytes([runtime_code[len - 2], runtime_code[len - 1]]) as usize;
    let suffix_start = len.checked_sub(metadata_len + 2)?;
    let suffix = &runtime_code[suffix_start..];

    let position = input
        .windows(suffix.len())
        .position(|window| window == suffix)?;
    Some(&input[position + suffix.len()..])
}

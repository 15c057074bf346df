use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::{EventParam, InternalType, Param};
use alloy_primitives::hex;

use super::Style;

/// Type information used to render one ABI value.
///
/// Array elements derive their own `ValueType` by stripping one `[..]` suffix from both the
/// ABI type and the internal type, which lets nested arrays and arrays of structs recurse.
#[derive(Debug, Clone)]
pub struct ValueType<'a> {
    ty: String,
    internal_type: Option<String>,
    components: &'a [Param],
}

impl<'a> ValueType<'a> {
    pub fn new(
        ty: impl Into<String>,
        internal_type: Option<&InternalType>,
        components: &'a [Param],
    ) -> Self {
        Self {
            ty: ty.into(),
            internal_type: internal_type.map(internal_type_text),
            components,
        }
    }

    pub fn of_param(param: &'a Param) -> Self {
        Self::new(&param.ty, param.internal_type.as_ref(), &param.components)
    }

    pub fn of_event_param(param: &'a EventParam) -> Self {
        Self::new(&param.ty, param.internal_type.as_ref(), &param.components)
    }

    /// Element type of an array type.
    pub fn element(&self) -> Self {
        Self {
            ty: strip_array_suffix(&self.ty).to_string(),
            internal_type: self
                .internal_type
                .as_deref()
                .map(|internal| strip_array_suffix(internal).to_string()),
            components: self.components,
        }
    }

    /// Struct name for struct types, otherwise the internal type, otherwise the ABI type.
    pub fn label(&self) -> String {
        match self.internal_type.as_deref() {
            Some(internal) => match struct_name(internal) {
                Some(name) => name.to_string(),
                None => internal.to_string(),
            },
            None => self.ty.clone(),
        }
    }

    fn struct_name(&self) -> Option<&str> {
        self.internal_type.as_deref().and_then(struct_name)
    }
}

// Textual form as it appears in compiler ABI output
fn internal_type_text(internal_type: &InternalType) -> String {
    fn qualified(contract: &Option<String>, ty: &str) -> String {
        match contract {
            Some(contract) => format!("{contract}.{ty}"),
            None => ty.to_string(),
        }
    }

    match internal_type {
        InternalType::AddressPayable(ty) => ty.clone(),
        InternalType::Contract(ty) => format!("contract {ty}"),
        InternalType::Enum { contract, ty } => format!("enum {}", qualified(contract, ty)),
        InternalType::Struct { contract, ty } => format!("struct {}", qualified(contract, ty)),
        InternalType::Other { contract, ty } => qualified(contract, ty),
    }
}

// `struct Lib.Order[2]` -> `Order[2]`
fn struct_name(internal: &str) -> Option<&str> {
    let name = internal.strip_prefix("struct ")?;
    let unqualified = match name.find('[') {
        Some(bracket) => name[..bracket].rfind('.').map_or(name, |dot| &name[dot + 1..]),
        None => name.rfind('.').map_or(name, |dot| &name[dot + 1..]),
    };
    Some(unqualified)
}

fn strip_array_suffix(ty: &str) -> &str {
    if ty.ends_with(']') {
        if let Some(open) = ty.rfind('[') {
            return &ty[..open];
        }
    }
    ty
}

/// Renders `value` according to its declared type.
pub fn format_value(value: &DynSolValue, value_type: &ValueType<'_>, style: Style) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..(*size).min(32)]),
        DynSolValue::Address(address) => address.to_string(),
        DynSolValue::Function(function) => hex::encode_prefixed(function.as_slice()),
        DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
        DynSolValue::String(s) => format!("\"{}\"", s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let element = value_type.element();
            let items: Vec<String> = items
                .iter()
                .map(|item| format_value(item, &element, style))
                .collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(fields) | DynSolValue::CustomStruct { tuple: fields, .. } => {
            let fields: Vec<String> = if value_type.components.len() == fields.len() {
                fields
                    .iter()
                    .zip(value_type.components)
                    .map(|(field, component)| format_param(component, field, style))
                    .collect()
            } else {
                fields
                    .iter()
                    .map(|field| format_value(field, &ValueType::new("", None, &[]), style))
                    .collect()
            };
            let name = value_type.struct_name().unwrap_or_default();
            format!("{}({{ {} }})", style.ty(name), fields.join(", "))
        }
    }
}

/// `type name: value`, the name omitted when the ABI leaves it empty.
pub fn format_param(param: &Param, value: &DynSolValue, style: Style) -> String {
    let value_type = ValueType::of_param(param);
    format!(
        "{}{}: {}",
        style.ty(&value_type.label()),
        style.name(&name_suffix(&param.name)),
        format_value(value, &value_type, style)
    )
}

/// Like [`format_param`], marking indexed event fields.
pub fn format_event_param(param: &EventParam, value: &DynSolValue, style: Style) -> String {
    let value_type = ValueType::of_event_param(param);
    let label = if param.indexed {
        format!("{} indexed", value_type.label())
    } else {
        value_type.label()
    };
    format!(
        "{}{}: {}",
        style.ty(&label),
        style.name(&name_suffix(&param.name)),
        format_value(value, &value_type, style)
    )
}

pub fn format_params(params: &[Param], values: &[DynSolValue], style: Style) -> String {
    params
        .iter()
        .zip(values)
        .map(|(param, value)| format_param(param, value, style))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bare values without type annotations.
pub fn format_bare_values(params: &[Param], values: &[DynSolValue], style: Style) -> String {
    params
        .iter()
        .zip(values)
        .map(|(param, value)| format_value(value, &ValueType::of_param(param), style))
        .collect::<Vec<_>>()
        .join(", ")
}

fn name_suffix(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!(" {name}")
    }
}

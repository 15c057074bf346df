use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy_json_abi::Error as AbiError;
use alloy_primitives::{Selector, U256, hex};
use tracing::debug;

use super::Style;
use super::values::format_bare_values;
use crate::models::contract::Contract;
use crate::models::errors::DecodeError;

const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Human readable revert payload: custom error, `Error(string)`, `Panic(uint256)` or raw hex.
pub fn format_revert(output: &[u8], candidates: &[&Contract], style: Style) -> String {
    match decode_custom_error(output, candidates) {
        Ok((error, _)) if error.inputs.is_empty() => return error.name.clone(),
        Ok((error, values)) => {
            return format!(
                "{}: {}",
                error.name,
                format_bare_values(&error.inputs, &values, style)
            );
        }
        Err(e) => debug!("Custom error not decoded: {}", e),
    }

    if let Some(reason) = decode_error_string(output) {
        return format!("Error: \"{}\"", reason);
    }
    if let Some(description) = decode_panic(output) {
        return format!("Panic: {}", description);
    }
    hex::encode_prefixed(output)
}

fn decode_custom_error<'c>(
    output: &[u8],
    candidates: &[&'c Contract],
) -> Result<(&'c AbiError, Vec<DynSolValue>), DecodeError> {
    if output.len() < 4 {
        return Err(DecodeError::UnknownError);
    }
    let selector = Selector::from_slice(&output[..4]);
    let error = candidates
        .iter()
        .find_map(|contract| contract.error(&selector))
        .ok_or(DecodeError::UnknownError)?;
    let values = error.abi_decode_input(&output[4..])?;
    Ok((error, values))
}

/// Reason carried by a `require`/`revert("...")` payload.
pub fn decode_error_string(output: &[u8]) -> Option<String> {
    if output.len() < 4 || output[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    match DynSolType::String.abi_decode(&output[4..]) {
        Ok(DynSolValue::String(reason)) => Some(reason),
        _ => None,
    }
}

/// Description of a compiler inserted `Panic(uint256)` code.
pub fn decode_panic(output: &[u8]) -> Option<String> {
    if output.len() < 4 || output[..4] != PANIC_SELECTOR {
        return None;
    }
    match DynSolType::Uint(256).abi_decode(&output[4..]) {
        Ok(DynSolValue::Uint(code, _)) => Some(panic_description(code)),
        _ => None,
    }
}

fn panic_description(code: U256) -> String {
    match u64::try_from(code) {
        Ok(0x00) => "Generic compiler panic".to_string(),
        Ok(0x01) => "Assertion failed".to_string(),
        Ok(0x11) => "Arithmetic overflow".to_string(),
        Ok(0x12) => "Division by zero".to_string(),
        Ok(0x21) => "Invalid enum value".to_string(),
        Ok(0x22) => "Invalid storage byte array access".to_string(),
        Ok(0x31) => "Pop on empty array".to_string(),
        Ok(0x32) => "Array access out of bounds".to_string(),
        Ok(0x41) => "Out of memory".to_string(),
        Ok(0x51) => "Uninitialized function pointer".to_string(),
        _ => format!("Unknown error code ({:#x})", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_abi::JsonAbi;
    use alloy_primitives::{Address, Bytes};
    use crate::models::contract::MatchKind;

    const PLAIN: Style = Style::plain();

    fn with_errors(abi: &str) -> Contract {
        let abi: JsonAbi = serde_json::from_str(abi).unwrap();
        Contract::new(Address::ZERO, "Vault", abi, Bytes::new(), MatchKind::LocalExact)
    }

    fn word(value: u8) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[31] = value;
        word
    }

    #[test]
    fn test_error_string() {
        let output = hex::decode(
            "08c379a0\
             0000000000000000000000000000000000000000000000000000000000000020\
             0000000000000000000000000000000000000000000000000000000000000014\
             496e73756666696369656e742062616c616e6365000000000000000000000000",
        )
        .unwrap();
        assert_eq!(
            format_revert(&output, &[], PLAIN),
            "Error: \"Insufficient balance\""
        );
        // Selector alone does not decode
        assert_eq!(decode_error_string(&ERROR_STRING_SELECTOR), None);
    }

    #[test]
    fn test_panic_codes() {
        for (code, description) in [
            (0x01, "Assertion failed"),
            (0x11, "Arithmetic overflow"),
            (0x12, "Division by zero"),
            (0x32, "Array access out of bounds"),
            (0xff, "Unknown error code (0xff)"),
        ] {
            let mut output = PANIC_SELECTOR.to_vec();
            output.extend_from_slice(&word(code));
            assert_eq!(
                format_revert(&output, &[], PLAIN),
                format!("Panic: {description}")
            );
        }
    }

    #[test]
    fn test_custom_error_wins() {
        let vault = with_errors(
            r#"[{"type":"error","name":"InsufficientBalance","inputs":[
                {"name":"have","type":"uint256"},{"name":"want","type":"uint256"}]},
                {"type":"error","name":"Paused","inputs":[]}]"#,
        );

        let mut output = alloy_primitives::keccak256("InsufficientBalance(uint256,uint256)")[..4].to_vec();
        output.extend_from_slice(&word(5));
        output.extend_from_slice(&word(10));
        assert_eq!(
            format_revert(&output, &[&vault], PLAIN),
            "InsufficientBalance: 5, 10"
        );

        let paused = alloy_primitives::keccak256("Paused()")[..4].to_vec();
        assert_eq!(format_revert(&paused, &[&vault], PLAIN), "Paused");
    }

    #[test]
    fn test_unknown_payload_is_raw() {
        assert_eq!(format_revert(&[0xde, 0xad, 0xbe, 0xef, 0x01], &[], PLAIN), "0xdeadbeef01");
        assert_eq!(format_revert(&[0x01], &[], PLAIN), "0x01");
    }
}

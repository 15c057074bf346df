use alloy_primitives::Address;
use std::collections::HashSet;

use crate::models::trace::Call;

#[derive(Debug)]
pub struct FlattenedCalls<'a> {
    // Pre-order: root first, then each subtree left to right
    pub nodes: Vec<&'a Call>,
    // Distinct `to` addresses in first-seen order
    pub addresses: Vec<Address>,
}

pub fn flatten_call_tree(root: &Call) -> FlattenedCalls<'_> {
    fn visit<'a>(
        call: &'a Call,
        nodes: &mut Vec<&'a Call>,
        addresses: &mut Vec<Address>,
        seen: &mut HashSet<Address>,
    ) {
        nodes.push(call);
        if let Some(to) = call.to {
            if seen.insert(to) {
                addresses.push(to);
            }
        }
        for child in &call.calls {
            visit(child, nodes, addresses, seen);
        }
    }

    let mut nodes = Vec::new();
    let mut addresses = Vec::new();
    visit(root, &mut nodes, &mut addresses, &mut HashSet::new());

    FlattenedCalls { nodes, addresses }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trace::CallKind;
    use alloy_primitives::{Bytes, U256};

    fn call(to: Option<Address>, gas: u64, calls: Vec<Call>) -> Call {
        Call {
            kind: CallKind::Call,
            from: Address::ZERO,
            to,
            value: None,
            gas: U256::from(gas),
            gas_used: U256::ZERO,
            input: Bytes::new(),
            output: None,
            error: None,
            revert_reason: None,
            logs: Vec::new(),
            calls,
        }
    }

    #[test]
    fn test_pre_order_and_dedup() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let c = Address::repeat_byte(0xcc);

        // a -> [b -> [a], c, b, <create without address>]
        let root = call(
            Some(a),
            0,
            vec![
                call(Some(b), 1, vec![call(Some(a), 2, vec![])]),
                call(Some(c), 3, vec![]),
                call(Some(b), 4, vec![]),
                call(None, 5, vec![]),
            ],
        );

        let flat = flatten_call_tree(&root);
        let order: Vec<u64> = flat.nodes.iter().map(|node| node.gas.to::<u64>()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(flat.addresses, vec![a, b, c]);
    }

    #[test]
    fn test_single_node() {
        let root = call(None, 0, vec![]);
        let flat = flatten_call_tree(&root);
        assert_eq!(flat.nodes.len(), 1);
        assert!(flat.addresses.is_empty());
    }
}

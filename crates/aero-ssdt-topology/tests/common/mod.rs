#![allow(dead_code)]

use aero_aml::{AmlObject, AmlTree, GenericAddress, NodeId, ADDRESS_SPACE_FIXED_HARDWARE};
use aero_ssdt_topology::{CStateInfo, InMemoryStore, ProcessorRecord, ReferenceRecord, Token};

pub fn refs(tokens: &[u64]) -> Vec<ReferenceRecord> {
    tokens
        .iter()
        .map(|&t| ReferenceRecord { token: Token(t) })
        .collect()
}

pub fn cstate(cstate_type: u8) -> CStateInfo {
    CStateInfo {
        register: GenericAddress {
            address_space: ADDRESS_SPACE_FIXED_HARDWARE,
            bit_width: 1,
            bit_offset: 2,
            access_size: 3,
            address: u64::from(cstate_type - 1) * 0x10,
        },
        cstate_type,
        latency: u16::from(cstate_type) * 50,
        power: 1000 / u32::from(cstate_type),
    }
}

pub fn cpu(uid: u32) -> ProcessorRecord {
    ProcessorRecord::new(uid)
}

pub fn cpu_with_cst(uid: u32, cst: u64) -> ProcessorRecord {
    ProcessorRecord {
        cst_token: Some(Token(cst)),
        ..ProcessorRecord::new(uid)
    }
}

/// Registers `group -> [group_ref] -> states -> one C-state leaf each`.
///
/// State `i` gets C-state type `i + 1`.
pub fn add_cstate_group(store: &mut InMemoryStore, group: u64, group_ref: u64, states: &[u64]) {
    store.insert_cross_reference(Token(group), refs(&[group_ref]));
    store.insert_cross_reference(Token(group_ref), refs(states));
    for (i, &state) in states.iter().enumerate() {
        store.insert_cstates(Token(state), vec![cstate(i as u8 + 1)]);
    }
}

/// Fresh tree with `Scope (\_SB)` to build under.
pub fn sb_tree() -> (AmlTree, NodeId) {
    let mut tree = AmlTree::new();
    let root = tree.root();
    let sb = tree.create_scope(root, "\\_SB").unwrap();
    (tree, sb)
}

/// Path returned by the `_CST` method of `cpu`, if it has one.
pub fn cst_target(tree: &AmlTree, cpu: NodeId) -> Option<String> {
    let method = tree.find_child(cpu, "_CST")?;
    let ret = *tree.children(method).first()?;
    let value = *tree.children(ret).first()?;
    match tree.object(value)? {
        AmlObject::NameRef(path) => Some(path.to_string()),
        _ => None,
    }
}

/// Value returned by an integer-returning method such as `_STA`/`_PPC`.
pub fn method_integer(tree: &AmlTree, cpu: NodeId, name: &str) -> Option<u64> {
    let method = tree.find_child(cpu, name)?;
    let ret = *tree.children(method).first()?;
    tree.integer_value(*tree.children(ret).first()?)
}

/// Value node of `Name (name, ..)` under `parent`.
pub fn name_value(tree: &AmlTree, parent: NodeId, name: &str) -> Option<NodeId> {
    let name = tree.find_child(parent, name)?;
    tree.children(name).first().copied()
}

pub fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

//! Shared C-state packages, per-processor `_CST` methods and `_CSD`
//! dependency objects.
//!
//! Every distinct C-state group is emitted once, as a named package inside a
//! container device declared under `\_SB`:
//!
//! ```text
//! Scope (\_SB) {
//!     Device (CSTS) {
//!         Name (CST0, Package () { 2, Package () { ResourceTemplate () { .. }, 1, 1, 1000 }, .. })
//!         Name (CST1, ..)
//!     }
//! }
//! ```
//!
//! Processors then reference their group by path from a `_CST` method.

use aero_aml::{AmlObject, AmlTree, NameSeg, NameString, NodeId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::naming::{synthesize_name, CST_NAME_TEMPLATE};
use crate::records::{CsdInfo, Token};
use crate::store::ConfigurationStore;
use crate::token_table::TokenTable;
use crate::xref::{fetch_references, resolve_cstate_group};

/// Container for the shared C-state packages.
pub const CST_CONTAINER_PATH: &str = "\\_SB.CSTS";
/// Scope the container device is declared in.
const CST_PARENT_PATH: &str = "\\_SB";
const CST_CONTAINER_NAME: &str = "CSTS";

/// `_CSD` package entries: NumEntries, Revision, Domain, CoordType,
/// NumProcessors, Index.
const CSD_NUM_ENTRIES: u64 = 6;

/// Absolute path of the shared package for table index `index`.
pub fn cst_package_path(index: usize) -> Result<NameString> {
    let name = synthesize_name(CST_NAME_TEMPLATE, index)?;
    Ok(NameString::parse(&format!("{CST_CONTAINER_PATH}.{name}"))?)
}

/// Declares `Device (CSTS)` under `parent` and one package per table entry
/// inside it, in table order.
///
/// `parent` must be `Scope (\_SB)`, since `_CST` methods refer to the
/// packages by absolute path. Returns `None` without touching the tree when
/// no processor has C-states.
pub fn populate_cstate_groups<S: ConfigurationStore + ?Sized>(
    store: &S,
    table: &TokenTable,
    tree: &mut AmlTree,
    parent: NodeId,
) -> Result<Option<NodeId>> {
    if table.is_empty() {
        debug!("no C-state groups; skipping {CST_CONTAINER_PATH}");
        return Ok(None);
    }

    let expected_parent = AmlObject::Scope(NameString::parse(CST_PARENT_PATH)?);
    if tree.object(parent) != Some(&expected_parent) {
        return Err(Error::invalid(format!(
            "C-state packages must be declared under Scope ({CST_PARENT_PATH})"
        )));
    }

    let container = tree.create_device(parent, NameSeg::new(CST_CONTAINER_NAME)?)?;
    for (index, group) in table.iter().enumerate() {
        let name = synthesize_name(CST_NAME_TEMPLATE, index)?;
        let package = tree.create_named_package(container, name)?;
        let states = resolve_cstate_group(store, group)?;
        for state in &states {
            tree.append_cstate(
                package,
                &state.register,
                state.cstate_type,
                state.latency,
                state.power,
            )?;
        }
        debug!(%name, %group, states = states.len(), "emitted shared C-state package");
    }
    Ok(Some(container))
}

/// `Method (_CST, 0) { Return (\_SB.CSTS.CSTn) }` on `cpu`.
pub fn emit_cst_method(
    table: &TokenTable,
    cst_token: Token,
    cpu: NodeId,
    tree: &mut AmlTree,
) -> Result<NodeId> {
    let index = table.index_of(cst_token).ok_or_else(|| {
        Error::invalid(format!("C-state token {cst_token} is not in the token table"))
    })?;
    let path = cst_package_path(index)?;
    Ok(tree.create_method_returning_reference(cpu, NameSeg::new("_CST")?, &path)?)
}

/// Position of `cst_pkg_ref` inside the state reference list that holds it.
///
/// Groups are searched in table order and the first match wins. The result
/// is the `_CSD` `Index` field (an index into the sibling `_CST` states),
/// which is a different numbering from the group's table index.
pub fn csd_index<S: ConfigurationStore + ?Sized>(
    store: &S,
    table: &TokenTable,
    cst_pkg_ref: Token,
) -> Result<Option<usize>> {
    for group in table.iter() {
        for group_ref in fetch_references(store, group)? {
            let states = fetch_references(store, group_ref.token)?;
            if let Some(position) = states.iter().position(|r| r.token == cst_pkg_ref) {
                return Ok(Some(position));
            }
        }
    }
    Ok(None)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CsdEntry {
    pub info: CsdInfo,
    pub index: usize,
}

/// Resolves every dependency record under `csd_token`; all must resolve.
pub fn resolve_csd_entries<S: ConfigurationStore + ?Sized>(
    store: &S,
    table: &TokenTable,
    csd_token: Token,
) -> Result<Vec<CsdEntry>> {
    let csds = store.csd_info(csd_token)?;
    if csds.is_empty() {
        return Err(Error::invalid(format!("CSD token {csd_token} has no records")));
    }

    let mut entries = Vec::new();
    entries.try_reserve_exact(csds.len())?;
    for info in csds {
        let cst_pkg_ref = info.cst_pkg_ref_token.ok_or_else(|| {
            Error::invalid(format!("CSD record under {csd_token} has no C-state reference"))
        })?;
        let index = csd_index(store, table, cst_pkg_ref)?.ok_or_else(|| {
            Error::invalid(format!("unresolvable CSD reference {cst_pkg_ref}"))
        })?;
        entries.push(CsdEntry { info: *info, index });
    }
    Ok(entries)
}

/// `Name (_CSD, Package () { Package () { 6, Rev, Domain, Coord, Procs, Index }, .. })`
pub fn emit_csd<S: ConfigurationStore + ?Sized>(
    store: &S,
    table: &TokenTable,
    csd_token: Token,
    cpu: NodeId,
    tree: &mut AmlTree,
) -> Result<NodeId> {
    let entries = resolve_csd_entries(store, table, csd_token)?;

    let package = tree.create_name(cpu, NameSeg::new("_CSD")?, AmlObject::Package)?;
    for entry in &entries {
        let dep = tree.append(package, AmlObject::Package)?;
        for value in [
            CSD_NUM_ENTRIES,
            entry.info.revision.into(),
            entry.info.domain.into(),
            entry.info.coord_type.value().into(),
            entry.info.num_processors.into(),
            entry.index as u64,
        ] {
            tree.append(dep, AmlObject::Integer(value))?;
        }
    }
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CoordinationType, ProcessorRecord, ReferenceRecord};
    use crate::store::InMemoryStore;

    fn refs(tokens: &[u64]) -> Vec<ReferenceRecord> {
        tokens
            .iter()
            .map(|&t| ReferenceRecord { token: Token(t) })
            .collect()
    }

    fn csd(cst_pkg_ref: Option<u64>) -> CsdInfo {
        CsdInfo {
            revision: 0,
            domain: 1,
            coord_type: CoordinationType::HwAll,
            num_processors: 2,
            cst_pkg_ref_token: cst_pkg_ref.map(Token),
        }
    }

    /// Groups 0xA, 0xB, 0xC (table indices 0, 1, 2), one group ref each.
    fn three_group_store() -> (InMemoryStore, TokenTable) {
        let mut store = InMemoryStore::new();
        store.insert_cross_reference(Token(0xA), refs(&[0xA0]));
        store.insert_cross_reference(Token(0xB), refs(&[0xB0]));
        store.insert_cross_reference(Token(0xC), refs(&[0xC0]));
        store.insert_cross_reference(Token(0xA0), refs(&[0x100, 0x101]));
        store.insert_cross_reference(Token(0xB0), refs(&[0x200, 0x201, 0x202]));
        store.insert_cross_reference(Token(0xC0), refs(&[0x300, 0x301, 0x302]));

        let cpus: Vec<_> = [0xA, 0xB, 0xC]
            .into_iter()
            .enumerate()
            .map(|(uid, t)| ProcessorRecord {
                cst_token: Some(Token(t)),
                ..ProcessorRecord::new(uid as u32)
            })
            .collect();
        (store, TokenTable::build(&cpus).unwrap())
    }

    #[test]
    fn csd_index_is_position_within_state_list() {
        let (store, table) = three_group_store();
        // Third state of the group at table index 1.
        assert_eq!(csd_index(&store, &table, Token(0x202)).unwrap(), Some(2));
        // First state of the group at table index 2.
        assert_eq!(csd_index(&store, &table, Token(0x300)).unwrap(), Some(0));
        assert_eq!(csd_index(&store, &table, Token(0x101)).unwrap(), Some(1));
        assert_eq!(csd_index(&store, &table, Token(0x999)).unwrap(), None);
    }

    #[test]
    fn csd_index_counts_within_second_level_list_only() {
        let mut store = InMemoryStore::new();
        store.insert_cross_reference(Token(0xA), refs(&[0xA0, 0xA1]));
        store.insert_cross_reference(Token(0xA0), refs(&[0x100, 0x101, 0x102]));
        store.insert_cross_reference(Token(0xA1), refs(&[0x110, 0x111]));
        let table = TokenTable::build(&[ProcessorRecord {
            cst_token: Some(Token(0xA)),
            ..ProcessorRecord::new(0)
        }])
        .unwrap();

        assert_eq!(csd_index(&store, &table, Token(0x111)).unwrap(), Some(1));
    }

    #[test]
    fn csd_entries_require_group_reference() {
        let (mut store, table) = three_group_store();
        store.insert_csds(Token(0x50), vec![csd(Some(0x201)), csd(None)]);
        assert!(matches!(
            resolve_csd_entries(&store, &table, Token(0x50)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn unresolvable_csd_reference_is_invalid() {
        let (mut store, table) = three_group_store();
        store.insert_csds(Token(0x50), vec![csd(Some(0x777))]);
        let err = resolve_csd_entries(&store, &table, Token(0x50)).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidArgument("unresolvable CSD reference 0x777".into())
        );
    }

    #[test]
    fn multiple_domains_resolve_independently() {
        let (mut store, table) = three_group_store();
        store.insert_csds(Token(0x50), vec![csd(Some(0x201)), csd(Some(0x302))]);
        let entries = resolve_csd_entries(&store, &table, Token(0x50)).unwrap();
        let indices: Vec<_> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn cst_method_for_unknown_token_is_invalid() {
        let (_, table) = three_group_store();
        let mut tree = AmlTree::new();
        let root = tree.root();
        assert!(matches!(
            emit_cst_method(&table, Token(0xD), root, &mut tree),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn package_paths_follow_table_index() {
        assert_eq!(cst_package_path(0).unwrap().to_string(), "\\_SB_.CSTS.CST0");
        assert_eq!(cst_package_path(0x2A).unwrap().to_string(), "\\_SB_.CSTS.CS2A");
    }
}

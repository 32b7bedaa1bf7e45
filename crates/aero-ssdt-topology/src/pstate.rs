//! Performance control objects: `_PCT`/`_PSS`/`_PPC`, `_PSD` and `_CPC`.

use aero_aml::{register_template, AmlObject, AmlTree, NameSeg, NodeId};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::records::{CpcEntry, ProcessorRecord, Token};
use crate::store::{ConfigurationStore, RecordKind};
use crate::topology::TopologyWarning;

const PSD_NUM_ENTRIES: u64 = 5;

/// What the `_PCT`/`_PSS`/`_PPC` gate did for one processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PstateOutcome {
    /// No P-state links at all.
    Absent,
    /// Some but not all of the three links; nothing emitted.
    Partial(TopologyWarning),
    Emitted,
}

fn first<T>(records: &[T], kind: RecordKind, token: Token) -> Result<&T> {
    records
        .first()
        .ok_or_else(|| Error::invalid(format!("{kind} token {token} has no records")))
}

fn non_empty<T>(records: &[T], kind: RecordKind, token: Token) -> Result<&[T]> {
    first(records, kind, token)?;
    Ok(records)
}

/// Emits `_PCT`, `_PSS` and `_PPC` only when the processor links all three.
///
/// A partial set is a platform description bug but not a fatal one: it is
/// logged, reported, and the processor gets none of the three objects.
pub fn emit_pstates<S: ConfigurationStore + ?Sized>(
    store: &S,
    processor: &ProcessorRecord,
    cpu: NodeId,
    tree: &mut AmlTree,
) -> Result<PstateOutcome> {
    let (pct_token, pss_token, ppc_token) = match (
        processor.pct_token,
        processor.pss_token,
        processor.ppc_token,
    ) {
        (None, None, None) => return Ok(PstateOutcome::Absent),
        (Some(pct), Some(pss), Some(ppc)) => (pct, pss, ppc),
        (pct, pss, ppc) => {
            let warning = TopologyWarning::PartialPstateInfo {
                uid: processor.acpi_processor_uid,
                pct: pct.is_some(),
                pss: pss.is_some(),
                ppc: ppc.is_some(),
            };
            warn!(
                uid = processor.acpi_processor_uid,
                "{warning}; skipping _PCT/_PSS/_PPC"
            );
            return Ok(PstateOutcome::Partial(warning));
        }
    };

    let pct = first(store.pct_info(pct_token)?, RecordKind::Pct, pct_token)?;
    let pss = non_empty(store.pss_info(pss_token)?, RecordKind::Pss, pss_token)?;
    let ppc = first(store.ppc_info(ppc_token)?, RecordKind::Ppc, ppc_token)?;

    // Name (_PCT, Package () { ResourceTemplate () { Register (..) }, ResourceTemplate () { Register (..) } })
    let pct_pkg = tree.create_name(cpu, NameSeg::new("_PCT")?, AmlObject::Package)?;
    tree.append(pct_pkg, AmlObject::Buffer(register_template(&pct.control_register)))?;
    tree.append(pct_pkg, AmlObject::Buffer(register_template(&pct.status_register)))?;

    // Name (_PSS, Package () { Package () { Freq, Power, Latency, BmLatency, Control, Status }, .. })
    let pss_pkg = tree.create_name(cpu, NameSeg::new("_PSS")?, AmlObject::Package)?;
    for state in pss {
        let entry = tree.append(pss_pkg, AmlObject::Package)?;
        for value in [
            state.core_frequency,
            state.power,
            state.latency,
            state.bus_master_latency,
            state.control,
            state.status,
        ] {
            tree.append(entry, AmlObject::Integer(value.into()))?;
        }
    }

    tree.create_method_returning_integer(cpu, NameSeg::new("_PPC")?, ppc.pstate_count.into())?;

    debug!(
        uid = processor.acpi_processor_uid,
        pstates = pss.len(),
        "emitted _PCT/_PSS/_PPC"
    );
    Ok(PstateOutcome::Emitted)
}

/// `Name (_PSD, Package () { Package () { 5, Rev, Domain, Coord, Procs }, .. })`
pub fn emit_psd<S: ConfigurationStore + ?Sized>(
    store: &S,
    psd_token: Token,
    cpu: NodeId,
    tree: &mut AmlTree,
) -> Result<NodeId> {
    let psds = non_empty(store.psd_info(psd_token)?, RecordKind::Psd, psd_token)?;

    let package = tree.create_name(cpu, NameSeg::new("_PSD")?, AmlObject::Package)?;
    for psd in psds {
        let dep = tree.append(package, AmlObject::Package)?;
        for value in [
            PSD_NUM_ENTRIES,
            psd.revision.into(),
            psd.domain.into(),
            psd.coord_type.value().into(),
            psd.num_processors.into(),
        ] {
            tree.append(dep, AmlObject::Integer(value))?;
        }
    }
    Ok(package)
}

/// `Name (_CPC, Package () { NumEntries, Revision, .. })`
pub fn emit_cpc<S: ConfigurationStore + ?Sized>(
    store: &S,
    cpc_token: Token,
    cpu: NodeId,
    tree: &mut AmlTree,
) -> Result<NodeId> {
    let cpc = first(store.cpc_info(cpc_token)?, RecordKind::Cpc, cpc_token)?;
    if cpc.entries.is_empty() {
        return Err(Error::invalid(format!("CPC token {cpc_token} has no entries")));
    }

    let package = tree.create_name(cpu, NameSeg::new("_CPC")?, AmlObject::Package)?;
    // NumEntries counts itself and the revision.
    tree.append(package, AmlObject::Integer(cpc.entries.len() as u64 + 2))?;
    tree.append(package, AmlObject::Integer(cpc.revision.into()))?;
    for entry in &cpc.entries {
        let object = match entry {
            CpcEntry::Integer(value) => AmlObject::Integer((*value).into()),
            CpcEntry::Register(reg) => AmlObject::Buffer(register_template(reg)),
        };
        tree.append(package, object)?;
    }
    Ok(package)
}

#[cfg(test)]
mod tests {
    use aero_aml::GenericAddress;

    use super::*;
    use crate::records::{CpcInfo, PctInfo, PpcInfo, PssInfo};
    use crate::store::InMemoryStore;

    fn pss(freq: u32) -> PssInfo {
        PssInfo {
            core_frequency: freq,
            power: freq * 10,
            latency: 10,
            bus_master_latency: 10,
            control: freq / 100,
            status: freq / 100,
        }
    }

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.insert_pct(
            Token(1),
            PctInfo {
                control_register: GenericAddress::default(),
                status_register: GenericAddress::default(),
            },
        );
        store.insert_pss(Token(2), vec![pss(2000), pss(1600), pss(800)]);
        store.insert_ppc(Token(3), PpcInfo { pstate_count: 3 });
        store
    }

    #[test]
    fn all_three_links_emit_all_three_objects() {
        let store = store();
        let mut tree = AmlTree::new();
        let cpu = tree.create_device(tree.root(), NameSeg::new("C000").unwrap()).unwrap();
        let cpu_record = ProcessorRecord {
            pct_token: Some(Token(1)),
            pss_token: Some(Token(2)),
            ppc_token: Some(Token(3)),
            ..ProcessorRecord::new(0)
        };

        assert_eq!(
            emit_pstates(&store, &cpu_record, cpu, &mut tree).unwrap(),
            PstateOutcome::Emitted
        );
        assert!(tree.find_child(cpu, "_PCT").is_some());
        let pss_name = tree.find_child(cpu, "_PSS").unwrap();
        let pss_pkg = tree.children(pss_name)[0];
        assert_eq!(tree.children(pss_pkg).len(), 3);
        assert!(tree.find_child(cpu, "_PPC").is_some());
    }

    #[test]
    fn partial_links_warn_and_emit_nothing() {
        let store = store();
        let mut tree = AmlTree::new();
        let cpu = tree.create_device(tree.root(), NameSeg::new("C000").unwrap()).unwrap();
        let cpu_record = ProcessorRecord {
            pss_token: Some(Token(2)),
            ..ProcessorRecord::new(4)
        };

        assert_eq!(
            emit_pstates(&store, &cpu_record, cpu, &mut tree).unwrap(),
            PstateOutcome::Partial(TopologyWarning::PartialPstateInfo {
                uid: 4,
                pct: false,
                pss: true,
                ppc: false,
            })
        );
        assert!(tree.children(cpu).is_empty());
    }

    #[test]
    fn missing_record_behind_complete_links_is_fatal() {
        let store = store();
        let mut tree = AmlTree::new();
        let cpu = tree.create_device(tree.root(), NameSeg::new("C000").unwrap()).unwrap();
        let cpu_record = ProcessorRecord {
            pct_token: Some(Token(1)),
            pss_token: Some(Token(2)),
            ppc_token: Some(Token(9)),
            ..ProcessorRecord::new(0)
        };
        assert_eq!(
            emit_pstates(&store, &cpu_record, cpu, &mut tree),
            Err(Error::NotFound {
                kind: RecordKind::Ppc,
                token: Token(9)
            })
        );
    }

    #[test]
    fn cpc_package_counts_header_entries() {
        let mut store = InMemoryStore::new();
        store.insert_cpc(
            Token(7),
            CpcInfo {
                revision: 3,
                entries: vec![
                    CpcEntry::Integer(0xFF),
                    CpcEntry::Register(GenericAddress::default()),
                ],
            },
        );
        store.insert_cpc(
            Token(8),
            CpcInfo {
                revision: 3,
                entries: vec![],
            },
        );
        let mut tree = AmlTree::new();
        let cpu = tree.create_device(tree.root(), NameSeg::new("C000").unwrap()).unwrap();

        let cpc = emit_cpc(&store, Token(7), cpu, &mut tree).unwrap();
        let header: Vec<_> = tree.children(cpc)[..2]
            .iter()
            .map(|&n| tree.integer_value(n).unwrap())
            .collect();
        assert_eq!(header, vec![4, 3]);

        assert!(matches!(
            emit_cpc(&store, Token(8), cpu, &mut tree),
            Err(Error::InvalidArgument(_))
        ));
    }
}

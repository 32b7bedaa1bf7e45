//! Processor device orchestration.

use core::fmt;

use aero_aml::{AmlObject, AmlTree, NameSeg, NodeId};
use tracing::{debug, info};

use crate::cstate::{emit_csd, emit_cst_method, populate_cstate_groups};
use crate::error::{Error, Result};
use crate::naming::{synthesize_name, CPU_NAME_TEMPLATE};
use crate::pstate::{emit_cpc, emit_pstates, emit_psd, PstateOutcome};
use crate::records::{DeviceStatus, ProcessorRecord, Token};
use crate::store::{ConfigurationStore, RecordKind};
use crate::token_table::TokenTable;

/// `_HID` of an ACPI processor device.
pub const PROCESSOR_HID: &str = "ACPI0007";

/// Non-fatal findings collected while generating the topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyWarning {
    /// Only some of the `_PCT`/`_PSS`/`_PPC` links were set.
    PartialPstateInfo {
        uid: u32,
        pct: bool,
        pss: bool,
        ppc: bool,
    },
}

impl fmt::Display for TopologyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyWarning::PartialPstateInfo { uid, pct, pss, ppc } => write!(
                f,
                "processor {uid} has partial P-state info (PCT={pct}, PSS={pss}, PPC={ppc})"
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopologyReport {
    pub processor_count: usize,
    pub cstate_group_count: usize,
    pub warnings: Vec<TopologyWarning>,
}

/// Appends the shared C-state packages and one processor device per
/// processor record under `parent`. When any processor has C-states,
/// `parent` must be `Scope (\_SB)`.
///
/// Fails fast: the first fatal error is returned and the remaining
/// processors are not visited. `tree` may then hold a partial subtree and
/// must be discarded by the caller.
pub fn create_topology<S: ConfigurationStore + ?Sized>(
    store: &S,
    tree: &mut AmlTree,
    parent: NodeId,
) -> Result<TopologyReport> {
    let processors = store.processors()?;
    // Dropped (and thereby released) on every return path.
    let table = TokenTable::build(processors)?;

    populate_cstate_groups(store, &table, tree, parent)?;

    let mut report = TopologyReport {
        processor_count: processors.len(),
        cstate_group_count: table.len(),
        warnings: Vec::new(),
    };
    for (index, processor) in processors.iter().enumerate() {
        emit_processor(store, &table, tree, parent, index, processor, &mut report)?;
    }

    info!(
        processors = report.processor_count,
        cstate_groups = report.cstate_group_count,
        warnings = report.warnings.len(),
        "generated processor topology"
    );
    Ok(report)
}

fn emit_processor<S: ConfigurationStore + ?Sized>(
    store: &S,
    table: &TokenTable,
    tree: &mut AmlTree,
    parent: NodeId,
    index: usize,
    processor: &ProcessorRecord,
    report: &mut TopologyReport,
) -> Result<()> {
    // Stores other than `InMemoryStore` may still spell a missing link as `Token::NULL`.
    let processor = &processor.clone().normalized();
    let uid = processor.acpi_processor_uid;
    let cpu = create_processor_device(tree, parent, uid, index)?;

    if let Some(cst_token) = processor.cst_token {
        emit_cst_method(table, cst_token, cpu, tree)?;
        if let Some(csd_token) = processor.csd_token {
            emit_csd(store, table, csd_token, cpu, tree)?;
        }
    }

    if let PstateOutcome::Partial(warning) = emit_pstates(store, processor, cpu, tree)? {
        report.warnings.push(warning);
    }

    if let Some(psd_token) = processor.psd_token {
        emit_psd(store, psd_token, cpu, tree)?;
    }
    if let Some(cpc_token) = processor.cpc_token {
        emit_cpc(store, cpc_token, cpu, tree)?;
    }
    if let Some(sta_token) = processor.sta_token {
        emit_sta(store, uid, sta_token, cpu, tree)?;
    }

    debug!(uid, index, "emitted processor device");
    Ok(())
}

/// `Device (Cxxx) { Name (_HID, "ACPI0007") Name (_UID, uid) }`
pub fn create_processor_device(
    tree: &mut AmlTree,
    parent: NodeId,
    uid: u32,
    index: usize,
) -> Result<NodeId> {
    let name = synthesize_name(CPU_NAME_TEMPLATE, index)?;
    let cpu = tree.create_device(parent, name)?;
    tree.create_name(
        cpu,
        NameSeg::new("_HID")?,
        AmlObject::String(PROCESSOR_HID.to_string()),
    )?;
    tree.create_name(cpu, NameSeg::new("_UID")?, AmlObject::Integer(uid.into()))?;
    Ok(cpu)
}

/// Checks the status bits and emits `Method (_STA, 0) { Return (status) }`.
///
/// Bits outside [`DeviceStatus`] are rejected, not masked.
pub fn emit_sta<S: ConfigurationStore + ?Sized>(
    store: &S,
    uid: u32,
    sta_token: Token,
    cpu: NodeId,
    tree: &mut AmlTree,
) -> Result<NodeId> {
    let sta = store.sta_info(sta_token)?.first().ok_or_else(|| {
        Error::invalid(format!("{} token {sta_token} has no records", RecordKind::Sta))
    })?;
    let status = DeviceStatus::from_bits(sta.device_status).ok_or(Error::Unsupported {
        uid,
        status: sta.device_status,
    })?;
    Ok(tree.create_method_returning_integer(cpu, NameSeg::new("_STA")?, status.bits().into())?)
}

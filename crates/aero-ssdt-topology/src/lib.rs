//! SSDT processor topology generator.
//!
//! Turns table-driven processor descriptions (a [`ConfigurationStore`] of
//! processor records and the power management records they link to) into
//! AML: one `ACPI0007` device per processor with `_CST`, `_CSD`, `_PCT`,
//! `_PSS`, `_PPC`, `_PSD`, `_CPC` and `_STA` objects as the records allow.
//!
//! C-state lists are shared: every distinct C-state group is emitted once
//! under `\_SB.CSTS` and each processor's `_CST` returns a reference to its
//! group's package.

pub mod cstate;
mod error;
pub mod naming;
pub mod pstate;
mod records;
mod ssdt;
mod store;
pub mod token_table;
pub mod topology;
pub mod xref;

pub use error::{Error, Result};
pub use records::{
    CStateInfo, CoordinationType, CpcEntry, CpcInfo, CsdInfo, DeviceStatus, PctInfo, PpcInfo,
    ProcessorRecord, PsdInfo, PssInfo, ReferenceRecord, StaInfo, Token,
};
pub use ssdt::{build_ssdt, checksum, SsdtConfig, SsdtTable, SDT_HEADER_LEN};
pub use store::{ConfigurationStore, InMemoryStore, PlatformDescription, RecordKind, TokenEntry};
pub use token_table::TokenTable;
pub use topology::{create_topology, TopologyReport, TopologyWarning};

//! SSDT definition block wrapping the processor topology.

use aero_aml::AmlTree;

use crate::error::{Error, Result};
use crate::store::ConfigurationStore;
use crate::topology::{create_topology, TopologyReport};

pub const SDT_HEADER_LEN: usize = 36;

#[derive(Clone, Debug)]
pub struct SsdtConfig {
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: [u8; 4],
    pub creator_revision: u32,
    /// SDT header revision; 2 selects 64-bit AML integers.
    pub revision: u8,
}

impl Default for SsdtConfig {
    fn default() -> Self {
        Self {
            oem_id: *b"AERO  ",
            oem_table_id: *b"AEROCPUT",
            oem_revision: 1,
            creator_id: *b"AERO",
            creator_revision: 1,
            revision: 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SsdtTable {
    pub bytes: Vec<u8>,
    pub report: TopologyReport,
}

/// Builds a complete SSDT: `Scope (\_SB) { <topology> }` behind a
/// checksummed SDT header.
pub fn build_ssdt<S: ConfigurationStore + ?Sized>(
    store: &S,
    cfg: &SsdtConfig,
) -> Result<SsdtTable> {
    let mut tree = AmlTree::new();
    let root = tree.root();
    let sb = tree.create_scope(root, "\\_SB")?;
    let report = create_topology(store, &mut tree, sb)?;
    let aml = tree.serialize_children(root)?;

    let total_len = SDT_HEADER_LEN + aml.len();
    let total_len_u32 = u32::try_from(total_len)
        .map_err(|_| Error::invalid(format!("SSDT too large ({total_len} bytes)")))?;
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&build_sdt_header(*b"SSDT", total_len_u32, cfg));
    out.extend_from_slice(&aml);
    Ok(SsdtTable {
        bytes: finalize_sdt(out),
        report,
    })
}

pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

fn build_sdt_header(signature: [u8; 4], length: u32, cfg: &SsdtConfig) -> [u8; SDT_HEADER_LEN] {
    let mut out = [0u8; SDT_HEADER_LEN];
    out[0..4].copy_from_slice(&signature);
    out[4..8].copy_from_slice(&length.to_le_bytes());
    out[8] = cfg.revision;
    out[9] = 0; // checksum placeholder
    out[10..16].copy_from_slice(&cfg.oem_id);
    out[16..24].copy_from_slice(&cfg.oem_table_id);
    out[24..28].copy_from_slice(&cfg.oem_revision.to_le_bytes());
    out[28..32].copy_from_slice(&cfg.creator_id);
    out[32..36].copy_from_slice(&cfg.creator_revision.to_le_bytes());
    out
}

fn finalize_sdt(mut table: Vec<u8>) -> Vec<u8> {
    table[9] = 0;
    table[9] = 0u8.wrapping_sub(checksum(&table));
    table
}

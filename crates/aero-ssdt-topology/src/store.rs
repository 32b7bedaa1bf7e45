//! Configuration store interface and the in-memory implementation used by
//! the generator binary and tests.

use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::records::{
    CStateInfo, CpcInfo, CsdInfo, PctInfo, PpcInfo, ProcessorRecord, PsdInfo, PssInfo,
    ReferenceRecord, StaInfo, Token,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Processor,
    CrossReference,
    CState,
    Csd,
    Pct,
    Pss,
    Ppc,
    Psd,
    Cpc,
    Sta,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Processor => "processor",
            RecordKind::CrossReference => "cross-reference",
            RecordKind::CState => "C-state",
            RecordKind::Csd => "CSD",
            RecordKind::Pct => "PCT",
            RecordKind::Pss => "PSS",
            RecordKind::Ppc => "PPC",
            RecordKind::Psd => "PSD",
            RecordKind::Cpc => "CPC",
            RecordKind::Sta => "STA",
        })
    }
}

/// Read-only access to platform records by token.
///
/// Every lookup returns the full record array registered under `token`, or
/// [`Error::NotFound`]. The store keeps ownership; callers only borrow.
pub trait ConfigurationStore {
    /// All logical processors, in platform order.
    fn processors(&self) -> Result<&[ProcessorRecord]>;
    fn cross_reference(&self, token: Token) -> Result<&[ReferenceRecord]>;
    fn cst_info(&self, token: Token) -> Result<&[CStateInfo]>;
    fn csd_info(&self, token: Token) -> Result<&[CsdInfo]>;
    fn pct_info(&self, token: Token) -> Result<&[PctInfo]>;
    fn pss_info(&self, token: Token) -> Result<&[PssInfo]>;
    fn ppc_info(&self, token: Token) -> Result<&[PpcInfo]>;
    fn psd_info(&self, token: Token) -> Result<&[PsdInfo]>;
    fn cpc_info(&self, token: Token) -> Result<&[CpcInfo]>;
    fn sta_info(&self, token: Token) -> Result<&[StaInfo]>;
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    processors: Vec<ProcessorRecord>,
    cross_references: HashMap<Token, Vec<ReferenceRecord>>,
    cstates: HashMap<Token, Vec<CStateInfo>>,
    csds: HashMap<Token, Vec<CsdInfo>>,
    pcts: HashMap<Token, Vec<PctInfo>>,
    psss: HashMap<Token, Vec<PssInfo>>,
    ppcs: HashMap<Token, Vec<PpcInfo>>,
    psds: HashMap<Token, Vec<PsdInfo>>,
    cpcs: HashMap<Token, Vec<CpcInfo>>,
    stas: HashMap<Token, Vec<StaInfo>>,
}

fn lookup<T>(map: &HashMap<Token, Vec<T>>, kind: RecordKind, token: Token) -> Result<&[T]> {
    map.get(&token)
        .filter(|_| !token.is_null())
        .map(Vec::as_slice)
        .ok_or(Error::NotFound { kind, token })
}

fn insert_unique<T>(
    map: &mut HashMap<Token, Vec<T>>,
    kind: RecordKind,
    token: Token,
    records: Vec<T>,
) -> Result<()> {
    if token.is_null() {
        return Err(Error::invalid(format!("{kind} records registered under the null token")));
    }
    if map.insert(token, records).is_some() {
        return Err(Error::invalid(format!("duplicate {kind} records for token {token}")));
    }
    Ok(())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_processor(&mut self, record: ProcessorRecord) {
        self.processors.push(record.normalized());
    }

    // The `insert_*` setters replace any records already under `token`.

    pub fn insert_cross_reference(&mut self, token: Token, refs: Vec<ReferenceRecord>) {
        self.cross_references.insert(token, refs);
    }

    pub fn insert_cstates(&mut self, token: Token, states: Vec<CStateInfo>) {
        self.cstates.insert(token, states);
    }

    pub fn insert_csds(&mut self, token: Token, csds: Vec<CsdInfo>) {
        let csds = csds
            .into_iter()
            .map(|csd| CsdInfo {
                cst_pkg_ref_token: csd.cst_pkg_ref_token.and_then(Token::non_null),
                ..csd
            })
            .collect();
        self.csds.insert(token, csds);
    }

    pub fn insert_pct(&mut self, token: Token, pct: PctInfo) {
        self.pcts.insert(token, vec![pct]);
    }

    pub fn insert_pss(&mut self, token: Token, states: Vec<PssInfo>) {
        self.psss.insert(token, states);
    }

    pub fn insert_ppc(&mut self, token: Token, ppc: PpcInfo) {
        self.ppcs.insert(token, vec![ppc]);
    }

    pub fn insert_psds(&mut self, token: Token, psds: Vec<PsdInfo>) {
        self.psds.insert(token, psds);
    }

    pub fn insert_cpc(&mut self, token: Token, cpc: CpcInfo) {
        self.cpcs.insert(token, vec![cpc]);
    }

    pub fn insert_sta(&mut self, token: Token, sta: StaInfo) {
        self.stas.insert(token, vec![sta]);
    }

    /// Builds a store from a deserialized platform description.
    ///
    /// Each token may appear at most once per record kind, and never as
    /// `Token::NULL`.
    pub fn from_description(desc: PlatformDescription) -> Result<Self> {
        let mut store = Self::new();
        for record in desc.processors {
            store.push_processor(record);
        }
        for e in desc.cross_references {
            insert_unique(
                &mut store.cross_references,
                RecordKind::CrossReference,
                e.token,
                e.records,
            )?;
        }
        for e in desc.cst_info {
            insert_unique(&mut store.cstates, RecordKind::CState, e.token, e.records)?;
        }
        for e in desc.csd_info {
            // Routed through `insert_csds` so null group references are normalized.
            insert_unique(&mut store.csds, RecordKind::Csd, e.token, Vec::new())?;
            store.insert_csds(e.token, e.records);
        }
        for e in desc.pct_info {
            insert_unique(&mut store.pcts, RecordKind::Pct, e.token, e.records)?;
        }
        for e in desc.pss_info {
            insert_unique(&mut store.psss, RecordKind::Pss, e.token, e.records)?;
        }
        for e in desc.ppc_info {
            insert_unique(&mut store.ppcs, RecordKind::Ppc, e.token, e.records)?;
        }
        for e in desc.psd_info {
            insert_unique(&mut store.psds, RecordKind::Psd, e.token, e.records)?;
        }
        for e in desc.cpc_info {
            insert_unique(&mut store.cpcs, RecordKind::Cpc, e.token, e.records)?;
        }
        for e in desc.sta_info {
            insert_unique(&mut store.stas, RecordKind::Sta, e.token, e.records)?;
        }
        Ok(store)
    }
}

impl ConfigurationStore for InMemoryStore {
    fn processors(&self) -> Result<&[ProcessorRecord]> {
        Ok(&self.processors)
    }

    fn cross_reference(&self, token: Token) -> Result<&[ReferenceRecord]> {
        lookup(&self.cross_references, RecordKind::CrossReference, token)
    }

    fn cst_info(&self, token: Token) -> Result<&[CStateInfo]> {
        lookup(&self.cstates, RecordKind::CState, token)
    }

    fn csd_info(&self, token: Token) -> Result<&[CsdInfo]> {
        lookup(&self.csds, RecordKind::Csd, token)
    }

    fn pct_info(&self, token: Token) -> Result<&[PctInfo]> {
        lookup(&self.pcts, RecordKind::Pct, token)
    }

    fn pss_info(&self, token: Token) -> Result<&[PssInfo]> {
        lookup(&self.psss, RecordKind::Pss, token)
    }

    fn ppc_info(&self, token: Token) -> Result<&[PpcInfo]> {
        lookup(&self.ppcs, RecordKind::Ppc, token)
    }

    fn psd_info(&self, token: Token) -> Result<&[PsdInfo]> {
        lookup(&self.psds, RecordKind::Psd, token)
    }

    fn cpc_info(&self, token: Token) -> Result<&[CpcInfo]> {
        lookup(&self.cpcs, RecordKind::Cpc, token)
    }

    fn sta_info(&self, token: Token) -> Result<&[StaInfo]> {
        lookup(&self.stas, RecordKind::Sta, token)
    }
}

/// Records registered under one token.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry<T> {
    pub token: Token,
    pub records: Vec<T>,
}

/// JSON-facing platform description consumed by `gen-ssdt-topology`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformDescription {
    pub processors: Vec<ProcessorRecord>,
    pub cross_references: Vec<TokenEntry<ReferenceRecord>>,
    pub cst_info: Vec<TokenEntry<CStateInfo>>,
    pub csd_info: Vec<TokenEntry<CsdInfo>>,
    pub pct_info: Vec<TokenEntry<PctInfo>>,
    pub pss_info: Vec<TokenEntry<PssInfo>>,
    pub ppc_info: Vec<TokenEntry<PpcInfo>>,
    pub psd_info: Vec<TokenEntry<PsdInfo>>,
    pub cpc_info: Vec<TokenEntry<CpcInfo>>,
    pub sta_info: Vec<TokenEntry<StaInfo>>,
}

impl PlatformDescription {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_null_tokens_are_not_found() {
        let mut store = InMemoryStore::new();
        store.insert_sta(Token(5), StaInfo { device_status: 0xF });

        assert_eq!(store.sta_info(Token(5)).unwrap().len(), 1);
        assert_eq!(
            store.sta_info(Token(6)),
            Err(Error::NotFound {
                kind: RecordKind::Sta,
                token: Token(6)
            })
        );
        assert!(matches!(
            store.cross_reference(Token::NULL),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn description_rejects_duplicate_and_null_keys() {
        let dup = PlatformDescription {
            sta_info: vec![
                TokenEntry {
                    token: Token(1),
                    records: vec![StaInfo { device_status: 1 }],
                },
                TokenEntry {
                    token: Token(1),
                    records: vec![StaInfo { device_status: 3 }],
                },
            ],
            ..Default::default()
        };
        assert!(matches!(
            InMemoryStore::from_description(dup),
            Err(Error::InvalidArgument(_))
        ));

        let null = PlatformDescription {
            cross_references: vec![TokenEntry {
                token: Token::NULL,
                records: vec![],
            }],
            ..Default::default()
        };
        assert!(matches!(
            InMemoryStore::from_description(null),
            Err(Error::InvalidArgument(_))
        ));
    }
}

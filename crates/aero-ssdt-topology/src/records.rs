//! Records owned by the configuration store.

use core::fmt;

use aero_aml::GenericAddress;
use serde::{Deserialize, Serialize};

/// Opaque handle naming a record (or record array) in the configuration
/// store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub u64);

impl Token {
    /// Numeric spelling of "absent" in platform descriptions. Never a valid
    /// lookup key.
    pub const NULL: Token = Token(0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    pub fn non_null(self) -> Option<Token> {
        (!self.is_null()).then_some(self)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:#x})", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

fn normalize(token: Option<Token>) -> Option<Token> {
    token.and_then(Token::non_null)
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "GenericAddress", rename_all = "camelCase")]
struct GenericAddressDef {
    address_space: u8,
    bit_width: u8,
    bit_offset: u8,
    access_size: u8,
    address: u64,
}

/// One logical processor, with optional links to its power management data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorRecord {
    pub acpi_processor_uid: u32,
    pub cst_token: Option<Token>,
    pub csd_token: Option<Token>,
    pub pct_token: Option<Token>,
    pub pss_token: Option<Token>,
    pub ppc_token: Option<Token>,
    pub psd_token: Option<Token>,
    pub cpc_token: Option<Token>,
    pub sta_token: Option<Token>,
}

impl ProcessorRecord {
    pub fn new(acpi_processor_uid: u32) -> Self {
        Self {
            acpi_processor_uid,
            ..Default::default()
        }
    }

    /// Maps `Token::NULL` links to `None`.
    pub fn normalized(self) -> Self {
        Self {
            acpi_processor_uid: self.acpi_processor_uid,
            cst_token: normalize(self.cst_token),
            csd_token: normalize(self.csd_token),
            pct_token: normalize(self.pct_token),
            pss_token: normalize(self.pss_token),
            ppc_token: normalize(self.ppc_token),
            psd_token: normalize(self.psd_token),
            cpc_token: normalize(self.cpc_token),
            sta_token: normalize(self.sta_token),
        }
    }
}

/// Indirection record: points at another record array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub token: Token,
}

/// One `_CST` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CStateInfo {
    #[serde(with = "GenericAddressDef")]
    pub register: GenericAddress,
    pub cstate_type: u8,
    pub latency: u16,
    pub power: u32,
}

/// Dependency domain coordination type shared by `_CSD` and `_PSD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinationType {
    SwAll,
    SwAny,
    HwAll,
}

impl CoordinationType {
    pub fn value(self) -> u32 {
        match self {
            CoordinationType::SwAll => 0xFC,
            CoordinationType::SwAny => 0xFD,
            CoordinationType::HwAll => 0xFE,
        }
    }
}

/// One C-state dependency domain. `cst_pkg_ref_token` names the C-state
/// reference (inside some shared C-state group) the dependency applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdInfo {
    #[serde(default)]
    pub revision: u8,
    pub domain: u32,
    pub coord_type: CoordinationType,
    pub num_processors: u32,
    #[serde(default)]
    pub cst_pkg_ref_token: Option<Token>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PctInfo {
    #[serde(with = "GenericAddressDef")]
    pub control_register: GenericAddress,
    #[serde(with = "GenericAddressDef")]
    pub status_register: GenericAddress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PssInfo {
    /// MHz.
    pub core_frequency: u32,
    /// mW.
    pub power: u32,
    /// us.
    pub latency: u32,
    /// us.
    pub bus_master_latency: u32,
    pub control: u32,
    pub status: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PpcInfo {
    pub pstate_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsdInfo {
    #[serde(default)]
    pub revision: u8,
    pub domain: u32,
    pub coord_type: CoordinationType,
    pub num_processors: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CpcEntry {
    Integer(u32),
    Register(#[serde(with = "GenericAddressDef")] GenericAddress),
}

/// Continuous performance control package contents, in `_CPC` order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpcInfo {
    pub revision: u8,
    pub entries: Vec<CpcEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaInfo {
    pub device_status: u32,
}

bitflags::bitflags! {
    /// `_STA` bits this generator is willing to report.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct DeviceStatus: u32 {
        const PRESENT = 1 << 0;
        const ENABLED = 1 << 1;
        const SHOW_IN_UI = 1 << 2;
        const FUNCTIONING = 1 << 3;
    }
}

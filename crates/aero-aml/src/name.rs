use core::fmt;

use crate::encode::{
    AML_NAME_DUAL_PREFIX, AML_NAME_MULTI_PREFIX, AML_NAME_PARENT_PREFIX, AML_NAME_ROOT_PREFIX,
};
use crate::error::{AmlError, Result};

/// A single 4-character ACPI name segment (`NameSeg`).
///
/// Shorter names are padded with `_`, matching what iasl does for `_SB` and
/// friends.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameSeg([u8; 4]);

impl NameSeg {
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(AmlError::InvalidNameSeg(name.to_string()));
        }
        let mut out = [b'_'; 4];
        out[..bytes.len()].copy_from_slice(bytes);
        Self::from_bytes(out).map_err(|_| AmlError::InvalidNameSeg(name.to_string()))
    }

    /// LeadNameChar is `A-Z` or `_`; the rest may also be digits.
    pub fn from_bytes(bytes: [u8; 4]) -> Result<Self> {
        let lead_ok = bytes[0].is_ascii_uppercase() || bytes[0] == b'_';
        let rest_ok = bytes[1..]
            .iter()
            .all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
        if !(lead_ok && rest_ok) {
            return Err(AmlError::InvalidNameSeg(
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Validated as ASCII on construction.
        core::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameSeg({})", self.as_str())
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (possibly rooted or parent-relative) namespace path such as
/// `\_SB.CSTS.CST0`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NameString {
    root: bool,
    parent_prefixes: u8,
    segments: Vec<NameSeg>,
}

impl NameString {
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = || AmlError::InvalidNameString(path.to_string());

        let mut rest = path;
        let root = match rest.strip_prefix('\\') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        let mut parent_prefixes = 0u8;
        while let Some(stripped) = rest.strip_prefix('^') {
            if root {
                return Err(invalid());
            }
            parent_prefixes = parent_prefixes.checked_add(1).ok_or_else(invalid)?;
            rest = stripped;
        }

        let segments = rest
            .split('.')
            .map(|seg| NameSeg::new(seg).map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        if segments.len() > usize::from(u8::MAX) {
            return Err(invalid());
        }

        Ok(Self {
            root,
            parent_prefixes,
            segments,
        })
    }

    pub fn is_rooted(&self) -> bool {
        self.root
    }

    /// Last segment: the name the object is known by inside its parent.
    pub fn last(&self) -> NameSeg {
        // `parse` never produces an empty path.
        self.segments[self.segments.len() - 1]
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.segments.len() * 4 + 1);
        if self.root {
            out.push(AML_NAME_ROOT_PREFIX);
        }
        out.extend(core::iter::repeat(AML_NAME_PARENT_PREFIX).take(self.parent_prefixes.into()));

        match self.segments.as_slice() {
            [seg] => out.extend_from_slice(seg.as_bytes()),
            [a, b] => {
                out.push(AML_NAME_DUAL_PREFIX);
                out.extend_from_slice(a.as_bytes());
                out.extend_from_slice(b.as_bytes());
            }
            segs => {
                out.push(AML_NAME_MULTI_PREFIX);
                out.push(segs.len() as u8);
                for seg in segs {
                    out.extend_from_slice(seg.as_bytes());
                }
            }
        }
        out
    }
}

impl fmt::Display for NameString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root {
            f.write_str("\\")?;
        }
        for _ in 0..self.parent_prefixes {
            f.write_str("^")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(seg.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Debug for NameString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameString({self})")
    }
}

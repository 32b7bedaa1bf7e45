//! Cross-reference chain resolution.
//!
//! A C-state group token resolves in two reference steps before reaching the
//! leaf records:
//!
//! ```text
//! group token -> [group ref, ..] -> [state ref, ..] -> CStateInfo
//! ```
//!
//! Any broken link aborts with the store's error; there is no partial result.

use crate::error::Result;
use crate::records::{CStateInfo, ReferenceRecord, Token};
use crate::store::ConfigurationStore;

/// One chain step.
pub fn fetch_references<S: ConfigurationStore + ?Sized>(
    store: &S,
    token: Token,
) -> Result<&[ReferenceRecord]> {
    store.cross_reference(token)
}

/// Second-level (state) reference lists of a group, one per first-level
/// reference, in store order.
pub fn state_reference_lists<'s, S: ConfigurationStore + ?Sized>(
    store: &'s S,
    group: Token,
) -> Result<Vec<&'s [ReferenceRecord]>> {
    fetch_references(store, group)?
        .iter()
        .map(|group_ref| fetch_references(store, group_ref.token))
        .collect()
}

/// Every C-state leaf of a group, in emission order.
pub fn resolve_cstate_group<'s, S: ConfigurationStore + ?Sized>(
    store: &'s S,
    group: Token,
) -> Result<Vec<&'s CStateInfo>> {
    let mut leaves = Vec::new();
    for states in state_reference_lists(store, group)? {
        for state_ref in states {
            leaves.extend(store.cst_info(state_ref.token)?);
        }
    }
    Ok(leaves)
}

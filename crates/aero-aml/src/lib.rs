//! AML object tree builder.
//!
//! This crate implements the subset of AML needed to describe processor
//! devices and their power management objects: scopes, devices, named
//! objects, simple control methods, packages, buffers, integers, strings and
//! name references. It's not intended to be a general AML library.
//!
//! Objects are created as children of an existing node in an [`AmlTree`] and
//! serialized with [`AmlTree::serialize`].

pub mod encode;
mod error;
mod name;
mod resource;
mod tree;

pub use error::{AmlError, Result};
pub use name::{NameSeg, NameString};
pub use resource::{
    register_template, GenericAddress, ADDRESS_SPACE_FIXED_HARDWARE, ADDRESS_SPACE_SYSTEM_IO,
};
pub use tree::{AmlObject, AmlTree, NodeId};

//! Arena-backed AML object tree.
//!
//! Nodes are appended under a parent and never removed; the tree owns all of
//! them. A failed build is discarded by dropping the whole tree.

use crate::encode::{
    self, AML_EXT_OP_DEVICE, AML_EXT_OP_PREFIX, AML_OP_METHOD, AML_OP_NAME, AML_OP_PACKAGE,
    AML_OP_RETURN, AML_OP_SCOPE,
};
use crate::error::{AmlError, Result};
use crate::name::{NameSeg, NameString};
use crate::resource::{register_template, GenericAddress};

/// Handle to a node owned by an [`AmlTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AmlObject {
    /// Definition block body; serializes as its children back to back.
    Root,
    Scope(NameString),
    Device(NameSeg),
    /// `Name (seg, <child>)`.
    Name(NameSeg),
    Method {
        name: NameSeg,
        arg_count: u8,
        serialized: bool,
    },
    /// `Return (<child>)`.
    Return,
    Package,
    Integer(u64),
    String(String),
    Buffer(Vec<u8>),
    NameRef(NameString),
}

impl AmlObject {
    /// Name the object is declared under in its parent scope, if any.
    pub fn name(&self) -> Option<NameSeg> {
        match self {
            AmlObject::Scope(path) => Some(path.last()),
            AmlObject::Device(name) | AmlObject::Name(name) => Some(*name),
            AmlObject::Method { name, .. } => Some(*name),
            _ => None,
        }
    }

    fn max_children(&self) -> Option<usize> {
        match self {
            AmlObject::Root
            | AmlObject::Scope(_)
            | AmlObject::Device(_)
            | AmlObject::Method { .. } => Some(usize::MAX),
            AmlObject::Name(_) | AmlObject::Return => Some(1),
            // NumElements is a single byte.
            AmlObject::Package => Some(u8::MAX as usize),
            AmlObject::Integer(_)
            | AmlObject::String(_)
            | AmlObject::Buffer(_)
            | AmlObject::NameRef(_) => None,
        }
    }
}

#[derive(Debug)]
struct Node {
    object: AmlObject,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct AmlTree {
    nodes: Vec<Node>,
}

impl Default for AmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AmlTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                object: AmlObject::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(AmlError::UnknownNode(id))
    }

    pub fn object(&self, id: NodeId) -> Option<&AmlObject> {
        self.nodes.get(id.0).map(|n| &n.object)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// First direct child declared as `name`.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let name = NameSeg::new(name).ok()?;
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.object(child).and_then(AmlObject::name) == Some(name))
    }

    pub fn integer_value(&self, id: NodeId) -> Option<u64> {
        match self.object(id)? {
            AmlObject::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Creates `object` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, object: AmlObject) -> Result<NodeId> {
        let parent_node = self.node(parent)?;
        let max = parent_node
            .object
            .max_children()
            .ok_or(AmlError::NotAContainer(parent))?;
        if parent_node.children.len() >= max {
            return Err(AmlError::TooManyChildren { node: parent, max });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            object,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn set_integer(&mut self, id: NodeId, value: u64) -> Result<()> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.object) {
            Some(AmlObject::Integer(v)) => {
                *v = value;
                Ok(())
            }
            Some(_) => Err(AmlError::NotAnInteger(id)),
            None => Err(AmlError::UnknownNode(id)),
        }
    }

    pub fn create_scope(&mut self, parent: NodeId, path: &str) -> Result<NodeId> {
        let path = NameString::parse(path)?;
        self.append(parent, AmlObject::Scope(path))
    }

    pub fn create_device(&mut self, parent: NodeId, name: NameSeg) -> Result<NodeId> {
        self.append(parent, AmlObject::Device(name))
    }

    /// `Name (name, value)`; returns the value node so packages can be filled
    /// in afterwards.
    pub fn create_name(
        &mut self,
        parent: NodeId,
        name: NameSeg,
        value: AmlObject,
    ) -> Result<NodeId> {
        let name_node = self.append(parent, AmlObject::Name(name))?;
        self.append(name_node, value)
    }

    pub fn create_method(
        &mut self,
        parent: NodeId,
        name: NameSeg,
        arg_count: u8,
        serialized: bool,
    ) -> Result<NodeId> {
        if arg_count > 7 {
            return Err(AmlError::TooManyArgs(arg_count));
        }
        self.append(
            parent,
            AmlObject::Method {
                name,
                arg_count,
                serialized,
            },
        )
    }

    /// `Name (name, Package () { 0 })`, where the leading integer counts the
    /// entries appended with [`AmlTree::append_cstate`] (the `_CST` layout).
    pub fn create_named_package(&mut self, parent: NodeId, name: NameSeg) -> Result<NodeId> {
        let package = self.create_name(parent, name, AmlObject::Package)?;
        self.append(package, AmlObject::Integer(0))?;
        Ok(package)
    }

    /// Appends `Package () { ResourceTemplate () { Register (...) }, Type,
    /// Latency, Power }` to a counted package and bumps its count.
    pub fn append_cstate(
        &mut self,
        package: NodeId,
        register: &GenericAddress,
        cstate_type: u8,
        latency: u16,
        power: u32,
    ) -> Result<NodeId> {
        let count_node = match self.node(package)? {
            Node {
                object: AmlObject::Package,
                children,
                ..
            } => children.first().copied(),
            _ => None,
        };
        let Some(count_node) = count_node else {
            return Err(AmlError::NotACountedPackage(package));
        };
        let count = self
            .integer_value(count_node)
            .ok_or(AmlError::NotACountedPackage(package))?;

        let entry = self.append(package, AmlObject::Package)?;
        self.append(entry, AmlObject::Buffer(register_template(register)))?;
        self.append(entry, AmlObject::Integer(cstate_type.into()))?;
        self.append(entry, AmlObject::Integer(latency.into()))?;
        self.append(entry, AmlObject::Integer(power.into()))?;
        self.set_integer(count_node, count + 1)?;
        Ok(entry)
    }

    /// `Method (name, 0, NotSerialized) { Return (path) }`
    pub fn create_method_returning_reference(
        &mut self,
        parent: NodeId,
        name: NameSeg,
        path: &NameString,
    ) -> Result<NodeId> {
        let method = self.create_method(parent, name, 0, false)?;
        let ret = self.append(method, AmlObject::Return)?;
        self.append(ret, AmlObject::NameRef(path.clone()))?;
        Ok(method)
    }

    /// `Method (name, 0, NotSerialized) { Return (value) }`
    pub fn create_method_returning_integer(
        &mut self,
        parent: NodeId,
        name: NameSeg,
        value: u64,
    ) -> Result<NodeId> {
        let method = self.create_method(parent, name, 0, false)?;
        let ret = self.append(method, AmlObject::Return)?;
        self.append(ret, AmlObject::Integer(value))?;
        Ok(method)
    }

    /// Encodes `id` and its subtree as AML byte code.
    pub fn serialize(&self, id: NodeId) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_node(id, &mut out)?;
        Ok(out)
    }

    /// Encodes the children of `id` back to back (a definition block body).
    pub fn serialize_children(&self, id: NodeId) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_children(id, &mut out)?;
        Ok(out)
    }

    fn encode_children(&self, id: NodeId, out: &mut Vec<u8>) -> Result<()> {
        for &child in &self.node(id)?.children {
            self.encode_node(child, out)?;
        }
        Ok(())
    }

    fn encode_node(&self, id: NodeId, out: &mut Vec<u8>) -> Result<()> {
        let node = self.node(id)?;
        match &node.object {
            AmlObject::Root => self.encode_children(id, out)?,
            AmlObject::Scope(path) => {
                let mut payload = path.encode();
                self.encode_children(id, &mut payload)?;
                out.extend_from_slice(&encode::pkg(&[AML_OP_SCOPE], &payload)?);
            }
            AmlObject::Device(name) => {
                let mut payload = name.as_bytes().to_vec();
                self.encode_children(id, &mut payload)?;
                out.extend_from_slice(&encode::pkg(
                    &[AML_EXT_OP_PREFIX, AML_EXT_OP_DEVICE],
                    &payload,
                )?);
            }
            AmlObject::Name(name) => {
                out.push(AML_OP_NAME);
                out.extend_from_slice(name.as_bytes());
                self.encode_children(id, out)?;
            }
            AmlObject::Method {
                name,
                arg_count,
                serialized,
            } => {
                let flags = (arg_count & 0x07) | if *serialized { 0x08 } else { 0x00 };
                let mut payload = name.as_bytes().to_vec();
                payload.push(flags);
                self.encode_children(id, &mut payload)?;
                out.extend_from_slice(&encode::pkg(&[AML_OP_METHOD], &payload)?);
            }
            AmlObject::Return => {
                out.push(AML_OP_RETURN);
                self.encode_children(id, out)?;
            }
            AmlObject::Package => {
                // Bounded to 255 by `append`.
                let mut payload = vec![node.children.len() as u8];
                self.encode_children(id, &mut payload)?;
                out.extend_from_slice(&encode::pkg(&[AML_OP_PACKAGE], &payload)?);
            }
            AmlObject::Integer(value) => out.extend_from_slice(&encode::integer(*value)),
            AmlObject::String(value) => out.extend_from_slice(&encode::string(value)?),
            AmlObject::Buffer(raw) => out.extend_from_slice(&encode::buffer(raw)?),
            AmlObject::NameRef(path) => out.extend_from_slice(&path.encode()),
        }
        Ok(())
    }
}

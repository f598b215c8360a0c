//! Per-port view over an output tree with coordinate addressing.

use std::fmt;

use reqwest::Url;

use super::{DataLeaf, OutputNode, PortDescriptor};
use crate::{
    error::{Error, Result},
    fetch::Remote,
};

/// A named output port of fixed depth and its value tree.
#[derive(Debug)]
pub struct PortView {
    name: String,
    depth: u32,
    root: OutputNode,
}

impl PortView {
    /// Wrap `root`, rejecting trees whose leaves are not all `depth` lists deep.
    pub fn new(name: impl Into<String>, depth: u32, root: OutputNode) -> Result<Self> {
        root.verify_depth(depth, 0)?;
        Ok(Self { name: name.into(), depth, root })
    }

    pub fn from_descriptor(desc: &PortDescriptor, remote: &Remote, base: Option<&Url>) -> Result<Self> {
        let root = desc.value.build(remote, base)?;
        Self::new(desc.name.clone(), desc.depth, root)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn root(&self) -> &OutputNode {
        &self.root
    }

    /// The leaf at `coords`; exactly one coordinate per list level.
    pub fn get_value(&self, coords: &[usize]) -> Result<&OutputNode> {
        if coords.len() != self.depth as usize {
            return Err(Error::DepthMismatch { expected: self.depth, found: coords.len() as u32 });
        }
        let mut node = &self.root;
        for &index in coords {
            node = node.child(index)?;
        }
        Ok(node)
    }

    /// The single value of a depth-0 port.
    pub fn value(&self) -> Result<&OutputNode> {
        self.get_value(&[])
    }

    pub fn data(&self, coords: &[usize]) -> Result<&DataLeaf> {
        self.get_value(coords)?.as_data()
    }

    pub fn is_error(&self) -> bool {
        self.root.is_error()
    }

    pub fn total_data_size(&self) -> u64 {
        self.root.total_data_size()
    }

    /// Every leaf with its coordinates, in document order.
    pub fn leaves(&self) -> Vec<(Vec<usize>, &OutputNode)> {
        let mut out = Vec::new();
        collect(&self.root, &mut Vec::new(), &mut out);
        out
    }
}

fn collect<'a>(node: &'a OutputNode, path: &mut Vec<usize>, out: &mut Vec<(Vec<usize>, &'a OutputNode)>) {
    match node {
        OutputNode::List(children) => {
            for (i, child) in children.iter().enumerate() {
                path.push(i);
                collect(child, path, out);
                path.pop();
            }
        }
        leaf => out.push((path.clone(), leaf)),
    }
}

impl fmt::Display for PortView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (depth {}) {{", self.name, self.depth)?;
        self.root.render(f, 1)?;
        write!(f, "\n}}")
    }
}

//! JSON description of a run's output ports and their value trees.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{DataLeaf, ErrorLeaf, OutputNode};
use crate::{
    error::{Error, Result},
    fetch::Remote,
};

/// Whole output description of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsDescriptor {
    #[serde(default)]
    pub ports: Vec<PortDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub name: String,
    pub depth: u32,
    pub value: NodeDescriptor,
}

/// One node of a port's value tree as the server describes it.
///
/// `kind` is one of `value`, `list` or `error`; which other fields are required
/// depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_byte_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDescriptor>,
}

enum Kind {
    Value,
    List,
    Error,
}

impl NodeDescriptor {
    fn classify(&self) -> Result<Kind> {
        let kind = self.kind.to_ascii_lowercase();
        match kind.as_str() {
            "value" => Ok(Kind::Value),
            "list" => Ok(Kind::List),
            "error" => Ok(Kind::Error),
            _ => Err(Error::MalformedStructure(format!("unknown node kind '{}'", self.kind))),
        }
    }

    fn reference(&self, base: Option<&Url>) -> Result<Url> {
        let href = self
            .href
            .as_deref()
            .ok_or_else(|| Error::MalformedStructure(format!("{} node without href", self.kind)))?;
        Url::options()
            .base_url(base)
            .parse(href)
            .map_err(|e| Error::MalformedStructure(format!("bad href '{}': {}", href, e)))
    }

    /// Build the output tree this descriptor describes.
    ///
    /// Relative `href`s resolve against `base`. List children keep document order.
    pub fn build(&self, remote: &Remote, base: Option<&Url>) -> Result<OutputNode> {
        match self.classify()? {
            Kind::Value => {
                let reference = self.reference(base)?;
                let content_type = self.content_type.clone().ok_or_else(|| {
                    Error::MalformedStructure(format!("value '{}' without content type", reference))
                })?;
                let size = self.content_byte_length.ok_or_else(|| {
                    Error::MalformedStructure(format!("value '{}' without byte length", reference))
                })?;
                Ok(OutputNode::Data(DataLeaf::new(remote.clone(), reference, content_type, size)))
            }
            Kind::Error => {
                let reference = self.reference(base)?;
                Ok(OutputNode::Error(ErrorLeaf::new(remote.clone(), reference)))
            }
            Kind::List => self
                .children
                .iter()
                .map(|child| child.build(remote, base))
                .collect::<Result<Vec<_>>>()
                .map(OutputNode::List),
        }
    }
}

//! Output value trees: data leaves, error leaves and nested lists.

mod metadata;
mod port;

pub use metadata::{NodeDescriptor, OutputsDescriptor, PortDescriptor};
pub use port::PortView;

use std::{
    fmt,
    io::{self, Cursor, Read, Write},
    sync::{Mutex, PoisonError},
};

use reqwest::Url;

use crate::{
    cache::ValueCache,
    error::{Error, Result},
    fetch::Remote,
};

/// Content type of a value that holds no bytes at all.
pub const EMPTY_TYPE: &str = "application/x-empty";
/// Content type reported for error leaves.
pub const ERROR_TYPE: &str = "application/x-error";
/// Content type reported for lists.
pub const LIST_TYPE: &str = "application/x-list";

/// One node of a port's output tree.
///
/// The tree shape is fixed once built; only the caches inside data leaves change.
#[derive(Debug)]
pub enum OutputNode {
    Data(DataLeaf),
    Error(ErrorLeaf),
    List(Vec<OutputNode>),
}

impl OutputNode {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, OutputNode::List(_))
    }

    /// True if this node, or any leaf below it, is an error.
    pub fn is_error(&self) -> bool {
        match self {
            OutputNode::Data(_) => false,
            OutputNode::Error(_) => true,
            OutputNode::List(children) => children.iter().any(OutputNode::is_error),
        }
    }

    /// Sum of declared sizes of all data leaves at or below this node.
    pub fn total_data_size(&self) -> u64 {
        match self {
            OutputNode::Data(leaf) => leaf.size(),
            OutputNode::Error(_) => 0,
            OutputNode::List(children) => children.iter().map(OutputNode::total_data_size).sum(),
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            OutputNode::Data(leaf) => leaf.content_type(),
            OutputNode::Error(_) => ERROR_TYPE,
            OutputNode::List(_) => LIST_TYPE,
        }
    }

    /// Number of children; zero for leaves.
    pub fn len(&self) -> usize {
        match self {
            OutputNode::List(children) => children.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child(&self, index: usize) -> Result<&OutputNode> {
        match self {
            OutputNode::List(children) => children
                .get(index)
                .ok_or(Error::IndexOutOfBounds { index, len: children.len() }),
            _ => Err(Error::IndexOutOfBounds { index, len: 0 }),
        }
    }

    pub fn as_data(&self) -> Result<&DataLeaf> {
        match self {
            OutputNode::Data(leaf) => Ok(leaf),
            _ => Err(Error::NotADataValue),
        }
    }

    pub fn as_error(&self) -> Option<&ErrorLeaf> {
        match self {
            OutputNode::Error(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Read bytes `lo..=hi` of a data leaf.
    pub fn read(&self, lo: u64, hi: u64) -> Result<Vec<u8>> {
        self.as_data()?.read(lo, hi)
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        self.as_data()?.read_all()
    }

    /// Check that every leaf sits exactly `expected` list levels below this node.
    pub(crate) fn verify_depth(&self, expected: u32, level: u32) -> Result<()> {
        match self {
            OutputNode::Data(_) | OutputNode::Error(_) if level == expected => Ok(()),
            OutputNode::Data(_) | OutputNode::Error(_) => {
                Err(Error::DepthMismatch { expected, found: level })
            }
            OutputNode::List(_) if level >= expected => {
                Err(Error::DepthMismatch { expected, found: level + 1 })
            }
            OutputNode::List(children) => children
                .iter()
                .try_for_each(|child| child.verify_depth(expected, level + 1)),
        }
    }

    pub(crate) fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let spaces = " ".repeat(indent);
        match self {
            OutputNode::Data(leaf) => {
                writeln!(f, "{}Reference:    {}", spaces, leaf.reference())?;
                writeln!(f, "{}Content type: {}", spaces, leaf.content_type())?;
                write!(f, "{}Data size:    {}", spaces, leaf.size())
            }
            OutputNode::Error(leaf) => {
                writeln!(f, "{}Reference:    {}", spaces, leaf.reference())?;
                write!(f, "{}Content type: {}", spaces, ERROR_TYPE)
            }
            OutputNode::List(children) => {
                writeln!(f, "{}[", spaces)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        writeln!(f, ",")?;
                    }
                    child.render(f, indent + 1)?;
                }
                if !children.is_empty() {
                    writeln!(f)?;
                }
                write!(f, "{}]", spaces)
            }
        }
    }
}

impl fmt::Display for OutputNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

/// A remote value with a declared size and its partial-range cache.
#[derive(Debug)]
pub struct DataLeaf {
    remote: Remote,
    reference: Url,
    content_type: String,
    size: u64,
    cache: ValueCache,
}

impl DataLeaf {
    pub fn new(remote: Remote, reference: Url, content_type: impl Into<String>, size: u64) -> Self {
        let content_type = content_type.into();
        let cache = if size == 0 || content_type == EMPTY_TYPE {
            ValueCache::empty()
        } else {
            ValueCache::new(size)
        };
        Self { remote, reference, content_type, size, cache }
    }

    pub fn reference(&self) -> &Url {
        &self.reference
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Declared size in bytes, independent of how much has been fetched.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }

    pub fn read(&self, lo: u64, hi: u64) -> Result<Vec<u8>> {
        self.cache
            .read_with(lo, hi, |range| self.remote.read(&self.reference, Some(range)))
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        match self.size {
            0 => Ok(Vec::new()),
            n => self.read(0, n - 1),
        }
    }

    /// Whole value decoded as UTF-8, replacing invalid sequences.
    pub fn read_text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.read_all()?).into_owned())
    }

    /// Stream the whole value without filling the cache.
    ///
    /// A fully cached value is served locally instead.
    pub fn stream(&self) -> Result<Box<dyn Read + Send>> {
        if self.cache.is_complete() {
            return Ok(Box::new(Cursor::new(self.cache.cached_bytes())));
        }
        self.remote.open(&self.reference)
    }

    /// Copy the whole value into `out`; returns the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<u64> {
        let mut stream = self.stream()?;
        Ok(io::copy(&mut stream, out)?)
    }
}

/// A failed value; its reference points at the error text.
#[derive(Debug)]
pub struct ErrorLeaf {
    remote: Remote,
    reference: Url,
    message: Mutex<Option<String>>,
}

impl ErrorLeaf {
    pub fn new(remote: Remote, reference: Url) -> Self {
        Self { remote, reference, message: Mutex::new(None) }
    }

    pub fn reference(&self) -> &Url {
        &self.reference
    }

    /// The error text, fetched on first call and held afterwards.
    pub fn message(&self) -> Result<String> {
        let mut message = self.message.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(text) = message.as_ref() {
            return Ok(text.clone());
        }
        let bytes = self.remote.read(&self.reference, None)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        *message = Some(text.clone());
        Ok(text)
    }
}

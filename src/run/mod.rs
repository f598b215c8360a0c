//! The output ports of one run, built lazily from the server's description.

use std::{collections::BTreeMap, fmt, sync::OnceLock};

use reqwest::Url;
use tracing::debug;

use crate::{
    error::{Error, Result},
    fetch::Remote,
    output::{OutputsDescriptor, PortView},
};

/// Output ports of a run.
///
/// The description is fetched and parsed on first access; the resulting trees
/// live as long as this value and are never rebuilt.
pub struct RunOutputs {
    remote: Remote,
    description: Url,
    ports: OnceLock<BTreeMap<String, PortView>>,
}

impl RunOutputs {
    pub fn new(remote: Remote, description: Url) -> Self {
        Self { remote, description, ports: OnceLock::new() }
    }

    /// Build straight from an already fetched description document.
    pub fn from_document(remote: Remote, description: Url, document: &str) -> Result<Self> {
        let ports = parse(&remote, &description, document.as_bytes())?;
        let outputs = Self::new(remote, description);
        let _ = outputs.ports.set(ports);
        Ok(outputs)
    }

    pub fn description_uri(&self) -> &Url {
        &self.description
    }

    pub fn ports(&self) -> Result<&BTreeMap<String, PortView>> {
        if let Some(ports) = self.ports.get() {
            return Ok(ports);
        }
        debug!(description = %self.description, "loading output description");
        let document = self.remote.read(&self.description, None)?;
        let ports = parse(&self.remote, &self.description, &document)?;
        // A concurrent loader may have won; either result describes the same run.
        Ok(self.ports.get_or_init(|| ports))
    }

    pub fn port(&self, name: &str) -> Result<&PortView> {
        self.ports()?
            .get(name)
            .ok_or_else(|| Error::PortNotFound(name.to_string()))
    }

    pub fn port_names(&self) -> Result<Vec<&str>> {
        Ok(self.ports()?.keys().map(String::as_str).collect())
    }
}

fn parse(remote: &Remote, base: &Url, document: &[u8]) -> Result<BTreeMap<String, PortView>> {
    let desc: OutputsDescriptor = serde_json::from_slice(document)?;
    let mut ports = BTreeMap::new();
    for p in &desc.ports {
        if ports.contains_key(&p.name) {
            return Err(Error::MalformedStructure(format!("duplicate output port '{}'", p.name)));
        }
        ports.insert(p.name.clone(), PortView::from_descriptor(p, remote, Some(base))?);
    }
    Ok(ports)
}

impl fmt::Debug for RunOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOutputs")
            .field("description", &self.description)
            .field("loaded", &self.ports.get().is_some())
            .finish()
    }
}

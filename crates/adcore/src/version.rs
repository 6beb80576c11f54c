//! Layered version reporting for adapters.
//!
//! Mediation hosts report three versions per adapter: this crate, the adapter
//! release built on it, and the network SDK underneath.

use std::fmt;

pub const ADCORE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VersionInfo {
    pub core: &'static str,
    /// Adapter release from `AdapterConfig::adapter_version`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,
    /// As reported by `AdNetwork::sdk_version`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_sdk: Option<String>,
}

impl VersionInfo {
    /// Only the core version is known.
    pub fn new() -> Self {
        Self {
            core: ADCORE_VERSION,
            adapter: None,
            network_sdk: None,
        }
    }

    pub fn with_adapter(mut self, version: impl Into<String>) -> Self {
        self.adapter = Some(version.into());
        self
    }

    pub fn with_network_sdk(mut self, version: impl Into<String>) -> Self {
        self.network_sdk = Some(version.into());
        self
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// `adcore/0.4.0 adapter/4.1.0.0 sdk/9.2.0`, skipping unknown layers.
impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adcore/{}", self.core)?;
        if let Some(adapter) = &self.adapter {
            write!(f, " adapter/{adapter}")?;
        }
        if let Some(sdk) = &self.network_sdk {
            write!(f, " sdk/{sdk}")?;
        }
        Ok(())
    }
}

//! JSON catalog of the command interface.
//!
//! Dumps every function and event with its metadata, for tooling that does
//! not want to parse help text.

use crate::com::{EventInfo, FunctionInfo, Registry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CatalogDump {
    pub functions: BTreeMap<String, FunctionInfo>,
    pub events: BTreeMap<String, EventInfo>,
    pub domains: Vec<String>,
    pub writer_domains: Vec<String>,
}

impl CatalogDump {
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            functions: registry.functions().into_iter().collect(),
            events: registry.events().into_iter().collect(),
            domains: registry.domains(),
            writer_domains: registry.queues().domains(),
        }
    }
}

/// Pretty-printed JSON catalog of `registry`.
pub fn generate_catalog(registry: &Registry) -> Result<String, String> {
    serde_json::to_string_pretty(&CatalogDump::from_registry(registry))
        .map_err(|e| format!("Failed to serialize command catalog: {e}"))
}

pub fn write_catalog(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

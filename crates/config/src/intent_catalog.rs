//! In-memory intent/keyword catalog consulted by Tiers 1 and 2.
//!
//! Intentions, system keywords and service keywords are immutable within a
//! process lifetime (§5): they load once from YAML at startup and are only
//! replaced wholesale on an invalidation event, never mutated in place.

use reserva_core::domain::{Intention, ServiceKeyword, SystemKeyword};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    system_keywords: Vec<SystemKeyword>,
    #[serde(default)]
    service_keywords: Vec<ServiceKeyword>,
    /// Tenant intentions, keyed by company id as a string in the YAML file.
    #[serde(default)]
    intentions: HashMap<Uuid, Vec<Intention>>,
}

/// Read-mostly snapshot of every tenant's intentions plus the global
/// system/service keyword tables. Swapped as a whole `Arc` on reload.
#[derive(Debug, Default)]
pub struct IntentCatalog {
    system_keywords: Vec<SystemKeyword>,
    service_keywords: Vec<ServiceKeyword>,
    intentions_by_company: HashMap<Uuid, Vec<Intention>>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {0}: {1}")]
    Read(String, std::io::Error),
    #[error("failed to parse catalog file {0}: {1}")]
    Parse(String, serde_yaml::Error),
}

impl IntentCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Read(path.display().to_string(), e))?;
        let file: CatalogFile = serde_yaml::from_str(&content)
            .map_err(|e| CatalogError::Parse(path.display().to_string(), e))?;

        Ok(Arc::new(Self {
            system_keywords: file.system_keywords,
            service_keywords: file.service_keywords,
            intentions_by_company: file.intentions,
        }))
    }

    pub fn system_keywords(&self) -> &[SystemKeyword] {
        &self.system_keywords
    }

    pub fn service_keywords_for(&self, company_id: Uuid) -> Vec<&ServiceKeyword> {
        self.service_keywords
            .iter()
            .filter(|k| k.company_id.is_none() || k.company_id == Some(company_id))
            .collect()
    }

    pub fn intentions_for(&self, company_id: Uuid) -> &[Intention] {
        self.intentions_by_company
            .get(&company_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_has_no_intentions_for_unknown_company() {
        let catalog = IntentCatalog::default();
        assert!(catalog.intentions_for(Uuid::new_v4()).is_empty());
    }
}

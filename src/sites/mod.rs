use std::collections::HashMap;

use crate::core::config::SiteConfig;
use crate::core::error::{Result, ScoutError};
use crate::interfaces::CatalogSite;

pub mod ebook_hunter;

// ============================================================================
// 站点注册表
// ============================================================================

type SiteFactory = Box<dyn Fn(SiteConfig) -> Result<Box<dyn CatalogSite>> + Send + Sync>;

pub struct SiteRegistry {
    factories: HashMap<String, SiteFactory>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("ebook-hunter", |cfg| {
            Ok(Box::new(ebook_hunter::EbookHunter::new(cfg)?))
        });
        registry
    }

    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(SiteConfig) -> Result<Box<dyn CatalogSite>> + Send + Sync + 'static,
    {
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    pub fn create(&self, id: &str, config: SiteConfig) -> Result<Box<dyn CatalogSite>> {
        let factory = self.factories.get(id).ok_or_else(|| {
            ScoutError::Validation(format!(
                "unknown site '{}', available: {}",
                id,
                self.list().join(", ")
            ))
        })?;
        factory(config)
    }

    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// A catalog card as persisted and shown by the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub name: String,
    pub set: String,
    pub number: String,
    #[serde(rename = "image")]
    pub image_url: String,
}

/// One record returned by the catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub name: String,
    pub set_id: String,
    pub number: String,
    pub image_url: String,
}

impl From<CatalogRecord> for ResolvedItem {
    fn from(record: CatalogRecord) -> Self {
        ResolvedItem {
            name: record.name,
            set: record.set_id,
            number: record.number,
            image_url: record.image_url,
        }
    }
}

/// External catalog search. An empty result means "no match".
#[async_trait]
pub trait LookupProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, LookupError>;
}

pub struct CatalogResolver<L: LookupProvider> {
    lookup: L,
}

impl<L: LookupProvider> CatalogResolver<L> {
    pub fn new(lookup: L) -> Self {
        CatalogResolver { lookup }
    }

    /// Queries in the order they are tried: set + number first when a set code
    /// is known, then name + number.
    pub fn build_queries(name: &str, number: &str, set_code: Option<&str>) -> Vec<String> {
        let mut queries = Vec::with_capacity(2);

        if let Some(set_code) = set_code.map(str::trim).filter(|s| !s.is_empty()) {
            queries.push(format!("set.id:{} number:{}", set_code, number));
        }

        let name = name.replace('"', "");
        queries.push(format!("name:\"{}\" number:{}", name, number));

        queries
    }

    /// Resolves a normalized candidate. Any lookup error falls through to the
    /// next query; `None` only once every query came back empty or failed.
    pub async fn resolve(&self, name: &str, number: &str, set_code: Option<&str>) -> Option<ResolvedItem> {
        for query in Self::build_queries(name, number, set_code) {
            debug!("Catalog query: {}", query);

            match self.lookup.search(&query).await {
                Ok(records) => {
                    if let Some(record) = records.into_iter().next() {
                        let item = ResolvedItem::from(record);
                        info!("✅ Card resolved: {} ({} {})", item.name, item.set, item.number);
                        return Some(item);
                    }
                    debug!("No catalog match for query: {}", query);
                }
                Err(e) => {
                    warn!("⚠️  Catalog lookup failed for '{}': {}", query, e);
                }
            }
        }

        warn!("⚠️  Card not found in catalog: {} ({})", name, number);
        None
    }
}

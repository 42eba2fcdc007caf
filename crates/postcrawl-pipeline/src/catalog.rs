//! Resolves the catalog table to validate after a crawl.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::WorkflowFailure;
use crate::service::{CatalogEntry, CatalogService};

/// Picks one catalog entry by name prefix.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    service: Arc<dyn CatalogService>,
}

impl CatalogResolver {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self { service }
    }

    /// Return the first entry in `database` matching `prefix*`.
    ///
    /// "First" is whatever the catalog returns first; no local sorting is
    /// applied, so several tables sharing a prefix resolve in the catalog's
    /// own order.
    pub async fn resolve(
        &self,
        database: &str,
        prefix: &str,
    ) -> Result<CatalogEntry, WorkflowFailure> {
        info!(prefix, database, "Getting table for prefix");
        let entries = self.service.list_entries(database, prefix).await?;

        let Some(entry) = entries.into_iter().next() else {
            warn!(prefix, database, "No tables found with prefix");
            return Err(WorkflowFailure::NoMatchingEntry {
                database: database.to_string(),
                prefix: prefix.to_string(),
            });
        };

        info!(table = %entry.name, "Using table");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::mock::{ScriptedCatalog, ServiceCall};

    #[tokio::test]
    async fn test_first_returned_entry_wins() {
        let catalog = Arc::new(ScriptedCatalog::new([
            CatalogEntry::new("csv_zeta", "lake"),
            CatalogEntry::new("csv_alpha", "lake"),
        ]));
        let resolver = CatalogResolver::new(catalog.clone());

        let entry = resolver.resolve("lake", "csv_").await.unwrap();

        // Service order, not alphabetical.
        assert_eq!(entry.name, "csv_zeta");
        assert_eq!(
            catalog.calls(),
            vec![ServiceCall::ListEntries {
                database: "lake".into(),
                prefix: "csv_".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_no_matching_entry() {
        let catalog = Arc::new(ScriptedCatalog::new([CatalogEntry::new("json_events", "lake")]));
        let resolver = CatalogResolver::new(catalog);

        let err = resolver.resolve("lake", "txt_").await.unwrap_err();
        assert_eq!(
            err,
            WorkflowFailure::NoMatchingEntry {
                database: "lake".into(),
                prefix: "txt_".into()
            }
        );
        assert_eq!(err.reason(), "NoMatchingEntry");
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let catalog = Arc::new(
            ScriptedCatalog::new([]).with_error(ServiceError::new("glue:GetTables", "throttled")),
        );
        let resolver = CatalogResolver::new(catalog);

        let err = resolver.resolve("lake", "csv_").await.unwrap_err();
        assert!(matches!(err, WorkflowFailure::Service(_)));
    }
}

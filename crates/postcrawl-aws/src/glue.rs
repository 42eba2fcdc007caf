//! AWS Glue adapters: crawlers and the Data Catalog.

use std::sync::Arc;

use async_trait::async_trait;
use postcrawl_pipeline::{
    CatalogEntry, CatalogService, RefreshState, RefreshTaskService, ServiceError,
};
use tracing::debug;

use crate::{SdkClients, service_error};

/// Crawler control through `StartCrawler` / `GetCrawler`.
#[derive(Debug, Clone)]
pub struct GlueCrawlers {
    clients: Arc<SdkClients>,
}

impl GlueCrawlers {
    pub fn new(clients: Arc<SdkClients>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl RefreshTaskService for GlueCrawlers {
    async fn start(&self, name: &str) -> Result<(), ServiceError> {
        let client = self.clients.glue().await;
        match client.start_crawler().name(name).send().await {
            Ok(_) => Ok(()),
            // Another run is already in flight; waiting on it is just as good.
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_crawler_running_exception()) =>
            {
                debug!(crawler = name, "Crawler already running");
                Ok(())
            }
            Err(err) => Err(service_error("glue:StartCrawler", err)),
        }
    }

    async fn state(&self, name: &str) -> Result<RefreshState, ServiceError> {
        let output = self
            .clients
            .glue()
            .await
            .get_crawler()
            .name(name)
            .send()
            .await
            .map_err(|e| service_error("glue:GetCrawler", e))?;

        let state = output
            .crawler()
            .and_then(|crawler| crawler.state())
            .map(|state| state.as_str());
        parse_crawler_state(name, state)
    }
}

fn parse_crawler_state(name: &str, state: Option<&str>) -> Result<RefreshState, ServiceError> {
    state.map(RefreshState::parse).ok_or_else(|| {
        ServiceError::new(
            "glue:GetCrawler",
            format!("crawler {name} reported no state"),
        )
    })
}

/// Table lookup through `GetTables`.
#[derive(Debug, Clone)]
pub struct GlueCatalog {
    clients: Arc<SdkClients>,
}

impl GlueCatalog {
    pub fn new(clients: Arc<SdkClients>) -> Self {
        Self { clients }
    }
}

/// Glue `GetTables` expression for a name prefix.
pub fn prefix_expression(prefix: &str) -> String {
    format!("{prefix}*")
}

#[async_trait]
impl CatalogService for GlueCatalog {
    async fn list_entries(
        &self,
        database: &str,
        prefix: &str,
    ) -> Result<Vec<CatalogEntry>, ServiceError> {
        // Only the first page is read; the workflow uses the first table.
        let output = self
            .clients
            .glue()
            .await
            .get_tables()
            .database_name(database)
            .expression(prefix_expression(prefix))
            .send()
            .await
            .map_err(|e| service_error("glue:GetTables", e))?;

        Ok(output
            .table_list()
            .iter()
            .map(|table| CatalogEntry::new(table.name(), table.database_name().unwrap_or(database)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_expression() {
        assert_eq!(prefix_expression("csv_"), "csv_*");
    }

    #[test]
    fn test_parse_crawler_state() {
        assert_eq!(
            parse_crawler_state("c", Some("READY")).unwrap(),
            RefreshState::Ready
        );
        assert_eq!(
            parse_crawler_state("c", Some("RUNNING")).unwrap(),
            RefreshState::Running
        );
        let err = parse_crawler_state("c", None).unwrap_err();
        assert!(err.message.contains("no state"));
    }
}

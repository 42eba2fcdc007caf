//! AWS adapters for the postcrawl workflow.
//!
//! - [`GlueCrawlers`]: crawler start/state via AWS Glue
//! - [`GlueCatalog`]: table lookup in the Glue Data Catalog
//! - [`AthenaQueries`]: validation queries via Amazon Athena
//!
//! [`connect`] returns a [`Services`] bundle for the orchestrator. The SDK
//! config is loaded once, on the first service call.

pub mod athena;
pub mod glue;

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use postcrawl_config::AwsSection;
use postcrawl_pipeline::{ServiceError, Services};
use tokio::sync::OnceCell;
use tracing::debug;

pub use athena::AthenaQueries;
pub use glue::{GlueCatalog, GlueCrawlers};

/// SDK clients built on first use.
///
/// Nothing is resolved (region, credentials, profile files) until an adapter
/// makes its first call, so a signal rejected before any service call never
/// touches the SDK's provider chain.
#[derive(Debug)]
pub struct SdkClients {
    aws: AwsSection,
    config: OnceCell<SdkConfig>,
    glue: OnceCell<aws_sdk_glue::Client>,
    athena: OnceCell<aws_sdk_athena::Client>,
}

impl SdkClients {
    pub fn new(aws: &AwsSection) -> Self {
        Self {
            aws: aws.clone(),
            config: OnceCell::new(),
            glue: OnceCell::new(),
            athena: OnceCell::new(),
        }
    }

    /// Whether the shared SDK config has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.config.initialized()
    }

    async fn sdk_config(&self) -> &SdkConfig {
        self.config
            .get_or_init(|| async {
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(region) = &self.aws.region {
                    loader = loader.region(Region::new(region.clone()));
                }
                if let Some(profile) = &self.aws.profile {
                    loader = loader.profile_name(profile);
                }
                let sdk_config = loader.load().await;
                debug!(region = ?sdk_config.region(), "Loaded AWS configuration");
                sdk_config
            })
            .await
    }

    pub(crate) async fn glue(&self) -> &aws_sdk_glue::Client {
        self.glue
            .get_or_init(|| async { aws_sdk_glue::Client::new(self.sdk_config().await) })
            .await
    }

    pub(crate) async fn athena(&self) -> &aws_sdk_athena::Client {
        self.athena
            .get_or_init(|| async { aws_sdk_athena::Client::new(self.sdk_config().await) })
            .await
    }
}

/// Build the three service adapters over shared, lazily loaded SDK clients.
///
/// Region and profile from `[aws]` override the SDK's default chain.
pub fn connect(aws: &AwsSection) -> Services {
    services(Arc::new(SdkClients::new(aws)))
}

fn services(clients: Arc<SdkClients>) -> Services {
    Services {
        refresh: Arc::new(GlueCrawlers::new(clients.clone())),
        catalog: Arc::new(GlueCatalog::new(clients.clone())),
        query: Arc::new(AthenaQueries::new(clients)),
    }
}

/// Render an SDK error with its full source chain.
pub(crate) fn service_error<E>(operation: &str, err: E) -> ServiceError
where
    E: std::error::Error,
{
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ServiceError::new(operation, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postcrawl_pipeline::{CompletionSignal, CrawlerNames, Orchestrator, WorkflowSettings};

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("service error")
        }
    }

    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("AccessDeniedException")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    impl std::error::Error for Inner {}

    #[tokio::test]
    async fn test_unclassified_signal_never_loads_sdk() {
        let clients = Arc::new(SdkClients::new(&AwsSection::default()));
        let settings = WorkflowSettings::new(
            CrawlerNames {
                txt: "t".into(),
                csv: "c".into(),
                json: "j".into(),
            },
            "lake",
            "s3://out/results/",
        );
        let orchestrator = Orchestrator::new(services(clients.clone()), settings);
        let signal = CompletionSignal::from_json(r#"{"detail": {"jobName": "cleanup-job"}}"#)
            .unwrap();

        let outcome = orchestrator.handle(&signal).await;

        assert_eq!(outcome.reason().as_deref(), Some("UnclassifiedSignal"));
        assert!(!clients.is_loaded());
    }

    #[test]
    fn test_service_error_includes_sources() {
        let err = service_error("glue:GetTables", Outer(Inner));
        assert_eq!(err.operation, "glue:GetTables");
        assert_eq!(err.message, "service error: AccessDeniedException");
    }
}

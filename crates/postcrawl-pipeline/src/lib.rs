//! Completion-handling workflow for postcrawl.
//!
//! When an upstream batch job finishes, this crate refreshes the catalog for
//! the data it produced and proves the data is queryable:
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  classifier  │ → │  crawler   │ → │   catalog    │ → │     query     │
//! │ job → crawler│   │ start+wait │   │ prefix match │   │ SELECT * wait │
//! └──────────────┘   └────────────┘   └──────────────┘   └───────────────┘
//!                 all driven by the `Orchestrator`, one signal at a time
//! ```
//!
//! External systems are reached only through the traits in [`service`], so the
//! workflow runs unchanged against AWS adapters or the scripted doubles in
//! [`mock`].

pub mod catalog;
pub mod classifier;
pub mod crawler;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod query;
pub mod service;
pub mod settings;
pub mod signal;
pub mod waiter;

pub use catalog::CatalogResolver;
pub use classifier::{Classification, ContentType, CrawlerNames, classify};
pub use crawler::{CrawlerCoordinator, RefreshReport};
pub use error::{PipelineError, Result, ServiceError, WorkflowFailure};
pub use orchestrator::{Orchestrator, WorkflowOutcome, WorkflowStage};
pub use query::{QueryCoordinator, QueryOutcome, validation_query};
pub use service::{
    CatalogEntry, CatalogService, QueryRequest, QueryService, QueryState, QueryStatus,
    RefreshState, RefreshTaskService, Services,
};
pub use settings::WorkflowSettings;
pub use signal::CompletionSignal;
pub use waiter::{MIN_POLL_INTERVAL, PollSchedule, TaskWaiter, WaitResult};

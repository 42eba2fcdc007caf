//! Scripted in-memory services for tests and local dry runs.
//!
//! Each double replays a fixed script of states and records every call, so a
//! test can assert both the outcome and exactly which external calls were made.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::service::{
    CatalogEntry, CatalogService, QueryRequest, QueryService, QueryStatus, RefreshState,
    RefreshTaskService, Services,
};

/// A call made to one of the scripted services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    StartCrawler(String),
    CrawlerState(String),
    ListEntries { database: String, prefix: String },
    SubmitQuery(QueryRequest),
    QueryStatus(String),
}

/// Shared, ordered log of calls across several doubles.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<ServiceCall>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: ServiceCall) {
        self.0.lock().unwrap().push(call);
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

/// Replays a script, repeating the final entry once the script is exhausted.
#[derive(Debug)]
struct Script<T> {
    pending: Mutex<VecDeque<T>>,
    last: Mutex<Option<T>>,
}

impl<T: Clone> Script<T> {
    fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            pending: Mutex::new(items.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    fn next(&self) -> Option<T> {
        let mut last = self.last.lock().unwrap();
        if let Some(item) = self.pending.lock().unwrap().pop_front() {
            *last = Some(item);
        }
        last.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Crawler
// ─────────────────────────────────────────────────────────────────────────────

/// Crawler whose state follows a script.
#[derive(Debug)]
pub struct ScriptedCrawler {
    log: CallLog,
    states: Script<RefreshState>,
    start_error: Option<ServiceError>,
}

impl ScriptedCrawler {
    /// States returned by successive `state` calls. The last one repeats.
    pub fn new(states: impl IntoIterator<Item = RefreshState>) -> Self {
        Self {
            log: CallLog::new(),
            states: Script::new(states),
            start_error: None,
        }
    }

    /// Fail `start` with this error.
    pub fn with_start_error(mut self, error: ServiceError) -> Self {
        self.start_error = Some(error);
        self
    }

    /// Record calls into a shared log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.log.calls()
    }
}

#[async_trait]
impl RefreshTaskService for ScriptedCrawler {
    async fn start(&self, name: &str) -> Result<(), ServiceError> {
        self.log.record(ServiceCall::StartCrawler(name.to_string()));
        match &self.start_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn state(&self, name: &str) -> Result<RefreshState, ServiceError> {
        self.log.record(ServiceCall::CrawlerState(name.to_string()));
        self.states
            .next()
            .ok_or_else(|| ServiceError::new("mock:CrawlerState", "empty state script"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Catalog holding a fixed list of tables.
///
/// `list_entries` filters by database and name prefix and keeps insertion
/// order, standing in for the catalog's own ordering.
#[derive(Debug)]
pub struct ScriptedCatalog {
    log: CallLog,
    entries: Vec<CatalogEntry>,
    error: Option<ServiceError>,
}

impl ScriptedCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            log: CallLog::new(),
            entries: entries.into_iter().collect(),
            error: None,
        }
    }

    /// Fail every lookup with this error.
    pub fn with_error(mut self, error: ServiceError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.log.calls()
    }
}

#[async_trait]
impl CatalogService for ScriptedCatalog {
    async fn list_entries(
        &self,
        database: &str,
        prefix: &str,
    ) -> Result<Vec<CatalogEntry>, ServiceError> {
        self.log.record(ServiceCall::ListEntries {
            database: database.to_string(),
            prefix: prefix.to_string(),
        });
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| e.database == database && e.name.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Query service returning one run id and a scripted sequence of statuses.
#[derive(Debug)]
pub struct ScriptedQueries {
    log: CallLog,
    run_id: String,
    statuses: Script<QueryStatus>,
    submit_error: Option<ServiceError>,
}

impl ScriptedQueries {
    pub fn new(run_id: impl Into<String>, statuses: impl IntoIterator<Item = QueryStatus>) -> Self {
        Self {
            log: CallLog::new(),
            run_id: run_id.into(),
            statuses: Script::new(statuses),
            submit_error: None,
        }
    }

    /// Fail `submit` with this error.
    pub fn with_submit_error(mut self, error: ServiceError) -> Self {
        self.submit_error = Some(error);
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.log.calls()
    }
}

#[async_trait]
impl QueryService for ScriptedQueries {
    async fn submit(&self, request: &QueryRequest) -> Result<String, ServiceError> {
        self.log.record(ServiceCall::SubmitQuery(request.clone()));
        match &self.submit_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.run_id.clone()),
        }
    }

    async fn status(&self, run_id: &str) -> Result<QueryStatus, ServiceError> {
        self.log.record(ServiceCall::QueryStatus(run_id.to_string()));
        if run_id != self.run_id {
            return Err(ServiceError::new(
                "mock:QueryStatus",
                format!("unknown run id {run_id}"),
            ));
        }
        self.statuses
            .next()
            .ok_or_else(|| ServiceError::new("mock:QueryStatus", "empty status script"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundle
// ─────────────────────────────────────────────────────────────────────────────

/// The three doubles wired to one shared call log.
#[derive(Debug, Clone)]
pub struct ScriptedServices {
    pub crawler: Arc<ScriptedCrawler>,
    pub catalog: Arc<ScriptedCatalog>,
    pub queries: Arc<ScriptedQueries>,
    pub log: CallLog,
}

impl ScriptedServices {
    /// Rewire the doubles onto a single log and bundle them.
    pub fn new(crawler: ScriptedCrawler, catalog: ScriptedCatalog, queries: ScriptedQueries) -> Self {
        let log = CallLog::new();
        Self {
            crawler: Arc::new(crawler.with_log(log.clone())),
            catalog: Arc::new(catalog.with_log(log.clone())),
            queries: Arc::new(queries.with_log(log.clone())),
            log,
        }
    }

    pub fn services(&self) -> Services {
        Services {
            refresh: self.crawler.clone(),
            catalog: self.catalog.clone(),
            query: self.queries.clone(),
        }
    }
}

//! In-memory provider used by tests: canned rows per query text, with
//! counters proving every opened session was released.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Provider, Session};
use crate::core::error::ProviderError;
use crate::core::result::FieldValue;

pub(crate) type FixtureRow = Vec<(&'static str, FieldValue)>;

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct FixtureProvider {
    tables: Arc<HashMap<String, Vec<FixtureRow>>>,
    failing_queries: Arc<Vec<String>>,
    refuse_connect: bool,
    counters: Arc<Counters>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, query: &str, rows: Vec<FixtureRow>) -> Self {
        Arc::make_mut(&mut self.tables).insert(query.to_string(), rows);
        self
    }

    pub fn failing_query(mut self, query: &str) -> Self {
        Arc::make_mut(&mut self.failing_queries).push(query.to_string());
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl Provider for FixtureProvider {
    type Session = FixtureSession;

    fn open(&self) -> Result<FixtureSession, ProviderError> {
        if self.refuse_connect {
            return Err(ProviderError::Connection("fixture refuses connections".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FixtureSession {
            provider: self.clone(),
        })
    }
}

pub(crate) struct FixtureSession {
    provider: FixtureProvider,
}

impl Drop for FixtureSession {
    fn drop(&mut self) {
        self.provider.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Session for FixtureSession {
    type ResultSet = Vec<FixtureRow>;
    type Row = FixtureRow;

    fn execute(&mut self, query: &str) -> Result<Self::ResultSet, ProviderError> {
        self.provider
            .executed
            .lock()
            .unwrap()
            .push(query.to_string());
        if self.provider.failing_queries.iter().any(|q| q == query) {
            return Err(ProviderError::Query(format!("Invalid query: {}", query)));
        }
        Ok(self
            .provider
            .tables
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    fn count(&mut self, results: &Self::ResultSet) -> Result<usize, ProviderError> {
        Ok(results.len())
    }

    fn row_at(
        &mut self,
        results: &Self::ResultSet,
        index: usize,
    ) -> Result<Self::Row, ProviderError> {
        results
            .get(index)
            .cloned()
            .ok_or_else(|| ProviderError::Query(format!("row {} out of range", index)))
    }

    fn field(&mut self, row: &Self::Row, name: &str) -> Result<FieldValue, ProviderError> {
        row.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| ProviderError::Property {
                field: name.to_string(),
                message: "not found".into(),
            })
    }
}

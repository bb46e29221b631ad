use crate::core::error::ProviderError;
use crate::core::result::FieldValue;
use crate::core::session::{Provider, Session};

/// Stand-in for hosts without WMI: every connection attempt fails, which the
/// collector reports as a connection error on its first cycle.
pub struct NativeProvider {
    namespace: String,
}

impl NativeProvider {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }
}

pub enum NoSession {}

impl Provider for NativeProvider {
    type Session = NoSession;

    fn open(&self) -> Result<NoSession, ProviderError> {
        Err(ProviderError::Connection(format!(
            "WMI namespace {} is unavailable: WMI is only provided on Windows (this host runs {})",
            self.namespace,
            std::env::consts::OS
        )))
    }
}

impl Session for NoSession {
    type ResultSet = ();
    type Row = ();

    fn execute(&mut self, _query: &str) -> Result<(), ProviderError> {
        match *self {}
    }

    fn count(&mut self, _results: &()) -> Result<usize, ProviderError> {
        match *self {}
    }

    fn row_at(&mut self, _results: &(), _index: usize) -> Result<(), ProviderError> {
        match *self {}
    }

    fn field(&mut self, _row: &(), _name: &str) -> Result<FieldValue, ProviderError> {
        match *self {}
    }
}

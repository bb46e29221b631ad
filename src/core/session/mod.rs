use super::error::ProviderError;
use super::result::FieldValue;

#[cfg(test)]
pub(crate) mod fixture;

/// Something that can hand out live sessions against the instrumentation service.
///
/// Implementations are shared across cycles, so they hold configuration only;
/// every live handle belongs to the [`Session`] returned by [`Provider::open`].
pub trait Provider: Send + Sync + 'static {
    type Session: Session;

    /// Initialise the calling thread for the provider and connect.
    fn open(&self) -> Result<Self::Session, ProviderError>;
}

/// One live connection. Dropping the session releases every handle it issued
/// (rows before result sets before the service) and tears down the per-thread
/// provider state, whichever step failed.
pub trait Session {
    type ResultSet;
    type Row;

    fn execute(&mut self, query: &str) -> Result<Self::ResultSet, ProviderError>;

    fn count(&mut self, results: &Self::ResultSet) -> Result<usize, ProviderError>;

    /// `index` must be in `0..count`.
    fn row_at(&mut self, results: &Self::ResultSet, index: usize)
    -> Result<Self::Row, ProviderError>;

    fn field(&mut self, row: &Self::Row, name: &str) -> Result<FieldValue, ProviderError>;
}

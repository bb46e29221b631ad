use thiserror::Error;

/// Failures reported by a provider binding. They carry no class context;
/// the materializer attaches that when it wraps them into a [`CollectError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("property {field} unreadable: {message}")]
    Property { field: String, message: String },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unable to open WMI session: {0}")]
    Connection(String),

    #[error("query for class {class} failed ({query}): {message}")]
    Query {
        class: String,
        query: String,
        message: String,
    },

    #[error("failed to read {field} on row {row} of class {class}: {message}")]
    Property {
        class: String,
        row: usize,
        field: String,
        message: String,
    },

    #[error("poll cycle task aborted: {0}")]
    Worker(String),
}

impl CollectError {
    pub fn config(msg: impl Into<String>) -> Self {
        CollectError::Configuration(msg.into())
    }

    pub(crate) fn on_open(err: ProviderError) -> Self {
        match err {
            ProviderError::Connection(message) => CollectError::Connection(message),
            other => CollectError::Connection(other.to_string()),
        }
    }

    /// Wraps a provider failure raised while a class's query or rows were being read.
    pub(crate) fn in_query(err: ProviderError, class: &str, query: &str) -> Self {
        match err {
            ProviderError::Connection(message) => CollectError::Connection(message),
            ProviderError::Query(message) => CollectError::Query {
                class: class.to_string(),
                query: query.to_string(),
                message,
            },
            ProviderError::Property { field, message } => CollectError::Property {
                class: class.to_string(),
                row: 0,
                field,
                message,
            },
        }
    }

    /// Wraps a provider failure raised while reading a field of a specific row.
    pub(crate) fn in_row(err: ProviderError, class: &str, query: &str, row: usize) -> Self {
        match err {
            ProviderError::Property { field, message } => CollectError::Property {
                class: class.to_string(),
                row,
                field,
                message,
            },
            other => Self::in_query(other, class, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_error_keeps_row_context() {
        let err = CollectError::in_row(
            ProviderError::Property {
                field: "Name".into(),
                message: "not found".into(),
            },
            "Win32_Process",
            "SELECT Name FROM Win32_Process",
            3,
        );
        match err {
            CollectError::Property {
                class, row, field, ..
            } => {
                assert_eq!(class, "Win32_Process");
                assert_eq!(row, 3);
                assert_eq!(field, "Name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn query_error_message_names_class_and_query() {
        let err = CollectError::in_query(
            ProviderError::Query("Invalid class".into()),
            "Win32_Nope",
            "SELECT A FROM Win32_Nope",
        );
        let text = err.to_string();
        assert!(text.contains("Win32_Nope"));
        assert!(text.contains("SELECT A FROM Win32_Nope"));
        assert!(text.contains("Invalid class"));
    }

    #[test]
    fn connection_error_passes_through_row_wrapping() {
        let err = CollectError::in_row(
            ProviderError::Connection("RPC server unavailable".into()),
            "Win32_Process",
            "SELECT Name FROM Win32_Process",
            0,
        );
        assert!(matches!(err, CollectError::Connection(_)));
    }
}

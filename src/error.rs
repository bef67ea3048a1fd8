// ⚠️ Query Errors - one typed error for the whole pipeline
// Load failures are fatal, everything else is a caller problem the transport maps to a status

use thiserror::Error;

/// Errors produced while loading the dataset or answering a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Source could not be opened, read or parsed.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Source or projections break the table contract (missing column, duplicate or orphan key).
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// No customer with this id.
    #[error("customer {0} not found")]
    NotFound(i64),

    /// Report id outside the catalog.
    #[error("report {0} not found: report id must be between 1 and 5")]
    ReportNotFound(i64),

    /// Filter parameter could not be coerced to its field type.
    #[error("invalid value {value:?} for filter '{field}'")]
    InvalidFilterValue { field: String, value: String },

    /// Pagination parameter is non-numeric or out of range.
    #[error("invalid pagination parameter '{name}': {reason}")]
    InvalidPaginationParameter { name: String, reason: String },
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Load-time errors: the process must not start serving.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            QueryError::DataUnavailable(_) | QueryError::SchemaViolation(_)
        )
    }

    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::DataUnavailable(_) => "DATA_UNAVAILABLE",
            QueryError::SchemaViolation(_) => "SCHEMA_VIOLATION",
            QueryError::NotFound(_) => "NOT_FOUND",
            QueryError::ReportNotFound(_) => "REPORT_NOT_FOUND",
            QueryError::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            QueryError::InvalidPaginationParameter { .. } => "INVALID_PAGINATION_PARAMETER",
        }
    }

    pub(crate) fn invalid_page(name: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidPaginationParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

// Churn Analytics - Core Library
// Exposes the query pipeline for use in the CLI, the API server, and tests

pub mod error;
pub mod record;
pub mod store;
pub mod join;
pub mod filter;
pub mod pagination;
pub mod aggregation;
pub mod catalog;
pub mod service;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{QueryError, QueryResult};
pub use record::{Column, ColumnKind, CustomerRecord, Scalar};
pub use record::{DemographicRow, FinancialRow, IdentityRow, RelationshipRow};
pub use store::{Projection, ProjectionTable, TableStore};
pub use join::{join, join_one, JoinedRow};
pub use filter::{CustomerFilter, Predicate};
pub use pagination::{paginate, Page, PageRequest, ZeroPerPage};
pub use aggregation::{
    Aggregate, CmpOp, Literal, Metric, ReportMeta, ReportResult, ReportRow, ReportSpec,
    RowFilter, SortDirection, SortSpec,
};
pub use catalog::{ReportCatalog, ReportDefinition, ReportSummary};
pub use service::{CustomerPage, CustomerProfile, QueryService, ReportIndex};
pub use config::{DataArgs, DataConfig, ServerArgs, ServerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 🧭 Query Service - the four read endpoints over one shared, immutable store
// Clone is cheap: the store sits behind an Arc and is never written after load

use crate::aggregation::{self, ReportResult};
use crate::catalog::{ReportCatalog, ReportSummary};
use crate::error::{QueryError, QueryResult};
use crate::filter::CustomerFilter;
use crate::join::join_one;
use crate::pagination::{paginate, PageRequest, ZeroPerPage};
use crate::record::CustomerRecord;
use crate::store::TableStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// RESPONSE SHAPES
// ============================================================================

/// Paginated customer collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerPage {
    pub resource: &'static str,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: usize,
    pub data: Vec<CustomerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub age: u32,
    pub gender: String,
    pub geography: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialStatus {
    pub balance: f64,
    pub salary: f64,
    pub products_count: u32,
    pub credit_score: u32,
    pub is_active_member: bool,
    pub has_credit_card: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRelation {
    pub churned: bool,
    pub tenure: u32,
}

/// One customer reassembled from all four projections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub identity: Identity,
    pub demographics: Demographics,
    pub financial_status: FinancialStatus,
    pub bank_relation: BankRelation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportIndex {
    pub resource: &'static str,
    pub available_reports: Vec<ReportSummary>,
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<TableStore>,
    catalog: ReportCatalog,
    zero_per_page: ZeroPerPage,
}

impl QueryService {
    pub fn new(store: Arc<TableStore>) -> Self {
        Self {
            store,
            catalog: ReportCatalog::standard(),
            zero_per_page: ZeroPerPage::default(),
        }
    }

    pub fn with_zero_per_page(mut self, policy: ZeroPerPage) -> Self {
        self.zero_per_page = policy;
        self
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Filter then paginate. Parameters are validated before any rows are touched.
    pub fn list_customers(&self, params: &HashMap<String, String>) -> QueryResult<CustomerPage> {
        let filter = CustomerFilter::from_params(params)?;
        let request = PageRequest::from_params(params, self.zero_per_page)?;

        let filtered = filter.apply(self.store.records());
        debug!(
            predicates = filter.predicates().len(),
            matched = filtered.len(),
            page = request.page,
            per_page = request.per_page,
            "Listing customers"
        );

        let page = paginate(filtered, request).map(CustomerRecord::clone);
        Ok(CustomerPage {
            resource: "customers",
            total_items: page.total_items,
            total_pages: page.total_pages,
            current_page: page.current_page,
            per_page: page.per_page,
            data: page.items,
        })
    }

    pub fn get_customer(&self, customer_id: i64) -> QueryResult<CustomerProfile> {
        let row = join_one(&self.store, customer_id)?;

        // join_one guarantees all four sides are attached
        let (Some(ident), Some(demo), Some(rel), Some(fin)) =
            (row.identity(), row.demographic(), row.relationship(), row.financial())
        else {
            return Err(QueryError::SchemaViolation(format!(
                "incomplete join for customer_id {}",
                customer_id
            )));
        };

        Ok(CustomerProfile {
            identity: Identity {
                id: ident.customer_id,
                surname: ident.surname.clone(),
            },
            demographics: Demographics {
                age: demo.age,
                gender: demo.gender.clone(),
                geography: demo.geography.clone(),
            },
            financial_status: FinancialStatus {
                balance: fin.balance,
                salary: fin.estimated_salary,
                products_count: fin.num_of_products,
                credit_score: fin.credit_score,
                is_active_member: fin.is_active_member,
                has_credit_card: fin.has_credit_card,
            },
            bank_relation: BankRelation {
                churned: rel.exited,
                tenure: rel.tenure,
            },
        })
    }

    pub fn list_reports(&self) -> ReportIndex {
        ReportIndex {
            resource: "analytics",
            available_reports: self.catalog.summaries(),
        }
    }

    pub fn run_report(&self, report_id: i64) -> QueryResult<ReportResult> {
        aggregation::run(&self.store, &self.catalog, report_id)
    }
}

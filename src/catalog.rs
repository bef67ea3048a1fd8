// 📚 Report Catalog - the five fixed analytics reports as data
// Ids are 1-based and stable; the pipeline only ever sees `ReportSpec`

use crate::aggregation::{
    Aggregate, CmpOp, Literal, Metric, ReportSpec, RowFilter, SortDirection, SortSpec,
};
use crate::error::{QueryError, QueryResult};
use crate::record::Column;
use crate::store::Projection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportDefinition {
    pub id: i64,
    pub name: &'static str,
    pub description: &'static str,
    /// Returned as `meta.description` alongside results
    pub meta_description: &'static str,
    pub spec: ReportSpec,
}

/// Catalog entry as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<&ReportDefinition> for ReportSummary {
    fn from(def: &ReportDefinition) -> Self {
        Self {
            id: def.id,
            name: def.name.to_string(),
            description: def.description.to_string(),
        }
    }
}

const TOTAL_CUSTOMERS: Metric = Metric {
    alias: "total_customers",
    func: Aggregate::Count,
    column: Column::CustomerId,
};

static STANDARD_REPORTS: [ReportDefinition; 5] = [
    ReportDefinition {
        id: 1,
        name: "Churn Rate by Demographics",
        description: "Calculate churn rate grouped by Geography and Gender (Query 1)",
        meta_description: "Churn rate by geography and gender",
        spec: ReportSpec {
            joins: &[Projection::Identity, Projection::Demographic, Projection::Relationship],
            filter: None,
            group_by: &[Column::Geography, Column::Gender],
            metrics: &[
                Metric { alias: "churn_rate", func: Aggregate::Mean, column: Column::Exited },
                TOTAL_CUSTOMERS,
            ],
            sort: Some(SortSpec { key: "churn_rate", direction: SortDirection::Descending }),
        },
    },
    ReportDefinition {
        id: 2,
        name: "Churn vs Active Profile",
        description: "Compare avg age and avg products for churned vs active (Query 2)",
        meta_description: "Avg age and products for churned (1) vs active (0) customers",
        spec: ReportSpec {
            joins: &[
                Projection::Identity,
                Projection::Relationship,
                Projection::Demographic,
                Projection::Financial,
            ],
            filter: None,
            group_by: &[Column::Exited],
            metrics: &[
                Metric { alias: "avg_age", func: Aggregate::Mean, column: Column::Age },
                Metric { alias: "avg_num_products", func: Aggregate::Mean, column: Column::NumOfProducts },
                TOTAL_CUSTOMERS,
            ],
            sort: None,
        },
    },
    ReportDefinition {
        id: 3,
        name: "Active Members Financials",
        description: "Compare salary and balance for active vs non-active members (Query 3)",
        meta_description: "Avg salary and balance for active (1) vs non-active (0) members",
        spec: ReportSpec {
            joins: &[Projection::Identity, Projection::Financial],
            filter: None,
            group_by: &[Column::IsActiveMember],
            metrics: &[
                Metric { alias: "avg_estimated_salary", func: Aggregate::Mean, column: Column::EstimatedSalary },
                Metric { alias: "avg_balance", func: Aggregate::Mean, column: Column::Balance },
                TOTAL_CUSTOMERS,
            ],
            sort: None,
        },
    },
    ReportDefinition {
        id: 4,
        name: "Multi-Product Analysis",
        description: "Avg balance/tenure for customers with >1 product (Query 4)",
        meta_description: "Balance and Tenure for customers with >1 product, ordered by balance",
        spec: ReportSpec {
            joins: &[Projection::Identity, Projection::Financial, Projection::Relationship],
            filter: Some(RowFilter {
                column: Column::NumOfProducts,
                op: CmpOp::Gt,
                value: Literal::Int(1),
            }),
            group_by: &[Column::NumOfProducts],
            metrics: &[
                Metric { alias: "avg_balance", func: Aggregate::Mean, column: Column::Balance },
                Metric { alias: "avg_tenure", func: Aggregate::Mean, column: Column::Tenure },
                TOTAL_CUSTOMERS,
            ],
            sort: Some(SortSpec { key: "avg_balance", direction: SortDirection::Descending }),
        },
    },
    ReportDefinition {
        id: 5,
        name: "Churn Age Range",
        description: "Max and Min age of churned customers (Query 5)",
        meta_description: "Min and Max age of churned customers",
        spec: ReportSpec {
            joins: &[Projection::Identity, Projection::Demographic, Projection::Relationship],
            filter: Some(RowFilter {
                column: Column::Exited,
                op: CmpOp::Eq,
                value: Literal::Bool(true),
            }),
            group_by: &[],
            metrics: &[
                Metric { alias: "max_age_churned", func: Aggregate::Max, column: Column::Age },
                Metric { alias: "min_age_churned", func: Aggregate::Min, column: Column::Age },
            ],
            sort: None,
        },
    },
];

/// Static registry of report definitions.
#[derive(Debug, Clone, Copy)]
pub struct ReportCatalog {
    reports: &'static [ReportDefinition],
}

impl Default for ReportCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ReportCatalog {
    pub fn standard() -> Self {
        Self {
            reports: &STANDARD_REPORTS,
        }
    }

    pub fn get(&self, id: i64) -> QueryResult<&'static ReportDefinition> {
        self.reports
            .iter()
            .find(|r| r.id == id)
            .ok_or(QueryError::ReportNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ReportDefinition> {
        self.reports.iter()
    }

    pub fn summaries(&self) -> Vec<ReportSummary> {
        self.reports.iter().map(ReportSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_has_five_reports_in_order() {
        let catalog = ReportCatalog::standard();

        let ids: Vec<i64> = catalog.summaries().iter().map(|s| s.id).collect();

        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn test_every_spec_is_valid() {
        for report in ReportCatalog::standard().iter() {
            assert!(
                report.spec.validate().is_ok(),
                "report {} has an invalid spec: {:?}",
                report.id,
                report.spec.validate()
            );
        }
    }

    #[test]
    fn test_get() {
        let catalog = ReportCatalog::standard();

        assert_eq!(catalog.get(4).unwrap().name, "Multi-Product Analysis");
        assert!(matches!(catalog.get(6), Err(QueryError::ReportNotFound(6))));
        assert!(matches!(catalog.get(0), Err(QueryError::ReportNotFound(0))));
    }

    #[test]
    fn test_summary_json_shape() {
        let summaries = ReportCatalog::standard().summaries();

        let json = serde_json::to_value(&summaries[0]).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Churn Rate by Demographics");
        assert!(json["description"].as_str().unwrap().contains("Geography and Gender"));
        assert!(json.get("spec").is_none());
    }
}

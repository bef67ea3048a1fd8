// 🧾 Customer Record - one row of the churn source table
// Columns are typed once here; every projection, join and report reads through `Column`

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the source table.
/// The whole record is what the collection endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: i64,
    pub surname: String,
    pub gender: String,
    pub geography: String,
    pub age: u32,
    pub credit_score: u32,
    pub tenure: u32,
    pub balance: f64,
    pub num_of_products: u32,
    pub has_credit_card: bool,
    pub is_active_member: bool,
    pub estimated_salary: f64,
    pub exited: bool,
}

// ============================================================================
// COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    CustomerId,
    Surname,
    Gender,
    Geography,
    Age,
    CreditScore,
    Tenure,
    Balance,
    NumOfProducts,
    HasCreditCard,
    IsActiveMember,
    EstimatedSalary,
    Exited,
}

/// Value kind of a column, used for parsing and for typing aggregate output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::CustomerId,
        Column::Surname,
        Column::Gender,
        Column::Geography,
        Column::Age,
        Column::CreditScore,
        Column::Tenure,
        Column::Balance,
        Column::NumOfProducts,
        Column::HasCreditCard,
        Column::IsActiveMember,
        Column::EstimatedSalary,
        Column::Exited,
    ];

    /// Canonical (output) name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::CustomerId => "customer_id",
            Column::Surname => "surname",
            Column::Gender => "gender",
            Column::Geography => "geography",
            Column::Age => "age",
            Column::CreditScore => "credit_score",
            Column::Tenure => "tenure",
            Column::Balance => "balance",
            Column::NumOfProducts => "num_of_products",
            Column::HasCreditCard => "has_credit_card",
            Column::IsActiveMember => "is_active_member",
            Column::EstimatedSalary => "estimated_salary",
            Column::Exited => "exited",
        }
    }

    /// Normalized source headers accepted for this column.
    /// The first entry is the normalized canonical name.
    pub fn source_headers(&self) -> &'static [&'static str] {
        match self {
            Column::CustomerId => &["customerid"],
            Column::Surname => &["surname"],
            Column::Gender => &["gender"],
            Column::Geography => &["geography"],
            Column::Age => &["age"],
            Column::CreditScore => &["creditscore"],
            Column::Tenure => &["tenure"],
            Column::Balance => &["balance"],
            Column::NumOfProducts => &["numofproducts"],
            Column::HasCreditCard => &["hascreditcard", "hascrcard"],
            Column::IsActiveMember => &["isactivemember"],
            Column::EstimatedSalary => &["estimatedsalary"],
            Column::Exited => &["exited"],
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::CustomerId
            | Column::Age
            | Column::CreditScore
            | Column::Tenure
            | Column::NumOfProducts => ColumnKind::Int,
            Column::Balance | Column::EstimatedSalary => ColumnKind::Float,
            Column::HasCreditCard | Column::IsActiveMember | Column::Exited => ColumnKind::Bool,
            Column::Surname | Column::Gender | Column::Geography => ColumnKind::Text,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lower-case a header and drop separators so `CustomerId`, `customer_id`
/// and `CUSTOMER-ID` compare equal.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// ============================================================================
// SCALAR VALUES
// ============================================================================

/// A single typed cell read out of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Numeric view; booleans count as 0/1 so `mean(exited)` is a rate.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Scalar::Text(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Int(v) => serde_json::json!(v),
            Scalar::Float(v) => serde_json::json!(v),
            Scalar::Bool(v) => serde_json::json!(v),
            Scalar::Text(v) => serde_json::json!(v),
        }
    }
}

impl CustomerRecord {
    pub fn value(&self, column: Column) -> Scalar {
        match column {
            Column::CustomerId => Scalar::Int(self.customer_id),
            Column::Surname => Scalar::Text(self.surname.clone()),
            Column::Gender => Scalar::Text(self.gender.clone()),
            Column::Geography => Scalar::Text(self.geography.clone()),
            Column::Age => Scalar::Int(self.age as i64),
            Column::CreditScore => Scalar::Int(self.credit_score as i64),
            Column::Tenure => Scalar::Int(self.tenure as i64),
            Column::Balance => Scalar::Float(self.balance),
            Column::NumOfProducts => Scalar::Int(self.num_of_products as i64),
            Column::HasCreditCard => Scalar::Bool(self.has_credit_card),
            Column::IsActiveMember => Scalar::Bool(self.is_active_member),
            Column::EstimatedSalary => Scalar::Float(self.estimated_salary),
            Column::Exited => Scalar::Bool(self.exited),
        }
    }
}

// ============================================================================
// PROJECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityRow {
    pub customer_id: i64,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicRow {
    pub customer_id: i64,
    pub gender: String,
    pub geography: String,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipRow {
    pub customer_id: i64,
    pub tenure: u32,
    pub exited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialRow {
    pub customer_id: i64,
    pub estimated_salary: f64,
    pub balance: f64,
    pub is_active_member: bool,
    pub num_of_products: u32,
    pub has_credit_card: bool,
    pub credit_score: u32,
}

impl From<&CustomerRecord> for IdentityRow {
    fn from(r: &CustomerRecord) -> Self {
        Self {
            customer_id: r.customer_id,
            surname: r.surname.clone(),
        }
    }
}

impl From<&CustomerRecord> for DemographicRow {
    fn from(r: &CustomerRecord) -> Self {
        Self {
            customer_id: r.customer_id,
            gender: r.gender.clone(),
            geography: r.geography.clone(),
            age: r.age,
        }
    }
}

impl From<&CustomerRecord> for RelationshipRow {
    fn from(r: &CustomerRecord) -> Self {
        Self {
            customer_id: r.customer_id,
            tenure: r.tenure,
            exited: r.exited,
        }
    }
}

impl From<&CustomerRecord> for FinancialRow {
    fn from(r: &CustomerRecord) -> Self {
        Self {
            customer_id: r.customer_id,
            estimated_salary: r.estimated_salary,
            balance: r.balance,
            is_active_member: r.is_active_member,
            num_of_products: r.num_of_products,
            has_credit_card: r.has_credit_card,
            credit_score: r.credit_score,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Helper to build a record with the fields tests usually care about
    pub(crate) fn create_test_record(
        customer_id: i64,
        geography: &str,
        gender: &str,
        age: u32,
        exited: bool,
    ) -> CustomerRecord {
        CustomerRecord {
            customer_id,
            surname: format!("Surname{}", customer_id),
            gender: gender.to_string(),
            geography: geography.to_string(),
            age,
            credit_score: 600,
            tenure: 3,
            balance: 0.0,
            num_of_products: 1,
            has_credit_card: true,
            is_active_member: false,
            estimated_salary: 50000.0,
            exited,
        }
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("CustomerId"), "customerid");
        assert_eq!(normalize_header("customer_id"), "customerid");
        assert_eq!(normalize_header(" NUM-OF PRODUCTS "), "numofproducts");
        assert_eq!(normalize_header("HasCrCard"), "hascrcard");
    }

    #[test]
    fn test_every_column_accepts_its_own_name() {
        for column in Column::ALL {
            let normalized = normalize_header(column.name());
            assert!(
                column.source_headers().contains(&normalized.as_str()),
                "{} does not accept {}",
                column,
                normalized
            );
        }
    }

    #[test]
    fn test_value_types_match_kind() {
        let record = create_test_record(1, "France", "Female", 42, true);

        for column in Column::ALL {
            let kind = match record.value(column) {
                Scalar::Int(_) => ColumnKind::Int,
                Scalar::Float(_) => ColumnKind::Float,
                Scalar::Bool(_) => ColumnKind::Bool,
                Scalar::Text(_) => ColumnKind::Text,
            };
            assert_eq!(kind, column.kind(), "column {}", column);
        }
    }

    #[test]
    fn test_bool_counts_as_rate() {
        assert_eq!(Scalar::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Scalar::Bool(false).as_f64(), Some(0.0));
        assert_eq!(Scalar::Text("France".to_string()).as_f64(), None);
    }

    #[test]
    fn test_projections_copy_columns() {
        let record = create_test_record(15634602, "Spain", "Male", 39, false);

        let fin = FinancialRow::from(&record);
        assert_eq!(fin.customer_id, record.customer_id);
        assert_eq!(fin.credit_score, record.credit_score);
        assert_eq!(fin.has_credit_card, record.has_credit_card);

        let demo = DemographicRow::from(&record);
        assert_eq!(demo.geography, "Spain");
        assert_eq!(demo.age, 39);
    }
}

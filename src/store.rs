// 🗄️ Table Store - CSV → immutable source table + four keyed projections
// Built once at startup, shared read-only afterwards (wrap in Arc)

use crate::error::{QueryError, QueryResult};
use crate::record::{
    normalize_header, Column, CustomerRecord, DemographicRow, FinancialRow, IdentityRow,
    RelationshipRow,
};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

// ============================================================================
// PROJECTIONS
// ============================================================================

/// The four column subsets the source table is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    Identity,
    Demographic,
    Relationship,
    Financial,
}

impl Projection {
    pub const ALL: [Projection; 4] = [
        Projection::Identity,
        Projection::Demographic,
        Projection::Relationship,
        Projection::Financial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Projection::Identity => "identity",
            Projection::Demographic => "demographic",
            Projection::Relationship => "relationship",
            Projection::Financial => "financial",
        }
    }

    /// Columns carried besides the shared `customer_id` key.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Projection::Identity => &[Column::Surname],
            Projection::Demographic => &[Column::Gender, Column::Geography, Column::Age],
            Projection::Relationship => &[Column::Tenure, Column::Exited],
            Projection::Financial => &[
                Column::EstimatedSalary,
                Column::Balance,
                Column::IsActiveMember,
                Column::NumOfProducts,
                Column::HasCreditCard,
                Column::CreditScore,
            ],
        }
    }

    /// Which projection a non-key column lives in.
    pub fn of(column: Column) -> Option<Projection> {
        Projection::ALL
            .into_iter()
            .find(|p| p.columns().contains(&column))
    }
}

pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for IdentityRow {
    fn key(&self) -> i64 {
        self.customer_id
    }
}

impl Keyed for DemographicRow {
    fn key(&self) -> i64 {
        self.customer_id
    }
}

impl Keyed for RelationshipRow {
    fn key(&self) -> i64 {
        self.customer_id
    }
}

impl Keyed for FinancialRow {
    fn key(&self) -> i64 {
        self.customer_id
    }
}

/// Rows of one projection plus a `customer_id → position` index.
#[derive(Debug, Clone)]
pub struct ProjectionTable<R> {
    rows: Vec<R>,
    index: HashMap<i64, usize>,
}

impl<R: Keyed> ProjectionTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.key(), pos))
            .collect();
        Self { rows, index }
    }

    pub fn get(&self, customer_id: i64) -> Option<&R> {
        self.index.get(&customer_id).map(|&pos| &self.rows[pos])
    }

    pub fn contains(&self, customer_id: i64) -> bool {
        self.index.contains_key(&customer_id)
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().map(Keyed::key)
    }
}

// ============================================================================
// TABLE STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct TableStore {
    pub(crate) full: Vec<CustomerRecord>,
    pub(crate) identity: ProjectionTable<IdentityRow>,
    pub(crate) demographic: ProjectionTable<DemographicRow>,
    pub(crate) relationship: ProjectionTable<RelationshipRow>,
    pub(crate) financial: ProjectionTable<FinancialRow>,
}

impl TableStore {
    /// Load the source CSV from disk. Any failure is fatal for the caller.
    pub fn load(path: &Path) -> QueryResult<Self> {
        let file = File::open(path).map_err(|e| {
            QueryError::DataUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        let store = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            customers = store.len(),
            "Loaded customer dataset"
        );
        Ok(store)
    }

    /// Parse CSV from any reader. Headers are matched after normalization.
    pub fn from_reader<R: Read>(reader: R) -> QueryResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| QueryError::DataUnavailable(format!("cannot read CSV header: {}", e)))?
            .clone();
        let layout = ColumnLayout::resolve(&headers)?;

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            // header is line 1
            let line = row + 2;
            let raw = result.map_err(|e| {
                QueryError::DataUnavailable(format!("line {}: cannot read record: {}", line, e))
            })?;
            records.push(layout.parse(&raw, line)?);
        }

        Self::from_records(records)
    }

    /// Build the store and its projections from already-parsed records.
    pub fn from_records(records: Vec<CustomerRecord>) -> QueryResult<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            check_ranges(record)?;
            if !seen.insert(record.customer_id) {
                return Err(QueryError::SchemaViolation(format!(
                    "duplicate customer_id {}",
                    record.customer_id
                )));
            }
        }

        let store = TableStore {
            identity: ProjectionTable::new(records.iter().map(IdentityRow::from).collect()),
            demographic: ProjectionTable::new(records.iter().map(DemographicRow::from).collect()),
            relationship: ProjectionTable::new(records.iter().map(RelationshipRow::from).collect()),
            financial: ProjectionTable::new(records.iter().map(FinancialRow::from).collect()),
            full: records,
        };
        debug!(customers = store.len(), "Built projections");
        Ok(store)
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.full
    }

    pub fn len(&self) -> usize {
        self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }

    pub fn identity(&self) -> &ProjectionTable<IdentityRow> {
        &self.identity
    }

    pub fn demographic(&self) -> &ProjectionTable<DemographicRow> {
        &self.demographic
    }

    pub fn relationship(&self) -> &ProjectionTable<RelationshipRow> {
        &self.relationship
    }

    pub fn financial(&self) -> &ProjectionTable<FinancialRow> {
        &self.financial
    }

    pub fn projection_len(&self, projection: Projection) -> usize {
        match projection {
            Projection::Identity => self.identity.len(),
            Projection::Demographic => self.demographic.len(),
            Projection::Relationship => self.relationship.len(),
            Projection::Financial => self.financial.len(),
        }
    }

    pub fn projection_contains(&self, projection: Projection, customer_id: i64) -> bool {
        match projection {
            Projection::Identity => self.identity.contains(customer_id),
            Projection::Demographic => self.demographic.contains(customer_id),
            Projection::Relationship => self.relationship.contains(customer_id),
            Projection::Financial => self.financial.contains(customer_id),
        }
    }

    /// Keys of a projection in row order.
    pub fn projection_keys(&self, projection: Projection) -> Vec<i64> {
        match projection {
            Projection::Identity => self.identity.keys().collect(),
            Projection::Demographic => self.demographic.keys().collect(),
            Projection::Relationship => self.relationship.keys().collect(),
            Projection::Financial => self.financial.keys().collect(),
        }
    }
}

// ============================================================================
// CSV COLUMN LAYOUT
// ============================================================================

/// Position of each required column in the source header.
struct ColumnLayout {
    positions: HashMap<Column, usize>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> QueryResult<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

        let mut positions = HashMap::new();
        let mut missing = Vec::new();

        for column in Column::ALL {
            let found = normalized
                .iter()
                .position(|h| column.source_headers().contains(&h.as_str()));
            match found {
                Some(pos) => {
                    positions.insert(column, pos);
                }
                None => missing.push(column.name()),
            }
        }

        if !missing.is_empty() {
            return Err(QueryError::SchemaViolation(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { positions })
    }

    fn cell<'r>(&self, raw: &'r csv::StringRecord, column: Column, line: usize) -> QueryResult<&'r str> {
        self.positions
            .get(&column)
            .and_then(|&pos| raw.get(pos))
            .ok_or_else(|| {
                QueryError::DataUnavailable(format!("line {}: missing value for {}", line, column))
            })
    }

    fn number<T: FromStr>(&self, raw: &csv::StringRecord, column: Column, line: usize) -> QueryResult<T> {
        let value = self.cell(raw, column, line)?;
        value.parse::<T>().map_err(|_| unparsable(line, column, value))
    }

    fn flag(&self, raw: &csv::StringRecord, column: Column, line: usize) -> QueryResult<bool> {
        let value = self.cell(raw, column, line)?;
        parse_flag(value).ok_or_else(|| unparsable(line, column, value))
    }

    fn text(&self, raw: &csv::StringRecord, column: Column, line: usize) -> QueryResult<String> {
        self.cell(raw, column, line).map(str::to_string)
    }

    fn parse(&self, raw: &csv::StringRecord, line: usize) -> QueryResult<CustomerRecord> {
        Ok(CustomerRecord {
            customer_id: self.number(raw, Column::CustomerId, line)?,
            surname: self.text(raw, Column::Surname, line)?,
            gender: self.text(raw, Column::Gender, line)?,
            geography: self.text(raw, Column::Geography, line)?,
            age: self.number(raw, Column::Age, line)?,
            credit_score: self.number(raw, Column::CreditScore, line)?,
            tenure: self.number(raw, Column::Tenure, line)?,
            balance: self.number(raw, Column::Balance, line)?,
            num_of_products: self.number(raw, Column::NumOfProducts, line)?,
            has_credit_card: self.flag(raw, Column::HasCreditCard, line)?,
            is_active_member: self.flag(raw, Column::IsActiveMember, line)?,
            estimated_salary: self.number(raw, Column::EstimatedSalary, line)?,
            exited: self.flag(raw, Column::Exited, line)?,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Domain bounds the types alone don't carry.
fn check_ranges(record: &CustomerRecord) -> QueryResult<()> {
    if record.balance < 0.0 {
        return Err(QueryError::SchemaViolation(format!(
            "customer {}: negative balance {}",
            record.customer_id, record.balance
        )));
    }
    if record.num_of_products < 1 {
        return Err(QueryError::SchemaViolation(format!(
            "customer {}: num_of_products must be at least 1",
            record.customer_id
        )));
    }
    Ok(())
}

fn unparsable(line: usize, column: Column, value: &str) -> QueryError {
    QueryError::DataUnavailable(format!(
        "line {}: cannot parse {:?} for column {}",
        line, value, column
    ))
}

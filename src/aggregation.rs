// 📊 Aggregation Pipeline - declarative group-by reports over joined projections
//
// Every report is data, not code:
//   joins → row filter → group-by → metrics → sort
//
// Groups come out in ascending key order and the sort is stable,
// so ties keep key order and the output is deterministic.

use crate::catalog::ReportCatalog;
use crate::error::{QueryError, QueryResult};
use crate::join::{join, JoinedRow};
use crate::record::{Column, ColumnKind, Scalar};
use crate::store::{Projection, TableStore};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// One output row: group columns first, then metrics.
pub type ReportRow = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// REPORT SPECIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Count,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub alias: &'static str,
    pub func: Aggregate,
    pub column: Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Text(&'static str),
}

impl Literal {
    fn to_scalar(self) -> Scalar {
        match self {
            Literal::Int(v) => Scalar::Int(v),
            Literal::Bool(v) => Scalar::Bool(v),
            Literal::Text(v) => Scalar::Text(v.to_string()),
        }
    }
}

/// `column op literal`, applied before grouping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowFilter {
    pub column: Column,
    pub op: CmpOp,
    pub value: Literal,
}

impl RowFilter {
    pub fn matches(&self, row: &JoinedRow<'_>) -> QueryResult<bool> {
        let actual = row.value(self.column)?;
        let ordering = compare(&actual, &self.value.to_scalar()).ok_or_else(|| {
            QueryError::SchemaViolation(format!(
                "cannot compare column {} with {:?}",
                self.column, self.value
            ))
        })?;
        Ok(self.op.holds(ordering))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort on an output column (metric alias or group column name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSpec {
    pub joins: &'static [Projection],
    pub filter: Option<RowFilter>,
    pub group_by: &'static [Column],
    pub metrics: &'static [Metric],
    pub sort: Option<SortSpec>,
}

impl ReportSpec {
    /// Check that every referenced column is reachable and typed for its use.
    pub fn validate(&self) -> QueryResult<()> {
        let reachable = |column: Column| match Projection::of(column) {
            None => !self.joins.is_empty(),
            Some(p) => self.joins.contains(&p),
        };
        let violation = |msg: String| Err(QueryError::SchemaViolation(msg));

        let referenced = self
            .group_by
            .iter()
            .copied()
            .chain(self.metrics.iter().map(|m| m.column))
            .chain(self.filter.map(|f| f.column));
        for column in referenced {
            if !reachable(column) {
                return violation(format!("column {} is not covered by the report joins", column));
            }
        }

        for column in self.group_by {
            if column.kind() == ColumnKind::Float {
                return violation(format!("cannot group by float column {}", column));
            }
        }

        for metric in self.metrics {
            if metric.func == Aggregate::Mean && metric.column.kind() == ColumnKind::Text {
                return violation(format!("cannot average text column {}", metric.column));
            }
        }

        if let Some(sort) = self.sort {
            let known = self.metrics.iter().any(|m| m.alias == sort.key)
                || self.group_by.iter().any(|c| c.name() == sort.key);
            if !known {
                return violation(format!("sort key {} is not an output column", sort.key));
            }
        }

        Ok(())
    }
}

// ============================================================================
// GROUP KEYS & ACCUMULATORS
// ============================================================================

/// Hashable, totally ordered group key component. Floats are not groupable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl KeyPart {
    fn from_scalar(column: Column, value: Scalar) -> QueryResult<Self> {
        match value {
            Scalar::Bool(v) => Ok(KeyPart::Bool(v)),
            Scalar::Int(v) => Ok(KeyPart::Int(v)),
            Scalar::Text(v) => Ok(KeyPart::Text(v)),
            Scalar::Float(_) => Err(QueryError::SchemaViolation(format!(
                "cannot group by float column {}",
                column
            ))),
        }
    }

    /// Boolean keys come out as 0/1, matching the flag encoding of the source.
    fn to_json(&self) -> serde_json::Value {
        match self {
            KeyPart::Bool(v) => serde_json::json!(i64::from(*v)),
            KeyPart::Int(v) => serde_json::json!(v),
            KeyPart::Text(v) => serde_json::json!(v),
        }
    }
}

#[derive(Debug, Clone)]
enum Accumulator {
    Mean { sum: f64, count: u64 },
    Count(u64),
    Min(Option<Scalar>),
    Max(Option<Scalar>),
}

impl Accumulator {
    fn new(metric: &Metric) -> Self {
        match metric.func {
            Aggregate::Mean => Accumulator::Mean { sum: 0.0, count: 0 },
            Aggregate::Count => Accumulator::Count(0),
            Aggregate::Min => Accumulator::Min(None),
            Aggregate::Max => Accumulator::Max(None),
        }
    }

    fn update(&mut self, column: Column, value: Scalar) -> QueryResult<()> {
        match self {
            Accumulator::Mean { sum, count } => {
                let v = value.as_f64().ok_or_else(|| {
                    QueryError::SchemaViolation(format!("cannot average text column {}", column))
                })?;
                *sum += v;
                *count += 1;
            }
            Accumulator::Count(count) => *count += 1,
            Accumulator::Min(current) => keep_if(current, value, Ordering::Less),
            Accumulator::Max(current) => keep_if(current, value, Ordering::Greater),
        }
        Ok(())
    }

    fn finish(&self) -> serde_json::Value {
        match self {
            // count >= 1: groups only exist once a row landed in them
            Accumulator::Mean { sum, count } => serde_json::json!(*sum / *count as f64),
            Accumulator::Count(count) => serde_json::json!(count),
            Accumulator::Min(v) | Accumulator::Max(v) => {
                v.as_ref().map_or(serde_json::Value::Null, Scalar::to_json)
            }
        }
    }
}

fn keep_if(current: &mut Option<Scalar>, candidate: Scalar, wanted: Ordering) {
    let replace = match current {
        None => true,
        Some(existing) => compare(&candidate, existing) == Some(wanted),
    };
    if replace {
        *current = Some(candidate);
    }
}

/// Text compares lexically, everything else numerically (bools as 0/1).
fn compare(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    match (a, b) {
        (Scalar::Text(x), Scalar::Text(y)) => Some(x.cmp(y)),
        (Scalar::Text(_), _) | (_, Scalar::Text(_)) => None,
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Run one report specification against the store.
pub fn execute(store: &TableStore, spec: &ReportSpec) -> QueryResult<Vec<ReportRow>> {
    spec.validate()?;

    let rows = join(store, spec.joins)?;
    let mut groups: BTreeMap<Vec<KeyPart>, Vec<Accumulator>> = BTreeMap::new();
    let mut matched = 0usize;

    for row in &rows {
        if let Some(filter) = &spec.filter {
            if !filter.matches(row)? {
                continue;
            }
        }
        matched += 1;

        let key = spec
            .group_by
            .iter()
            .map(|&column| KeyPart::from_scalar(column, row.value(column)?))
            .collect::<QueryResult<Vec<_>>>()?;

        let accumulators = groups
            .entry(key)
            .or_insert_with(|| spec.metrics.iter().map(Accumulator::new).collect());

        for (acc, metric) in accumulators.iter_mut().zip(spec.metrics) {
            acc.update(metric.column, row.value(metric.column)?)?;
        }
    }

    debug!(joined = rows.len(), matched, groups = groups.len(), "Aggregated report rows");

    let mut output: Vec<ReportRow> = groups
        .into_iter()
        .map(|(key, accumulators)| {
            let mut out = ReportRow::new();
            for (column, part) in spec.group_by.iter().zip(&key) {
                out.insert(column.name().to_string(), part.to_json());
            }
            for (metric, acc) in spec.metrics.iter().zip(&accumulators) {
                out.insert(metric.alias.to_string(), acc.finish());
            }
            out
        })
        .collect();

    if let Some(sort) = spec.sort {
        sort_rows(&mut output, sort);
    }

    Ok(output)
}

/// Strings lexically, booleans `false < true`, numbers numerically.
fn compare_json(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value;

    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [ReportRow], sort: SortSpec) {
    // sort_by is stable: equal keys keep group order
    rows.sort_by(|a, b| {
        let ordering = match (a.get(sort.key), b.get(sort.key)) {
            (Some(x), Some(y)) => compare_json(x, y),
            _ => Ordering::Equal,
        };
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub description: String,
}

/// Report output as handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResult {
    pub report_id: i64,
    pub meta: ReportMeta,
    pub results: Vec<ReportRow>,
}

/// Look up a report in the catalog and run it.
pub fn run(store: &TableStore, catalog: &ReportCatalog, report_id: i64) -> QueryResult<ReportResult> {
    let report = catalog.get(report_id)?;

    let results = execute(store, &report.spec)?;
    debug!(report_id, rows = results.len(), "Report executed");

    Ok(ReportResult {
        report_id,
        meta: ReportMeta {
            description: report.meta_description.to_string(),
        },
        results,
    })
}

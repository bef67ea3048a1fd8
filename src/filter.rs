// 🔍 Filter Engine - optional equality predicates over the customer table
// Each supported field has an explicit coercion; unknown parameters are ignored

use crate::error::{QueryError, QueryResult};
use crate::record::CustomerRecord;
use std::collections::HashMap;

/// One equality predicate with its value already coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Geography(String),
    /// Compared against the 0/1 encoding of the churn flag
    Exited(i64),
}

impl Predicate {
    pub fn field(&self) -> &'static str {
        match self {
            Predicate::Geography(_) => "geography",
            Predicate::Exited(_) => "exited",
        }
    }

    pub fn matches(&self, record: &CustomerRecord) -> bool {
        match self {
            Predicate::Geography(geo) => record.geography == *geo,
            Predicate::Exited(exited) => i64::from(record.exited) == *exited,
        }
    }

    /// Coerce a raw query parameter. `Ok(None)` means "not a filter field" or empty value.
    pub fn parse(field: &str, raw: &str) -> QueryResult<Option<Predicate>> {
        if raw.trim().is_empty() {
            return Ok(None);
        }

        match field {
            "geography" => Ok(Some(Predicate::Geography(raw.to_string()))),
            "exited" => coerce_int(field, raw).map(|v| Some(Predicate::Exited(v))),
            _ => Ok(None),
        }
    }
}

/// Integer coercion; only non-numeric input is rejected.
/// Values other than 0/1 are valid but match no customer.
fn coerce_int(field: &str, raw: &str) -> QueryResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| QueryError::InvalidFilterValue {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Conjunction of predicates. Order of the predicates never matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    predicates: Vec<Predicate>,
}

impl CustomerFilter {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Build from query parameters; fields are read in a fixed order so errors are stable.
    pub fn from_params(params: &HashMap<String, String>) -> QueryResult<Self> {
        let mut predicates = Vec::new();
        for field in ["geography", "exited"] {
            if let Some(raw) = params.get(field) {
                if let Some(predicate) = Predicate::parse(field, raw)? {
                    predicates.push(predicate);
                }
            }
        }
        Ok(Self { predicates })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &CustomerRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Keep matching rows in their original order.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<&'a CustomerRecord>
    where
        I: IntoIterator<Item = &'a CustomerRecord>,
    {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::create_test_record;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn create_test_rows() -> Vec<CustomerRecord> {
        vec![
            create_test_record(1, "France", "Female", 42, true),
            create_test_record(2, "Spain", "Female", 41, false),
            create_test_record(3, "France", "Male", 42, false),
            create_test_record(4, "Germany", "Male", 39, true),
            create_test_record(5, "France", "Female", 43, true),
        ]
    }

    fn ids(rows: &[&CustomerRecord]) -> Vec<i64> {
        rows.iter().map(|r| r.customer_id).collect()
    }

    #[test]
    fn test_no_params_keeps_everything() {
        let rows = create_test_rows();
        let filter = CustomerFilter::from_params(&HashMap::new()).unwrap();

        assert!(filter.is_empty());
        assert_eq!(filter.apply(&rows).len(), rows.len());
    }

    #[test]
    fn test_geography_and_exited() {
        let rows = create_test_rows();
        let filter =
            CustomerFilter::from_params(&params(&[("geography", "France"), ("exited", "1")])).unwrap();

        assert_eq!(ids(&filter.apply(&rows)), vec![1, 5]);
    }

    #[test]
    fn test_geography_is_exact_match() {
        let rows = create_test_rows();
        let filter = CustomerFilter::from_params(&params(&[("geography", "france")])).unwrap();

        assert!(filter.apply(&rows).is_empty());
    }

    #[test]
    fn test_exited_coercion() {
        assert_eq!(Predicate::parse("exited", "0").unwrap(), Some(Predicate::Exited(0)));
        assert_eq!(Predicate::parse("exited", " 1 ").unwrap(), Some(Predicate::Exited(1)));
        assert_eq!(Predicate::parse("exited", "2").unwrap(), Some(Predicate::Exited(2)));
        assert_eq!(Predicate::parse("exited", "-1").unwrap(), Some(Predicate::Exited(-1)));

        for bad in ["yes", "true", "1.5"] {
            let err = Predicate::parse("exited", bad).unwrap_err();
            assert!(
                matches!(err, QueryError::InvalidFilterValue { ref field, .. } if field == "exited"),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_exited_outside_flag_range_matches_nothing() {
        let rows = create_test_rows();

        for value in ["2", "-1"] {
            let filter = CustomerFilter::from_params(&params(&[("exited", value)])).unwrap();
            assert!(filter.apply(&rows).is_empty(), "exited={}", value);
        }
    }

    #[test]
    fn test_unknown_and_empty_params_ignored() {
        let rows = create_test_rows();
        let filter = CustomerFilter::from_params(&params(&[
            ("surname", "Hill"),
            ("geography", ""),
            ("exited", ""),
            ("page", "2"),
        ]))
        .unwrap();

        assert!(filter.is_empty());
        assert_eq!(filter.apply(&rows).len(), 5);
    }

    #[test]
    fn test_filters_commute() {
        let rows = create_test_rows();
        let geo = CustomerFilter::new(vec![Predicate::Geography("France".to_string())]);
        let churn = CustomerFilter::new(vec![Predicate::Exited(1)]);

        let geo_then_churn = churn.apply(geo.apply(&rows));
        let churn_then_geo = geo.apply(churn.apply(&rows));

        assert_eq!(ids(&geo_then_churn), ids(&churn_then_geo));

        let combined = CustomerFilter::new(vec![Predicate::Exited(1), Predicate::Geography("France".to_string())]);
        assert_eq!(ids(&combined.apply(&rows)), ids(&geo_then_churn));
    }

    #[test]
    fn test_filter_idempotent() {
        let rows = create_test_rows();
        let filter = CustomerFilter::new(vec![Predicate::Geography("France".to_string())]);

        let once = filter.apply(&rows);
        let twice = filter.apply(once.iter().copied());

        assert_eq!(ids(&once), ids(&twice));
    }
}

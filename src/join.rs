// 🔗 Join Engine - re-assemble wide rows from projections on customer_id
// Inner equi-joins, left to right. Projections are 1:1 by construction, so a key
// missing from any joined projection is a broken store, not a filtered row.

use crate::error::{QueryError, QueryResult};
use crate::record::{Column, DemographicRow, FinancialRow, IdentityRow, RelationshipRow, Scalar};
use crate::store::{Projection, TableStore};
use tracing::warn;

/// One customer as seen through a set of joined projections.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub customer_id: i64,
    identity: Option<&'a IdentityRow>,
    demographic: Option<&'a DemographicRow>,
    relationship: Option<&'a RelationshipRow>,
    financial: Option<&'a FinancialRow>,
}

impl<'a> JoinedRow<'a> {
    fn new(customer_id: i64) -> Self {
        Self {
            customer_id,
            identity: None,
            demographic: None,
            relationship: None,
            financial: None,
        }
    }

    pub fn identity(&self) -> Option<&'a IdentityRow> {
        self.identity
    }

    pub fn demographic(&self) -> Option<&'a DemographicRow> {
        self.demographic
    }

    pub fn relationship(&self) -> Option<&'a RelationshipRow> {
        self.relationship
    }

    pub fn financial(&self) -> Option<&'a FinancialRow> {
        self.financial
    }

    /// Read a column. Columns of projections that were not joined are a schema error.
    pub fn value(&self, column: Column) -> QueryResult<Scalar> {
        let value = match column {
            Column::CustomerId => Some(Scalar::Int(self.customer_id)),
            Column::Surname => self.identity.map(|r| Scalar::Text(r.surname.clone())),
            Column::Gender => self.demographic.map(|r| Scalar::Text(r.gender.clone())),
            Column::Geography => self.demographic.map(|r| Scalar::Text(r.geography.clone())),
            Column::Age => self.demographic.map(|r| Scalar::Int(r.age as i64)),
            Column::Tenure => self.relationship.map(|r| Scalar::Int(r.tenure as i64)),
            Column::Exited => self.relationship.map(|r| Scalar::Bool(r.exited)),
            Column::EstimatedSalary => self.financial.map(|r| Scalar::Float(r.estimated_salary)),
            Column::Balance => self.financial.map(|r| Scalar::Float(r.balance)),
            Column::IsActiveMember => self.financial.map(|r| Scalar::Bool(r.is_active_member)),
            Column::NumOfProducts => self.financial.map(|r| Scalar::Int(r.num_of_products as i64)),
            Column::HasCreditCard => self.financial.map(|r| Scalar::Bool(r.has_credit_card)),
            Column::CreditScore => self.financial.map(|r| Scalar::Int(r.credit_score as i64)),
        };

        value.ok_or_else(|| {
            QueryError::SchemaViolation(format!(
                "column {} is not part of the joined view",
                column
            ))
        })
    }

    /// Attach the row of `projection` for this key; false when the key is absent.
    fn attach(&mut self, store: &'a TableStore, projection: Projection) -> bool {
        let id = self.customer_id;
        match projection {
            Projection::Identity => {
                self.identity = store.identity().get(id);
                self.identity.is_some()
            }
            Projection::Demographic => {
                self.demographic = store.demographic().get(id);
                self.demographic.is_some()
            }
            Projection::Relationship => {
                self.relationship = store.relationship().get(id);
                self.relationship.is_some()
            }
            Projection::Financial => {
                self.financial = store.financial().get(id);
                self.financial.is_some()
            }
        }
    }
}

/// Join `views` on customer_id, keeping the row order of the first view.
pub fn join<'a>(store: &'a TableStore, views: &[Projection]) -> QueryResult<Vec<JoinedRow<'a>>> {
    let Some((&first, rest)) = views.split_first() else {
        return Ok(Vec::new());
    };

    let expected = store.projection_len(first);
    for &view in rest {
        let actual = store.projection_len(view);
        if actual != expected {
            warn!(left = first.name(), right = view.name(), expected, actual, "Projection cardinality mismatch");
            return Err(QueryError::SchemaViolation(format!(
                "projection {} has {} rows but {} has {}",
                first.name(),
                expected,
                view.name(),
                actual
            )));
        }
    }

    let mut joined = Vec::with_capacity(expected);
    for customer_id in store.projection_keys(first) {
        let mut row = JoinedRow::new(customer_id);
        for &view in views {
            if !row.attach(store, view) {
                return Err(orphan(customer_id, first, view));
            }
        }
        joined.push(row);
    }

    Ok(joined)
}

/// Join all four projections for one customer.
pub fn join_one(store: &TableStore, customer_id: i64) -> QueryResult<JoinedRow<'_>> {
    let mut row = JoinedRow::new(customer_id);
    if !row.attach(store, Projection::Identity) {
        return Err(QueryError::NotFound(customer_id));
    }

    for view in [Projection::Demographic, Projection::Relationship, Projection::Financial] {
        if !row.attach(store, view) {
            return Err(orphan(customer_id, Projection::Identity, view));
        }
    }

    Ok(row)
}

fn orphan(customer_id: i64, left: Projection, right: Projection) -> QueryError {
    warn!(customer_id, left = left.name(), right = right.name(), "Join key missing from projection");
    QueryError::SchemaViolation(format!(
        "customer_id {} present in {} but missing from {}",
        customer_id,
        left.name(),
        right.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::create_test_store;
    use crate::store::ProjectionTable;

    #[test]
    fn test_full_join_one_row_per_customer() {
        let store = create_test_store();

        let rows = join(&store, &Projection::ALL).unwrap();

        assert_eq!(rows.len(), store.len());
        for (row, record) in rows.iter().zip(store.records()) {
            assert_eq!(row.customer_id, record.customer_id);
            for column in Column::ALL {
                assert_eq!(row.value(column).unwrap(), record.value(column));
            }
        }
    }

    #[test]
    fn test_every_projection_order_joins_cleanly() {
        let store = create_test_store();
        let orders: [&[Projection]; 4] = [
            &[Projection::Identity, Projection::Demographic, Projection::Relationship],
            &[Projection::Identity, Projection::Relationship, Projection::Demographic, Projection::Financial],
            &[Projection::Identity, Projection::Financial],
            &[Projection::Financial, Projection::Identity],
        ];

        for views in orders {
            assert_eq!(join(&store, views).unwrap().len(), store.len());
        }
    }

    #[test]
    fn test_unjoined_column_is_schema_violation() {
        let store = create_test_store();

        let rows = join(&store, &[Projection::Identity, Projection::Financial]).unwrap();

        assert!(rows[0].value(Column::Balance).is_ok());
        assert!(matches!(
            rows[0].value(Column::Age),
            Err(QueryError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_missing_key_is_not_silently_dropped() {
        let mut store = create_test_store();
        let mut rows = store.financial().rows().to_vec();
        rows.pop();
        store.financial = ProjectionTable::new(rows);

        let err = join(&store, &[Projection::Identity, Projection::Financial]).unwrap_err();
        assert!(matches!(err, QueryError::SchemaViolation(_)));

        // reversed order: the smaller side drives, the mismatch is still caught
        let err = join(&store, &[Projection::Financial, Projection::Identity]).unwrap_err();
        assert!(matches!(err, QueryError::SchemaViolation(_)));

        // joins that do not touch the broken projection still work
        assert!(join(&store, &[Projection::Identity, Projection::Demographic]).is_ok());
    }

    #[test]
    fn test_swapped_key_is_schema_violation() {
        let mut store = create_test_store();
        let mut rows = store.relationship().rows().to_vec();
        rows[0].customer_id = 1;
        store.relationship = ProjectionTable::new(rows);

        let err = join(&store, &[Projection::Identity, Projection::Relationship]).unwrap_err();

        assert!(err.to_string().contains("missing from relationship"));
    }

    #[test]
    fn test_join_one() {
        let store = create_test_store();

        let row = join_one(&store, 15619304).unwrap();
        assert_eq!(row.identity().unwrap().surname, "Onio");
        assert_eq!(row.demographic().unwrap().age, 42);
        assert_eq!(row.relationship().unwrap().tenure, 8);
        assert_eq!(row.financial().unwrap().num_of_products, 3);

        assert!(matches!(join_one(&store, 1), Err(QueryError::NotFound(1))));
    }

    #[test]
    fn test_join_one_with_orphaned_identity() {
        let mut store = create_test_store();
        let rows: Vec<_> = store
            .demographic()
            .rows()
            .iter()
            .filter(|r| r.customer_id != 15634602)
            .cloned()
            .collect();
        store.demographic = ProjectionTable::new(rows);

        let err = join_one(&store, 15634602).unwrap_err();

        assert!(matches!(err, QueryError::SchemaViolation(_)));
    }

    #[test]
    fn test_empty_view_list() {
        let store = create_test_store();

        assert!(join(&store, &[]).unwrap().is_empty());
    }
}

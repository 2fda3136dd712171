//! Codec driven by a static table description.

use async_trait::async_trait;
use mrp_core::snapshot::{ChildRow, EntitySnapshot};
use serde_json::{Map, Value};
use sqlx::{Connection, PgConnection};

use super::{sql, CodecError, EntityCodec};

/// Child table of an aggregate entity.
#[derive(Debug)]
pub struct ChildSpec {
    pub table: &'static str,
    /// Foreign-key column referencing the parent's key.
    pub parent_column: &'static str,
    /// Column giving the stable order of child rows.
    pub order_column: &'static str,
    pub columns: &'static [&'static str],
}

/// Shape of one entity type's persisted state.
#[derive(Debug)]
pub struct TableSpec {
    /// Singular entity-type key, e.g. `work_order`.
    pub entity_type: &'static str,
    /// Table name, e.g. `work_orders`.
    pub collection: &'static str,
    pub key_column: &'static str,
    pub columns: &'static [&'static str],
    pub child: Option<ChildSpec>,
}

/// [`EntityCodec`] for entity types described by a [`TableSpec`].
#[derive(Debug, Clone, Copy)]
pub struct TableCodec {
    spec: &'static TableSpec,
}

impl TableCodec {
    pub fn new(spec: &'static TableSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &'static TableSpec {
        self.spec
    }

    /// Keep only catalog columns and pin the key to `entity_id`.
    fn parent_row(&self, entity_id: &str, snapshot: &EntitySnapshot) -> (Vec<&'static str>, Value) {
        let spec = self.spec;
        let mut row = Map::new();
        let mut skipped = Vec::new();

        for (name, value) in snapshot.fields() {
            match spec.columns.iter().find(|c| **c == name.as_str()) {
                Some(column) if *column != spec.key_column => {
                    row.insert((*column).to_string(), value.clone());
                }
                Some(_) => {}
                None => skipped.push(name.as_str()),
            }
        }
        if !skipped.is_empty() {
            tracing::warn!(
                collection = spec.collection,
                fields = ?skipped,
                "Ignoring snapshot fields with no matching column"
            );
        }
        row.insert(spec.key_column.to_string(), Value::String(entity_id.to_string()));

        let columns = spec
            .columns
            .iter()
            .copied()
            .filter(|c| row.contains_key(*c))
            .collect();
        (columns, Value::Object(row))
    }
}

/// Keep only catalog child columns and pin the parent key.
///
/// Rows are batched by the set of columns they carry (in catalog order), so
/// a column a row omits keeps its table default instead of being written
/// as NULL.
fn child_batches(
    child: &ChildSpec,
    entity_id: &str,
    rows: &[ChildRow],
) -> Vec<(Vec<&'static str>, Value)> {
    let mut batches: Vec<(Vec<&'static str>, Vec<Value>)> = Vec::new();
    for row in rows {
        let mut filtered: Map<String, Value> = row
            .iter()
            .filter(|(name, _)| child.columns.iter().any(|c| *c == name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        filtered.insert(
            child.parent_column.to_string(),
            Value::String(entity_id.to_string()),
        );

        let columns: Vec<&'static str> = child
            .columns
            .iter()
            .copied()
            .filter(|c| filtered.contains_key(*c))
            .collect();
        match batches.iter_mut().find(|(cols, _)| *cols == columns) {
            Some((_, batch)) => batch.push(Value::Object(filtered)),
            None => batches.push((columns, vec![Value::Object(filtered)])),
        }
    }

    batches
        .into_iter()
        .map(|(columns, batch)| (columns, Value::Array(batch)))
        .collect()
}

#[async_trait]
impl EntityCodec for TableCodec {
    fn collection(&self) -> &str {
        self.spec.collection
    }

    async fn capture(
        &self,
        conn: &mut PgConnection,
        entity_id: &str,
    ) -> Result<Option<EntitySnapshot>, CodecError> {
        let spec = self.spec;
        let row: Option<Value> =
            sqlx::query_scalar(&sql::select_row(spec.collection, spec.key_column, spec.columns))
                .bind(entity_id)
                .fetch_optional(&mut *conn)
                .await?;

        let Some(Value::Object(fields)) = row else {
            return Ok(None);
        };
        let mut snapshot = EntitySnapshot::new(fields);

        if let Some(child) = &spec.child {
            let rows: Vec<Value> = sqlx::query_scalar(&sql::select_children(
                child.table,
                child.parent_column,
                child.order_column,
                child.columns,
            ))
            .bind(entity_id)
            .fetch_all(&mut *conn)
            .await?;

            let children = rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            snapshot = snapshot.with_children(children);
        }

        Ok(Some(snapshot))
    }

    async fn restore(
        &self,
        conn: &mut PgConnection,
        entity_id: &str,
        snapshot: &EntitySnapshot,
    ) -> Result<(), CodecError> {
        let spec = self.spec;
        if snapshot.children().is_some() && spec.child.is_none() {
            return Err(CodecError::InvalidPayload(format!(
                "{} snapshots carry no child rows",
                spec.collection
            )));
        }

        let (columns, row) = self.parent_row(entity_id, snapshot);

        let mut tx = conn.begin().await?;

        sqlx::query(&sql::upsert_row(spec.collection, spec.key_column, &columns))
            .bind(row)
            .execute(&mut *tx)
            .await?;

        if let (Some(child), Some(rows)) = (&spec.child, snapshot.children()) {
            sqlx::query(&sql::delete_by_key(child.table, child.parent_column))
                .bind(entity_id)
                .execute(&mut *tx)
                .await?;

            for (child_columns, payload) in child_batches(child, entity_id, rows) {
                sqlx::query(&sql::insert_rows(child.table, &child_columns))
                    .bind(payload)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, conn: &mut PgConnection, entity_id: &str) -> Result<bool, CodecError> {
        let spec = self.spec;
        let mut tx = conn.begin().await?;

        if let Some(child) = &spec.child {
            sqlx::query(&sql::delete_by_key(child.table, child.parent_column))
                .bind(entity_id)
                .execute(&mut *tx)
                .await?;
        }
        let result = sqlx::query(&sql::delete_by_key(spec.collection, spec.key_column))
            .bind(entity_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::codec::catalog;

    fn snap(value: Value) -> EntitySnapshot {
        EntitySnapshot::from_value(value).unwrap()
    }

    #[test]
    fn parent_row_pins_key_and_drops_unknown_fields() {
        let codec = TableCodec::new(&catalog::WORK_ORDERS);
        let (columns, row) = codec.parent_row(
            "WO-1",
            &snap(json!({"id": "WO-999", "status": "draft", "colour": "red"})),
        );
        assert_eq!(columns, vec!["id", "status"]);
        assert_eq!(row, json!({"id": "WO-1", "status": "draft"}));
    }

    fn child_rows_of(values: Vec<Value>) -> Vec<ChildRow> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(m) => m,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn child_batches_pin_parent_and_drop_unknown_columns() {
        let child = catalog::PURCHASE_ORDERS.child.as_ref().unwrap();
        let rows = child_rows_of(vec![
            json!({"line_no": 1, "ipn": "CAP-001", "po_id": "other"}),
            json!({"line_no": 2, "ipn": "RES-220", "bogus": true}),
        ]);

        let batches = child_batches(child, "PO-1", &rows);
        assert_eq!(batches.len(), 1);
        let (columns, payload) = &batches[0];
        assert_eq!(*columns, vec!["po_id", "line_no", "ipn"]);
        assert_eq!(payload[0]["po_id"], "PO-1");
        assert_eq!(payload[1]["po_id"], "PO-1");
        assert!(payload[1].get("bogus").is_none());
    }

    #[test]
    fn child_batches_split_rows_with_different_columns() {
        let child = catalog::PURCHASE_ORDERS.child.as_ref().unwrap();
        let rows = child_rows_of(vec![
            json!({"line_no": 1, "ipn": "CAP-001", "qty_ordered": 5}),
            json!({"line_no": 2, "ipn": "RES-220"}),
            json!({"line_no": 3, "ipn": "IND-010", "qty_ordered": 2}),
        ]);

        let batches = child_batches(child, "PO-1", &rows);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].0, vec!["po_id", "line_no", "ipn", "qty_ordered"]);
        assert_eq!(batches[0].1.as_array().map(Vec::len), Some(2));
        assert_eq!(batches[1].0, vec!["po_id", "line_no", "ipn"]);
        assert_eq!(batches[1].1[0]["line_no"], 2);
    }
}

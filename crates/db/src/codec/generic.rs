//! Schema-less fallback codec.
//!
//! Used for collections with no [`TableSpec`](super::TableSpec). The
//! collection name and every payload key are user-influenced here, so all
//! of them pass [`mrp_core::identifier`] validation before any SQL is built.

use async_trait::async_trait;
use mrp_core::identifier::{sanitize_collection, sanitize_column};
use mrp_core::snapshot::EntitySnapshot;
use serde_json::Value;
use sqlx::PgConnection;

use super::catalog::CATALOG;
use super::{sql, CodecError, EntityCodec};

/// Key column every fallback collection uses.
pub const GENERIC_KEY_COLUMN: &str = "id";

/// [`EntityCodec`] over an allow-listed collection with an `id` key.
#[derive(Debug, Clone, Copy)]
pub struct GenericCodec {
    collection: &'static str,
}

impl GenericCodec {
    /// Fails with [`CodecError::InvalidIdentifier`] unless `collection` is
    /// on the allow-list, and with [`CodecError::UnsupportedEntity`] when
    /// the catalog keys it by a column other than `id`.
    pub fn new(collection: &str) -> Result<Self, CodecError> {
        let collection = sanitize_collection(collection)?;
        if let Some(spec) = CATALOG
            .iter()
            .find(|spec| spec.collection == collection && spec.key_column != GENERIC_KEY_COLUMN)
        {
            return Err(CodecError::UnsupportedEntity(format!(
                "{collection} is keyed by {} and needs its table codec",
                spec.key_column
            )));
        }
        Ok(Self { collection })
    }

    /// Validate the payload and build the row to upsert.
    ///
    /// Nothing is written unless every key passes.
    fn validated_row(
        &self,
        entity_id: &str,
        snapshot: &EntitySnapshot,
    ) -> Result<(Vec<String>, Value), CodecError> {
        if snapshot.is_empty() {
            return Err(CodecError::UnsupportedEntity(format!(
                "empty payload for {}",
                self.collection
            )));
        }
        if snapshot.children().is_some() {
            return Err(CodecError::UnsupportedEntity(format!(
                "{} has no registered codec for child rows",
                self.collection
            )));
        }

        let mut row = snapshot.fields().clone();
        for name in row.keys() {
            sanitize_column(name)?;
        }
        row.insert(
            GENERIC_KEY_COLUMN.to_string(),
            Value::String(entity_id.to_string()),
        );

        let columns = row.keys().cloned().collect();
        Ok((columns, Value::Object(row)))
    }
}

#[async_trait]
impl EntityCodec for GenericCodec {
    fn collection(&self) -> &str {
        self.collection
    }

    async fn capture(
        &self,
        conn: &mut PgConnection,
        entity_id: &str,
    ) -> Result<Option<EntitySnapshot>, CodecError> {
        let row: Option<Value> =
            sqlx::query_scalar(&sql::select_row(self.collection, GENERIC_KEY_COLUMN, &[]))
                .bind(entity_id)
                .fetch_optional(&mut *conn)
                .await?;

        match row {
            Some(Value::Object(fields)) => Ok(Some(EntitySnapshot::new(fields))),
            _ => Ok(None),
        }
    }

    async fn restore(
        &self,
        conn: &mut PgConnection,
        entity_id: &str,
        snapshot: &EntitySnapshot,
    ) -> Result<(), CodecError> {
        let (columns, row) = self.validated_row(entity_id, snapshot)?;
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();

        sqlx::query(&sql::upsert_row(self.collection, GENERIC_KEY_COLUMN, &columns))
            .bind(row)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, conn: &mut PgConnection, entity_id: &str) -> Result<bool, CodecError> {
        let result = sqlx::query(&sql::delete_by_key(self.collection, GENERIC_KEY_COLUMN))
            .bind(entity_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

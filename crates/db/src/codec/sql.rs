//! SQL text builders shared by the codecs.
//!
//! Callers must pass identifiers that are either `'static` catalog
//! constants or have passed [`mrp_core::identifier`] validation.

use mrp_core::identifier::quote;

/// `SELECT to_jsonb(t) FROM (SELECT <cols> FROM <table> WHERE <key> = $1) t`
///
/// An empty `columns` slice selects every column of the row.
pub(crate) fn select_row(table: &str, key: &str, columns: &[&str]) -> String {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        column_list(columns)
    };
    format!(
        "SELECT to_jsonb(t) FROM (SELECT {projection} FROM {} WHERE {} = $1) t",
        quote(table),
        quote(key),
    )
}

/// Child rows of one parent, ordered by `order_column`, each as JSONB.
pub(crate) fn select_children(
    table: &str,
    parent_column: &str,
    order_column: &str,
    columns: &[&str],
) -> String {
    format!(
        "SELECT to_jsonb(c) FROM (SELECT {} FROM {} WHERE {} = $1) c ORDER BY c.{}",
        column_list(columns),
        quote(table),
        quote(parent_column),
        quote(order_column),
    )
}

/// Single-row upsert from a JSONB parameter `$1`.
///
/// Only `columns` are written, so columns absent from the payload keep
/// their current value on conflict (or their default on insert).
pub(crate) fn upsert_row(table: &str, key: &str, columns: &[&str]) -> String {
    let cols = column_list(columns);
    let updates: Vec<String> = columns
        .iter()
        .filter(|c| **c != key)
        .map(|c| format!("{0} = EXCLUDED.{0}", quote(c)))
        .collect();
    let conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };
    format!(
        "INSERT INTO {table_q} ({cols}) \
         SELECT {cols} FROM jsonb_populate_record(NULL::{table_q}, $1) \
         ON CONFLICT ({key_q}) {conflict}",
        table_q = quote(table),
        key_q = quote(key),
    )
}

/// Multi-row insert from a JSONB array parameter `$1`.
pub(crate) fn insert_rows(table: &str, columns: &[&str]) -> String {
    let cols = column_list(columns);
    format!(
        "INSERT INTO {table_q} ({cols}) \
         SELECT {cols} FROM jsonb_populate_recordset(NULL::{table_q}, $1)",
        table_q = quote(table),
    )
}

/// `DELETE FROM <table> WHERE <key> = $1`
pub(crate) fn delete_by_key(table: &str, key: &str) -> String {
    format!("DELETE FROM {} WHERE {} = $1", quote(table), quote(key))
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_updates_non_key_columns() {
        let sql = upsert_row("work_orders", "id", &["id", "status"]);
        assert_eq!(
            sql,
            "INSERT INTO \"work_orders\" (\"id\", \"status\") \
             SELECT \"id\", \"status\" FROM jsonb_populate_record(NULL::\"work_orders\", $1) \
             ON CONFLICT (\"id\") DO UPDATE SET \"status\" = EXCLUDED.\"status\""
        );
    }

    #[test]
    fn upsert_of_key_only_does_nothing_on_conflict() {
        let sql = upsert_row("parts", "ipn", &["ipn"]);
        assert!(sql.ends_with("ON CONFLICT (\"ipn\") DO NOTHING"));
    }

    #[test]
    fn select_row_without_columns_selects_all() {
        let sql = select_row("rmas", "id", &[]);
        assert_eq!(
            sql,
            "SELECT to_jsonb(t) FROM (SELECT * FROM \"rmas\" WHERE \"id\" = $1) t"
        );
    }

    #[test]
    fn select_children_orders_by_line() {
        let sql = select_children("po_lines", "po_id", "line_no", &["po_id", "line_no"]);
        assert!(sql.contains("WHERE \"po_id\" = $1"));
        assert!(sql.ends_with("ORDER BY c.\"line_no\""));
    }

    #[test]
    fn insert_rows_uses_recordset() {
        let sql = insert_rows("quote_lines", &["quote_id", "line_no"]);
        assert!(sql.contains("jsonb_populate_recordset(NULL::\"quote_lines\", $1)"));
    }

    #[test]
    fn delete_by_key_quotes_identifiers() {
        assert_eq!(
            delete_by_key("devices", "serial_number"),
            "DELETE FROM \"devices\" WHERE \"serial_number\" = $1"
        );
    }
}

//! Table descriptions for every entity type with a dedicated codec.
//!
//! Adding an entity type means adding a [`TableSpec`] here and listing it
//! in [`CATALOG`]. Collections without an entry fall back to the
//! [`GenericCodec`](super::GenericCodec).

use super::table::{ChildSpec, TableSpec};

pub static PARTS: TableSpec = TableSpec {
    entity_type: "part",
    collection: "parts",
    key_column: "ipn",
    columns: &[
        "ipn",
        "category",
        "description",
        "manufacturer",
        "mpn",
        "status",
        "created_at",
        "updated_at",
    ],
    child: None,
};

pub static ECOS: TableSpec = TableSpec {
    entity_type: "eco",
    collection: "ecos",
    key_column: "id",
    columns: &[
        "id",
        "title",
        "description",
        "status",
        "priority",
        "affected_ipns",
        "created_by",
        "approved_by",
        "approved_at",
        "created_at",
        "updated_at",
    ],
    child: None,
};

pub static WORK_ORDERS: TableSpec = TableSpec {
    entity_type: "work_order",
    collection: "work_orders",
    key_column: "id",
    columns: &[
        "id",
        "assembly_ipn",
        "qty",
        "status",
        "priority",
        "notes",
        "started_at",
        "completed_at",
        "created_at",
    ],
    child: None,
};

pub static INVENTORY: TableSpec = TableSpec {
    entity_type: "inventory_item",
    collection: "inventory",
    key_column: "ipn",
    columns: &[
        "ipn",
        "qty_on_hand",
        "qty_reserved",
        "location",
        "reorder_point",
        "reorder_qty",
        "description",
        "mpn",
        "updated_at",
    ],
    child: None,
};

pub static VENDORS: TableSpec = TableSpec {
    entity_type: "vendor",
    collection: "vendors",
    key_column: "id",
    columns: &[
        "id",
        "name",
        "website",
        "contact_name",
        "contact_email",
        "contact_phone",
        "notes",
        "status",
        "lead_time_days",
        "created_at",
    ],
    child: None,
};

pub static PURCHASE_ORDERS: TableSpec = TableSpec {
    entity_type: "purchase_order",
    collection: "purchase_orders",
    key_column: "id",
    columns: &[
        "id",
        "vendor_id",
        "status",
        "notes",
        "expected_date",
        "received_at",
        "created_at",
    ],
    child: Some(ChildSpec {
        table: "po_lines",
        parent_column: "po_id",
        order_column: "line_no",
        columns: &[
            "po_id",
            "line_no",
            "ipn",
            "mpn",
            "manufacturer",
            "qty_ordered",
            "qty_received",
            "unit_price",
            "notes",
        ],
    }),
};

pub static QUOTES: TableSpec = TableSpec {
    entity_type: "quote",
    collection: "quotes",
    key_column: "id",
    columns: &[
        "id",
        "customer",
        "status",
        "notes",
        "valid_until",
        "accepted_at",
        "created_at",
    ],
    child: Some(ChildSpec {
        table: "quote_lines",
        parent_column: "quote_id",
        order_column: "line_no",
        columns: &[
            "quote_id",
            "line_no",
            "ipn",
            "description",
            "qty",
            "unit_price",
            "notes",
        ],
    }),
};

pub static DEVICES: TableSpec = TableSpec {
    entity_type: "device",
    collection: "devices",
    key_column: "serial_number",
    columns: &[
        "serial_number",
        "ipn",
        "firmware_version",
        "customer",
        "location",
        "status",
        "install_date",
        "last_seen",
        "notes",
        "created_at",
    ],
    child: None,
};

pub static NCRS: TableSpec = TableSpec {
    entity_type: "ncr",
    collection: "ncrs",
    key_column: "id",
    columns: &[
        "id",
        "title",
        "description",
        "ipn",
        "serial_number",
        "defect_type",
        "severity",
        "status",
        "root_cause",
        "corrective_action",
        "created_at",
        "resolved_at",
    ],
    child: None,
};

/// Every entity type with a dedicated codec.
pub static CATALOG: &[&TableSpec] = &[
    &PARTS,
    &ECOS,
    &WORK_ORDERS,
    &INVENTORY,
    &VENDORS,
    &PURCHASE_ORDERS,
    &QUOTES,
    &DEVICES,
    &NCRS,
];

#[cfg(test)]
mod tests {
    use mrp_core::identifier::{is_child_collection, is_known_collection, sanitize_column};

    use super::*;

    #[test]
    fn every_collection_is_allow_listed() {
        for spec in CATALOG {
            assert!(is_known_collection(spec.collection), "{}", spec.collection);
            if let Some(child) = &spec.child {
                assert!(is_child_collection(child.table), "{}", child.table);
            }
        }
    }

    #[test]
    fn key_and_order_columns_are_listed() {
        for spec in CATALOG {
            assert!(spec.columns.contains(&spec.key_column), "{}", spec.collection);
            if let Some(child) = &spec.child {
                assert!(child.columns.contains(&child.parent_column));
                assert!(child.columns.contains(&child.order_column));
            }
        }
    }

    #[test]
    fn column_names_pass_the_identifier_check() {
        for spec in CATALOG {
            for column in spec.columns {
                assert!(sanitize_column(column).is_ok(), "{column}");
            }
        }
    }

    #[test]
    fn entity_types_are_unique() {
        let mut keys: Vec<&str> = CATALOG
            .iter()
            .flat_map(|s| [s.entity_type, s.collection])
            .collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }
}

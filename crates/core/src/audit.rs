//! Audit and broadcast vocabulary for history operations.

/// Verbs for reversals. Recorded mutations use the operation name
/// (`create`, `update`, `delete`) as their verb.
pub mod verbs {
    /// A change record was reversed.
    pub const UNDO: &str = "undo";
    /// An undo entry's snapshot was restored.
    pub const RESTORE: &str = "restore";
}

/// Real-time event name for a verb applied to a collection, e.g.
/// `work_orders_undo`.
pub fn event_type(collection: &str, verb: &str) -> String {
    format!("{collection}_{verb}")
}

/// Human-readable audit summary line.
pub fn summary(actor: &str, verb: &str, collection: &str, entity_id: &str) -> String {
    format!("{actor} performed {verb} on {collection} {entity_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_joins_collection_and_verb() {
        assert_eq!(event_type("work_orders", verbs::UNDO), "work_orders_undo");
        assert_eq!(event_type("purchase_orders", verbs::RESTORE), "purchase_orders_restore");
    }

    #[test]
    fn summary_mentions_everything() {
        let s = summary("alice", "update", "ecos", "ECO-12");
        assert_eq!(s, "alice performed update on ecos ECO-12");
    }
}

//! Field Validator (component I): given collected data and a resolved
//! service's validator config, returns the ordered list of still-missing
//! required fields. Total and pure — no I/O, no clock.

use reserva_config::{ValidatorConfig, CANONICAL_FIELD_ORDER};
use reserva_core::domain::Conversation;

/// A field is present iff it has a non-empty value recorded in `collected`.
/// Entity-type checking already happened when the value was written there
/// by the extractor/LLM tier, so presence here is just "was it set".
fn is_present(conversation: &Conversation, field: &str) -> bool {
    match field {
        "products" => !conversation.draft_items.is_empty(),
        other => conversation
            .field(other)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false),
    }
}

/// Returns the missing fields from `config.required_fields`, in the fixed
/// canonical order, regardless of the order they appear in `required_fields`.
pub fn missing_fields(conversation: &Conversation, config: &ValidatorConfig) -> Vec<String> {
    CANONICAL_FIELD_ORDER
        .iter()
        .filter(|field| config.required_fields.iter().any(|f| f == *field))
        .filter(|field| !is_present(conversation, field))
        .map(|f| f.to_string())
        .collect()
}

pub fn is_complete(conversation: &Conversation, config: &ValidatorConfig) -> bool {
    missing_fields(conversation, config).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn config(required: &[&str]) -> ValidatorConfig {
        ValidatorConfig {
            requires_products: required.contains(&"products"),
            requires_guests: required.contains(&"guests"),
            requires_table: false,
            requires_payment: false,
            requires_address: required.contains(&"address"),
            required_fields: required.iter().map(|s| s.to_string()).collect(),
            name: "test".to_string(),
            enabled: true,
        }
    }

    #[test]
    fn missing_fields_follow_canonical_order_not_config_order() {
        let conv = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
        let cfg = config(&["phone", "date", "time"]);
        let missing = missing_fields(&conv, &cfg);
        assert_eq!(missing, vec!["date", "time", "phone"]);
    }

    #[test]
    fn set_fields_are_no_longer_missing() {
        let mut conv = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
        conv.set_field("date", "2026-08-01", 0.9);
        let cfg = config(&["date", "time"]);
        assert_eq!(missing_fields(&conv, &cfg), vec!["time"]);
    }

    #[test]
    fn products_presence_comes_from_draft_items() {
        let mut conv = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
        let cfg = config(&["products"]);
        assert!(!is_complete(&conv, &cfg));
        conv.draft_items.push(reserva_core::domain::DraftItem {
            product_id: Uuid::new_v4(),
            quantity: 1,
        });
        assert!(is_complete(&conv, &cfg));
    }
}

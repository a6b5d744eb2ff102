//! Matches free-text product mentions against a tenant's product catalog.
//!
//! Runs independently of which classification tier decided the turn's
//! intent: Tier 1/2-decided turns never call the LLM, so the products a
//! user asks for ("una pizza margherita y una coca cola") have to be
//! recovered from the normalized message itself, not only from the LLM
//! tier's `extracted_data.products` hints.

use reserva_core::domain::Product;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMatch {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Matches each LLM-suggested product name against the catalog, then scans
/// the normalized message itself for any catalog product name or keyword
/// appearing verbatim. Matches from both sources are deduplicated by
/// product id, bumping quantity on repeat mentions.
pub fn match_products(normalized: &str, llm_hints: &[String], catalog: &[Product]) -> Vec<ProductMatch> {
    let mut matches: Vec<ProductMatch> = Vec::new();

    for hint in llm_hints {
        let hint = hint.to_lowercase();
        if let Some(product) = catalog.iter().find(|p| product_matches_hint(p, &hint)) {
            record_match(&mut matches, product.id);
        }
    }

    for product in catalog {
        let name = product.name.to_lowercase();
        let mentioned = normalized.contains(name.as_str())
            || product
                .keywords
                .iter()
                .any(|k| normalized.contains(k.to_lowercase().as_str()));
        if mentioned {
            record_match(&mut matches, product.id);
        }
    }

    matches
}

fn product_matches_hint(product: &Product, hint: &str) -> bool {
    let name = product.name.to_lowercase();
    name == hint
        || name.contains(hint)
        || hint.contains(name.as_str())
        || product.keywords.iter().any(|k| k.to_lowercase() == hint)
}

fn record_match(matches: &mut Vec<ProductMatch>, product_id: Uuid) {
    if let Some(existing) = matches.iter_mut().find(|m| m.product_id == product_id) {
        existing.quantity += 1;
    } else {
        matches.push(ProductMatch { product_id, quantity: 1 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_core::domain::ProductMetadata;

    fn product(name: &str, keywords: &[&str]) -> Product {
        Product {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: name.to_string(),
            category: "item".to_string(),
            price: 1000,
            duration_minutes: None,
            tracks_stock: true,
            stock: 10,
            min_stock: 0,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            metadata: ProductMetadata::default(),
            active: true,
        }
    }

    #[test]
    fn matches_products_mentioned_verbatim_in_the_message() {
        let catalog = vec![product("Pizza Margherita", &[]), product("Coca Cola", &[])];
        let matches = match_products("quiero una pizza margherita y una coca cola", &[], &catalog);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.quantity == 1));
    }

    #[test]
    fn matches_products_via_keyword_alias() {
        let catalog = vec![product("Refresco de Cola", &["coca", "coca cola"])];
        let matches = match_products("quiero una coca cola bien fria", &[], &catalog);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].product_id, catalog[0].id);
    }

    #[test]
    fn llm_hint_and_message_scan_do_not_double_count_the_same_product() {
        let catalog = vec![product("Pizza Margherita", &[])];
        let hints = vec!["pizza margherita".to_string()];
        let matches = match_products("quiero una pizza margherita", &hints, &catalog);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].quantity, 1);
    }

    #[test]
    fn no_matches_when_nothing_in_catalog_is_mentioned() {
        let catalog = vec![product("Pizza Margherita", &[])];
        assert!(match_products("quiero reservar una mesa", &[], &catalog).is_empty());
    }
}

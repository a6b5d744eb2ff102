//! Service Config Resolver (component H): given a tenant, its type, and a
//! service key, produces the validator config that drives field collection
//! for that service.

use reserva_core::domain::{service_keys, Company, CompanyType, Product, ServiceVariantMetadata};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub requires_products: bool,
    pub requires_guests: bool,
    pub requires_table: bool,
    pub requires_payment: bool,
    pub requires_address: bool,
    pub required_fields: Vec<String>,
    pub name: String,
    pub enabled: bool,
}

/// The canonical field order the field validator iterates in. Fixed per
/// the design decision recorded for this implementation.
pub const CANONICAL_FIELD_ORDER: &[&str] = &[
    "service", "date", "time", "guests", "products", "address", "phone", "name",
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub validator: ValidatorConfig,
    pub missing_field_labels: BTreeMap<String, String>,
    pub has_multiple_services: bool,
    pub available_services: Vec<String>,
    pub reservation_noun: String,
}

fn default_labels() -> BTreeMap<String, String> {
    [
        ("service", "el servicio"),
        ("date", "la fecha"),
        ("time", "la hora"),
        ("guests", "el número de personas"),
        ("products", "los productos"),
        ("address", "la dirección"),
        ("phone", "tu teléfono"),
        ("name", "tu nombre"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Resolves the service config for a single variant. `all_service_variants`
/// is the tenant's full catalog slice of `category = "service"` products,
/// used to compute `has_multiple_services`/`available_services`.
pub fn resolve(
    company: &Company,
    variant: &Product,
    all_service_variants: &[Product],
) -> ServiceConfig {
    let meta: ServiceVariantMetadata = variant
        .service_metadata()
        .cloned()
        .unwrap_or_else(|| ServiceVariantMetadata {
            service_key: variant.name.to_lowercase(),
            requires_products: false,
            requires_payment: company.payment_policy.enabled,
            requires_guests: None,
            requires_address: false,
            requires_table: false,
            min_advance_minutes: 0,
            required_fields: Vec::new(),
        });

    let requires_guests = meta.requires_guests.unwrap_or_else(|| {
        matches!(company.company_type, CompanyType::Restaurant) && !meta.requires_products
    });

    let mut required_fields = if meta.required_fields.is_empty() {
        default_required_fields(&meta, requires_guests)
    } else {
        meta.required_fields.clone()
    };
    // Always terminate with phone; it is the one field every flow needs to
    // commit a reservation, regardless of tenant-declared overrides.
    if !required_fields.iter().any(|f| f == "phone") {
        required_fields.push("phone".to_string());
    }

    let reservation_noun = match meta.service_key.as_str() {
        service_keys::DOMICILIO => "pedido",
        service_keys::CITA => "cita",
        _ => company.reservation_noun_default(),
    }
    .to_string();

    let available_services: Vec<String> = all_service_variants
        .iter()
        .filter(|p| p.active)
        .filter_map(|p| p.service_metadata().map(|m| m.service_key.clone()))
        .collect();

    ServiceConfig {
        validator: ValidatorConfig {
            requires_products: meta.requires_products,
            requires_guests,
            requires_table: meta.requires_table,
            requires_payment: meta.requires_payment,
            requires_address: meta.requires_address,
            required_fields,
            name: variant.name.clone(),
            enabled: variant.active,
        },
        missing_field_labels: default_labels(),
        has_multiple_services: available_services.len() > 1,
        available_services,
        reservation_noun,
    }
}

fn default_required_fields(meta: &ServiceVariantMetadata, requires_guests: bool) -> Vec<String> {
    let mut fields = vec!["date".to_string(), "time".to_string()];
    if requires_guests {
        fields.push("guests".to_string());
    }
    if meta.requires_products {
        fields.push("products".to_string());
    }
    if meta.requires_address {
        fields.push("address".to_string());
    }
    fields.push("phone".to_string());
    fields
}

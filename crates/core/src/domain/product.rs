//! Products and the service-variant metadata carried by the reserved
//! `category = "service"` products.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The canonical service keys the flow understands out of the box.
/// Tenants may define additional keys; those fall back to generic behavior.
pub mod service_keys {
    pub const MESA: &str = "mesa";
    pub const DOMICILIO: &str = "domicilio";
    pub const CITA: &str = "cita";
}

/// Parameterizes the reservation flow for one service variant. Carried in
/// `Product.metadata` when `Product.category == "service"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceVariantMetadata {
    pub service_key: String,
    #[serde(default)]
    pub requires_products: bool,
    #[serde(default)]
    pub requires_payment: bool,
    #[serde(default)]
    pub requires_guests: Option<bool>,
    #[serde(default)]
    pub requires_address: bool,
    #[serde(default)]
    pub requires_table: bool,
    #[serde(default)]
    pub min_advance_minutes: u32,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

/// Product metadata. When `category == "service"` this carries a
/// [`ServiceVariantMetadata`]; for ordinary sellable products it is empty
/// aside from tenant-defined `extra` keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductMetadata {
    #[serde(default, flatten)]
    pub service: Option<ServiceVariantMetadata>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub const SERVICE_CATEGORY: &str = "service";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub category: String,
    /// Minor currency units (COP cents-equivalent).
    pub price: i64,
    pub duration_minutes: Option<u32>,
    pub tracks_stock: bool,
    pub stock: i32,
    pub min_stock: i32,
    pub keywords: Vec<String>,
    pub metadata: ProductMetadata,
    pub active: bool,
}

impl Product {
    pub fn is_service_variant(&self) -> bool {
        self.category == SERVICE_CATEGORY
    }

    pub fn service_metadata(&self) -> Option<&ServiceVariantMetadata> {
        self.metadata.service.as_ref()
    }

    /// A product is available if it is active and, when it tracks stock,
    /// has at least one unit on hand. Non-stock-tracked products are
    /// always considered available while active.
    pub fn has_stock(&self, qty: i32) -> bool {
        if !self.tracks_stock {
            return true;
        }
        self.stock >= qty
    }

    pub fn is_low_stock(&self) -> bool {
        self.tracks_stock && self.stock <= self.min_stock
    }
}

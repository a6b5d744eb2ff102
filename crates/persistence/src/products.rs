//! Product and service-variant storage.

use crate::error::PersistenceError;
use reserva_core::domain::{Product, ProductMetadata};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
    category: String,
    price: i64,
    duration_minutes: Option<i32>,
    tracks_stock: bool,
    stock: i32,
    min_stock: i32,
    keywords: serde_json::Value,
    metadata: serde_json::Value,
    active: bool,
}

impl ProductRow {
    fn into_domain(self) -> Result<Product, PersistenceError> {
        let keywords: Vec<String> = serde_json::from_value(self.keywords).unwrap_or_default();
        let metadata: ProductMetadata = serde_json::from_value(self.metadata).unwrap_or_default();
        Ok(Product {
            id: self.id,
            company_id: self.company_id,
            name: self.name,
            category: self.category,
            price: self.price,
            duration_minutes: self.duration_minutes.map(|d| d as u32),
            tracks_stock: self.tracks_stock,
            stock: self.stock,
            min_stock: self.min_stock,
            keywords,
            metadata,
            active: self.active,
        })
    }
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>, PersistenceError> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(ProductRow::into_domain).transpose()
}

pub async fn list_by_company(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<Product>, PersistenceError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT * FROM products WHERE company_id = $1 AND active ORDER BY name",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProductRow::into_domain).collect()
}

pub async fn list_service_variants(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<Product>, PersistenceError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT * FROM products WHERE company_id = $1 AND category = 'service' ORDER BY name",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProductRow::into_domain).collect()
}

pub async fn upsert(pool: &PgPool, product: &Product) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO products (id, company_id, name, category, price, duration_minutes,
                               tracks_stock, stock, min_stock, keywords, metadata, active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name, category = EXCLUDED.category, price = EXCLUDED.price,
            duration_minutes = EXCLUDED.duration_minutes, tracks_stock = EXCLUDED.tracks_stock,
            stock = EXCLUDED.stock, min_stock = EXCLUDED.min_stock, keywords = EXCLUDED.keywords,
            metadata = EXCLUDED.metadata, active = EXCLUDED.active
        "#,
    )
    .bind(product.id)
    .bind(product.company_id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.duration_minutes.map(|d| d as i32))
    .bind(product.tracks_stock)
    .bind(product.stock)
    .bind(product.min_stock)
    .bind(serde_json::to_value(&product.keywords)?)
    .bind(serde_json::to_value(&product.metadata)?)
    .bind(product.active)
    .execute(pool)
    .await?;
    Ok(())
}

/// Non-locking stock read, for the `checkStock` operation.
pub async fn current_stock(pool: &PgPool, product_id: Uuid) -> Result<i32, PersistenceError> {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await?;
    Ok(stock)
}

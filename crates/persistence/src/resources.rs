//! Physical resource storage (tables, rooms, chairs).

use crate::error::PersistenceError;
use reserva_core::domain::Resource;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct ResourceRow {
    id: Uuid,
    company_id: Uuid,
    resource_type: String,
    capacity: i32,
    available: bool,
    active: bool,
    metadata: serde_json::Value,
}

impl ResourceRow {
    fn into_domain(self) -> Resource {
        Resource {
            id: self.id,
            company_id: self.company_id,
            resource_type: self.resource_type,
            capacity: self.capacity as u32,
            available: self.available,
            active: self.active,
            metadata: self
                .metadata
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }
}

pub async fn list_available(
    pool: &PgPool,
    company_id: Uuid,
    resource_type: &str,
    min_capacity: u32,
) -> Result<Vec<Resource>, PersistenceError> {
    let rows = sqlx::query_as::<_, ResourceRow>(
        "SELECT * FROM resources WHERE company_id = $1 AND resource_type = $2 \
         AND active AND available AND capacity >= $3 ORDER BY capacity",
    )
    .bind(company_id)
    .bind(resource_type)
    .bind(min_capacity as i32)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(ResourceRow::into_domain).collect())
}

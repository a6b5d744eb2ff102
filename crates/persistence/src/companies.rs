//! Company (tenant) storage.

use crate::error::PersistenceError;
use reserva_core::domain::{Company, CompanyConfig, CompanyType, PaymentPolicy, WeeklyHours};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    company_type: String,
    business_hours: serde_json::Value,
    payment_policy: serde_json::Value,
    payment_provider_credentials: Option<String>,
    config: serde_json::Value,
    active: bool,
}

impl CompanyRow {
    fn into_domain(self) -> Result<Company, PersistenceError> {
        let company_type = match self.company_type.as_str() {
            "restaurant" => CompanyType::Restaurant,
            "clinic" => CompanyType::Clinic,
            "salon" => CompanyType::Salon,
            "spa" => CompanyType::Spa,
            _ => CompanyType::Other,
        };
        let business_hours: WeeklyHours = serde_json::from_value(self.business_hours)
            .map_err(|e| PersistenceError::Schema(format!("business_hours: {e}")))?;
        let payment_policy: PaymentPolicy = serde_json::from_value(self.payment_policy)
            .map_err(|e| PersistenceError::Schema(format!("payment_policy: {e}")))?;
        let config: CompanyConfig = serde_json::from_value(self.config)
            .map_err(|e| PersistenceError::Schema(format!("config: {e}")))?;

        Ok(Company {
            id: self.id,
            name: self.name,
            company_type,
            business_hours,
            payment_policy,
            payment_provider_credentials: self.payment_provider_credentials,
            config,
            active: self.active,
        })
    }
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Company>, PersistenceError> {
    let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(CompanyRow::into_domain).transpose()
}

pub async fn upsert(pool: &PgPool, company: &Company) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO companies (id, name, company_type, business_hours, payment_policy,
                                payment_provider_credentials, config, active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            company_type = EXCLUDED.company_type,
            business_hours = EXCLUDED.business_hours,
            payment_policy = EXCLUDED.payment_policy,
            payment_provider_credentials = EXCLUDED.payment_provider_credentials,
            config = EXCLUDED.config,
            active = EXCLUDED.active
        "#,
    )
    .bind(company.id)
    .bind(&company.name)
    .bind(format!("{:?}", company.company_type).to_lowercase())
    .bind(serde_json::to_value(&company.business_hours)?)
    .bind(serde_json::to_value(&company.payment_policy)?)
    .bind(&company.payment_provider_credentials)
    .bind(serde_json::to_value(&company.config)?)
    .bind(company.active)
    .execute(pool)
    .await?;
    Ok(())
}

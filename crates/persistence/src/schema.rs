//! Postgres schema creation.

use crate::error::PersistenceError;
use sqlx::PgPool;

pub async fn create_tables(pool: &PgPool) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            company_type TEXT NOT NULL,
            business_hours JSONB NOT NULL DEFAULT '{}',
            payment_policy JSONB NOT NULL DEFAULT '{"enabled": false, "percentage": 0}',
            payment_provider_credentials TEXT,
            config JSONB NOT NULL DEFAULT '{}',
            active BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("companies: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY,
            company_id UUID NOT NULL REFERENCES companies(id),
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            price BIGINT NOT NULL,
            duration_minutes INT,
            tracks_stock BOOLEAN NOT NULL DEFAULT FALSE,
            stock INT NOT NULL DEFAULT 0,
            min_stock INT NOT NULL DEFAULT 0,
            keywords JSONB NOT NULL DEFAULT '[]',
            metadata JSONB NOT NULL DEFAULT '{}',
            active BOOLEAN NOT NULL DEFAULT TRUE,
            CONSTRAINT stock_non_negative CHECK (stock >= 0)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("products: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resources (
            id UUID PRIMARY KEY,
            company_id UUID NOT NULL REFERENCES companies(id),
            resource_type TEXT NOT NULL,
            capacity INT NOT NULL,
            available BOOLEAN NOT NULL DEFAULT TRUE,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            metadata JSONB NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("resources: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            phone TEXT NOT NULL UNIQUE,
            name TEXT,
            email TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("users: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id UUID NOT NULL REFERENCES users(id),
            company_id UUID NOT NULL REFERENCES companies(id),
            preferred_time TIME,
            preferred_day TEXT,
            preferred_service_key TEXT,
            default_guests INT,
            confirmed_contacts JSONB NOT NULL DEFAULT '[]',
            favorite_product_ids JSONB NOT NULL DEFAULT '[]',
            completed_reservations INT NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, company_id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("user_preferences: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id UUID PRIMARY KEY,
            company_id UUID NOT NULL REFERENCES companies(id),
            user_id UUID NOT NULL REFERENCES users(id),
            state TEXT NOT NULL,
            active_intent TEXT,
            service_key TEXT,
            collected JSONB NOT NULL DEFAULT '{}',
            draft_items JSONB NOT NULL DEFAULT '[]',
            draft_reservation_id UUID,
            payment_reference TEXT,
            turn_count INT NOT NULL DEFAULT 0,
            retries_remaining SMALLINT NOT NULL DEFAULT 3,
            last_turn_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("conversations: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id UUID PRIMARY KEY,
            company_id UUID NOT NULL REFERENCES companies(id),
            user_id UUID NOT NULL REFERENCES users(id),
            conversation_id UUID NOT NULL REFERENCES conversations(id),
            date DATE NOT NULL,
            time TIME NOT NULL,
            guests INT,
            phone TEXT NOT NULL,
            customer_name TEXT,
            service_key TEXT NOT NULL,
            items JSONB NOT NULL DEFAULT '[]',
            resource_id UUID REFERENCES resources(id),
            status TEXT NOT NULL,
            total_price BIGINT NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("reservations: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock_movements (
            id UUID PRIMARY KEY,
            product_id UUID NOT NULL REFERENCES products(id),
            previous_stock INT NOT NULL,
            new_stock INT NOT NULL,
            movement_type TEXT NOT NULL,
            quantity INT NOT NULL,
            reason TEXT NOT NULL,
            correlation_id UUID,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("stock_movements: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id UUID PRIMARY KEY,
            conversation_id UUID NOT NULL REFERENCES conversations(id),
            reservation_id UUID REFERENCES reservations(id),
            amount BIGINT NOT NULL,
            status TEXT NOT NULL,
            checkout_url TEXT,
            reference TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PersistenceError::Schema(format!("payments: {e}")))?;

    tracing::info!("all tables created successfully");
    Ok(())
}

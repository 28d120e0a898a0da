//! Schema de PostgreSQL
//!
//! Sentencias idempotentes que se ejecutan al arrancar con el almacén
//! PostgreSQL. Los índices únicos parciales respaldan las garantías que las
//! operaciones atómicas de los repositorios ya imponen.

use sqlx::PgPool;
use tracing::info;

const ENUM_TYPES: &[(&str, &str)] = &[
    ("user_role", "'admin', 'transport_contractor', 'swachh_hr', 'driver'"),
    ("vehicle_status", "'available', 'assigned', 'maintenance', 'out_of_service'"),
    ("assignment_kind", "'vehicle', 'feeder_point'"),
    ("assignment_status", "'active', 'completed', 'cancelled'"),
    ("approval_status", "'pending', 'approved', 'rejected'"),
];

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS identity_accounts (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        display_name TEXT NOT NULL,
        disabled BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        phone TEXT,
        role user_role NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        permissions JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        updated_by UUID,
        approved_at TIMESTAMPTZ,
        approved_by UUID
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vehicles (
        id UUID PRIMARY KEY,
        registration_number TEXT NOT NULL UNIQUE,
        make TEXT,
        model TEXT,
        year INTEGER,
        vehicle_type TEXT NOT NULL,
        capacity NUMERIC,
        fuel_type TEXT,
        status vehicle_status NOT NULL DEFAULT 'available',
        created_at TIMESTAMPTZ NOT NULL,
        created_by UUID,
        updated_at TIMESTAMPTZ NOT NULL,
        updated_by UUID
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feeder_points (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        location TEXT NOT NULL,
        area TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        created_by UUID,
        updated_at TIMESTAMPTZ NOT NULL,
        updated_by UUID
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assignments (
        id UUID PRIMARY KEY,
        kind assignment_kind NOT NULL,
        resource_id UUID NOT NULL,
        assignment_type TEXT,
        assigned_to UUID NOT NULL,
        assigned_by UUID NOT NULL,
        assigned_at TIMESTAMPTZ NOT NULL,
        start_date TIMESTAMPTZ NOT NULL,
        end_date TIMESTAMPTZ,
        status assignment_status NOT NULL DEFAULT 'active',
        notes TEXT NOT NULL DEFAULT '',
        completed_at TIMESTAMPTZ,
        cancelled_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        updated_by UUID
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS approval_requests (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        full_name TEXT NOT NULL,
        phone TEXT,
        role user_role NOT NULL,
        credential_hash TEXT NOT NULL,
        status approval_status NOT NULL DEFAULT 'pending',
        created_at TIMESTAMPTZ NOT NULL,
        decided_at TIMESTAMPTZ,
        decided_by UUID,
        user_id UUID
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id UUID PRIMARY KEY,
        actor_id UUID,
        actor_email TEXT,
        action TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        status_code INTEGER NOT NULL,
        ip TEXT,
        user_agent TEXT,
        body JSONB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS backups (
        id UUID PRIMARY KEY,
        timestamp TIMESTAMPTZ NOT NULL,
        created_by UUID NOT NULL,
        collections TEXT[] NOT NULL,
        size BIGINT NOT NULL
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS assignments_one_active_per_vehicle
        ON assignments (resource_id) WHERE kind = 'vehicle' AND status = 'active'",
    "CREATE INDEX IF NOT EXISTS assignments_resource_idx ON assignments (kind, resource_id)",
    "CREATE INDEX IF NOT EXISTS assignments_assigned_at_idx ON assignments (assigned_at DESC)",
    "CREATE INDEX IF NOT EXISTS approval_requests_status_idx ON approval_requests (status, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS audit_logs_timestamp_idx ON audit_logs (timestamp DESC)",
    "CREATE INDEX IF NOT EXISTS backups_timestamp_idx ON backups (timestamp DESC)",
];

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, values) in ENUM_TYPES {
        let statement = format!(
            "DO $$ BEGIN CREATE TYPE {} AS ENUM ({}); \
             EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
            name, values
        );
        sqlx::query(&statement).execute(pool).await?;
    }

    for statement in TABLES.iter().chain(INDEXES) {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("📐 Schema verificado ({} tablas)", TABLES.len());
    Ok(())
}

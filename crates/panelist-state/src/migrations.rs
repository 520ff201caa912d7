//! SurrealDB schema migrations and initialization
//!
//! Sets up the three Panelist tables with their uniqueness constraints.
//! Every statement uses `IF NOT EXISTS`, so running it against an existing
//! database is a no-op.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all Panelist tables in SurrealDB
///
/// This should be called once on first connection to set up the schema.
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Panelist SurrealDB schema");

    init_candidates_table(db).await?;
    init_evaluations_table(db).await?;
    init_settings_table(db).await?;

    info!("Panelist schema initialization complete");
    Ok(())
}

async fn run(db: &Surreal<Any>, sql: &str) -> Result<()> {
    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    Ok(())
}

/// Initialize `candidates` table
///
/// Schema:
/// ```text
/// TABLE candidates {
///   candidate_id:  STRING (unique)
///   name:          STRING
///   info:          OBJECT (string -> string)
///   created_at:    DATETIME (indexed, listing order)
/// }
/// ```
async fn init_candidates_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing candidates table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS candidates SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_candidate_id ON TABLE candidates COLUMNS candidate_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_candidate_created_at ON TABLE candidates COLUMNS created_at;
    "#;

    run(db, sql).await?;
    info!("✓ candidates table initialized");
    Ok(())
}

/// Initialize `evaluations` table
///
/// Schema:
/// ```text
/// TABLE evaluations {
///   evaluation_id:  STRING (unique)
///   candidate_id:   STRING (indexed)
///   evaluator_id:   STRING
///   scores:         OBJECT (field key -> INT)
///   total:          INT
///   tags:           ARRAY<{ text, polarity }>
///   note:           STRING?
///   created_at:     DATETIME
///   updated_at:     DATETIME
/// }
/// ```
///
/// Constraints:
/// - `(candidate_id, evaluator_id)` is unique: the upsert key. Two
///   evaluators never share a row, so concurrent saves cannot clobber
///   each other.
async fn init_evaluations_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing evaluations table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS evaluations SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_evaluation_id ON TABLE evaluations COLUMNS evaluation_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_candidate_evaluator ON TABLE evaluations COLUMNS candidate_id, evaluator_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_evaluation_candidate ON TABLE evaluations COLUMNS candidate_id;
    "#;

    run(db, sql).await?;
    info!("✓ evaluations table initialized");
    Ok(())
}

/// Initialize `settings` table
///
/// Schema:
/// ```text
/// TABLE settings {
///   key:         STRING (unique)
///   value:       ANY (JSON)
///   updated_at:  DATETIME
/// }
/// ```
async fn init_settings_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing settings table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS settings SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_setting_key ON TABLE settings COLUMNS key UNIQUE;
    "#;

    run(db, sql).await?;
    info!("✓ settings table initialized");
    Ok(())
}

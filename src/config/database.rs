//! PostgreSQL connection pool initialization.
//!
//! Reads `DATABASE_URL` and runs the embedded migrations on startup. Called
//! once; the returned pool is cheaply cloneable.

use sqlx::PgPool;
use std::env;

/// # Panics
///
/// Panics if `DATABASE_URL` is unset, the connection fails, or migrations
/// cannot be applied; all fatal at startup.
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    pool
}

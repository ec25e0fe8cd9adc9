//! Common library for the workshop portal
//!
//! This crate provides shared infrastructure used by the portal service:
//! PostgreSQL connection pooling and the database error taxonomy.

pub mod database;
pub mod error;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, init_pool, health_check};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}

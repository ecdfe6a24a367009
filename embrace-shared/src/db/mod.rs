/// Persistence layer for Embrace
///
/// # Modules
///
/// - `repository`: Per-aggregate store traits
/// - `unit_of_work`: `Gateway` / `UnitOfWork` contracts
/// - `postgres`: sqlx-backed gateway, one transaction per unit of work
/// - `memory`: In-memory gateway with failure injection
/// - `pool`: Connection pool management with health checks
/// - `migrations`: Schema migration runner
/// - `error`: `PersistenceError`
///
/// Services receive a gateway in their constructor and never touch a pool
/// directly.
///
/// # Example
///
/// ```no_run
/// use embrace_shared::db::pool::{create_pool, DatabaseConfig};
/// use embrace_shared::db::PgGateway;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let gateway = PgGateway::new(create_pool(&config).await?);
///     Ok(())
/// }
/// ```

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod repository;
pub mod unit_of_work;

pub use error::PersistenceError;
pub use memory::{MemoryGateway, Operation, RowCounts};
pub use postgres::PgGateway;
pub use repository::{
    CompanyStore, ProfileStore, QuotaStore, RoleStore, StoreResult, TimeEntryStore, UserStore,
};
pub use unit_of_work::{Gateway, UnitOfWork};

/// Unit of work and gateway contracts
///
/// A [`Gateway`] hands out [`UnitOfWork`]s. All reads and writes made through
/// a unit are applied atomically on [`UnitOfWork::commit`]. Dropping a unit
/// without committing discards its writes, so an early `?` return from a
/// service can never leave a partial tenant behind.
///
/// # Example
///
/// ```no_run
/// use embrace_shared::db::{Gateway, UnitOfWork, UserStore};
///
/// # async fn example<G: Gateway>(gateway: G) -> Result<(), embrace_shared::db::PersistenceError> {
/// let mut uow = gateway.begin().await?;
/// let existing = uow.find_user_by_email("a@acme.com").await?;
/// uow.commit().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;

use super::error::PersistenceError;
use super::repository::{CompanyStore, ProfileStore, QuotaStore, RoleStore, TimeEntryStore, UserStore};

/// An open transaction over every store
#[async_trait]
pub trait UnitOfWork:
    CompanyStore + RoleStore + ProfileStore + UserStore + QuotaStore + TimeEntryStore + Send
{
    /// Applies every write made through this unit
    async fn commit(self) -> Result<(), PersistenceError>;

    /// Discards every write made through this unit
    async fn rollback(self) -> Result<(), PersistenceError>;
}

/// Source of units of work
#[async_trait]
pub trait Gateway: Send + Sync {
    type Unit: UnitOfWork;

    async fn begin(&self) -> Result<Self::Unit, PersistenceError>;
}

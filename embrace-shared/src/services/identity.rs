/// Identity uniqueness checks
///
/// Company names and user emails are global identity keys. These checks run
/// before provisioning so the common duplicate case fails fast with a clear
/// error; a concurrent insert that slips past them is still caught by the
/// unique indexes and mapped to the same `DuplicateIdentity` error (see
/// [`IdentityField::from_constraint`]).
///
/// Comparison is exact equality. No pattern matching, no case folding.

use tracing::warn;

use crate::db::{CompanyStore, UserStore};
use crate::error::{IdentityField, ServiceError};

pub struct IdentityGuard;

impl IdentityGuard {
    /// Fails with `DuplicateIdentity` if a live company already uses `name`
    pub async fn ensure_company_name_available<S>(store: &mut S, name: &str) -> Result<(), ServiceError>
    where
        S: CompanyStore + ?Sized,
    {
        if store.find_company_by_name(name).await?.is_some() {
            warn!(company_name = %name, "Company name already taken");
            return Err(ServiceError::DuplicateIdentity {
                field: IdentityField::CompanyName,
            });
        }
        Ok(())
    }

    /// Fails with `DuplicateIdentity` if any live user, in any company, has `email`
    pub async fn ensure_email_available<S>(store: &mut S, email: &str) -> Result<(), ServiceError>
    where
        S: UserStore + ?Sized,
    {
        if store.find_user_by_email(email).await?.is_some() {
            warn!("Email already registered");
            return Err(ServiceError::DuplicateIdentity {
                field: IdentityField::UserEmail,
            });
        }
        Ok(())
    }
}

/// Business services
///
/// - `identity`: Company-name and email uniqueness checks
/// - `provisioning`: Atomic company + administrator creation
/// - `tenant_admin`: Quotas, time entry types, roles and lifecycle rules
/// - `time_entries`: Time entry recording with quota consumption
///
/// Every service takes its [`Gateway`](crate::db::Gateway) in the
/// constructor and opens one unit of work per operation.

pub mod identity;
pub mod provisioning;
pub mod tenant_admin;
pub mod time_entries;

pub use identity::IdentityGuard;
pub use provisioning::{AdminAccount, CreateTenantRequest, TenantCreated, TenantProvisioner};
pub use tenant_admin::TenantAdmin;
pub use time_entries::{RecordTimeEntry, RecordedTimeEntry, TimeEntryRecorder};

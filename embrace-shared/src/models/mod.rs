/// Database models for Embrace
///
/// Plain data records plus their sqlx operations. Every function takes a
/// generic `PgExecutor`, so it runs equally against the pool or inside a
/// transaction.
///
/// # Models
///
/// - `company`: Tenancy root
/// - `user_role`: Roles scoped to a company, including the internal `admin`
/// - `user_profile`: Display attributes owned by one user
/// - `user`: Accounts, identified by email
/// - `quota`: Company-defined consumption ceilings
/// - `user_quota`: Per-user consumption counters
/// - `time_entry_type`: Billable / quota-relevant classification
/// - `time_entry`: Logged time
///
/// Records with a `deleted_at` column are tombstoned rather than removed;
/// lookups never return tombstoned rows.
///
/// # Example
///
/// ```no_run
/// use embrace_shared::models::company::Company;
/// use embrace_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_email(&pool, "a@acme.com").await? {
///     let company = Company::find_by_id(&pool, user.company_id).await?;
///     println!("{:?}", company.map(|c| c.name));
/// }
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod quota;
pub mod time_entry;
pub mod time_entry_type;
pub mod user;
pub mod user_profile;
pub mod user_quota;
pub mod user_role;

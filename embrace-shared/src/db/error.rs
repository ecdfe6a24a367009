/// Storage-level errors
///
/// Every persistence backend reports failures through [`PersistenceError`] so
/// the services above can tell a lookup miss or a uniqueness violation apart
/// from a genuine storage fault.
///
/// sqlx errors are classified on conversion: `RowNotFound` becomes
/// [`PersistenceError::NotFound`], unique and foreign-key violations keep the
/// name of the violated constraint, everything else is wrapped as-is.

/// Error type for persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Lookup found no live row
    #[error("{entity} not found")]
    NotFound {
        /// Entity kind, e.g. "company"
        entity: &'static str,
    },

    /// A unique constraint or unique index rejected the write
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint or index
        constraint: String,
    },

    /// A referenced row does not exist
    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation {
        /// Name of the violated constraint
        constraint: String,
    },

    /// Backend fault not tied to a sqlx error (in-memory gateway, injected faults)
    #[error("storage error: {0}")]
    Storage(String),

    /// Any other database error
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl PersistenceError {
    /// Shorthand for a lookup miss
    pub fn not_found(entity: &'static str) -> Self {
        PersistenceError::NotFound { entity }
    }

    /// Whether this error signals a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound { .. })
    }

    /// Returns the violated constraint name for uniqueness violations
    pub fn unique_constraint(&self) -> Option<&str> {
        match self {
            PersistenceError::UniqueViolation { constraint } => Some(constraint),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => PersistenceError::NotFound { entity: "row" },
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();

                if db_err.is_unique_violation() {
                    PersistenceError::UniqueViolation { constraint }
                } else if db_err.is_foreign_key_violation() {
                    PersistenceError::ForeignKeyViolation { constraint }
                } else {
                    PersistenceError::Database(sqlx::Error::Database(db_err))
                }
            }
            other => PersistenceError::Database(other),
        }
    }
}

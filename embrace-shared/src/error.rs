/// Service-level errors
///
/// [`ServiceError`] is what every service operation returns. Each variant has
/// a stable machine-readable [`code`](ServiceError::code) that callers can
/// match on without parsing messages.
///
/// | Variant              | Code                  |
/// |----------------------|-----------------------|
/// | `Validation`         | `validation_error`    |
/// | `DuplicateIdentity`  | `duplicate_identity`  |
/// | `NotFound`           | `not_found`           |
/// | `Conflict`           | `conflict`            |
/// | `QuotaConfiguration` | `quota_configuration` |
/// | `QuotaExceeded`      | `quota_exceeded`      |
/// | `Credential`         | `credential_error`    |
/// | `Persistence`        | `persistence_error`   |
/// | `Configuration`      | `configuration_fault` |

use serde::Serialize;
use std::fmt;

use crate::auth::password::PasswordError;
use crate::db::PersistenceError;

/// One failed input constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `admin.email`
    pub field: String,

    /// Validator code, e.g. `length`, `email`, `must_match`
    pub code: String,

    pub message: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.field, message),
            None => write!(f, "{}: {}", self.field, self.code),
        }
    }
}

/// Identity key that collided with an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    CompanyName,
    CompanyEmail,
    UserEmail,
}

impl IdentityField {
    /// Maps a unique constraint name to the identity key it protects
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            "companies_name_key" => Some(IdentityField::CompanyName),
            "companies_primary_email_key" => Some(IdentityField::CompanyEmail),
            "users_email_key" => Some(IdentityField::UserEmail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::CompanyName => "company name",
            IdentityField::CompanyEmail => "company email",
            IdentityField::UserEmail => "email",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("{field} is already in use")]
    DuplicateIdentity { field: IdentityField },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Lifecycle policy refusal
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("quota configuration error: {0}")]
    QuotaConfiguration(String),

    #[error("quota '{quota}' exceeded ({count}/{limit})")]
    QuotaExceeded {
        quota: String,
        count: i32,
        limit: i32,
    },

    #[error(transparent)]
    Credential(#[from] PasswordError),

    #[error(transparent)]
    Persistence(PersistenceError),

    /// Startup fault: configuration, store connection or migration
    #[error("configuration fault: {0}")]
    Configuration(String),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceError {
    /// Stable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::DuplicateIdentity { .. } => "duplicate_identity",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::QuotaConfiguration(_) => "quota_configuration",
            ServiceError::QuotaExceeded { .. } => "quota_exceeded",
            ServiceError::Credential(_) => "credential_error",
            ServiceError::Persistence(_) => "persistence_error",
            ServiceError::Configuration(_) => "configuration_fault",
        }
    }

    /// Single-field validation failure
    pub fn invalid(field: impl Into<String>, code: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, code)])
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity } => ServiceError::NotFound { entity },
            PersistenceError::UniqueViolation { constraint } => {
                match IdentityField::from_constraint(&constraint) {
                    Some(field) => ServiceError::DuplicateIdentity { field },
                    None => ServiceError::Conflict(format!(
                        "unique constraint violated: {}",
                        constraint
                    )),
                }
            }
            other => ServiceError::Persistence(other),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(field_errors(&errors))
    }
}

/// Flattens validator output into dotted-path field errors, sorted by path
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields = Vec::new();
    flatten_validation_errors("", errors, &mut fields);
    fields.sort_by(|a, b| (&a.field, &a.code).cmp(&(&b.field, &b.code)));
    fields
}

fn flatten_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(FieldError {
                        field: path.clone(),
                        code: error.code.to_string(),
                        message: error.message.as_ref().map(|m| m.to_string()),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(&path, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

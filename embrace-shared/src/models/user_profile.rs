/// User profile model
///
/// Display attributes for a user. Each profile is owned by exactly one user
/// and carries a globally unique `slug` used for external references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,

    /// Globally unique external reference
    pub slug: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,

    /// Opaque avatar reference; never interpreted here
    pub avatar: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserProfile {
    pub slug: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Builds a profile slug from display names plus a random suffix
///
/// The base is lowercased, non-alphanumeric runs collapse to a single hyphen,
/// and an 8-hex-digit suffix keeps slugs unique across tenants.
///
/// ```
/// use embrace_shared::models::user_profile::generate_slug;
///
/// let slug = generate_slug(Some("Ada"), Some("Lovelace"));
/// assert!(slug.starts_with("ada-lovelace-"));
/// ```
pub fn generate_slug(first_name: Option<&str>, last_name: Option<&str>) -> String {
    let raw = [first_name, last_name]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let mut base = String::new();
    let mut last_was_hyphen = true;

    for c in raw.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            base.push('-');
            last_was_hyphen = true;
        }
    }

    if base.ends_with('-') {
        base.pop();
    }

    if base.is_empty() {
        base.push_str("user");
    }

    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", base, &suffix[..8])
}

impl UserProfile {
    pub async fn create<'e, E>(executor: E, data: CreateUserProfile) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles
                (slug, first_name, last_name, title, position, location, phone, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, slug, first_name, last_name, title, position, location, phone,
                      avatar, created_at, updated_at, deleted_at
            "#,
        )
        .bind(data.slug)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.title)
        .bind(data.position)
        .bind(data.location)
        .bind(data.phone)
        .bind(data.avatar)
        .fetch_one(executor)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, slug, first_name, last_name, title, position, location, phone,
                   avatar, created_at, updated_at, deleted_at
            FROM user_profiles
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_slug<'e, E>(executor: E, slug: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, slug, first_name, last_name, title, position, location, phone,
                   avatar, created_at, updated_at, deleted_at
            FROM user_profiles
            WHERE slug = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(slug)
        .fetch_optional(executor)
        .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_from_names() {
        let slug = generate_slug(Some("Jean-Luc"), Some("Picard"));
        assert!(slug.starts_with("jean-luc-picard-"), "got {}", slug);
        assert_eq!(slug.len(), "jean-luc-picard-".len() + 8);
    }

    #[test]
    fn test_generate_slug_collapses_separators() {
        let slug = generate_slug(Some("  Ada  "), Some("O'Brien"));
        assert!(slug.starts_with("ada-o-brien-"), "got {}", slug);
    }

    #[test]
    fn test_generate_slug_without_names() {
        let slug = generate_slug(None, None);
        assert!(slug.starts_with("user-"));
    }

    #[test]
    fn test_generate_slug_is_unique() {
        let a = generate_slug(Some("Ada"), None);
        let b = generate_slug(Some("Ada"), None);
        assert_ne!(a, b);
    }
}

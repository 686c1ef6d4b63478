//! Handle profile database requests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::profile::{NewProfile, Profile};

/// Persistence contract for user profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find a profile by its owner's user id.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Profile>>;

    /// Insert a profile and return the persisted row.
    ///
    /// A second profile for the same user fails with
    /// [`ServerError::Conflict`], backed by the unique constraint on
    /// `user_id` so concurrent duplicate requests cannot both succeed.
    async fn insert(&self, profile: &NewProfile) -> Result<Profile>;
}

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: Pool<Postgres>,
}

impl PgProfileRepository {
    /// Create a new [`PgProfileRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"SELECT id, user_id, first_name, last_name, gender, date_of_birth, info, avatar
                FROM user_profiles
                WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn insert(&self, profile: &NewProfile) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"INSERT INTO user_profiles (user_id, first_name, last_name, gender, date_of_birth, info, avatar)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, user_id, first_name, last_name, gender, date_of_birth, info, avatar"#,
        )
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.gender)
        .bind(profile.date_of_birth)
        .bind(&profile.info)
        .bind(&profile.avatar)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServerError::Conflict
            },
            _ => err.into(),
        })?;

        Ok(profile)
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::repo_types::{NewUser, User, UserRow};

/// Why an insert into the user store was refused.
#[derive(Error, Debug)]
pub enum CreateUserError {
    #[error("required field {0} is empty")]
    BlankField(&'static str),

    #[error("username already registered")]
    UsernameTaken,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Persistence for user records and their upgrade status.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return its id. Rejects rows with empty required fields, and a
    /// username that is already taken even when the insert races another registration.
    async fn create_user(&self, user: &NewUser) -> Result<i64, CreateUserError>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// Mark the account upgraded; returns the number of matched rows.
    async fn set_upgraded(&self, id: i64) -> anyhow::Result<u64>;
    /// `None` when no such user exists.
    async fn get_upgraded(&self, id: i64) -> anyhow::Result<Option<bool>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: &NewUser) -> Result<i64, CreateUserError> {
        if let Some(field) = user.first_blank_field() {
            return Err(CreateUserError::BlankField(field));
        }
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, email, phone_number, password, full_name,
                               gender, date_of_birth, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING user_id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.gender.as_str())
        .bind(user.date_of_birth)
        .bind(&user.profile_picture)
        .fetch_one(&self.db)
        .await;
        match inserted {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CreateUserError::UsernameTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, email, phone_number, password, full_name,
                   gender, date_of_birth, profile_picture, is_upgraded
              FROM users
             WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        row.map(User::try_from).transpose()
    }

    async fn set_upgraded(&self, id: i64) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"UPDATE users SET is_upgraded = TRUE WHERE user_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("upgrade account")?;
        Ok(result.rows_affected())
    }

    async fn get_upgraded(&self, id: i64) -> anyhow::Result<Option<bool>> {
        let upgraded = sqlx::query_scalar::<_, bool>(
            r#"SELECT is_upgraded FROM users WHERE user_id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get upgrade status")?;
        Ok(upgraded)
    }
}

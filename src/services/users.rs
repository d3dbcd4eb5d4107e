use async_trait::async_trait;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, name, phone, city, created_at";

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: String) -> AppResult<Option<User>>;

    async fn get_user(&self, id: i32) -> AppResult<User>;

    /// Fails with a validation error when the email is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: Database,
}

impl PgUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: String) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, name, phone, city)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let res = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(&user.email))
            .bind(&user.password_hash)
            .bind(&user.name)
            .bind(&user.phone)
            .bind(&user.city)
            .fetch_one(&self.db.pool)
            .await;

        match res {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::validation("email already registered"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Emails are stored and compared in lower case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// bcrypt is CPU-bound, keep it off the async workers.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Looks up the user and checks the password. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn verify_credentials(store: &dyn UserStore, email: &str, password: &str) -> AppResult<User> {
    let user = store
        .find_by_email(email.to_string())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let password = password.to_string();
    let checked = user.clone();
    let ok = tokio::task::spawn_blocking(move || checked.verify_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?;

    if ok {
        Ok(user)
    } else {
        Err(AppError::Unauthorized("Invalid credentials".to_string()))
    }
}

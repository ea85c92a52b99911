use crate::auth::repo_types::{NewUser, Role, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, phone_number, email, role, password_hash, created_at";

impl User {
    /// Find a user by phone number.
    pub async fn find_by_phone(db: &PgPool, phone: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1"
        ))
        .bind(phone)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new customer account.
    pub async fn create(db: &PgPool, new: &NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (phone_number, email, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.phone_number)
        .bind(&new.email)
        .bind(Role::Customer)
        .bind(&new.password_hash)
        .fetch_one(db)
        .await
    }

    /// Grant the admin role; returns false when no such phone is registered.
    pub async fn promote_to_admin(db: &PgPool, phone: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET role = $1 WHERE phone_number = $2")
            .bind(Role::Admin)
            .bind(phone)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

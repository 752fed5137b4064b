//! User account storage

use relato_common::auth::hash_password;
use relato_common::db::models::{Role, User};
use relato_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::map_unique_violation;

/// Fields for a new account; the password is hashed on insert
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub rank: Option<String>,
    pub status: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub sector: Option<String>,
}

impl NewUser {
    /// Minimal account with only the required fields
    pub fn basic(name: &str, email: &str, password: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            rank: None,
            status: None,
            avatar: None,
            phone: None,
            location: None,
            unit: None,
            sector: None,
        }
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub status: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub sector: Option<String>,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse()?,
        rank: row.try_get("rank")?,
        status: row.try_get("status")?,
        avatar: row.try_get("avatar")?,
        phone: row.try_get("phone")?,
        location: row.try_get("location")?,
        unit: row.try_get("unit")?,
        sector: row.try_get("sector")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a user, returning its id
///
/// Fails with `Conflict` if the e-mail is already registered.
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    let password_hash = hash_password(&user.password)?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (
            name, email, password_hash, role, rank, status,
            avatar, phone, location, unit, sector
        ) VALUES (?, ?, ?, ?, ?, COALESCE(?, 'Ativo'), ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&password_hash)
    .bind(user.role.as_str())
    .bind(&user.rank)
    .bind(&user.status)
    .bind(&user.avatar)
    .bind(&user.phone)
    .bind(&user.location)
    .bind(&user.unit)
    .bind(&user.sector)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, "User"))?;

    Ok(result.last_insert_rowid())
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;

    rows.iter().map(user_from_row).collect()
}

/// Apply a partial update and return the stored result
///
/// The e-mail is only written when it differs from the current one.
pub async fn update_user(pool: &SqlitePool, id: i64, update: UserUpdate) -> Result<User> {
    let current = get_user(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", id)))?;

    let email = match update.email {
        Some(email) if email != current.email => email,
        _ => current.email.clone(),
    };

    let name = match update.name {
        Some(name) if name.trim().is_empty() => {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        Some(name) => name.trim().to_string(),
        None => current.name.clone(),
    };

    let password_hash = match update.password.as_deref() {
        Some(password) if !password.is_empty() => hash_password(password)?,
        _ => current.password_hash.clone(),
    };

    sqlx::query(
        r#"
        UPDATE users SET
            name = ?, email = ?, password_hash = ?, role = ?,
            status = ?, avatar = ?, phone = ?, location = ?, unit = ?, sector = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(update.role.unwrap_or(current.role).as_str())
    .bind(update.status.unwrap_or(current.status))
    .bind(update.avatar.or(current.avatar))
    .bind(update.phone.or(current.phone))
    .bind(update.location.or(current.location))
    .bind(update.unit.or(current.unit))
    .bind(update.sector.or(current.sector))
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, "User"))?;

    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", id)))
}

/// Delete a user account
///
/// Refused with `Conflict` while the user still owns reports; feedback rows cascade.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<()> {
    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE user_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    if owned > 0 {
        return Err(Error::Conflict(format!(
            "User {} still owns {} report(s)",
            id, owned
        )));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relato_common::auth::verify_password;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        relato_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = test_pool().await;
        let id = create_user(&pool, &NewUser::basic("Pvt. Jenkins", "jenkins@example.com", "pw", Role::Staff))
            .await
            .unwrap();

        let user = find_by_email(&pool, "jenkins@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.status, "Ativo");
        assert_eq!(user.role, Role::Staff);
        assert!(verify_password("pw", &user.password_hash));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = test_pool().await;
        let user = NewUser::basic("A", "dup@example.com", "pw", Role::Staff);
        create_user(&pool, &user).await.unwrap();

        let err = create_user(&pool, &user).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_rehashes_password_and_keeps_unset_fields() {
        let pool = test_pool().await;
        let mut new_user = NewUser::basic("B", "b@example.com", "old", Role::Staff);
        new_user.phone = Some("555-0101".into());
        let id = create_user(&pool, &new_user).await.unwrap();

        let updated = update_user(
            &pool,
            id,
            UserUpdate {
                name: Some("B2".into()),
                password: Some("new".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "B2");
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
        assert!(verify_password("new", &updated.password_hash));
        assert!(!verify_password("old", &updated.password_hash));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let pool = test_pool().await;
        let id = create_user(&pool, &NewUser::basic("Cb Lima", "lima@example.com", "pw", Role::Staff))
            .await
            .unwrap();

        let err = update_user(
            &pool,
            id,
            UserUpdate {
                name: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
        assert_eq!(get_user(&pool, id).await.unwrap().unwrap().name, "Cb Lima");
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let pool = test_pool().await;
        let err = update_user(&pool, 99, UserUpdate::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_refused_while_reports_exist() {
        let pool = test_pool().await;
        let id = create_user(&pool, &NewUser::basic("C", "c@example.com", "pw", Role::Staff))
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO reports (category, subcategory, description, priority, user_id) VALUES ('a', 'b', 'c', 'low', ?)",
        )
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

        let err = delete_user(&pool, id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let pool = test_pool().await;
        let id = create_user(&pool, &NewUser::basic("D", "d@example.com", "pw", Role::Staff))
            .await
            .unwrap();

        delete_user(&pool, id).await.unwrap();
        assert!(get_user(&pool, id).await.unwrap().is_none());
        assert!(matches!(delete_user(&pool, id).await, Err(Error::NotFound(_))));
    }
}

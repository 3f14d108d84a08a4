use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, User, UserType};
use crate::config::PER_PAGE;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, phone, about, \
     image_id, image_url, experience_level, user_role, user_goal, user_preference, user_type, \
     is_verified, is_archived, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Pagination envelope for list queries.
#[derive(Debug, serde::Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

#[derive(Debug, serde::Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64) -> Self {
        Self {
            data,
            pagination: PageMeta {
                total,
                page,
                per_page: PER_PAGE,
                pages: (total + PER_PAGE - 1) / PER_PAGE,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Create a new user. The store's unique index on email is the source of
    /// truth: a racing insert surfaces as `DuplicateEmail`.
    pub async fn create(db: &PgPool, new_user: NewUser) -> Result<User, CreateUserError> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, image_id, \
             image_url, experience_level, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.image_id)
            .bind(&new_user.image_url)
            .bind(new_user.experience_level)
            .bind(new_user.is_verified)
            .fetch_one(db)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    CreateUserError::DuplicateEmail
                }
                _ => CreateUserError::Database(err),
            })
    }

    /// Replace the stored password hash.
    pub async fn set_password(
        db: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET password_hash = $1, updated_at = now() \
             WHERE email = $2 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(password_hash)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Mark the account's email as verified.
    pub async fn set_verified(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_verified = TRUE, updated_at = now() \
             WHERE email = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn set_roles(
        db: &PgPool,
        email: &str,
        values: &[String],
    ) -> anyhow::Result<Option<User>> {
        set_tag_list(db, email, "user_role", values).await
    }

    pub async fn set_goals(
        db: &PgPool,
        email: &str,
        values: &[String],
    ) -> anyhow::Result<Option<User>> {
        set_tag_list(db, email, "user_goal", values).await
    }

    pub async fn set_preferences(
        db: &PgPool,
        email: &str,
        values: &[String],
    ) -> anyhow::Result<Option<User>> {
        set_tag_list(db, email, "user_preference", values).await
    }

    pub async fn set_user_type(
        db: &PgPool,
        email: &str,
        user_type: UserType,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET user_type = $1, updated_at = now() \
             WHERE email = $2 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_type)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Replace the avatar descriptor (object key + public URL).
    pub async fn set_image(
        db: &PgPool,
        email: &str,
        image_id: Option<&str>,
        image_url: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET image_id = $1, image_url = $2, updated_at = now() \
             WHERE email = $3 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(image_id)
            .bind(image_url)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// One page of users, newest first.
    pub async fn paginate(db: &PgPool, page: i64) -> anyhow::Result<Page<User>> {
        let page = page.max(1);
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(PER_PAGE)
            .bind((page - 1) * PER_PAGE)
            .fetch_all(db)
            .await?;
        Ok(Page::new(rows, total, page))
    }
}

// Tag columns are fixed identifiers, never user input.
async fn set_tag_list(
    db: &PgPool,
    email: &str,
    column: &str,
    values: &[String],
) -> anyhow::Result<Option<User>> {
    let sql = format!(
        "UPDATE users SET {column} = $1, updated_at = now() \
         WHERE email = $2 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(values)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let page: Page<i32> = Page::new(vec![], 11, 1);
        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.pagination.per_page, PER_PAGE);

        let page: Page<i32> = Page::new(vec![], 10, 2);
        assert_eq!(page.pagination.pages, 2);

        let page: Page<i32> = Page::new(vec![], 0, 1);
        assert_eq!(page.pagination.pages, 0);
    }

    #[test]
    fn page_map_keeps_the_meta() {
        let page = Page::new(vec![1, 2, 3], 3, 1);
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.data, vec!["1", "2", "3"]);
        assert_eq!(mapped.pagination.total, 3);
    }
}

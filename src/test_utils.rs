pub mod test_helpers {
    use crate::models::{User, UsersPage};
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    /// Rows per page on the hosted users API
    pub const PER_PAGE: u32 = 6;

    /// A user shaped like the ones the hosted API returns
    pub fn sample_user(id: i64) -> User {
        User {
            id,
            email: format!("user{}@reqres.in", id),
            first_name: format!("First{}", id),
            last_name: format!("Last{}", id),
            avatar: format!("https://reqres.in/img/faces/{}-image.jpg", id),
        }
    }

    /// One page of sample users, as if the server had `total_pages` full pages
    pub fn sample_page(page: u32, total_pages: u32, ids: &[i64]) -> UsersPage {
        UsersPage {
            page,
            per_page: PER_PAGE,
            total: total_pages * PER_PAGE,
            total_pages,
            data: ids.iter().copied().map(sample_user).collect(),
        }
    }

    /// Create a new in-memory SQLite database for the session store
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when sessions must survive reopening the pool
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;

        Ok((pool, temp_file))
    }
}

// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}

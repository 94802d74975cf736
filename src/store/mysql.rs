use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures_util::StreamExt;
use sqlx::MySqlPool;
use tracing::debug;

use super::{AttendanceStore, StoreError, StoreResult, UserStore};
use crate::model::{
    attendance::{AttendanceFilter, AttendanceRecord, AttendanceWithUser, NewAttendance},
    role::Role,
    user::{NewUser, User, UserChanges, UserSql},
};

const USER_COLUMNS: &str = "id, email, password, name, role, created_at, updated_at";

const ATTENDANCE_COLUMNS: &str =
    "a.id, a.user_id, a.check_in, a.check_out, a.location, a.ip_address, a.photo_url";

/// MySQL-backed store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn map_duplicate(entity: &'static str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(entity);
        }
    }
    StoreError::Database(e)
}

fn where_clause(filter: &AttendanceFilter) -> String {
    let mut conditions = vec!["a.user_id = ?"];

    if filter.since.is_some() {
        conditions.push("a.check_in >= ?");
    }
    if filter.before.is_some() {
        conditions.push("a.check_in < ?");
    }
    if filter.open_only {
        conditions.push("a.check_out IS NULL");
    }

    format!("WHERE {}", conditions.join(" AND "))
}

impl MySqlStore {
    async fn fetch_attendance(&self, id: u64) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance a WHERE a.id = ?");
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password, name, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, UTC_TIMESTAMP(3), UTC_TIMESTAMP(3))
            "#,
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(Role::default().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate("User", e))?;

        self.find_user(result.last_insert_id())
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserSql>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row = sqlx::query_as::<_, UserSql>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> StoreResult<User> {
        let mut sets = vec!["updated_at = UTC_TIMESTAMP(3)"];
        if changes.name.is_some() {
            sets.push("name = ?");
        }
        if changes.password.is_some() {
            sets.push("password = ?");
        }

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        debug!(sql = %sql, user_id = id, "Updating user");

        let mut query = sqlx::query(&sql);
        if let Some(name) = &changes.name {
            query = query.bind(name);
        }
        if let Some(password) = &changes.password {
            query = query.bind(password);
        }
        query.bind(id).execute(&self.pool).await?;

        self.find_user(id).await?.ok_or(StoreError::NotFound("User"))
    }

    async fn touch_last_login(&self, id: u64) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = UTC_TIMESTAMP(3) WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn stream_emails(
        &self,
        active_since: Option<DateTime<Utc>>,
    ) -> BoxStream<'_, StoreResult<String>> {
        match active_since {
            Some(since) => sqlx::query_scalar::<_, String>(
                r#"
                SELECT email
                FROM users
                WHERE last_login_at >= ?
                ORDER BY last_login_at DESC
                "#,
            )
            .bind(since)
            .fetch(&self.pool)
            .map(|row| row.map_err(StoreError::from))
            .boxed(),
            None => sqlx::query_scalar::<_, String>("SELECT email FROM users")
                .fetch(&self.pool)
                .map(|row| row.map_err(StoreError::from))
                .boxed(),
        }
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn create_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (user_id, check_in, check_in_day, location, ip_address, photo_url)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attendance.user_id)
        .bind(attendance.check_in)
        .bind(attendance.check_in_day)
        .bind(&attendance.location)
        .bind(&attendance.ip_address)
        .bind(&attendance.photo_url)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate("Attendance", e))?;

        self.fetch_attendance(result.last_insert_id())
            .await?
            .ok_or(StoreError::NotFound("Attendance"))
    }

    async fn find_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a {} ORDER BY a.check_in DESC, a.id DESC LIMIT 1",
            where_clause(filter)
        );
        debug!(sql = %sql, ?filter, "Finding attendance");

        let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(filter.user_id);
        if let Some(since) = filter.since {
            query = query.bind(since);
        }
        if let Some(before) = filter.before {
            query = query.bind(before);
        }

        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn close_attendance(
        &self,
        id: u64,
        check_out: DateTime<Utc>,
    ) -> StoreResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(check_out)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Open attendance"));
        }

        self.fetch_attendance(id)
            .await?
            .ok_or(StoreError::NotFound("Attendance"))
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Vec<AttendanceWithUser>> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}, u.name AS user_name, u.email AS user_email
            FROM attendance a
            JOIN users u ON u.id = a.user_id
            {}
            ORDER BY a.check_in DESC, a.id DESC
            "#,
            where_clause(filter)
        );
        debug!(sql = %sql, ?filter, "Listing attendance");

        let mut query = sqlx::query_as::<_, AttendanceWithUser>(&sql).bind(filter.user_id);
        if let Some(since) = filter.since {
            query = query.bind(since);
        }
        if let Some(before) = filter.before {
            query = query.bind(before);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

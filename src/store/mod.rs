//! Persistence seams for users and attendance records.
//!
//! Handlers and the tracker only ever see these traits; `main` owns the
//! concrete [`MySqlStore`] and its pool.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;

use crate::model::{
    attendance::{AttendanceFilter, AttendanceRecord, AttendanceWithUser, NewAttendance},
    user::{NewUser, User, UserChanges},
};

pub use mysql::MySqlStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key rejected the write.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// The row to update was missing or no longer matched.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    async fn update_user(&self, id: u64, changes: UserChanges) -> StoreResult<User>;

    async fn touch_last_login(&self, id: u64) -> StoreResult<()>;

    /// Streams registered emails, optionally only those who logged in since `active_since`.
    fn stream_emails(&self, active_since: Option<DateTime<Utc>>)
    -> BoxStream<'_, StoreResult<String>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] if the user already has a record for that day.
    async fn create_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord>;

    /// Most recent record matching the filter.
    async fn find_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Sets `check_out` on a still-open record; [`StoreError::NotFound`] otherwise.
    async fn close_attendance(
        &self,
        id: u64,
        check_out: DateTime<Utc>,
    ) -> StoreResult<AttendanceRecord>;

    /// All matching records joined with their owner, newest check-in first.
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Vec<AttendanceWithUser>>;
}

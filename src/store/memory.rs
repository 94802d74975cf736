//! In-memory store used by tests. Enforces the same unique keys as the MySQL schema.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, BoxStream};
use futures_util::StreamExt;
use tokio::sync::RwLock;

use super::{AttendanceStore, StoreError, StoreResult, UserStore};
use crate::model::{
    attendance::{AttendanceFilter, AttendanceRecord, AttendanceWithUser, NewAttendance},
    role::Role,
    user::{NewUser, User, UserChanges},
};

fn matches(filter: &AttendanceFilter, record: &AttendanceRecord) -> bool {
    record.user_id == filter.user_id
        && filter.since.is_none_or(|since| record.check_in >= since)
        && filter.before.is_none_or(|before| record.check_in < before)
        && (!filter.open_only || record.is_open())
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    last_logins: BTreeMap<u64, DateTime<Utc>>,
    attendance: BTreeMap<u64, (AttendanceRecord, NaiveDate)>,
    next_user_id: u64,
    next_attendance_id: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn attendance_count(&self) -> usize {
        self.tables.read().await.attendance.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("User"));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.next_user_id,
            email: user.email,
            password: user.password,
            name: user.name,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_user_by_email(email).await?.is_some())
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password) = changes.password {
            user.password = password;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn touch_last_login(&self, id: u64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&id) {
            tables.last_logins.insert(id, Utc::now());
        }
        Ok(())
    }

    fn stream_emails(
        &self,
        active_since: Option<DateTime<Utc>>,
    ) -> BoxStream<'_, StoreResult<String>> {
        let tables = self.tables.clone();
        stream::once(async move {
            let tables = tables.read().await;
            tables
                .users
                .values()
                .filter(|u| match active_since {
                    Some(since) => tables.last_logins.get(&u.id).is_some_and(|at| *at >= since),
                    None => true,
                })
                .map(|u| Ok(u.email.clone()))
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn create_attendance(&self, attendance: NewAttendance) -> StoreResult<AttendanceRecord> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.attendance.values().any(|(record, day)| {
            record.user_id == attendance.user_id && *day == attendance.check_in_day
        });
        if duplicate {
            return Err(StoreError::Duplicate("Attendance"));
        }

        tables.next_attendance_id += 1;
        let record = AttendanceRecord {
            id: tables.next_attendance_id,
            user_id: attendance.user_id,
            check_in: attendance.check_in,
            check_out: None,
            location: attendance.location,
            ip_address: attendance.ip_address,
            photo_url: attendance.photo_url,
        };
        tables
            .attendance
            .insert(record.id, (record.clone(), attendance.check_in_day));
        Ok(record)
    }

    async fn find_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendance
            .values()
            .map(|(record, _)| record)
            .filter(|record| matches(filter, record))
            .max_by_key(|record| (record.check_in, record.id))
            .cloned())
    }

    async fn close_attendance(
        &self,
        id: u64,
        check_out: DateTime<Utc>,
    ) -> StoreResult<AttendanceRecord> {
        let mut tables = self.tables.write().await;
        match tables.attendance.get_mut(&id) {
            Some((record, _)) if record.is_open() => {
                record.check_out = Some(check_out);
                Ok(record.clone())
            }
            _ => Err(StoreError::NotFound("Open attendance")),
        }
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Vec<AttendanceWithUser>> {
        let tables = self.tables.read().await;
        let mut rows = tables
            .attendance
            .values()
            .map(|(record, _)| record)
            .filter(|record| matches(filter, record))
            .filter_map(|record| {
                let user = tables.users.get(&record.user_id)?;
                Some(AttendanceWithUser {
                    record: record.clone(),
                    user_name: user.name.clone(),
                    user_email: user.email.clone(),
                })
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| {
            (b.record.check_in, b.record.id).cmp(&(a.record.check_in, a.record.id))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn new_attendance(user_id: u64, check_in: DateTime<Utc>) -> NewAttendance {
        NewAttendance {
            user_id,
            check_in,
            check_in_day: check_in.date_naive(),
            location: "37.7,-122.4".into(),
            ip_address: "1.2.3.4".into(),
            photo_url: "photo://a".into(),
        }
    }

    #[actix_web::test]
    async fn rejects_second_record_for_same_day() {
        let store = MemoryStore::new();
        let morning = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();

        store.create_attendance(new_attendance(1, morning)).await.unwrap();
        let err = store
            .create_attendance(new_attendance(1, morning + chrono::Duration::hours(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // other users are unaffected
        store.create_attendance(new_attendance(2, morning)).await.unwrap();
        assert_eq!(store.attendance_count().await, 2);
    }

    #[actix_web::test]
    async fn close_only_applies_once() {
        let store = MemoryStore::new();
        let morning = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let record = store.create_attendance(new_attendance(1, morning)).await.unwrap();

        let evening = morning + chrono::Duration::hours(8);
        let closed = store.close_attendance(record.id, evening).await.unwrap();
        assert_eq!(closed.check_out, Some(evening));

        let err = store
            .close_attendance(record.id, evening + chrono::Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[actix_web::test]
    async fn streams_only_recently_active_emails() {
        let store = MemoryStore::new();
        let a = store
            .create_user(NewUser {
                email: "a@example.com".into(),
                password: "x".into(),
                name: "A".into(),
            })
            .await
            .unwrap();
        store
            .create_user(NewUser {
                email: "b@example.com".into(),
                password: "x".into(),
                name: "B".into(),
            })
            .await
            .unwrap();
        store.touch_last_login(a.id).await.unwrap();

        let all: Vec<_> = store.stream_emails(None).collect().await;
        assert_eq!(all.len(), 2);

        let recent: Vec<String> = store
            .stream_emails(Some(Utc::now() - chrono::Duration::days(1)))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(recent, vec!["a@example.com".to_string()]);
    }
}

use std::sync::Arc;

use actix_web::web::{self, Data};

use crate::{
    config::Config,
    store::{AttendanceStore, UserStore},
    tracker::{AttendanceTracker, clock::Clock},
    utils::{email_cache::EmailCache, email_filter::EmailFilter},
};

/// Shared handles registered as app data on every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: Data<Config>,
    pub users: Data<dyn UserStore>,
    pub tracker: Data<AttendanceTracker>,
    pub email_filter: Data<EmailFilter>,
    pub email_cache: Data<EmailCache>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        attendance: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = AttendanceTracker::new(attendance, clock, config.server_timezone);
        Self {
            config: Data::new(config),
            users: Data::from(users),
            tracker: Data::new(tracker),
            email_filter: Data::new(EmailFilter::new()),
            email_cache: Data::new(EmailCache::new()),
        }
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.users.clone())
            .app_data(self.tracker.clone())
            .app_data(self.email_filter.clone())
            .app_data(self.email_cache.clone());
    }
}

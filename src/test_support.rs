use std::{net::SocketAddr, sync::Arc};

use actix_web::web;
use chrono::{TimeZone, Utc};

use crate::{
    auth::{jwt::generate_access_token, password::hash_password},
    config::Config,
    model::user::{NewUser, User},
    routes,
    state::AppState,
    store::{UserStore, memory::MemoryStore},
    tracker::clock::FixedClock,
};

/// App state over an in-memory store and a clock pinned to 2024-01-15 09:00 UTC.
pub struct TestState {
    pub state: AppState,
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
}

impl TestState {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        ));
        let state = AppState::new(
            Config::for_tests(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            clock.clone(),
        );
        Self {
            state,
            store,
            clock,
        }
    }

    /// Rate limiters key on the peer address.
    pub fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        self.state.register(cfg);
        routes::configure(cfg, &self.state.config);
    }

    pub async fn seed_user(&self, email: &str, password: &str) -> User {
        self.store
            .create_user(NewUser {
                email: email.to_string(),
                password: hash_password(password).unwrap(),
                name: "Test User".to_string(),
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        let config = &self.state.config;
        generate_access_token(user, &config.jwt_secret, config.access_token_ttl).unwrap()
    }
}

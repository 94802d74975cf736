use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures_util::StreamExt;
use moka::future::Cache;
use tracing::info;

use super::email_filter::normalize;
use crate::store::UserStore;

/// Recently seen registered emails: a hit means the email is definitely taken.
pub struct EmailCache {
    inner: Cache<String, bool>,
}

impl Default for EmailCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    pub async fn mark_taken(&self, email: &str) {
        self.inner.insert(normalize(email), true).await;
    }

    pub async fn is_taken(&self, email: &str) -> bool {
        self.inner.get(&normalize(email)).await.unwrap_or(false)
    }

    async fn batch_mark(&self, emails: &[String]) {
        let futures: Vec<_> = emails
            .iter()
            .map(|e| self.inner.insert(normalize(e), true))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Load only RECENT emails (logged in within `days`) into the cache, batched.
    pub async fn warmup(&self, store: &dyn UserStore, days: i64, batch_size: usize) -> Result<()> {
        let since = Utc::now() - chrono::Duration::days(days);
        let mut stream = store.stream_emails(Some(since));

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        info!(total_count, days, "Email cache warmup complete");
        Ok(())
    }
}

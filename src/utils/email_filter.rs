use std::sync::RwLock;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use tracing::info;

use crate::store::UserStore;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Probabilistic set of registered emails: a miss means the email is definitely free.
pub struct EmailFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailFilter {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        match self.inner.read() {
            Ok(filter) => filter.contains(&email),
            // a poisoned filter can no longer prove absence
            Err(_) => true,
        }
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.inner.write() {
            filter.add(&email);
        }
    }

    fn insert_batch(&self, emails: &[String]) {
        if let Ok(mut filter) = self.inner.write() {
            for email in emails {
                filter.add(email);
            }
        }
    }

    /// Loads every registered email, streaming from the store in batches.
    pub async fn warmup(&self, store: &dyn UserStore, batch_size: usize) -> Result<()> {
        let mut stream = store.stream_emails(None);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let email = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(normalize(&email));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        info!(total, "Email filter warmup complete");
        Ok(())
    }
}

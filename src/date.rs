//! A cached `Date` header value, refreshed once per second by a background
//! task rather than formatted on every response.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared, periodically-refreshed HTTP-date string for the `Date`
/// response header.
#[derive(Clone)]
pub struct DateCache {
    inner: Arc<Inner>,
}

struct Inner {
    last_secs: AtomicI64,
    formatted: arc_swap_cell::ArcCell<String>,
}

mod arc_swap_cell {
    use std::sync::{Arc, Mutex};

    /// A minimal swappable `Arc<T>` cell; we don't pull in `arc-swap` for
    /// a single hot value refreshed once a second.
    pub struct ArcCell<T>(Mutex<Arc<T>>);

    impl<T> ArcCell<T> {
        pub fn new(value: T) -> Self {
            ArcCell(Mutex::new(Arc::new(value)))
        }

        pub fn load(&self) -> Arc<T> {
            self.0.lock().expect("date cache mutex poisoned").clone()
        }

        pub fn store(&self, value: T) {
            *self.0.lock().expect("date cache mutex poisoned") = Arc::new(value);
        }
    }
}

impl DateCache {
    pub fn new() -> Self {
        let now = std::time::SystemTime::now();
        let formatted = httpdate::fmt_http_date(now);
        DateCache {
            inner: Arc::new(Inner {
                last_secs: AtomicI64::new(unix_secs(now)),
                formatted: arc_swap_cell::ArcCell::new(formatted),
            }),
        }
    }

    /// Return the cached date string, refreshing it first if the wall
    /// clock has moved into a new second since the last refresh.
    pub fn get(&self) -> Arc<String> {
        let now = std::time::SystemTime::now();
        let now_secs = unix_secs(now);
        if self.inner.last_secs.swap(now_secs, Ordering::Relaxed) != now_secs {
            self.inner.formatted.store(httpdate::fmt_http_date(now));
        }
        self.inner.formatted.load()
    }

    /// Spawn a background task that refreshes the cache every second so
    /// readers on the hot path never pay the formatting cost.
    pub fn spawn_refresh(&self) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                cache.get();
            }
        })
    }
}

impl Default for DateCache {
    fn default() -> Self {
        DateCache::new()
    }
}

fn unix_secs(t: std::time::SystemTime) -> i64 {
    t.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_a_plausible_http_date() {
        let cache = DateCache::new();
        let value = cache.get();
        assert!(value.ends_with("GMT"));
    }
}

//! Address resolution with caching, request coalescing and provider rate
//! limiting.
//!
//! The cache and the in-flight map are the only cross-request shared
//! mutable state; both sit behind short-lived mutexes that are never held
//! across the network call. The provider call itself runs in a spawned
//! task, so a caller that abandons its search cancels only its own wait
//! while coalesced waiters still get the result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::clients::{GeocodeProvider, ProviderError};
use crate::config::GeocodingConfig;
use crate::models::Coordinates;

/// Cloneable so a single in-flight outcome can be fanned out to every
/// coalesced waiter.
#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    #[error("could not locate address '{0}'")]
    Unresolved(String),

    #[error("geocoding provider unavailable: {0}")]
    Provider(String),

    /// The token bucket could not admit the request within the bounded
    /// wait. Surfaced to callers like any transient provider failure but
    /// logged separately for diagnosis.
    #[error("geocoding rate limit exceeded")]
    RateLimited,
}

/// Collapses an address to its cache key: trimmed, case-folded, internal
/// whitespace runs folded to single spaces. Two raw strings that
/// normalize identically share one cache entry and one provider call.
#[must_use]
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

type ResolveOutcome = Result<Coordinates, GeocodeError>;

/// Address cache with LRU-style eviction. Entries never expire (addresses
/// do not move); eviction only trades cache-hit rate for memory.
struct AddressCache {
    entries: HashMap<String, CacheSlot>,
    capacity: usize,
    tick: u64,
}

struct CacheSlot {
    coords: Coordinates,
    last_used: u64,
}

impl AddressCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
        }
    }

    fn get(&mut self, key: &str) -> Option<Coordinates> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|slot| {
            slot.last_used = tick;
            slot.coords
        })
    }

    fn insert(&mut self, key: String, coords: Coordinates) {
        self.tick += 1;
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            // Evict the least recently used slot. Linear scan, but only on
            // overflow of an already-bounded map.
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&oldest);
            }
        }
        let tick = self.tick;
        self.entries.insert(
            key,
            CacheSlot {
                coords,
                last_used: tick,
            },
        );
    }
}

/// Token bucket admitting roughly one provider call per configured
/// interval. Callers sleep between probes instead of busy-polling, and
/// give up after `max_wait`.
struct RateLimiter {
    state: Mutex<LimiterState>,
    interval: Duration,
}

struct LimiterState {
    next_slot: Instant,
}

impl RateLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                next_slot: Instant::now(),
            }),
            interval,
        }
    }

    async fn acquire(&self, max_wait: Duration) -> Result<(), GeocodeError> {
        let deadline = Instant::now() + max_wait;
        let slot = {
            let mut state = self.state.lock().expect("rate limiter mutex poisoned");
            let now = Instant::now();
            let slot = state.next_slot.max(now);
            if slot > deadline {
                return Err(GeocodeError::RateLimited);
            }
            state.next_slot = slot + self.interval;
            slot
        };
        tokio::time::sleep_until(slot).await;
        Ok(())
    }
}

struct Inner {
    provider: Arc<dyn GeocodeProvider>,
    cache: Mutex<AddressCache>,
    in_flight: Mutex<HashMap<String, watch::Receiver<Option<ResolveOutcome>>>>,
    limiter: RateLimiter,
    max_attempts: u32,
    retry_base_delay: Duration,
    rate_wait_timeout: Duration,
}

/// Resolves free-text addresses to coordinates. Constructed once at
/// startup and shared by reference; tests build a fresh instance per case
/// with a provider double.
pub struct GeocodingService {
    inner: Arc<Inner>,
}

impl GeocodingService {
    #[must_use]
    pub fn new(provider: Arc<dyn GeocodeProvider>, config: &GeocodingConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                cache: Mutex::new(AddressCache::new(config.cache_capacity)),
                in_flight: Mutex::new(HashMap::new()),
                limiter: RateLimiter::new(Duration::from_millis(config.min_request_interval_ms)),
                max_attempts: config.max_attempts.max(1),
                retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
                rate_wait_timeout: Duration::from_millis(config.rate_wait_timeout_ms),
            }),
        }
    }

    /// Resolves an address, hitting the cache first and coalescing
    /// concurrent lookups of the same normalized key onto one provider
    /// call.
    pub async fn resolve(&self, address: &str) -> ResolveOutcome {
        let key = normalize_address(address);
        if key.is_empty() {
            return Err(GeocodeError::Unresolved(address.to_string()));
        }

        if let Some(coords) = self.inner.cache.lock().expect("cache mutex poisoned").get(&key) {
            return Ok(coords);
        }

        let mut rx = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .expect("in-flight mutex poisoned");

            // Re-check under the in-flight lock: a just-finished call may
            // have populated the cache after our miss above.
            if let Some(coords) = self.inner.cache.lock().expect("cache mutex poisoned").get(&key) {
                return Ok(coords);
            }

            if let Some(rx) = in_flight.get(&key) {
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                in_flight.insert(key.clone(), rx.clone());

                let inner = Arc::clone(&self.inner);
                let task_key = key.clone();
                tokio::spawn(async move {
                    let outcome = inner.resolve_uncached(&task_key).await;
                    inner
                        .in_flight
                        .lock()
                        .expect("in-flight mutex poisoned")
                        .remove(&task_key);
                    // Waiters may all have gone away; that only means
                    // nobody needs the value right now. It is cached.
                    let _ = tx.send(Some(outcome));
                });

                rx
            }
        };

        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| GeocodeError::Provider("geocode task dropped".to_string()))?;
        outcome.clone().expect("waited for Some")
    }
}

impl Inner {
    /// One rate-limited, retried provider round for a normalized key.
    /// Successful results are cached before being reported.
    async fn resolve_uncached(&self, key: &str) -> ResolveOutcome {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let backoff = self.retry_base_delay * 2u32.pow(attempt - 2);
                tokio::time::sleep(backoff).await;
            }

            match self.limiter.acquire(self.rate_wait_timeout).await {
                Ok(()) => {}
                Err(e) => {
                    warn!("Geocode rate limiter refused '{key}' within bounded wait");
                    return Err(e);
                }
            }

            match self.provider.lookup(key).await {
                Ok(Some(coords)) => {
                    debug!("Geocoded '{key}' to ({}, {})", coords.latitude, coords.longitude);
                    self.cache
                        .lock()
                        .expect("cache mutex poisoned")
                        .insert(key.to_string(), coords);
                    return Ok(coords);
                }
                // The provider answered and found nothing. Retrying an
                // address that does not exist will not make it exist.
                Ok(None) => {
                    debug!("No geocoding result for '{key}'");
                    return Err(GeocodeError::Unresolved(key.to_string()));
                }
                Err(ProviderError::RateLimited) => {
                    warn!("Geocoding provider throttled attempt {attempt} for '{key}'");
                    last_error = "provider throttled".to_string();
                }
                Err(e) => {
                    warn!("Geocoding attempt {attempt} for '{key}' failed: {e}");
                    last_error = e.to_string();
                }
            }
        }

        Err(GeocodeError::Provider(last_error))
    }
}

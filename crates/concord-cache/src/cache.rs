//! Token → resource-kind → value store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use concord_oauth::OpaqueToken;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// The resource families a token can have cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Guilds,
    Connections,
}

impl ResourceKind {
    /// Every kind, in prefetch order.
    pub const ALL: [ResourceKind; 3] = [Self::User, Self::Guilds, Self::Connections];

    /// Lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Guilds => "guilds",
            Self::Connections => "connections",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,

    /// When this entry was stored.
    pub cached_at: Instant,
}

/// Permission to store one fetched value.
///
/// Issued by [`TokenCache::begin_fetch`] and consumed by [`TokenCache::store`].
#[derive(Debug)]
#[must_use = "a ticket does nothing until passed to TokenCache::store"]
pub struct FetchTicket {
    token: OpaqueToken,
    kind: ResourceKind,
    epoch: u64,
}

impl FetchTicket {
    /// The token the fetch is for.
    pub fn token(&self) -> &OpaqueToken {
        &self.token
    }

    /// The resource kind being fetched.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// Per-token state.
struct Slot<V> {
    epoch: u64,
    fenced: bool,
    /// Tickets issued at the current epoch and not yet stored or abandoned.
    pending: usize,
    entries: HashMap<ResourceKind, CacheEntry<V>>,
}

impl<V> Slot<V> {
    fn new(epoch: u64) -> Self {
        Self {
            epoch,
            fenced: false,
            pending: 0,
            entries: HashMap::new(),
        }
    }

    /// Nothing cached and nothing in flight.
    fn is_idle(&self) -> bool {
        self.pending == 0 && self.entries.is_empty()
    }
}

/// Inner state protected by RwLock.
struct CacheInner<V> {
    slots: HashMap<OpaqueToken, Slot<V>>,

    /// Monotonic across all slots, so a re-created slot never reuses an epoch.
    next_epoch: u64,
}

impl<V> CacheInner<V> {
    fn bump(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }
}

/// Concurrency-safe token-keyed cache with revoke fencing.
///
/// Cloning is cheap; clones share the same storage.
pub struct TokenCache<V> {
    inner: Arc<RwLock<CacheInner<V>>>,
}

impl<V> Clone for TokenCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for TokenCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for TokenCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

impl<V> TokenCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                slots: HashMap::new(),
                next_epoch: 0,
            })),
        }
    }

    /// Number of tokens with a slot.
    pub async fn len(&self) -> usize {
        self.inner.read().await.slots.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.slots.is_empty()
    }

    /// Check if a value is cached for `(token, kind)` and readable.
    pub async fn contains(&self, token: &OpaqueToken, kind: ResourceKind) -> bool {
        let inner = self.inner.read().await;
        inner
            .slots
            .get(token)
            .is_some_and(|slot| !slot.fenced && slot.entries.contains_key(&kind))
    }

    /// Whether the token's slot is currently fenced.
    pub async fn is_fenced(&self, token: &OpaqueToken) -> bool {
        let inner = self.inner.read().await;
        inner.slots.get(token).is_some_and(|slot| slot.fenced)
    }

    /// Open a fetch for `(token, kind)`, creating the slot if needed.
    ///
    /// Fails with [`Error::Fenced`] while a revocation holds the slot.
    pub async fn begin_fetch(&self, token: &OpaqueToken, kind: ResourceKind) -> Result<FetchTicket> {
        let mut inner = self.inner.write().await;

        let fenced = inner.slots.get(token).map(|slot| slot.fenced);
        if fenced == Some(true) {
            debug!(token = %token.fingerprint(), kind = %kind, "Fetch refused, slot fenced");
            return Err(Error::Fenced(token.fingerprint().to_string()));
        }
        if fenced.is_none() {
            let epoch = inner.bump();
            inner.slots.insert(token.clone(), Slot::new(epoch));
        }

        let Some(slot) = inner.slots.get_mut(token) else {
            return Err(Error::StaleTicket(token.fingerprint().to_string()));
        };
        slot.pending += 1;
        let epoch = slot.epoch;

        trace!(token = %token.fingerprint(), kind = %kind, epoch, "Fetch ticket issued");
        Ok(FetchTicket {
            token: token.clone(),
            kind,
            epoch,
        })
    }

    /// Store a fetched value under its ticket.
    ///
    /// The write is discarded if the slot was fenced, evicted, or re-created
    /// since the ticket was issued. Otherwise it replaces any existing entry.
    pub async fn store(&self, ticket: FetchTicket, value: V) -> Result<()> {
        let mut inner = self.inner.write().await;
        let FetchTicket { token, kind, epoch } = ticket;

        let Some(slot) = inner.slots.get_mut(&token) else {
            debug!(token = %token.fingerprint(), kind = %kind, "Discarding write, slot evicted");
            return Err(Error::StaleTicket(token.fingerprint().to_string()));
        };
        if slot.fenced {
            debug!(token = %token.fingerprint(), kind = %kind, "Discarding write, slot fenced");
            return Err(Error::Fenced(token.fingerprint().to_string()));
        }
        if slot.epoch != epoch {
            debug!(
                token = %token.fingerprint(),
                kind = %kind,
                ticket_epoch = epoch,
                slot_epoch = slot.epoch,
                "Discarding write, stale epoch"
            );
            return Err(Error::StaleTicket(token.fingerprint().to_string()));
        }

        slot.pending = slot.pending.saturating_sub(1);
        slot.entries.insert(
            kind,
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
        trace!(token = %token.fingerprint(), kind = %kind, "Value stored");
        Ok(())
    }

    /// Give up on a fetch that produced nothing to store.
    ///
    /// Drops the slot if the ticket opened it and nothing else was cached or
    /// started under it since.
    pub async fn abandon(&self, ticket: FetchTicket) {
        let mut inner = self.inner.write().await;
        let FetchTicket { token, kind, epoch } = ticket;

        let Some(slot) = inner.slots.get_mut(&token) else {
            return;
        };
        if slot.epoch != epoch {
            return;
        }
        slot.pending = slot.pending.saturating_sub(1);

        if !slot.fenced && slot.is_idle() {
            inner.slots.remove(&token);
            debug!(token = %token.fingerprint(), kind = %kind, "Fetch abandoned, empty slot dropped");
        } else {
            trace!(token = %token.fingerprint(), kind = %kind, "Fetch abandoned");
        }
    }

    /// Fence a token's slot so no fetch can start or land.
    ///
    /// Creates an empty fenced slot if none exists. Outstanding tickets go
    /// stale. Returns the number of entries the slot held.
    pub async fn fence(&self, token: &OpaqueToken) -> usize {
        let mut inner = self.inner.write().await;
        let epoch = inner.bump();
        let slot = inner
            .slots
            .entry(token.clone())
            .or_insert_with(|| Slot::new(epoch));
        slot.fenced = true;
        slot.epoch = epoch;
        slot.pending = 0;

        debug!(token = %token.fingerprint(), entries = slot.entries.len(), "Slot fenced");
        slot.entries.len()
    }

    /// Lift a fence, keeping the slot's entries.
    ///
    /// A slot with nothing cached is dropped instead. Fetches that were in
    /// flight when the fence went up stay stale.
    pub async fn unfence(&self, token: &OpaqueToken) {
        let mut inner = self.inner.write().await;
        let Some(slot) = inner.slots.get_mut(token) else {
            return;
        };

        if slot.is_idle() {
            inner.slots.remove(token);
            debug!(token = %token.fingerprint(), "Slot unfenced and dropped, nothing cached");
        } else {
            slot.fenced = false;
            debug!(token = %token.fingerprint(), "Slot unfenced");
        }
    }

    /// Drop a token's slot and everything in it.
    pub async fn evict(&self, token: &OpaqueToken) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.slots.remove(token).is_some();
        if removed {
            debug!(token = %token.fingerprint(), "Slot evicted");
        }
        removed
    }

    /// Remove every slot.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.slots.len();
        inner.slots.clear();
        debug!(count = count, "Cache cleared");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            tokens: inner.slots.len(),
            entries: inner.slots.values().map(|s| s.entries.len()).sum(),
            fenced: inner.slots.values().filter(|s| s.fenced).count(),
        }
    }
}

impl<V: Clone> TokenCache<V> {
    /// Get a cached value. Fenced slots read as empty.
    pub async fn get(&self, token: &OpaqueToken, kind: ResourceKind) -> Option<V> {
        let inner = self.inner.read().await;
        let slot = inner.slots.get(token).filter(|slot| !slot.fenced)?;
        slot.entries.get(&kind).map(|entry| entry.value.clone())
    }

    /// Get a cached entry with its metadata.
    pub async fn get_entry(&self, token: &OpaqueToken, kind: ResourceKind) -> Option<CacheEntry<V>> {
        let inner = self.inner.read().await;
        let slot = inner.slots.get(token).filter(|slot| !slot.fenced)?;
        slot.entries.get(&kind).cloned()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of tokens with a slot.
    pub tokens: usize,

    /// Number of cached values across all slots.
    pub entries: usize,

    /// Number of slots currently fenced.
    pub fenced: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn token(s: &str) -> OpaqueToken {
        OpaqueToken::new(s)
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let cache = TokenCache::new();
        let t = token("token-a");

        assert!(cache.get(&t, ResourceKind::User).await.is_none());

        let ticket = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.store(ticket, 42u32).await.unwrap();

        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(42));
        assert!(cache.get(&t, ResourceKind::Guilds).await.is_none());
        assert!(cache.contains(&t, ResourceKind::User).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let first = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        let second = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();

        cache.store(second, 2u32).await.unwrap();
        cache.store(first, 1u32).await.unwrap();

        // Last completed store wins
        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(1));
    }

    #[tokio::test]
    async fn test_fence_blocks_fetch_and_store() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let seeded = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.store(seeded, 1u32).await.unwrap();

        let in_flight = cache.begin_fetch(&t, ResourceKind::Guilds).await.unwrap();
        assert_eq!(cache.fence(&t).await, 1);

        assert!(cache.is_fenced(&t).await);
        assert!(cache.get(&t, ResourceKind::User).await.is_none());
        assert!(matches!(
            cache.begin_fetch(&t, ResourceKind::User).await,
            Err(Error::Fenced(_))
        ));
        assert!(matches!(
            cache.store(in_flight, 2u32).await,
            Err(Error::Fenced(_))
        ));
    }

    #[tokio::test]
    async fn test_unfence_restores_entries_but_not_old_tickets() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let seeded = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.store(seeded, 1u32).await.unwrap();

        let in_flight = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.fence(&t).await;
        cache.unfence(&t).await;

        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(1));
        assert!(matches!(
            cache.store(in_flight, 99u32).await,
            Err(Error::StaleTicket(_))
        ));
        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(1));

        let fresh = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.store(fresh, 3u32).await.unwrap();
        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(3));
    }

    #[tokio::test]
    async fn test_evicted_slot_rejects_old_ticket() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let old = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        assert!(cache.evict(&t).await);
        assert!(matches!(
            cache.store(old, 1u32).await,
            Err(Error::StaleTicket(_))
        ));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_recreated_slot_rejects_old_ticket() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let old = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.fence(&t).await;
        cache.evict(&t).await;

        let fresh = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        assert!(matches!(
            cache.store(old, 1u32).await,
            Err(Error::StaleTicket(_))
        ));
        cache.store(fresh, 2u32).await.unwrap();
        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(2));
    }

    #[tokio::test]
    async fn test_abandon_drops_empty_slot() {
        let cache = TokenCache::<u32>::new();
        let t = token("token-a");

        let ticket = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        assert_eq!(cache.len().await, 1);

        cache.abandon(ticket).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_abandon_keeps_slot_with_entries() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let ticket = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.store(ticket, 1u32).await.unwrap();

        let failed = cache.begin_fetch(&t, ResourceKind::Guilds).await.unwrap();
        cache.abandon(failed).await;
        assert_eq!(cache.get(&t, ResourceKind::User).await, Some(1));
    }

    #[tokio::test]
    async fn test_abandon_keeps_slot_with_fetch_in_flight() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let failed = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        let in_flight = cache.begin_fetch(&t, ResourceKind::Guilds).await.unwrap();

        cache.abandon(failed).await;
        assert_eq!(cache.len().await, 1);

        cache.store(in_flight, 7u32).await.unwrap();
        assert_eq!(cache.get(&t, ResourceKind::Guilds).await, Some(7));
    }

    #[tokio::test]
    async fn test_abandon_after_fence_is_ignored() {
        let cache = TokenCache::<u32>::new();
        let t = token("token-a");

        let ticket = cache.begin_fetch(&t, ResourceKind::User).await.unwrap();
        cache.fence(&t).await;
        cache.abandon(ticket).await;

        assert!(cache.is_fenced(&t).await);
    }

    #[tokio::test]
    async fn test_unfence_drops_empty_slot() {
        let cache = TokenCache::<u32>::new();
        let t = token("token-a");

        cache.fence(&t).await;
        cache.unfence(&t).await;

        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_tokens_are_isolated() {
        let cache = TokenCache::new();
        let a = token("token-a");
        let b = token("token-b");

        let ticket = cache.begin_fetch(&a, ResourceKind::User).await.unwrap();
        cache.store(ticket, 1u32).await.unwrap();
        let ticket = cache.begin_fetch(&b, ResourceKind::User).await.unwrap();
        cache.store(ticket, 2u32).await.unwrap();

        cache.fence(&a).await;
        assert_eq!(cache.get(&b, ResourceKind::User).await, Some(2));
        cache.evict(&a).await;
        assert_eq!(cache.get(&b, ResourceKind::User).await, Some(2));
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = TokenCache::new();
        let a = token("token-a");
        let b = token("token-b");

        for kind in ResourceKind::ALL {
            let ticket = cache.begin_fetch(&a, kind).await.unwrap();
            cache.store(ticket, 0u8).await.unwrap();
        }
        cache.fence(&b).await;

        assert_eq!(
            cache.stats().await,
            CacheStats {
                tokens: 2,
                entries: 3,
                fenced: 1,
            }
        );

        cache.clear().await;
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let cache = TokenCache::new();
        let t = token("token-a");

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let cache = cache.clone();
            let t = t.clone();
            handles.push(tokio::spawn(async move {
                let ticket = cache.begin_fetch(&t, ResourceKind::Guilds).await.unwrap();
                tokio::time::sleep(Duration::from_millis(u64::from(i % 4))).await;
                cache.store(ticket, i).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let value = cache.get(&t, ResourceKind::Guilds).await.unwrap();
        assert!(value < 16);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::Connections.to_string(), "connections");
    }
}

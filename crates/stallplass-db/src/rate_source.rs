//! # Rate Source
//!
//! Where the pricing composer gets base prices and tiers from.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler                                                                │
//! │     │  rates.family_rates(PricingFamily::Box)                           │
//! │     ▼                                                                   │
//! │  CachedRateSource<Database>                                             │
//! │     │  hit (younger than ttl)  → cloned value, no SQL                   │
//! │     │  miss / expired          → ask inner source, remember result      │
//! │     │  invalidate()            → drop everything (after admin writes)   │
//! │     │  fetch overlapping an invalidate() is returned, never stored      │
//! │     ▼                                                                   │
//! │  Database (impl RateSource)                                             │
//! │     base_prices / *_discount_tiers → basis points                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All rates leaving a `RateSource` are in basis points. Missing base prices
//! are an error here; display fallbacks belong to the caller.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use stallplass_core::{DiscountTier, FamilyRates, Money, PricingFamily, TierKind};

// =============================================================================
// Trait
// =============================================================================

/// Supplies base prices and discount tiers.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// The active base price called `name`.
    ///
    /// Fails with [`DbError::RateNotFound`] if there is no active row.
    async fn base_price(&self, name: &str) -> DbResult<Money>;

    /// Active tiers for `family`/`kind`, in any order.
    async fn tiers(&self, family: PricingFamily, kind: TierKind) -> DbResult<Vec<DiscountTier>>;

    /// Everything needed to price `family`.
    async fn family_rates(&self, family: PricingFamily) -> DbResult<FamilyRates> {
        let base_price = self.base_price(family.base_rate_name()).await?;
        let quantity_tiers = self.tiers(family, TierKind::Quantity).await?;
        let duration_tiers = self.tiers(family, TierKind::Duration).await?;

        Ok(FamilyRates::new(family, base_price)
            .with_quantity_tiers(quantity_tiers)
            .with_duration_tiers(duration_tiers))
    }
}

#[async_trait]
impl RateSource for Database {
    async fn base_price(&self, name: &str) -> DbResult<Money> {
        self.base_prices()
            .get_active(name)
            .await?
            .map(|row| row.price)
            .ok_or_else(|| DbError::RateNotFound {
                name: name.to_string(),
            })
    }

    async fn tiers(&self, family: PricingFamily, kind: TierKind) -> DbResult<Vec<DiscountTier>> {
        let mut tiers = self.tiers().list(family, kind).await?;
        tiers.retain(|tier| tier.is_active);
        Ok(tiers)
    }
}

// =============================================================================
// TTL Cache
// =============================================================================

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// Wraps a [`RateSource`] with a time-to-live cache.
///
/// A `ttl` of zero disables caching. Errors are never cached.
///
/// Every `invalidate()` bumps a generation counter. A lookup only stores its
/// result if the generation is unchanged since it started, so a read racing
/// an admin write cannot put the old rate back for a full TTL.
///
/// ```rust,ignore
/// let rates = CachedRateSource::new(db.clone(), Duration::from_secs(30));
/// let box_rates = rates.family_rates(PricingFamily::Box).await?;
/// // after PUT /api/admin/base-prices/box-monthly
/// rates.invalidate().await;
/// ```
#[derive(Debug)]
pub struct CachedRateSource<S> {
    inner: S,
    ttl: Duration,
    generation: AtomicU64,
    prices: RwLock<HashMap<String, Cached<Money>>>,
    tiers: RwLock<HashMap<(PricingFamily, TierKind), Cached<Vec<DiscountTier>>>>,
}

impl<S: RateSource> CachedRateSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedRateSource {
            inner,
            ttl,
            generation: AtomicU64::new(0),
            prices: RwLock::new(HashMap::new()),
            tiers: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops every cached entry so the next read goes to the inner source.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.prices.write().await.clear();
        self.tiers.write().await.clear();
        debug!("Rate cache invalidated");
    }
}

#[async_trait]
impl<S: RateSource> RateSource for CachedRateSource<S> {
    async fn base_price(&self, name: &str) -> DbResult<Money> {
        if let Some(price) = self
            .prices
            .read()
            .await
            .get(name)
            .and_then(|entry| entry.fresh(self.ttl))
        {
            return Ok(price);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let price = self.inner.base_price(name).await?;

        let mut prices = self.prices.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            prices.insert(
                name.to_string(),
                Cached {
                    value: price,
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(price)
    }

    async fn tiers(&self, family: PricingFamily, kind: TierKind) -> DbResult<Vec<DiscountTier>> {
        let key = (family, kind);

        if let Some(tiers) = self
            .tiers
            .read()
            .await
            .get(&key)
            .and_then(|entry| entry.fresh(self.ttl))
        {
            return Ok(tiers);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let tiers = self.inner.tiers(family, kind).await?;

        let mut cache = self.tiers.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            cache.insert(
                key,
                Cached {
                    value: tiers.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(tiers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Lazily materialized moderation blocklist.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::domain::entities::Banlist;
use crate::domain::record::Kind;
use crate::error::AppError;
use crate::infrastructure::{Tier, TieredStorage};

/// Number of most recent products and users scanned when the banlist is
/// first created.
pub const BACKFILL_LIMIT: i64 = 1000;

/// Lifecycle of the process-wide banlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanlistState {
    Uninitialized,
    Initializing,
    Ready,
}

impl BanlistState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => BanlistState::Initializing,
            2 => BanlistState::Ready,
            _ => BanlistState::Uninitialized,
        }
    }
}

/// Serves the singleton [`Banlist`].
///
/// The first retrieval allowed to reach the durable tier creates the banlist
/// from the newest product and user keys, at most once. Concurrent first
/// callers in this process wait for the one backfill; callers in other
/// processes race on an insert-if-absent and adopt whichever banlist was
/// stored first.
pub struct BanlistService {
    storage: Arc<TieredStorage>,
    cached: RwLock<Option<Arc<Banlist>>>,
    init: Mutex<()>,
    state: AtomicU8,
}

impl BanlistService {
    pub fn new(storage: Arc<TieredStorage>) -> Self {
        Self {
            storage,
            cached: RwLock::new(None),
            init: Mutex::new(()),
            state: AtomicU8::new(BanlistState::Uninitialized as u8),
        }
    }

    pub fn state(&self) -> BanlistState {
        BanlistState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: BanlistState) {
        self.state.store(state as u8, Ordering::Release);
    }

    async fn adopt(&self, banlist: Banlist) -> Arc<Banlist> {
        let banlist = Arc::new(banlist);
        *self.cached.write().await = Some(banlist.clone());
        self.set_state(BanlistState::Ready);
        banlist
    }

    /// Returns the banlist.
    ///
    /// # Returns
    ///
    /// - the cached or stored banlist if one exists on `tier`
    /// - a newly backfilled banlist if `tier` includes the durable tier and
    ///   none exists yet (possibly empty)
    /// - `Ok(None)` if `tier` excludes the durable tier and nothing is cached
    pub async fn retrieve(&self, tier: Tier) -> Result<Option<Arc<Banlist>>, AppError> {
        if let Some(banlist) = self.cached.read().await.clone() {
            return Ok(Some(banlist));
        }

        if let Some(banlist) = self.storage.get::<Banlist>(&Banlist::key(), tier).await? {
            return Ok(Some(self.adopt(banlist).await));
        }

        if !tier.includes_durable() {
            return Ok(None);
        }

        let _guard = self.init.lock().await;
        if let Some(banlist) = self.cached.read().await.clone() {
            return Ok(Some(banlist));
        }

        self.set_state(BanlistState::Initializing);
        match self.backfill().await {
            Ok(banlist) => Ok(Some(self.adopt(banlist).await)),
            Err(e) => {
                self.set_state(BanlistState::Uninitialized);
                Err(e)
            }
        }
    }

    async fn backfill(&self) -> Result<Banlist, AppError> {
        let products = self.storage.recent_names(Kind::Product, BACKFILL_LIMIT).await?;
        let users = self.storage.recent_names(Kind::TrackedUser, BACKFILL_LIMIT).await?;
        info!(
            products = products.len(),
            users = users.len(),
            "backfilling banlist"
        );

        let banlist = Banlist::new(products, users);
        Ok(self.storage.get_or_insert(banlist, Tier::Both).await?)
    }

    /// Adds product keys to the banlist.
    pub async fn ban_products(&self, keys: Vec<String>) -> Result<Arc<Banlist>, AppError> {
        self.modify(|banlist| banlist.products.extend(keys)).await
    }

    /// Adds user keys to the banlist.
    pub async fn ban_users(&self, keys: Vec<String>) -> Result<Arc<Banlist>, AppError> {
        self.modify(|banlist| banlist.users.extend(keys)).await
    }

    /// Applies `change` to the current banlist and saves it.
    ///
    /// Changes are serialized with each other and with the backfill, and
    /// each one starts from the banlist the previous one saved.
    async fn modify(&self, change: impl FnOnce(&mut Banlist)) -> Result<Arc<Banlist>, AppError> {
        self.retrieve(Tier::Both).await?;

        let _guard = self.init.lock().await;
        let mut banlist = match self.cached.read().await.as_deref() {
            Some(current) => current.clone(),
            None => Banlist::default(),
        };
        change(&mut banlist);
        self.storage.set(&banlist, Tier::Both).await?;
        Ok(self.adopt(banlist).await)
    }

    pub async fn is_product_banned(&self, product_key: &str) -> Result<bool, AppError> {
        Ok(self
            .retrieve(Tier::Both)
            .await?
            .is_some_and(|b| b.is_product_banned(product_key)))
    }

    pub async fn is_user_banned(&self, user_key: &str) -> Result<bool, AppError> {
        Ok(self
            .retrieve(Tier::Both)
            .await?
            .is_some_and(|b| b.is_user_banned(user_key)))
    }
}

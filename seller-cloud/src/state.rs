//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::analytics::AnalyticsEngine;
use crate::config::Config;
use crate::db::{PgSellerArchive, PgStatsCache, SellerArchive, StatsCache};
use crate::kv;
use crate::marketplace::{MarketplaceClient, OAuthGateway, OrderSource};
use crate::notifications::{NotificationBuffer, RedisNotificationBuffer};
use crate::token::TokenLifecycleManager;
use crate::token::store::{RedisTokenStore, TokenStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What the authorization endpoint needs to build the marketplace login URL
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub auth_url: String,
    pub client_id: String,
    pub redirect_uri: String,
}

/// The collaborators behind the service's seams
pub struct Backends {
    pub token_store: Arc<dyn TokenStore>,
    pub oauth: Arc<dyn OAuthGateway>,
    pub source: Arc<dyn OrderSource>,
    pub stats_cache: Arc<dyn StatsCache>,
    pub archive: Arc<dyn SellerArchive>,
    pub notifications: Arc<dyn NotificationBuffer>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenLifecycleManager>,
    pub engine: Arc<AnalyticsEngine>,
    /// Marketplace API, for the profile proxy
    pub source: Arc<dyn OrderSource>,
    pub stats_cache: Arc<dyn StatsCache>,
    pub archive: Arc<dyn SellerArchive>,
    pub notifications: Arc<dyn NotificationBuffer>,
    pub oauth: OAuthSettings,
    /// Shared secret for the credential status endpoint
    pub admin_key: String,
}

impl AppState {
    /// Connect PostgreSQL (running migrations) and Redis, build the
    /// marketplace client
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let redis = kv::connect(&config.redis_url).await?;
        tracing::info!("Redis connected");

        let client = Arc::new(MarketplaceClient::new(config)?);

        Ok(Self::assemble(
            config,
            Backends {
                token_store: Arc::new(RedisTokenStore::new(redis.clone())),
                oauth: client.clone(),
                source: client,
                stats_cache: Arc::new(PgStatsCache::new(pool.clone())),
                archive: Arc::new(PgSellerArchive::new(pool)),
                notifications: Arc::new(RedisNotificationBuffer::new(redis)),
            },
        ))
    }

    /// Wire the state from explicit backends
    pub fn assemble(config: &Config, backends: Backends) -> Self {
        let tokens = Arc::new(TokenLifecycleManager::new(
            backends.token_store,
            backends.oauth,
        ));
        let engine = Arc::new(AnalyticsEngine::new(
            backends.source.clone(),
            tokens.clone(),
            config.cost_model,
            config.business_timezone,
        ));

        Self {
            tokens,
            engine,
            source: backends.source,
            stats_cache: backends.stats_cache,
            archive: backends.archive,
            notifications: backends.notifications,
            oauth: OAuthSettings {
                auth_url: config.ml_auth_url.clone(),
                client_id: config.ml_client_id.clone(),
                redirect_uri: config.ml_redirect_uri.clone(),
            },
            admin_key: config.admin_key.clone(),
        }
    }
}

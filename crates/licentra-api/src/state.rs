//! Application state shared across handlers.
//!
//! Licentra's surface is small enough for one flat state struct; handlers
//! extract it whole via `State<Arc<AppState>>`.

use crate::auth::token::TokenSigner;
use licentra_core::AppConfig;
use licentra_db::{
    ApiKeyRepository, CustomerRepository, PackRepository, PrincipalRepository,
    ReportingRepository, SubscriptionRepository,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
    pub tokens: TokenSigner,
    pub principals: PrincipalRepository,
    pub customers: CustomerRepository,
    pub packs: PackRepository,
    pub subscriptions: SubscriptionRepository,
    pub api_keys: ApiKeyRepository,
    pub reporting: ReportingRepository,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, anyhow::Error> {
        let tokens = TokenSigner::from_config(&config.auth)?;

        Ok(Self {
            principals: PrincipalRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            packs: PackRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            api_keys: ApiKeyRepository::new(pool.clone()),
            reporting: ReportingRepository::new(pool.clone()),
            db_pool: pool,
            config,
            tokens,
        })
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}

use std::sync::Arc;

use auth::Authenticator;
use config::Config;
use database::CredentialStore;
use scoring::{Classifier, ImageScorer, RiskWeights};
use utils::TokenKeys;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod scoring;
pub mod utils;

/// 启动时构建一次，注入所有处理函数
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub authenticator: Arc<Authenticator>,
    pub image_scorer: Arc<ImageScorer>,
    pub risk_weights: RiskWeights,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let authenticator = Authenticator::new(
            store,
            TokenKeys::from_config(&config),
            config.bcrypt_cost,
            config.identifier_kind,
        );
        let image_scorer = ImageScorer::new(
            classifier,
            config.max_concurrent_inferences,
            config.inference_timeout(),
        );

        AppState {
            risk_weights: config.risk_weights(),
            authenticator: Arc::new(authenticator),
            image_scorer: Arc::new(image_scorer),
            config: Arc::new(config),
        }
    }
}

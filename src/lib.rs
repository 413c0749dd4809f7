pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::database::store::EvaluationStore;
use crate::services::{
    ai_service::TextGenerator, eval_service::EvalService,
    evaluation_service::EvaluationService, summary_service::SummaryService,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub evaluation_service: EvaluationService,
    pub summary_service: SummaryService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn EvaluationStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let eval_service = EvalService::new(
            generator,
            config.llm_temperature,
            Duration::from_secs(config.llm_timeout_secs),
        );
        let summary_service = SummaryService::new(store.clone());
        let evaluation_service =
            EvaluationService::new(store, eval_service, summary_service.clone());

        Self {
            config: Arc::new(config),
            evaluation_service,
            summary_service,
        }
    }
}

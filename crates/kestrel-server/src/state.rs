//! Shared application state

use crate::service::EvaluationService;
use std::sync::Arc;

/// State handed to every handler. Cloning is cheap: one `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EvaluationService>,
}

impl AppState {
    pub fn new(service: Arc<EvaluationService>) -> Self {
        Self { service }
    }
}

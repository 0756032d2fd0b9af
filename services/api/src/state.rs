//! Application state shared across handlers

use auth::{jwt::TokenService, repositories::UserStore};
use std::sync::Arc;

use crate::{
    entitlement::EntitlementEvaluator, limits::LimitPolicy, repositories::UsageStore,
    sync::SyncReconciler,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub user_store: Arc<dyn UserStore>,
    pub usage_store: Arc<dyn UsageStore>,
    pub evaluator: EntitlementEvaluator,
    pub reconciler: SyncReconciler,
}

impl AppState {
    /// Wire the evaluator and reconciler over one usage store and policy
    pub fn new(
        token_service: TokenService,
        user_store: Arc<dyn UserStore>,
        usage_store: Arc<dyn UsageStore>,
        policy: Arc<LimitPolicy>,
    ) -> Self {
        Self {
            evaluator: EntitlementEvaluator::new(policy, usage_store.clone()),
            reconciler: SyncReconciler::new(usage_store.clone()),
            token_service,
            user_store,
            usage_store,
        }
    }
}

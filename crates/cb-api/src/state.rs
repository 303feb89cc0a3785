use std::sync::Arc;

use cb_core::service::{AuthService, ComplaintService};
use cb_core::traits::{AuthProvider, ComplaintRepo, UserRepo};

use crate::cookie::CookieSettings;
use crate::metrics::Metrics;

/// State shared across all request handlers.
pub struct AppState {
    pub auth: AuthService,
    pub complaints: ComplaintService,
    pub cookies: CookieSettings,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        complaint_repo: Arc<dyn ComplaintRepo>,
        user_repo: Arc<dyn UserRepo>,
        provider: Arc<dyn AuthProvider>,
        cookies: CookieSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth: AuthService::new(user_repo.clone(), provider),
            complaints: ComplaintService::new(complaint_repo, user_repo),
            cookies,
            metrics: Metrics::new(),
        })
    }
}

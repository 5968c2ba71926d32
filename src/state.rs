use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::store::SubmissionStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    /// Storage gateway, injected so handlers never know which backend runs.
    pub store: Arc<dyn SubmissionStore>,
    pub config: Config,
    pub login_limiter: LoginRateLimiter,
}

pub mod auth_backend;
pub mod edge_pipeline;
pub mod gotrue_client;
pub mod locale_resolver;
pub mod response_merger;
pub mod session_refresher;

pub use auth_backend::{AuthBackend, AuthBackendError, RefreshOutcome};
pub use edge_pipeline::EdgePipeline;
pub use gotrue_client::GoTrueClient;
pub use session_refresher::SessionRefresher;

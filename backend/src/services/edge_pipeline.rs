use std::sync::Arc;

use crate::config::LocaleConfig;
use crate::models::{InboundRequest, ResponseCarrier};
use crate::services::locale_resolver;
use crate::services::response_merger::merge;
use crate::services::session_refresher::SessionRefresher;

/// Session refresh + locale resolution + merge, run once per matched
/// request. Holds no per-request state.
pub struct EdgePipeline {
    locale: Arc<LocaleConfig>,
    refresher: SessionRefresher,
}

impl EdgePipeline {
    pub fn new(locale: Arc<LocaleConfig>, refresher: SessionRefresher) -> Self {
        Self { locale, refresher }
    }

    pub fn locale_config(&self) -> &LocaleConfig {
        &self.locale
    }

    pub fn refresher(&self) -> &SessionRefresher {
        &self.refresher
    }

    /// Both stages run joined; the merge waits for both.
    pub async fn process(&self, request: &InboundRequest) -> ResponseCarrier {
        let (session, locale) = tokio::join!(self.refresher.refresh(request), async {
            locale_resolver::resolve(request, &self.locale)
        });

        merge(session, Some(locale))
    }
}

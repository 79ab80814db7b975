use store::UrlUpdate;
use tracing::{error, info, warn};
use upstream::extract_result_url;

use crate::gateway::timed;
use crate::metrics::record_relay;
use crate::{Gateway, GatewayError, Persistence, RelayOutcome};

impl Gateway {
    /// Forward a status query and record any result URL it reveals.
    ///
    /// The vendor is queried even for tokens with no local record; its reply
    /// is returned unmodified either way. Only an empty token or a vendor
    /// failure produces an error.
    pub async fn relay_status(&self, token: &str) -> Result<RelayOutcome, GatewayError> {
        let result = self.run_relay(token).await;
        record_relay(result.as_ref().map(|outcome| outcome.persistence.as_str()));
        result
    }

    async fn run_relay(&self, token: &str) -> Result<RelayOutcome, GatewayError> {
        if token.trim().is_empty() {
            return Err(GatewayError::invalid("token must not be empty"));
        }

        let owned = token.to_string();
        let tracked = match self.with_store(move |store| store.exists(&owned)).await {
            Ok(tracked) => Some(tracked),
            Err(err) => {
                warn!(token, error = %err, "existence check failed, relaying anyway");
                None
            }
        };
        if tracked == Some(false) {
            warn!(token, "status requested for a token with no local record");
        }

        let response = timed("poll_status", self.vendor.query_status(token))
            .await
            .map_err(|err| {
                error!(token, stage = "status", error = %err, "status query failed");
                GatewayError::from(err)
            })?;

        let persistence = match (extract_result_url(&response), tracked) {
            (_, Some(false)) => Persistence::UntrackedToken,
            (None, _) => Persistence::NoResultUrl,
            (Some(url), _) => self.store_result_url(token, url).await,
        };

        Ok(RelayOutcome {
            response,
            persistence,
        })
    }

    async fn store_result_url(&self, token: &str, url: &str) -> Persistence {
        let (owned_token, owned_url) = (token.to_string(), url.to_string());
        let update = self
            .with_store(move |store| store.update_result_url(&owned_token, &owned_url))
            .await;
        match update {
            Ok(UrlUpdate::Updated) => {
                info!(token, result_url = url, "result url stored");
                Persistence::Updated
            }
            Ok(UrlUpdate::Unchanged) => Persistence::Unchanged,
            Err(GatewayError::UnknownToken(_)) => {
                warn!(token, "result url for an untracked token");
                Persistence::UntrackedToken
            }
            Err(err) => {
                error!(token, stage = "persist_result", error = %err, "failed to store result url");
                Persistence::StoreFailed
            }
        }
    }
}

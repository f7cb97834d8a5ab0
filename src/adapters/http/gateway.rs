//! HTTP implementation of ProposalGateway.
//!
//! Talks to the workflow service's submission endpoints and translates
//! transport and status failures into the closed [`GatewayError`]
//! classification the retry driver works with.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::config::GatewayConfig;
use crate::domain::foundation::ProposalId;
use crate::domain::proposal::ProposalStatus;
use crate::ports::{GatewayError, ProposalGateway, SubmitReceipt};

/// HTTP client for the proposal submission endpoints.
pub struct HttpProposalGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpProposalGateway {
    /// Creates a gateway from configuration.
    ///
    /// The client-level timeout is a transport backstop; the retry driver
    /// races its own per-attempt deadline on top of it.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn submit_url(&self, proposal: &ProposalId) -> String {
        format!("{}/api/proposals/{}/submit", self.config.base_url, proposal)
    }

    fn draft_url(&self, proposal: &ProposalId) -> String {
        format!("{}/api/proposals/{}/draft", self.config.base_url, proposal)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout {
                timeout_secs: self.config.request_timeout_secs,
            }
        } else if e.is_connect() {
            GatewayError::network(format!("Connection failed: {}", e))
        } else {
            GatewayError::network(e.to_string())
        }
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GatewayError::AuthExpired),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(GatewayError::validation(body))
            }
            s if s.is_server_error() => Err(GatewayError::Server {
                status: s.as_u16(),
            }),
            s => Err(GatewayError::network(format!(
                "Unexpected status {}: {}",
                s, body
            ))),
        }
    }
}

/// Wire shape of the submit acknowledgement.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    proposal_status: String,
    #[serde(default)]
    already_pending: bool,
}

#[async_trait]
impl ProposalGateway for HttpProposalGateway {
    async fn submit(&self, proposal: &ProposalId) -> Result<SubmitReceipt, GatewayError> {
        let response = self
            .apply_auth(self.client.post(self.submit_url(proposal)))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let response = self.handle_response_status(response).await?;
        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to parse response: {}", e)))?;

        let status = ProposalStatus::parse(&body.proposal_status).map_err(|_| {
            GatewayError::network(format!("Unknown proposal status: {}", body.proposal_status))
        })?;

        Ok(SubmitReceipt {
            proposal: *proposal,
            status,
            already_pending: body.already_pending,
        })
    }

    async fn save_draft(
        &self,
        proposal: &ProposalId,
        details: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let response = self
            .apply_auth(self.client.put(self.draft_url(proposal)))
            .json(details)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        self.handle_response_status(response).await?;
        Ok(())
    }
}

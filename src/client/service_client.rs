//! [`ServiceClient`]: [`Predictor`] implementation that connects to appraised over gRPC.
//!
//! All proto ↔ native type conversions are centralized in [`crate::server::convert`].

use async_trait::async_trait;
use serde::Serialize;
use tonic::transport::Channel;

use crate::server::convert::from_status;
use crate::server::proto;
use crate::server::proto::appraisal_client::AppraisalClient;
use crate::traits::ModelDescription;
use crate::{AppraiseError, EmployeeRecord, Prediction, Predictor, Result};

/// Server health as reported by the `Health` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    pub model: String,
}

/// A [`Predictor`] that forwards to a remote appraised server.
///
/// Validation and inference failures raised on the server come back as the
/// same [`AppraiseError`] variants an in-process predictor would return.
#[derive(Clone)]
pub struct ServiceClient {
    inner: AppraisalClient<Channel>,
}

impl ServiceClient {
    /// Connect to an appraised server at the given address.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = ServiceClient::connect("http://127.0.0.1:9750").await?;
    /// ```
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let inner = AppraisalClient::connect(addr.clone())
            .await
            .map_err(|e| AppraiseError::Transport(format!("failed to connect to {addr}: {e}")))?;
        Ok(Self { inner })
    }

    /// Query server health.
    pub async fn health(&self) -> Result<HealthReport> {
        let response = self
            .inner
            .clone()
            .health(proto::HealthRequest {})
            .await
            .map_err(from_status)?
            .into_inner();
        Ok(HealthReport {
            healthy: response.healthy,
            version: response.version,
            git_sha: response.git_sha,
            model: response.model,
        })
    }
}

#[async_trait]
impl Predictor for ServiceClient {
    async fn describe(&self) -> Result<ModelDescription> {
        let response = self
            .inner
            .clone()
            .schema(proto::SchemaRequest {})
            .await
            .map_err(from_status)?;
        response.into_inner().try_into()
    }

    async fn predict(&self, record: &EmployeeRecord) -> Result<Prediction> {
        let response = self
            .inner
            .clone()
            .predict(proto::PredictRequest::from(record))
            .await
            .map_err(from_status)?;
        response.into_inner().try_into()
    }
}

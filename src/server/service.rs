//! gRPC service implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, instrument};

use super::proto;
use super::proto::appraisal_server::Appraisal;
use crate::{EmployeeRecord, GIT_SHA, PKG_VERSION, Predictor};

/// gRPC service that wraps a [`Predictor`] implementation.
pub struct AppraiseService<P: Predictor> {
    predictor: Arc<P>,
}

impl<P: Predictor> AppraiseService<P> {
    /// Create a new service wrapping the given predictor.
    pub fn new(predictor: Arc<P>) -> Self {
        Self { predictor }
    }
}

#[tonic::async_trait]
impl<P: Predictor + 'static> Appraisal for AppraiseService<P> {
    async fn health(
        &self,
        _request: Request<proto::HealthRequest>,
    ) -> Result<Response<proto::HealthResponse>, Status> {
        let description = self.predictor.describe().await?;
        Ok(Response::new(proto::HealthResponse {
            healthy: true,
            version: PKG_VERSION.to_string(),
            git_sha: (GIT_SHA != "unknown").then(|| GIT_SHA.to_string()),
            model: description.model,
        }))
    }

    async fn schema(
        &self,
        _request: Request<proto::SchemaRequest>,
    ) -> Result<Response<proto::SchemaResponse>, Status> {
        let description = self.predictor.describe().await?;
        Ok(Response::new(description.into()))
    }

    #[instrument(skip_all)]
    async fn predict(
        &self,
        request: Request<proto::PredictRequest>,
    ) -> Result<Response<proto::PredictResponse>, Status> {
        let record = EmployeeRecord::from(request.into_inner());
        debug!(fields = record.len(), "predict request");
        let prediction = self.predictor.predict(&record).await?;
        Ok(Response::new(prediction.into()))
    }
}

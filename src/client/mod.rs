//! Client library for connecting to appraised.
//!
//! Provides [`ServiceClient`], which implements [`Predictor`](crate::Predictor)
//! by forwarding calls to a remote appraised instance over gRPC.

mod service_client;

pub use service_client::{HealthReport, ServiceClient};

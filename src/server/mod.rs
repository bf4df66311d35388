//! gRPC service mode and shared proto types.
//!
//! - Generated protobuf types (`proto`) used by both server and client
//! - Conversions between native and proto types (`convert`)
//! - The gRPC service implementation (`service`, server-only)
//! - Daemon configuration (`config`, server-only)

#[cfg(feature = "server")]
pub mod config;
pub mod convert;
#[cfg(feature = "server")]
pub mod service;

/// Re-exported generated proto types.
pub mod proto {
    tonic::include_proto!("appraise.v1");
}

#[cfg(feature = "server")]
pub use service::AppraiseService;

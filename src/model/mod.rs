//! Model loading, caching and the classifier capability.

pub mod artifact;
mod classifier;
pub mod manager;
pub mod pipeline;
pub mod source;

pub use artifact::{ModelArtifact, load_model};
pub use classifier::{Classifier, ModelHandle};
pub use manager::{LoadedModel, ModelLoader, ModelManager, ModelManagerConfig};
pub use pipeline::{Pipeline, PipelineFault};
pub use source::ModelSource;

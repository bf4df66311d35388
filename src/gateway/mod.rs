//! Predictor implementations

mod builder;
mod embedded;

pub use builder::{Appraise, AppraiseBuilder};
pub use embedded::EmbeddedPredictor;

pub mod catalog;
pub mod error;
pub mod job;
pub mod request;
pub mod scene;
pub mod sequencer;
mod model_types;

pub use model_types::{AspectRatio, Resolution, VideoModel};

use thiserror::Error;

/// Failures that must reach the caller.
///
/// An empty scene is not an error: it comes back as [`crate::Observation::NONE`].
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("inference runtime failure: {0}")]
    RuntimeFailure(String),

    #[error("detector scores are not sorted: score {current} at index {index} follows {previous}")]
    UnsortedScores {
        index: usize,
        previous: f32,
        current: f32,
    },

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        VisionError::MalformedInput(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        VisionError::RuntimeFailure(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        VisionError::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;

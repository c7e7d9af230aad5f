use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised by the capture -> decode -> pixelate -> display pipeline.
///
/// Every variant is fatal: the loop stops on the first one and hands it back
/// to `main`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("failed to run capture command `{program}`: {source}")]
    CaptureSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("capture command exited with {status}: {stderr}")]
    CaptureExit { status: ExitStatus, stderr: String },

    #[error("frame decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("display initialisation failed: {0}")]
    DisplayInit(String),

    #[error("display update failed: {0}")]
    Display(String),

    #[error("block size must be greater than zero")]
    InvalidBlockSize,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

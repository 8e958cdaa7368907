//! Error types for the avatar lip-sync pipeline.

/// Top-level error type for avatar creation and video synthesis.
#[derive(Debug, thiserror::Error)]
pub enum SayfaceError {
    /// No candidate face region was found in the input image.
    #[error("no face detected in image")]
    FaceNotDetected,

    /// The input image could not be decoded.
    #[error("invalid image data: {0}")]
    InvalidImageData(String),

    /// The input audio could not be decoded.
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// The output video stream could not be opened.
    #[error("encoder init error: {0}")]
    EncoderInit(String),

    /// Writing or finalizing the output video stream failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The request was cancelled before the artifact was finished.
    #[error("cancelled")]
    Cancelled,

    /// The external neural lip-sync tool failed.
    #[error("neural lip-sync error: {0}")]
    NeuralProvider(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Avatar persistence error.
    #[error("store error: {0}")]
    Store(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SayfaceError>;

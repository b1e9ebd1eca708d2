use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Model returned an unusable response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Chunk does not fit the model context window: {reason}")]
    ContextOverflow { reason: String },

    #[error("Transcript contains no segments")]
    EmptyTranscript,

    #[error("Chunk splitting produced no chunks")]
    NoChunks,

    #[error("Analysis task failed: {reason}")]
    TaskFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

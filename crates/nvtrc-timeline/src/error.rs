use nvtrc_format::NvtrcError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimelineError>;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Format(#[from] NvtrcError),

    #[error("tick rate must be non-zero")]
    InvalidTickRate,
}

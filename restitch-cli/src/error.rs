use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download error: {0}")]
    Download(#[from] restitch_engine::RestitchError),
}

pub type Result<T> = std::result::Result<T, AppError>;

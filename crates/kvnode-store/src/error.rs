use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("non-regular source file {0:?}")]
    NotRegularFile(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("command '{0}' is not implemented by this store")]
    Unsupported(String),

    #[error("wrong type for key")]
    WrongType,
}

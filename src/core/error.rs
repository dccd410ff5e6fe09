use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("file {} is not an index file", .0.display())]
    NotAnIndex(PathBuf),
    #[error("file {} does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no index file is open")]
    NoSessionOpen,
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for WAD container operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid WAD header: {0}")]
    InvalidHeader(String),

    #[error("Read beyond archive bounds: offset={offset}, size={size}, archive={archive_len}")]
    OutOfRange {
        offset: u32,
        size: u32,
        archive_len: usize,
    },
}

pub type Result<T> = std::result::Result<T, WadError>;

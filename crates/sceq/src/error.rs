//! Run-fatal harness errors.
//!
//! Everything case-local (compile failures, capacity rejections, mismatches)
//! is reported through `CaseStatus` instead and never aborts the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::toolchain::{ParseError, ToolchainLoadError};

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    ToolchainLoad(#[from] ToolchainLoadError),
}

pub type Result<T> = std::result::Result<T, Error>;

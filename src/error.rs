//! Error handling for cardflow
//!
//! This module defines the crate-level error type and a Result alias. Errors
//! raised while a pipeline is running live in [`crate::pipeline::PipelineError`]
//! and convert into [`CardflowError`] via `?`.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for cardflow operations
#[derive(Error, Debug)]
pub enum CardflowError {
    /// Errors raised by a running pipeline or one of its stages
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CardflowError>,
    },
}

impl CardflowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CardflowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the root cause is a cancelled pipeline.
    pub fn is_cancelled(&self) -> bool {
        match self {
            CardflowError::Pipeline(e) => e.is_cancelled(),
            CardflowError::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type alias for cardflow operations
pub type Result<T> = std::result::Result<T, CardflowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, PipelineError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CardflowError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| CardflowError::from(e).with_context(f()))
    }
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CardflowError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| CardflowError::from(e).with_context(f()))
    }
}

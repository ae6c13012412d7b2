//! Unified error types for bom-recon.
//!
//! Every write path in the engine either applies fully or returns one of
//! these errors with enough detail for the caller to retry or correct input.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bom-recon operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BomReconError {
    /// Non-positive or non-integer quantity
    #[error("Invalid quantity {value} for {context}")]
    InvalidQuantity { context: String, value: String },

    /// Activating or referencing a version that has no line items
    #[error("Version '{version_tag}' has no line items for BOM {bom_code}")]
    InvalidVersion {
        bom_code: String,
        version_tag: String,
    },

    /// Operating on a BOM code with no catalog entries
    #[error("Unknown BOM code: {0}")]
    UnknownBomCode(String),

    /// Some sub-operations of a batch failed; nothing was applied
    #[error("{failed} of {total} batch operations failed: {}", .failed_keys.join(", "))]
    PartialBatchFailure {
        failed: usize,
        total: usize,
        failed_keys: Vec<String>,
    },

    /// An unresolved batch of action items already exists for this BOM code
    #[error("BOM {bom_code} already has batch #{batch} with {unresolved} unresolved action items")]
    AlreadyFinalized {
        bom_code: String,
        batch: u32,
        unresolved: usize,
    },

    /// Status change not permitted by the action item workflow
    #[error("Action item {id} cannot move from {from} to {to}")]
    InvalidTransition { id: u64, from: String, to: String },

    /// Action item id not present in the ledger
    #[error("Unknown action item: {0}")]
    UnknownActionItem(u64),

    /// Stored state contradicts an engine invariant
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Errors while decoding wire data
    #[error("Failed to parse input: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid field value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for bom-recon operations
pub type Result<T> = std::result::Result<T, BomReconError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl BomReconError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for missing field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::parse(
            "missing required field",
            ParseErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create an invalid quantity error
    pub fn invalid_quantity(context: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidQuantity {
            context: context.into(),
            value: value.to_string(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(bom_code: impl Into<String>, version_tag: impl Into<String>) -> Self {
        Self::InvalidVersion {
            bom_code: bom_code.into(),
            version_tag: version_tag.into(),
        }
    }

    /// Create an unknown BOM code error
    pub fn unknown_bom(bom_code: impl Into<String>) -> Self {
        Self::UnknownBomCode(bom_code.into())
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the caller can recover by retrying or correcting input.
    ///
    /// Invariant violations mean stored state is corrupt and must not be
    /// coerced into a valid-looking answer.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_) | Self::Io { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for BomReconError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BomReconError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are chained, so an error raised deep in the catalog reads
/// as `"applying batch: updating line item 7: qty must be positive"`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BomReconError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
///
/// Variants whose fields are structured identifiers (BOM codes, ids) are
/// returned unchanged.
fn add_context_to_error(err: BomReconError, new_ctx: &str) -> BomReconError {
    match err {
        BomReconError::InvalidQuantity { context, value } => BomReconError::InvalidQuantity {
            context: chain_context(new_ctx, &context),
            value,
        },
        BomReconError::Parse {
            context: existing,
            source,
        } => BomReconError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomReconError::Io {
            path,
            message,
            source,
        } => BomReconError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        BomReconError::InvariantViolation(msg) => {
            BomReconError::InvariantViolation(chain_context(new_ctx, &msg))
        }
        BomReconError::Config(msg) => BomReconError::Config(chain_context(new_ctx, &msg)),
        BomReconError::Validation(msg) => BomReconError::Validation(chain_context(new_ctx, &msg)),
        other => other,
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BomReconError::invalid_version("BC-01", "v9");
        let display = err.to_string();
        assert!(display.contains("v9"), "should name the version: {display}");
        assert!(display.contains("BC-01"), "should name the BOM: {display}");

        let err = BomReconError::PartialBatchFailure {
            failed: 2,
            total: 5,
            failed_keys: vec!["update:7".to_string(), "delete:9".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 of 5 batch operations failed: update:7, delete:9"
        );
    }

    #[test]
    fn test_io_error_carries_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BomReconError::io("/path/to/state.json", io_err);

        assert!(err.to_string().contains("/path/to/state.json"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverability() {
        assert!(BomReconError::unknown_bom("X").is_recoverable());
        assert!(BomReconError::invalid_quantity("qty", -1).is_recoverable());
        assert!(!BomReconError::invariant("active version has no items").is_recoverable());
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(BomReconError::invalid_quantity("line item 3", 0))
        }

        fn middle() -> Result<()> {
            inner().context("validating batch")
        }

        fn outer() -> Result<()> {
            middle().context("editing BC-01")
        }

        match outer() {
            Err(BomReconError::InvalidQuantity { context, value }) => {
                assert_eq!(context, "editing BC-01: validating batch: line item 3");
                assert_eq!(value, "0");
            }
            other => panic!("Expected InvalidQuantity, got {other:?}"),
        }
    }

    #[test]
    fn test_context_leaves_structured_variants_alone() {
        let err: Result<()> = Err(BomReconError::unknown_bom("BC-77"));
        match err.context("loading") {
            Err(BomReconError::UnknownBomCode(code)) => assert_eq!(code, "BC-77"),
            other => panic!("Expected UnknownBomCode, got {other:?}"),
        }
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;

        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called, "Closure should not be called for Ok result");

        let err_result: Result<i32> = Err(BomReconError::validation("error"));
        let _ = err_result.with_context(|| {
            called = true;
            "should be called"
        });
        assert!(called, "Closure should be called for Err result");
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("new", "existing"), "new: existing");
        assert_eq!(
            chain_context("outer", "middle: inner"),
            "outer: middle: inner"
        );
    }
}

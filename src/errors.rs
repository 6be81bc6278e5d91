//! Error Types
//!
//! This module defines the error types used throughout the render core.
//!
//! # Overview
//!
//! The main error type [`RenderError`] covers the two failure classes the
//! pass scheduler distinguishes:
//!
//! - **Fatal initialization errors**: a required shader or GPU resource
//!   could not be created during module construction. Rendering cannot
//!   proceed; the error names the pass and the resource path.
//! - **Contract violations**: a pass read a volume name that is absent from
//!   the collection, or the pass tree is mis-assembled (consumer ordered
//!   before its producer, provider yielding an out-of-range iteration).
//!   These indicate a broken configuration, not a recoverable runtime
//!   condition.
//!
//! Expected absences (a disabled feature, a scene with zero lights of some
//! type) are **not** errors; they are silent skips and never surface here.
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RenderError>`.

use thiserror::Error;

/// The main error type for the render-pass orchestration core.
#[derive(Error, Debug)]
pub enum RenderError {
    // ========================================================================
    // Fatal Initialization Errors
    // ========================================================================
    /// A pass failed to load a required shader during `init`.
    #[error("pass '{pass}' failed to load shader '{path}': {reason}")]
    ShaderLoadFailed {
        /// Name of the pass whose initialization failed.
        pass: String,
        /// Resource path handed to the GPU layer.
        path: String,
        /// Backend-reported reason.
        reason: String,
    },

    /// A pass was executed before its `init` ran (broken assembly).
    #[error("pass '{pass}' was executed before it was initialized")]
    NotInitialized {
        /// Name of the offending pass.
        pass: String,
    },

    // ========================================================================
    // Contract Violations
    // ========================================================================
    /// A pass required a volume that is not present in the collection.
    ///
    /// The listing of present keys turns a silent-corruption failure into a
    /// loud one: the diff between required and present names usually points
    /// straight at the mis-ordered or disabled producer.
    #[error("required volume '{name}' is not in the collection (present: {present:?})")]
    MissingVolume {
        /// The requested volume name.
        name: String,
        /// Sorted listing of the names currently present.
        present: Vec<String>,
    },

    /// A volume was present under the requested name but had a different
    /// concrete type than the pass expected.
    #[error("volume '{name}' is not a {expected}")]
    VolumeTypeMismatch {
        /// The requested volume name.
        name: String,
        /// The expected concrete type.
        expected: &'static str,
    },

    /// An iteration provider was asked for an element past the sequence it
    /// reported for this frame.
    #[error("provider '{provider}' has no iteration {index} (count {count})")]
    InvalidIteration {
        /// Provider description.
        provider: &'static str,
        /// Requested iteration index.
        index: usize,
        /// Iteration count the provider reported for this scene.
        count: usize,
    },

    // ========================================================================
    // Wrapping
    // ========================================================================
    /// A child pass failed; carries the pass name for diagnostics.
    #[error("render pass '{pass}' failed: {source}")]
    PassFailed {
        /// Name of the failing pass.
        pass: String,
        /// The underlying error.
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Wraps an error with the name of the pass it surfaced in.
    ///
    /// Already-wrapped errors are returned unchanged so that deeply nested
    /// containers report the leaf pass, not every ancestor.
    #[must_use]
    pub fn in_pass(self, pass: &str) -> Self {
        match self {
            Self::PassFailed { .. } => self,
            other => Self::PassFailed {
                pass: pass.to_owned(),
                source: Box::new(other),
            },
        }
    }
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;

//! Error types for grammar construction, interpretation and rasterization.

use thiserror::Error;

/// Errors raised while building a [`Grammar`](crate::Grammar).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("symbol {found:?} in {context} is not a single-byte ASCII symbol")]
    NonAsciiSymbol { context: &'static str, found: char },
}

/// Faults raised by the turtle interpreter. Scoped to the shape being interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpretError {
    #[error("branch stack underflow: pop at symbol {position} with no saved state")]
    StackUnderflow { position: usize },

    #[error("branch stack overflow: push at symbol {position} exceeds depth limit {limit}")]
    StackOverflow { position: usize, limit: usize },
}

/// Errors raised by frame buffer allocation and access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("invalid canvas dimensions {width}x{height}: both must be non-zero")]
    InvalidDimensions { width: usize, height: usize },

    #[error("no output image allocated; call alloc_output_image first")]
    Unallocated,
}

/// Umbrella error for the [`Renderer`](crate::Renderer) boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

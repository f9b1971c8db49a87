//! # treeline
//!
//! Procedural L-System forests rasterized in parallel.
//!
//! A compact [`Grammar`] is expanded into a long symbol sequence, a turtle walks
//! that sequence to produce [`LineSegment`]s with branch save/restore, and the
//! segments are rasterized into a [`FrameBuffer`]. The [`RenderScheduler`] fans
//! thousands of independent [`ShapeInstance`]s out across a fixed set of workers
//! that all write into the same buffer.

pub mod canvas;
pub mod error;
pub mod expand;
pub mod grammar;
pub mod interpreter;
pub mod renderer;
pub mod scheduler;
pub mod shape;
pub mod turtle;

pub use canvas::*;
pub use error::*;
pub use expand::*;
pub use grammar::*;
pub use interpreter::*;
pub use renderer::*;
pub use scheduler::*;
pub use shape::*;
pub use turtle::*;

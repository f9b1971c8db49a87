//! Fan-out of shape renders across a fixed worker pool.
//!
//! Shapes are split into contiguous groups by index, one group per worker, and
//! every worker draws into the same [`SharedFrameBuffer`]. There is no ordering
//! between workers and no pixel locking: shapes are expected to occupy disjoint
//! screen regions, and where they overlap the last store wins.

use crate::canvas::{DrawMode, FrameBuffer, SharedFrameBuffer};
use crate::error::InterpretError;
use crate::expand::ExpansionCache;
use crate::interpreter::TurtleInterpreter;
use crate::shape::ShapeInstance;
use crate::turtle::LineSegment;
use log::{debug, trace, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;

/// A shape whose interpretation faulted. Nothing of it was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeFailure {
    /// Index of the shape in the slice passed to the render call.
    pub index: usize,
    pub grammar: String,
    pub error: InterpretError,
}

/// Outcome of one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderReport {
    pub shapes_rendered: usize,
    pub segments_drawn: usize,
    pub failures: Vec<ShapeFailure>,
}

impl RenderReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: RenderReport) {
        self.shapes_rendered += other.shapes_rendered;
        self.segments_drawn += other.segments_drawn;
        self.failures.extend(other.failures);
    }
}

/// Renders shape collections with a fixed number of workers.
#[derive(Clone, Debug)]
pub struct RenderScheduler {
    thread_count: usize,
    interpreter: TurtleInterpreter,
    jitter_seed: u64,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(1, TurtleInterpreter::default())
    }
}

impl RenderScheduler {
    /// `thread_count == 0` is treated as a single worker.
    pub fn new(thread_count: usize, interpreter: TurtleInterpreter) -> Self {
        Self {
            thread_count: thread_count.max(1),
            interpreter,
            jitter_seed: 0,
        }
    }

    /// Base seed for turn jitter. Shape `i` draws from `StdRng::seed_from_u64(seed ^ i)`,
    /// so the output does not depend on how shapes are split across workers.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = seed;
        self
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn set_thread_count(&mut self, thread_count: usize) {
        self.thread_count = thread_count.max(1);
    }

    pub fn interpreter(&self) -> &TurtleInterpreter {
        &self.interpreter
    }

    /// Expands every shape ahead of rendering through a shared cache.
    ///
    /// Pre-expanded shapes never race on their own cache during [`render`](Self::render).
    pub fn prepare(&self, shapes: &[ShapeInstance], cache: &ExpansionCache) {
        let started = Instant::now();
        for shape in shapes {
            shape.expansion_with(cache);
        }
        debug!(
            "prepared {} shapes ({} distinct expansions) in {:.3} ms",
            shapes.len(),
            cache.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    /// Renders `shapes` into `canvas` in overwrite mode and blocks until every
    /// worker has finished.
    ///
    /// A shape that faults is recorded in the report and skipped; the rest of
    /// the pass is unaffected.
    pub fn render(&self, shapes: &[ShapeInstance], canvas: &mut FrameBuffer) -> RenderReport {
        let started = Instant::now();
        let target = canvas.shared();
        let workers = self.thread_count.min(shapes.len()).max(1);

        let report = if workers == 1 {
            self.render_group(shapes, 0, target)
        } else {
            let group_len = shapes.len().div_ceil(workers);
            std::thread::scope(|s| {
                let handles: Vec<_> = shapes
                    .chunks(group_len)
                    .enumerate()
                    .map(|(worker, group)| {
                        s.spawn(move || self.render_group(group, worker * group_len, target))
                    })
                    .collect();

                let mut report = RenderReport::default();
                for handle in handles {
                    match handle.join() {
                        Ok(part) => report.merge(part),
                        Err(payload) => std::panic::resume_unwind(payload),
                    }
                }
                report
            })
        };

        debug!(
            "rendered {} shapes ({} segments, {} failed) on {} workers in {:.3} ms",
            report.shapes_rendered,
            report.segments_drawn,
            report.failures.len(),
            workers,
            started.elapsed().as_secs_f64() * 1000.0
        );
        report
    }

    /// Renders `shapes` one after another in submission order.
    ///
    /// This is the only path that may blend, since blending depends on the order
    /// in which overlapping segments arrive.
    pub fn render_ordered(
        &self,
        shapes: &[ShapeInstance],
        canvas: &mut FrameBuffer,
        mode: DrawMode,
    ) -> RenderReport {
        let mut report = RenderReport::default();
        let mut segments = Vec::new();

        for (index, shape) in shapes.iter().enumerate() {
            match self.trace_shape(shape, index, &mut segments) {
                Ok(()) => {
                    for segment in &segments {
                        canvas.draw_segment(segment, mode);
                    }
                    report.shapes_rendered += 1;
                    report.segments_drawn += segments.len();
                }
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }

    fn render_group(
        &self,
        group: &[ShapeInstance],
        first_index: usize,
        target: SharedFrameBuffer<'_>,
    ) -> RenderReport {
        let mut report = RenderReport::default();
        let mut segments = Vec::new();

        for (offset, shape) in group.iter().enumerate() {
            let index = first_index + offset;
            match self.trace_shape(shape, index, &mut segments) {
                Ok(()) => {
                    for segment in &segments {
                        target.draw_segment(segment);
                    }
                    report.shapes_rendered += 1;
                    report.segments_drawn += segments.len();
                }
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }

    /// Interprets one shape into `segments`, replacing its previous contents.
    fn trace_shape(
        &self,
        shape: &ShapeInstance,
        index: usize,
        segments: &mut Vec<LineSegment>,
    ) -> Result<(), ShapeFailure> {
        segments.clear();
        let symbols = shape.expansion();
        let params = shape.turtle_params();
        let mut rng = self
            .interpreter
            .config()
            .jitter
            .then(|| StdRng::seed_from_u64(self.jitter_seed ^ index as u64));

        match self
            .interpreter
            .walk(symbols, &params, rng.as_mut(), |segment| segments.push(segment))
        {
            Ok(_) => {
                trace!("shape {index}: {} segments", segments.len());
                Ok(())
            }
            Err(error) => {
                warn!("shape {index} ({}) skipped: {error}", shape.grammar().name());
                segments.clear();
                Err(ShapeFailure {
                    index,
                    grammar: shape.grammar().name().to_owned(),
                    error,
                })
            }
        }
    }
}

//! The surface consumed by a display loop: set up, allocate, load, clear, render, read back.

use crate::canvas::{DrawMode, FrameBuffer};
use crate::error::{CanvasError, Result};
use crate::expand::{ExpansionCache, GrammarExpander};
use crate::interpreter::{InterpreterConfig, TurtleInterpreter};
use crate::scheduler::{RenderReport, RenderScheduler};
use crate::shape::ShapeInstance;
use glam::Vec4;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for a [`Renderer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker count for render passes and large expansion generations.
    pub thread_count: usize,
    /// Color written by [`Renderer::clear_image`].
    pub background: Vec4,
    /// Base seed for turn jitter (see [`RenderScheduler::with_jitter_seed`]).
    pub jitter_seed: u64,
    pub interpreter: InterpreterConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            thread_count: 8,
            background: Vec4::ONE,
            jitter_seed: 0,
            interpreter: InterpreterConfig::default(),
        }
    }
}

/// Read-only view of the output image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageView<'a> {
    pub width: usize,
    pub height: usize,
    /// RGBA samples, row-major, `width * height * 4` floats.
    pub data: &'a [f32],
}

/// Owns the shape collection, the output image and the worker configuration.
#[derive(Debug)]
pub struct Renderer {
    config: RenderConfig,
    scheduler: RenderScheduler,
    cache: ExpansionCache,
    image: Option<FrameBuffer>,
    shapes: Vec<ShapeInstance>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let scheduler = scheduler_for(&config);
        let cache = ExpansionCache::new(GrammarExpander::new(scheduler.thread_count()));
        Self {
            config,
            scheduler,
            cache,
            image: None,
            shapes: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn shapes(&self) -> &[ShapeInstance] {
        &self.shapes
    }

    /// Expansions shared by the shapes bound through [`load_shapes`](Self::load_shapes).
    pub fn expansion_cache(&self) -> &ExpansionCache {
        &self.cache
    }

    /// Sets the worker pool size used by subsequent passes and expansions.
    pub fn setup(&mut self, thread_count: usize) {
        self.config.thread_count = thread_count;
        self.scheduler.set_thread_count(thread_count);
        let threads = self.scheduler.thread_count();
        if self.cache.expander().threads() != threads {
            self.cache = ExpansionCache::new(GrammarExpander::new(threads));
        }
        info!("renderer using {threads} workers");
    }

    /// Replaces the output image. Dimensions must be non-zero.
    pub fn alloc_output_image(&mut self, width: usize, height: usize) -> Result<()> {
        self.image = Some(FrameBuffer::new(width, height)?);
        info!("allocated {width}x{height} output image");
        Ok(())
    }

    /// Binds `shapes` to the renderer and expands each one ahead of rendering.
    ///
    /// Shapes built from the same grammar at the same depth share one expansion.
    /// The cache only holds entries for the current shape set; shapes bound
    /// earlier keep their own copy.
    pub fn load_shapes(&mut self, shapes: Vec<ShapeInstance>) {
        let started = Instant::now();
        self.cache.clear();
        self.scheduler.prepare(&shapes, &self.cache);
        info!(
            "loaded {} shapes in {:.3} ms",
            shapes.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        self.shapes = shapes;
    }

    pub fn clear_image(&mut self) -> Result<()> {
        let background = self.config.background;
        self.image_mut()?.clear(background);
        Ok(())
    }

    /// Reserved for per-frame mutation. Shape geometry is left untouched.
    pub fn advance_animation(&mut self) {}

    /// Runs one concurrent pass over every loaded shape.
    pub fn render(&mut self) -> Result<RenderReport> {
        let image = self.image.as_mut().ok_or(CanvasError::Unallocated)?;
        Ok(self.scheduler.render(&self.shapes, image))
    }

    /// Runs one single-threaded pass in submission order. The only way to blend.
    pub fn render_ordered(&mut self, mode: DrawMode) -> Result<RenderReport> {
        let image = self.image.as_mut().ok_or(CanvasError::Unallocated)?;
        Ok(self.scheduler.render_ordered(&self.shapes, image, mode))
    }

    pub fn image(&self) -> Result<ImageView<'_>> {
        let image = self.image.as_ref().ok_or(CanvasError::Unallocated)?;
        Ok(ImageView {
            width: image.width(),
            height: image.height(),
            data: image.samples(),
        })
    }

    /// The frame buffer itself, for pixel-level inspection.
    pub fn frame_buffer(&self) -> Option<&FrameBuffer> {
        self.image.as_ref()
    }

    fn image_mut(&mut self) -> Result<&mut FrameBuffer> {
        self.image
            .as_mut()
            .ok_or_else(|| CanvasError::Unallocated.into())
    }
}

fn scheduler_for(config: &RenderConfig) -> RenderScheduler {
    RenderScheduler::new(
        config.thread_count,
        TurtleInterpreter::standard(config.interpreter.clone()),
    )
    .with_jitter_seed(config.jitter_seed)
}

//! Frame buffer and line rasterizer.
//!
//! Samples are RGBA `f32`, row-major, four floats per pixel. Segment endpoints
//! are normalized: `(0, 0)` is the first sample and `(1, 1)` the last.

use crate::error::CanvasError;
use crate::turtle::LineSegment;
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Pixel-write discipline for [`FrameBuffer::draw_segment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DrawMode {
    /// Store the stroke color with full opacity; prior contents are irrelevant.
    #[default]
    Overwrite,
    /// `pixel = alpha * color + (1 - alpha) * pixel`.
    ///
    /// Depends on submission order, so only sequential callers may use it.
    Blend { alpha: f32 },
}

/// Width × height grid of RGBA samples.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl FrameBuffer {
    /// Allocates a buffer. Contents are unspecified until [`clear`](Self::clear).
    ///
    /// Fails when either side is zero or the sample count overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        let len = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(4))
            .filter(|&len| len > 0)
            .ok_or(CanvasError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            data: vec![0.0; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Contiguous RGBA samples, row-major.
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    pub fn clear(&mut self, color: Vec4) {
        for sample in self.data.chunks_exact_mut(4) {
            sample.copy_from_slice(&color.to_array());
        }
    }

    /// Sample at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Vec4> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = 4 * (y * self.width + x);
        Some(Vec4::from_slice(&self.data[at..at + 4]))
    }

    /// Maps a normalized point to the nearest in-bounds pixel.
    pub fn to_pixel(&self, point: Vec2) -> (usize, usize) {
        (
            to_axis(point.x, self.width),
            to_axis(point.y, self.height),
        )
    }

    /// Rasterizes `segment` with its own stroke color.
    pub fn draw_segment(&mut self, segment: &LineSegment, mode: DrawMode) {
        let from = self.to_pixel(segment.start);
        let to = self.to_pixel(segment.end);
        for (x, y) in LinePixels::new(from, to) {
            let at = 4 * (y * self.width + x);
            let sample = &mut self.data[at..at + 4];
            match mode {
                DrawMode::Overwrite => {
                    sample.copy_from_slice(&segment.color.extend(1.0).to_array());
                }
                DrawMode::Blend { alpha } => {
                    let prior = Vec4::from_slice(sample);
                    let rgb = segment.color * alpha + prior.truncate() * (1.0 - alpha);
                    let a = alpha + prior.w * (1.0 - alpha);
                    sample.copy_from_slice(&rgb.extend(a).to_array());
                }
            }
        }
    }

    /// Shared overwrite-only writer for concurrent rendering.
    pub fn shared(&mut self) -> SharedFrameBuffer<'_> {
        let data: &mut [f32] = &mut self.data;
        // SAFETY: `AtomicU32` has the size and alignment of `f32`, and the exclusive
        // borrow keeps every non-atomic access out for the writer's lifetime.
        let cells = unsafe { &*(data as *mut [f32] as *const [AtomicU32]) };
        SharedFrameBuffer {
            width: self.width,
            height: self.height,
            cells,
        }
    }
}

/// Writer handed to render workers.
///
/// Every channel is written with a relaxed atomic store and never read back, so
/// concurrent writers cannot corrupt memory. Channels are stored one at a time:
/// where two writers touch the same pixel, each channel holds whichever store
/// landed last, and the pixel may mix channels from both colors.
#[derive(Clone, Copy, Debug)]
pub struct SharedFrameBuffer<'a> {
    width: usize,
    height: usize,
    cells: &'a [AtomicU32],
}

impl SharedFrameBuffer<'_> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn to_pixel(&self, point: Vec2) -> (usize, usize) {
        (
            to_axis(point.x, self.width),
            to_axis(point.y, self.height),
        )
    }

    /// Rasterizes `segment` in overwrite mode.
    pub fn draw_segment(&self, segment: &LineSegment) {
        let from = self.to_pixel(segment.start);
        let to = self.to_pixel(segment.end);
        for (x, y) in LinePixels::new(from, to) {
            self.store(x, y, segment.color);
        }
    }

    fn store(&self, x: usize, y: usize, color: Vec3) {
        let at = 4 * (y * self.width + x);
        for (cell, value) in self.cells[at..at + 4]
            .iter()
            .zip(color.extend(1.0).to_array())
        {
            cell.store(value.to_bits(), Ordering::Relaxed);
        }
    }
}

fn to_axis(value: f32, size: usize) -> usize {
    let max = (size - 1) as f32;
    // NaN falls through clamp and saturates to 0 on the cast.
    (value * max).round().clamp(0.0, max) as usize
}

/// Pixels on the 8-connected Bresenham path between two points, both inclusive.
///
/// Every pixel is yielded exactly once, starting at `from`.
#[derive(Clone, Debug)]
pub struct LinePixels {
    x: i64,
    y: i64,
    end_x: i64,
    end_y: i64,
    dx: i64,
    dy: i64,
    step_x: i64,
    step_y: i64,
    error: i64,
    done: bool,
}

impl LinePixels {
    pub fn new(from: (usize, usize), to: (usize, usize)) -> Self {
        let (x, y) = (from.0 as i64, from.1 as i64);
        let (end_x, end_y) = (to.0 as i64, to.1 as i64);
        let dx = (end_x - x).abs();
        let dy = -(end_y - y).abs();
        Self {
            x,
            y,
            end_x,
            end_y,
            dx,
            dy,
            step_x: if x < end_x { 1 } else { -1 },
            step_y: if y < end_y { 1 } else { -1 },
            error: dx + dy,
            done: false,
        }
    }
}

impl Iterator for LinePixels {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = (self.x as usize, self.y as usize);
        if self.x == self.end_x && self.y == self.end_y {
            self.done = true;
            return Some(current);
        }

        let e2 = 2 * self.error;
        if e2 >= self.dy {
            self.error += self.dy;
            self.x += self.step_x;
        }
        if e2 <= self.dx {
            self.error += self.dx;
            self.y += self.step_y;
        }
        Some(current)
    }
}

//! Grammar instances placed in the scene.

use crate::expand::{ExpansionCache, expand};
use crate::grammar::{Grammar, Symbol};
use crate::turtle::{TurtleParams, TurtleState};
use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, OnceLock};

/// A [`Grammar`] bound to a pose, stroke and expansion depth.
///
/// The expanded sequence is cached on first use. The cache is write-once: when
/// several threads race to fill it, one value is published and the others are
/// dropped. Changing the depth or grammar resets it.
#[derive(Clone, Debug)]
pub struct ShapeInstance {
    grammar: Arc<Grammar>,
    /// Turtle start in normalized space.
    pub origin: Vec2,
    /// Initial heading in radians.
    pub heading: f32,
    pub step: f32,
    pub color: Vec3,
    depth: u32,
    expansion: OnceLock<Arc<[Symbol]>>,
}

impl ShapeInstance {
    pub fn new(
        grammar: Arc<Grammar>,
        origin: Vec2,
        heading: f32,
        step: f32,
        color: Vec3,
        depth: u32,
    ) -> Self {
        Self {
            grammar,
            origin,
            heading,
            step,
            color,
            depth,
            expansion: OnceLock::new(),
        }
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) {
        if depth != self.depth {
            self.depth = depth;
            self.expansion = OnceLock::new();
        }
    }

    pub fn set_grammar(&mut self, grammar: Arc<Grammar>) {
        if grammar.productions() != self.grammar.productions() {
            self.expansion = OnceLock::new();
        }
        self.grammar = grammar;
    }

    pub fn is_expanded(&self) -> bool {
        self.expansion.get().is_some()
    }

    /// Expanded symbol sequence, computed on first call.
    pub fn expansion(&self) -> &Arc<[Symbol]> {
        self.expansion
            .get_or_init(|| expand(&self.grammar, self.depth).into())
    }

    /// Like [`expansion`](Self::expansion), but fills a cold cache from `cache` so
    /// shapes sharing a grammar share one sequence.
    pub fn expansion_with(&self, cache: &ExpansionCache) -> &Arc<[Symbol]> {
        self.expansion
            .get_or_init(|| cache.get_or_expand(&self.grammar, self.depth))
    }

    /// Interpretation inputs for this shape.
    pub fn turtle_params(&self) -> TurtleParams {
        TurtleParams {
            start: TurtleState::new(self.origin, self.heading),
            step: self.step,
            turn_angle: self.grammar.turn_angle(),
            color: self.color,
        }
    }

    /// Places `count` instances of `grammar` at random origins in `[0, 1]²`.
    ///
    /// Each shape points up (`π/2`), uses a step of `params.length / 2^depth` so
    /// deeper trees keep their overall size, and takes a warm color with random
    /// green and blue channels. `rng` is the only randomness source.
    pub fn scatter<R: Rng + ?Sized>(
        grammar: &Arc<Grammar>,
        count: usize,
        params: ScatterParams,
        rng: &mut R,
    ) -> Vec<Self> {
        let step = params.length / 2f32.powi(params.depth as i32);
        (0..count)
            .map(|_| {
                let origin = Vec2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
                let color = Vec3::new(
                    1.0,
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0) * 0.5,
                );
                Self::new(Arc::clone(grammar), origin, FRAC_PI_2, step, color, params.depth)
            })
            .collect()
    }
}

/// Inputs to [`ShapeInstance::scatter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterParams {
    pub depth: u32,
    /// Overall extent of a shape, divided by `2^depth` to get the step.
    pub length: f32,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            depth: 5,
            length: 0.01,
        }
    }
}

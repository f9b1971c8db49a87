//! Interpreter that converts an expanded symbol sequence into line segments.
//!
//! The entry point is [`TurtleInterpreter`]. Configure it with an
//! [`InterpreterConfig`], register symbol-to-operation mappings via
//! [`TurtleInterpreter::set_op`] or [`TurtleInterpreter::populate_standard_symbols`],
//! then call [`TurtleInterpreter::interpret`] (collecting) or
//! [`TurtleInterpreter::walk`] (streaming).

use crate::error::InterpretError;
use crate::grammar::Symbol;
use crate::turtle::{LineSegment, TurtleOp, TurtleParams, TurtleState};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Configuration for turtle interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Maximum branch stack depth; deeper pushes fail the shape.
    pub max_stack_depth: usize,
    /// Multiply every turn by a factor drawn from `[0, 1)`.
    ///
    /// Only applied when the caller hands a seeded generator to the interpreter.
    pub jitter: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 4096,
            jitter: false,
        }
    }
}

/// Result of a collecting interpretation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurtlePath {
    /// Segments in the traversal order of the input sequence.
    pub segments: Vec<LineSegment>,
    pub final_state: TurtleState,
}

/// Interprets expanded grammar output as turtle commands.
#[derive(Clone, Debug)]
pub struct TurtleInterpreter {
    op_map: Vec<TurtleOp>,
    config: InterpreterConfig,
}

impl Default for TurtleInterpreter {
    fn default() -> Self {
        Self::standard(InterpreterConfig::default())
    }
}

impl TurtleInterpreter {
    /// Creates an interpreter with an empty symbol map. Every symbol is ignored
    /// until mapped with [`set_op`](Self::set_op).
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            op_map: Vec::new(),
            config,
        }
    }

    /// Creates an interpreter with the standard alphabet already registered.
    pub fn standard(config: InterpreterConfig) -> Self {
        let mut interpreter = Self::new(config);
        interpreter.populate_standard_symbols();
        interpreter
    }

    /// Replaces the entire symbol-to-operation map (builder pattern).
    ///
    /// `map` is indexed by symbol byte. Symbols outside the map are [`TurtleOp::Ignore`].
    pub fn with_map(mut self, map: Vec<TurtleOp>) -> Self {
        self.op_map = map;
        self
    }

    /// Assigns a single [`TurtleOp`] to a symbol, growing the map as needed.
    pub fn set_op(&mut self, symbol: Symbol, op: TurtleOp) {
        let idx = symbol as usize;
        if idx >= self.op_map.len() {
            self.op_map.resize(idx + 1, TurtleOp::Ignore);
        }
        self.op_map[idx] = op;
    }

    /// Registers the conventional turtle alphabet.
    pub fn populate_standard_symbols(&mut self) {
        let mappings = [
            (b'F', TurtleOp::Draw),
            (b'G', TurtleOp::Draw),
            (b'f', TurtleOp::Move),
            (b'+', TurtleOp::Turn(1.0)),
            (b'-', TurtleOp::Turn(-1.0)),
            (b'|', TurtleOp::TurnAround),
            (b'[', TurtleOp::Push),
            (b']', TurtleOp::Pop),
        ];

        for (symbol, op) in mappings {
            self.set_op(symbol, op);
        }
    }

    pub fn op(&self, symbol: Symbol) -> TurtleOp {
        self.op_map
            .get(symbol as usize)
            .copied()
            .unwrap_or(TurtleOp::Ignore)
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Number of segments `symbols` will emit, for pre-sizing buffers.
    pub fn count_segments(&self, symbols: &[Symbol]) -> usize {
        symbols
            .iter()
            .filter(|&&s| self.op(s) == TurtleOp::Draw)
            .count()
    }

    /// Interprets `symbols` and collects every emitted segment.
    pub fn interpret(
        &self,
        symbols: &[Symbol],
        params: &TurtleParams,
        rng: Option<&mut StdRng>,
    ) -> Result<TurtlePath, InterpretError> {
        let mut segments = Vec::with_capacity(self.count_segments(symbols));
        let final_state = self.walk(symbols, params, rng, |segment| segments.push(segment))?;
        Ok(TurtlePath {
            segments,
            final_state,
        })
    }

    /// Interprets `symbols`, handing each segment to `emit` in traversal order.
    ///
    /// `rng` supplies turn jitter when [`InterpreterConfig::jitter`] is set; without a
    /// generator turns are exact. On error, segments emitted before the faulting
    /// symbol have already been passed to `emit`.
    pub fn walk(
        &self,
        symbols: &[Symbol],
        params: &TurtleParams,
        mut rng: Option<&mut StdRng>,
        mut emit: impl FnMut(LineSegment),
    ) -> Result<TurtleState, InterpretError> {
        let mut turtle = params.start;
        let mut stack: Vec<TurtleState> = Vec::new();

        for (position, &symbol) in symbols.iter().enumerate() {
            match self.op(symbol) {
                TurtleOp::Draw => {
                    let next = turtle.advanced(params.step);
                    emit(LineSegment::new(turtle.position, next, params.color));
                    turtle.position = next;
                }
                TurtleOp::Move => turtle.position = turtle.advanced(params.step),
                TurtleOp::Turn(sign) => {
                    let factor = match rng.as_deref_mut() {
                        Some(rng) if self.config.jitter => rng.gen_range(0.0f32..1.0),
                        _ => 1.0,
                    };
                    turtle.turn(sign * params.turn_angle * factor);
                }
                TurtleOp::TurnAround => turtle.turn(PI),
                TurtleOp::Push => {
                    if stack.len() >= self.config.max_stack_depth {
                        return Err(InterpretError::StackOverflow {
                            position,
                            limit: self.config.max_stack_depth,
                        });
                    }
                    stack.push(turtle);
                }
                TurtleOp::Pop => {
                    turtle = stack
                        .pop()
                        .ok_or(InterpretError::StackUnderflow { position })?;
                }
                TurtleOp::Ignore => {}
            }
        }

        Ok(turtle)
    }
}

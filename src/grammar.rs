//! Grammar values: an axiom, production rules and a turn angle.
//!
//! A shape family ("Koch curve", "Fern", ...) is not a type but a named
//! [`Grammar`] value returned by one of the preset factories in this module.

use crate::error::GrammarError;
use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// A single grammar symbol (one ASCII byte).
pub type Symbol = u8;

/// The rewriting half of a grammar: axiom plus production rules.
///
/// Symbols absent from `rules` rewrite to themselves. This is the part of a
/// grammar that determines its expansion, so it doubles as the expansion
/// cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Productions {
    axiom: Vec<Symbol>,
    rules: BTreeMap<Symbol, Vec<Symbol>>,
}

impl Productions {
    pub fn axiom(&self) -> &[Symbol] {
        &self.axiom
    }

    /// Replacement for `symbol`, or `None` for the identity rule.
    pub fn rule(&self, symbol: Symbol) -> Option<&[Symbol]> {
        self.rules.get(&symbol).map(Vec::as_slice)
    }

    /// Number of symbols `symbol` expands to in one generation.
    pub fn replacement_len(&self, symbol: Symbol) -> usize {
        self.rules.get(&symbol).map_or(1, Vec::len)
    }
}

/// Immutable definition of a branching shape family.
#[derive(Clone, Debug, PartialEq)]
pub struct Grammar {
    name: String,
    productions: Arc<Productions>,
    /// Turn increment in radians applied by `+` / `-`.
    turn_angle: f32,
}

impl Grammar {
    /// Builds a grammar from string forms.
    ///
    /// Every symbol of the axiom, the rule heads and the rule bodies must be ASCII.
    pub fn new<'a>(
        name: impl Into<String>,
        axiom: &str,
        rules: impl IntoIterator<Item = (char, &'a str)>,
        turn_angle: f32,
    ) -> Result<Self, GrammarError> {
        let axiom = ascii_symbols(axiom, "axiom")?;
        let mut table = BTreeMap::new();
        for (head, body) in rules {
            if !head.is_ascii() {
                return Err(GrammarError::NonAsciiSymbol {
                    context: "rule head",
                    found: head,
                });
            }
            table.insert(head as Symbol, ascii_symbols(body, "rule body")?);
        }

        Ok(Self {
            name: name.into(),
            productions: Arc::new(Productions {
                axiom,
                rules: table,
            }),
            turn_angle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axiom(&self) -> &[Symbol] {
        self.productions.axiom()
    }

    pub fn productions(&self) -> &Arc<Productions> {
        &self.productions
    }

    pub fn turn_angle(&self) -> f32 {
        self.turn_angle
    }

    /// Returns a copy with a different turn increment; the productions are shared.
    pub fn with_turn_angle(&self, turn_angle: f32) -> Self {
        Self {
            turn_angle,
            ..self.clone()
        }
    }
}

fn ascii_symbols(text: &str, context: &'static str) -> Result<Vec<Symbol>, GrammarError> {
    match text.chars().find(|c| !c.is_ascii()) {
        Some(found) => Err(GrammarError::NonAsciiSymbol { context, found }),
        None => Ok(text.as_bytes().to_vec()),
    }
}

// Preset tables are ASCII literals, so they skip validation.
fn preset<const N: usize>(
    name: &str,
    axiom: &str,
    rules: [(char, &str); N],
    turn_angle: f32,
) -> Grammar {
    Grammar {
        name: name.to_owned(),
        productions: Arc::new(Productions {
            axiom: axiom.bytes().collect(),
            rules: rules
                .into_iter()
                .map(|(head, body)| (head as Symbol, body.bytes().collect()))
                .collect(),
        }),
        turn_angle,
    }
}

/// Quadratic Koch curve: `F → F+F-F-F+F`, 90°.
pub fn koch_curve() -> Grammar {
    preset("koch_curve", "F", [('F', "F+F-F-F+F")], FRAC_PI_2)
}

/// Barnsley-style fern: `X → F-[[X]+X]+F[+FX]-X`, `F → FF`, 0.436 rad.
///
/// At depth `d >= 1` the expansion holds `3 * 2^(d-1) * (2^d - 1)` draw symbols.
pub fn fern() -> Grammar {
    preset(
        "fern",
        "X",
        [('X', "F-[[X]+X]+F[+FX]-X"), ('F', "FF")],
        0.436,
    )
}

/// Heighway dragon: `X → X+YF+`, `Y → -FX-Y`, 90°.
pub fn dragon_curve() -> Grammar {
    preset(
        "dragon_curve",
        "FX",
        [('X', "X+YF+"), ('Y', "-FX-Y")],
        FRAC_PI_2,
    )
}

/// Sierpinski triangle drawn with `F` and `G`, 120°.
pub fn sierpinski_triangle() -> Grammar {
    preset(
        "sierpinski_triangle",
        "F-G-G",
        [('F', "F-G+F+G-F"), ('G', "GG")],
        120.0f32.to_radians(),
    )
}

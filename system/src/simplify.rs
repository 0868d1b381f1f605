use crate::types::{Point, Stroke};

pub const GRID_SIZE: f64 = 40.0;
pub const KEEP_EVERY: usize = 5;

/// Crude cleanup for freehand input: thins each stroke down to its endpoints plus every
/// `keep_every`-th point, then snaps what is left onto a square grid.
///
/// This is a deterministic heuristic, not curve fitting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Simplifier {
    grid_size: f64,
    keep_every: usize,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            keep_every: KEEP_EVERY,
        }
    }
}

impl Simplifier {
    /// `None` unless `grid_size` is finite and positive and `keep_every` is non-zero.
    pub fn new(grid_size: f64, keep_every: usize) -> Option<Self> {
        if grid_size.is_finite() && grid_size > 0.0 && keep_every > 0 {
            Some(Self {
                grid_size,
                keep_every,
            })
        } else {
            None
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn keep_every(&self) -> usize {
        self.keep_every
    }

    /// Nearest grid multiple, ties away from zero. Never returns `-0.0`.
    pub fn snap(&self, value: f64) -> f64 {
        (value / self.grid_size).round() * self.grid_size + 0.0
    }

    fn keeps(&self, index: usize, len: usize) -> bool {
        index == 0 || index + 1 == len || index % self.keep_every == 0
    }

    /// `None` for a stroke without points.
    pub fn simplify_stroke(&self, stroke: &Stroke) -> Option<Stroke> {
        let len = stroke.points.len();
        if len == 0 {
            return None;
        }

        let points = stroke
            .points
            .iter()
            .enumerate()
            .filter(|(index, _)| self.keeps(*index, len))
            .map(|(_, point)| Point::new(self.snap(point.x), self.snap(point.y)))
            .collect();

        Some(Stroke { points })
    }

    pub fn simplify(&self, strokes: &[Stroke]) -> Vec<Stroke> {
        strokes
            .iter()
            .filter_map(|stroke| self.simplify_stroke(stroke))
            .collect()
    }
}

pub fn snap(value: f64) -> f64 {
    Simplifier::default().snap(value)
}

pub fn simplify(strokes: &[Stroke]) -> Vec<Stroke> {
    Simplifier::default().simplify(strokes)
}

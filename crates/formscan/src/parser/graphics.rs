//! Transformation matrices and the `q`/`Q`/`cm` graphics-state stack shared by
//! the text and path interpreters.

use super::backend::{numbers, Operand};

/// A PDF transformation matrix `[a, b, c, d, e, f]`.
///
/// Points are row vectors: `[x' y' 1] = [x y 1] x M`.
pub type Matrix = [f32; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1` applied first, then `m2`.
pub fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

pub fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Length of the transformed x unit vector.
pub fn horizontal_scale(m: &Matrix) -> f32 {
    (m[0].powi(2) + m[1].powi(2)).sqrt()
}

/// Length of the transformed y unit vector.
pub fn vertical_scale(m: &Matrix) -> f32 {
    (m[2].powi(2) + m[3].powi(2)).sqrt()
}

/// The current transformation matrix with its save/restore stack.
///
/// An unbalanced `Q` leaves the matrix unchanged rather than failing.
#[derive(Debug, Clone)]
pub struct CtmStack {
    current: Matrix,
    saved: Vec<Matrix>,
}

impl Default for CtmStack {
    fn default() -> Self {
        Self {
            current: IDENTITY,
            saved: Vec::new(),
        }
    }
}

impl CtmStack {
    pub fn current(&self) -> &Matrix {
        &self.current
    }

    /// Handle `q`, `Q` and `cm`. Returns `false` for any other operator.
    pub fn handle(&mut self, operator: &str, operands: &[Operand]) -> bool {
        match operator {
            "q" => self.saved.push(self.current),
            "Q" => {
                if let Some(m) = self.saved.pop() {
                    self.current = m;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.current = multiply(&m, &self.current);
                }
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_translation_then_scale() {
        let translate = [1.0, 0.0, 0.0, 1.0, 10.0, 20.0];
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let m = multiply(&translate, &scale);
        assert_eq!(apply(&m, 1.0, 1.0), (22.0, 42.0));
    }

    #[test]
    fn ctm_stack_restores_saved_matrix() {
        let mut stack = CtmStack::default();
        assert!(stack.handle("q", &[]));
        let ops: Vec<Operand> = [2.0, 0.0, 0.0, 2.0, 5.0, 5.0]
            .into_iter()
            .map(Operand::Number)
            .collect();
        assert!(stack.handle("cm", &ops));
        assert_eq!(apply(stack.current(), 1.0, 1.0), (7.0, 7.0));
        assert!(stack.handle("Q", &[]));
        assert_eq!(stack.current(), &IDENTITY);
        assert!(!stack.handle("re", &[]));
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut stack = CtmStack::default();
        stack.handle("Q", &[]);
        assert_eq!(stack.current(), &IDENTITY);
    }

    #[test]
    fn scales_follow_matrix() {
        let m = [3.0, 4.0, 0.0, 2.0, 0.0, 0.0];
        assert_eq!(horizontal_scale(&m), 5.0);
        assert_eq!(vertical_scale(&m), 2.0);
    }
}

//! Square convolution kernels.

use crate::error::EffectError;

/// Odd-sized square weight matrix, row-major, row 0 applied to `y - radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// Build a kernel from `size × size` row-major weights.
    pub fn new(size: usize, weights: Vec<f32>) -> Result<Self, EffectError> {
        if size % 2 == 0 || weights.len() != size * size {
            return Err(EffectError::InvalidKernel {
                size,
                len: weights.len(),
            });
        }
        Ok(Self { size, weights })
    }

    pub fn from_3x3(rows: [[f32; 3]; 3]) -> Self {
        Self {
            size: 3,
            weights: rows.into_iter().flatten().collect(),
        }
    }

    pub fn from_5x5(rows: [[f32; 5]; 5]) -> Self {
        Self {
            size: 5,
            weights: rows.into_iter().flatten().collect(),
        }
    }

    /// Center weight 1, everything else 0.
    pub fn identity(size: usize) -> Result<Self, EffectError> {
        let mut weights = vec![0.0; size * size];
        if let Some(center) = weights.get_mut(size * size / 2) {
            *center = 1.0;
        }
        Self::new(size, weights)
    }

    /// Every weight equal to `weight`.
    pub fn uniform(size: usize, weight: f32) -> Result<Self, EffectError> {
        Self::new(size, vec![weight; size * size])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Neighborhood radius: 1 for 3×3, 2 for 5×5.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.size + col]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_or_ragged_kernels_rejected() {
        assert!(Kernel::new(4, vec![0.0; 16]).is_err());
        assert!(Kernel::new(3, vec![0.0; 8]).is_err());
        assert!(Kernel::new(3, vec![0.0; 9]).is_ok());
    }

    #[test]
    fn test_identity_has_single_center_weight() {
        let k = Kernel::identity(5).unwrap();
        assert_eq!(k.radius(), 2);
        assert_eq!(k.weight(2, 2), 1.0);
        assert_eq!(k.sum(), 1.0);
    }

    #[test]
    fn test_from_3x3_is_row_major() {
        let k = Kernel::from_3x3([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(k.weight(0, 2), 3.0);
        assert_eq!(k.weight(2, 0), 7.0);
    }
}

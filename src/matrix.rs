//! Dense pairwise distance matrix
//!
//! The engine never computes distances. It only reads a precomputed,
//! fully materialised N x N matrix that is validated once at construction:
//! square, finite, non-negative, symmetric and zero on the diagonal.

use crate::error::{HeterogeneityError, Result};

/// Validated, row-major N x N distance matrix
///
/// # Example
/// ```
/// use clusterhet::DistanceMatrix;
///
/// let d = DistanceMatrix::from_rows(vec![
///     vec![0.0, 1.0, 2.0],
///     vec![1.0, 0.0, 3.0],
///     vec![2.0, 3.0, 0.0],
/// ])
/// .unwrap();
/// assert_eq!(d.len(), 3);
/// assert_eq!(d.get(1, 2), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f32>,
}

impl DistanceMatrix {
    /// Relative tolerance for the symmetry and zero-diagonal checks
    pub const SYMMETRY_TOLERANCE: f32 = 1e-5;

    /// Build from one `Vec` per row
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(HeterogeneityError::NotSquare {
                    row,
                    len: values.len(),
                    expected: n,
                });
            }
            data.extend(values);
        }
        Self::from_flat(n, data)
    }

    /// Build from a row-major buffer of length `n * n`
    pub fn from_flat(n: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != n * n {
            return Err(HeterogeneityError::NotSquare {
                row: data.len() / n.max(1),
                len: data.len(),
                expected: n * n,
            });
        }
        let matrix = Self { n, data };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build from a condensed upper-triangle vector
    ///
    /// The layout is the one produced by `pdist`-style tools: entries
    /// `(0,1), (0,2), .., (0,n-1), (1,2), .., (n-2,n-1)`.
    pub fn from_condensed(condensed: &[f32]) -> Result<Self> {
        let len = condensed.len();
        let n = Self::order_from_condensed(len)
            .ok_or(HeterogeneityError::CondensedLength { len })?;

        let mut data = vec![0.0f32; n * n];
        let mut k = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                data[i * n + j] = condensed[k];
                data[j * n + i] = condensed[k];
                k += 1;
            }
        }
        Self::from_flat(n, data)
    }

    /// Solve `n * (n - 1) / 2 == len` for n
    fn order_from_condensed(len: usize) -> Option<usize> {
        let estimate = ((1.0 + (1.0 + 8.0 * len as f64).sqrt()) / 2.0).round() as usize;
        (estimate.saturating_sub(1)..=estimate + 1).find(|&n| n * n.saturating_sub(1) / 2 == len)
    }

    fn validate(&self) -> Result<()> {
        let n = self.n;
        for i in 0..n {
            let diagonal = self.get(i, i);
            if !diagonal.is_finite() || diagonal < 0.0 {
                return Err(HeterogeneityError::InvalidDistance {
                    i,
                    j: i,
                    value: diagonal,
                });
            }
            let row_scale = self
                .row(i)
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(0.0f32, |acc, (_, v)| acc.max(v.abs()));
            if diagonal > Self::SYMMETRY_TOLERANCE * row_scale {
                return Err(HeterogeneityError::NonZeroDiagonal {
                    index: i,
                    value: diagonal,
                });
            }

            for j in (i + 1)..n {
                let forward = self.get(i, j);
                let backward = self.get(j, i);
                for (a, b, value) in [(i, j, forward), (j, i, backward)] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(HeterogeneityError::InvalidDistance { i: a, j: b, value });
                    }
                }

                let scale = forward.abs().max(backward.abs());
                if (forward - backward).abs() > Self::SYMMETRY_TOLERANCE * scale {
                    return Err(HeterogeneityError::Asymmetric {
                        i,
                        j,
                        forward,
                        backward,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of observations covered (matrix order)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between observations `i` and `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    /// Full row `i`
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

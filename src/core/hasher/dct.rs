//! Separable 2-D DCT-II restricted to the low-frequency corner.
//!
//! Only the top-left `keep x keep` block of coefficients is ever needed, so
//! both passes stop at `keep` output frequencies. With the default 32x32
//! input and an 8x8 block that is 32*32*8 + 32*8*8 multiply-adds instead of
//! the 32^4 a naive transform costs.

use std::f64::consts::PI;

/// Precomputed orthonormal DCT-II basis for one input size
#[derive(Debug, Clone)]
pub struct LowFrequencyDct {
    size: usize,
    keep: usize,
    /// `basis[u * size + x]` = alpha(u) * cos((2x + 1) * u * PI / 2N)
    basis: Vec<f64>,
}

impl LowFrequencyDct {
    /// Panics in debug builds if `keep > size`; callers validate first.
    pub fn new(size: usize, keep: usize) -> Self {
        debug_assert!(keep <= size && size > 0);

        let n = size as f64;
        let mut basis = Vec::with_capacity(keep * size);
        for u in 0..keep {
            let alpha = if u == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            for x in 0..size {
                let angle = (2 * x + 1) as f64 * u as f64 * PI / (2.0 * n);
                basis.push(alpha * angle.cos());
            }
        }

        Self { size, keep, basis }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Transform a row-major `size x size` matrix, returning the row-major
    /// `keep x keep` low-frequency block (index 0 is the DC term).
    pub fn transform(&self, pixels: &[f64]) -> Vec<f64> {
        let (n, k) = (self.size, self.keep);
        debug_assert_eq!(pixels.len(), n * n);

        // Rows: n x k
        let mut rows = vec![0.0; n * k];
        for x in 0..n {
            let row = &pixels[x * n..(x + 1) * n];
            for v in 0..k {
                let basis = &self.basis[v * n..(v + 1) * n];
                rows[x * k + v] = row.iter().zip(basis).map(|(p, c)| p * c).sum();
            }
        }

        // Columns: k x k
        let mut out = vec![0.0; k * k];
        for u in 0..k {
            let basis = &self.basis[u * n..(u + 1) * n];
            for v in 0..k {
                out[u * k + v] = (0..n).map(|x| rows[x * k + v] * basis[x]).sum();
            }
        }

        out
    }
}

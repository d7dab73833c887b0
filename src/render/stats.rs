//! Per-call rendering statistics.

use std::ops::{Add, AddAssign};

/// Counters returned by every draw call.
///
/// Stats from several calls can be summed with `+` / `+=`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Triangles submitted (for line draws: lines submitted).
    pub triangles: usize,
    /// Primitives discarded because they were entirely outside the view volume.
    pub clipped: usize,
    /// Primitives dropped for non-finite coordinates, zero screen area or
    /// face culling.
    pub skipped: usize,
    /// Pixels covered by the rasterized primitives.
    pub total_pixels: u64,
    /// Covered pixels that passed the depth test and were written.
    pub updated_pixels: u64,
}

impl RenderStats {
    /// Fraction of covered pixels that were written, `0.0` when nothing
    /// was covered.
    ///
    /// Useful for occlusion decisions, e.g. keeping only silhouette lines
    /// that are mostly visible.
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.updated_pixels as f64 / self.total_pixels as f64
        }
    }
}

impl Add for RenderStats {
    type Output = RenderStats;

    fn add(self, rhs: RenderStats) -> Self::Output {
        RenderStats {
            triangles: self.triangles + rhs.triangles,
            clipped: self.clipped + rhs.clipped,
            skipped: self.skipped + rhs.skipped,
            total_pixels: self.total_pixels + rhs.total_pixels,
            updated_pixels: self.updated_pixels + rhs.updated_pixels,
        }
    }
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, rhs: RenderStats) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for RenderStats {
    fn sum<I: Iterator<Item = RenderStats>>(iter: I) -> Self {
        iter.fold(RenderStats::default(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_accumulate() {
        let mut a = RenderStats {
            triangles: 1,
            total_pixels: 10,
            updated_pixels: 5,
            ..Default::default()
        };
        a += RenderStats {
            triangles: 2,
            clipped: 1,
            total_pixels: 10,
            updated_pixels: 10,
            ..Default::default()
        };
        assert_eq!(a.triangles, 3);
        assert_eq!(a.clipped, 1);
        assert_eq!(a.coverage_ratio(), 0.75);
        assert_eq!(RenderStats::default().coverage_ratio(), 0.0);
    }
}

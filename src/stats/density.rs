//! Density estimation: histogram binning, Gaussian KDE and hexagonal binning.

use super::calculator::StatsCalculator;
use statrs::distribution::{Continuous, Normal};

/// Bandwidths the KDE grid extends past the data on each side.
pub const KDE_CUT: f64 = 3.0;

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` ascending edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Density curve sampled on an even grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub points: Vec<(f64, f64)>,
}

impl DensityCurve {
    pub fn max_density(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }

    /// Curve rescaled from density to expected counts per bin.
    pub fn scaled(&self, factor: f64) -> Vec<(f64, f64)> {
        self.points.iter().map(|&(x, y)| (x, y * factor)).collect()
    }
}

/// One occupied hexagon.
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    pub center: (f64, f64),
    pub count: usize,
}

/// Hexagonal binning of a point cloud.
#[derive(Debug, Clone)]
pub struct HexGrid {
    pub cells: Vec<HexCell>,
    /// Horizontal lattice spacing in data units.
    pub sx: f64,
    /// Vertical lattice spacing in data units.
    pub sy: f64,
}

impl HexGrid {
    /// Polygon vertices of a cell in data coordinates.
    pub fn vertices(&self, cell: &HexCell) -> Vec<(f64, f64)> {
        const SHAPE: [(f64, f64); 6] = [
            (0.5, -0.5),
            (0.5, 0.5),
            (0.0, 1.0),
            (-0.5, 0.5),
            (-0.5, -0.5),
            (0.0, -1.0),
        ];
        let (cx, cy) = cell.center;
        SHAPE
            .iter()
            .map(|&(dx, dy)| (cx + dx * self.sx, cy + dy * self.sy / 3.0))
            .collect()
    }

    pub fn max_count(&self) -> usize {
        self.cells.iter().map(|c| c.count).max().unwrap_or(0)
    }

    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.cells.iter().map(|c| c.count).sum()
    }
}

/// Range used for binning; a degenerate range is widened by half a unit.
fn bin_range(values: &[f64]) -> Option<(f64, f64)> {
    let (lo, hi) = StatsCalculator::extent(values)?;
    if lo == hi {
        Some((lo - 0.5, hi + 0.5))
    } else {
        Some((lo, hi))
    }
}

pub struct DensityEstimator;

impl DensityEstimator {
    /// Bin values into `bins` equal-width bins; the last bin is closed.
    pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
        let bins = bins.max(1);
        let (lo, hi) = bin_range(values)?;
        let width = (hi - lo) / bins as f64;

        let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        edges[bins] = hi;
        let mut counts = vec![0usize; bins];
        for &v in values.iter().filter(|v| v.is_finite()) {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Histogram { edges, counts })
    }

    /// Scott's rule bandwidth, `n^(-1/5)` times the sample standard deviation.
    pub fn scott_bandwidth(values: &[f64]) -> f64 {
        let stats = StatsCalculator::compute_descriptive_stats(values);
        if stats.count < 2 {
            return f64::NAN;
        }
        (stats.count as f64).powf(-0.2) * stats.std
    }

    /// Gaussian kernel density sampled at `grid_points` between
    /// `min - cut * bw` and `max + cut * bw`.
    ///
    /// Needs at least two distinct values.
    pub fn gaussian_kde(values: &[f64], grid_points: usize, cut: f64) -> Option<DensityCurve> {
        let bandwidth = Self::scott_bandwidth(values);
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return None;
        }
        let (lo, hi) = StatsCalculator::extent(values)?;
        let start = lo - cut * bandwidth;
        let end = hi + cut * bandwidth;
        let grid_points = grid_points.max(2);
        let step = (end - start) / (grid_points - 1) as f64;

        let kernel = Normal::new(0.0, 1.0).ok()?;
        let norm = values.len() as f64 * bandwidth;
        let points = (0..grid_points)
            .map(|i| {
                let x = start + step * i as f64;
                let density = values
                    .iter()
                    .map(|&xi| kernel.pdf((x - xi) / bandwidth))
                    .sum::<f64>()
                    / norm;
                (x, density)
            })
            .collect();

        Some(DensityCurve { bandwidth, points })
    }

    /// Count points per hexagon on a grid `gridsize` hexagons wide.
    ///
    /// Every hexagon of the grid is returned, empty ones with a zero count.
    pub fn hexbin(points: &[(f64, f64)], gridsize: usize) -> Option<HexGrid> {
        let nx = gridsize.max(1);
        let ny = ((nx as f64 / 3f64.sqrt()).floor() as usize).max(1);

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        let (xmin, xmax) = bin_range(&xs)?;
        let (ymin, ymax) = bin_range(&ys)?;

        let sx = (xmax - xmin) / nx as f64;
        let sy = (ymax - ymin) / ny as f64;

        // Two interleaved lattices: corners (nx+1 by ny+1) and centres (nx by ny).
        let mut lattice1 = vec![0usize; (nx + 1) * (ny + 1)];
        let mut lattice2 = vec![0usize; nx * ny];

        for &(x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let px = (x - xmin) / sx;
            let py = (y - ymin) / sy;

            let ix1 = px.round();
            let iy1 = py.round();
            let ix2 = px.floor();
            let iy2 = py.floor();

            let d1 = (px - ix1).powi(2) + 3.0 * (py - iy1).powi(2);
            let d2 = (px - ix2 - 0.5).powi(2) + 3.0 * (py - iy2 - 0.5).powi(2);

            if d1 < d2 {
                let i = (ix1.max(0.0) as usize).min(nx);
                let j = (iy1.max(0.0) as usize).min(ny);
                lattice1[i * (ny + 1) + j] += 1;
            } else {
                let i = (ix2.max(0.0) as usize).min(nx - 1);
                let j = (iy2.max(0.0) as usize).min(ny - 1);
                lattice2[i * ny + j] += 1;
            }
        }

        let mut cells = Vec::with_capacity(lattice1.len() + lattice2.len());
        for i in 0..=nx {
            for j in 0..=ny {
                cells.push(HexCell {
                    center: (xmin + i as f64 * sx, ymin + j as f64 * sy),
                    count: lattice1[i * (ny + 1) + j],
                });
            }
        }
        for i in 0..nx {
            for j in 0..ny {
                cells.push(HexCell {
                    center: (xmin + (i as f64 + 0.5) * sx, ymin + (j as f64 + 0.5) * sy),
                    count: lattice2[i * ny + j],
                });
            }
        }

        Some(HexGrid { cells, sx, sy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_every_value_once() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let hist = DensityEstimator::histogram(&values, 5).unwrap();
        assert_eq!(hist.edges.len(), 6);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(hist.edges[5], 10.0);
        assert_eq!(hist.total(), values.len());
        // Max value falls into the closed last bin.
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 3]);
        assert!((hist.bin_width() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_values_get_unit_range() {
        let hist = DensityEstimator::histogram(&[4.0, 4.0, 4.0], 10).unwrap();
        assert_eq!(hist.edges[0], 3.5);
        assert_eq!(*hist.edges.last().unwrap(), 4.5);
        assert_eq!(hist.total(), 3);
        assert!(DensityEstimator::histogram(&[], 10).is_none());
    }

    #[test]
    fn kde_integrates_to_one() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin() * 10.0 + 20.0).collect();
        let curve = DensityEstimator::gaussian_kde(&values, 400, KDE_CUT).unwrap();

        let area: f64 = curve
            .points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum();
        assert!((area - 1.0).abs() < 0.01, "area was {area}");
        assert!(curve.points.first().unwrap().0 < 10.0);
        assert!(curve.points.last().unwrap().0 > 30.0);
    }

    #[test]
    fn kde_needs_spread() {
        assert!(DensityEstimator::gaussian_kde(&[1.0, 1.0, 1.0], 100, KDE_CUT).is_none());
        assert!(DensityEstimator::gaussian_kde(&[1.0], 100, KDE_CUT).is_none());
    }

    #[test]
    fn hexbin_counts_every_point() {
        let points: Vec<(f64, f64)> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.1;
                (t.cos() * t, t.sin() * t)
            })
            .collect();
        let grid = DensityEstimator::hexbin(&points, 30).unwrap();
        assert_eq!(grid.total(), points.len());
        assert!(grid.max_count() >= 1);

        let hex = grid.vertices(&grid.cells[0]);
        assert_eq!(hex.len(), 6);
    }

    #[test]
    fn hexbin_returns_the_whole_grid() {
        let points = [(0.0, 0.0), (10.0, 10.0), (10.0, 10.0)];
        let grid = DensityEstimator::hexbin(&points, 4).unwrap();
        // nx = 4, ny = floor(4 / sqrt 3) = 2: 5x3 corner cells plus 4x2 centre cells.
        assert_eq!(grid.cells.len(), 5 * 3 + 4 * 2);
        assert_eq!(grid.total(), 3);
        assert_eq!(grid.max_count(), 2);
        assert_eq!(grid.cells.iter().filter(|c| c.count > 0).count(), 2);
    }

    #[test]
    fn hexbin_handles_single_point() {
        let grid = DensityEstimator::hexbin(&[(2.0, 3.0)], 30).unwrap();
        assert_eq!(grid.total(), 1);
        assert!(DensityEstimator::hexbin(&[], 30).is_none());
    }
}

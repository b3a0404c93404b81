//! Grid & Raster Algebra
//!
//! Eager, in-process replacement for the platform's image algebra. A raster is
//! a row-major `Vec<Option<f64>>` on a geographic grid; `None` is a masked pixel.
//!
//! Masking rules follow the platform semantics the tool was written against:
//! - `update_mask(m)` masks a pixel wherever `m` is masked or zero
//! - `unmask(fill)` replaces masked pixels with `fill`
//! - reductions ignore masked pixels and return `None` on an empty region

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::geometry::Footprint;

/// Authalic Earth radius (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_007.2;

/// Geographic grid shared by every layer of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Longitude of the west edge of column 0
    pub west: f64,
    /// Latitude of the north edge of row 0
    pub north: f64,
    /// Pixel size in degrees (square pixels)
    pub pixel_size: f64,
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// (lon, lat) of the pixel center
    #[inline]
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.west + (col as f64 + 0.5) * self.pixel_size,
            self.north - (row as f64 + 0.5) * self.pixel_size,
        )
    }

    /// Spherical area of one pixel in the given row (m²)
    pub fn pixel_area_m2(&self, row: usize) -> f64 {
        let lat_top = (self.north - row as f64 * self.pixel_size).to_radians();
        let lat_bottom = (self.north - (row + 1) as f64 * self.pixel_size).to_radians();
        let d_lon = self.pixel_size.to_radians();
        EARTH_RADIUS_M * EARTH_RADIUS_M * d_lon * (lat_top.sin() - lat_bottom.sin()).abs()
    }

    /// Row/column window covering a footprint's bounding box, clamped to the grid
    fn window(&self, footprint: &Footprint) -> Option<(usize, usize, usize, usize)> {
        let bbox = footprint.bbox()?;
        let col_of = |lon: f64| ((lon - self.west) / self.pixel_size).floor();
        let row_of = |lat: f64| ((self.north - lat) / self.pixel_size).floor();

        let c0 = col_of(bbox.min().x).max(0.0);
        let c1 = col_of(bbox.max().x).min(self.width as f64 - 1.0);
        let r0 = row_of(bbox.max().y).max(0.0);
        let r1 = row_of(bbox.min().y).min(self.height as f64 - 1.0);
        if c0 > c1 || r0 > r1 {
            return None;
        }
        Some((r0 as usize, r1 as usize, c0 as usize, c1 as usize))
    }
}

/// Masked raster on a `Grid`
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    grid: Grid,
    values: Vec<Option<f64>>,
}

impl Raster {
    pub fn from_values(grid: Grid, values: Vec<Option<f64>>, layer: &str) -> PlannerResult<Self> {
        if values.len() != grid.len() {
            return Err(PlannerError::GridMismatch {
                layer: layer.to_string(),
                expected: grid.len(),
                actual: values.len(),
            });
        }
        Ok(Self { grid, values })
    }

    pub fn constant(grid: Grid, value: f64) -> Self {
        Self { grid, values: vec![Some(value); grid.len()] }
    }

    pub fn masked(grid: Grid) -> Self {
        Self { grid, values: vec![None; grid.len()] }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values[self.grid.index(row, col)]
    }

    /// Number of unmasked pixels
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Apply `f` to every unmasked pixel
    pub fn map(&self, f: impl Fn(f64) -> Option<f64> + Sync) -> Self {
        let values = self.values.par_iter().map(|v| v.and_then(&f)).collect();
        Self { grid: self.grid, values }
    }

    /// Pixel-wise combination of two rasters on the same grid
    pub fn zip_with(
        &self,
        other: &Raster,
        f: impl Fn(Option<f64>, Option<f64>) -> Option<f64> + Sync,
    ) -> PlannerResult<Self> {
        self.check_grid(other, "zip_with")?;
        let values = self
            .values
            .par_iter()
            .zip(other.values.par_iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self { grid: self.grid, values })
    }

    pub fn unmask(&self, fill: f64) -> Self {
        let values = self.values.iter().map(|v| Some(v.unwrap_or(fill))).collect();
        Self { grid: self.grid, values }
    }

    /// Mask wherever `mask` is masked or zero
    pub fn update_mask(&self, mask: &Raster) -> PlannerResult<Self> {
        self.zip_with(mask, |v, m| match m {
            Some(m) if m != 0.0 => v,
            _ => None,
        })
    }

    /// Mask pixels that are zero
    pub fn self_mask(&self) -> Self {
        self.map(|v| if v != 0.0 { Some(v) } else { None })
    }

    /// Replace pixels with `value` where `cond` is zero or masked (after unmask(0))
    pub fn where_zero(&self, cond: &Raster, value: f64) -> PlannerResult<Self> {
        self.zip_with(cond, |v, c| if c.unwrap_or(0.0) == 0.0 { Some(value) } else { v })
    }

    /// Mask every pixel whose center falls outside `footprint`
    pub fn clip(&self, footprint: &Footprint) -> Self {
        let inside = self.grid.coverage(footprint);
        let values = self
            .values
            .par_iter()
            .zip(inside.par_iter())
            .map(|(&v, &keep)| if keep { v } else { None })
            .collect();
        Self { grid: self.grid, values }
    }

    /// Accumulate unmasked pixels inside the optional region
    fn fold_region(&self, region: Option<&[bool]>) -> RegionAccumulator {
        let width = self.grid.width;
        self.values
            .par_chunks(width.max(1))
            .enumerate()
            .map(|(row, chunk)| {
                let mut acc = RegionAccumulator::default();
                for (col, v) in chunk.iter().enumerate() {
                    if let Some(r) = region {
                        if !r[row * width + col] {
                            continue;
                        }
                    }
                    if let Some(v) = v {
                        acc.push(*v);
                    }
                }
                acc
            })
            .collect::<Vec<_>>()
            .into_iter()
            // Rows merged in order so float sums do not depend on scheduling
            .fold(RegionAccumulator::default(), RegionAccumulator::merge)
    }

    /// (min, max) over unmasked pixels inside the optional region
    pub fn min_max(&self, region: Option<&[bool]>) -> Option<(f64, f64)> {
        let acc = self.fold_region(region);
        (acc.count > 0).then_some((acc.min, acc.max))
    }

    pub fn sum(&self, region: Option<&[bool]>) -> Option<f64> {
        let acc = self.fold_region(region);
        (acc.count > 0).then_some(acc.sum)
    }

    pub fn mean(&self, region: Option<&[bool]>) -> Option<f64> {
        let acc = self.fold_region(region);
        (acc.count > 0).then(|| acc.sum / acc.count as f64)
    }

    pub fn count(&self, region: Option<&[bool]>) -> usize {
        self.fold_region(region).count
    }

    /// Per-pixel area in hectares wherever this raster is defined and nonzero
    pub fn pixel_area_ha(&self) -> Self {
        let width = self.grid.width;
        let grid = self.grid;
        let values = self
            .values
            .par_iter()
            .enumerate()
            .map(|(idx, v)| match v {
                Some(v) if *v != 0.0 => Some(*v * grid.pixel_area_m2(idx / width.max(1)) / 10_000.0),
                _ => None,
            })
            .collect();
        Self { grid, values }
    }

    /// Boolean mask of defined, nonzero pixels
    pub fn defined_mask(&self) -> Vec<bool> {
        self.values.iter().map(|v| matches!(v, Some(x) if *x != 0.0)).collect()
    }

    fn check_grid(&self, other: &Raster, op: &str) -> PlannerResult<()> {
        if self.grid != other.grid {
            return Err(PlannerError::GridMismatch {
                layer: op.to_string(),
                expected: self.grid.len(),
                actual: other.grid.len(),
            });
        }
        Ok(())
    }
}

impl Grid {
    /// Pixel-center coverage of a footprint, row-parallel within its bounding box
    pub fn coverage(&self, footprint: &Footprint) -> Vec<bool> {
        let mut inside = vec![false; self.len()];
        let Some((r0, r1, c0, c1)) = self.window(footprint) else {
            return inside;
        };
        let width = self.width;
        inside
            .par_chunks_mut(width.max(1))
            .enumerate()
            .filter(|(row, _)| *row >= r0 && *row <= r1)
            .for_each(|(row, chunk)| {
                for col in c0..=c1 {
                    let (lon, lat) = self.pixel_center(row, col);
                    chunk[col] = footprint.contains_point(lon, lat);
                }
            });
        inside
    }
}

#[derive(Debug, Clone, Copy)]
struct RegionAccumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for RegionAccumulator {
    fn default() -> Self {
        Self { count: 0, sum: 0.0, min: f64::INFINITY, max: f64::NEG_INFINITY }
    }
}

impl RegionAccumulator {
    fn push(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn merge(a: Self, b: Self) -> Self {
        Self {
            count: a.count + b.count,
            sum: a.sum + b.sum,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::ProjectArea;
    use approx::assert_relative_eq;

    /// 4×4 grid of 1° pixels, west edge at 0°, north edge at 4°
    pub(crate) fn grid_4x4() -> Grid {
        Grid { west: 0.0, north: 4.0, pixel_size: 1.0, width: 4, height: 4 }
    }

    #[test]
    fn test_from_values_rejects_wrong_length() {
        let err = Raster::from_values(grid_4x4(), vec![Some(1.0); 3], "test").unwrap_err();
        assert!(matches!(err, PlannerError::GridMismatch { expected: 16, actual: 3, .. }));
    }

    #[test]
    fn test_update_mask_masks_zero_and_masked() {
        let g = Grid { west: 0.0, north: 1.0, pixel_size: 1.0, width: 3, height: 1 };
        let r = Raster::constant(g, 5.0);
        let m = Raster::from_values(g, vec![Some(1.0), Some(0.0), None], "m").unwrap();
        let out = r.update_mask(&m).unwrap();
        assert_eq!(out.values(), &[Some(5.0), None, None]);
    }

    #[test]
    fn test_reductions_skip_masked_and_empty_is_none() {
        let g = Grid { west: 0.0, north: 1.0, pixel_size: 1.0, width: 4, height: 1 };
        let r = Raster::from_values(g, vec![Some(2.0), None, Some(6.0), Some(4.0)], "r").unwrap();
        assert_eq!(r.min_max(None), Some((2.0, 6.0)));
        assert_relative_eq!(r.sum(None).unwrap(), 12.0);
        assert_relative_eq!(r.mean(None).unwrap(), 4.0);

        let region = vec![false, true, false, false];
        assert_eq!(r.sum(Some(&region)), None);
        assert_eq!(Raster::masked(g).min_max(None), None);
    }

    #[test]
    fn test_clip_by_pixel_center() {
        let r = Raster::constant(grid_4x4(), 1.0);
        // Covers centers (0.5, 3.5) and (1.5, 3.5) only
        let fp = ProjectArea::Rectangle { west: 0.0, south: 3.0, east: 2.0, north: 4.0 }
            .to_footprint()
            .unwrap();
        let clipped = r.clip(&fp);
        assert_eq!(clipped.defined_count(), 2);
        assert_eq!(clipped.get(0, 0), Some(1.0));
        assert_eq!(clipped.get(0, 2), None);
    }

    #[test]
    fn test_clip_outside_grid_is_empty() {
        let r = Raster::constant(grid_4x4(), 1.0);
        let fp = ProjectArea::Rectangle { west: 10.0, south: 10.0, east: 12.0, north: 12.0 }
            .to_footprint()
            .unwrap();
        assert!(r.clip(&fp).is_empty());
    }

    #[test]
    fn test_pixel_area_at_equator() {
        let g = Grid { west: 0.0, north: 0.5, pixel_size: 1.0, width: 1, height: 1 };
        // 1°×1° cell centered on the equator is ~12,364 km²
        let area_km2 = g.pixel_area_m2(0) / 1e6;
        assert_relative_eq!(area_km2, 12_364.0, max_relative = 0.002);
    }

    #[test]
    fn test_pixel_area_ha_only_where_nonzero() {
        let g = Grid { west: 0.0, north: 1.0, pixel_size: 0.001, width: 2, height: 1 };
        let r = Raster::from_values(g, vec![Some(1.0), Some(0.0)], "r").unwrap();
        let area = r.pixel_area_ha();
        assert!(area.get(0, 0).unwrap() > 0.0);
        assert_eq!(area.get(0, 1), None);
    }

    #[test]
    fn test_where_zero_replaces_masked_condition() {
        let g = Grid { west: 0.0, north: 1.0, pixel_size: 1.0, width: 3, height: 1 };
        let r = Raster::constant(g, 1.0);
        let cond = Raster::from_values(g, vec![Some(2.0), Some(0.0), None], "c").unwrap();
        let out = r.where_zero(&cond, 0.0).unwrap();
        assert_eq!(out.values(), &[Some(1.0), Some(0.0), Some(0.0)]);
    }
}

//! Geometry: project areas, country boundaries and species range footprints
//!
//! Everything is in geographic coordinates (lon/lat degrees). Pixel membership
//! is decided by the pixel center, the same rule used when clipping rasters.

use geo::{BoundingRect, Contains, Coord, Intersects, LineString, MultiPolygon, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// Polygons as nested coordinate arrays: polygon → rings → `[lon, lat]`.
/// The first ring of each polygon is the exterior, the rest are holes.
pub type RingsDef = Vec<Vec<Vec<[f64; 2]>>>;

/// User-drawn project area (at most one per session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ProjectArea {
    Rectangle {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
    Polygon {
        vertices: Vec<[f64; 2]>,
    },
}

impl ProjectArea {
    /// Validate and convert to a footprint usable for clipping and intersection
    pub fn to_footprint(&self) -> PlannerResult<Footprint> {
        match self {
            ProjectArea::Rectangle { west, south, east, north } => {
                if !(west < east && south < north) {
                    return Err(PlannerError::InvalidGeometry(format!(
                        "rectangle bounds out of order: west={west}, south={south}, east={east}, north={north}"
                    )));
                }
                let rect = Rect::new(
                    Coord { x: *west, y: *south },
                    Coord { x: *east, y: *north },
                );
                Ok(Footprint::new(MultiPolygon(vec![rect.to_polygon()])))
            }
            ProjectArea::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(PlannerError::InvalidGeometry(format!(
                        "polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
                if vertices.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(PlannerError::InvalidGeometry(
                        "polygon has non-finite coordinates".to_string(),
                    ));
                }
                Ok(Footprint::new(MultiPolygon(vec![ring_polygon(&[vertices.clone()])])))
            }
        }
    }
}

/// A multipolygon with its cached bounding box
#[derive(Debug, Clone)]
pub struct Footprint {
    shape: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl Footprint {
    pub fn new(shape: MultiPolygon<f64>) -> Self {
        let bbox = shape.bounding_rect();
        Self { shape, bbox }
    }

    pub fn from_rings(rings: &RingsDef) -> Self {
        let polygons = rings
            .iter()
            .filter(|p| p.first().map_or(false, |exterior| exterior.len() >= 3))
            .map(|p| ring_polygon(p))
            .collect();
        Self::new(MultiPolygon(polygons))
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty()
    }

    /// True when (lon, lat) is strictly inside the footprint
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        match self.bbox {
            Some(b) if lon >= b.min().x && lon <= b.max().x && lat >= b.min().y && lat <= b.max().y => {
                self.shape.contains(&Point::new(lon, lat))
            }
            _ => false,
        }
    }

    /// Bounding-box pre-filter followed by the exact intersection test
    pub fn intersects(&self, other: &Footprint) -> bool {
        match (self.bbox, other.bbox) {
            (Some(a), Some(b)) if a.intersects(&b) => self.shape.intersects(&other.shape),
            _ => false,
        }
    }
}

fn ring_polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
    let to_line = |ring: &Vec<[f64; 2]>| -> LineString<f64> {
        LineString::from(ring.iter().map(|&[x, y]| (x, y)).collect::<Vec<_>>())
    };
    let exterior = rings.first().map(to_line).unwrap_or_else(|| LineString::new(vec![]));
    let holes = rings.iter().skip(1).map(to_line).collect();
    Polygon::new(exterior, holes)
}

//! Threatened species ranges
//!
//! IUCN / BirdLife range polygons grouped by taxon. A group may be merged from
//! several source files (corals, freshwater and marine fishes are split).

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::geometry::{Footprint, RingsDef};

/// IUCN Red List category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedListCategory {
    LeastConcern,
    NearThreatened,
    Vulnerable,
    Endangered,
    CriticallyEndangered,
    ExtinctInTheWild,
    Extinct,
    DataDeficient,
    Other,
}

impl RedListCategory {
    /// CR, EN and VU count as threatened
    pub fn is_threatened(self) -> bool {
        matches!(
            self,
            RedListCategory::CriticallyEndangered | RedListCategory::Endangered | RedListCategory::Vulnerable
        )
    }
}

impl FromStr for RedListCategory {
    type Err = std::convert::Infallible;

    fn from_str(code: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match code.trim().to_ascii_uppercase().as_str() {
            "LC" => RedListCategory::LeastConcern,
            "NT" => RedListCategory::NearThreatened,
            "VU" => RedListCategory::Vulnerable,
            "EN" => RedListCategory::Endangered,
            "CR" => RedListCategory::CriticallyEndangered,
            "EW" => RedListCategory::ExtinctInTheWild,
            "EX" => RedListCategory::Extinct,
            "DD" => RedListCategory::DataDeficient,
            _ => RedListCategory::Other,
        })
    }
}

/// One species range polygon
#[derive(Debug, Clone)]
pub struct SpeciesRange {
    pub binomial: String,
    pub category: RedListCategory,
    pub footprint: Footprint,
}

/// Range record as stored on disk (birds carry their status as `RedList_28`)
#[derive(Debug, Deserialize)]
struct SpeciesRecord {
    binomial: String,
    #[serde(alias = "RedList_28")]
    category: String,
    rings: RingsDef,
}

/// Source files making up one taxon group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonGroupSource {
    pub name: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TaxonGroup {
    pub name: String,
    pub ranges: Vec<SpeciesRange>,
}

impl TaxonGroup {
    /// Load and merge every file of the group
    pub fn load(data_dir: &Path, source: &TaxonGroupSource) -> Result<Self> {
        let mut ranges = Vec::new();
        for file in &source.files {
            let path = data_dir.join(file);
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read species ranges: {:?}", path))?;
            let records: Vec<SpeciesRecord> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse species ranges JSON: {:?}", path))?;

            ranges.extend(records.into_iter().map(|r| SpeciesRange {
                category: r.category.parse().unwrap_or(RedListCategory::Other),
                footprint: Footprint::from_rings(&r.rings),
                binomial: r.binomial,
            }));
        }

        tracing::info!(group = %source.name, ranges = ranges.len(), "Loaded species ranges");
        Ok(Self { name: source.name.clone(), ranges })
    }

    /// Distinct threatened binomials whose range intersects the AOI
    pub fn threatened_in<'a>(&'a self, aoi: &Footprint) -> FxHashSet<&'a str> {
        self.ranges
            .iter()
            .filter(|r| r.category.is_threatened() && r.footprint.intersects(aoi))
            .map(|r| r.binomial.as_str())
            .collect()
    }
}

/// Threatened species count over the full AOI, summed across taxon groups
///
/// Names are deduplicated within a group only; groups are disjoint taxa.
pub fn threatened_species_count(groups: &[TaxonGroup], aoi: &Footprint) -> usize {
    groups
        .par_iter()
        .map(|g| {
            let n = g.threatened_in(aoi).len();
            tracing::debug!(group = %g.name, threatened = n, "Species group count");
            n
        })
        .sum()
}

//! Region allow-list filter for locations.

use reaper_core::{ReaperConfig, RegionMatch};

/// Decides whether a location id is in scope for the sweep.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    regions: Vec<String>,
    mode: RegionMatch,
}

impl RegionFilter {
    pub fn new(regions: Vec<String>, mode: RegionMatch) -> Self {
        Self { regions, mode }
    }

    pub fn from_config(config: &ReaperConfig) -> Self {
        Self::new(config.regions.clone(), config.region_match)
    }

    /// A location is in scope if any allow-listed region matches it.
    ///
    /// An empty allow-list admits every location.
    pub fn in_scope(&self, location_id: &str) -> bool {
        if self.regions.is_empty() {
            return true;
        }
        self.regions
            .iter()
            .any(|region| self.matches(region, location_id))
    }

    fn matches(&self, region: &str, location_id: &str) -> bool {
        match self.mode {
            RegionMatch::SubLocation => location_id.contains(region) && location_id != region,
            RegionMatch::Substring => location_id.contains(region),
        }
    }
}

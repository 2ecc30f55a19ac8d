//! Terrain occulting and horizon masking

use frame_math::{Vec3, EARTH_RADIUS_M};

/// Effective earth radius factor for RF refraction
const REFRACTION_FACTOR: f64 = 4.0 / 3.0;

/// Heights below this are treated as a sensor mast above the surface
const MIN_HORIZON_HEIGHT_M: f64 = 2.0;

/// Line-of-sight occulting source
pub trait Terrain: Send + Sync {
    /// True when terrain blocks the straight path `from → to` (NED positions)
    fn occulted(&self, from: &Vec3, to: &Vec3) -> bool;
}

/// Flat terrain at a fixed elevation.
/// A straight segment between two points can only be blocked if one end is
/// below the surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub elevation_m: f64,
}

impl Terrain for FlatTerrain {
    fn occulted(&self, from: &Vec3, to: &Vec3) -> bool {
        -from.z < self.elevation_m || -to.z < self.elevation_m
    }
}

/// Radar horizon check for two altitudes separated by `range` meters
pub fn horizon_visible(alt1_m: f64, alt2_m: f64, range_m: f64) -> bool {
    let re = EARTH_RADIUS_M * REFRACTION_FACTOR;
    let h1 = alt1_m.max(MIN_HORIZON_HEIGHT_M);
    let h2 = alt2_m.max(MIN_HORIZON_HEIGHT_M);
    let horizon = (2.0 * re * h1).sqrt() + (2.0 * re * h2).sqrt();
    range_m <= horizon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_terrain_blocks_buried_endpoint() {
        let t = FlatTerrain { elevation_m: 100.0 };
        let air = Vec3::new(0.0, 0.0, -5000.0);
        let low = Vec3::new(10_000.0, 0.0, -50.0);
        assert!(!t.occulted(&air, &Vec3::new(1.0, 0.0, -200.0)));
        assert!(t.occulted(&air, &low));
    }

    #[test]
    fn test_horizon() {
        // two aircraft at 10 km can see ~800 km
        assert!(horizon_visible(10_000.0, 10_000.0, 700_000.0));
        // mast-height ground units lose each other past ~10 km
        assert!(!horizon_visible(0.0, 0.0, 20_000.0));
        assert!(horizon_visible(0.0, 0.0, 5_000.0));
    }
}

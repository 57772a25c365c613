//! Parameters for growth, trunk, skinning and the whole simulation.
//!
//! Every struct has a [`Default`] matching the values the tool has always
//! shipped with, and can be loaded from JSON (missing fields fall back to
//! their defaults).

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{KauriError, Result};

/// Parameters of a single space-colonization growth step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Radius around a limb tip inside which attraction points are consumed.
    pub kill_distance: f32,
    /// Length of every new limb.
    pub segment_length: f32,
    /// Magnitude of the random unit vector added to attracted growth.
    pub jitter: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            kill_distance: 0.5,
            segment_length: 0.5,
            jitter: 0.1,
        }
    }
}

impl GrowthConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.segment_length.is_finite() && self.segment_length > 0.0) {
            return Err(KauriError::InvalidSegmentLength {
                length: self.segment_length,
            });
        }
        if !(self.kill_distance.is_finite() && self.kill_distance >= 0.0) {
            return Err(KauriError::InvalidKillDistance {
                distance: self.kill_distance,
            });
        }
        if !(self.jitter.is_finite() && self.jitter >= 0.0) {
            return Err(KauriError::InvalidJitter {
                jitter: self.jitter,
            });
        }
        Ok(())
    }
}

/// Parameters of the tube skinning pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Vertices per ring.
    pub radial_subdivisions: usize,
    /// Radius of every limb without children.
    pub extremity_size: f32,
    /// Exponent of the power mean combining child radii.
    pub size_exponent: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            radial_subdivisions: 8,
            extremity_size: 0.02,
            size_exponent: 2.4,
        }
    }
}

impl MeshConfig {
    pub fn validate(&self) -> Result<()> {
        if self.radial_subdivisions < 3 {
            return Err(KauriError::InvalidRadialSubdivisions {
                count: self.radial_subdivisions,
            });
        }
        if !(self.extremity_size.is_finite() && self.extremity_size > 0.0) {
            return Err(KauriError::InvalidExtremitySize {
                size: self.extremity_size,
            });
        }
        if !(self.size_exponent.is_finite() && self.size_exponent > 0.0) {
            return Err(KauriError::InvalidSizeExponent {
                exponent: self.size_exponent,
            });
        }
        Ok(())
    }
}

/// Where one half of the tree starts, how its attraction points are laid
/// out, and how it grows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Position of the first limb's start.
    pub start: Vec3,
    pub growth: GrowthConfig,
    /// Number of attraction points generated at startup.
    pub attractor_count: usize,
    /// Size parameter handed to the distribution.
    pub spread_radius: f32,
    pub distribution: Distribution,
}

impl DomainConfig {
    /// Default layout for the above-ground half.
    pub fn branches() -> Self {
        Self {
            start: Vec3::ZERO,
            growth: GrowthConfig::default(),
            attractor_count: 400,
            spread_radius: 5.0,
            distribution: Distribution::Canopy,
        }
    }

    /// Default layout for the root system.
    pub fn roots() -> Self {
        Self {
            distribution: Distribution::Sphere,
            ..Self::branches()
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::branches()
    }
}

/// Complete configuration of one growing tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Mesh vertices are stored relative to this point.
    pub origin: Vec3,
    /// Height the trunk is grown to before attraction starts.
    pub trunk_height: f32,
    pub branches: DomainConfig,
    /// `None` disables the root system.
    pub roots: Option<DomainConfig>,
    pub mesh: MeshConfig,
    /// Seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            trunk_height: 3.0,
            branches: DomainConfig::branches(),
            roots: Some(DomainConfig::roots()),
            mesh: MeshConfig::default(),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.trunk_height.is_finite() {
            return Err(KauriError::InvalidTrunkHeight {
                height: self.trunk_height,
            });
        }
        self.branches.growth.validate()?;
        if let Some(roots) = &self.roots {
            roots.growth.validate()?;
        }
        self.mesh.validate()
    }

    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: SimConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GrowthConfig::default().validate().is_ok());
        assert!(MeshConfig::default().validate().is_ok());
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn growth_config_rejects_bad_values() {
        let cfg = GrowthConfig {
            segment_length: 0.0,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(KauriError::InvalidSegmentLength { .. })
        ));

        let cfg = GrowthConfig {
            kill_distance: -0.1,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(KauriError::InvalidKillDistance { .. })
        ));

        let cfg = GrowthConfig {
            jitter: f32::NAN,
            ..GrowthConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(KauriError::InvalidJitter { .. })));
    }

    #[test]
    fn mesh_config_rejects_bad_values() {
        let cfg = MeshConfig {
            radial_subdivisions: 2,
            ..MeshConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(KauriError::InvalidRadialSubdivisions { count: 2 })
        ));

        let cfg = MeshConfig {
            extremity_size: 0.0,
            ..MeshConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(KauriError::InvalidExtremitySize { .. })
        ));

        let cfg = MeshConfig {
            size_exponent: -2.0,
            ..MeshConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(KauriError::InvalidSizeExponent { .. })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = SimConfig::from_json_str(
            r#"{ "trunk_height": 4.5, "seed": 7, "branches": { "attractor_count": 50 } }"#,
        )
        .unwrap();

        assert_eq!(cfg.trunk_height, 4.5);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.branches.attractor_count, 50);
        assert_eq!(cfg.branches.growth, GrowthConfig::default());
        assert_eq!(cfg.mesh, MeshConfig::default());
    }

    #[test]
    fn json_is_validated_after_parsing() {
        let err = SimConfig::from_json_str(r#"{ "mesh": { "radial_subdivisions": 1 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            KauriError::InvalidRadialSubdivisions { count: 1 }
        ));
    }

    #[test]
    fn json_roundtrip_preserves_config() {
        let cfg = SimConfig {
            roots: None,
            seed: Some(3),
            ..SimConfig::default()
        };
        let json = cfg.to_json_string().unwrap();
        assert_eq!(SimConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn non_finite_trunk_height_is_rejected() {
        let cfg = SimConfig {
            trunk_height: f32::INFINITY,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(KauriError::InvalidTrunkHeight { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let err = SimConfig::load("/definitely/not/here/kauri.json").unwrap_err();
        assert!(matches!(err, KauriError::Io(_)));
    }
}

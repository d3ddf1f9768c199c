//! Grid configuration: validated tunables and named presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::voxel::KEY_BITS;

/// Largest resolution allowed on any axis (the packed-key limit).
pub const MAX_RESOLUTION: u32 = 1 << KEY_BITS;

/// How the lattice resolution is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Derived from the density factor and the finite-geometry count.
    #[default]
    Automatic,
    /// Fixed per-axis resolution.
    Manual {
        /// Cells along X.
        x: u32,
        /// Cells along Y.
        y: u32,
        /// Cells along Z.
        z: u32,
    },
}

/// Named acceleration setting chosen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccelerationMode {
    /// No grid: the caller tests every geometry directly.
    None,
    /// Balanced defaults.
    #[default]
    Default,
    /// Finer lattice and every traversal optimization.
    HighPerformance,
    /// Coarse, sparse lattice.
    MemoryEfficient,
    /// Default lattice with logging, metrics and path recording.
    Debug,
}

impl AccelerationMode {
    /// All modes, in declaration order.
    pub const ALL: [AccelerationMode; 5] = [
        AccelerationMode::None,
        AccelerationMode::Default,
        AccelerationMode::HighPerformance,
        AccelerationMode::MemoryEfficient,
        AccelerationMode::Debug,
    ];

    /// Kebab-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            AccelerationMode::None => "none",
            AccelerationMode::Default => "default",
            AccelerationMode::HighPerformance => "high-performance",
            AccelerationMode::MemoryEfficient => "memory-efficient",
            AccelerationMode::Debug => "debug",
        }
    }
}

impl fmt::Display for AccelerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccelerationMode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| GridError::config(format!("unknown acceleration mode '{s}'")))
    }
}

/// Immutable, validated grid configuration.
///
/// Construct through [`GridConfig::builder`] or one of the presets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridConfig {
    resolution_strategy: ResolutionStrategy,
    density_factor: f64,
    min_resolution: u32,
    max_resolution: u32,
    sparse_storage: bool,
    max_memory_mb: u64,
    max_objects_per_voxel: usize,
    early_termination: bool,
    deduplication: bool,
    optimized_traversal: bool,
    ray_box_optimization: bool,
    debug: bool,
    collect_metrics: bool,
    visualization: bool,
}

impl GridConfig {
    /// Start building a configuration from the default preset values.
    pub fn builder() -> GridConfigBuilder {
        GridConfigBuilder::default()
    }

    /// Balanced defaults: automatic resolution at density 2, dense storage.
    pub fn default_preset() -> Self {
        GridConfigBuilder::default().into_config()
    }

    /// Finer lattice with every traversal optimization enabled.
    pub fn high_performance() -> Self {
        GridConfigBuilder::default()
            .density_factor(3.0)
            .resolution_bounds(1, 256)
            .max_memory_mb(2048)
            .max_objects_per_voxel(32)
            .ray_box_optimization(true)
            .into_config()
    }

    /// Coarse lattice held in sparse storage.
    pub fn memory_efficient() -> Self {
        GridConfigBuilder::default()
            .density_factor(1.0)
            .resolution_bounds(1, 64)
            .sparse_storage(true)
            .max_memory_mb(128)
            .max_objects_per_voxel(128)
            .into_config()
    }

    /// Default lattice with diagnostics on and early termination off, so the
    /// recorded traversal path covers the whole ray.
    pub fn debug_preset() -> Self {
        GridConfigBuilder::default()
            .early_termination(false)
            .debug(true)
            .collect_metrics(true)
            .visualization(true)
            .into_config()
    }

    /// Preset for a named mode; `None` means the grid should be bypassed.
    pub fn for_mode(mode: AccelerationMode) -> Option<Self> {
        match mode {
            AccelerationMode::None => None,
            AccelerationMode::Default => Some(Self::default_preset()),
            AccelerationMode::HighPerformance => Some(Self::high_performance()),
            AccelerationMode::MemoryEfficient => Some(Self::memory_efficient()),
            AccelerationMode::Debug => Some(Self::debug_preset()),
        }
    }

    /// Builder pre-filled with this configuration's values.
    pub fn to_builder(&self) -> GridConfigBuilder {
        GridConfigBuilder {
            resolution_strategy: self.resolution_strategy,
            density_factor: self.density_factor,
            min_resolution: self.min_resolution,
            max_resolution: self.max_resolution,
            sparse_storage: self.sparse_storage,
            max_memory_mb: self.max_memory_mb,
            max_objects_per_voxel: self.max_objects_per_voxel,
            early_termination: self.early_termination,
            deduplication: self.deduplication,
            optimized_traversal: self.optimized_traversal,
            ray_box_optimization: self.ray_box_optimization,
            debug: self.debug,
            collect_metrics: self.collect_metrics,
            visualization: self.visualization,
        }
    }

    /// Re-check the invariants established by [`GridConfigBuilder::build`].
    pub fn validate(&self) -> Result<()> {
        self.to_builder().validate()
    }

    /// Per-axis resolution for a scene with `object_count` finite geometries.
    ///
    /// Automatic mode uses `clamp(ceil(density * cbrt(n)), min, max)` on all
    /// three axes; manual mode returns the configured triple.
    pub fn calculate_optimal_resolution(&self, object_count: usize) -> [u32; 3] {
        match self.resolution_strategy {
            ResolutionStrategy::Manual { x, y, z } => [x, y, z],
            ResolutionStrategy::Automatic => {
                let raw = (self.density_factor * (object_count as f64).cbrt()).ceil();
                let r = raw.clamp(self.min_resolution as f64, self.max_resolution as f64) as u32;
                [r, r, r]
            }
        }
    }

    /// How the resolution is chosen.
    pub fn resolution_strategy(&self) -> ResolutionStrategy {
        self.resolution_strategy
    }

    /// Cells per cube root of the object count, in automatic mode.
    pub fn density_factor(&self) -> f64 {
        self.density_factor
    }

    /// Lower resolution bound.
    pub fn min_resolution(&self) -> u32 {
        self.min_resolution
    }

    /// Upper resolution bound.
    pub fn max_resolution(&self) -> u32 {
        self.max_resolution
    }

    /// Whether voxels live in a packed-key hash map instead of a flat array.
    pub fn sparse_storage(&self) -> bool {
        self.sparse_storage
    }

    /// Memory ceiling for dense storage, in MiB.
    pub fn max_memory_mb(&self) -> u64 {
        self.max_memory_mb
    }

    /// Occupancy above which a voxel is reported as overfull.
    pub fn max_objects_per_voxel(&self) -> usize {
        self.max_objects_per_voxel
    }

    /// Stop closest-hit traversal once no later voxel can hold a closer hit.
    pub fn early_termination(&self) -> bool {
        self.early_termination
    }

    /// Test each geometry at most once per query.
    pub fn deduplication(&self) -> bool {
        self.deduplication
    }

    /// Stop stepping once the ray has left the scene box.
    pub fn optimized_traversal(&self) -> bool {
        self.optimized_traversal
    }

    /// Reject geometry whose bounding box the ray misses before intersecting it.
    pub fn ray_box_optimization(&self) -> bool {
        self.ray_box_optimization
    }

    /// Emit build summaries and per-ray traces through `log`.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Expose per-query statistics.
    pub fn collect_metrics(&self) -> bool {
        self.collect_metrics
    }

    /// Record the visited voxel path of each query.
    pub fn visualization(&self) -> bool {
        self.visualization
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::default_preset()
    }
}

/// Validating builder for [`GridConfig`].
///
/// Deserializable with every field optional, so configuration files only
/// need to name what they change:
///
/// ```toml
/// density_factor = 3.0
/// sparse_storage = true
/// resolution_strategy = { kind = "manual", x = 16, y = 16, z = 8 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfigBuilder {
    resolution_strategy: ResolutionStrategy,
    density_factor: f64,
    min_resolution: u32,
    max_resolution: u32,
    sparse_storage: bool,
    max_memory_mb: u64,
    max_objects_per_voxel: usize,
    early_termination: bool,
    deduplication: bool,
    optimized_traversal: bool,
    ray_box_optimization: bool,
    debug: bool,
    collect_metrics: bool,
    visualization: bool,
}

impl Default for GridConfigBuilder {
    fn default() -> Self {
        Self {
            resolution_strategy: ResolutionStrategy::Automatic,
            density_factor: 2.0,
            min_resolution: 1,
            max_resolution: 128,
            sparse_storage: false,
            max_memory_mb: 512,
            max_objects_per_voxel: 64,
            early_termination: true,
            deduplication: true,
            optimized_traversal: true,
            ray_box_optimization: false,
            debug: false,
            collect_metrics: false,
            visualization: false,
        }
    }
}

impl GridConfigBuilder {
    /// Derive the resolution from the density factor and object count.
    pub fn automatic_resolution(mut self) -> Self {
        self.resolution_strategy = ResolutionStrategy::Automatic;
        self
    }

    /// Use a fixed per-axis resolution.
    pub fn manual_resolution(mut self, x: u32, y: u32, z: u32) -> Self {
        self.resolution_strategy = ResolutionStrategy::Manual { x, y, z };
        self
    }

    /// Set the density factor.
    pub fn density_factor(mut self, density_factor: f64) -> Self {
        self.density_factor = density_factor;
        self
    }

    /// Set the resolution bounds.
    pub fn resolution_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_resolution = min;
        self.max_resolution = max;
        self
    }

    /// Select sparse (hash map) voxel storage.
    pub fn sparse_storage(mut self, sparse: bool) -> Self {
        self.sparse_storage = sparse;
        self
    }

    /// Set the dense-storage memory ceiling in MiB.
    pub fn max_memory_mb(mut self, mb: u64) -> Self {
        self.max_memory_mb = mb;
        self
    }

    /// Set the overfull-voxel threshold.
    pub fn max_objects_per_voxel(mut self, n: usize) -> Self {
        self.max_objects_per_voxel = n;
        self
    }

    /// Toggle early termination of closest-hit queries.
    pub fn early_termination(mut self, on: bool) -> Self {
        self.early_termination = on;
        self
    }

    /// Toggle per-query deduplication of geometry tests.
    pub fn deduplication(mut self, on: bool) -> Self {
        self.deduplication = on;
        self
    }

    /// Toggle clipping traversal to the scene box exit.
    pub fn optimized_traversal(mut self, on: bool) -> Self {
        self.optimized_traversal = on;
        self
    }

    /// Toggle the per-geometry ray/box prefilter.
    pub fn ray_box_optimization(mut self, on: bool) -> Self {
        self.ray_box_optimization = on;
        self
    }

    /// Toggle debug logging.
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    /// Toggle statistics collection.
    pub fn collect_metrics(mut self, on: bool) -> Self {
        self.collect_metrics = on;
        self
    }

    /// Toggle traversal path recording.
    pub fn visualization(mut self, on: bool) -> Self {
        self.visualization = on;
        self
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.density_factor.is_finite() && self.density_factor > 0.0) {
            return Err(GridError::config(format!(
                "density_factor must be positive, got {}",
                self.density_factor
            )));
        }
        if self.max_memory_mb == 0 {
            return Err(GridError::config("max_memory_mb must be positive"));
        }
        if self.max_objects_per_voxel == 0 {
            return Err(GridError::config("max_objects_per_voxel must be positive"));
        }
        if self.min_resolution == 0 {
            return Err(GridError::config("min_resolution must be at least 1"));
        }
        if self.min_resolution >= self.max_resolution {
            return Err(GridError::config(format!(
                "min_resolution ({}) must be less than max_resolution ({})",
                self.min_resolution, self.max_resolution
            )));
        }
        if self.max_resolution > MAX_RESOLUTION {
            return Err(GridError::config(format!(
                "max_resolution ({}) exceeds the limit of {}",
                self.max_resolution, MAX_RESOLUTION
            )));
        }
        if let ResolutionStrategy::Manual { x, y, z } = self.resolution_strategy {
            for (axis, r) in ["x", "y", "z"].into_iter().zip([x, y, z]) {
                if r < self.min_resolution || r > self.max_resolution {
                    return Err(GridError::config(format!(
                        "manual resolution {axis} = {r} outside [{}, {}]",
                        self.min_resolution, self.max_resolution
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<GridConfig> {
        self.validate()?;
        Ok(self.into_config())
    }

    fn into_config(self) -> GridConfig {
        GridConfig {
            resolution_strategy: self.resolution_strategy,
            density_factor: self.density_factor,
            min_resolution: self.min_resolution,
            max_resolution: self.max_resolution,
            sparse_storage: self.sparse_storage,
            max_memory_mb: self.max_memory_mb,
            max_objects_per_voxel: self.max_objects_per_voxel,
            early_termination: self.early_termination,
            deduplication: self.deduplication,
            optimized_traversal: self.optimized_traversal,
            ray_box_optimization: self.ray_box_optimization,
            debug: self.debug,
            collect_metrics: self.collect_metrics,
            visualization: self.visualization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_formula() {
        let config = GridConfig::builder()
            .density_factor(2.0)
            .resolution_bounds(1, 100)
            .build()
            .unwrap();
        assert_eq!(config.calculate_optimal_resolution(8), [4, 4, 4]);
        // ceil(2 * cbrt(9)) = ceil(4.16) = 5
        assert_eq!(config.calculate_optimal_resolution(9), [5, 5, 5]);
    }

    #[test]
    fn test_resolution_clamped() {
        let config = GridConfig::builder()
            .density_factor(2.0)
            .resolution_bounds(2, 10)
            .build()
            .unwrap();
        assert_eq!(config.calculate_optimal_resolution(0), [2, 2, 2]);
        assert_eq!(config.calculate_optimal_resolution(1_000_000), [10, 10, 10]);
    }

    #[test]
    fn test_manual_resolution() {
        let config = GridConfig::builder().manual_resolution(4, 8, 2).build().unwrap();
        assert_eq!(config.calculate_optimal_resolution(1000), [4, 8, 2]);
    }

    #[test]
    fn test_automatic_resolution_restores_formula() {
        let manual = GridConfig::builder()
            .density_factor(2.0)
            .resolution_bounds(1, 100)
            .manual_resolution(4, 8, 2)
            .build()
            .unwrap();
        let auto = manual.to_builder().automatic_resolution().build().unwrap();
        assert_eq!(auto.resolution_strategy(), ResolutionStrategy::Automatic);
        assert_eq!(auto.calculate_optimal_resolution(8), [4, 4, 4]);
        assert_eq!(auto.calculate_optimal_resolution(9), [5, 5, 5]);
    }

    #[test]
    fn test_manual_resolution_out_of_bounds() {
        let err = GridConfig::builder()
            .resolution_bounds(2, 16)
            .manual_resolution(4, 32, 4)
            .build()
            .unwrap_err();
        assert!(matches!(err, GridError::Configuration(_)));
        assert!(GridConfig::builder()
            .resolution_bounds(2, 16)
            .manual_resolution(1, 4, 4)
            .build()
            .is_err());
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(GridConfig::builder().density_factor(0.0).build().is_err());
        assert!(GridConfig::builder().density_factor(-1.0).build().is_err());
        assert!(GridConfig::builder().density_factor(f64::NAN).build().is_err());
        assert!(GridConfig::builder().max_memory_mb(0).build().is_err());
        assert!(GridConfig::builder().max_objects_per_voxel(0).build().is_err());
        assert!(GridConfig::builder().resolution_bounds(8, 8).build().is_err());
        assert!(GridConfig::builder().resolution_bounds(9, 8).build().is_err());
        assert!(GridConfig::builder().resolution_bounds(0, 8).build().is_err());
        assert!(GridConfig::builder()
            .resolution_bounds(1, MAX_RESOLUTION + 1)
            .build()
            .is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        for mode in AccelerationMode::ALL {
            match GridConfig::for_mode(mode) {
                Some(config) => config.validate().unwrap(),
                None => assert_eq!(mode, AccelerationMode::None),
            }
        }
        assert!(GridConfig::memory_efficient().sparse_storage());
        assert!(GridConfig::high_performance().ray_box_optimization());
        let debug = GridConfig::debug_preset();
        assert!(debug.debug() && debug.collect_metrics() && debug.visualization());
        assert_eq!(GridConfig::default(), GridConfig::default_preset());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("none".parse::<AccelerationMode>().unwrap(), AccelerationMode::None);
        assert_eq!(
            "High_Performance".parse::<AccelerationMode>().unwrap(),
            AccelerationMode::HighPerformance
        );
        for mode in AccelerationMode::ALL {
            assert_eq!(mode.to_string().parse::<AccelerationMode>().unwrap(), mode);
        }
        assert!("octree".parse::<AccelerationMode>().is_err());
    }

    #[test]
    fn test_to_builder_round_trip() {
        let config = GridConfig::high_performance();
        assert_eq!(config.to_builder().build().unwrap(), config);
    }

    #[test]
    fn test_builder_from_toml() {
        let builder: GridConfigBuilder = toml::from_str(
            r#"
            density_factor = 3.0
            sparse_storage = true
            resolution_strategy = { kind = "manual", x = 16, y = 16, z = 8 }
            "#,
        )
        .unwrap();
        let config = builder.build().unwrap();
        assert_eq!(config.density_factor(), 3.0);
        assert!(config.sparse_storage());
        assert_eq!(config.calculate_optimal_resolution(1), [16, 16, 8]);
        // Unspecified fields keep their defaults.
        assert!(config.deduplication());
    }

    #[test]
    fn test_builder_rejects_unknown_field() {
        let parsed: std::result::Result<GridConfigBuilder, _> = toml::from_str("octree = true");
        assert!(parsed.is_err());
    }
}

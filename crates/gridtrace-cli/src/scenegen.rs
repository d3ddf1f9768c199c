//! Deterministic procedural scenes for benchmarking.

use gridtrace_scene::{SceneDescription, ShapeDescription};

/// 64-bit linear congruential generator (Knuth's MMIX constants).
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed ^ 0x9e37_79b9_7f4a_7c15)
    }

    /// Uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Spheres scattered through a cube whose side grows with the count, so the
/// density stays roughly constant. Optionally adds a ground plane below.
pub fn sphere_field(count: usize, seed: u64, ground_plane: bool) -> SceneDescription {
    let mut rng = Lcg::new(seed);
    let half = (count as f64).cbrt().max(1.0) * 2.0;

    let mut shapes: Vec<ShapeDescription> = (0..count)
        .map(|_| ShapeDescription::Sphere {
            center: [
                rng.range(-half, half),
                rng.range(-half, half),
                rng.range(-half, half),
            ],
            radius: rng.range(0.1, 0.6),
        })
        .collect();

    if ground_plane {
        shapes.push(ShapeDescription::Plane {
            point: [0.0, 0.0, -half - 1.0],
            normal: [0.0, 0.0, 1.0],
        });
    }

    SceneDescription { shapes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_scene() {
        assert_eq!(sphere_field(50, 7, true), sphere_field(50, 7, true));
        assert_ne!(sphere_field(50, 7, false), sphere_field(50, 8, false));
    }

    #[test]
    fn test_field_is_valid_scene() {
        let desc = sphere_field(100, 1, true);
        assert_eq!(desc.shapes.len(), 101);
        let scene = desc.to_scene().unwrap();
        assert_eq!(scene.finite_ids().count(), 100);
        assert_eq!(scene.infinite_ids().count(), 1);
    }

    #[test]
    fn test_samples_in_unit_interval() {
        let mut rng = Lcg::new(0);
        for _ in 0..1000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }
}

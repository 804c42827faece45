//! Normal and foam derivation from the spatial height, slope and displacement fields.
//!
//! The rendered surface point of texel `(x, z)` is
//! `(x + c·Dx, w·h, z + c·Dz)` for choppiness `c` and wave height `w`. The
//! normal is the cross product of that surface's two tangents, so horizontal
//! compression under high choppiness steepens the normal the same way it
//! steepens the rendered crest.

use glam::Vec3;

use super::field::SpatialField;

/// Periodic 5-point Laplacian of `h` at `(x, y)`, in texel units
pub fn laplacian(h: &SpatialField, x: u32, y: u32) -> f32 {
    let (x, y) = (x as i64, y as i64);
    h.get_wrapped(x + 1, y) + h.get_wrapped(x - 1, y) + h.get_wrapped(x, y + 1)
        + h.get_wrapped(x, y - 1)
        - 4.0 * h.get_wrapped(x, y)
}

/// Horizontal displacement derivatives per meter
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplacementGradient {
    pub dx_dx: f32,
    pub dx_dz: f32,
    pub dz_dx: f32,
    pub dz_dz: f32,
}

impl DisplacementGradient {
    /// Periodic central differences of `Dx` and `Dz` at `(x, y)`
    pub fn at(
        displacement_x: &SpatialField,
        displacement_z: &SpatialField,
        x: u32,
        y: u32,
        texel_size_m: f32,
    ) -> Self {
        let (x, y) = (x as i64, y as i64);
        let span = 2.0 * texel_size_m;
        let along_x = |f: &SpatialField| (f.get_wrapped(x + 1, y) - f.get_wrapped(x - 1, y)) / span;
        let along_z = |f: &SpatialField| (f.get_wrapped(x, y + 1) - f.get_wrapped(x, y - 1)) / span;
        Self {
            dx_dx: along_x(displacement_x),
            dx_dz: along_z(displacement_x),
            dz_dx: along_x(displacement_z),
            dz_dz: along_z(displacement_z),
        }
    }
}

/// Normal of the displaced surface for the given slopes and displacement gradient
pub fn surface_normal(
    slope_x: f32,
    slope_z: f32,
    gradient: &DisplacementGradient,
    choppiness: f32,
    wave_height: f32,
) -> Vec3 {
    let tangent_x = Vec3::new(
        1.0 + choppiness * gradient.dx_dx,
        wave_height * slope_x,
        choppiness * gradient.dz_dx,
    );
    let tangent_z = Vec3::new(
        choppiness * gradient.dx_dz,
        wave_height * slope_z,
        1.0 + choppiness * gradient.dz_dz,
    );
    tangent_z.cross(tangent_x).try_normalize().unwrap_or(Vec3::Y)
}

/// Foam coverage: pinched crests (negative curvature) foam up
pub fn foam(curvature: f32, choppiness: f32, wave_height: f32) -> f32 {
    (-choppiness * wave_height * curvature).clamp(0.0, 1.0)
}

/// Spatial fields the normal map is derived from
pub struct NormalInputs<'a> {
    pub height: &'a SpatialField,
    pub slope_x: &'a SpatialField,
    pub slope_z: &'a SpatialField,
    pub displacement_x: &'a SpatialField,
    pub displacement_z: &'a SpatialField,
}

/// Per-texel `(nx, ny, nz, foam)`
pub fn derive_normal_map(
    inputs: &NormalInputs<'_>,
    choppiness: f32,
    wave_height: f32,
    texel_size_m: f32,
) -> Vec<[f32; 4]> {
    let n = inputs.height.resolution();
    let mut texels = Vec::with_capacity((n as usize).pow(2));
    for y in 0..n {
        for x in 0..n {
            let gradient = DisplacementGradient::at(
                inputs.displacement_x,
                inputs.displacement_z,
                x,
                y,
                texel_size_m,
            );
            let normal = surface_normal(
                inputs.slope_x.get(x, y),
                inputs.slope_z.get(x, y),
                &gradient,
                choppiness,
                wave_height,
            );
            let foam = foam(laplacian(inputs.height, x, y), choppiness, wave_height);
            texels.push([normal.x, normal.y, normal.z, foam]);
        }
    }
    texels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One sinusoidal swell along X with its matching slope and choppy displacement
    fn swell(n: u32, texel_size_m: f32) -> [SpatialField; 3] {
        let mut height = SpatialField::zeros(n);
        let mut slope_x = SpatialField::zeros(n);
        let mut displacement_x = SpatialField::zeros(n);
        let k = 2.0 * std::f32::consts::PI / (n as f32 * texel_size_m);
        for y in 0..n {
            for x in 0..n {
                let phase = k * x as f32 * texel_size_m;
                height.set(x, y, phase.cos());
                slope_x.set(x, y, -k * phase.sin());
                displacement_x.set(x, y, -phase.sin());
            }
        }
        [height, slope_x, displacement_x]
    }

    #[test]
    fn test_flat_sea_points_up_without_foam() {
        let flat = SpatialField::zeros(8);
        let inputs = NormalInputs {
            height: &flat,
            slope_x: &flat,
            slope_z: &flat,
            displacement_x: &flat,
            displacement_z: &flat,
        };
        for t in derive_normal_map(&inputs, 5.0, 1.0, 2.0) {
            assert_eq!(t, [0.0, 1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_normal_tilts_against_slope() {
        let n = surface_normal(1.0, 0.0, &DisplacementGradient::default(), 1.0, 1.0);
        assert!(n.x < 0.0 && n.y > 0.0 && n.z.abs() < 1e-6);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_without_displacement_choppiness_is_irrelevant() {
        let flat = DisplacementGradient::default();
        let calm = surface_normal(0.3, -0.2, &flat, 1.0, 2.0);
        let choppy = surface_normal(0.3, -0.2, &flat, 20.0, 2.0);
        assert!((calm - choppy).length() < 1e-6);
        let expected = Vec3::new(-0.6, 1.0, 0.4).normalize();
        assert!((calm - expected).length() < 1e-6);
    }

    #[test]
    fn test_compression_steepens_normal() {
        let compressed = DisplacementGradient {
            dx_dx: -0.05,
            ..Default::default()
        };
        let steepness = |choppiness: f32| {
            let n = surface_normal(0.3, 0.0, &compressed, choppiness, 1.0);
            assert!((n.length() - 1.0).abs() < 1e-5);
            n.x.abs() / n.y
        };
        assert!(steepness(10.0) > steepness(1.0));
    }

    #[test]
    fn test_choppiness_changes_normals() {
        let n = 32;
        let texel_size_m = 1.0;
        let [height, slope_x, displacement_x] = swell(n, texel_size_m);
        let flat = SpatialField::zeros(n);
        let inputs = NormalInputs {
            height: &height,
            slope_x: &slope_x,
            slope_z: &flat,
            displacement_x: &displacement_x,
            displacement_z: &flat,
        };
        let gentle = derive_normal_map(&inputs, 1.0, 1.0, texel_size_m);
        let choppy = derive_normal_map(&inputs, 4.0, 1.0, texel_size_m);

        let largest_change = gentle
            .iter()
            .zip(&choppy)
            .map(|(a, b)| (0..3).map(|c| (a[c] - b[c]).abs()).fold(0.0f32, f32::max))
            .fold(0.0f32, f32::max);
        assert!(largest_change > 1e-2, "normals barely moved: {largest_change}");
        assert!(choppy.iter().all(|t| t[1] > 0.0 && t[2].abs() < 1e-6));
    }

    #[test]
    fn test_gradient_uses_central_differences() {
        let mut dx = SpatialField::zeros(4);
        dx.set(1, 0, 3.0);
        dx.set(3, 0, 1.0);
        let dz = SpatialField::zeros(4);
        let g = DisplacementGradient::at(&dx, &dz, 0, 0, 0.5);
        assert_eq!(g.dx_dx, 2.0);
        assert_eq!(g.dx_dz, 0.0);
        assert_eq!(g.dz_dz, 0.0);
    }

    #[test]
    fn test_crest_gets_foam_trough_does_not() {
        let mut h = SpatialField::zeros(8);
        h.set(3, 3, 1.0);
        assert!(laplacian(&h, 3, 3) < 0.0);
        assert_eq!(foam(laplacian(&h, 3, 3), 5.0, 1.0), 1.0);

        let mut trough = SpatialField::zeros(8);
        trough.set(3, 3, -1.0);
        assert_eq!(foam(laplacian(&trough, 3, 3), 5.0, 1.0), 0.0);
    }

    #[test]
    fn test_laplacian_wraps_at_edges() {
        let mut h = SpatialField::zeros(4);
        h.set(3, 0, 2.0);
        assert_eq!(laplacian(&h, 0, 0), 2.0);
    }
}

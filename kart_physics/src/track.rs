//! Track surface queries.
//!
//! The authoritative track geometry lives outside this crate; controllers only
//! need the height and surface kind beneath a world position.

use crate::types::Vec3;

/// Surface kind beneath a kart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Surface {
    #[default]
    Road,
    /// Grass, sand, gravel: slows karts and ends slides.
    Offroad,
}

/// Answers "how high is the track under this point".
pub trait TrackHeightProvider {
    fn height_at(&self, position: &Vec3) -> f32;

    fn surface_at(&self, _position: &Vec3) -> Surface {
        Surface::Road
    }
}

/// Any `Fn(&Vec3) -> f32` is a road-only height provider.
impl<F> TrackHeightProvider for F
where
    F: Fn(&Vec3) -> f32,
{
    fn height_at(&self, position: &Vec3) -> f32 {
        self(position)
    }
}

/// Infinite flat road.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTrack {
    pub height: f32,
}

impl TrackHeightProvider for FlatTrack {
    fn height_at(&self, _position: &Vec3) -> f32 {
        self.height
    }
}

/// Axis-aligned rectangular piece of track with a planar (possibly sloped) surface.
#[derive(Clone, Copy, Debug)]
pub struct TrackPatch {
    /// Minimum (x, z) corner.
    pub min: [f32; 2],
    /// Maximum (x, z) corner.
    pub max: [f32; 2],
    /// Height at the minimum corner.
    pub base_height: f32,
    /// Height change per meter along x and z.
    pub gradient: [f32; 2],
    pub surface: Surface,
}

impl TrackPatch {
    pub fn flat(min: [f32; 2], max: [f32; 2], height: f32) -> Self {
        Self {
            min,
            max,
            base_height: height,
            gradient: [0.0, 0.0],
            surface: Surface::Road,
        }
    }

    pub fn with_gradient(mut self, gradient: [f32; 2]) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    pub fn contains(&self, position: &Vec3) -> bool {
        (self.min[0]..=self.max[0]).contains(&position.x)
            && (self.min[1]..=self.max[1]).contains(&position.z)
    }

    pub fn height_at(&self, position: &Vec3) -> f32 {
        self.base_height
            + (position.x - self.min[0]) * self.gradient[0]
            + (position.z - self.min[1]) * self.gradient[1]
    }
}

/// Track assembled from patches. The first patch containing a point wins;
/// points outside every patch are offroad at `fallback_height`.
#[derive(Clone, Debug, Default)]
pub struct PatchTrack {
    pub patches: Vec<TrackPatch>,
    pub fallback_height: f32,
}

impl PatchTrack {
    pub fn new(fallback_height: f32) -> Self {
        Self {
            patches: Vec::new(),
            fallback_height,
        }
    }

    pub fn with_patch(mut self, patch: TrackPatch) -> Self {
        self.patches.push(patch);
        self
    }

    fn patch_at(&self, position: &Vec3) -> Option<&TrackPatch> {
        self.patches.iter().find(|p| p.contains(position))
    }
}

impl TrackHeightProvider for PatchTrack {
    fn height_at(&self, position: &Vec3) -> f32 {
        self.patch_at(position)
            .map(|p| p.height_at(position))
            .unwrap_or(self.fallback_height)
    }

    fn surface_at(&self, position: &Vec3) -> Surface {
        self.patch_at(position)
            .map(|p| p.surface)
            .unwrap_or(Surface::Offroad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches_resolve_height_and_surface() {
        let track = PatchTrack::new(-1.0)
            .with_patch(TrackPatch::flat([0.0, 0.0], [10.0, 10.0], 0.0).with_gradient([0.0, 0.5]))
            .with_patch(
                TrackPatch::flat([10.0, 0.0], [20.0, 10.0], 2.0).with_surface(Surface::Offroad),
            );

        let on_ramp = Vec3::new(5.0, 0.0, 4.0);
        assert!((track.height_at(&on_ramp) - 2.0).abs() < 1.0e-6);
        assert_eq!(track.surface_at(&on_ramp), Surface::Road);

        let grass = Vec3::new(15.0, 0.0, 1.0);
        assert_eq!(track.height_at(&grass), 2.0);
        assert_eq!(track.surface_at(&grass), Surface::Offroad);

        let void = Vec3::new(-5.0, 0.0, -5.0);
        assert_eq!(track.height_at(&void), -1.0);
        assert_eq!(track.surface_at(&void), Surface::Offroad);
    }

    #[test]
    fn closures_are_road_only_providers() {
        let bumpy = |p: &Vec3| p.x * 0.1;
        assert!((bumpy.height_at(&Vec3::new(10.0, 0.0, 0.0)) - 1.0).abs() < 1.0e-6);
        assert_eq!(bumpy.surface_at(&Vec3::zeros()), Surface::Road);
    }
}

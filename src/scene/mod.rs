mod decoration;

pub use decoration::{
    cycled_hue, decoration_color, Decoration, DecorationId, DecorationParams, GlowMarker, Shape,
    WireBox,
};

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use slotmap::SlotMap;
use tracing::debug;

use crate::error::Result;
use crate::geometry::ClosedSpline;
use crate::math::Rgb;
use crate::rig::Sampling;
use crate::tessellation::{Polyline, TessellateCurve, TessellateTube, TriangleMesh, TubeParams};

/// Curve that maps HDR scene colors into displayable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToneMapping {
    /// Clamp without a curve.
    None,
    /// ACES filmic approximation.
    #[default]
    AcesFilmic,
}

/// Encoding of the final framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    /// Linear values written as-is.
    Linear,
    /// sRGB transfer function applied on output.
    #[default]
    Srgb,
}

/// Fog, bloom and output settings handed to the renderer untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostFx {
    /// Fog and clear color.
    pub fog_color: Rgb,
    /// Exponential-squared fog density.
    pub fog_density: f64,
    /// Bloom intensity multiplier.
    pub bloom_strength: f64,
    /// Bloom blur spread.
    pub bloom_radius: f64,
    /// Luminance above which pixels bloom.
    pub bloom_threshold: f64,
    /// Tone curve applied before output.
    pub tone_mapping: ToneMapping,
    /// Framebuffer encoding.
    pub output_color_space: ColorSpace,
}

impl Default for PostFx {
    fn default() -> Self {
        Self {
            fog_color: Rgb::default(),
            fog_density: 0.3,
            bloom_strength: 3.5,
            bloom_radius: 0.0,
            bloom_threshold: 0.002,
            tone_mapping: ToneMapping::AcesFilmic,
            output_color_space: ColorSpace::Srgb,
        }
    }
}

/// Everything needed to build a [`Scene`] from a path.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneParams {
    /// Tube mesh shape.
    pub tube: TubeParams,
    /// Segments of the centerline polyline.
    pub centerline_divisions: usize,
    /// Boxes and markers scattered along the path.
    pub decorations: DecorationParams,
    /// Renderer post-processing.
    pub post: PostFx,
    /// Must match the rig's sampling so the camera stays centered in the tube.
    pub sampling: Sampling,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            tube: TubeParams::default(),
            centerline_divisions: 100,
            decorations: DecorationParams::default(),
            post: PostFx::default(),
            sampling: Sampling::Parametric,
        }
    }
}

/// Static geometry of the fly-through, built once from the shared path.
///
/// Only decoration colors change after construction.
#[derive(Debug)]
pub struct Scene {
    path: Arc<ClosedSpline>,
    tube: TriangleMesh,
    tube_edges: Vec<[u32; 2]>,
    centerline: Polyline,
    decorations: SlotMap<DecorationId, Decoration>,
    params: SceneParams,
}

impl Scene {
    /// Builds the tube, its wireframe, the centerline and the decorations.
    ///
    /// The same `seed` always places the decorations identically; without
    /// one they come from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if any tube, centerline or decoration parameter is
    /// invalid, or the path has a degenerate tangent.
    pub fn build(path: Arc<ClosedSpline>, params: SceneParams, seed: Option<u64>) -> Result<Self> {
        params.decorations.validate()?;

        let tessellate = TessellateTube::new(params.tube);
        let tube = match params.sampling {
            Sampling::Parametric => tessellate.execute(&*path)?,
            Sampling::ArcLength => tessellate.execute(&path.by_arc_length())?,
        };
        let tube_edges = tube.unique_edges();
        let centerline = TessellateCurve::new(params.centerline_divisions).execute(&*path)?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut decorations = SlotMap::with_key();
        for d in decoration::scatter(&path, params.sampling, &params.decorations, &mut rng) {
            decorations.insert(d);
        }

        debug!(
            tube_vertices = tube.vertices.len(),
            tube_edges = tube_edges.len(),
            decorations = decorations.len(),
            ?seed,
            "built scene"
        );

        Ok(Self {
            path,
            tube,
            tube_edges,
            centerline,
            decorations,
            params,
        })
    }

    /// Returns the path shared with the flight rig.
    #[must_use]
    pub fn path(&self) -> &Arc<ClosedSpline> {
        &self.path
    }

    /// Returns the tube mesh.
    #[must_use]
    pub fn tube(&self) -> &TriangleMesh {
        &self.tube
    }

    /// Returns the tube's wireframe edges as vertex index pairs.
    #[must_use]
    pub fn tube_edges(&self) -> &[[u32; 2]] {
        &self.tube_edges
    }

    /// Returns the sampled centerline.
    #[must_use]
    pub fn centerline(&self) -> &Polyline {
        &self.centerline
    }

    /// Returns the build settings.
    #[must_use]
    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    /// Returns the post-processing settings.
    #[must_use]
    pub fn post(&self) -> &PostFx {
        &self.params.post
    }

    /// Iterates over all decorations.
    pub fn decorations(&self) -> impl Iterator<Item = (DecorationId, &Decoration)> {
        self.decorations.iter()
    }

    /// Returns a single decoration.
    #[must_use]
    pub fn decoration(&self, id: DecorationId) -> Option<&Decoration> {
        self.decorations.get(id)
    }

    /// Adds a decoration and returns its handle.
    pub fn insert_decoration(&mut self, decoration: Decoration) -> DecorationId {
        self.decorations.insert(decoration)
    }

    /// Removes a decoration.
    pub fn remove_decoration(&mut self, id: DecorationId) -> Option<Decoration> {
        self.decorations.remove(id)
    }

    /// Recolors every decoration for the given elapsed time.
    pub fn cycle_hues(&mut self, elapsed_ms: f64) {
        let params = self.params.decorations;
        for d in self.decorations.values_mut() {
            d.color = decoration_color(&params, d.base_hue, elapsed_ms);
        }
    }
}

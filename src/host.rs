//! The per-frame driver that ties the rig, the scene and a renderer together.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{ConfigError, RenderError, Result};
use crate::math::{Matrix4, Vector3};
use crate::rig::{CameraPose, FlightRig};
use crate::scene::Scene;

/// World up direction used for camera orientation.
pub const WORLD_UP: Vector3 = Vector3::new(0.0, 1.0, 0.0);

/// Output surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a viewport.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidViewport`] if either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport { width, height }.into());
        }
        Ok(Self { width, height })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Perspective projection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LensSettings"))]
pub struct Lens {
    fov_y_degrees: f64,
    near: f64,
    far: f64,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Lens {
    /// Creates a lens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParameterOutOfRange`] unless
    /// `0 < fov_y_degrees < 180` and `0 < near < far`.
    pub fn new(fov_y_degrees: f64, near: f64, far: f64) -> Result<Self> {
        if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
            return Err(ConfigError::ParameterOutOfRange {
                parameter: "fov_y_degrees",
                value: fov_y_degrees,
                min: 0.0,
                max: 180.0,
            }
            .into());
        }
        if !(near > 0.0 && near.is_finite()) {
            return Err(ConfigError::ParameterOutOfRange {
                parameter: "near",
                value: near,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            }
            .into());
        }
        if !(far > near && far.is_finite()) {
            return Err(ConfigError::ParameterOutOfRange {
                parameter: "far",
                value: far,
                min: near,
                max: f64::MAX,
            }
            .into());
        }
        Ok(Self {
            fov_y_degrees,
            near,
            far,
        })
    }

    /// Vertical field of view in degrees.
    #[must_use]
    pub fn fov_y_degrees(&self) -> f64 {
        self.fov_y_degrees
    }

    /// Near clipping distance.
    #[must_use]
    pub fn near(&self) -> f64 {
        self.near
    }

    /// Far clipping distance.
    #[must_use]
    pub fn far(&self) -> f64 {
        self.far
    }

    /// OpenGL-style projection matrix for the viewport's aspect ratio.
    #[must_use]
    pub fn projection(&self, viewport: Viewport) -> Matrix4 {
        nalgebra::Perspective3::new(
            viewport.aspect(),
            self.fov_y_degrees.to_radians(),
            self.near,
            self.far,
        )
        .to_homogeneous()
    }
}

/// Unchecked lens fields as read from a config file.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct LensSettings {
    fov_y_degrees: f64,
    near: f64,
    far: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<LensSettings> for Lens {
    type Error = crate::error::TubeflightError;

    fn try_from(settings: LensSettings) -> Result<Self> {
        Self::new(settings.fov_y_degrees, settings.near, settings.far)
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Static geometry with this frame's decoration colors.
    pub scene: &'a Scene,
    /// Camera for this frame.
    pub pose: CameraPose,
    /// Host clock in milliseconds.
    pub elapsed_ms: f64,
    /// Output size.
    pub viewport: Viewport,
    /// Projection settings.
    pub lens: Lens,
    /// Zero-based frame counter.
    pub index: u64,
}

impl Frame<'_> {
    /// World-to-camera matrix of this frame.
    ///
    /// # Errors
    ///
    /// Fails if the pose has no usable direction.
    pub fn view_matrix(&self) -> Result<Matrix4> {
        self.pose.view_matrix(&WORLD_UP)
    }

    /// Projection matrix of this frame.
    #[must_use]
    pub fn projection_matrix(&self) -> Matrix4 {
        self.lens.projection(self.viewport)
    }
}

/// A graphics backend that can draw a [`Frame`].
pub trait Renderer {
    /// Called when the output surface changes size.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot adapt to the new size.
    fn resize(&mut self, viewport: Viewport) -> Result<()> {
        let _ = viewport;
        Ok(())
    }

    /// Draws and presents one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails.
    fn render(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Host animation loop: one [`frame`](Self::frame) call per displayed frame.
#[derive(Debug)]
pub struct FlightLoop<R> {
    scene: Scene,
    rig: FlightRig,
    renderer: R,
    viewport: Viewport,
    lens: Lens,
    frames: u64,
}

impl<R: Renderer> FlightLoop<R> {
    /// Creates a loop over a built scene and a rig on the same path.
    pub fn new(scene: Scene, rig: FlightRig, renderer: R, viewport: Viewport) -> Self {
        if !Arc::ptr_eq(scene.path(), rig.path()) {
            warn!("flight rig and scene use different paths; the camera may leave the tube");
        }
        debug!(
            width = viewport.width(),
            height = viewport.height(),
            "flight loop created"
        );
        Self {
            scene,
            rig,
            renderer,
            viewport,
            lens: Lens::default(),
            frames: 0,
        }
    }

    /// Replaces the projection settings.
    #[must_use]
    pub fn with_lens(mut self, lens: Lens) -> Self {
        self.lens = lens;
        self
    }

    /// Advances to `elapsed_ms`: poses the camera, recolors decorations and
    /// renders. Returns the pose that was rendered.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures. The frame counter only advances on
    /// success.
    pub fn frame(&mut self, elapsed_ms: f64) -> Result<CameraPose> {
        let pose = self.rig.update(elapsed_ms);
        self.scene.cycle_hues(elapsed_ms);

        let frame = Frame {
            scene: &self.scene,
            pose,
            elapsed_ms,
            viewport: self.viewport,
            lens: self.lens,
            index: self.frames,
        };
        self.renderer.render(&frame)?;
        self.frames += 1;

        trace!(index = frame.index, elapsed_ms, "frame rendered");
        Ok(pose)
    }

    /// Updates the viewport and notifies the renderer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidViewport`] for a zero size (the old
    /// viewport is kept), or the renderer's resize error.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let viewport = Viewport::new(width, height)?;
        self.viewport = viewport;
        debug!(width, height, "viewport resized");
        self.renderer.resize(viewport)
    }

    /// Returns the scene being flown through.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the camera rig.
    #[must_use]
    pub fn rig(&self) -> &FlightRig {
        &self.rig
    }

    /// Mutable rig access, e.g. to reconfigure timing mid-flight.
    pub fn rig_mut(&mut self) -> &mut FlightRig {
        &mut self.rig
    }

    /// Returns the renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Returns the current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Consumes the loop and hands back the renderer.
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TubeflightError;
    use crate::math::{Point3, Rgb};
    use crate::operations::creation::PathGenerator;
    use crate::scene::{DecorationParams, SceneParams};
    use crate::tessellation::TubeParams;
    use approx::assert_relative_eq;

    #[derive(Debug, Default)]
    struct Recorder {
        positions: Vec<Point3>,
        first_colors: Vec<Rgb>,
        sizes: Vec<Viewport>,
        fail_at: Option<u64>,
    }

    impl Renderer for Recorder {
        fn resize(&mut self, viewport: Viewport) -> Result<()> {
            self.sizes.push(viewport);
            Ok(())
        }

        fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
            if self.fail_at == Some(frame.index) {
                return Err(RenderError::Backend("device lost".into()).into());
            }
            frame.view_matrix()?;
            self.positions.push(frame.pose.position);
            let (_, d) = frame.scene.decorations().next().unwrap();
            self.first_colors.push(d.color);
            Ok(())
        }
    }

    fn flight(renderer: Recorder) -> FlightLoop<Recorder> {
        let path = Arc::new(PathGenerator::new(10, 5.0).with_seed(42).generate().unwrap());
        let params = SceneParams {
            tube: TubeParams {
                tubular_segments: 32,
                radial_segments: 6,
                ..TubeParams::default()
            },
            decorations: DecorationParams {
                box_count: 3,
                marker_count: 1,
                ..DecorationParams::default()
            },
            ..SceneParams::default()
        };
        let scene = Scene::build(Arc::clone(&path), params, Some(42)).unwrap();
        let rig = FlightRig::new(path);
        FlightLoop::new(scene, rig, renderer, Viewport::new(1280, 720).unwrap())
    }

    #[test]
    fn viewport_rejects_zero() {
        assert!(matches!(
            Viewport::new(0, 10),
            Err(TubeflightError::Render(RenderError::InvalidViewport { width: 0, height: 10 }))
        ));
        assert_relative_eq!(Viewport::new(200, 100).unwrap().aspect(), 2.0);
    }

    #[test]
    fn lens_validation() {
        assert!(Lens::new(0.0, 0.1, 10.0).is_err());
        assert!(Lens::new(75.0, 0.0, 10.0).is_err());
        assert!(Lens::new(75.0, 1.0, 1.0).is_err());
        let lens = Lens::new(90.0, 0.5, 50.0).unwrap();
        assert_relative_eq!(lens.far(), 50.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_lens_is_validated() {
        let bad = LensSettings {
            fov_y_degrees: 75.0,
            near: 5.0,
            far: 1.0,
        };
        assert!(matches!(
            Lens::try_from(bad),
            Err(TubeflightError::InvalidConfiguration(_))
        ));
        let good = LensSettings {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        };
        assert_eq!(Lens::try_from(good).unwrap(), Lens::default());
    }

    #[test]
    fn projection_uses_aspect() {
        let lens = Lens::default();
        let m = lens.projection(Viewport::new(200, 100).unwrap());
        // m[(1,1)] / m[(0,0)] equals the aspect ratio
        assert_relative_eq!(m[(1, 1)] / m[(0, 0)], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn renders_once_per_frame() {
        let mut l = flight(Recorder::default());
        let a = l.frame(0.0).unwrap();
        l.frame(16.0).unwrap();
        let c = l.frame(8000.0).unwrap();
        assert_eq!(l.frame_count(), 3);
        assert_eq!(a, c);
        let rec = l.into_renderer();
        assert_eq!(rec.positions.len(), 3);
        assert_eq!(rec.positions[0], rec.positions[2]);
    }

    #[test]
    fn colors_change_over_time() {
        let mut l = flight(Recorder::default());
        l.frame(0.0).unwrap();
        l.frame(2500.0).unwrap();
        let rec = l.renderer();
        assert_ne!(rec.first_colors[0], rec.first_colors[1]);
    }

    #[test]
    fn renderer_error_propagates_and_counter_holds() {
        let mut l = flight(Recorder {
            fail_at: Some(1),
            ..Recorder::default()
        });
        l.frame(0.0).unwrap();
        let err = l.frame(10.0).unwrap_err();
        assert!(matches!(err, TubeflightError::Render(RenderError::Backend(_))));
        assert_eq!(l.frame_count(), 1);
    }

    #[test]
    fn resize_updates_viewport_and_notifies() {
        let mut l = flight(Recorder::default());
        l.resize(800, 600).unwrap();
        assert!(l.resize(0, 600).is_err());
        assert_eq!(l.viewport(), Viewport::new(800, 600).unwrap());
        assert_eq!(l.renderer().sizes.len(), 1);
    }

    #[test]
    fn rig_can_be_reconfigured_mid_flight() {
        let mut l = flight(Recorder::default());
        l.rig_mut().configure(1000.0, 0.05).unwrap();
        let a = l.frame(250.0).unwrap();
        let b = l.frame(1250.0).unwrap();
        assert_eq!(a, b);
        assert_relative_eq!(a.parameter, 0.25);
    }
}

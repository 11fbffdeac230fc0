//! Flies the camera around a generated tunnel without a window, logging
//! what a real renderer would draw.
//!
//! ```sh
//! RUST_LOG=tubeflight=debug,headless=info cargo run --example headless
//! ```

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use tubeflight::host::{Frame, Renderer, Viewport};
use tubeflight::scene::Shape;
use tubeflight::{FlightLoop, FlightRig, PathGenerator, Scene, SceneParams};

/// Stands in for a GPU backend: counts primitives and logs the camera.
struct LogRenderer;

impl Renderer for LogRenderer {
    fn resize(&mut self, viewport: Viewport) -> tubeflight::Result<()> {
        info!(aspect = viewport.aspect(), "resize");
        Ok(())
    }

    fn render(&mut self, frame: &Frame<'_>) -> tubeflight::Result<()> {
        let boxes = frame
            .scene
            .decorations()
            .filter(|(_, d)| matches!(d.shape, Shape::WireBox(_)))
            .count();
        let p = frame.pose.position;
        info!(
            frame = frame.index,
            t = frame.elapsed_ms,
            progress = format!("{:.3}", frame.pose.parameter),
            position = format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z),
            tube_edges = frame.scene.tube_edges().len(),
            boxes,
            "draw"
        );
        Ok(())
    }
}

fn main() -> tubeflight::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = Arc::new(PathGenerator::new(10, 5.0).with_seed(42).generate()?);
    let scene = Scene::build(Arc::clone(&path), SceneParams::default(), Some(42))?;
    let rig = FlightRig::new(path);

    let mut flight = FlightLoop::new(scene, rig, LogRenderer, Viewport::new(1280, 720)?);
    flight.resize(1920, 1080)?;

    // one loop at 20 frames per simulated second
    let mut t = 0.0;
    while t <= 8000.0 {
        flight.frame(t)?;
        t += 50.0;
    }
    info!(frames = flight.frame_count(), "done");
    Ok(())
}

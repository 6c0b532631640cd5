//! Raster snapshot of a rendered surface.

use std::io::Cursor;
use std::sync::Arc;

use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_model::SurfaceRef;

/// Pixels of a rendered surface, tightly packed RGBA8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Rendering collaborator that can rasterize an on-screen region.
#[async_trait::async_trait]
pub trait SurfaceRenderer: Send + Sync {
    /// Render the surface named by `surface` at its current state.
    async fn rasterize(&self, surface: &SurfaceRef) -> FleetdashResult<RasterFrame>;

    /// Renderer name for logging.
    fn name(&self) -> &str;
}

/// Turns a surface reference into PNG bytes.
#[derive(Clone)]
pub struct SnapshotCapturer {
    renderer: Arc<dyn SurfaceRenderer>,
}

impl SnapshotCapturer {
    pub fn new(renderer: Arc<dyn SurfaceRenderer>) -> Self {
        Self { renderer }
    }

    /// Capture `surface` as PNG.
    ///
    /// Fails with [`FleetdashError::MissingSurface`] without touching the
    /// renderer when no surface is given.
    pub async fn capture(&self, surface: Option<&SurfaceRef>) -> FleetdashResult<Vec<u8>> {
        let surface = surface.ok_or(FleetdashError::MissingSurface)?;
        tracing::debug!(surface = %surface, renderer = self.renderer.name(), "Rasterizing surface");

        let frame = self.renderer.rasterize(surface).await?;
        encode_png(frame)
    }
}

/// Encode a frame as PNG, unchanged in size and content.
pub fn encode_png(frame: RasterFrame) -> FleetdashResult<Vec<u8>> {
    let RasterFrame {
        width,
        height,
        rgba,
    } = frame;
    if width == 0 || height == 0 {
        return Err(FleetdashError::encoding(
            "image",
            format!("surface rendered to an empty {width}x{height} frame"),
        ));
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(FleetdashError::encoding(
            "image",
            format!(
                "frame buffer holds {} bytes, expected {expected} for {width}x{height} RGBA",
                rgba.len()
            ),
        ));
    }

    let image = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        FleetdashError::encoding("image", "frame buffer does not match its dimensions")
    })?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| FleetdashError::encoding("image", format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CheckerRenderer {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SurfaceRenderer for CheckerRenderer {
        async fn rasterize(&self, _surface: &SurfaceRef) -> FleetdashResult<RasterFrame> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RasterFrame {
                width: 2,
                height: 2,
                rgba: vec![
                    255, 0, 0, 255, 0, 255, 0, 255, //
                    0, 0, 255, 255, 255, 255, 255, 0,
                ],
            })
        }

        fn name(&self) -> &str {
            "checker"
        }
    }

    #[tokio::test]
    async fn test_capture_encodes_frame_unchanged() {
        let renderer = Arc::new(CheckerRenderer {
            calls: AtomicUsize::new(0),
        });
        let capturer = SnapshotCapturer::new(renderer.clone());

        let png = capturer
            .capture(Some(&SurfaceRef::new("vehicles-table")))
            .await
            .unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 255, 0, 255]);
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 255, 255, 0]);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_surface_short_circuits() {
        let renderer = Arc::new(CheckerRenderer {
            calls: AtomicUsize::new(0),
        });
        let capturer = SnapshotCapturer::new(renderer.clone());

        let err = capturer.capture(None).await.unwrap_err();
        assert!(matches!(err, FleetdashError::MissingSurface));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let err = encode_png(RasterFrame {
            width: 3,
            height: 1,
            rgba: vec![0; 8],
        })
        .unwrap_err();
        assert!(matches!(err, FleetdashError::Encoding { .. }));
    }
}

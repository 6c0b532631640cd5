//! Surface renderer backed by image files on disk.

use std::path::PathBuf;

use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_engine::{RasterFrame, SurfaceRenderer};
use fleetdash_export_model::SurfaceRef;

/// Treats each surface reference as a path to an already-rendered image.
///
/// Relative references resolve against `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct ImageFileRenderer {
    base_dir: Option<PathBuf>,
}

impl ImageFileRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, surface: &SurfaceRef) -> PathBuf {
        let path = PathBuf::from(surface.as_str());
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

#[async_trait::async_trait]
impl SurfaceRenderer for ImageFileRenderer {
    async fn rasterize(&self, surface: &SurfaceRef) -> FleetdashResult<RasterFrame> {
        let path = self.resolve(surface);
        if !path.is_file() {
            return Err(FleetdashError::FileNotFound { path });
        }

        let decode_path = path.clone();
        let image = tokio::task::spawn_blocking(move || image::open(&decode_path))
            .await
            .map_err(|e| FleetdashError::render(format!("decoder task failed: {e}")))?
            .map_err(|e| {
                FleetdashError::render(format!("cannot decode {}: {e}", path.display()))
            })?
            .to_rgba8();

        let (width, height) = image.dimensions();
        tracing::debug!(path = %path.display(), width, height, "Rasterized surface from file");
        Ok(RasterFrame {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    fn name(&self) -> &str {
        "image-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rasterize_reads_png() {
        let dir = std::env::temp_dir().join(format!("fleetdash-surface-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("table.png");
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgba([14, 165, 233, 255]));
        img.save(&path).unwrap();

        let renderer = ImageFileRenderer::with_base_dir(&dir);
        let frame = renderer
            .rasterize(&SurfaceRef::new("table.png"))
            .await
            .unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.rgba.len(), 3 * 2 * 4);
        assert_eq!(&frame.rgba[20..24], &[14, 165, 233, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let renderer = ImageFileRenderer::new();
        let err = renderer
            .rasterize(&SurfaceRef::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetdashError::FileNotFound { .. }));
    }
}

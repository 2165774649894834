use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::models::LandmarkSet;

/// Radius of each drawn landmark, in pixels
pub const LANDMARK_RADIUS: i32 = 5;

/// Draw color for landmarks and connecting lines (#22c55e)
pub const LANDMARK_COLOR: Rgba<u8> = Rgba([0x22, 0xc5, 0x5e, 0xff]);

/// Sink for per-frame landmark drawing. Clears the surface before every redraw.
pub trait OverlayRenderer {
    /// Redraw for the latest result; `None` leaves the surface cleared
    fn render(&mut self, landmarks: Option<&LandmarkSet>) -> anyhow::Result<()>;

    fn name(&self) -> &str;
}

impl<R: OverlayRenderer + ?Sized> OverlayRenderer for Box<R> {
    fn render(&mut self, landmarks: Option<&LandmarkSet>) -> anyhow::Result<()> {
        (**self).render(landmarks)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Renderer that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl OverlayRenderer for NullRenderer {
    fn render(&mut self, _landmarks: Option<&LandmarkSet>) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Draws landmarks onto a transparent RGBA canvas the size of the capture frame
pub struct ImageOverlay {
    canvas: RgbaImage,
    color: Rgba<u8>,
    output_dir: Option<PathBuf>,
    frames_written: usize,
}

impl ImageOverlay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            color: LANDMARK_COLOR,
            output_dir: None,
            frames_written: 0,
        }
    }

    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    /// Write every redraw as a numbered PNG into `output_dir`.
    /// The directory must be empty or non-existent.
    pub fn with_output_dir(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Overlay directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.output_dir = Some(output_dir);
        Ok(self)
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw(&mut self, landmarks: &LandmarkSet) {
        let points = landmarks.points();

        for point in points.iter() {
            let center = (point.x.round() as i32, point.y.round() as i32);
            draw_filled_circle_mut(&mut self.canvas, center, LANDMARK_RADIUS, self.color);
        }

        // Polyline through consecutive indices
        for pair in points.windows(2) {
            draw_line_segment_mut(
                &mut self.canvas,
                (pair[0].x, pair[0].y),
                (pair[1].x, pair[1].y),
                self.color,
            );
        }
    }

    fn save_frame(&mut self) -> anyhow::Result<()> {
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("{:05}.png", self.frames_written + 1));
            self.canvas
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to save overlay {:?}: {}", path, e))?;
            self.frames_written += 1;
        }
        Ok(())
    }
}

impl OverlayRenderer for ImageOverlay {
    fn render(&mut self, landmarks: Option<&LandmarkSet>) -> anyhow::Result<()> {
        self.clear();
        if let Some(landmarks) = landmarks {
            self.draw(landmarks);
        }
        self.save_frame()
    }

    fn name(&self) -> &str {
        "image overlay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LANDMARK_COUNT, LandmarkPoint};

    fn diagonal_hand() -> LandmarkSet {
        let mut points = [LandmarkPoint::default(); LANDMARK_COUNT];
        for (i, point) in points.iter_mut().enumerate() {
            *point = LandmarkPoint::new(20.0 + i as f32 * 10.0, 20.0 + i as f32 * 5.0);
        }
        LandmarkSet::new(points)
    }

    #[test]
    fn draws_points_and_clears() -> anyhow::Result<()> {
        let mut overlay = ImageOverlay::new(300, 200);
        overlay.render(Some(&diagonal_hand()))?;

        assert_eq!(*overlay.canvas().get_pixel(20, 20), LANDMARK_COLOR);
        // Within the radius of the first landmark
        assert_eq!(*overlay.canvas().get_pixel(23, 20), LANDMARK_COLOR);
        // Far from any landmark or line
        assert_eq!(overlay.canvas().get_pixel(290, 10)[3], 0);

        overlay.render(None)?;
        assert!(overlay.canvas().pixels().all(|p| p[3] == 0));
        Ok(())
    }

    #[test]
    fn connects_consecutive_landmarks() -> anyhow::Result<()> {
        let mut points = [LandmarkPoint::new(250.0, 150.0); LANDMARK_COUNT];
        points[0] = LandmarkPoint::new(20.0, 100.0);
        points[1] = LandmarkPoint::new(120.0, 100.0);
        let mut overlay = ImageOverlay::new(300, 200);
        overlay.render(Some(&LandmarkSet::new(points)))?;

        // Midway between index 0 and 1, outside both circles
        assert_eq!(*overlay.canvas().get_pixel(70, 100), LANDMARK_COLOR);
        Ok(())
    }

    #[test]
    fn writes_numbered_frames() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let out = dir.path().join("overlay");
        let mut overlay = ImageOverlay::new(300, 200).with_output_dir(out.clone())?;

        overlay.render(Some(&diagonal_hand()))?;
        overlay.render(None)?;

        assert_eq!(overlay.frames_written(), 2);
        assert!(out.join("00001.png").exists());
        assert!(out.join("00002.png").exists());
        Ok(())
    }

    #[test]
    fn refuses_non_empty_output_dir() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        std::fs::write(dir.path().join("existing.png"), b"x")?;
        assert!(
            ImageOverlay::new(300, 200)
                .with_output_dir(dir.path().to_path_buf())
                .is_err()
        );
        Ok(())
    }
}

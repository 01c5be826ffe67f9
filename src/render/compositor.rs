use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::color::ColorSample;
use crate::audio::features::WindowFeatures;

/// Amount added to each channel of the middle row when the center line is on.
const CENTER_LINE_BOOST: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BarStyle {
    /// Symmetric about the middle row, like a waveform envelope.
    #[default]
    Mirrored,
    /// Grows up from the bottom edge.
    Bottom,
    /// From the most negative to the most positive sample around the middle row.
    Envelope,
}

/// A finished W×H RGB grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailImage {
    image: RgbImage,
}

impl ThumbnailImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> ColorSample {
        (*self.image.get_pixel(x, y)).into()
    }

    pub fn pixels(&self) -> impl Iterator<Item = ColorSample> + '_ {
        self.image.pixels().map(|p| (*p).into())
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb_image(self) -> RgbImage {
        self.image
    }
}

/// Paints one vertical bar per column over a flat background.
#[derive(Debug, Clone)]
pub struct Compositor {
    height: u32,
    style: BarStyle,
    background: ColorSample,
    center_line: bool,
}

impl Compositor {
    pub fn new(height: u32, style: BarStyle, background: ColorSample) -> Compositor {
        Compositor {
            height,
            style,
            background,
            center_line: false,
        }
    }

    pub fn with_center_line(mut self, enabled: bool) -> Compositor {
        self.center_line = enabled;
        self
    }

    /// Top and bottom of the bar in pixel units, y growing downwards, within `[0, height]`.
    pub fn bar_extent(&self, features: &WindowFeatures) -> (f32, f32) {
        let h = self.height as f32;
        let center = h * 0.5;
        let unit = |v: f32, lo: f32| if v.is_nan() { 0.0 } else { v.clamp(lo, 1.0) };

        let (top, bottom) = match self.style {
            BarStyle::Mirrored => {
                let half = unit(features.amplitude, 0.0) * center;
                (center - half, center + half)
            }
            BarStyle::Bottom => (h - unit(features.amplitude, 0.0) * h, h),
            BarStyle::Envelope => (
                center - unit(features.max_peak, -1.0) * center,
                center - unit(features.min_peak, -1.0) * center,
            ),
        };
        (top.min(bottom).clamp(0.0, h), top.max(bottom).clamp(0.0, h))
    }

    /// Builds a `columns.len()` × `height` image; column x is painted from `columns[x]`.
    pub fn compose(&self, columns: &[(WindowFeatures, ColorSample)]) -> ThumbnailImage {
        debug_assert!(!columns.is_empty() && self.height > 0);
        let mut image = RgbImage::from_pixel(columns.len() as u32, self.height, self.background.into());

        for (x, (features, color)) in columns.iter().enumerate() {
            let (top, bottom) = self.bar_extent(features);
            if bottom <= top {
                continue;
            }
            let first = top.floor() as u32;
            let last = (bottom.ceil() as u32).min(self.height);
            for y in first..last {
                // vertical anti-aliasing: partially covered edge rows are blended
                let coverage = (bottom.min(y as f32 + 1.0) - top.max(y as f32)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let pixel = self.background.blend(*color, coverage);
                    image.put_pixel(x as u32, y, pixel.into());
                }
            }
        }

        if self.center_line {
            let y = self.height / 2;
            for x in 0..image.width() {
                let pixel = image.get_pixel_mut(x, y);
                pixel.0 = pixel.0.map(|c| c.saturating_add(CENTER_LINE_BOOST));
            }
        }

        ThumbnailImage { image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: ColorSample = ColorSample::new(0, 0, 0);
    const RED: ColorSample = ColorSample::new(200, 0, 0);

    fn column(amplitude: f32) -> (WindowFeatures, ColorSample) {
        (
            WindowFeatures {
                amplitude,
                centroid: 0.5,
                min_peak: -amplitude,
                max_peak: amplitude,
            },
            RED,
        )
    }

    fn painted_rows(image: &ThumbnailImage, x: u32) -> Vec<u32> {
        (0..image.height()).filter(|&y| image.pixel(x, y) != BG).collect()
    }

    #[test]
    fn dimensions_follow_columns_and_height() {
        for (w, h) in [(1, 1), (1, 40), (80, 1), (80, 40), (257, 33)] {
            let columns = vec![column(0.7); w];
            for style in [BarStyle::Mirrored, BarStyle::Bottom, BarStyle::Envelope] {
                let image = Compositor::new(h, style, BG).compose(&columns);
                assert_eq!((image.width(), image.height()), (w as u32, h));
            }
        }
    }

    #[test]
    fn silent_columns_leave_background() {
        let image = Compositor::new(40, BarStyle::Mirrored, BG)
            .compose(&vec![column(0.0); 80]);
        assert!(image.pixels().all(|p| p == BG));
    }

    #[test]
    fn full_scale_fills_the_column() {
        for h in [1, 2, 39, 40] {
            let image = Compositor::new(h, BarStyle::Mirrored, BG).compose(&[column(1.0)]);
            assert!(image.pixels().all(|p| p == RED), "height {}", h);
        }
    }

    #[test]
    fn mirrored_is_symmetric() {
        let image = Compositor::new(40, BarStyle::Mirrored, BG).compose(&[column(0.5)]);
        assert_eq!(painted_rows(&image, 0), (10..30).collect::<Vec<_>>());

        let image = Compositor::new(41, BarStyle::Mirrored, BG).compose(&[column(0.5)]);
        for y in 0..41 {
            assert_eq!(image.pixel(0, y), image.pixel(0, 40 - y), "row {}", y);
        }
    }

    #[test]
    fn bottom_bars_grow_upwards() {
        let image = Compositor::new(40, BarStyle::Bottom, BG).compose(&[column(0.5)]);
        assert_eq!(painted_rows(&image, 0), (20..40).collect::<Vec<_>>());
    }

    #[test]
    fn envelope_uses_signed_peaks() {
        let features = WindowFeatures {
            amplitude: 0.5,
            centroid: 0.1,
            min_peak: -0.5,
            max_peak: 0.25,
        };
        let compositor = Compositor::new(40, BarStyle::Envelope, BG);
        assert_eq!(compositor.bar_extent(&features), (15.0, 30.0));
        let image = compositor.compose(&[(features, RED)]);
        assert_eq!(painted_rows(&image, 0), (15..30).collect::<Vec<_>>());
    }

    #[test]
    fn edges_are_anti_aliased() {
        let image = Compositor::new(41, BarStyle::Mirrored, BG).compose(&[column(0.5)]);
        // bar covers 10.25..30.75
        let edge = image.pixel(0, 10);
        assert!(edge.r > 0 && edge.r < RED.r, "{:?}", edge);
        assert_eq!(image.pixel(0, 11), RED);
        assert_eq!(image.pixel(0, 9), BG);
    }

    #[test]
    fn columns_keep_their_order() {
        let columns = vec![column(0.0), column(1.0), column(0.0)];
        let image = Compositor::new(10, BarStyle::Mirrored, BG).compose(&columns);
        assert!(painted_rows(&image, 0).is_empty());
        assert_eq!(painted_rows(&image, 1).len(), 10);
        assert!(painted_rows(&image, 2).is_empty());
    }

    #[test]
    fn center_line_brightens_middle_row() {
        let image = Compositor::new(5, BarStyle::Mirrored, BG)
            .with_center_line(true)
            .compose(&[column(0.0), column(1.0)]);
        assert_eq!(image.pixel(0, 2), ColorSample::new(25, 25, 25));
        assert_eq!(image.pixel(1, 2), ColorSample::new(225, 25, 25));
        assert_eq!(image.pixel(0, 1), BG);

        let tiny = Compositor::new(1, BarStyle::Mirrored, BG)
            .with_center_line(true)
            .compose(&[column(0.0)]);
        assert_eq!(tiny.pixel(0, 0), ColorSample::new(25, 25, 25));
    }
}

//! Maps window features to a color: centroid picks the hue, amplitude the brightness.

use serde::{Deserialize, Serialize};

use crate::audio::features::WindowFeatures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    /// Blue, green, yellow, orange-red on black.
    #[default]
    Spectrum,
    /// Magenta through blue, green and yellow to red on black.
    Rainbow,
    MutedSpectrum,
    MutedRainbow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSample {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn to_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    fn from_f32(rgb: [f32; 3]) -> Self {
        let c = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::new(c(rgb[0]), c(rgb[1]), c(rgb[2]))
    }

    /// Linear blend toward `other`; `t` is clamped to [0, 1].
    pub fn blend(self, other: ColorSample, t: f32) -> ColorSample {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        ColorSample::from_f32(lerp3(self.to_f32(), other.to_f32(), t))
    }
}

impl From<ColorSample> for image::Rgb<u8> {
    fn from(c: ColorSample) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

impl From<image::Rgb<u8>> for ColorSample {
    fn from(p: image::Rgb<u8>) -> Self {
        ColorSample::new(p.0[0], p.0[1], p.0[2])
    }
}

const DARK_BACKGROUND: ColorSample = ColorSample::new(0, 0, 0);
const LIGHT_BACKGROUND: ColorSample = ColorSample::new(213, 217, 221);

const SPECTRUM_STOPS: [[f32; 3]; 4] = [
    [50.0, 0.0, 200.0],
    [0.0, 220.0, 80.0],
    [255.0, 224.0, 0.0],
    [255.0, 70.0, 0.0],
];

const RAINBOW_STEPS: usize = 30;
/// Hue at centroid 0. Stops short of 360 so the two ends stay distinct.
const RAINBOW_START_HUE: f32 = 300.0;

/// Immutable lookup from features to color for one palette.
#[derive(Debug, Clone)]
pub struct ColorMapper {
    stops: Vec<[f32; 3]>,
    background: ColorSample,
}

impl ColorMapper {
    pub fn new(palette: Palette) -> ColorMapper {
        let spectrum = || SPECTRUM_STOPS.to_vec();
        let rainbow = || {
            (0..RAINBOW_STEPS)
                .map(|i| {
                    let v = i as f32 / (RAINBOW_STEPS - 1) as f32;
                    hsl_to_rgb(((1.0 - v) * RAINBOW_START_HUE).trunc(), 0.8, 0.5)
                })
                .collect::<Vec<_>>()
        };
        let muted = |stops: Vec<[f32; 3]>, amount: f32| -> Vec<[f32; 3]> {
            stops.into_iter().map(|c| desaturate(c, amount)).collect()
        };

        let (stops, background) = match palette {
            Palette::Spectrum => (spectrum(), DARK_BACKGROUND),
            Palette::Rainbow => (rainbow(), DARK_BACKGROUND),
            Palette::MutedSpectrum => (muted(spectrum(), 0.7), LIGHT_BACKGROUND),
            Palette::MutedRainbow => (muted(rainbow(), 0.8), LIGHT_BACKGROUND),
        };
        ColorMapper { stops, background }
    }

    /// The color of silence, also used as the image background.
    pub fn background(&self) -> ColorSample {
        self.background
    }

    /// Full-brightness color for a centroid, interpolated between neighbouring stops.
    pub fn hue(&self, centroid: f32) -> ColorSample {
        ColorSample::from_f32(self.hue_f32(centroid))
    }

    fn hue_f32(&self, centroid: f32) -> [f32; 3] {
        let centroid = if centroid.is_nan() { 0.0 } else { centroid.clamp(0.0, 1.0) };
        if self.stops.len() == 1 {
            return self.stops[0];
        }
        let pos = centroid * (self.stops.len() - 1) as f32;
        let index = (pos.floor() as usize).min(self.stops.len() - 2);
        lerp3(self.stops[index], self.stops[index + 1], pos - index as f32)
    }

    pub fn map(&self, features: &WindowFeatures) -> ColorSample {
        let amplitude = if features.amplitude.is_nan() {
            0.0
        } else {
            features.amplitude.clamp(0.0, 1.0)
        };
        let brightness = amplitude.sqrt();
        ColorSample::from_f32(lerp3(
            self.background.to_f32(),
            self.hue_f32(features.centroid),
            brightness,
        ))
    }
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// amount 0 keeps the color, 1 turns it grey.
fn desaturate(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let luminosity = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
    rgb.map(|c| c - amount * (c - luminosity))
}

/// `hue` in degrees, `saturation` and `lightness` in [0, 1]. Returns 0..255 channels.
fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    [(r + m) * 255.0, (g + m) * 255.0, (b + m) * 255.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Palette; 4] = [
        Palette::Spectrum,
        Palette::Rainbow,
        Palette::MutedSpectrum,
        Palette::MutedRainbow,
    ];

    fn features(amplitude: f32, centroid: f32) -> WindowFeatures {
        WindowFeatures {
            amplitude,
            centroid,
            min_peak: -amplitude,
            max_peak: amplitude,
        }
    }

    #[test]
    fn silence_maps_to_background() {
        for palette in ALL {
            let mapper = ColorMapper::new(palette);
            for centroid in [0.0, 0.3, 1.0, f32::NAN] {
                assert_eq!(mapper.map(&features(0.0, centroid)), mapper.background());
            }
        }
        assert_eq!(ColorMapper::new(Palette::Spectrum).background(), ColorSample::new(0, 0, 0));
        assert_eq!(
            ColorMapper::new(Palette::MutedRainbow).background(),
            ColorSample::new(213, 217, 221)
        );
    }

    #[test]
    fn full_scale_hits_palette_ends() {
        let mapper = ColorMapper::new(Palette::Spectrum);
        assert_eq!(mapper.map(&features(1.0, 0.0)), ColorSample::new(50, 0, 200));
        assert_eq!(mapper.map(&features(1.0, 1.0)), ColorSample::new(255, 70, 0));
        assert_eq!(mapper.hue(1.0 / 3.0), ColorSample::new(0, 220, 80));
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let mapper = ColorMapper::new(Palette::Spectrum);
        assert_eq!(mapper.map(&features(7.0, 2.0)), mapper.map(&features(1.0, 1.0)));
        assert_eq!(mapper.map(&features(-1.0, -3.0)), mapper.background());
        assert_eq!(mapper.map(&features(f32::NAN, 0.5)), mapper.background());
        assert_eq!(mapper.map(&features(f32::INFINITY, 0.0)), ColorSample::new(50, 0, 200));
    }

    #[test]
    fn deterministic() {
        for palette in ALL {
            let a = ColorMapper::new(palette);
            let b = ColorMapper::new(palette);
            for i in 0..=20 {
                let f = features(i as f32 / 20.0, 1.0 - i as f32 / 20.0);
                assert_eq!(a.map(&f), b.map(&f));
                assert_eq!(a.map(&f), a.map(&f));
            }
        }
    }

    #[test]
    fn small_steps_give_small_changes() {
        let close = |a: ColorSample, b: ColorSample| {
            (a.r as i32 - b.r as i32).abs() <= 3
                && (a.g as i32 - b.g as i32).abs() <= 3
                && (a.b as i32 - b.b as i32).abs() <= 3
        };
        for palette in ALL {
            let mapper = ColorMapper::new(palette);
            for i in 0..1000 {
                let c = i as f32 / 1000.0;
                let a = mapper.map(&features(0.8, c));
                let b = mapper.map(&features(0.8, c + 0.001));
                assert!(close(a, b), "{:?}: centroid {} -> {:?} vs {:?}", palette, c, a, b);
            }
            for i in 10..1000 {
                let amp = i as f32 / 1000.0;
                let a = mapper.map(&features(amp, 0.5));
                let b = mapper.map(&features(amp + 0.001, 0.5));
                assert!(close(a, b), "{:?}: amplitude {} -> {:?} vs {:?}", palette, amp, a, b);
            }
        }
    }

    #[test]
    fn louder_is_brighter_on_dark_background() {
        let mapper = ColorMapper::new(Palette::Spectrum);
        let sum = |c: ColorSample| c.r as u32 + c.g as u32 + c.b as u32;
        let quiet = mapper.map(&features(0.1, 0.6));
        let loud = mapper.map(&features(0.9, 0.6));
        assert!(sum(loud) > sum(quiet));
    }

    #[test]
    fn rainbow_ends_are_distinct() {
        for palette in [Palette::Rainbow, Palette::MutedRainbow] {
            let mapper = ColorMapper::new(palette);
            assert_ne!(mapper.hue(0.0), mapper.hue(1.0), "{:?}", palette);
        }
        let rainbow = ColorMapper::new(Palette::Rainbow);
        let low = rainbow.hue(0.0);
        let high = rainbow.hue(1.0);
        assert!(low.b > low.g, "{:?}", low);
        assert!(high.r > high.g && high.r > high.b, "{:?}", high);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(ColorSample::from_f32(hsl_to_rgb(0.0, 1.0, 0.5)), ColorSample::new(255, 0, 0));
        assert_eq!(ColorSample::from_f32(hsl_to_rgb(120.0, 1.0, 0.5)), ColorSample::new(0, 255, 0));
        assert_eq!(ColorSample::from_f32(hsl_to_rgb(240.0, 1.0, 0.5)), ColorSample::new(0, 0, 255));
        assert_eq!(ColorSample::from_f32(hsl_to_rgb(360.0, 1.0, 0.5)), ColorSample::new(255, 0, 0));
    }
}

// ============================================================================
// COLOR ADJUSTMENTS — per-pixel brightness / contrast / saturation / greyscale
// ============================================================================
//
// CPU reference for the fragment shader in gpu/shaders.rs.  Both sides run the
// same steps in the same order:
//
//   1. greyscale flag  → r, g, b = (r + g + b) / 3
//      otherwise       → saturation blend toward that same grey
//   2. out = out * contrast + brightness   (contrast scales around zero)
//   3. clamp to 0..1, alpha untouched
//
// Whole-image application is parallelized over rows via rayon.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use rayon::prelude::*;

use crate::params::FilterParams;

/// Straight (non-premultiplied) RGBA, channels nominally 0..1.
pub type Rgba = [f32; 4];

/// How the non-greyscale path moves a color away from / toward grey.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaturationModel {
    /// Linear interpolation between the flat grey value and the color.
    #[default]
    Linear,
    /// RGB → HSL, scale S (clamped to 0..1), HSL → RGB.
    Hsl,
}

impl SaturationModel {
    /// Value written into the shader uniform.
    pub fn to_u32(self) -> u32 {
        match self {
            SaturationModel::Linear => 0,
            SaturationModel::Hsl => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SaturationModel::Linear => "linear",
            SaturationModel::Hsl => "hsl",
        }
    }
}

impl fmt::Display for SaturationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaturationModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "lerp" => Ok(SaturationModel::Linear),
            "hsl" => Ok(SaturationModel::Hsl),
            other => Err(format!("unknown saturation model '{}'", other)),
        }
    }
}

/// Flat, unweighted average of R, G and B.
#[inline]
pub fn grey_value(c: Rgba) -> f32 {
    (c[0] + c[1] + c[2]) / 3.0
}

/// The canonical pipeline (linear saturation model).
#[inline]
pub fn transform_pixel(c: Rgba, params: &FilterParams) -> Rgba {
    ColorTransform::default().apply(c, params)
}

/// Per-pixel color transform, parameterized by saturation model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorTransform {
    pub model: SaturationModel,
}

impl ColorTransform {
    pub fn new(model: SaturationModel) -> Self {
        Self { model }
    }

    pub fn apply(&self, c: Rgba, params: &FilterParams) -> Rgba {
        let [r, g, b, a] = c;

        let (r, g, b) = if params.greyscale {
            let grey = grey_value(c);
            (grey, grey, grey)
        } else if params.saturation != 1.0 {
            match self.model {
                SaturationModel::Linear => {
                    let grey = grey_value(c);
                    let s = params.saturation;
                    (grey + s * (r - grey), grey + s * (g - grey), grey + s * (b - grey))
                }
                SaturationModel::Hsl => {
                    let (h, s, l) = rgb_to_hsl(r, g, b);
                    hsl_to_rgb(h, (s * params.saturation).clamp(0.0, 1.0), l)
                }
            }
        } else {
            (r, g, b)
        };

        let cb = |v: f32| (v * params.contrast + params.brightness).clamp(0.0, 1.0);
        [cb(r), cb(g), cb(b), a]
    }

    /// Apply to a whole image.  Returns a new image of the same size.
    pub fn apply_to_image(&self, src: &RgbaImage, params: &FilterParams) -> RgbaImage {
        let w = src.width() as usize;
        let h = src.height() as usize;
        if w == 0 || h == 0 {
            return RgbaImage::new(src.width(), src.height());
        }

        let src_raw = src.as_raw();
        let mut dst_raw = vec![0u8; w * h * 4];
        let stride = w * 4;

        dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for (px_in, px_out) in row_in.chunks_exact(4).zip(row_out.chunks_exact_mut(4)) {
                let c = [
                    unorm_to_f32(px_in[0]),
                    unorm_to_f32(px_in[1]),
                    unorm_to_f32(px_in[2]),
                    unorm_to_f32(px_in[3]),
                ];
                let out = self.apply(c, params);
                px_out[0] = f32_to_unorm(out[0]);
                px_out[1] = f32_to_unorm(out[1]);
                px_out[2] = f32_to_unorm(out[2]);
                px_out[3] = px_in[3];
            }
        });

        // Buffer length is exactly w * h * 4 by construction.
        RgbaImage::from_raw(src.width(), src.height(), dst_raw)
            .unwrap_or_else(|| RgbaImage::new(src.width(), src.height()))
    }
}

#[inline]
pub fn unorm_to_f32(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
pub fn f32_to_unorm(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// RGB (0..1) → HSL (H: 0..1, S: 0..1, L: 0..1)
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-6 {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if (max - r).abs() < 1e-6 {
        let mut h = (g - b) / d;
        if h < 0.0 {
            h += 6.0;
        }
        h / 6.0
    } else if (max - g).abs() < 1e-6 {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    (h, s, l)
}

/// HSL (H: 0..1, S: 0..1, L: 0..1) → RGB (0..1)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s.abs() < 1e-6 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

// SPDX-License-Identifier: MIT
//
// ANSI-256 palette geometry and sRGB transfer math.
//
// The watcher never generates colors. It only picks from the xterm
// 256-color palette. What it needs is the inverse mapping: given a palette
// index, which sRGB triple does a typical terminal show? Contrast math then
// runs on those triples in linear light.
//
// The 256-color palette consists of:
//
//   0–7      standard colors
//   8–15     bright variants
//   16–231   6×6×6 RGB cube (levels 0, 95, 135, 175, 215, 255)
//   232–255  24-step grayscale ramp (8, 18, …, 238)

/// Palette index of pure white in the 16-color block.
pub const WHITE: u8 = 15;

/// Palette index of pure black at the origin of the color cube.
///
/// Index 0 is also black in the xterm defaults, but many terminal themes
/// remap the first 16 entries. Cube index 16 is never remapped.
pub const BLACK: u8 = 16;

/// First index of the 6×6×6 color cube.
pub const CUBE_START: u8 = 16;

/// Last index of the 6×6×6 color cube.
pub const CUBE_END: u8 = 231;

/// First index of the grayscale ramp.
pub const GRAY_START: u8 = 232;

/// The standard ANSI-16 palette as RGB values.
///
/// These match the widely-used "xterm" defaults. Individual terminals
/// may override these, but for contrast estimation they are a reasonable
/// reference.
pub const ANSI16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),       // 0: Black
    (128, 0, 0),     // 1: Red
    (0, 128, 0),     // 2: Green
    (128, 128, 0),   // 3: Yellow
    (0, 0, 128),     // 4: Blue
    (128, 0, 128),   // 5: Magenta
    (0, 128, 128),   // 6: Cyan
    (192, 192, 192), // 7: White
    (128, 128, 128), // 8: Bright Black
    (255, 0, 0),     // 9: Bright Red
    (0, 255, 0),     // 10: Bright Green
    (255, 255, 0),   // 11: Bright Yellow
    (0, 0, 255),     // 12: Bright Blue
    (255, 0, 255),   // 13: Bright Magenta
    (0, 255, 255),   // 14: Bright Cyan
    (255, 255, 255), // 15: Bright White
];

/// Convert an ANSI-256 palette index to RGB values.
///
/// # Examples
///
/// ```
/// use pw_term::color::ansi256_to_rgb;
///
/// assert_eq!(ansi256_to_rgb(16), (0, 0, 0));
/// assert_eq!(ansi256_to_rgb(231), (255, 255, 255));
/// assert_eq!(ansi256_to_rgb(232), (8, 8, 8));
/// ```
#[must_use]
pub fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
    match idx {
        0..=15 => ANSI16_RGB[idx as usize],

        16..=231 => {
            let idx = idx - 16;
            let r_idx = idx / 36;
            let g_idx = (idx % 36) / 6;
            let b_idx = idx % 6;

            // The cube uses: 0, 95, 135, 175, 215, 255
            let to_value = |i: u8| -> u8 {
                if i == 0 { 0 } else { 55 + 40 * i }
            };

            (to_value(r_idx), to_value(g_idx), to_value(b_idx))
        }

        232..=255 => {
            let v = 8 + 10 * (idx - 232);
            (v, v, v)
        }
    }
}

/// Weighted 8-bit brightness (`0.2126 R + 0.7152 G + 0.0722 B`) without
/// linearization.
///
/// Cheap screening value in `0.0..=255.0`. Used to discard backgrounds
/// that are too close to black or white to carry a readable chip before
/// doing real contrast math.
#[must_use]
pub fn brightness8(idx: u8) -> f64 {
    let (r, g, b) = ansi256_to_rgb(idx);
    0.2126f64.mul_add(f64::from(r), 0.7152f64.mul_add(f64::from(g), 0.0722 * f64::from(b)))
}

// ─── Linear sRGB ↔ sRGB (Gamma) ─────────────────────────────────────────────
//
// sRGB uses a piecewise transfer function (gamma curve) to encode linear
// light values into the perceptual domain. WCAG luminance is defined on
// linear values.

/// Convert a single sRGB component (0.0–1.0) to linear sRGB (remove gamma).
#[inline]
#[must_use]
pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a single 8-bit sRGB component to linear sRGB.
#[inline]
#[must_use]
pub fn srgb8_to_linear(c: u8) -> f64 {
    srgb_to_linear(f64::from(c) / 255.0)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    // ── Palette geometry ─────────────────────────────────────────────────

    #[test]
    fn cube_corners() {
        assert_eq!(ansi256_to_rgb(CUBE_START), (0, 0, 0));
        assert_eq!(ansi256_to_rgb(CUBE_END), (255, 255, 255));
        // 16 + 36*5 = 196: pure red.
        assert_eq!(ansi256_to_rgb(196), (255, 0, 0));
        // 16 + 5: pure blue.
        assert_eq!(ansi256_to_rgb(21), (0, 0, 255));
    }

    #[test]
    fn cube_levels() {
        let levels: Vec<u8> = (0..6).map(|i| ansi256_to_rgb(16 + i).2).collect();
        assert_eq!(levels, vec![0, 95, 135, 175, 215, 255]);
    }

    #[test]
    fn gray_ramp() {
        assert_eq!(ansi256_to_rgb(GRAY_START), (8, 8, 8));
        assert_eq!(ansi256_to_rgb(255), (238, 238, 238));
    }

    #[test]
    fn named_indices() {
        assert_eq!(ansi256_to_rgb(WHITE), (255, 255, 255));
        assert_eq!(ansi256_to_rgb(BLACK), (0, 0, 0));
    }

    #[test]
    fn brightness_extremes() {
        assert!(approx_eq(brightness8(BLACK), 0.0, 1e-9));
        assert!(approx_eq(brightness8(WHITE), 255.0, 1e-6));
    }

    // ── Transfer function ────────────────────────────────────────────────

    #[test]
    fn linear_endpoints() {
        assert!(approx_eq(srgb_to_linear(0.0), 0.0, 1e-12));
        assert!(approx_eq(srgb_to_linear(1.0), 1.0, 1e-12));
    }

    #[test]
    fn linear_mid_gray() {
        // sRGB 0.5 linearizes to ~0.214
        let v = srgb_to_linear(0.5);
        assert!(approx_eq(v, 0.214, 0.001), "mid gray: {v}");
    }

    #[test]
    fn linear_low_segment_is_straight() {
        assert!(approx_eq(srgb_to_linear(0.04), 0.04 / 12.92, 1e-12));
    }

    #[test]
    fn srgb8_matches_float() {
        assert!(approx_eq(srgb8_to_linear(255), 1.0, 1e-12));
        assert!(approx_eq(srgb8_to_linear(128), srgb_to_linear(128.0 / 255.0), 1e-12));
    }
}

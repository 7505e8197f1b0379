//! WCAG contrast math over ANSI-256 palette indices.
//!
//! Luminance is computed in linear light from the sRGB triple a typical
//! terminal shows for an index. Foregrounds are restricted to two choices,
//! pure white ([`WHITE`]) and pure black ([`BLACK`]): against any background
//! one of them reaches a usable ratio, and a two-color foreground set keeps
//! chips visually consistent.

use pw_term::color::{BLACK, WHITE, ansi256_to_rgb, srgb8_to_linear};

/// Minimum acceptable contrast ratio (WCAG AA for normal text).
pub const MIN_CONTRAST: f64 = 4.5;

/// Relative luminance of an sRGB triple per WCAG 2.1, in `[0.0, 1.0]`.
///
///   L = 0.2126 * `R_lin` + 0.7152 * `G_lin` + 0.0722 * `B_lin`
#[must_use]
pub fn relative_luminance_rgb(r: u8, g: u8, b: u8) -> f64 {
    let r_lin = srgb8_to_linear(r);
    let g_lin = srgb8_to_linear(g);
    let b_lin = srgb8_to_linear(b);
    0.2126f64.mul_add(r_lin, 0.7152f64.mul_add(g_lin, 0.0722 * b_lin))
}

/// Relative luminance of an ANSI-256 palette index.
#[must_use]
pub fn relative_luminance(idx: u8) -> f64 {
    let (r, g, b) = ansi256_to_rgb(idx);
    relative_luminance_rgb(r, g, b)
}

/// WCAG contrast ratio between two luminances, in `[1.0, 21.0]`.
///
/// The result is always >= 1.0 regardless of argument order.
#[must_use]
pub fn contrast_ratio(la: f64, lb: f64) -> f64 {
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast ratio between two palette indices.
#[must_use]
pub fn contrast_between(fg: u8, bg: u8) -> f64 {
    contrast_ratio(relative_luminance(fg), relative_luminance(bg))
}

/// Pick white or black text for background `bg`.
///
/// If both reach [`MIN_CONTRAST`], the higher ratio wins, white on a tie.
/// If only one does, that one. If neither does, white on a dark background
/// (luminance < 0.5), black otherwise.
#[must_use]
pub fn best_foreground(bg: u8) -> u8 {
    let lum = relative_luminance(bg);
    let cr_black = contrast_ratio(lum, 0.0);
    let cr_white = contrast_ratio(1.0, lum);

    match (cr_white >= MIN_CONTRAST, cr_black >= MIN_CONTRAST) {
        (true, true) => {
            if cr_white >= cr_black {
                WHITE
            } else {
                BLACK
            }
        }
        (true, false) => WHITE,
        (false, true) => BLACK,
        (false, false) => {
            if lum < 0.5 {
                WHITE
            } else {
                BLACK
            }
        }
    }
}

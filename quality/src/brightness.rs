//! Mean luminance of a (downsampled) RGBA frame.

/// Mean over pixels of `(r + g + b) / 3` for an RGBA8 buffer.
///
/// Alpha is ignored, a trailing partial pixel is ignored, and an empty
/// buffer reads as black.
pub fn average_brightness_rgba(pixels: &[u8]) -> f32 {
    let mut total: u64 = 0;
    let mut count: u64 = 0;
    for px in pixels.chunks_exact(4) {
        total += px[0] as u64 + px[1] as u64 + px[2] as u64;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    (total as f64 / (3 * count) as f64) as f32
}

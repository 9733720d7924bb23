use image::RgbImage;

/// Drop the alpha channel of a tightly packed RGBA buffer.
///
/// Returns `None` when the buffer is shorter than `width * height * 4`.
pub fn rgba_to_rgb(width: u32, height: u32, rgba: &[u8]) -> Option<RgbImage> {
    let pixels = width as usize * height as usize;
    if rgba.len() < pixels * 4 {
        return None;
    }
    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .take(pixels)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_dropped() {
        let rgba = [1, 2, 3, 255, 4, 5, 6, 0];
        let image = rgba_to_rgb(2, 1, &rgba).unwrap();
        assert_eq!(image.as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(rgba_to_rgb(2, 2, &[0; 12]).is_none());
    }
}

//! Solid circle point-sprite mask

/// Side length of the generated sprite texture
pub const SPRITE_TEXTURE_SIZE: u32 = 64;

/// Single-channel `size x size` mask: 255 inside the inscribed circle, 0 outside.
/// Texels are tested at their centers.
pub fn circle_mask(size: u32) -> Vec<u8> {
    let radius = size as f32 * 0.5;
    let radius_sq = radius * radius;

    (0..size)
        .flat_map(|y| (0..size).map(move |x| (x, y)))
        .map(|(x, y)| {
            let dx = x as f32 + 0.5 - radius;
            let dy = y as f32 + 0.5 - radius;
            if dx * dx + dy * dy <= radius_sq {
                255
            } else {
                0
            }
        })
        .collect()
}

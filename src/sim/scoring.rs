//! Brick scoring
//!
//! Smaller bricks are harder to hit and pay more. The size comes from the
//! texture key (`family-size`), the same key the renderer loads.

use crate::consts::DEFAULT_BRICK_SCORE;

/// Points per texture size
const SCORE_TABLE: [(u32, u64); 5] = [(16, 130), (24, 80), (32, 50), (48, 30), (64, 20)];

/// Pull the size suffix out of a texture key like `stone-24`
pub fn decode_brick_size(texture: &str) -> Option<u32> {
    texture.rsplit_once('-')?.1.parse().ok()
}

/// Points for a size, falling back to the default for unknown sizes
pub fn score_for_size(size: Option<u32>) -> u64 {
    size.and_then(|s| SCORE_TABLE.iter().find(|(k, _)| *k == s))
        .map(|(_, points)| *points)
        .unwrap_or(DEFAULT_BRICK_SCORE)
}

pub fn score_for_texture(texture: &str) -> u64 {
    score_for_size(decode_brick_size(texture))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(decode_brick_size("stone-24"), Some(24));
        assert_eq!(decode_brick_size("neon-glow-64"), Some(64));
        assert_eq!(decode_brick_size("stone"), None);
        assert_eq!(decode_brick_size("stone-big"), None);
    }

    #[test]
    fn test_table_and_fallback() {
        assert_eq!(score_for_texture("crate-16"), 130);
        assert_eq!(score_for_texture("crate-64"), 20);
        assert_eq!(score_for_texture("crate-20"), DEFAULT_BRICK_SCORE);
        assert_eq!(score_for_texture("mystery"), DEFAULT_BRICK_SCORE);
    }
}

pub mod easing;
pub mod fifo_cache;

pub use easing::{cubic_ease_in_out, lerp, Easing};
pub use fifo_cache::FifoCache;

/// Clamp a weight/intensity value into the [0, 1] range all blend outputs use.
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Cheap, stable hash over the first `max_len` characters of a string.
///
/// Used for cache keys; collisions are acceptable because cached values are
/// recomputable.
pub fn text_hash(text: &str, max_len: usize) -> u64 {
    let mut hash: u64 = 0;
    for ch in text.chars().take(max_len) {
        hash = hash.wrapping_mul(31).wrapping_add(ch as u64);
    }
    hash
}

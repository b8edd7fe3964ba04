//! Stereo frame interleave/deinterleave for Q31 serial-audio words.
//!
//! The serial transport moves one 32-bit word per channel per frame, left
//! first: `[L0, R0, L1, R1, ...]`. These helpers convert between that layout
//! and the per-channel sample blocks of the buffer pool.

/// Interleave left and right channel samples into `[L, R]` frames.
///
/// # Panics
///
/// Debug-asserts that `dest` holds exactly two words per sample.
pub fn interleave_lr(dest: &mut [i32], left: &[i32], right: &[i32]) {
    debug_assert_eq!(dest.len(), left.len() * 2);
    debug_assert_eq!(left.len(), right.len());

    for (frame, (&l, &r)) in dest.chunks_exact_mut(2).zip(left.iter().zip(right.iter())) {
        frame[0] = l;
        frame[1] = r;
    }
}

/// Split `[L, R]` frames into separate left and right channel samples.
///
/// # Panics
///
/// Debug-asserts that `src` holds exactly two words per sample.
pub fn deinterleave(src: &[i32], left: &mut [i32], right: &mut [i32]) {
    debug_assert_eq!(src.len(), left.len() * 2);
    debug_assert_eq!(left.len(), right.len());

    for (frame, (l, r)) in src.chunks_exact(2).zip(left.iter_mut().zip(right.iter_mut())) {
        *l = frame[0];
        *r = frame[1];
    }
}

//! Vectorized probe: locate a key, or the first free slot of its chain, in
//! one pass over the `keys` array. Dispatches on the same capability tier the
//! bitset uses (AVX2 → scalar; there is no half-width probe, since an 8-key
//! compare only has an AVX2 fast path and a scalar fallback per the spec).

use crate::bitset::{capability_tier, CapabilityTier};
use crate::intmap::FREE;
use crate::mixing::mix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Key is present at this slot index.
    Found(u32),
    /// Key is absent; this is the first free slot on its probe chain.
    Absent(u32),
}

#[inline]
pub fn probe(keys: &[i32], mask: u32, key: i32) -> ProbeOutcome {
    // An 8-wide window gathered with wraparound only visits 8 distinct slots
    // when the table holds at least 8 of them; below that, lanes would
    // revisit the same slot more than once per window and could trip the
    // "duplicate key" debug assertion spuriously. Tables this small fall
    // back to the scalar probe, which has no such constraint.
    if (mask as usize) + 1 < 8 {
        return scalar_probe(keys, mask, key);
    }
    match capability_tier() {
        CapabilityTier::Avx2 => unsafe { avx2_probe(keys, mask, key) },
        CapabilityTier::Sse2 | CapabilityTier::Scalar => scalar_probe(keys, mask, key),
    }
}

fn scalar_probe(keys: &[i32], mask: u32, key: i32) -> ProbeOutcome {
    let mut idx = (mix(key) & mask) as usize;
    loop {
        let k = keys[idx];
        if k == key {
            return ProbeOutcome::Found(idx as u32);
        }
        if k == FREE {
            return ProbeOutcome::Absent(idx as u32);
        }
        idx = (idx + 1) & (mask as usize);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx,avx2")]
unsafe fn avx2_probe(keys: &[i32], mask: u32, key: i32) -> ProbeOutcome {
    use std::arch::x86_64::*;

    let key_vec = _mm256_set1_epi32(key);
    let free_vec = _mm256_set1_epi32(FREE);
    let mask_usize = mask as usize;
    let mut idx = (mix(key) & mask) as usize;

    loop {
        // Gather this window's 8 slots with per-lane wraparound instead of
        // a single contiguous load. A contiguous load starting near the end
        // of the live range would run into the guard region's `END` filler
        // for the lanes past `capacity`, rather than the slots it actually
        // wraps to -- silently skipping whatever lives there. Since `idx`
        // advances by 8 (mod capacity) each iteration, those skipped slots
        // are never the starting point of a later window either, so a probe
        // could cycle forever even with a reachable free slot. Wrapping each
        // lane's index individually makes the window match what the scalar
        // probe would see slot by slot.
        let mut window_buf = [0i32; 8];
        for (lane, slot) in window_buf.iter_mut().enumerate() {
            *slot = keys[(idx + lane) & mask_usize];
        }
        let window = _mm256_loadu_si256(window_buf.as_ptr().cast());

        let key_eq = _mm256_cmpeq_epi32(window, key_vec);
        let key_bits = _mm256_movemask_ps(_mm256_castsi256_ps(key_eq));
        debug_assert!(key_bits.count_ones() <= 1, "duplicate key in probe window");
        if key_bits != 0 {
            let lane = key_bits.trailing_zeros() as usize;
            return ProbeOutcome::Found(((idx + lane) & mask_usize) as u32);
        }

        let free_eq = _mm256_cmpeq_epi32(window, free_vec);
        let free_bits = _mm256_movemask_ps(_mm256_castsi256_ps(free_eq));
        if free_bits != 0 {
            let lane = free_bits.trailing_zeros() as usize;
            return ProbeOutcome::Absent(((idx + lane) & mask_usize) as u32);
        }

        idx = (idx + 8) & mask_usize;
    }
}

#[cfg(not(target_arch = "x86_64"))]
unsafe fn avx2_probe(keys: &[i32], mask: u32, key: i32) -> ProbeOutcome {
    scalar_probe(keys, mask, key)
}

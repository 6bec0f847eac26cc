//! Half-SIMD tier: the 256-bit payload split into two independent 128-bit
//! halves. Loads and stores for the two halves have no ordering relationship
//! to each other, so unaligned loads are fine here (unlike the wide tier).

#![cfg(target_arch = "x86_64")]

use std::arch::x86_64::*;

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn load_halves(v: &[u64; 4]) -> (__m128i, __m128i) {
    let ptr = v.as_ptr().cast::<__m128i>();
    (_mm_loadu_si128(ptr), _mm_loadu_si128(ptr.add(1)))
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn store_halves(dst: &mut [u64; 4], lo: __m128i, hi: __m128i) {
    let ptr = dst.as_mut_ptr().cast::<__m128i>();
    _mm_storeu_si128(ptr, lo);
    _mm_storeu_si128(ptr.add(1), hi);
}

/// Single-instruction-per-half all-ones check: `cmpeq` then `movemask`.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn half_is_all_ones(v: __m128i) -> bool {
    let cmp = _mm_cmpeq_epi8(v, _mm_set1_epi8(-1));
    _mm_movemask_epi8(cmp) == 0xFFFF
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn half_is_zero(v: __m128i) -> bool {
    let cmp = _mm_cmpeq_epi8(v, _mm_setzero_si128());
    _mm_movemask_epi8(cmp) == 0xFFFF
}

/// # Safety
/// Caller must have confirmed `sse2` is available (always true on x86_64).
pub unsafe fn has_all(a: &[u64; 4], b: &[u64; 4]) -> bool {
    let (a_lo, a_hi) = load_halves(a);
    let (b_lo, b_hi) = load_halves(b);
    // has_all <=> (NOT a AND b) == 0 for both halves
    half_is_zero(_mm_andnot_si128(a_lo, b_lo)) && half_is_zero(_mm_andnot_si128(a_hi, b_hi))
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn has_any(a: &[u64; 4], b: &[u64; 4]) -> bool {
    let (a_lo, a_hi) = load_halves(a);
    let (b_lo, b_hi) = load_halves(b);
    !half_is_zero(_mm_and_si128(a_lo, b_lo)) || !half_is_zero(_mm_and_si128(a_hi, b_hi))
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn not_has_any(a: &[u64; 4], b: &[u64; 4]) -> bool {
    !has_any(a, b)
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn add(dst: &mut [u64; 4], other: &[u64; 4]) {
    let (d_lo, d_hi) = load_halves(dst);
    let (o_lo, o_hi) = load_halves(other);
    store_halves(dst, _mm_or_si128(d_lo, o_lo), _mm_or_si128(d_hi, o_hi));
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn remove(dst: &mut [u64; 4], other: &[u64; 4]) {
    let (d_lo, d_hi) = load_halves(dst);
    let (o_lo, o_hi) = load_halves(other);
    // dst AND NOT other
    store_halves(dst, _mm_andnot_si128(o_lo, d_lo), _mm_andnot_si128(o_hi, d_hi));
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn invert(dst: &mut [u64; 4]) {
    let (d_lo, d_hi) = load_halves(dst);
    let ones = _mm_set1_epi8(-1);
    store_halves(dst, _mm_xor_si128(d_lo, ones), _mm_xor_si128(d_hi, ones));
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn clear(dst: &mut [u64; 4]) {
    store_halves(dst, _mm_setzero_si128(), _mm_setzero_si128());
}

/// # Safety
/// Caller must have confirmed `sse2` is available.
pub unsafe fn equals(a: &[u64; 4], b: &[u64; 4]) -> bool {
    let (a_lo, a_hi) = load_halves(a);
    let (b_lo, b_hi) = load_halves(b);
    half_is_all_ones(_mm_cmpeq_epi32(a_lo, b_lo)) && half_is_all_ones(_mm_cmpeq_epi32(a_hi, b_hi))
}

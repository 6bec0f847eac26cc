//! Wide-SIMD tier: a single 256-bit vector load/store per operand.
//!
//! Natural 32-byte alignment (`FixedBitSet` is `repr(C, align(32))`) is a
//! correctness precondition here: we use aligned loads/stores, which fault
//! on misaligned pointers instead of silently doing the wrong thing.

#![cfg(target_arch = "x86_64")]

use std::arch::x86_64::*;

#[inline]
#[target_feature(enable = "avx,avx2")]
unsafe fn load(v: &[u64; 4]) -> __m256i {
    _mm256_load_si256(v.as_ptr().cast())
}

#[inline]
#[target_feature(enable = "avx,avx2")]
unsafe fn store(dst: &mut [u64; 4], v: __m256i) {
    _mm256_store_si256(dst.as_mut_ptr().cast(), v);
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn has_all(a: &[u64; 4], b: &[u64; 4]) -> bool {
    // "test" family: NOT a AND b == 0, single instruction (vptest).
    _mm256_testc_si256(load(a), load(b)) != 0
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn has_any(a: &[u64; 4], b: &[u64; 4]) -> bool {
    _mm256_testz_si256(load(a), load(b)) == 0
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn not_has_any(a: &[u64; 4], b: &[u64; 4]) -> bool {
    _mm256_testz_si256(load(a), load(b)) != 0
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn add(dst: &mut [u64; 4], other: &[u64; 4]) {
    let v = _mm256_or_si256(load(dst), load(other));
    store(dst, v);
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn remove(dst: &mut [u64; 4], other: &[u64; 4]) {
    // dst AND NOT other; andnot(a, b) computes (NOT a) AND b, so operands flip.
    let v = _mm256_andnot_si256(load(other), load(dst));
    store(dst, v);
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn invert(dst: &mut [u64; 4]) {
    let ones = _mm256_set1_epi8(-1);
    let v = _mm256_xor_si256(load(dst), ones);
    store(dst, v);
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn clear(dst: &mut [u64; 4]) {
    store(dst, _mm256_setzero_si256());
}

/// # Safety
/// Caller must have confirmed `avx2` is available.
pub unsafe fn equals(a: &[u64; 4], b: &[u64; 4]) -> bool {
    let cmp = _mm256_cmpeq_epi64(load(a), load(b));
    _mm256_movemask_epi8(cmp) == -1
}

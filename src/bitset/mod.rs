//! 256-bit flag set with a SIMD fast path and scalar fallback.
//!
//! Storage is four 64-bit lanes, lane `i` covering bits `[64*i, 64*i + 64)`.
//! All mutating and query operations are dispatched at call time to the best
//! available tier (AVX2 → SSE2 → scalar); the three tiers are required to
//! agree bit-for-bit (see the `tier_equivalence` proptest module).

mod avx2;
mod scalar;
mod sse2;

use std::fmt;
use std::sync::OnceLock;

/// Which implementation tier the bitset dispatch resolved to on this CPU.
/// Resolved once (lazily) and logged at `debug!` the first time it's read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    Avx2,
    Sse2,
    Scalar,
}

static TIER: OnceLock<CapabilityTier> = OnceLock::new();

/// Resolve (and cache) the dispatch tier for this process.
pub fn capability_tier() -> CapabilityTier {
    *TIER.get_or_init(|| {
        let tier = detect_tier();
        log::debug!("bitset dispatch resolved to {tier:?}");
        tier
    })
}

#[cfg(target_arch = "x86_64")]
fn detect_tier() -> CapabilityTier {
    if is_x86_feature_detected!("avx2") {
        CapabilityTier::Avx2
    } else if is_x86_feature_detected!("sse2") {
        CapabilityTier::Sse2
    } else {
        CapabilityTier::Scalar
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_tier() -> CapabilityTier {
    CapabilityTier::Scalar
}

/// A fixed-size, 256-flag set: 32 bytes, aligned for 256-bit vector loads.
///
/// Equality is bitwise equality; there are no derived fields. `FixedBitSet`
/// is `Copy` because the whole point of the fixed layout is that moving one
/// around is just moving 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C, align(32))]
pub struct FixedBitSet {
    lanes: [u64; 4],
}

/// Read-only projection of a `FixedBitSet`: exposes only the query subset of
/// the API. Conversion in either direction is a 32-byte value copy, not a
/// borrow, so there's nothing to invalidate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBitSetView {
    lanes: [u64; 4],
}

impl FixedBitSet {
    pub const BITS: usize = 256;

    /// All bits zero.
    #[inline]
    pub fn empty() -> Self {
        Self { lanes: [0; 4] }
    }

    /// Exactly bit `bit` set.
    ///
    /// # Panics
    /// Panics if `bit >= 256`.
    #[inline]
    pub fn single(bit: u16) -> Self {
        let mut s = Self::empty();
        s.set_bit(bit);
        s
    }

    /// Set each bit in `bits`; duplicates are idempotent.
    pub fn many(bits: impl IntoIterator<Item = u16>) -> Self {
        let mut s = Self::empty();
        for b in bits {
            s.set_bit(b);
        }
        s
    }

    #[inline]
    fn set_bit(&mut self, bit: u16) {
        assert!((bit as usize) < Self::BITS, "bit index {bit} out of range [0, 256)");
        let lane = (bit / 64) as usize;
        let offset = (bit % 64) as u32;
        self.lanes[lane] |= 1u64 << offset;
    }

    #[inline]
    pub fn test(&self, bit: u16) -> bool {
        assert!((bit as usize) < Self::BITS, "bit index {bit} out of range [0, 256)");
        let lane = (bit / 64) as usize;
        let offset = (bit % 64) as u32;
        (self.lanes[lane] >> offset) & 1 != 0
    }

    /// `(self AND other) == other`
    #[inline]
    pub fn has_all(&self, other: &Self) -> bool {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::has_all(&self.lanes, &other.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::has_all(&self.lanes, &other.lanes) },
            CapabilityTier::Scalar => scalar::has_all(&self.lanes, &other.lanes),
        }
    }

    /// `(self AND other) != 0`
    #[inline]
    pub fn has_any(&self, other: &Self) -> bool {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::has_any(&self.lanes, &other.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::has_any(&self.lanes, &other.lanes) },
            CapabilityTier::Scalar => scalar::has_any(&self.lanes, &other.lanes),
        }
    }

    /// `(self AND other) == 0`
    #[inline]
    pub fn not_has_any(&self, other: &Self) -> bool {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::not_has_any(&self.lanes, &other.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::not_has_any(&self.lanes, &other.lanes) },
            CapabilityTier::Scalar => scalar::not_has_any(&self.lanes, &other.lanes),
        }
    }

    /// `self := self OR other`
    #[inline]
    pub fn add(&mut self, other: &Self) {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::add(&mut self.lanes, &other.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::add(&mut self.lanes, &other.lanes) },
            CapabilityTier::Scalar => scalar::add(&mut self.lanes, &other.lanes),
        }
    }

    /// `self := self AND NOT other`
    #[inline]
    pub fn remove(&mut self, other: &Self) {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::remove(&mut self.lanes, &other.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::remove(&mut self.lanes, &other.lanes) },
            CapabilityTier::Scalar => scalar::remove(&mut self.lanes, &other.lanes),
        }
    }

    /// `self := NOT self`
    #[inline]
    pub fn invert(&mut self) {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::invert(&mut self.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::invert(&mut self.lanes) },
            CapabilityTier::Scalar => scalar::invert(&mut self.lanes),
        }
    }

    /// `self := 0`
    #[inline]
    pub fn clear(&mut self) {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::clear(&mut self.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::clear(&mut self.lanes) },
            CapabilityTier::Scalar => scalar::clear(&mut self.lanes),
        }
    }

    /// Bytewise equality, dispatched the same way as the other predicates
    /// (the derived `PartialEq` is scalar-only and used for tests that must
    /// stay tier-independent).
    #[inline]
    pub fn equals(&self, other: &Self) -> bool {
        match capability_tier() {
            CapabilityTier::Avx2 => unsafe { avx2::equals(&self.lanes, &other.lanes) },
            CapabilityTier::Sse2 => unsafe { sse2::equals(&self.lanes, &other.lanes) },
            CapabilityTier::Scalar => scalar::equals(&self.lanes, &other.lanes),
        }
    }

    /// Deterministic 32-bit hash of the 32-byte payload.
    pub fn hash_value(&self) -> u32 {
        let mut h = 0x811C_9DC5u32;
        for lane in self.lanes {
            for byte in lane.to_le_bytes() {
                h ^= byte as u32;
                h = h.wrapping_mul(16_777_619);
            }
        }
        h
    }

    #[inline]
    pub fn view(&self) -> FixedBitSetView {
        FixedBitSetView { lanes: self.lanes }
    }
}

impl fmt::Display for FixedBitSet {
    /// 256-character string, character `i` is `'1'` if bit `i` is set.
    /// Lane-major order: lanes 0..3, bit 0..63 within each lane.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(Self::BITS);
        for lane in self.lanes {
            for offset in 0..64 {
                s.push(if (lane >> offset) & 1 != 0 { '1' } else { '0' });
            }
        }
        f.write_str(&s)
    }
}

impl fmt::Debug for FixedBitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBitSet").field("lanes", &self.lanes).finish()
    }
}

impl Default for FixedBitSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<FixedBitSet> for FixedBitSetView {
    fn from(b: FixedBitSet) -> Self {
        b.view()
    }
}

impl FixedBitSetView {
    #[inline]
    pub fn to_owned(self) -> FixedBitSet {
        FixedBitSet { lanes: self.lanes }
    }

    #[inline]
    pub fn test(&self, bit: u16) -> bool {
        self.to_owned().test(bit)
    }

    #[inline]
    pub fn has_all(&self, other: &FixedBitSet) -> bool {
        self.to_owned().has_all(other)
    }

    #[inline]
    pub fn has_any(&self, other: &FixedBitSet) -> bool {
        self.to_owned().has_any(other)
    }

    #[inline]
    pub fn not_has_any(&self, other: &FixedBitSet) -> bool {
        self.to_owned().not_has_any(other)
    }

    #[inline]
    pub fn equals(&self, other: &FixedBitSet) -> bool {
        self.to_owned().equals(other)
    }
}

impl fmt::Display for FixedBitSetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_owned(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_bits() {
        let e = FixedBitSet::empty();
        for b in 0..256u16 {
            assert!(!e.test(b));
        }
    }

    #[test]
    fn single_sets_exactly_one_bit() {
        for b in [0u16, 1, 63, 64, 100, 255] {
            let s = FixedBitSet::single(b);
            for i in 0..256u16 {
                assert_eq!(s.test(i), i == b, "bit {i} vs single({b})");
            }
        }
    }

    #[test]
    #[should_panic]
    fn single_rejects_out_of_range() {
        FixedBitSet::single(256);
    }

    #[test]
    fn many_is_idempotent_on_duplicates() {
        let a = FixedBitSet::many([1, 2, 3]);
        let b = FixedBitSet::many([1, 1, 2, 2, 3, 3, 3]);
        assert!(a.equals(&b));
    }

    #[test]
    fn union_associativity() {
        let a = FixedBitSet::many([1, 5, 200]);
        let b = FixedBitSet::many([5, 9, 17]);
        let c = FixedBitSet::many([2, 9, 255]);

        let mut ab_c = a;
        ab_c.add(&b);
        ab_c.add(&c);

        let mut bc = b;
        bc.add(&c);
        let mut a_bc = a;
        a_bc.add(&bc);

        assert!(ab_c.equals(&a_bc));
    }

    #[test]
    fn remove_then_has_all_is_false_unless_b_empty() {
        let a = FixedBitSet::many([1, 2, 3]);
        let b = FixedBitSet::many([2, 3]);
        let mut union = a;
        union.add(&b);
        let mut removed = union;
        removed.remove(&b);
        assert!(!removed.has_all(&b));
        assert!(removed.equals(&FixedBitSet::single(1)));
    }

    #[test]
    fn invert_is_involutive() {
        let a = FixedBitSet::many([0, 63, 64, 255]);
        let mut twice = a;
        twice.invert();
        twice.invert();
        assert!(a.equals(&twice));
    }

    #[test]
    fn clear_yields_empty() {
        let mut a = FixedBitSet::many([1, 2, 3]);
        a.clear();
        assert!(a.equals(&FixedBitSet::empty()));
    }

    #[test]
    fn has_all_reflexive_and_with_empty() {
        let a = FixedBitSet::many([4, 8, 15, 16, 23, 42]);
        assert!(a.has_all(&a));
        assert!(a.has_all(&FixedBitSet::empty()));
        assert!(!a.has_any(&FixedBitSet::empty()));
    }

    #[test]
    fn not_has_any_is_negation_of_has_any() {
        let a = FixedBitSet::many([1, 2, 3]);
        let b = FixedBitSet::many([3, 4, 5]);
        let c = FixedBitSet::many([10, 11]);
        assert_eq!(a.not_has_any(&b), !a.has_any(&b));
        assert_eq!(a.not_has_any(&c), !a.has_any(&c));
    }

    #[test]
    fn invert_flips_membership_of_every_bit() {
        let a = FixedBitSet::many([0, 1, 64, 128, 255]);
        let mut inverted = a;
        inverted.invert();
        for i in 0..256u16 {
            assert_ne!(a.test(i), inverted.test(i), "bit {i}");
        }
    }

    #[test]
    fn to_string_matches_lane_major_layout() {
        let s = FixedBitSet::many([31, 63, 95, 127, 159, 191, 223, 255]).to_string();
        assert_eq!(s.len(), 256);
        let group = format!("{}1", "0".repeat(31));
        assert_eq!(s, group.repeat(8));
    }

    #[test]
    fn scenario_has_all_has_any() {
        let a = FixedBitSet::single(100);
        let b = FixedBitSet::many([50, 75, 100, 125]);
        assert!(a.has_any(&b));
        assert!(b.has_all(&FixedBitSet::many([50, 75, 100])));
        assert!(!FixedBitSet::many([75, 100, 125]).has_all(&FixedBitSet::many([50, 75, 100])));
    }

    #[test]
    fn hash_is_deterministic() {
        let a = FixedBitSet::many([1, 2, 3]);
        let b = FixedBitSet::many([1, 2, 3]);
        assert_eq!(a.hash_value(), b.hash_value());
        let c = FixedBitSet::many([1, 2, 4]);
        assert_ne!(a.hash_value(), c.hash_value());
    }

    #[test]
    fn view_round_trips_and_exposes_queries() {
        let a = FixedBitSet::many([3, 200]);
        let view = a.view();
        assert!(view.test(3));
        assert!(!view.test(4));
        assert!(view.equals(&a));
        assert_eq!(view.to_owned(), a);
    }
}


/// Pins §8's "bitset laws" against arbitrary lane patterns, dispatched
/// through the public API rather than any one tier directly.
#[cfg(test)]
mod law_properties {
    use super::*;
    use proptest::prelude::*;

    fn from_lanes(lanes: [u64; 4]) -> FixedBitSet {
        FixedBitSet { lanes }
    }

    proptest! {
        #[test]
        fn union_is_associative(a: [u64; 4], b: [u64; 4], c: [u64; 4]) {
            let (a, b, c) = (from_lanes(a), from_lanes(b), from_lanes(c));

            let mut ab_then_c = a;
            ab_then_c.add(&b);
            ab_then_c.add(&c);

            let mut bc = b;
            bc.add(&c);
            let mut a_then_bc = a;
            a_then_bc.add(&bc);

            prop_assert!(ab_then_c.equals(&a_then_bc));
        }

        #[test]
        fn remove_drops_b_without_disturbing_the_rest(a: [u64; 4], b: [u64; 4]) {
            let (a, b) = (from_lanes(a), from_lanes(b));
            let mut union = a;
            union.add(&b);
            let mut removed = union;
            removed.remove(&b);

            for i in 0..256u16 {
                if b.test(i) {
                    prop_assert!(!removed.test(i));
                } else {
                    prop_assert_eq!(removed.test(i), a.test(i));
                }
            }
        }

        #[test]
        fn invert_is_involutive(a: [u64; 4]) {
            let a = from_lanes(a);
            let mut twice = a;
            twice.invert();
            twice.invert();
            prop_assert!(a.equals(&twice));
        }

        #[test]
        fn invert_flips_every_bit(a: [u64; 4]) {
            let a = from_lanes(a);
            let mut inverted = a;
            inverted.invert();
            for i in 0..256u16 {
                prop_assert_ne!(a.test(i), inverted.test(i));
            }
        }

        #[test]
        fn clear_yields_empty(a: [u64; 4]) {
            let mut a = from_lanes(a);
            a.clear();
            prop_assert!(a.equals(&FixedBitSet::empty()));
        }

        #[test]
        fn has_all_is_reflexive_and_respects_empty(a: [u64; 4]) {
            let a = from_lanes(a);
            prop_assert!(a.has_all(&a));
            prop_assert!(a.has_all(&FixedBitSet::empty()));
            prop_assert!(!a.has_any(&FixedBitSet::empty()));
        }

        #[test]
        fn not_has_any_negates_has_any(a: [u64; 4], b: [u64; 4]) {
            let (a, b) = (from_lanes(a), from_lanes(b));
            prop_assert_eq!(a.not_has_any(&b), !a.has_any(&b));
        }
    }
}

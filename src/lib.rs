//! Core ECS memory substrate.
//!
//! Two primitives, each with a SIMD fast path and a scalar fallback:
//! - [`FixedBitSet`] — a 256-bit flag set ("which components does entity E have?").
//! - [`IntKeyMap`] — an open-addressed `i32`-keyed map with a slot-token API
//!   ("where is entity E's component data?").
//!
//! Everything else an ECS would need (entity allocation, component storage,
//! system scheduling) is out of scope; this crate is the substrate it would
//! be built on.

pub mod bitset;
pub mod intmap;
mod mixing;

pub use bitset::{CapabilityTier, FixedBitSet, FixedBitSetView};
pub use intmap::{IntKeyMap, IntMapError, SlotIter, SlotToken};

/// Returns `Ok(())` if the process's detected dispatch tier can satisfy
/// `tier`, `Err(Unsupported)` otherwise. The scalar tier is always
/// satisfiable, so a caller that only ever asks for `Scalar` never errors.
pub fn require_capability(tier: CapabilityTier) -> Result<(), IntMapError> {
    let current = bitset::capability_tier();
    let satisfied = match tier {
        CapabilityTier::Scalar => true,
        CapabilityTier::Sse2 => matches!(current, CapabilityTier::Sse2 | CapabilityTier::Avx2),
        CapabilityTier::Avx2 => matches!(current, CapabilityTier::Avx2),
    };
    if satisfied {
        Ok(())
    } else {
        let name = match tier {
            CapabilityTier::Avx2 => "avx2",
            CapabilityTier::Sse2 => "sse2",
            CapabilityTier::Scalar => "scalar",
        };
        Err(IntMapError::Unsupported(name))
    }
}

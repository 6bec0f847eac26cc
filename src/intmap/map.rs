//! Container: storage layout, growth, backward-shift deletion, iteration,
//! and the slot-token API.

use super::error::IntMapError;
use super::probe::{self, ProbeOutcome};
use crate::mixing;

/// Reserved key marking an empty slot.
pub const FREE: i32 = -1;
/// Reserved key marking the end of the live key array.
pub const END: i32 = -2;

/// Extra sentinel slots appended past `capacity` so an 8-wide SIMD probe
/// window never reads out of bounds, regardless of where in `[0, capacity)`
/// it starts.
const GUARD: usize = 7;

const DEFAULT_INITIAL_CAPACITY: i64 = 256;
const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Opaque handle to a slot in a specific `IntKeyMap`. Plain `Copy` integer;
/// valid only until the next mutating call on the map that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotToken(u32);

impl SlotToken {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Open-addressed map keyed by 32-bit signed integers, SIMD-probed, with
/// backward-shift deletion and a stable-per-table slot token API.
pub struct IntKeyMap<V> {
    keys: Vec<i32>,
    values: Vec<Option<V>>,
    capacity: usize,
    mask: u32,
    count: usize,
    max_count: usize,
    load_factor: f64,
}

impl<V> IntKeyMap<V> {
    /// `new(initial_capacity = 256, load_factor = 0.75)`.
    pub fn new() -> Self {
        Self::with_capacity_and_load_factor(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR)
            .expect("default construction parameters are always in range")
    }

    pub fn with_capacity_and_load_factor(
        initial_capacity: i64,
        load_factor: f64,
    ) -> Result<Self, IntMapError> {
        if !(2..=(1i64 << 30)).contains(&initial_capacity) {
            return Err(IntMapError::ArgumentOutOfRange {
                argument: "initial_capacity",
                value: initial_capacity as f64,
                reason: "must be in [2, 2^30]",
            });
        }
        if !(load_factor > 0.0 && load_factor < 1.0) {
            return Err(IntMapError::ArgumentOutOfRange {
                argument: "load_factor",
                value: load_factor,
                reason: "must be in (0, 1)",
            });
        }

        let capacity = mixing::round_up_to_power_of_two(initial_capacity as u64) as usize;
        let mut map = IntKeyMap {
            keys: Vec::new(),
            values: Vec::new(),
            capacity: 0,
            mask: 0,
            count: 0,
            max_count: 1,
            load_factor,
        };
        map.init_storage(capacity);
        Ok(map)
    }

    fn init_storage(&mut self, capacity: usize) {
        let mut keys = vec![FREE; capacity + GUARD];
        for slot in keys.iter_mut().skip(capacity) {
            *slot = END;
        }
        self.keys = keys;
        self.values = (0..capacity).map(|_| None).collect();
        self.capacity = capacity;
        self.mask = (capacity - 1) as u32;
        self.max_count = ((capacity as f64 * self.load_factor).floor() as usize).max(1);
    }

    #[inline]
    fn desired_slot(&self, key: i32) -> usize {
        (mixing::mix(key) & self.mask) as usize
    }

    fn check_insertable(key: i32) -> Result<(), IntMapError> {
        if key == FREE || key == END {
            Err(IntMapError::ReservedKey(key))
        } else {
            Ok(())
        }
    }

    fn probe_raw(&self, key: i32) -> (bool, SlotToken) {
        match probe::probe(&self.keys, self.mask, key) {
            ProbeOutcome::Found(idx) => (true, SlotToken(idx)),
            ProbeOutcome::Absent(idx) => (false, SlotToken(idx)),
        }
    }

    /// `find(key) -> (bool, token)`. On "absent" the token points at the
    /// first free slot of the would-be insertion chain.
    #[inline]
    pub fn find(&self, key: i32) -> (bool, SlotToken) {
        self.probe_raw(key)
    }

    /// Insert (or overwrite) `key => value`, returning its token.
    pub fn insert(&mut self, key: i32, value: V) -> Result<SlotToken, IntMapError> {
        Self::check_insertable(key)?;
        let (found, token) = self.probe_raw(key);
        if found {
            self.values[token.0 as usize] = Some(value);
            return Ok(token);
        }
        let idx = token.0 as usize;
        self.keys[idx] = key;
        self.values[idx] = Some(value);
        self.count += 1;
        if self.count > self.max_count {
            self.grow();
            let (found, token) = self.probe_raw(key);
            debug_assert!(found, "just-inserted key must be found after growth");
            return Ok(token);
        }
        Ok(token)
    }

    /// Locate `key`, inserting a default-valued slot for it if absent.
    pub fn find_or_insert(&mut self, key: i32) -> Result<SlotToken, IntMapError>
    where
        V: Default,
    {
        Self::check_insertable(key)?;
        let (found, token) = self.probe_raw(key);
        if found {
            return Ok(token);
        }
        let idx = token.0 as usize;
        self.keys[idx] = key;
        self.values[idx] = Some(V::default());
        self.count += 1;
        if self.count > self.max_count {
            self.grow();
            let (found, token) = self.probe_raw(key);
            debug_assert!(found, "just-inserted key must be found after growth");
            return Ok(token);
        }
        Ok(token)
    }

    /// Convenience accessor: `value_for(key)` errors instead of returning a
    /// would-be-insertion token.
    pub fn value_for(&mut self, key: i32) -> Result<&mut V, IntMapError> {
        let (found, token) = self.probe_raw(key);
        if !found {
            return Err(IntMapError::KeyNotFound(key));
        }
        Ok(self.value_of(token))
    }

    fn grow(&mut self) {
        let old_capacity = self.capacity;
        let old_keys = std::mem::take(&mut self.keys);
        let mut old_values = std::mem::take(&mut self.values);

        let new_capacity = mixing::next_power_of_two(old_capacity as u64) as usize;
        log::trace!("IntKeyMap growing capacity {old_capacity} -> {new_capacity}");
        self.init_storage(new_capacity);

        for i in 0..old_capacity {
            let k = old_keys[i];
            if k != FREE {
                let (found, token) = self.probe_raw(k);
                debug_assert!(!found, "fresh table cannot already contain a re-inserted key");
                let idx = token.0 as usize;
                self.keys[idx] = k;
                self.values[idx] = old_values[i].take();
            }
        }
    }

    /// `remove(token)`. The slot must be occupied.
    pub fn remove(&mut self, token: SlotToken) -> Result<(), IntMapError> {
        let idx = token.0 as usize;
        if idx >= self.capacity || self.keys[idx] == FREE || self.keys[idx] == END {
            return Err(IntMapError::InvalidSlot(token));
        }
        self.backward_shift_remove(idx);
        self.count -= 1;
        Ok(())
    }

    /// Remove every key in `keys` that is currently present; absent keys are
    /// silently skipped.
    pub fn remove_all(&mut self, keys: impl IntoIterator<Item = i32>) {
        for key in keys {
            let (found, token) = self.probe_raw(key);
            if found {
                self.remove(token).expect("token from find() on a present key is always valid");
            }
        }
    }

    fn backward_shift_remove(&mut self, removed: usize) {
        self.values[removed] = None;
        let mask = self.mask as usize;
        let mut hole = removed;
        loop {
            let i = (hole + 1) & mask;
            let k = self.keys[i];
            if k == FREE {
                self.keys[hole] = FREE;
                return;
            }
            // Shift iff the hole lies strictly between `d` (inclusive) and
            // `i` (exclusive) going forward around the circular array, i.e.
            // the circular distance from `d` to `i` exceeds the circular
            // distance from `d` to the hole. Never true when `i == d`
            // (distance to `i` is then 0), so a home-positioned key is never
            // displaced backward out of its own slot.
            let d = self.desired_slot(k);
            let i_dist = i.wrapping_sub(d) & mask;
            let hole_dist = hole.wrapping_sub(d) & mask;
            let shift = i_dist > hole_dist;
            if !shift {
                self.keys[hole] = FREE;
                return;
            }
            self.keys[hole] = k;
            self.values[hole] = self.values[i].take();
            hole = i;
        }
    }

    /// Empty the map. Capacity is unchanged; a subsequent insert of a
    /// previously-present key behaves like inserting into a fresh map of the
    /// same capacity.
    pub fn clear(&mut self) {
        for i in 0..self.capacity {
            self.keys[i] = FREE;
            self.values[i] = None;
        }
        self.count = 0;
    }

    /// The integer key stored at `token`'s slot.
    ///
    /// Undefined behavior (debug-asserted) if `token` is stale.
    #[inline]
    pub fn key_of(&self, token: SlotToken) -> i32 {
        debug_assert!((token.0 as usize) < self.capacity, "token out of range");
        self.keys[token.0 as usize]
    }

    /// Mutable view of `token`'s value. Invalidated by the next mutating
    /// call on the map.
    ///
    /// Undefined behavior (debug-asserted) if `token` is stale.
    #[inline]
    pub fn value_of(&mut self, token: SlotToken) -> &mut V {
        let idx = token.0 as usize;
        debug_assert!(
            idx < self.capacity && self.keys[idx] != FREE && self.keys[idx] != END,
            "stale slot token"
        );
        self.values[idx].as_mut().expect("occupied slot always carries Some(value)")
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens for every occupied slot, in storage order. Single-pass; not
    /// restartable across mutation.
    pub fn iter(&self) -> SlotIter<'_> {
        SlotIter { keys: &self.keys, idx: 0 }
    }
}

impl<V> Default for IntKeyMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over occupied slot tokens; stops at the `END` sentinel with no
/// length check.
pub struct SlotIter<'a> {
    keys: &'a [i32],
    idx: usize,
}

impl Iterator for SlotIter<'_> {
    type Item = SlotToken;

    fn next(&mut self) -> Option<SlotToken> {
        loop {
            let k = self.keys[self.idx];
            if k == END {
                return None;
            }
            let cur = self.idx;
            self.idx += 1;
            if k != FREE {
                return Some(SlotToken(cur as u32));
            }
        }
    }
}

//! Dense memoization table
//!
//! Maps `(position, parser)` to a value with open addressing and linear
//! probing. The engine stores one `Arc<ParseResults>` per key; the table is
//! generic so it can be exercised on its own.
//!
//! # Layout
//!
//! 1. **Slots array**: maps hash to entry index ([`EMPTY`] for a free slot)
//! 2. **Entries array**: stores entries contiguously, in insertion order
//!
//! Entries are never removed while a parse run is live, so insertion order is
//! also the order in which keys were first requested.

use super::grammar::ParserId;

/// Marker for a free slot
const EMPTY: usize = usize::MAX;

/// Largest number of entries a table is pre-sized for; it grows past this
/// on demand
pub const MAX_PRESIZED_ENTRIES: usize = 1 << 20;

/// One memoized value
#[derive(Debug, Clone)]
pub struct MemoEntry<V> {
    /// Position in the document
    pub pos: usize,
    /// Parser evaluated at `pos`
    pub parser: ParserId,
    /// The memoized value
    pub value: V,
}

/// Dense memo table with linear probing
#[derive(Debug)]
pub struct MemoTable<V> {
    /// Hash table: maps (hash & (capacity - 1)) -> entry index
    slots: Vec<usize>,

    /// Entries, stored contiguously
    entries: Vec<MemoEntry<V>>,

    /// Number of slots, always a power of two
    capacity: usize,

    /// Load factor threshold (0.0 to 1.0)
    load_factor: f64,

    hits: u64,
    misses: u64,
}

impl<V> Default for MemoTable<V> {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl<V> MemoTable<V> {
    /// Create a table sized for roughly `estimated_entries` keys
    ///
    /// Estimates above [`MAX_PRESIZED_ENTRIES`] are clamped.
    pub fn new(estimated_entries: usize) -> Self {
        let estimated_entries = estimated_entries.min(MAX_PRESIZED_ENTRIES);
        let capacity = estimated_entries.next_power_of_two().max(16);

        Self {
            slots: vec![EMPTY; capacity],
            entries: Vec::with_capacity(estimated_entries),
            capacity,
            load_factor: 0.75,
            hits: 0,
            misses: 0,
        }
    }

    /// Create a table sized for a document and grammar
    pub fn for_input(input_len: usize, parser_count: usize) -> Self {
        // Roughly one evaluated parser per few bytes, a handful of parsers deep
        let estimated = (input_len / 4).saturating_mul(parser_count.clamp(1, 8));
        Self::new(estimated.clamp(64, MAX_PRESIZED_ENTRIES))
    }

    /// Look up the value for `(pos, parser)`
    pub fn get(&mut self, pos: usize, parser: ParserId) -> Option<&V> {
        match self.find(pos, parser) {
            Ok(idx) => {
                self.hits += 1;
                Some(&self.entries[idx].value)
            }
            Err(_) => {
                self.misses += 1;
                None
            }
        }
    }

    /// Return the existing value for a key, or insert one built by `f`
    ///
    /// The boolean is `true` when the value was already present.
    pub fn get_or_insert_with<F>(&mut self, pos: usize, parser: ParserId, f: F) -> (&V, bool)
    where
        F: FnOnce() -> V,
    {
        let mut slot = match self.find(pos, parser) {
            Ok(idx) => {
                self.hits += 1;
                return (&self.entries[idx].value, true);
            }
            Err(slot) => slot,
        };

        self.misses += 1;

        if self.needs_resize() {
            self.resize();
            slot = self.free_slot(pos, parser);
        }

        let idx = self.entries.len();
        self.entries.push(MemoEntry {
            pos,
            parser,
            value: f(),
        });
        self.slots[slot] = idx;

        (&self.entries[idx].value, false)
    }

    /// Number of memoized keys
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been memoized yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (hits, misses, hit rate)
    pub fn stats(&self) -> (u64, u64, f64) {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        (self.hits, self.misses, hit_rate)
    }

    /// Entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &MemoEntry<V>> {
        self.entries.iter()
    }

    /// Entry index on a hit, or the free slot where the key would go
    fn find(&self, pos: usize, parser: ParserId) -> Result<usize, usize> {
        let mut slot = Self::hash(pos, parser, self.capacity);

        loop {
            let idx = self.slots[slot];
            if idx == EMPTY {
                return Err(slot);
            }

            let entry = &self.entries[idx];
            if entry.pos == pos && entry.parser == parser {
                return Ok(idx);
            }

            slot = (slot + 1) & (self.capacity - 1);
        }
    }

    fn free_slot(&self, pos: usize, parser: ParserId) -> usize {
        let mut slot = Self::hash(pos, parser, self.capacity);
        while self.slots[slot] != EMPTY {
            slot = (slot + 1) & (self.capacity - 1);
        }
        slot
    }

    #[inline]
    fn needs_resize(&self) -> bool {
        (self.entries.len() + 1) as f64 / self.capacity as f64 > self.load_factor
    }

    fn resize(&mut self) {
        let new_capacity = self.capacity * 2;
        let mut new_slots = vec![EMPTY; new_capacity];

        for (idx, entry) in self.entries.iter().enumerate() {
            let mut probe = Self::hash(entry.pos, entry.parser, new_capacity);
            while new_slots[probe] != EMPTY {
                probe = (probe + 1) & (new_capacity - 1);
            }
            new_slots[probe] = idx;
        }

        self.slots = new_slots;
        self.capacity = new_capacity;
    }

    /// FNV-1a over position and parser index
    #[inline]
    fn hash(pos: usize, parser: ParserId, capacity: usize) -> usize {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        h ^= pos as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
        h ^= parser.index() as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
        (h as usize) & (capacity - 1)
    }
}

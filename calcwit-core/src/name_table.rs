//! Per-component name tables.
//!
//! Each component carries a fixed-size open-addressed table keyed by the
//! 64-bit hash of a local name. A slot with hash `0` is empty. Lookup starts
//! at `hash & 0xFF` and steps linearly, wrapping around the table, until it
//! finds the hash or an empty slot.
//!
//! ```text
//!   slots[256]: { hash, pos } ──pos──▶ entries[pos]: Signal { offset, sizes }
//!                                                  | SubComponent { offset, sizes }
//! ```

use std::fmt;

use crate::error::{CircuitError, ResolutionError};
use crate::hash::fnv1a;

/// Number of slots in every name table.
pub const NAME_TABLE_SIZE: usize = 256;

const EMPTY_SLOT: u64 = 0;

/// What a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Signal,
    SubComponent,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Signal => write!(f, "signal"),
            EntryKind::SubComponent => write!(f, "sub-component"),
        }
    }
}

/// A resolved name: base offset plus array dimensions (empty for scalars).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameEntry {
    Signal { offset: usize, sizes: Vec<u32> },
    SubComponent { offset: usize, sizes: Vec<u32> },
}

impl NameEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            NameEntry::Signal { .. } => EntryKind::Signal,
            NameEntry::SubComponent { .. } => EntryKind::SubComponent,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            NameEntry::Signal { offset, .. } | NameEntry::SubComponent { offset, .. } => *offset,
        }
    }

    pub fn sizes(&self) -> &[u32] {
        match self {
            NameEntry::Signal { sizes, .. } | NameEntry::SubComponent { sizes, .. } => sizes,
        }
    }

    /// Number of consecutive indices covered by this entry, `None` if the
    /// shape overflows `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        element_count(self.sizes())
    }

    /// Like [`checked_len`](Self::checked_len), saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Product of array dimensions (1 for a scalar), `None` on overflow.
pub fn element_count(sizes: &[u32]) -> Option<usize> {
    sizes
        .iter()
        .try_fold(1usize, |acc, &s| acc.checked_mul(usize::try_from(s).ok()?))
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    hash: u64,
    pos: u32,
}

/// Open-addressed map from name hash to [`NameEntry`], built once per
/// component at circuit-load time.
#[derive(Debug, Clone)]
pub struct NameTable {
    slots: Vec<Slot>,
    entries: Vec<NameEntry>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTable {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::default(); NAME_TABLE_SIZE],
            entries: Vec::new(),
        }
    }

    fn home(hash: u64) -> usize {
        (hash & 0xFF) as usize
    }

    /// Insert `entry` under `hash`.
    pub fn insert(&mut self, hash: u64, entry: NameEntry) -> Result<(), CircuitError> {
        if hash == EMPTY_SLOT {
            return Err(CircuitError::ReservedHash);
        }
        let start = Self::home(hash);
        for step in 0..NAME_TABLE_SIZE {
            let idx = (start + step) % NAME_TABLE_SIZE;
            let slot = &mut self.slots[idx];
            if slot.hash == hash {
                return Err(CircuitError::DuplicateHash { hash });
            }
            if slot.hash == EMPTY_SLOT {
                slot.hash = hash;
                slot.pos = self.entries.len() as u32;
                self.entries.push(entry);
                return Ok(());
            }
        }
        Err(CircuitError::TableFull { hash })
    }

    /// Insert a signal under the hash of `name`.
    pub fn with_signal(mut self, name: &str, offset: usize, sizes: &[u32]) -> Result<Self, CircuitError> {
        self.insert(
            fnv1a(name),
            NameEntry::Signal {
                offset,
                sizes: sizes.to_vec(),
            },
        )?;
        Ok(self)
    }

    /// Insert a sub-component under the hash of `name`.
    pub fn with_sub_component(
        mut self,
        name: &str,
        offset: usize,
        sizes: &[u32],
    ) -> Result<Self, CircuitError> {
        self.insert(
            fnv1a(name),
            NameEntry::SubComponent {
                offset,
                sizes: sizes.to_vec(),
            },
        )?;
        Ok(self)
    }

    /// Resolve `hash` to its entry.
    pub fn lookup(&self, hash: u64) -> Result<&NameEntry, ResolutionError> {
        if hash == EMPTY_SLOT {
            return Err(ResolutionError::NotFound { hash });
        }
        let start = Self::home(hash);
        for step in 0..NAME_TABLE_SIZE {
            let slot = self.slots[(start + step) % NAME_TABLE_SIZE];
            if slot.hash == hash {
                return Ok(&self.entries[slot.pos as usize]);
            }
            if slot.hash == EMPTY_SLOT {
                break;
            }
        }
        Err(ResolutionError::NotFound { hash })
    }

    fn lookup_kind(&self, hash: u64, expected: EntryKind) -> Result<&NameEntry, ResolutionError> {
        let entry = self.lookup(hash)?;
        if entry.kind() != expected {
            return Err(ResolutionError::TypeMismatch {
                hash,
                expected,
                found: entry.kind(),
            });
        }
        Ok(entry)
    }

    pub fn signal_offset(&self, hash: u64) -> Result<usize, ResolutionError> {
        self.lookup_kind(hash, EntryKind::Signal).map(NameEntry::offset)
    }

    pub fn signal_sizes(&self, hash: u64) -> Result<&[u32], ResolutionError> {
        self.lookup_kind(hash, EntryKind::Signal).map(NameEntry::sizes)
    }

    pub fn sub_component_offset(&self, hash: u64) -> Result<usize, ResolutionError> {
        self.lookup_kind(hash, EntryKind::SubComponent)
            .map(NameEntry::offset)
    }

    pub fn sub_component_sizes(&self, hash: u64) -> Result<&[u32], ResolutionError> {
        self.lookup_kind(hash, EntryKind::SubComponent)
            .map(NameEntry::sizes)
    }

    /// Occupied slots as `(hash, entry)` pairs, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &NameEntry)> {
        self.slots
            .iter()
            .filter(|slot| slot.hash != EMPTY_SLOT)
            .map(|slot| (slot.hash, &self.entries[slot.pos as usize]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

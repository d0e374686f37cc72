use crate::common::{validate_capacity, OpResult, SlotIndexer, DEFAULT_CAPACITY};
use crate::MapError;

/// Eviction rounds allowed before an insert is declared failed.
pub const MAX_DISPLACEMENTS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Occupied { key: u64, value: u64 },
}

/// Two-choice cuckoo hashing with bounded displacement.
///
/// Every key has exactly two candidate slots; a lookup never examines more
/// than those two. There are no tombstones: a deleted slot is immediately
/// reusable. Insert failure is heuristic, not structural — the table may
/// still have free slots the two-choice scheme cannot reach from this
/// key's hash.
#[derive(Debug, Clone)]
pub struct CuckooMap {
    slots: Vec<Slot>,
    indexer: SlotIndexer,
    capacity: usize,
    size: usize,
    failed_inserts: usize,
}

impl CuckooMap {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).expect("capacity must be a nonzero power of two")
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, MapError> {
        validate_capacity(capacity)?;
        Ok(Self {
            slots: vec![Slot::Empty; capacity],
            indexer: SlotIndexer::new(capacity),
            capacity,
            size: 0,
            failed_inserts: 0,
        })
    }

    /// Insert or update a key-value pair.
    ///
    /// A key already resident at either candidate slot is updated in place.
    /// Otherwise an empty candidate is taken directly, or a displacement
    /// cycle begins: the resident of the first candidate is kicked to its
    /// other slot, cascading for at most `MAX_DISPLACEMENTS` rounds. The
    /// insert is a one-time net size increase no matter how long the cycle
    /// runs. On bound exhaustion the eviction chain is unwound so every
    /// resident returns to its original slot and only the requested key is
    /// left unplaced.
    pub fn insert(&mut self, key: u64, value: u64) -> OpResult {
        let mut result = OpResult::default();
        let (i1, i2) = self.indexer.cuckoo_slots(key);

        if let Slot::Occupied { key: resident, .. } = self.slots[i1] {
            if resident == key {
                self.slots[i1] = Slot::Occupied { key, value };
                result.success = true;
                return result;
            }
        }
        if let Slot::Occupied { key: resident, .. } = self.slots[i2] {
            if resident == key {
                self.slots[i2] = Slot::Occupied { key, value };
                result.success = true;
                return result;
            }
        }

        if self.slots[i1] == Slot::Empty {
            self.slots[i1] = Slot::Occupied { key, value };
            self.size += 1;
            result.success = true;
            return result;
        }
        if self.slots[i2] == Slot::Empty {
            self.slots[i2] = Slot::Occupied { key, value };
            self.size += 1;
            result.success = true;
            return result;
        }

        // Both candidates occupied: displacement cycle. The visited slots
        // are recorded so a failed insert can be unwound without losing
        // any resident entry.
        let mut path: Vec<usize> = Vec::new();
        let mut cur_key = key;
        let mut cur_value = value;
        let mut cur_index = i1;

        while result.displacement < MAX_DISPLACEMENTS {
            result.displacement += 1;

            let (evicted_key, evicted_value) = match self.slots[cur_index] {
                Slot::Occupied { key, value } => (key, value),
                // The cycle only ever lands on occupied slots.
                Slot::Empty => {
                    self.slots[cur_index] = Slot::Occupied {
                        key: cur_key,
                        value: cur_value,
                    };
                    if result.displacement == 1 {
                        self.size += 1;
                    }
                    result.success = true;
                    return result;
                }
            };

            self.slots[cur_index] = Slot::Occupied {
                key: cur_key,
                value: cur_value,
            };
            if result.displacement == 1 {
                self.size += 1;
            }
            path.push(cur_index);

            // Relocate the evicted entry to its other candidate slot.
            let (e1, e2) = self.indexer.cuckoo_slots(evicted_key);
            let next_index = if e1 == cur_index { e2 } else { e1 };

            if self.slots[next_index] == Slot::Empty {
                self.slots[next_index] = Slot::Occupied {
                    key: evicted_key,
                    value: evicted_value,
                };
                result.success = true;
                return result;
            }

            cur_key = evicted_key;
            cur_value = evicted_value;
            cur_index = next_index;
        }

        // Bound exhausted: unwind the chain so every displaced resident
        // returns to its original slot, dropping only the requested key.
        let mut in_hand = Slot::Occupied {
            key: cur_key,
            value: cur_value,
        };
        for &index in path.iter().rev() {
            in_hand = std::mem::replace(&mut self.slots[index], in_hand);
        }
        self.size -= 1;
        self.failed_inserts += 1;
        log::debug!(
            "cuckoo insert gave up after {} displacements at load factor {:.3}",
            MAX_DISPLACEMENTS,
            self.load_factor()
        );
        result
    }

    /// Lookup a key; only its two candidate slots are examined.
    pub fn lookup(&self, key: u64) -> (OpResult, Option<u64>) {
        let mut result = OpResult::default();
        let (i1, i2) = self.indexer.cuckoo_slots(key);

        result.probe_count += 1;
        if let Slot::Occupied { key: resident, value } = self.slots[i1] {
            if resident == key {
                result.success = true;
                return (result, Some(value));
            }
        }

        result.probe_count += 1;
        if let Slot::Occupied { key: resident, value } = self.slots[i2] {
            if resident == key {
                result.success = true;
                return (result, Some(value));
            }
        }

        (result, None)
    }

    /// Delete a key, clearing its slot directly to empty.
    pub fn delete(&mut self, key: u64) -> OpResult {
        let mut result = OpResult::default();
        let (i1, i2) = self.indexer.cuckoo_slots(key);

        result.probe_count += 1;
        if let Slot::Occupied { key: resident, .. } = self.slots[i1] {
            if resident == key {
                self.slots[i1] = Slot::Empty;
                self.size -= 1;
                result.success = true;
                return result;
            }
        }

        result.probe_count += 1;
        if let Slot::Occupied { key: resident, .. } = self.slots[i2] {
            if resident == key {
                self.slots[i2] = Slot::Empty;
                self.size -= 1;
                result.success = true;
                return result;
            }
        }

        result
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.capacity as f64
    }

    #[inline]
    pub fn failed_inserts(&self) -> usize {
        self.failed_inserts
    }
}

impl Default for CuckooMap {
    fn default() -> Self {
        Self::new()
    }
}

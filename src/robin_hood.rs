use crate::common::{validate_capacity, OpResult, SlotIndexer, DEFAULT_CAPACITY};
use crate::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: u64, value: u64, dib: usize },
}

/// Open addressing with distance-from-initial-bucket (DIB) bookkeeping.
///
/// An inserting candidate steals the slot of any resident that sits closer
/// to its own home than the candidate does, which bounds the variance of
/// probe lengths. Deletion uses tombstones, not backward-shift compaction.
#[derive(Debug, Clone)]
pub struct RobinHoodMap {
    slots: Vec<Slot>,
    indexer: SlotIndexer,
    capacity: usize,
    size: usize,
    tombstones: usize,
}

impl RobinHoodMap {
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
            tombstones: 0,
        })
    }

    /// Insert or update a key-value pair.
    ///
    /// The candidate starts at its home slot with dib 0. A resident with a
    /// strictly smaller dib is swapped out and continues probing as the new
    /// candidate; a matching key is updated in place with no swap.
    pub fn insert(&mut self, key: u64, value: u64) -> OpResult {
        let mut result = OpResult::default();
        let home = self.indexer.home_slot(key);
        let mut index = home;
        let mut cur_key = key;
        let mut cur_value = value;
        let mut cur_dib: usize = 0;

        loop {
            result.probe_count += 1;
            match self.slots[index] {
                Slot::Occupied { key: resident, dib: resident_dib, .. }
                    if resident == cur_key =>
                {
                    self.slots[index] = Slot::Occupied {
                        key: resident,
                        value: cur_value,
                        dib: resident_dib,
                    };
                    result.success = true;
                    return result;
                }
                Slot::Occupied {
                    key: resident,
                    value: resident_value,
                    dib: resident_dib,
                } if cur_dib > resident_dib => {
                    // Steal from the rich: the displaced resident probes on.
                    self.slots[index] = Slot::Occupied {
                        key: cur_key,
                        value: cur_value,
                        dib: cur_dib,
                    };
                    cur_key = resident;
                    cur_value = resident_value;
                    cur_dib = resident_dib;
                }
                Slot::Occupied { .. } => {}
                state => {
                    if state == Slot::Tombstone {
                        self.tombstones -= 1;
                    }
                    self.slots[index] = Slot::Occupied {
                        key: cur_key,
                        value: cur_value,
                        dib: cur_dib,
                    };
                    self.size += 1;
                    result.success = true;
                    return result;
                }
            }

            cur_dib += 1;
            index = (index + 1) & (self.capacity - 1);
            if index == home && cur_dib >= self.capacity {
                log::debug!(
                    "robin hood insert failed after a full cycle of {} slots",
                    self.capacity
                );
                return result;
            }
        }
    }

    /// Lookup a key.
    ///
    /// Terminates early once the local dib exceeds the visited slot's
    /// stored dib: the invariant guarantees the key cannot sit further on.
    pub fn lookup(&self, key: u64) -> (OpResult, Option<u64>) {
        let mut result = OpResult::default();
        let mut index = self.indexer.home_slot(key);
        let mut dib: usize = 0;

        loop {
            result.probe_count += 1;
            match self.slots[index] {
                Slot::Empty => return (result, None),
                Slot::Occupied { key: resident, value, .. } if resident == key => {
                    result.success = true;
                    return (result, Some(value));
                }
                Slot::Occupied { dib: resident_dib, .. } if dib > resident_dib => {
                    return (result, None);
                }
                _ => {}
            }

            dib += 1;
            index = (index + 1) & (self.capacity - 1);
            if dib >= self.capacity {
                return (result, None);
            }
        }
    }

    /// Delete a key, leaving a tombstone in its slot.
    pub fn delete(&mut self, key: u64) -> OpResult {
        let mut result = OpResult::default();
        let mut index = self.indexer.home_slot(key);
        let mut dib: usize = 0;

        loop {
            result.probe_count += 1;
            match self.slots[index] {
                Slot::Empty => return result,
                Slot::Occupied { key: resident, .. } if resident == key => {
                    self.slots[index] = Slot::Tombstone;
                    self.size -= 1;
                    self.tombstones += 1;
                    result.success = true;
                    return result;
                }
                Slot::Occupied { dib: resident_dib, .. } if dib > resident_dib => {
                    return result;
                }
                _ => {}
            }

            dib += 1;
            index = (index + 1) & (self.capacity - 1);
            if dib >= self.capacity {
                return result;
            }
        }
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
    pub fn tombstone_count(&self) -> usize {
        self.tombstones
    }

    // ---------------- probe-length metrics ----------------

    /// Maximum stored dib over occupied slots.
    pub fn max_probe_length(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Occupied { dib, .. } => Some(*dib),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Mean stored dib over occupied slots; 0.0 for an empty table.
    pub fn avg_probe_length(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        let total: usize = self
            .slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Occupied { dib, .. } => Some(*dib),
                _ => None,
            })
            .sum();
        total as f64 / self.size as f64
    }
}

impl Default for RobinHoodMap {
    fn default() -> Self {
        Self::new()
    }
}

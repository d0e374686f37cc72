use crate::common::{validate_capacity, OpResult, SlotIndexer, DEFAULT_CAPACITY};
use crate::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: u64, value: u64 },
}

/// Open addressing with sequential probing and tombstone-based deletion.
///
/// Capacity is fixed for the table's lifetime; deletion leaves a tombstone
/// so probe sequences of displaced keys stay intact.
#[derive(Debug, Clone)]
pub struct LinearProbingMap {
    slots: Vec<Slot>,
    indexer: SlotIndexer,
    capacity: usize,
    size: usize,
    tombstones: usize,
}

impl LinearProbingMap {
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

    pub fn insert(&mut self, key: u64, value: u64) -> OpResult {
        let mut result = OpResult::default();
        let home = self.indexer.home_slot(key);
        let mut index = home;

        loop {
            result.probe_count += 1;
            match self.slots[index] {
                Slot::Occupied { key: resident, .. } if resident == key => {
                    self.slots[index] = Slot::Occupied { key, value };
                    result.success = true;
                    return result;
                }
                Slot::Occupied { .. } => {}
                state => {
                    if state == Slot::Tombstone {
                        self.tombstones -= 1;
                    }
                    self.slots[index] = Slot::Occupied { key, value };
                    self.size += 1;
                    result.success = true;
                    return result;
                }
            }

            index = (index + 1) & (self.capacity - 1);
            if index == home {
                // Full wrap: every slot holds a different key.
                log::debug!(
                    "linear probing insert failed after wrapping {} slots",
                    self.capacity
                );
                return result;
            }
        }
    }

    // Empty terminates the scan; tombstones are skipped.
    pub fn lookup(&self, key: u64) -> (OpResult, Option<u64>) {
        let mut result = OpResult::default();
        let home = self.indexer.home_slot(key);
        let mut index = home;

        loop {
            result.probe_count += 1;
            match self.slots[index] {
                Slot::Empty => return (result, None),
                Slot::Occupied { key: resident, value } if resident == key => {
                    result.success = true;
                    return (result, Some(value));
                }
                _ => {}
            }

            index = (index + 1) & (self.capacity - 1);
            if index == home {
                return (result, None);
            }
        }
    }

    pub fn delete(&mut self, key: u64) -> OpResult {
        let mut result = OpResult::default();
        let home = self.indexer.home_slot(key);
        let mut index = home;

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
                _ => {}
            }

            index = (index + 1) & (self.capacity - 1);
            if index == home {
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
}

impl Default for LinearProbingMap {
    fn default() -> Self {
        Self::new()
    }
}

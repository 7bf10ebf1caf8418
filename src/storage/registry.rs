//! Generational arena behind every handle the engine gives out.
//!
//! Each slot pairs its value with a generation counter. Releasing a slot
//! bumps the counter, so an old handle to a recycled slot no longer matches
//! and resolves to `InvalidHandle` instead of someone else's record.

use tracing::debug;

use crate::model::RawHandle;
use crate::{Error, Result};

/// Highest generation a slot may reach; keeps flat ids non-negative.
const MAX_GENERATION: u32 = i32::MAX as u32;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Capacity-bounded arena with LIFO slot reuse.
pub struct Registry<T> {
    kind: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    capacity: usize,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str, capacity: usize) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity,
        }
    }

    /// Store `value` and return its handle. Fails once `capacity` records are live.
    pub fn insert(&mut self, value: T) -> Result<RawHandle> {
        if self.live >= self.capacity {
            return Err(Error::AllocationFailure(format!(
                "{} registry is full ({} live)",
                self.kind, self.live
            )));
        }

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                RawHandle::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| {
                    Error::AllocationFailure(format!("{} registry index space exhausted", self.kind))
                })?;
                self.slots.push(Slot { generation: 0, value: Some(value) });
                RawHandle::new(index, 0)
            }
        };
        self.live += 1;
        debug!(kind = self.kind, handle = %handle, live = self.live, "registry allocate");
        Ok(handle)
    }

    pub fn get(&self, handle: RawHandle) -> Result<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
            .ok_or_else(|| self.stale(handle))
    }

    pub fn get_mut(&mut self, handle: RawHandle) -> Result<&mut T> {
        let kind = self.kind;
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
            .ok_or_else(|| Error::InvalidHandle(format!("{kind} {handle}")))
    }

    pub fn contains(&self, handle: RawHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Take the record out and invalidate every copy of `handle`.
    pub fn remove(&mut self, handle: RawHandle) -> Result<T> {
        let stale = self.stale(handle);
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
            .ok_or(stale)?;

        let value = slot.value.take().ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;
        slot.generation += 1;
        // A slot whose generation is used up is retired rather than recycled.
        if slot.generation < MAX_GENERATION {
            self.free.push(handle.index);
        }
        self.live -= 1;
        debug!(kind = self.kind, handle = %handle, live = self.live, "registry release");
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn stale(&self, handle: RawHandle) -> Error {
        Error::InvalidHandle(format!("{} {handle}", self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut reg = Registry::new("graph", 4);
        let h = reg.insert("a").unwrap();
        assert_eq!(*reg.get(h).unwrap(), "a");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.remove(h).unwrap(), "a");
        assert!(reg.is_empty());
        assert!(matches!(reg.get(h), Err(Error::InvalidHandle(_))));
        assert!(matches!(reg.remove(h), Err(Error::InvalidHandle(_))));
    }

    #[test]
    fn recycled_slot_rejects_old_handle() {
        let mut reg = Registry::new("graph", 4);
        let old = reg.insert(1).unwrap();
        reg.remove(old).unwrap();
        let new = reg.insert(2).unwrap();
        assert_eq!(new.index, old.index);
        assert_ne!(new.generation, old.generation);
        assert!(reg.get(old).is_err());
        assert_eq!(*reg.get(new).unwrap(), 2);
    }

    #[test]
    fn capacity_exhaustion_is_allocation_failure() {
        let mut reg = Registry::new("vector space", 2);
        let a = reg.insert(()).unwrap();
        reg.insert(()).unwrap();
        assert!(matches!(reg.insert(()), Err(Error::AllocationFailure(_))));
        reg.remove(a).unwrap();
        assert!(reg.insert(()).is_ok());
    }

    #[test]
    fn unknown_index_is_invalid() {
        let reg: Registry<u8> = Registry::new("graph", 1);
        assert!(!reg.contains(RawHandle::new(42, 0)));
    }
}

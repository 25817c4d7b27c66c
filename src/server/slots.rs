/// Fixed-capacity arena of connection records addressed by slot index.
///
/// Slots are never added or moved once the table exists, so an index stays
/// valid as a multiplexer token for as long as its slot is bound.
pub struct SlotTable<T> {
    slots: Vec<Option<T>>,
    occupied: usize,
}

impl<T> SlotTable<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| None).collect();

        Self { slots, occupied: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.slots.len()
    }

    /// Finds a free slot, or `None` when every slot is bound.
    ///
    /// The slot stays free until [`occupy`](Self::occupy) binds it.
    pub fn allocate(&self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.slots.iter().position(Option::is_none)
    }

    pub fn occupy(&mut self, index: usize, item: T) {
        assert!(index < self.slots.len(), "Index out of range");
        assert!(self.slots[index].is_none(), "Slot is already bound");

        self.slots[index] = Some(item);
        self.occupied += 1;
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Unbinds a slot and hands back its record, if it was bound.
    pub fn release(&mut self, index: usize) -> Option<T> {
        let item = self.slots.get_mut(index)?.take()?;
        self.occupied -= 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_returns_lowest_free_slot() {
        let mut table = SlotTable::with_capacity(3);

        assert_eq!(table.allocate(), Some(0));
        table.occupy(0, "a");
        table.occupy(1, "b");
        assert_eq!(table.allocate(), Some(2));

        table.release(0);
        assert_eq!(table.allocate(), Some(0));
    }

    #[test]
    fn full_table_has_nothing_to_allocate() {
        let mut table = SlotTable::with_capacity(2);
        table.occupy(0, 10);
        table.occupy(1, 20);

        assert!(table.is_full());
        assert_eq!(table.allocate(), None);

        assert_eq!(table.release(1), Some(20));
        assert_eq!(table.allocate(), Some(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn release_of_free_or_unknown_slot_is_a_no_op() {
        let mut table: SlotTable<u8> = SlotTable::with_capacity(1);

        assert_eq!(table.release(0), None);
        assert_eq!(table.release(7), None);
        assert!(table.is_empty());
    }

    #[test]
    #[should_panic(expected = "Slot is already bound")]
    fn occupying_a_bound_slot_panics() {
        let mut table = SlotTable::with_capacity(1);
        table.occupy(0, ());
        table.occupy(0, ());
    }
}

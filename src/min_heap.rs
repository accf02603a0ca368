use thiserror::Error;

/// Fixed-capacity binary min-heap keyed by weight.
///
/// Equal weights come out in insertion order: every insert is stamped with a
/// sequence number and the heap orders by `(weight, seq)`. Tree construction
/// relies on this to rebuild the exact same tree from the same weight file.
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    elements: Vec<HeapEntry<T>>,
    capacity: usize,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct HeapEntry<T> {
    weight: u64,
    seq: u64,
    item: T,
}

impl<T> HeapEntry<T> {
    fn key(&self) -> (u64, u64) {
        (self.weight, self.seq)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeapErr {
    #[error("insert beyond capacity {0}")]
    HeapOverflow(usize),
    #[error("extract from empty heap")]
    HeapUnderflow,
}

impl<T> MinHeap<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        MinHeap {
            elements: Vec::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    pub fn heap_size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    fn left(i: usize) -> usize {
        2 * i + 1
    }

    fn right(i: usize) -> usize {
        2 * i + 2
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.elements[a].key() < self.elements[b].key()
    }

    pub fn insert(&mut self, item: T, weight: u64) -> Result<(), HeapErr> {
        if self.heap_size() >= self.capacity {
            return Err(HeapErr::HeapOverflow(self.capacity));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.elements.push(HeapEntry { weight, seq, item });
        self.sift_up(self.heap_size() - 1);
        Ok(())
    }

    /// Removes the lightest item, returning it with its weight.
    pub fn extract_min(&mut self) -> Result<(T, u64), HeapErr> {
        if self.is_empty() {
            return Err(HeapErr::HeapUnderflow);
        }
        let last = self.heap_size() - 1;
        self.elements.swap(0, last);
        let entry = self.elements.pop().ok_or(HeapErr::HeapUnderflow)?;
        self.min_heapify(0);
        Ok((entry.item, entry.weight))
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let p = Self::parent(i);
            if !self.less(i, p) {
                break;
            }
            self.elements.swap(i, p);
            i = p;
        }
    }

    fn min_heapify(&mut self, mut i: usize) {
        loop {
            let l = Self::left(i);
            let r = Self::right(i);
            let mut smallest = i;

            if l < self.heap_size() && self.less(l, smallest) {
                smallest = l;
            }
            if r < self.heap_size() && self.less(r, smallest) {
                smallest = r;
            }
            if smallest == i {
                return;
            }
            self.elements.swap(i, smallest);
            i = smallest;
        }
    }

    #[cfg(test)]
    fn valid_min_heap(&self) -> bool {
        (1..self.heap_size()).all(|i| !self.less(i, Self::parent(i)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extracts_in_weight_order() {
        let mut heap = MinHeap::with_capacity(8);
        for (item, w) in [("e", 9), ("a", 1), ("d", 7), ("b", 3), ("c", 5)] {
            heap.insert(item, w).unwrap();
            assert!(heap.valid_min_heap());
        }
        let mut order = Vec::new();
        while !heap.is_empty() {
            order.push(heap.extract_min().unwrap().0);
            assert!(heap.valid_min_heap());
        }
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn ties_come_out_first_inserted_first() {
        let mut heap = MinHeap::with_capacity(6);
        for item in 0..6u8 {
            heap.insert(item, 4).unwrap();
        }
        let order: Vec<u8> = (0..6).map(|_| heap.extract_min().unwrap().0).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn reinserted_tie_goes_behind_existing() {
        let mut heap = MinHeap::with_capacity(4);
        heap.insert('x', 2).unwrap();
        heap.insert('y', 1).unwrap();
        heap.insert('z', 1).unwrap();
        let (a, wa) = heap.extract_min().unwrap();
        let (b, wb) = heap.extract_min().unwrap();
        assert_eq!((a, b), ('y', 'z'));
        heap.insert('m', wa + wb).unwrap();
        assert_eq!(heap.extract_min().unwrap(), ('x', 2));
        assert_eq!(heap.extract_min().unwrap(), ('m', 2));
    }

    #[test]
    fn overflow_and_underflow_are_errors() {
        let mut heap = MinHeap::with_capacity(1);
        heap.insert((), 1).unwrap();
        assert_eq!(heap.insert((), 1), Err(HeapErr::HeapOverflow(1)));
        heap.extract_min().unwrap();
        assert_eq!(heap.extract_min(), Err(HeapErr::HeapUnderflow));
    }
}

// Addressable max-priority queue of vertices keyed by their move gain.

use ordered_float::OrderedFloat;

#[derive(Debug, Clone, Copy)]
struct Entry {
    gain: OrderedFloat<f64>,

    // Insertion counter, lower wins among equal gains.
    order: u64,

    vertex: usize,
}

impl Entry {
    fn outranks(&self, other: &Entry) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.order < other.order)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GainQueue {
    heap: Vec<Entry>,
    locator: Vec<Option<usize>>,
    next_order: u64,
}

impl GainQueue {
    pub(crate) fn new(num_vertices: usize) -> Self {
        GainQueue {
            heap: Vec::new(),
            locator: vec![None; num_vertices],
            next_order: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn contains(&self, vertex: usize) -> bool {
        self.locator[vertex].is_some()
    }

    pub(crate) fn clear(&mut self) {
        for entry in &self.heap {
            self.locator[entry.vertex] = None;
        }
        self.heap.clear();
        self.next_order = 0;
    }

    /// Insert a vertex; a vertex already queued gets its gain updated instead.
    pub(crate) fn insert(&mut self, vertex: usize, gain: f64) {
        if self.contains(vertex) {
            self.update(vertex, gain);
            return;
        }
        let entry = Entry { gain: OrderedFloat(gain), order: self.next_order, vertex };
        self.next_order += 1;
        self.heap.push(entry);
        let position = self.heap.len() - 1;
        self.locator[vertex] = Some(position);
        self.sift_up(position);
    }

    /// Change the gain of a queued vertex. Vertices not in the queue are ignored.
    pub(crate) fn update(&mut self, vertex: usize, gain: f64) {
        let Some(position) = self.locator[vertex] else {
            return;
        };
        let old_gain = self.heap[position].gain;
        self.heap[position].gain = OrderedFloat(gain);
        if OrderedFloat(gain) > old_gain {
            self.sift_up(position);
        } else {
            self.sift_down(position);
        }
    }

    /// Remove a vertex if it is queued.
    pub(crate) fn delete(&mut self, vertex: usize) {
        let Some(position) = self.locator[vertex] else {
            return;
        };
        self.remove_at(position);
    }

    /// Remove and return the vertex with the highest gain.
    pub(crate) fn pop(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    fn remove_at(&mut self, position: usize) -> usize {
        let last = self.len() - 1;
        self.swap(position, last);
        let removed = self.heap.pop().map(|entry| entry.vertex).unwrap_or_default();
        self.locator[removed] = None;
        if position < self.heap.len() {
            self.sift_down(position);
            self.sift_up(position);
        }
        removed
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.locator[self.heap[a].vertex] = Some(a);
        self.locator[self.heap[b].vertex] = Some(b);
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if !self.heap[position].outranks(&self.heap[parent]) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut best = position;
            if left < self.heap.len() && self.heap[left].outranks(&self.heap[best]) {
                best = left;
            }
            if right < self.heap.len() && self.heap[right].outranks(&self.heap[best]) {
                best = right;
            }
            if best == position {
                break;
            }
            self.swap(position, best);
            position = best;
        }
    }
}

/// One gain queue per side of a bisection.
#[derive(Debug, Clone)]
pub(crate) struct GainQueues {
    pub(crate) sides: [GainQueue; 2],
}

impl GainQueues {
    pub(crate) fn new(num_vertices: usize) -> Self {
        GainQueues {
            sides: [GainQueue::new(num_vertices), GainQueue::new(num_vertices)],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.sides.iter_mut().for_each(GainQueue::clear);
    }
}

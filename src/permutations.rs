/// Lazy enumeration of every ordering of a set of indices (Heap's algorithm).
///
/// Each step performs a single swap, so walking all n! orderings needs O(n)
/// memory. Use [`Permutations::next_permutation`] to borrow the current
/// ordering without allocating; the `Iterator` impl clones it.
#[derive(Debug, Clone)]
pub struct Permutations {
    elements: Vec<usize>,
    counters: Vec<usize>,
    depth: usize,
    started: bool,
}

impl Permutations {
    pub fn new(elements: Vec<usize>) -> Self {
        let n = elements.len();
        Self {
            elements,
            counters: vec![0; n],
            depth: 1,
            started: false,
        }
    }

    /// Orderings of `0..n`
    pub fn of_indices(n: usize) -> Self {
        Self::new((0..n).collect())
    }

    /// Advance to the next ordering. The first call yields the input order.
    pub fn next_permutation(&mut self) -> Option<&[usize]> {
        if !self.started {
            self.started = true;
            return Some(&self.elements);
        }

        let n = self.elements.len();
        while self.depth < n {
            let i = self.depth;
            if self.counters[i] < i {
                if i % 2 == 0 {
                    self.elements.swap(0, i);
                } else {
                    self.elements.swap(self.counters[i], i);
                }
                self.counters[i] += 1;
                self.depth = 1;
                return Some(&self.elements);
            }
            self.counters[i] = 0;
            self.depth += 1;
        }

        None
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_permutation().map(<[usize]>::to_vec)
    }
}

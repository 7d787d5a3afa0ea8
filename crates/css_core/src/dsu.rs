//! Disjoint Set Union (DSU) data structure with parity tracking.
//!
//! Maintains disjoint sets of decoding-graph nodes while tracking, per set,
//! whether it holds an odd number of fired detectors and whether it has
//! reached the boundary. A set is neutral once it is even or touches the
//! boundary.

use crate::gf2::BitRow;

/// Union-Find data structure with parity and boundary tracking.
///
/// Uses path halving and union by rank. Parity and boundary flags are only
/// meaningful at set roots.
#[derive(Debug, Clone)]
pub struct UnionFind {
    /// Parent pointer array for the union-find forest.
    ///
    /// Root nodes point to themselves. Rewritten during `find` to halve
    /// path lengths.
    parent: Vec<usize>,

    /// Rank array for the union-by-rank heuristic.
    rank: Vec<u8>,

    /// Parity bit per set root; set means an odd number of fired detectors.
    parity: BitRow,

    /// Set when the set at this root contains the boundary node.
    boundary: BitRow,
}

impl UnionFind {
    /// Creates `n` singleton sets with even parity.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            parity: BitRow::repeat(false, n),
            boundary: BitRow::repeat(false, n),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Finds the root of the set containing node i.
    ///
    /// Path halving points every visited node at its grandparent, so repeated
    /// lookups along the same chain become nearly constant time.
    #[inline(always)]
    pub fn find(&mut self, mut i: usize) -> usize {
        while i != self.parent[i] {
            let p = self.parent[i];
            let gp = self.parent[p];
            self.parent[i] = gp;
            i = p;
        }
        i
    }

    /// Merges the sets containing nodes i and j.
    ///
    /// The merged parity is the XOR of both parities; the merged set touches
    /// the boundary if either did.
    ///
    /// # Returns
    ///
    /// True if the sets were merged, false if they were already united.
    pub fn union(&mut self, i: usize, j: usize) -> bool {
        let (root_i, root_j) = (self.find(i), self.find(j));
        if root_i == root_j {
            return false;
        }

        let (child, root) = if self.rank[root_i] < self.rank[root_j] {
            (root_i, root_j)
        } else {
            if self.rank[root_i] == self.rank[root_j] {
                self.rank[root_i] += 1;
            }
            (root_j, root_i)
        };
        self.parent[child] = root;

        let parity = self.parity[root] ^ self.parity[child];
        self.parity.set(root, parity);
        let boundary = self.boundary[root] | self.boundary[child];
        self.boundary.set(root, boundary);
        true
    }

    /// Sets the parity of the set containing node i.
    pub fn set_parity(&mut self, i: usize, is_odd: bool) {
        let root = self.find(i);
        self.parity.set(root, is_odd);
    }

    /// Toggles the parity of the set containing node i.
    ///
    /// Each fired detector toggles its own set once before growth starts.
    pub fn toggle_parity(&mut self, i: usize) {
        let root = self.find(i);
        let p = self.parity[root];
        self.parity.set(root, !p);
    }

    pub fn is_odd(&mut self, i: usize) -> bool {
        let root = self.find(i);
        self.parity[root]
    }

    /// Marks the set containing node i as connected to the boundary.
    pub fn mark_boundary(&mut self, i: usize) {
        let root = self.find(i);
        self.boundary.set(root, true);
    }

    pub fn touches_boundary(&mut self, i: usize) -> bool {
        let root = self.find(i);
        self.boundary[root]
    }

    /// True if the set containing node i still needs to grow.
    pub fn is_active(&mut self, i: usize) -> bool {
        let root = self.find(i);
        self.parity[root] && !self.boundary[root]
    }
}

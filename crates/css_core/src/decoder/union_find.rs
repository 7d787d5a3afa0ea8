//! Union-find decoder.
//!
//! Clusters grow from fired detectors in half-edge steps. Two half-edges make
//! a fully grown edge, which merges the clusters at its ends. Growth stops
//! once every cluster holds an even number of fired detectors or has reached
//! the boundary. The correction is then peeled off a spanning forest of the
//! grown edges, leaf first.

use super::Decoder;
use crate::QecError;
use crate::dem::DetectorErrorModel;
use crate::dsu::UnionFind;
use crate::gf2::BitRow;
use crate::graph::DecodingGraph;
use bitvec::prelude::*;
use std::collections::VecDeque;

pub struct UnionFindDecoder {
    graph: DecodingGraph,
    adjacency: Vec<Vec<usize>>,
}

impl UnionFindDecoder {
    pub fn new(dem: &DetectorErrorModel) -> Result<Self, QecError> {
        Ok(Self::from_graph(DecodingGraph::from_dem(dem)?))
    }

    pub fn from_graph(graph: DecodingGraph) -> Self {
        let adjacency = graph.adjacency();
        Self { graph, adjacency }
    }

    pub fn graph(&self) -> &DecodingGraph {
        &self.graph
    }

    // Returns the grown-edge mask once no active cluster remains.
    fn grow(&self, dsu: &mut UnionFind) -> Result<Vec<bool>, QecError> {
        let edges = self.graph.edges();
        let mut support = vec![0u8; edges.len()];
        let mut grown = vec![false; edges.len()];

        loop {
            let active: Vec<bool> = (0..self.graph.num_nodes())
                .map(|v| dsu.is_active(v))
                .collect();
            if !active.iter().any(|&a| a) {
                return Ok(grown);
            }

            let mut progressed = false;
            for (v, _) in active.iter().enumerate().filter(|(_, a)| **a) {
                for &e in &self.adjacency[v] {
                    if support[e] < 2 {
                        support[e] += 1;
                        progressed = true;
                    }
                }
            }
            if !progressed {
                return Err(QecError::DecodingFailed);
            }

            for (e, edge) in edges.iter().enumerate() {
                if support[e] >= 2 && !grown[e] {
                    grown[e] = true;
                    dsu.union(edge.u, edge.v);
                }
            }
        }
    }

    // Peels the spanning forest of grown edges into observable flips.
    fn peel(&self, syndrome: &BitSlice<u64, Lsb0>, grown: &[bool]) -> Result<BitRow, QecError> {
        let n = self.graph.num_nodes();
        let boundary = self.graph.boundary();
        let edges = self.graph.edges();

        let mut parent_edge: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut roots = Vec::new();

        let starts = std::iter::once(boundary).chain(0..self.graph.num_detectors());
        for start in starts {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            roots.push(start);
            let mut queue = VecDeque::from([start]);
            while let Some(u) = queue.pop_front() {
                order.push(u);
                for &e in &self.adjacency[u] {
                    if !grown[e] {
                        continue;
                    }
                    let w = if edges[e].u == u { edges[e].v } else { edges[e].u };
                    if !visited[w] {
                        visited[w] = true;
                        parent_edge[w] = Some(e);
                        queue.push_back(w);
                    }
                }
            }
        }

        let mut defect: Vec<bool> = (0..n)
            .map(|v| v < syndrome.len() && syndrome[v])
            .collect();
        let mut correction = BitRow::repeat(false, self.graph.num_observables());

        for &v in order.iter().rev() {
            let Some(e) = parent_edge[v] else { continue };
            if !defect[v] {
                continue;
            }
            let edge = &edges[e];
            for &o in &edge.observables {
                let bit = correction[o];
                correction.set(o, !bit);
            }
            defect[v] = false;
            let p = if edge.u == v { edge.v } else { edge.u };
            defect[p] ^= true;
        }

        if roots.iter().any(|&r| r != boundary && defect[r]) {
            return Err(QecError::DecodingFailed);
        }
        Ok(correction)
    }
}

impl Decoder for UnionFindDecoder {
    fn name(&self) -> &str {
        "union_find"
    }

    fn num_detectors(&self) -> usize {
        self.graph.num_detectors()
    }

    fn num_observables(&self) -> usize {
        self.graph.num_observables()
    }

    fn decode_shot(&self, syndrome: &BitSlice<u64, Lsb0>) -> Result<BitRow, QecError> {
        if syndrome.len() != self.num_detectors() {
            return Err(QecError::DetectorCountMismatch {
                expected: self.num_detectors(),
                found: syndrome.len(),
            });
        }
        let mut dsu = UnionFind::new(self.graph.num_nodes());
        dsu.mark_boundary(self.graph.boundary());
        for d in syndrome.iter_ones() {
            dsu.toggle_parity(d);
        }
        let grown = self.grow(&mut dsu)?;
        self.peel(syndrome, &grown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dem::ErrorMechanism;

    // Distance-3 repetition chain: 3 data errors, 2 detectors, boundary on
    // both ends; the left data qubit carries the observable.
    fn chain_dem() -> DetectorErrorModel {
        let mut dem = DetectorErrorModel::new(2, 1);
        for (detectors, observables) in [
            (vec![0], vec![0]),
            (vec![0, 1], vec![]),
            (vec![1], vec![]),
        ] {
            dem.push(ErrorMechanism::new(0.1, detectors, observables)).unwrap();
        }
        dem
    }

    #[test]
    fn empty_syndrome_needs_no_correction() {
        let dec = UnionFindDecoder::new(&chain_dem()).unwrap();
        let out = dec.decode_shot(bits![u64, Lsb0; 0, 0]).unwrap();
        assert!(out.not_any());
    }

    #[test]
    fn corrects_each_single_error() {
        let dec = UnionFindDecoder::new(&chain_dem()).unwrap();
        assert!(dec.decode_shot(bits![u64, Lsb0; 1, 0]).unwrap()[0]);
        assert!(!dec.decode_shot(bits![u64, Lsb0; 1, 1]).unwrap()[0]);
        assert!(!dec.decode_shot(bits![u64, Lsb0; 0, 1]).unwrap()[0]);
    }

    #[test]
    fn odd_cluster_without_boundary_fails() {
        let mut dem = DetectorErrorModel::new(2, 0);
        dem.push(ErrorMechanism::new(0.1, vec![0, 1], vec![])).unwrap();
        let dec = UnionFindDecoder::new(&dem).unwrap();
        assert_eq!(
            dec.decode_shot(bits![u64, Lsb0; 1, 0]),
            Err(QecError::DecodingFailed)
        );
    }

    #[test]
    fn rejects_wrong_width() {
        let dec = UnionFindDecoder::new(&chain_dem()).unwrap();
        assert_eq!(
            dec.decode_shot(bits![u64, Lsb0; 1, 0, 0]),
            Err(QecError::DetectorCountMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}

//! Minimum-weight matching decoder.
//!
//! Shortest paths between all nodes of the decoding graph are computed once
//! at construction with `petgraph`'s Bellman-Ford over log-likelihood
//! weights. Each shot pairs fired detectors with each other or with the
//! boundary so that the summed path length is minimal, and XORs the
//! observables along every chosen path. Shots with more than
//! `MAX_EXACT_DEFECTS` fired detectors are paired greedily instead, in order
//! of increasing path length.

use super::Decoder;
use crate::QecError;
use crate::dem::DetectorErrorModel;
use crate::gf2::BitRow;
use crate::graph::DecodingGraph;
use bitvec::prelude::*;
use log::debug;
use petgraph::algo::bellman_ford;
use petgraph::graph::{NodeIndex, UnGraph};

pub struct MatchingDecoder {
    num_detectors: usize,
    num_observables: usize,
    boundary: usize,
    /// `distance[s][t]`, infinite when unreachable.
    distance: Vec<Vec<f64>>,
    /// Observables flipped along the shortest path from s to t.
    path_observables: Vec<Vec<BitRow>>,
}

impl MatchingDecoder {
    pub fn new(dem: &DetectorErrorModel) -> Result<Self, QecError> {
        Self::from_graph(&DecodingGraph::from_dem(dem)?)
    }

    pub fn from_graph(graph: &DecodingGraph) -> Result<Self, QecError> {
        let n = graph.num_nodes();
        let mut g: UnGraph<(), f64> = UnGraph::with_capacity(n, graph.edges().len());
        let nodes: Vec<NodeIndex> = (0..n).map(|_| g.add_node(())).collect();
        for e in graph.edges() {
            if e.weight.is_finite() {
                g.add_edge(nodes[e.u], nodes[e.v], e.weight);
            }
        }

        let mut distance = Vec::with_capacity(n);
        let mut path_observables = Vec::with_capacity(n);
        for s in 0..n {
            let paths = bellman_ford(&g, nodes[s]).map_err(|_| QecError::DecodingFailed)?;
            let mut obs = Vec::with_capacity(n);
            for t in 0..n {
                let mut flips = BitRow::repeat(false, graph.num_observables());
                let mut cur = t;
                while let Some(prev) = paths.predecessors[cur] {
                    let prev = prev.index();
                    if let Some(edge) = graph.edge_between(prev, cur) {
                        for &o in &edge.observables {
                            let bit = flips[o];
                            flips.set(o, !bit);
                        }
                    }
                    cur = prev;
                }
                obs.push(flips);
            }
            distance.push(paths.distances);
            path_observables.push(obs);
        }
        debug!("matching decoder: all-pairs paths over {} nodes", n);

        Ok(Self {
            num_detectors: graph.num_detectors(),
            num_observables: graph.num_observables(),
            boundary: graph.boundary(),
            distance,
            path_observables,
        })
    }

    /// Shortest-path length between two nodes.
    pub fn distance(&self, u: usize, v: usize) -> f64 {
        self.distance[u][v]
    }
}

impl Decoder for MatchingDecoder {
    fn name(&self) -> &str {
        "matching"
    }

    fn num_detectors(&self) -> usize {
        self.num_detectors
    }

    fn num_observables(&self) -> usize {
        self.num_observables
    }

    fn decode_shot(&self, syndrome: &BitSlice<u64, Lsb0>) -> Result<BitRow, QecError> {
        if syndrome.len() != self.num_detectors {
            return Err(QecError::DetectorCountMismatch {
                expected: self.num_detectors,
                found: syndrome.len(),
            });
        }
        let fired: Vec<usize> = syndrome.iter_ones().collect();
        let mut correction = BitRow::repeat(false, self.num_observables);
        let pairs = if fired.len() <= MAX_EXACT_DEFECTS {
            self.match_exact(&fired)?
        } else {
            self.match_greedy(&fired)?
        };
        for (a, b) in pairs {
            correction ^= self.path_observables[a][b].as_bitslice();
        }
        Ok(correction)
    }
}

impl MatchingDecoder {
    // Subset dynamic programme: the lowest unmatched defect goes either to
    // the boundary or to another unmatched defect. `partner[mask] == n`
    // means the boundary.
    fn match_exact(&self, fired: &[usize]) -> Result<Vec<(usize, usize)>, QecError> {
        let n = fired.len();
        let full = (1usize << n) - 1;
        let mut cost = vec![f64::INFINITY; full + 1];
        let mut partner = vec![n; full + 1];
        cost[0] = 0.0;

        for mask in 1..=full {
            let i = mask.trailing_zeros() as usize;
            let rest = mask & !(1 << i);
            let mut best = self.distance[fired[i]][self.boundary] + cost[rest];
            let mut choice = n;
            let mut others = rest;
            while others != 0 {
                let j = others.trailing_zeros() as usize;
                others &= others - 1;
                let c = self.distance[fired[i]][fired[j]] + cost[rest & !(1 << j)];
                if c < best {
                    best = c;
                    choice = j;
                }
            }
            cost[mask] = best;
            partner[mask] = choice;
        }

        if !cost[full].is_finite() {
            return Err(QecError::DecodingFailed);
        }

        let mut pairs = Vec::with_capacity(n);
        let mut mask = full;
        while mask != 0 {
            let i = mask.trailing_zeros() as usize;
            let j = partner[mask];
            mask &= !(1 << i);
            if j < n {
                mask &= !(1 << j);
                pairs.push((fired[i], fired[j]));
            } else {
                pairs.push((fired[i], self.boundary));
            }
        }
        Ok(pairs)
    }

    fn match_greedy(&self, fired: &[usize]) -> Result<Vec<(usize, usize)>, QecError> {
        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for (i, &a) in fired.iter().enumerate() {
            let to_boundary = self.distance[a][self.boundary];
            if to_boundary.is_finite() {
                candidates.push((to_boundary, a, self.boundary));
            }
            for &b in &fired[i + 1..] {
                let d = self.distance[a][b];
                if d.is_finite() {
                    candidates.push((d, a, b));
                }
            }
        }
        candidates.sort_by(|x, y| {
            x.0.total_cmp(&y.0)
                .then(x.1.cmp(&y.1))
                .then(x.2.cmp(&y.2))
        });

        let mut matched = bitvec![u64, Lsb0; 0; self.num_detectors];
        let mut pairs = Vec::with_capacity(fired.len());
        let mut remaining = fired.len();
        for (_, a, b) in candidates {
            if matched[a] || (b != self.boundary && matched[b]) {
                continue;
            }
            matched.set(a, true);
            remaining -= 1;
            if b != self.boundary {
                matched.set(b, true);
                remaining -= 1;
            }
            pairs.push((a, b));
            if remaining == 0 {
                break;
            }
        }

        if remaining > 0 {
            return Err(QecError::DecodingFailed);
        }
        Ok(pairs)
    }
}

// Largest defect count matched exactly; the table holds 2^n entries.
const MAX_EXACT_DEFECTS: usize = 14;

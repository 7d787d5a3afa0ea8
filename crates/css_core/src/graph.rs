//! Decoding graph representation for quantum error correction.
//!
//! Nodes are the detectors of a detector error model plus one virtual
//! boundary node with index `num_detectors`. Every edge is an error mechanism
//! that flips its two endpoints (or one detector and the boundary) together
//! with a set of logical observables.

use crate::QecError;
use crate::dem::{Component, DetectorErrorModel, ErrorMechanism, combine_probabilities};
use log::debug;
use std::collections::BTreeMap;

/// Graph edge between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Lower endpoint.
    pub u: usize,
    /// Higher endpoint. Equals the boundary index for boundary edges.
    pub v: usize,
    /// Probability that this edge's error occurs.
    pub probability: f64,
    /// Log-likelihood weight `ln((1 - p) / p)`, clamped at zero.
    ///
    /// Likely errors are cheap; errors with p >= 0.5 cost nothing.
    pub weight: f64,
    /// Observables flipped when this edge is part of the correction.
    pub observables: Vec<usize>,
}

/// Log-likelihood weight of an error with probability `p`.
pub fn edge_weight(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::INFINITY;
    }
    ((1.0 - p) / p).ln().max(0.0)
}

// Largest component the exhaustive split will search.
const MAX_DECOMPOSE: usize = 8;

fn symmetric_difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out: Vec<usize> = a.iter().filter(|x| !b.contains(x)).copied().collect();
    out.extend(b.iter().filter(|x| !a.contains(x)));
    out.sort_unstable();
    out
}

fn consecutive_pairs(piece: Component) -> Vec<Component> {
    let mut observables = piece.observables;
    piece
        .detectors
        .chunks(2)
        .map(|pair| Component {
            detectors: pair.to_vec(),
            observables: std::mem::take(&mut observables),
        })
        .collect()
}

/// Decoding graph over detectors and a single boundary node.
///
/// Parallel edges are merged on insertion when they carry the same
/// observables; their probabilities combine as independent XOR events. An
/// edge with different observables never replaces the label already there.
#[derive(Clone, Debug)]
pub struct DecodingGraph {
    num_detectors: usize,
    num_observables: usize,
    edges: Vec<Edge>,
    index: BTreeMap<(usize, usize), usize>,
}

impl DecodingGraph {
    /// Creates an empty graph over `num_detectors` detectors.
    pub fn new(num_detectors: usize, num_observables: usize) -> Self {
        Self {
            num_detectors,
            num_observables,
            edges: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Builds the graph of a detector error model.
    ///
    /// Graphlike mechanisms (one or two detectors, no components) are
    /// inserted first, most likely first, and fix the observable label of
    /// their edge. Every other mechanism is split into its components, and
    /// components touching more than two detectors are split further into
    /// edges already present whose observables XOR to the component's.
    /// Only when no such split exists does a component fall back to
    /// consecutive detector pairs, observables on the first piece.
    /// Mechanisms that flip no detector are invisible to every decoder and
    /// are skipped.
    pub fn from_dem(dem: &DetectorErrorModel) -> Result<Self, QecError> {
        let mut graph = Self::new(dem.num_detectors(), dem.num_observables());
        let boundary = graph.boundary();
        let (mut decomposed, mut unmatched, mut conflicts) = (0usize, 0usize, 0usize);

        let visible = |m: &&ErrorMechanism| m.probability > 0.0 && !m.detectors.is_empty();
        let graphlike = |m: &&ErrorMechanism| m.components.is_empty() && m.detectors.len() <= 2;

        let mut direct: Vec<&ErrorMechanism> =
            dem.mechanisms().iter().filter(visible).filter(graphlike).collect();
        direct.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        for m in direct {
            let v = m.detectors.get(1).copied().unwrap_or(boundary);
            if !graph.add_edge(m.detectors[0], v, m.probability, m.observables.clone())? {
                conflicts += 1;
            }
        }

        for m in dem.mechanisms().iter().filter(visible) {
            if graphlike(&m) {
                continue;
            }
            for piece in m.pieces() {
                if piece.detectors.is_empty() {
                    continue;
                }
                let parts = if piece.detectors.len() <= 2 {
                    vec![piece]
                } else {
                    decomposed += 1;
                    match graph.decompose(&piece) {
                        Some(parts) => parts,
                        None => {
                            unmatched += 1;
                            consecutive_pairs(piece)
                        }
                    }
                };
                for part in parts {
                    let v = part.detectors.get(1).copied().unwrap_or(boundary);
                    if !graph.add_edge(part.detectors[0], v, m.probability, part.observables)? {
                        conflicts += 1;
                    }
                }
            }
        }

        debug!(
            "decoding graph: {} nodes, {} edges, {} hyperedges decomposed ({} by fallback), {} label conflicts dropped",
            graph.num_nodes(),
            graph.edges.len(),
            decomposed,
            unmatched,
            conflicts
        );
        Ok(graph)
    }

    /// Splits a component into existing edges whose observables XOR to the
    /// component's own.
    ///
    /// Each piece is a detector pair or a detector with the boundary. Returns
    /// `None` when no exact split exists or the component is too large to
    /// search.
    pub fn decompose(&self, component: &Component) -> Option<Vec<Component>> {
        if component.detectors.len() > MAX_DECOMPOSE {
            return None;
        }
        let mut parts = Vec::new();
        self.split(&component.detectors, &component.observables, &mut parts)
            .then_some(parts)
    }

    fn split(
        &self,
        remaining: &[usize],
        observables: &[usize],
        parts: &mut Vec<Component>,
    ) -> bool {
        let Some((&first, rest)) = remaining.split_first() else {
            return observables.is_empty();
        };
        let partners = rest.iter().copied().map(Some).chain(std::iter::once(None));
        for partner in partners {
            let Some(edge) = self.edge_between(first, partner.unwrap_or(self.boundary())) else {
                continue;
            };
            let left: Vec<usize> = rest.iter().copied().filter(|&d| Some(d) != partner).collect();
            let owed = symmetric_difference(observables, &edge.observables);
            parts.push(Component {
                detectors: partner.map_or(vec![first], |p| vec![first, p]),
                observables: edge.observables.clone(),
            });
            if self.split(&left, &owed, parts) {
                return true;
            }
            parts.pop();
        }
        false
    }

    /// Adds an edge between nodes u and v.
    ///
    /// # Arguments
    ///
    /// * `u` - First node index
    /// * `v` - Second node index, or `boundary()`
    /// * `probability` - Error probability of the edge
    /// * `observables` - Observables flipped by the edge
    ///
    /// # Returns
    ///
    /// `Ok(false)` when an edge with different observables already joins
    /// the two nodes; the existing edge is left untouched. `NodeOutOfBounds`
    /// if either endpoint exceeds the boundary index or an observable
    /// exceeds the observable count.
    pub fn add_edge(
        &mut self,
        u: usize,
        v: usize,
        probability: f64,
        mut observables: Vec<usize>,
    ) -> Result<bool, QecError> {
        let max_idx = u.max(v);
        if max_idx >= self.num_nodes() {
            return Err(QecError::NodeOutOfBounds(max_idx));
        }
        if let Some(&o) = observables.iter().find(|&&o| o >= self.num_observables) {
            return Err(QecError::NodeOutOfBounds(o));
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(QecError::InvalidProbability(probability));
        }
        observables.sort_unstable();
        let (u, v) = (u.min(v), max_idx);

        match self.index.get(&(u, v)) {
            Some(&i) => {
                let existing = &mut self.edges[i];
                if existing.observables != observables {
                    return Ok(false);
                }
                existing.probability = combine_probabilities(existing.probability, probability);
                existing.weight = edge_weight(existing.probability);
            }
            None => {
                self.index.insert((u, v), self.edges.len());
                self.edges.push(Edge {
                    u,
                    v,
                    probability,
                    weight: edge_weight(probability),
                    observables,
                });
            }
        }
        Ok(true)
    }

    /// Number of nodes including the boundary.
    pub fn num_nodes(&self) -> usize {
        self.num_detectors + 1
    }

    pub fn num_detectors(&self) -> usize {
        self.num_detectors
    }

    pub fn num_observables(&self) -> usize {
        self.num_observables
    }

    /// Index of the virtual boundary node.
    pub fn boundary(&self) -> usize {
        self.num_detectors
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edge between `u` and `v`, if any.
    pub fn edge_between(&self, u: usize, v: usize) -> Option<&Edge> {
        self.index.get(&(u.min(v), u.max(v))).map(|&i| &self.edges[i])
    }

    /// Per-node incident edge indices.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.num_nodes()];
        for (i, e) in self.edges.iter().enumerate() {
            adj[e.u].push(i);
            if e.v != e.u {
                adj[e.v].push(i);
            }
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mech(p: f64, detectors: Vec<usize>, observables: Vec<usize>) -> ErrorMechanism {
        ErrorMechanism::new(p, detectors, observables)
    }

    fn part(detectors: Vec<usize>, observables: Vec<usize>) -> Component {
        Component {
            detectors,
            observables,
        }
    }

    #[test]
    fn single_detector_goes_to_boundary() {
        let mut dem = DetectorErrorModel::new(2, 1);
        dem.push(mech(0.1, vec![1], vec![0])).unwrap();
        let g = DecodingGraph::from_dem(&dem).unwrap();
        assert_eq!(g.num_nodes(), 3);
        let e = g.edge_between(1, g.boundary()).unwrap();
        assert_eq!(e.observables, vec![0]);
        assert!((e.weight - (0.9f64 / 0.1).ln()).abs() < 1e-12);
    }

    #[test]
    fn unknown_hyperedges_fall_back_to_pairs() {
        let mut dem = DetectorErrorModel::new(3, 1);
        dem.push(mech(0.01, vec![0, 1, 2], vec![0])).unwrap();
        let g = DecodingGraph::from_dem(&dem).unwrap();
        assert_eq!(g.edges().len(), 2);
        assert_eq!(g.edge_between(0, 1).unwrap().observables, vec![0]);
        assert!(g.edge_between(2, 3).unwrap().observables.is_empty());
    }

    #[test]
    fn hyperedges_reuse_existing_edges() {
        let mut dem = DetectorErrorModel::new(3, 1);
        dem.push(mech(0.01, vec![0, 1, 2], vec![0])).unwrap();
        dem.push(mech(0.1, vec![0, 1], vec![])).unwrap();
        dem.push(mech(0.1, vec![2], vec![0])).unwrap();
        let g = DecodingGraph::from_dem(&dem).unwrap();
        assert_eq!(g.edges().len(), 2);
        assert!(g.edge_between(1, 2).is_none());
        let e = g.edge_between(0, 1).unwrap();
        assert!(e.observables.is_empty());
        assert!((e.probability - combine_probabilities(0.1, 0.01)).abs() < 1e-12);
        assert_eq!(g.edge_between(2, 3).unwrap().observables, vec![0]);
    }

    #[test]
    fn hyperedge_split_matches_observables() {
        let mut g = DecodingGraph::new(3, 1);
        g.add_edge(0, 1, 0.1, vec![]).unwrap();
        g.add_edge(2, 3, 0.1, vec![0]).unwrap();
        g.add_edge(0, 3, 0.1, vec![0]).unwrap();
        g.add_edge(1, 2, 0.1, vec![0]).unwrap();
        // {0,1} + {2} would flip L0; only {0} + {1,2} cancels it.
        let parts = g.decompose(&part(vec![0, 1, 2], vec![])).unwrap();
        assert_eq!(parts, vec![part(vec![0], vec![0]), part(vec![1, 2], vec![0])]);
        assert_eq!(
            g.decompose(&part(vec![0, 1, 2], vec![0])).unwrap(),
            vec![part(vec![0, 1], vec![]), part(vec![2], vec![0])]
        );
    }

    #[test]
    fn components_keep_check_types_apart() {
        // Detectors 0, 1 belong to one check type, 2, 3 to the other.
        let mut dem = DetectorErrorModel::new(4, 1);
        dem.push(mech(0.01, vec![0, 1], vec![0])).unwrap();
        dem.push(mech(0.01, vec![2, 3], vec![])).unwrap();
        let mut y = mech(0.01, vec![0, 1, 2, 3], vec![0]);
        y.components = vec![part(vec![0, 1], vec![0]), part(vec![2, 3], vec![])];
        dem.push(y).unwrap();
        let mut crossing = mech(0.01, vec![1, 2], vec![]);
        crossing.components = vec![part(vec![1], vec![]), part(vec![2], vec![])];
        dem.push(crossing).unwrap();

        let g = DecodingGraph::from_dem(&dem).unwrap();
        assert!(g.edge_between(1, 2).is_none());
        assert!(g.edge_between(0, 2).is_none());
        assert_eq!(g.edge_between(0, 1).unwrap().observables, vec![0]);
        assert!(g.edge_between(1, 4).is_some());
        assert!(g.edge_between(2, 4).is_some());
    }

    #[test]
    fn labels_are_never_replaced() {
        let mut g = DecodingGraph::new(2, 2);
        assert_eq!(g.add_edge(0, 1, 0.1, vec![]), Ok(true));
        assert_eq!(g.add_edge(1, 0, 0.2, vec![]), Ok(true));
        assert_eq!(g.edges().len(), 1);
        assert!((g.edges()[0].probability - 0.26).abs() < 1e-12);

        assert_eq!(g.add_edge(0, 1, 0.4, vec![1]), Ok(false));
        assert!(g.edges()[0].observables.is_empty());
        assert!((g.edges()[0].probability - 0.26).abs() < 1e-12);
    }

    #[test]
    fn likelier_graphlike_mechanism_sets_the_label() {
        let mut dem = DetectorErrorModel::new(2, 1);
        dem.push(mech(0.01, vec![0, 1], vec![0])).unwrap();
        dem.push(mech(0.2, vec![0, 1], vec![])).unwrap();
        let g = DecodingGraph::from_dem(&dem).unwrap();
        let e = g.edge_between(0, 1).unwrap();
        assert!(e.observables.is_empty());
        assert!((e.probability - 0.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_nodes() {
        let mut g = DecodingGraph::new(2, 0);
        assert_eq!(
            g.add_edge(0, 3, 0.1, vec![]),
            Err(QecError::NodeOutOfBounds(3))
        );
        assert!(g.add_edge(0, 2, 0.1, vec![]).is_ok());
        assert_eq!(g.adjacency()[2], vec![0]);
    }

    #[test]
    fn weights_are_clamped() {
        assert_eq!(edge_weight(0.5), 0.0);
        assert_eq!(edge_weight(0.9), 0.0);
        assert!(edge_weight(0.0).is_infinite());
    }
}

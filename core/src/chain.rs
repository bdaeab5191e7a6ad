use crate::error::{CoreError, Result};
use shared::{StateT, WeightT};
use std::collections::BTreeMap;

/// One outgoing transition, owned by the chain's edge arena.
#[derive(Debug, Clone)]
struct Edge {
    from: StateT,
    to: StateT,
    probability: WeightT,
    decorations: Vec<WeightT>,
}

/// Dense arena index identifying one edge; held by both `forward` and
/// `inverse` indexes, neither of which owns the edge itself.
type EdgeHandle = usize;

#[derive(Debug, Clone)]
struct NodeRecord {
    decorations: Vec<WeightT>,
}

impl NodeRecord {
    fn new(n_node_decorations: usize) -> Self {
        NodeRecord {
            decorations: vec![0.0; n_node_decorations],
        }
    }
}

/// A discrete-time Markov chain: states with per-state decoration vectors,
/// edges with probabilities and per-edge decoration vectors, indexed both
/// forward (source -> destination) and backward (destination -> source).
///
/// Not `Clone`: chains are meant to be owned and mutated in place by readers
/// and the generator, mirroring the non-copyable chain type this is
/// patterned on.
#[derive(Debug)]
pub struct Chain {
    n_edge_decorations: usize,
    n_node_decorations: usize,
    states: BTreeMap<StateT, NodeRecord>,
    forward: BTreeMap<StateT, BTreeMap<StateT, EdgeHandle>>,
    inverse: BTreeMap<StateT, BTreeMap<StateT, EdgeHandle>>,
    edges: Vec<Edge>,
}

impl Chain {
    pub fn new(n_edge_decorations: usize, n_node_decorations: usize) -> Self {
        Chain {
            n_edge_decorations,
            n_node_decorations,
            states: BTreeMap::new(),
            forward: BTreeMap::new(),
            inverse: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn n_edge_decorations(&self) -> usize {
        self.n_edge_decorations
    }

    #[inline(always)]
    pub fn n_node_decorations(&self) -> usize {
        self.n_node_decorations
    }

    #[inline(always)]
    pub fn empty(&self) -> bool {
        self.states.is_empty() && self.edges.is_empty()
    }

    #[inline(always)]
    pub fn size_states(&self) -> usize {
        self.states.len()
    }

    #[inline(always)]
    pub fn size_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateT> + '_ {
        self.states.keys().copied()
    }

    /// Idempotent insertion of a zero-decorated state.
    pub fn init_state(&mut self, id: StateT) {
        let n_node_decorations = self.n_node_decorations;
        self.states
            .entry(id)
            .or_insert_with(|| NodeRecord::new(n_node_decorations));
    }

    /// Adds a new edge `from -> to` with the given probability and
    /// zero-initialised decorations. Fails if the edge already exists.
    pub fn add_edge(&mut self, from: StateT, to: StateT, probability: WeightT) -> Result<()> {
        if self
            .forward
            .get(&from)
            .map_or(false, |out| out.contains_key(&to))
        {
            return Err(CoreError::EdgeExists { from, to });
        }

        let handle = self.edges.len();
        self.edges.push(Edge {
            from,
            to,
            probability,
            decorations: vec![0.0; self.n_edge_decorations],
        });

        self.init_state(from);
        self.init_state(to);
        self.forward.entry(from).or_default().insert(to, handle);
        self.inverse.entry(to).or_default().insert(from, handle);
        Ok(())
    }

    fn edge_handle(&self, from: StateT, to: StateT) -> Result<EdgeHandle> {
        self.forward
            .get(&from)
            .and_then(|out| out.get(&to))
            .copied()
            .ok_or(CoreError::NoSuchEdge { from, to })
    }

    pub fn edge_probability(&self, from: StateT, to: StateT) -> Result<WeightT> {
        let handle = self.edge_handle(from, to)?;
        Ok(self.edges[handle].probability)
    }

    pub fn edge_decoration(&self, from: StateT, to: StateT, index: usize) -> Result<WeightT> {
        let handle = self.edge_handle(from, to)?;
        self.check_edge_decoration_index(index)?;
        Ok(self.edges[handle].decorations[index])
    }

    pub fn set_edge_decoration(
        &mut self,
        from: StateT,
        to: StateT,
        index: usize,
        value: WeightT,
    ) -> Result<()> {
        self.check_edge_decoration_index(index)?;
        let handle = self.edge_handle(from, to)?;
        self.edges[handle].decorations[index] = value;
        Ok(())
    }

    pub fn state_decoration(&self, id: StateT, index: usize) -> Result<WeightT> {
        self.check_node_decoration_index(index)?;
        self.states
            .get(&id)
            .map(|record| record.decorations[index])
            .ok_or_else(|| CoreError::InvalidArgument(format!("no such state {}", id)))
    }

    /// Writes `values_by_state_id[state]` into every known state's decoration
    /// slot `index`. States in `values_by_state_id` that are not in the
    /// chain are ignored; states in the chain without an entry are left
    /// untouched.
    pub fn set_state_decoration_vector(
        &mut self,
        values_by_state_id: &BTreeMap<StateT, WeightT>,
        index: usize,
    ) -> Result<()> {
        self.check_node_decoration_index(index)?;
        for (id, record) in self.states.iter_mut() {
            if let Some(&value) = values_by_state_id.get(id) {
                record.decorations[index] = value;
            }
        }
        Ok(())
    }

    /// Iterates `(source, destination, probability)` for every edge out of `u`.
    pub fn outgoing(&self, u: StateT) -> impl Iterator<Item = (StateT, WeightT)> + '_ {
        self.forward
            .get(&u)
            .into_iter()
            .flat_map(move |out| out.iter().map(move |(&v, &h)| (v, self.edges[h].probability)))
    }

    fn check_edge_decoration_index(&self, index: usize) -> Result<()> {
        if index >= self.n_edge_decorations {
            return Err(CoreError::DecorationOutOfRange {
                index,
                count: self.n_edge_decorations,
            });
        }
        Ok(())
    }

    fn check_node_decoration_index(&self, index: usize) -> Result<()> {
        if index >= self.n_node_decorations {
            return Err(CoreError::DecorationOutOfRange {
                index,
                count: self.n_node_decorations,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_populates_both_indexes() {
        let mut mc = Chain::new(1, 1);
        mc.add_edge(0, 1, 0.5).unwrap();
        assert_eq!(mc.size_states(), 2);
        assert_eq!(mc.size_edges(), 1);
        assert_eq!(mc.edge_probability(0, 1).unwrap(), 0.5);
    }

    #[test]
    fn add_duplicate_edge_fails() {
        let mut mc = Chain::new(1, 1);
        mc.add_edge(0, 1, 0.5).unwrap();
        assert!(matches!(
            mc.add_edge(0, 1, 0.3),
            Err(CoreError::EdgeExists { from: 0, to: 1 })
        ));
    }

    #[test]
    fn decoration_index_out_of_range() {
        let mut mc = Chain::new(1, 1);
        mc.add_edge(0, 1, 1.0).unwrap();
        assert!(matches!(
            mc.edge_decoration(0, 1, 5),
            Err(CoreError::DecorationOutOfRange { index: 5, count: 1 })
        ));
    }

    #[test]
    fn missing_edge_decoration_fails() {
        let mc = Chain::new(1, 1);
        assert!(matches!(
            mc.edge_decoration(0, 1, 0),
            Err(CoreError::NoSuchEdge { from: 0, to: 1 })
        ));
    }

    #[test]
    fn empty_is_true_only_before_any_mutation() {
        let mut mc = Chain::new(0, 0);
        assert!(mc.empty());
        mc.init_state(0);
        assert!(!mc.empty());
    }
}

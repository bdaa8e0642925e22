use petgraph::Direction::{Incoming, Outgoing};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// A single species in a generated network.
///
/// Identity is the integer id in `[0, n_species)`. The block model attaches a
/// block id and scaled attribute values; niche-model species carry neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: usize,
    pub block: Option<usize>,
    pub attributes: BTreeMap<String, f64>,
}

impl Species {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            block: None,
            attributes: BTreeMap::new(),
        }
    }
}

/// A directed food web over species `0..n_species`.
///
/// An edge `j -> i` records that species `i` consumes species `j`. All
/// species are kept as nodes even when edge-less, and the graph is not
/// guaranteed to be acyclic.
///
/// Nodes are inserted in id order and never removed, so a species id and its
/// petgraph node index coincide for the whole lifetime of the web.
pub struct FoodWeb {
    graph: DiGraph<Species, ()>,
}

impl FoodWeb {
    /// Create a web of `n_species` nodes and no edges.
    pub fn new(n_species: usize) -> Self {
        let mut graph = DiGraph::with_capacity(n_species, 0);
        for id in 0..n_species {
            graph.add_node(Species::new(id));
        }
        Self { graph }
    }

    fn idx(id: usize) -> NodeIndex {
        NodeIndex::new(id)
    }

    pub fn n_species(&self) -> usize {
        self.graph.node_count()
    }

    pub fn n_links(&self) -> usize {
        self.graph.edge_count()
    }

    /// Record that `consumer` consumes `prey` (edge `prey -> consumer`).
    pub fn add_link(&mut self, prey: usize, consumer: usize) {
        self.graph.update_edge(Self::idx(prey), Self::idx(consumer), ());
    }

    pub fn has_link(&self, prey: usize, consumer: usize) -> bool {
        self.graph
            .find_edge(Self::idx(prey), Self::idx(consumer))
            .is_some()
    }

    /// Species consumed by `id`, sorted ascending.
    pub fn prey_of(&self, id: usize) -> Vec<usize> {
        let mut prey: Vec<_> = self
            .graph
            .neighbors_directed(Self::idx(id), Incoming)
            .map(NodeIndex::index)
            .collect();
        prey.sort_unstable();
        prey
    }

    /// Species that consume `id`, sorted ascending.
    pub fn predators_of(&self, id: usize) -> Vec<usize> {
        let mut predators: Vec<_> = self
            .graph
            .neighbors_directed(Self::idx(id), Outgoing)
            .map(NodeIndex::index)
            .collect();
        predators.sort_unstable();
        predators
    }

    pub fn in_degree(&self, id: usize) -> usize {
        self.graph.edges_directed(Self::idx(id), Incoming).count()
    }

    pub fn out_degree(&self, id: usize) -> usize {
        self.graph.edges_directed(Self::idx(id), Outgoing).count()
    }

    /// A species with neither prey nor predators.
    pub fn is_isolate(&self, id: usize) -> bool {
        self.in_degree(id) == 0 && self.out_degree(id) == 0
    }

    /// All isolated species, in node order.
    pub fn isolates(&self) -> Vec<usize> {
        (0..self.n_species())
            .filter(|&id| self.is_isolate(id))
            .collect()
    }

    /// The (sorted prey ids, sorted predator ids) pair identifying the
    /// trophic role of `id`; two species sharing a signature are trophically
    /// identical.
    pub fn trophic_signature(&self, id: usize) -> (Vec<usize>, Vec<usize>) {
        (self.prey_of(id), self.predators_of(id))
    }

    /// All `(prey, consumer)` pairs, sorted ascending.
    pub fn links(&self) -> Vec<(usize, usize)> {
        let mut links: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index()))
            .collect();
        links.sort_unstable();
        links
    }

    pub fn species(&self, id: usize) -> &Species {
        &self.graph[Self::idx(id)]
    }

    pub fn species_mut(&mut self, id: usize) -> &mut Species {
        &mut self.graph[Self::idx(id)]
    }

    pub fn species_iter(&self) -> impl Iterator<Item = &Species> {
        self.graph.node_weights()
    }
}

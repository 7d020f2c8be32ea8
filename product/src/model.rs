use solver::index::IndexedVec;
use solver::Set;

use crate::ModelNode;

/// The system side of a product: a graph alternating between state nodes,
/// where a player picks a successor, and distribution nodes, where the
/// successor is drawn at random.
pub trait Model {
    fn node_count(&self) -> usize;

    fn initial_nodes(&self) -> &[ModelNode];

    fn is_state(&self, n: ModelNode) -> bool;

    /// The player choosing the successor of a state node.
    fn controller_of(&self, n: ModelNode) -> usize;

    fn successor_count(&self, n: ModelNode) -> usize;
    fn successor(&self, n: ModelNode, i: usize) -> ModelNode;

    /// Probability of an edge of a distribution node.
    fn weight(&self, n: ModelNode, i: usize) -> f64;

    fn holds(&self, n: ModelNode, proposition: &str) -> bool;
}

#[derive(Clone, Debug)]
struct NodeData {
    state: bool,
    controller: usize,
    propositions: Set<String>,
    successors: Vec<(ModelNode, f64)>,
}

/// A model stored as adjacency lists.
#[derive(Clone, Debug, Default)]
pub struct ExplicitModel {
    initial: Vec<ModelNode>,
    nodes: IndexedVec<ModelNode, NodeData>,
}

impl ExplicitModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state node owned by `controller` where `propositions` hold.
    pub fn add_state(&mut self, controller: usize, propositions: &[&str]) -> ModelNode {
        self.nodes.push(NodeData {
            state: true,
            controller,
            propositions: propositions.iter().map(|p| p.to_string()).collect(),
            successors: Vec::new(),
        })
    }

    pub fn add_distribution(&mut self) -> ModelNode {
        self.nodes.push(NodeData {
            state: false,
            controller: 0,
            propositions: Set::default(),
            successors: Vec::new(),
        })
    }

    pub fn add_initial(&mut self, n: ModelNode) {
        self.initial.push(n);
    }

    pub fn add_edge(&mut self, from: ModelNode, to: ModelNode) {
        self.add_weighted_edge(from, to, 1.0);
    }

    pub fn add_weighted_edge(&mut self, from: ModelNode, to: ModelNode, weight: f64) {
        self.nodes[from].successors.push((to, weight));
    }
}

impl Model for ExplicitModel {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn initial_nodes(&self) -> &[ModelNode] {
        &self.initial
    }

    fn is_state(&self, n: ModelNode) -> bool {
        self.nodes[n].state
    }

    fn controller_of(&self, n: ModelNode) -> usize {
        self.nodes[n].controller
    }

    fn successor_count(&self, n: ModelNode) -> usize {
        self.nodes[n].successors.len()
    }

    fn successor(&self, n: ModelNode, i: usize) -> ModelNode {
        self.nodes[n].successors[i].0
    }

    fn weight(&self, n: ModelNode, i: usize) -> f64 {
        self.nodes[n].successors[i].1
    }

    fn holds(&self, n: ModelNode, proposition: &str) -> bool {
        self.nodes[n].propositions.contains(proposition)
    }
}

use std::iter;

use automaton::{Automaton, LabelId, StateId};
use bitvec::vec::BitVec;
use either::Either::{Left, Right};
use log::debug;
use solver::game::NodeId;
use solver::index::{AsIndex, IndexedSet};

use crate::model::Model;
use crate::{ModelNode, ProductError};

const HALF_BITS: u32 = 32;
const HALF_MASK: u64 = (1 << HALF_BITS) - 1;

/// A node of the product: a model node paired with the automaton state
/// reached so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProductState {
    pub model: ModelNode,
    pub automaton: StateId,
}

impl ProductState {
    pub(crate) fn pack(self) -> Result<u64, ProductError> {
        let half = |index: usize| match u64::try_from(index) {
            Ok(index) if index <= HALF_MASK => Ok(index),
            _ => Err(ProductError::InsufficientStates { limit: HALF_MASK as usize + 1 }),
        };
        Ok(half(self.model.to_usize())? << HALF_BITS | half(self.automaton.to_usize())?)
    }

    pub(crate) fn unpack(packed: u64) -> Self {
        Self {
            model: ModelNode((packed >> HALF_BITS) as usize),
            automaton: StateId((packed & HALF_MASK) as usize),
        }
    }
}

/// Successors of the last queried node.
#[derive(Default)]
struct Query {
    node: Option<NodeId>,
    successors: Vec<NodeId>,
    /// Label of the automaton transition taken, for deterministic automata.
    node_label: Option<LabelId>,
    /// Label of the automaton transition behind every successor, for
    /// nondeterministic automata.
    edge_labels: Vec<LabelId>,
}

/// The product of a model and an automaton, explored on demand.
///
/// Product nodes are numbered in the order they are first reached, starting
/// with the initial nodes. Querying a node computes and caches the successors
/// of that node only, so iterating the successors of one node at a time is
/// cheap while jumping between nodes recomputes them.
pub struct ProductGraph<'a, M, A> {
    model: &'a M,
    automaton: A,
    moves: Box<dyn Fn(ModelNode) -> bool + 'a>,
    state_limit: Option<usize>,
    nodes: IndexedSet<NodeId, u64>,
    initial: Option<Vec<NodeId>>,
    query: Query,
}

impl<'a, M: Model, A: Automaton> ProductGraph<'a, M, A> {
    pub fn new(model: &'a M, automaton: A) -> Self {
        Self {
            model,
            automaton,
            moves: Box::new(move |n| model.is_state(n)),
            state_limit: None,
            nodes: IndexedSet::default(),
            initial: None,
            query: Query::default(),
        }
    }

    /// Replaces the predicate deciding at which model nodes the automaton
    /// reads the model's propositions and takes a step. Elsewhere the
    /// automaton state is carried along unchanged.
    pub fn moves_when(mut self, moves: impl Fn(ModelNode) -> bool + 'a) -> Self {
        self.moves = Box::new(moves);
        self
    }

    /// Reserves room for `limit` product nodes only. Reaching one more fails
    /// with [`ProductError::InsufficientStates`].
    pub fn state_limit(mut self, limit: usize) -> Self {
        self.state_limit = Some(limit);
        self
    }

    pub fn model(&self) -> &'a M {
        self.model
    }

    pub fn automaton(&self) -> &A {
        &self.automaton
    }

    /// Number of product nodes reached so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn state(&self, n: NodeId) -> ProductState {
        ProductState::unpack(self.nodes[n])
    }

    pub fn node_of(&self, state: ProductState) -> Option<NodeId> {
        self.nodes.get_index_of(&state.pack().ok()?)
    }

    /// The initial model nodes paired with the initial automaton state.
    pub fn initial_nodes(&mut self) -> Result<Vec<NodeId>, ProductError> {
        if let Some(initial) = &self.initial {
            return Ok(initial.clone());
        }
        let automaton = self.automaton.initial_state();
        let model = self.model;
        let initial = model
            .initial_nodes()
            .iter()
            .map(|&model| self.intern(ProductState { model, automaton }))
            .collect::<Result<Vec<_>, _>>()?;
        self.initial = Some(initial.clone());
        Ok(initial)
    }

    pub fn successor_count(&mut self, n: NodeId) -> Result<usize, ProductError> {
        self.query_node(n)?;
        Ok(self.query.successors.len())
    }

    pub fn successor(&mut self, n: NodeId, i: usize) -> Result<NodeId, ProductError> {
        self.query_node(n)?;
        Ok(self.query.successors[i])
    }

    pub fn successors(&mut self, n: NodeId) -> Result<&[NodeId], ProductError> {
        self.query_node(n)?;
        Ok(&self.query.successors)
    }

    /// Probability of the `i`-th successor, taken from the model edge it
    /// follows.
    pub fn weight(&mut self, n: NodeId, i: usize) -> Result<f64, ProductError> {
        self.query_node(n)?;
        let model = self.state(n).model;
        Ok(self.model.weight(model, i % self.model.successor_count(model)))
    }

    /// Label of the transition a deterministic automaton takes in `n`, or
    /// `None` if the automaton does not move there.
    pub fn node_label(&mut self, n: NodeId) -> Result<Option<LabelId>, ProductError> {
        self.query_node(n)?;
        Ok(self.query.node_label)
    }

    /// Label of the transition a nondeterministic automaton takes towards the
    /// `i`-th successor of `n`, or `None` if the automaton does not move there.
    pub fn edge_label(&mut self, n: NodeId, i: usize) -> Result<Option<LabelId>, ProductError> {
        self.query_node(n)?;
        Ok(self.query.edge_labels.get(i).copied())
    }

    /// Reaches every node of the product and returns how many there are.
    pub fn explore(&mut self) -> Result<usize, ProductError> {
        self.initial_nodes()?;
        let mut next = 0;
        while next < self.node_count() {
            self.query_node(NodeId(next))?;
            next += 1;
        }
        debug!(
            "product explored: {} nodes, {} automaton states",
            self.node_count(),
            self.automaton.state_count()
        );
        Ok(self.node_count())
    }

    fn intern(&mut self, state: ProductState) -> Result<NodeId, ProductError> {
        let packed = state.pack()?;
        if let Some(node) = self.nodes.get_index_of(&packed) {
            return Ok(node);
        }
        if let Some(limit) = self.state_limit {
            if self.nodes.len() >= limit {
                return Err(ProductError::InsufficientStates { limit });
            }
        }
        let (node, _) = self.nodes.insert_full(packed);
        Ok(node)
    }

    fn query_node(&mut self, n: NodeId) -> Result<(), ProductError> {
        if self.query.node == Some(n) {
            return Ok(());
        }
        self.query.node = None;
        self.query.successors.clear();
        self.query.edge_labels.clear();
        self.query.node_label = None;

        let ProductState { model: node, automaton: state } = self.state(n);
        let model = self.model;
        let model_successors =
            (0..model.successor_count(node)).map(|i| model.successor(node, i)).collect::<Vec<_>>();

        let moves = (self.moves)(node);
        let transitions = match moves {
            true => {
                let valuation = self
                    .automaton
                    .expressions()
                    .iter()
                    .map(|expression| model.holds(node, expression))
                    .collect::<BitVec>();
                self.automaton.query(&valuation, state)
            }
            false => Vec::new(),
        };
        let deterministic = self.automaton.is_deterministic();
        let taken = match deterministic {
            true => &transitions[..transitions.len().min(1)],
            false => &transitions[..],
        };
        if deterministic {
            self.query.node_label = taken.first().map(|t| t.label);
        }

        // Nodes where the automaton does not move keep its state.
        let targets = match moves {
            true => Left(taken.iter().map(|t| (t.state, Some(t.label)))),
            false => Right(iter::once((state, None))),
        };
        for (target, label) in targets {
            for &succ in &model_successors {
                let succ = self.intern(ProductState { model: succ, automaton: target })?;
                self.query.successors.push(succ);
                if let Some(label) = label.filter(|_| !deterministic) {
                    self.query.edge_labels.push(label);
                }
            }
        }
        self.query.node = Some(n);
        Ok(())
    }
}

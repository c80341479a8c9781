//! The IR graph the vector factory builds into.
//!
//! The graph provides:
//! - **Arena storage**: nodes addressed by [`NodeId`]
//! - **Use lists**: who consumes each node
//! - **Constant interning**: one node per distinct constant, so identity
//!   constants and lane positions are shared
//!
//! The graph owns every node. Factory functions hand back unattached
//! [`VectorNode`](crate::vector::VectorNode) values; ownership moves here
//! when they are attached.

use rustc_hash::FxHashMap;
use smallvec::smallvec;

use super::arena::{Arena, SecondaryMap};
use super::node::{InputList, Node, NodeId};
use super::operators::{Operator, ScalarOpcode};
use super::types::{BasicType, NodeType, ScalarConstant};

// =============================================================================
// Graph Structure
// =============================================================================

/// A compilation unit's IR graph.
#[derive(Clone)]
pub struct Graph {
    nodes: Arena<Node>,

    /// For each node, the nodes that read it.
    uses: SecondaryMap<Node, Vec<NodeId>>,

    /// Interned constants.
    constants: FxHashMap<Operator, NodeId>,

    /// Control entry.
    pub start: NodeId,
}

impl Graph {
    /// Create a graph holding only the start node.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a graph with room for `node_capacity` nodes.
    pub fn with_capacity(node_capacity: usize) -> Self {
        let mut nodes = Arena::with_capacity(node_capacity);
        let start = nodes.alloc(Node::new(
            Operator::Start,
            InputList::new(),
            NodeType::Control,
        ));
        Graph {
            nodes,
            uses: SecondaryMap::new(),
            constants: FxHashMap::default(),
            start,
        }
    }

    // =========================================================================
    // Node Access
    // =========================================================================

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only the start node exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[inline]
    pub fn op(&self, id: NodeId) -> Operator {
        self.nodes[id].op
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> NodeType {
        self.nodes[id].ty
    }

    /// Input of `id` at `slot`.
    #[inline]
    pub fn input(&self, id: NodeId, slot: usize) -> Option<NodeId> {
        self.nodes[id].input(slot)
    }

    /// Number of input slots of `id`, control included.
    #[inline]
    pub fn required_operand_count(&self, id: NodeId) -> usize {
        self.nodes[id].req()
    }

    /// Iterate over nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    // =========================================================================
    // Node Creation
    // =========================================================================

    /// Append a node. Invalid input IDs mark unused slots.
    pub fn add_node(&mut self, op: Operator, inputs: &[NodeId], ty: NodeType) -> NodeId {
        let id = self
            .nodes
            .alloc(Node::new(op, InputList::from_slice(inputs), ty));
        for &input in inputs {
            self.add_use(input, id);
        }
        id
    }

    /// Incoming value of the given type.
    pub fn parameter(&mut self, index: u16, ty: NodeType) -> NodeId {
        self.add_node(Operator::Parameter(index), &[self.start], ty)
    }

    /// Scalar node with the standard slot layout: control, then operands.
    pub fn scalar(
        &mut self,
        op: ScalarOpcode,
        control: Option<NodeId>,
        operands: &[NodeId],
        ty: NodeType,
    ) -> NodeId {
        let mut inputs: InputList = smallvec![control.unwrap_or(NodeId::INVALID)];
        inputs.extend_from_slice(operands);
        self.add_node(Operator::Scalar(op), &inputs, ty)
    }

    /// Pointer cast of `object`, keeping its type.
    pub fn cast_pp(&mut self, object: NodeId) -> NodeId {
        let ty = self.ty(object);
        self.add_node(Operator::CastPP, &[NodeId::INVALID, object], ty)
    }

    /// Strip pointer casts.
    pub fn uncast(&self, mut id: NodeId) -> NodeId {
        while self.op(id) == Operator::CastPP {
            match self.input(id, 1) {
                Some(inner) => id = inner,
                None => break,
            }
        }
        id
    }

    // =========================================================================
    // Constants
    // =========================================================================

    /// Interned constant node.
    pub fn con(&mut self, value: ScalarConstant) -> NodeId {
        let op = Operator::constant(value);
        if let Some(&id) = self.constants.get(&op) {
            return id;
        }
        let ty = NodeType::Scalar(value.basic_type());
        let id = self.add_node(op, &[], ty);
        self.constants.insert(op, id);
        id
    }

    #[inline]
    pub fn int_con(&mut self, value: i32) -> NodeId {
        self.con(ScalarConstant::Int(value))
    }

    #[inline]
    pub fn long_con(&mut self, value: i64) -> NodeId {
        self.con(ScalarConstant::Long(value))
    }

    #[inline]
    pub fn float_con(&mut self, value: f32) -> NodeId {
        self.con(ScalarConstant::Float(value))
    }

    #[inline]
    pub fn double_con(&mut self, value: f64) -> NodeId {
        self.con(ScalarConstant::Double(value))
    }

    /// Zero of the register class holding `bt`.
    ///
    /// # Panics
    ///
    /// Panics for non-primitive types.
    #[track_caller]
    pub fn zero_con(&mut self, bt: BasicType) -> NodeId {
        match ScalarConstant::zero(bt) {
            Some(zero) => self.con(zero),
            None => panic!("no zero constant for type '{}'", bt),
        }
    }

    /// The constant value of `id`, if it is a constant node.
    #[inline]
    pub fn constant(&self, id: NodeId) -> Option<ScalarConstant> {
        self.nodes[id].as_constant()
    }

    // =========================================================================
    // Use-Def Chains
    // =========================================================================

    /// Nodes reading `id`.
    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        self.uses.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn add_use(&mut self, def: NodeId, user: NodeId) {
        if def.is_valid() {
            self.uses.entry(def).push(user);
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph ({} nodes)", self.nodes.len())?;
        for (id, node) in self.iter() {
            writeln!(f, "  {:?}: {:?}", id, node)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

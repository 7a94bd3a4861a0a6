/*!
The compiled-model arena: regions, vertices and transitions are stored by
value in flat `Vec`s on `StateMachine` and referenced by `RegionId`/
`VertexId`/`TransitionId` indices, rather than linked by `Rc` as the teacher's
own `definition::types`/`definition::impls` sketch does. An arena sidesteps
the parent/child reference cycle that sketch cannot express without
`RefCell`-guarded `Rc` cycles: a child vertex needs to reach its parent
region to look up siblings, and a region needs to reach its children, which
with owned `Rc<RefCell<...>>` values means either leaking memory or reaching
for `Weak`. Indices have neither problem, at the cost of every lookup going
through `&StateMachine`.
*/

use crate::instance::Instance;
use crate::message::Message;
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::Arc;

// ------------------------------------------------------------------------------------------------
// Public Types: collaborator signatures
// ------------------------------------------------------------------------------------------------

/// `(message, instance, deepHistory) -> ignored`, matching spec.md §6 exactly.
/// `deepHistory` is `true` when this invocation is part of entering a vertex
/// that was restored from history rather than reached via an initial
/// pseudo-state's default target.
pub type Action<M, D> = Arc<dyn Fn(&Message<M>, &mut dyn Instance<D>, bool) + Send + Sync>;

/// `(message, instance) -> bool`, matching spec.md §6 exactly.
pub type Guard<M, D> = Arc<dyn Fn(&Message<M>, &dyn Instance<D>) -> bool + Send + Sync>;

// ------------------------------------------------------------------------------------------------
// Public Types: arena indices
// ------------------------------------------------------------------------------------------------

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub(crate) fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(RegionId);
arena_id!(VertexId);
arena_id!(TransitionId);

// ------------------------------------------------------------------------------------------------
// Public Types: declarative model
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PseudoStateKind {
    Initial,
    ShallowHistory,
    DeepHistory,
    Choice,
    Junction,
    Terminate,
}

impl PseudoStateKind {
    pub fn is_initial_family(self) -> bool {
        matches!(
            self,
            PseudoStateKind::Initial | PseudoStateKind::ShallowHistory | PseudoStateKind::DeepHistory
        )
    }

    pub fn is_history(self) -> bool {
        matches!(self, PseudoStateKind::ShallowHistory | PseudoStateKind::DeepHistory)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionKind {
    Internal,
    Local,
    External,
}

pub(crate) struct StateData<M, D> {
    pub(crate) child_regions: Vec<RegionId>,
    pub(crate) is_final: bool,
    pub(crate) entry: Vec<Action<M, D>>,
    pub(crate) exit: Vec<Action<M, D>>,
}

pub(crate) struct PseudoStateData {
    pub(crate) kind: PseudoStateKind,
}

pub(crate) enum VertexKind<M, D> {
    State(StateData<M, D>),
    Pseudo(PseudoStateData),
}

/// Pre-computed, flattened runtime opcodes. Each is an `O(1)` dispatch via an
/// arena lookup, not a walk of the declarative tree (the tree is walked
/// exactly twice, by the compiler (C3), never at evaluation time (C4)).
pub(crate) enum Step<M, D> {
    UserAction(Action<M, D>),
    InvokeLeave(VertexId),
    InvokeBeginEnter(VertexId),
    InvokeEnter(VertexId),
    LeaveRegionCurrent(RegionId),
    EnterRegionChild(RegionId),
    RecordCurrent(RegionId, VertexId),
    EvaluateCompletion(VertexId),
    SetTerminated,
}

pub(crate) struct ElementPipelines<M, D> {
    pub(crate) leave: Vec<Step<M, D>>,
    pub(crate) begin_enter: Vec<Step<M, D>>,
    pub(crate) end_enter: Vec<Step<M, D>>,
    pub(crate) enter: Vec<Step<M, D>>,
}

impl<M, D> Default for ElementPipelines<M, D> {
    fn default() -> Self {
        Self {
            leave: Vec::new(),
            begin_enter: Vec::new(),
            end_enter: Vec::new(),
            enter: Vec::new(),
        }
    }
}

impl<M, D> Clone for Step<M, D> {
    fn clone(&self) -> Self {
        match self {
            Step::UserAction(action) => Step::UserAction(action.clone()),
            Step::InvokeLeave(v) => Step::InvokeLeave(*v),
            Step::InvokeBeginEnter(v) => Step::InvokeBeginEnter(*v),
            Step::InvokeEnter(v) => Step::InvokeEnter(*v),
            Step::LeaveRegionCurrent(r) => Step::LeaveRegionCurrent(*r),
            Step::EnterRegionChild(r) => Step::EnterRegionChild(*r),
            Step::RecordCurrent(r, v) => Step::RecordCurrent(*r, *v),
            Step::EvaluateCompletion(v) => Step::EvaluateCompletion(*v),
            Step::SetTerminated => Step::SetTerminated,
        }
    }
}

impl<M, D> Default for VertexKind<M, D> {
    fn default() -> Self {
        VertexKind::Pseudo(PseudoStateData {
            kind: PseudoStateKind::Initial,
        })
    }
}

pub(crate) struct VertexData<M, D> {
    pub(crate) name: String,
    pub(crate) parent_region: RegionId,
    pub(crate) kind: VertexKind<M, D>,
    pub(crate) outgoing: Vec<TransitionId>,
    pub(crate) pipelines: ElementPipelines<M, D>,
}

pub(crate) struct RegionData<M, D> {
    pub(crate) name: String,
    /// `None` for a region owned directly by the state machine root.
    pub(crate) parent_state: Option<VertexId>,
    pub(crate) vertices: Vec<VertexId>,
    /// The region's initial-family pseudo-state, once validated to exist and
    /// be unique.
    pub(crate) initial: Option<VertexId>,
    /// The initial-family child's resolved default (unguarded, non-else)
    /// outgoing transition, fired to enter this region without restoring
    /// from history. Kept as a transition (not its target vertex) so that a
    /// default path routed through a Choice/Junction still runs through the
    /// ordinary transition-firing/continuation machinery.
    pub(crate) default_target: Option<TransitionId>,
    pub(crate) uses_history: bool,
    pub(crate) history_is_deep: bool,
    /// True if any ancestor region's initial-family child is `DeepHistory`.
    /// Computed once, top-down, in Pass A (see DESIGN.md, Open Question 6).
    pub(crate) deep_history_above: bool,
    pub(crate) _marker: std::marker::PhantomData<M>,
    pub(crate) _marker_d: std::marker::PhantomData<D>,
}

pub(crate) struct TransitionData<M, D> {
    pub(crate) name: String,
    pub(crate) source: VertexId,
    /// `None` marks an internal transition with no state-changing effect
    /// beyond its own actions.
    pub(crate) target: Option<VertexId>,
    pub(crate) kind: TransitionKind,
    pub(crate) guard: Option<Guard<M, D>>,
    pub(crate) is_else: bool,
    pub(crate) actions: Vec<Action<M, D>>,
    pub(crate) traverse: Vec<Step<M, D>>,
    /// True when `target` is a pseudo-state other than `Terminate`: firing
    /// this transition requires the evaluator to re-run selection at the
    /// target once `traverse` completes (spec.md §4.3).
    pub(crate) continuation: bool,
}

/// The compiled model. Generic over `M` (the event payload type carried by
/// [`Message`]) and `D` (the host data an [`Instance`] carries alongside its
/// active configuration).
pub struct StateMachine<M, D> {
    pub(crate) name: String,
    pub(crate) regions: Vec<RegionData<M, D>>,
    pub(crate) vertices: Vec<VertexData<M, D>>,
    pub(crate) transitions: Vec<TransitionData<M, D>>,
    pub(crate) root_regions: Vec<RegionId>,
    pub(crate) clean: Cell<bool>,
    /// Tombstones for `remove()`d elements (spec.md §3 Lifecycles): the arena slot stays, so
    /// every previously issued id remains valid to hold (and safe to compare against), but the
    /// element is detached from every containing list and skipped by `region_ids`/`vertex_ids`/
    /// `transition_ids`, so neither the validator nor the compiler ever looks at it again.
    pub(crate) removed_regions: HashSet<RegionId>,
    pub(crate) removed_vertices: HashSet<VertexId>,
    pub(crate) removed_transitions: HashSet<TransitionId>,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl<M, D> StateMachine<M, D> {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
            vertices: Vec::new(),
            transitions: Vec::new(),
            root_regions: Vec::new(),
            clean: Cell::new(false),
            removed_regions: HashSet::new(),
            removed_vertices: HashSet::new(),
            removed_transitions: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_compiled(&self) -> bool {
        self.clean.get()
    }

    pub(crate) fn mark_dirty(&self) {
        self.clean.set(false);
    }

    pub(crate) fn mark_clean(&self) {
        self.clean.set(true);
    }

    pub fn root_regions(&self) -> &[RegionId] {
        &self.root_regions
    }

    pub(crate) fn region(&self, id: RegionId) -> &RegionData<M, D> {
        &self.regions[id.index()]
    }

    pub(crate) fn region_mut(&mut self, id: RegionId) -> &mut RegionData<M, D> {
        &mut self.regions[id.index()]
    }

    pub(crate) fn vertex(&self, id: VertexId) -> &VertexData<M, D> {
        &self.vertices[id.index()]
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut VertexData<M, D> {
        &mut self.vertices[id.index()]
    }

    pub(crate) fn transition(&self, id: TransitionId) -> &TransitionData<M, D> {
        &self.transitions[id.index()]
    }

    pub(crate) fn transition_mut(&mut self, id: TransitionId) -> &mut TransitionData<M, D> {
        &mut self.transitions[id.index()]
    }

    pub(crate) fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        (0..self.regions.len()).map(RegionId).filter(move |r| !self.removed_regions.contains(r))
    }

    pub(crate) fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId).filter(move |v| !self.removed_vertices.contains(v))
    }

    pub(crate) fn transition_ids(&self) -> impl Iterator<Item = TransitionId> + '_ {
        (0..self.transitions.len())
            .map(TransitionId)
            .filter(move |t| !self.removed_transitions.contains(t))
    }

    pub fn qualified_name(&self, vertex: VertexId, separator: &str) -> String {
        let mut parts = vec![self.vertex(vertex).name.clone()];
        let mut region = self.vertex(vertex).parent_region;
        loop {
            match self.region(region).parent_state {
                Some(parent_vertex) => {
                    parts.push(self.vertex(parent_vertex).name.clone());
                    region = self.vertex(parent_vertex).parent_region;
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join(separator)
    }

    /// The chain of regions containing `vertex`, innermost first, up to and
    /// including its top-level root region.
    pub(crate) fn region_ancestors(&self, vertex: VertexId) -> Vec<RegionId> {
        let mut result = Vec::new();
        let mut region = self.vertex(vertex).parent_region;
        loop {
            result.push(region);
            match self.region(region).parent_state {
                Some(parent_vertex) => region = self.vertex(parent_vertex).parent_region,
                None => break,
            }
        }
        result
    }

    /// The innermost region that contains both `v1` and `v2`, or `None` if
    /// they live under different top-level root regions (an orthogonal
    /// state machine root with a cross-region transition between them).
    pub(crate) fn lca_region(&self, v1: VertexId, v2: VertexId) -> Option<RegionId> {
        let v2_ancestors: HashSet<RegionId> = self.region_ancestors(v2).into_iter().collect();
        self.region_ancestors(v1).into_iter().find(|r| v2_ancestors.contains(r))
    }

    /// Walks from `start` upward (vertex -> parent region -> parent vertex
    /// of that region -> ...), returning the chain including `start`,
    /// stopping at (and including) the vertex whose parent region is
    /// `boundary`, or at the topmost vertex reachable if `boundary` is
    /// `None` or never matched (disjoint root regions).
    pub(crate) fn vertex_chain_to_boundary(
        &self,
        start: VertexId,
        boundary: Option<RegionId>,
    ) -> Vec<VertexId> {
        let mut chain = vec![start];
        let mut current = start;
        loop {
            let parent_region = self.vertex(current).parent_region;
            if boundary == Some(parent_region) {
                break;
            }
            match self.region(parent_region).parent_state {
                Some(parent_vertex) => {
                    current = parent_vertex;
                    chain.push(current);
                }
                None => break,
            }
        }
        chain
    }

    pub(crate) fn is_descendant(&self, ancestor: VertexId, vertex: VertexId) -> bool {
        if ancestor == vertex {
            return true;
        }
        let mut region = self.vertex(vertex).parent_region;
        loop {
            if let Some(parent_vertex) = self.region(region).parent_state {
                if parent_vertex == ancestor {
                    return true;
                }
                region = self.vertex(parent_vertex).parent_region;
            } else {
                return false;
            }
        }
    }

    pub fn is_state(&self, vertex: VertexId) -> bool {
        matches!(self.vertex(vertex).kind, VertexKind::State(_))
    }

    pub fn is_final(&self, vertex: VertexId) -> bool {
        matches!(&self.vertex(vertex).kind, VertexKind::State(s) if s.is_final)
    }

    pub fn pseudo_state_kind(&self, vertex: VertexId) -> Option<PseudoStateKind> {
        match &self.vertex(vertex).kind {
            VertexKind::Pseudo(p) => Some(p.kind),
            VertexKind::State(_) => None,
        }
    }

    pub fn vertex_name(&self, vertex: VertexId) -> &str {
        &self.vertex(vertex).name
    }

    pub fn region_name(&self, region: RegionId) -> &str {
        &self.region(region).name
    }
}

/*!
Fluent construction surface over the arena in `definition::types`. Thin and
non-authoritative, exactly as the teacher's own `definition::builder` is: it
performs no validation and no compilation, it only assembles the declarative
model that `validate` and `compile` later consume.
*/

use crate::definition::types::{
    Action, Guard, PseudoStateData, PseudoStateKind, RegionData, RegionId, StateData, StateMachine,
    TransitionData, TransitionId, TransitionKind, VertexData, VertexId, VertexKind,
};
use std::marker::PhantomData;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// A chainable handle onto one state, for attaching entry/exit behavior.
pub struct StateHandle<'a, M, D> {
    machine: &'a mut StateMachine<M, D>,
    id: VertexId,
}

/// A chainable handle onto one transition, for attaching guards/effects.
pub struct TransitionHandle<'a, M, D> {
    machine: &'a mut StateMachine<M, D>,
    id: TransitionId,
}

// ------------------------------------------------------------------------------------------------
// Implementations: raw construction, on StateMachine itself
// ------------------------------------------------------------------------------------------------

impl<M, D> StateMachine<M, D> {
    /// Adds a region. `parent` is `None` for a top-level region owned
    /// directly by the state machine, or `Some(state)` for a region nested
    /// inside a composite/orthogonal state.
    pub fn add_region<S: Into<String>>(&mut self, name: S, parent: Option<VertexId>) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(RegionData {
            name: name.into(),
            parent_state: parent,
            vertices: Vec::new(),
            initial: None,
            default_target: None,
            uses_history: false,
            history_is_deep: false,
            deep_history_above: false,
            _marker: PhantomData,
            _marker_d: PhantomData,
        });
        match parent {
            Some(v) => {
                if let VertexKind::State(state) = &mut self.vertex_mut(v).kind {
                    state.child_regions.push(id);
                }
            }
            None => self.root_regions.push(id),
        }
        self.mark_dirty();
        id
    }

    fn add_vertex<S: Into<String>>(&mut self, name: S, parent: RegionId, kind: VertexKind<M, D>) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(VertexData {
            name: name.into(),
            parent_region: parent,
            kind,
            outgoing: Vec::new(),
            pipelines: Default::default(),
        });
        self.region_mut(parent).vertices.push(id);
        self.mark_dirty();
        id
    }

    /// Adds an ordinary (non-final) state to `parent`.
    pub fn add_state<S: Into<String>>(&mut self, name: S, parent: RegionId) -> VertexId {
        self.add_vertex(
            name,
            parent,
            VertexKind::State(StateData {
                child_regions: Vec::new(),
                is_final: false,
                entry: Vec::new(),
                exit: Vec::new(),
            }),
        )
    }

    /// Adds a final state to `parent`.
    pub fn add_final_state<S: Into<String>>(&mut self, name: S, parent: RegionId) -> VertexId {
        self.add_vertex(
            name,
            parent,
            VertexKind::State(StateData {
                child_regions: Vec::new(),
                is_final: true,
                entry: Vec::new(),
                exit: Vec::new(),
            }),
        )
    }

    /// Adds a pseudo-state of the given kind to `parent`.
    pub fn add_pseudo_state<S: Into<String>>(
        &mut self,
        name: S,
        parent: RegionId,
        kind: PseudoStateKind,
    ) -> VertexId {
        self.add_vertex(name, parent, VertexKind::Pseudo(PseudoStateData { kind }))
    }

    /// Adds a transition. `target` is `None` for an internal transition that
    /// never changes the active configuration.
    ///
    /// A `None` target always normalizes `kind` to `Internal` (spec.md §3: "a
    /// `null` target denotes an internal transition"); a `Local` transition
    /// whose target turns out not to be a proper descendant of its source
    /// normalizes to `External` (spec.md §3 invariant 4), exactly as the
    /// teacher's own constructors coerce mismatched transition metadata
    /// rather than rejecting it.
    pub fn add_transition<S: Into<String>>(
        &mut self,
        name: S,
        source: VertexId,
        target: Option<VertexId>,
        kind: TransitionKind,
    ) -> TransitionId {
        let kind = match target {
            None => TransitionKind::Internal,
            Some(target) if kind == TransitionKind::Local && !self.is_descendant(source, target) => {
                TransitionKind::External
            }
            Some(_) => kind,
        };
        let id = TransitionId(self.transitions.len());
        self.transitions.push(TransitionData {
            name: name.into(),
            source,
            target,
            kind,
            guard: None,
            is_else: false,
            actions: Vec::new(),
            traverse: Vec::new(),
            continuation: false,
        });
        self.vertex_mut(source).outgoing.push(id);
        self.mark_dirty();
        id
    }

    /// Detaches `transition` from its source vertex's outgoing list and tombstones it (spec.md
    /// §3 Lifecycles). A no-op if already removed.
    pub fn remove_transition(&mut self, transition: TransitionId) {
        if self.removed_transitions.contains(&transition) {
            return;
        }
        let source = self.transition(transition).source;
        self.vertex_mut(source).outgoing.retain(|t| *t != transition);
        let _ = self.removed_transitions.insert(transition);
        self.mark_dirty();
    }

    /// Detaches `vertex` from its parent region, tombstones it, and recursively removes every
    /// transition that references it (as source or target) and every child region it owns
    /// (spec.md §3 Lifecycles). A no-op if already removed.
    pub fn remove_vertex(&mut self, vertex: VertexId) {
        if self.removed_vertices.contains(&vertex) {
            return;
        }
        let parent_region = self.vertex(vertex).parent_region;
        self.region_mut(parent_region).vertices.retain(|v| *v != vertex);

        let outgoing = self.vertex(vertex).outgoing.clone();
        for t in outgoing {
            self.remove_transition(t);
        }
        let incoming: Vec<TransitionId> =
            self.transition_ids().filter(|t| self.transition(*t).target == Some(vertex)).collect();
        for t in incoming {
            self.remove_transition(t);
        }

        if let VertexKind::State(state) = &self.vertex(vertex).kind {
            let child_regions = state.child_regions.clone();
            for r in child_regions {
                self.remove_region(r);
            }
        }

        let _ = self.removed_vertices.insert(vertex);
        self.mark_dirty();
    }

    /// Detaches `region` from its owning state (or the state machine root), tombstones it, and
    /// recursively removes every vertex it contains (spec.md §3 Lifecycles). A no-op if already
    /// removed.
    pub fn remove_region(&mut self, region: RegionId) {
        if self.removed_regions.contains(&region) {
            return;
        }
        match self.region(region).parent_state {
            Some(parent) => {
                if let VertexKind::State(state) = &mut self.vertex_mut(parent).kind {
                    state.child_regions.retain(|r| *r != region);
                }
            }
            None => self.root_regions.retain(|r| *r != region),
        }

        let vertices = self.region(region).vertices.clone();
        for v in vertices {
            self.remove_vertex(v);
        }

        let _ = self.removed_regions.insert(region);
        self.mark_dirty();
    }

    /// Borrows a chainable handle onto `state` for attaching entry/exit
    /// behavior. Panics if `state` does not refer to a `State` vertex.
    pub fn state(&mut self, state: VertexId) -> StateHandle<'_, M, D> {
        StateHandle { machine: self, id: state }
    }

    /// Borrows a chainable handle onto `transition` for attaching a guard,
    /// else-marker, or effect.
    pub fn transition(&mut self, transition: TransitionId) -> TransitionHandle<'_, M, D> {
        TransitionHandle { machine: self, id: transition }
    }
}

impl<'a, M, D> StateHandle<'a, M, D> {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn entry(&mut self, action: Action<M, D>) -> &mut Self {
        if let VertexKind::State(state) = &mut self.machine.vertex_mut(self.id).kind {
            state.entry.push(action);
        }
        self.machine.mark_dirty();
        self
    }

    pub fn exit(&mut self, action: Action<M, D>) -> &mut Self {
        if let VertexKind::State(state) = &mut self.machine.vertex_mut(self.id).kind {
            state.exit.push(action);
        }
        self.machine.mark_dirty();
        self
    }
}

impl<'a, M, D> TransitionHandle<'a, M, D> {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn when(&mut self, guard: Guard<M, D>) -> &mut Self {
        self.machine.transition_mut(self.id).guard = Some(guard);
        self.machine.mark_dirty();
        self
    }

    /// Marks this transition as the `else` branch of its source Choice or
    /// Junction pseudo-state: it fires only when every other outgoing
    /// transition's guard returned `false`.
    pub fn else_branch(&mut self) -> &mut Self {
        self.machine.transition_mut(self.id).is_else = true;
        self.machine.mark_dirty();
        self
    }

    pub fn effect(&mut self, action: Action<M, D>) -> &mut Self {
        self.machine.transition_mut(self.id).actions.push(action);
        self.machine.mark_dirty();
        self
    }
}

/*!
A read-only visitor over a compiled (or uncompiled) model, for clients that want to inspect or
render a [`StateMachine`](crate::definition::types::StateMachine) without threading arena
lookups through their own code. Adapted from the teacher's own `visitor` module, which walked an
`Rc`-linked tree of `Region<E>`/`Vertex<E>` and handed every UML attribute (sub-machines,
connection points, deferrable triggers, `do_activity`) to a per-kind callback; this version walks
the arena by id and narrows the callback surface to what this engine's declarative model (§3)
actually carries: regions, states (with their composite/orthogonal/final categorization),
pseudo-states (with their `kind`), and transitions (with their `kind` and endpoints).

Every method has a no-op default, so a visitor only overrides the hooks it cares about.
*/

use crate::definition::types::{PseudoStateKind, RegionId, StateMachine, TransitionId, TransitionKind, VertexId, VertexKind};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Per-kind callbacks invoked during a depth-first walk of a model, region before its vertices,
/// state before its child regions, in declaration order throughout.
#[allow(unused_variables)]
pub trait ModelVisitor<M, D> {
    fn enter_region(&mut self, machine: &StateMachine<M, D>, region: RegionId) {}

    fn exit_region(&mut self, machine: &StateMachine<M, D>, region: RegionId) {}

    /// `state` may be simple, composite, orthogonal or final; inspect it with
    /// [`StateMachine::is_final`] and the vertex's region count if the distinction matters to the
    /// visitor.
    fn enter_state(&mut self, machine: &StateMachine<M, D>, state: VertexId) {}

    fn exit_state(&mut self, machine: &StateMachine<M, D>, state: VertexId) {}

    fn pseudo_state(&mut self, machine: &StateMachine<M, D>, vertex: VertexId, kind: PseudoStateKind) {}

    fn transition(&mut self, machine: &StateMachine<M, D>, transition: TransitionId, kind: TransitionKind) {}
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Walks every root region of `machine`, depth-first, in declaration order.
pub fn visit_state_machine<M, D>(machine: &StateMachine<M, D>, visitor: &mut dyn ModelVisitor<M, D>) {
    for region in machine.root_regions().to_vec() {
        visit_region(machine, region, visitor);
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn visit_region<M, D>(machine: &StateMachine<M, D>, region: RegionId, visitor: &mut dyn ModelVisitor<M, D>) {
    visitor.enter_region(machine, region);
    let vertices = machine.region(region).vertices.clone();
    for vertex in vertices {
        visit_vertex(machine, vertex, visitor);
    }
    visitor.exit_region(machine, region);
}

fn visit_vertex<M, D>(machine: &StateMachine<M, D>, vertex: VertexId, visitor: &mut dyn ModelVisitor<M, D>) {
    match &machine.vertex(vertex).kind {
        VertexKind::State(state) => {
            let child_regions = state.child_regions.clone();
            visitor.enter_state(machine, vertex);
            for region in child_regions {
                visit_region(machine, region, visitor);
            }
            visitor.exit_state(machine, vertex);
        }
        VertexKind::Pseudo(pseudo) => {
            visitor.pseudo_state(machine, vertex, pseudo.kind);
        }
    }

    let outgoing = machine.vertex(vertex).outgoing.clone();
    for transition in outgoing {
        let kind = machine.transition(transition).kind;
        visitor.transition(machine, transition, kind);
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

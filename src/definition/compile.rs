/*!
The compiler (C3). Two depth-first passes turn the declarative model into
flat `Vec<Step>` pipelines so that evaluation (C4) never walks the tree: it
only looks up a vertex, region, or transition by id and runs the opcodes
already computed here.

Pass A assigns `leave`/`beginEnter`/`endEnter`/`enter` to every vertex and
resolves each region's history/default-target bookkeeping. Pass B assigns
`traverse` to every transition, including the least-common-ancestor walk for
External transitions.
*/

use crate::config::EngineConfig;
use crate::definition::types::{
    PseudoStateKind, RegionId, StateMachine, Step, TransitionId, TransitionKind, VertexId, VertexKind,
};
use crate::definition::validate::validate;
use crate::error::Result;

/// Validates, then compiles, `machine`. Returns the same error `validate`
/// would on an invalid model; a compiled model has `is_compiled() == true`.
pub fn compile<M, D>(machine: &mut StateMachine<M, D>, config: &EngineConfig) -> Result<()> {
    validate(machine, config)?;

    for region in machine.root_regions().to_vec() {
        compute_region_history(machine, region, false);
    }

    for vertex in machine.vertex_ids().collect::<Vec<_>>() {
        build_vertex_pipelines(machine, vertex);
    }

    for transition in machine.transition_ids().collect::<Vec<_>>() {
        build_transition_traverse(machine, transition);
    }

    machine.mark_clean();
    Ok(())
}

/// Top-down walk recording, per region, whether any ancestor region's
/// initial-family child is `DeepHistory`, and resolving the region's default
/// (non-history) entry target.
fn compute_region_history<M, D>(machine: &mut StateMachine<M, D>, region: RegionId, deep_history_above: bool) {
    let initial = match machine.region(region).initial {
        Some(v) => v,
        None => return, // unvalidated model; compile() always validates first
    };
    let kind = machine.pseudo_state_kind(initial).expect("initial-family vertex is a pseudo-state");
    let uses_history = kind.is_history();
    let history_is_deep = kind == PseudoStateKind::DeepHistory;
    let default_target = default_target_of(machine, initial);

    {
        let data = machine.region_mut(region);
        data.deep_history_above = deep_history_above;
        data.uses_history = uses_history;
        data.history_is_deep = history_is_deep;
        data.default_target = default_target;
    }

    let cascades = deep_history_above || history_is_deep;
    let vertices = machine.region(region).vertices.clone();
    for vertex in vertices {
        if let VertexKind::State(state) = &machine.vertex(vertex).kind {
            let child_regions = state.child_regions.clone();
            for child in child_regions {
                compute_region_history(machine, child, cascades);
            }
        }
    }
}

/// Resolves the initial-family vertex's default entry transition: the
/// unguarded, non-else outgoing transition, or the first declared one if
/// every candidate carries a guard. Kept as a `TransitionId` (not its
/// target) so a default path routed through a Choice/Junction still runs
/// through the ordinary transition-firing/continuation machinery at
/// evaluation time rather than jumping straight to a precomputed target.
fn default_target_of<M, D>(machine: &StateMachine<M, D>, initial: VertexId) -> Option<TransitionId> {
    let outgoing = &machine.vertex(initial).outgoing;
    outgoing
        .iter()
        .copied()
        .find(|t| {
            let t = machine.transition(*t);
            t.guard.is_none() && !t.is_else
        })
        .or_else(|| outgoing.first().copied())
}

fn build_vertex_pipelines<M, D>(machine: &mut StateMachine<M, D>, vertex: VertexId) {
    let parent_region = machine.vertex(vertex).parent_region;

    let (leave, begin_enter, end_enter) = match &machine.vertex(vertex).kind {
        VertexKind::State(state) => {
            let mut leave = Vec::new();
            for region in state.child_regions.iter().rev() {
                leave.push(Step::LeaveRegionCurrent(*region));
            }
            for action in &state.exit {
                leave.push(Step::UserAction(action.clone()));
            }

            let mut begin_enter = vec![Step::RecordCurrent(parent_region, vertex)];
            for action in &state.entry {
                begin_enter.push(Step::UserAction(action.clone()));
            }

            let mut end_enter = Vec::new();
            for region in &state.child_regions {
                end_enter.push(Step::EnterRegionChild(*region));
            }
            end_enter.push(Step::EvaluateCompletion(vertex));

            (leave, begin_enter, end_enter)
        }
        VertexKind::Pseudo(pseudo) => {
            if pseudo.kind == PseudoStateKind::Terminate {
                (Vec::new(), vec![Step::SetTerminated], Vec::new())
            } else {
                (Vec::new(), Vec::new(), Vec::new())
            }
        }
    };

    let mut enter = begin_enter.clone();
    enter.extend(end_enter.iter().cloned());

    let pipelines = &mut machine.vertex_mut(vertex).pipelines;
    pipelines.leave = leave;
    pipelines.begin_enter = begin_enter;
    pipelines.end_enter = end_enter;
    pipelines.enter = enter;
}

fn build_transition_traverse<M, D>(machine: &mut StateMachine<M, D>, transition: TransitionId) {
    let (source, target, kind) = {
        let t = machine.transition(transition);
        (t.source, t.target, t.kind)
    };

    let target = match target {
        None => {
            // Internal transition: traverse is just the transition's own actions.
            let actions = machine.transition(transition).actions.clone();
            let traverse = actions.into_iter().map(Step::UserAction).collect();
            let t = machine.transition_mut(transition);
            t.traverse = traverse;
            t.continuation = false;
            return;
        }
        Some(target) => target,
    };

    let actions = machine.transition(transition).actions.clone();
    let mut steps = Vec::new();

    match kind {
        TransitionKind::Internal => {
            steps.extend(actions.into_iter().map(Step::UserAction));
        }
        TransitionKind::External => {
            let lca = machine.lca_region(source, target);
            let a_s_chain = machine.vertex_chain_to_boundary(source, lca);
            let a_s = *a_s_chain.last().expect("chain always has at least the start");
            steps.push(Step::InvokeLeave(a_s));
            steps.extend(actions.into_iter().map(Step::UserAction));

            let mut enter_chain = machine.vertex_chain_to_boundary(target, lca);
            enter_chain.reverse(); // [A_V, ..., target]
            for ancestor in &enter_chain[..enter_chain.len() - 1] {
                steps.push(Step::InvokeBeginEnter(*ancestor));
            }
            steps.push(Step::InvokeEnter(target));
        }
        TransitionKind::Local => {
            let region = machine
                .region_ancestors(target)
                .into_iter()
                .find(|r| machine.region(*r).parent_state == Some(source))
                .unwrap_or_else(|| machine.vertex(target).parent_region);
            steps.push(Step::LeaveRegionCurrent(region));
            steps.extend(actions.into_iter().map(Step::UserAction));

            let mut enter_chain = machine.vertex_chain_to_boundary(target, Some(region));
            enter_chain.reverse();
            for ancestor in &enter_chain[..enter_chain.len() - 1] {
                steps.push(Step::InvokeBeginEnter(*ancestor));
            }
            steps.push(Step::InvokeEnter(target));
        }
    }

    let continuation = matches!(machine.pseudo_state_kind(target), Some(k) if k != PseudoStateKind::Terminate);

    let t = machine.transition_mut(transition);
    t.traverse = steps;
    t.continuation = continuation;
}

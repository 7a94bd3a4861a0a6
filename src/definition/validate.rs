/*!
The validator (C2). Walks the declarative model built by `definition::builder`
and reports every problem it finds through the configured `Log`, exactly the
checks the teacher's own `StateMachine::validate`/`State::validate`/
`Transition::validate` perform, generalized to regions and pseudo-states.
*/

use crate::config::EngineConfig;
use crate::definition::types::{PseudoStateKind, StateMachine, VertexKind};
use crate::error::{ErrorKind, Result};

/// Validates `machine`, logging every diagnostic found (errors and
/// warnings) through `config.log`, and records each region's resolved
/// initial-family vertex as a side effect of checking it is unique.
///
/// Returns `Err(ErrorKind::ModelInvalid)` if any diagnostic was an error.
pub fn validate<M, D>(machine: &mut StateMachine<M, D>, config: &EngineConfig) -> Result<()> {
    let mut errors = 0usize;

    if machine.vertices.is_empty() {
        config.log.error(&ErrorKind::ChartStatesEmpty.to_string());
        errors += 1;
    }

    if !machine.vertex_ids().any(|v| machine.is_final(v)) {
        config.log.warn(&ErrorKind::ChartNoFinalState.to_string());
    }

    for region in machine.region_ids().collect::<Vec<_>>() {
        errors += validate_region(machine, region, config);
    }

    for vertex in machine.vertex_ids().collect::<Vec<_>>() {
        errors += validate_vertex(machine, vertex, config);
    }

    for transition in machine.transition_ids().collect::<Vec<_>>() {
        errors += validate_transition(machine, transition, config);
    }

    if errors == 0 {
        Ok(())
    } else {
        Err(ErrorKind::ModelInvalid(errors).into())
    }
}

fn validate_region<M, D>(
    machine: &mut StateMachine<M, D>,
    region: crate::definition::types::RegionId,
    config: &EngineConfig,
) -> usize {
    let name = machine.region(region).name.clone();

    if machine.region(region).vertices.is_empty() {
        config.log.error(&ErrorKind::RegionVerticesEmpty(name).to_string());
        return 1;
    }

    let initial_candidates: Vec<_> = machine
        .region(region)
        .vertices
        .iter()
        .copied()
        .filter(|v| matches!(machine.pseudo_state_kind(*v), Some(k) if k.is_initial_family()))
        .collect();

    match initial_candidates.len() {
        0 => {
            config.log.error(&ErrorKind::RegionMissingInitial(name).to_string());
            1
        }
        1 => {
            machine.region_mut(region).initial = Some(initial_candidates[0]);
            0
        }
        _ => {
            config.log.error(&ErrorKind::RegionMultipleInitial(name).to_string());
            1
        }
    }
}

fn validate_vertex<M, D>(
    machine: &StateMachine<M, D>,
    vertex: crate::definition::types::VertexId,
    config: &EngineConfig,
) -> usize {
    let name = machine.vertex(vertex).name.clone();
    let mut errors = 0;

    match &machine.vertex(vertex).kind {
        VertexKind::State(state) => {
            if state.is_final && !machine.vertex(vertex).outgoing.is_empty() {
                config.log.error(&ErrorKind::FinalStateHasOutgoing(name).to_string());
                errors += 1;
            }
        }
        VertexKind::Pseudo(pseudo) => match pseudo.kind {
            PseudoStateKind::Terminate => {
                if !machine.vertex(vertex).outgoing.is_empty() {
                    config.log.error(&ErrorKind::TerminateHasOutgoing(name).to_string());
                    errors += 1;
                }
            }
            PseudoStateKind::Initial => {
                if machine.vertex(vertex).outgoing.is_empty() {
                    config.log.error(&ErrorKind::PseudoStateNoOutgoing(name).to_string());
                    errors += 1;
                }
            }
            PseudoStateKind::Choice | PseudoStateKind::Junction => {
                let outgoing = &machine.vertex(vertex).outgoing;
                if outgoing.is_empty() {
                    config.log.error(&ErrorKind::PseudoStateNoOutgoing(name).to_string());
                    errors += 1;
                } else {
                    let has_else = outgoing.iter().any(|t| machine.transition(*t).is_else);
                    let guarded = outgoing.iter().filter(|t| machine.transition(**t).guard.is_some()).count();
                    if !has_else && guarded < 2 {
                        config.log.warn(&ErrorKind::ChoiceJunctionDeadEnd(name).to_string());
                    }
                }
            }
            PseudoStateKind::ShallowHistory | PseudoStateKind::DeepHistory => {
                let defaults = machine
                    .vertex(vertex)
                    .outgoing
                    .iter()
                    .filter(|t| {
                        let t = machine.transition(**t);
                        t.guard.is_none() && !t.is_else
                    })
                    .count();
                if defaults != 1 {
                    config.log.error(&ErrorKind::HistoryNoDefaultTarget(name).to_string());
                    errors += 1;
                }
            }
        },
    }

    errors
}

fn validate_transition<M, D>(
    machine: &StateMachine<M, D>,
    transition: crate::definition::types::TransitionId,
    config: &EngineConfig,
) -> usize {
    let mut errors = 0;
    let t = machine.transition(transition);
    let name = t.name.clone();

    // A `Local` transition's target is guaranteed to be a descendant of its source: the
    // builder normalizes any mismatched `Local` request to `External` at construction
    // (spec.md §3 invariant 4), so there is nothing left to check for that case here.
    if let Some(target) = t.target {
        if target.index() >= machine.vertices.len() {
            config.log.error(&ErrorKind::TransitionDanglingEndpoint(name).to_string());
            return 1;
        }
    }

    if t.is_else {
        let is_pseudo_branch = matches!(
            machine.pseudo_state_kind(t.source),
            Some(PseudoStateKind::Choice) | Some(PseudoStateKind::Junction)
        );
        if !is_pseudo_branch {
            config
                .log
                .error(&ErrorKind::ElseOnNonPseudoState(machine.vertex_name(t.source)).to_string());
            errors += 1;
        }
    }

    errors
}

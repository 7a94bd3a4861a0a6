/*!
The evaluator (C4). Given a compiled model, an [`Instance`](crate::instance::Instance) and a
[`Message`], selects and fires a transition from the deepest active configuration outward,
chains through Choice/Junction pseudo-states, and re-evaluates completion transitions as vertices
become complete. Mirrors the free-function style of `definition::compile`: there is no `Machine`
object to construct, only `initialise`/`evaluate` taking the model and a config by reference.

Pipelines precomputed by the compiler reduce this module to table lookups and closure calls; the
only tree-shaped reasoning left at evaluation time is transition *selection* (guards, Choice/
Junction, completion), since that depends on the live message and the live instance.
*/

use crate::config::EngineConfig;
use crate::definition::compile;
use crate::definition::types::{
    PseudoStateKind, RegionId, Step, StateMachine, TransitionId, VertexId, VertexKind,
};
use crate::error::{ErrorKind, Result};
use crate::instance::Instance;
use crate::message::Message;

pub mod instance;

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Auto-compiles `machine` if it is dirty, then, if `instance` is given, enters the initial
/// configuration (every root region's initial-family default path). Passing `None` just compiles.
pub fn initialise<M, D>(
    machine: &mut StateMachine<M, D>,
    config: &EngineConfig,
    instance: Option<&mut dyn Instance<D>>,
) -> Result<()> {
    if !machine.is_compiled() {
        compile::compile(machine, config)?;
    }
    if let Some(instance) = instance {
        let machine: &StateMachine<M, D> = machine;
        for region in machine.root_regions().to_vec() {
            enter_region_child(machine, config, region, &Message::Completion, instance);
        }
    }
    Ok(())
}

/// Auto-compiles `machine` if it is dirty. Returns `false` without doing anything if `instance`
/// has already terminated. Otherwise attempts to consume `message` starting at the root regions
/// and descending into whichever child region is current, trying the deepest active vertex's own
/// transitions only after all of its child regions declined the message. Returns whether some
/// transition actually fired.
pub fn evaluate<M, D>(
    machine: &mut StateMachine<M, D>,
    config: &EngineConfig,
    instance: &mut dyn Instance<D>,
    message: &Message<M>,
) -> Result<bool> {
    if !machine.is_compiled() {
        compile::compile(machine, config)?;
    }
    if instance.is_terminated() {
        return Ok(false);
    }
    let machine: &StateMachine<M, D> = machine;
    let mut consumed = false;
    for region in machine.root_regions().to_vec() {
        if try_consume_region(machine, config, region, message, instance) {
            consumed = true;
            break;
        }
    }
    Ok(consumed)
}

// ------------------------------------------------------------------------------------------------
// Private Functions: selection (spec.md §4.3)
// ------------------------------------------------------------------------------------------------

fn try_consume_region<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    region: RegionId,
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
) -> bool {
    match instance.get_current(region) {
        Some(current) => try_consume_vertex(machine, config, current, msg, instance),
        None => false,
    }
}

/// Selection at a `State`: inner regions before outer transitions (spec.md §5 ordering
/// guarantee (b)), first-match declaration order among the state's own outgoing transitions.
fn try_consume_vertex<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    vertex: VertexId,
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
) -> bool {
    let child_regions = match &machine.vertex(vertex).kind {
        VertexKind::State(state) => state.child_regions.clone(),
        VertexKind::Pseudo(_) => return false,
    };

    for region in child_regions {
        if try_consume_region(machine, config, region, msg, instance) {
            return true;
        }
    }

    match first_matching_outgoing(machine, vertex, msg, instance) {
        Some(t_id) => {
            fire_transition_effects(machine, config, t_id, msg, instance);
            true
        }
        None => false,
    }
}

/// Selection at a pseudo-state reached as a transition's continuation target (spec.md §4.2/§4.3):
/// Initial/History resolve their single outgoing transition (recorded at compile time for the
/// region-owning case, recomputed here for a transition that targets one directly); Choice/
/// Junction evaluate guards against the live message since they cannot be precomputed.
fn select_and_chain<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    vertex: VertexId,
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
) {
    match machine.pseudo_state_kind(vertex) {
        Some(PseudoStateKind::Choice) => {
            let candidates = guarded_candidates(machine, vertex, msg, instance);
            if !candidates.is_empty() {
                let index = config.random.random(candidates.len() as u32) as usize;
                fire_transition_effects(machine, config, candidates[index], msg, instance);
            } else if let Some(else_t) = find_else(machine, vertex) {
                fire_transition_effects(machine, config, else_t, msg, instance);
            } else {
                config
                    .log
                    .error(&ErrorKind::NoTransitionSelected(machine.vertex_name(vertex)).to_string());
            }
        }
        Some(PseudoStateKind::Junction) => {
            let candidates = guarded_candidates(machine, vertex, msg, instance);
            match candidates.len() {
                1 => fire_transition_effects(machine, config, candidates[0], msg, instance),
                0 => {
                    if let Some(else_t) = find_else(machine, vertex) {
                        fire_transition_effects(machine, config, else_t, msg, instance);
                    } else {
                        config
                            .log
                            .error(&ErrorKind::NoTransitionSelected(machine.vertex_name(vertex)).to_string());
                    }
                }
                _ => {
                    config
                        .log
                        .error(&ErrorKind::JunctionAmbiguous(machine.vertex_name(vertex)).to_string());
                }
            }
        }
        Some(PseudoStateKind::Initial) | Some(PseudoStateKind::ShallowHistory) | Some(PseudoStateKind::DeepHistory) => {
            if let Some(t_id) = machine.vertex(vertex).outgoing.first().copied() {
                fire_transition_effects(machine, config, t_id, msg, instance);
            }
        }
        Some(PseudoStateKind::Terminate) | None => {
            // Terminate already set the terminated flag on entry; nothing further to select.
            // `None` (a State target) cannot happen: compile() only sets `continuation` when
            // the target is a non-Terminate pseudo-state.
        }
    }
}

fn guarded_candidates<M, D>(
    machine: &StateMachine<M, D>,
    vertex: VertexId,
    msg: &Message<M>,
    instance: &dyn Instance<D>,
) -> Vec<TransitionId> {
    machine
        .vertex(vertex)
        .outgoing
        .iter()
        .copied()
        .filter(|t_id| {
            let t = machine.transition(*t_id);
            !t.is_else && t.guard.as_ref().map_or(true, |g| g(msg, instance))
        })
        .collect()
}

fn find_else<M, D>(machine: &StateMachine<M, D>, vertex: VertexId) -> Option<TransitionId> {
    machine
        .vertex(vertex)
        .outgoing
        .iter()
        .copied()
        .find(|t_id| machine.transition(*t_id).is_else)
}

fn first_matching_outgoing<M, D>(
    machine: &StateMachine<M, D>,
    vertex: VertexId,
    msg: &Message<M>,
    instance: &dyn Instance<D>,
) -> Option<TransitionId> {
    machine.vertex(vertex).outgoing.iter().copied().find(|t_id| {
        let t = machine.transition(*t_id);
        !t.is_else && t.guard.as_ref().map_or(true, |g| g(msg, instance))
    })
}

// ------------------------------------------------------------------------------------------------
// Private Functions: execution (spec.md §4.2 Pass B / §4.3 Execution)
// ------------------------------------------------------------------------------------------------

/// Runs a transition's precompiled `traverse`, then either chains into continuation selection
/// (target is a non-Terminate pseudo-state) or, for an internal transition whose target is
/// `None`, optionally re-evaluates completion transitions from its source (spec.md §4.2).
/// Completion evaluation for an ordinary (non-internal) firing is driven by the
/// `Step::EvaluateCompletion` step at the tail of each entered vertex's `enter` pipeline (see
/// `run_step`, `compile::build_vertex_pipelines`), which only runs once that vertex's entry
/// actions and any child region entries are done, so it is not repeated here.
fn fire_transition_effects<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    transition: TransitionId,
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
) {
    let (target, continuation, source) = {
        let t = machine.transition(transition);
        (t.target, t.continuation, t.source)
    };

    run_steps(machine, config, &machine.transition(transition).traverse, msg, instance, false);

    match target {
        None => {
            if config.internal_transitions_trigger_completion {
                evaluate_completion(machine, config, source, instance);
            }
        }
        Some(target) => {
            if continuation {
                select_and_chain(machine, config, target, msg, instance);
            }
        }
    }
}

fn run_steps<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    steps: &[Step<M, D>],
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
    deep_history: bool,
) {
    for step in steps {
        run_step(machine, config, step, msg, instance, deep_history);
    }
}

fn run_step<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    step: &Step<M, D>,
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
    deep_history: bool,
) {
    match step {
        Step::UserAction(action) => action(msg, instance, deep_history),
        Step::InvokeLeave(v) => run_steps(machine, config, &machine.vertex(*v).pipelines.leave, msg, instance, deep_history),
        Step::InvokeBeginEnter(v) => {
            run_steps(machine, config, &machine.vertex(*v).pipelines.begin_enter, msg, instance, deep_history)
        }
        Step::InvokeEnter(v) => run_steps(machine, config, &machine.vertex(*v).pipelines.enter, msg, instance, deep_history),
        Step::LeaveRegionCurrent(r) => {
            if let Some(current) = instance.get_current(*r) {
                run_steps(machine, config, &machine.vertex(current).pipelines.leave, msg, instance, deep_history);
            }
        }
        Step::EnterRegionChild(r) => enter_region_child(machine, config, *r, msg, instance),
        Step::RecordCurrent(r, v) => instance.set_current(*r, *v),
        Step::EvaluateCompletion(v) => evaluate_completion(machine, config, *v, instance),
        Step::SetTerminated => instance.set_terminated(true),
    }
}

/// A region's `endEnter` (spec.md §4.2): restore from history if this region (or an ancestor
/// region's initial-family child) uses history and the instance has a recorded vertex, cascading
/// the deep-history flag to the restored vertex's own descent; otherwise fire the region's
/// resolved default-target transition.
fn enter_region_child<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    region: RegionId,
    msg: &Message<M>,
    instance: &mut dyn Instance<D>,
) {
    let (use_history, default_target) = {
        let data = machine.region(region);
        (data.uses_history || data.deep_history_above, data.default_target)
    };

    if use_history {
        if let Some(recorded) = instance.get_current(region) {
            run_steps(machine, config, &machine.vertex(recorded).pipelines.enter, msg, instance, true);
            return;
        }
    }

    if let Some(t_id) = default_target {
        fire_transition_effects(machine, config, t_id, msg, instance);
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions: completion evaluation (spec.md §4.3 point 3)
// ------------------------------------------------------------------------------------------------

/// A vertex is complete when it has no child regions (a simple or final state, trivially), or
/// when every one of its child regions' current vertex is itself a final state.
fn is_complete<M, D>(machine: &StateMachine<M, D>, vertex: VertexId, instance: &dyn Instance<D>) -> bool {
    match &machine.vertex(vertex).kind {
        VertexKind::State(state) => state
            .child_regions
            .iter()
            .all(|r| matches!(instance.get_current(*r), Some(current) if machine.is_final(current))),
        VertexKind::Pseudo(_) => false,
    }
}

/// Climbs from `vertex` toward the state machine root: fires `vertex`'s own completion
/// transition if it is complete and one is ready; otherwise, if `vertex` is itself a final
/// state, continues the check at the state owning its region (a final child may be exactly what
/// makes that ancestor complete, spec.md §8 orthogonal-completion scenario). Stops as soon as a
/// transition fires (the freshly entered vertex re-triggers this same check via its own
/// `Step::EvaluateCompletion`) or no further ancestor can possibly be completed by this entry.
fn evaluate_completion<M, D>(
    machine: &StateMachine<M, D>,
    config: &EngineConfig,
    vertex: VertexId,
    instance: &mut dyn Instance<D>,
) {
    let mut current = vertex;
    loop {
        if is_complete(machine, current, instance) {
            if let Some(t_id) = first_matching_outgoing(machine, current, &Message::Completion, instance) {
                fire_transition_effects(machine, config, t_id, &Message::Completion, instance);
                return;
            }
        }
        if !machine.is_final(current) {
            return;
        }
        let region = machine.vertex(current).parent_region;
        match machine.region(region).parent_state {
            Some(parent) => current = parent,
            None => return,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StubRandom;
    use crate::definition::types::TransitionKind;
    use crate::execution::instance::HashMapInstance;
    use std::sync::{Arc, Mutex};

    fn tracker() -> (Arc<Mutex<Vec<String>>>, impl Fn(Arc<Mutex<Vec<String>>>, &str) -> crate::definition::types::Action<(), ()>) {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let make = |log: Arc<Mutex<Vec<String>>>, tag: &str| -> crate::definition::types::Action<(), ()> {
            let tag = tag.to_string();
            Arc::new(move |_msg, _inst: &mut dyn Instance<()>, _dh| {
                log.lock().unwrap().push(tag.clone());
            })
        };
        (log, make)
    }

    // Scenario 1: simple transition, A -[go]-> B.
    #[test]
    fn simple_transition_fires_entry_and_exit_in_order() {
        let (log, make) = tracker();
        let mut m: StateMachine<&str, ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let a = m.add_state("a", r0);
        let b = m.add_state("b", r0);
        m.state(a).exit(make(log.clone(), "exit-a"));
        m.state(b).entry(make(log.clone(), "entry-b"));
        m.add_transition("init", initial, Some(a), TransitionKind::External);
        let go = m.add_transition("go", a, Some(b), TransitionKind::External);
        m.transition(go).when(Arc::new(|msg: &Message<&str>, _inst: &dyn Instance<()>| msg.event() == Some(&"go")));

        let config = EngineConfig::default();
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        assert_eq!(instance.get_current(r0), Some(a));

        let consumed = evaluate(&mut m, &config, &mut instance, &Message::Event("go")).unwrap();
        assert!(consumed);
        assert_eq!(instance.get_current(r0), Some(b));
        assert_eq!(*log.lock().unwrap(), vec!["exit-a".to_string(), "entry-b".to_string()]);
    }

    // Scenario 2: guarded junction with an else branch.
    #[test]
    fn junction_picks_the_matching_guarded_branch_or_else() {
        let mut m: StateMachine<(), i32> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let junction = m.add_pseudo_state("j", r0, PseudoStateKind::Junction);
        let p = m.add_state("p", r0);
        let n = m.add_state("n", r0);
        let z = m.add_state("z", r0);
        m.add_transition("init", initial, Some(junction), TransitionKind::External);
        let to_p = m.add_transition("pos", junction, Some(p), TransitionKind::External);
        m.transition(to_p).when(Arc::new(|_msg, inst: &dyn Instance<i32>| *inst.data() > 0));
        let to_n = m.add_transition("neg", junction, Some(n), TransitionKind::External);
        m.transition(to_n).when(Arc::new(|_msg, inst: &dyn Instance<i32>| *inst.data() < 0));
        let to_z = m.add_transition("zero", junction, Some(z), TransitionKind::External);
        m.transition(to_z).else_branch();

        let config = EngineConfig::default();

        let mut instance: HashMapInstance<i32> = HashMapInstance::new(5);
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        assert_eq!(instance.get_current(r0), Some(p));

        let mut instance: HashMapInstance<i32> = HashMapInstance::new(0);
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        assert_eq!(instance.get_current(r0), Some(z));
    }

    // Scenario 3: a choice with two always-true guards and a stubbed random picks declaration order.
    #[test]
    fn choice_with_stubbed_random_picks_first_enabled() {
        let mut m: StateMachine<(), ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let choice = m.add_pseudo_state("c", r0, PseudoStateKind::Choice);
        let g1 = m.add_state("g1", r0);
        let g2 = m.add_state("g2", r0);
        m.add_transition("init", initial, Some(choice), TransitionKind::External);
        let t1 = m.add_transition("to-g1", choice, Some(g1), TransitionKind::External);
        m.transition(t1).when(Arc::new(|_msg, _inst: &dyn Instance<()>| true));
        let t2 = m.add_transition("to-g2", choice, Some(g2), TransitionKind::External);
        m.transition(t2).when(Arc::new(|_msg, _inst: &dyn Instance<()>| true));

        let config = EngineConfig::default().with_random(Arc::new(StubRandom(0)));
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        assert_eq!(instance.get_current(r0), Some(g1));
    }

    // Scenario 4: deep history restores the exact nested configuration.
    #[test]
    fn deep_history_restores_nested_configuration() {
        let mut m: StateMachine<&str, ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let t = m.add_state("t", r0);
        let outside = m.add_state("outside", r0);
        m.add_transition("init", initial, Some(t), TransitionKind::External);
        let leave_t = m.add_transition("leave", t, Some(outside), TransitionKind::External);
        m.transition(leave_t).when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"leave")));
        let re_enter = m.add_transition("re-enter", outside, Some(t), TransitionKind::External);
        m.transition(re_enter)
            .when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"enter")));

        let r = m.add_region("r", Some(t));
        let deep_history = m.add_pseudo_state("dh", r, PseudoStateKind::DeepHistory);
        let u = m.add_state("u", r);
        m.add_transition("dh-default", deep_history, Some(u), TransitionKind::External);

        let ru = m.add_region("ru", Some(u));
        let u_initial = m.add_pseudo_state("u-initial", ru, PseudoStateKind::Initial);
        let v = m.add_state("v", ru);
        m.add_transition("u-init", u_initial, Some(v), TransitionKind::External);

        let config = EngineConfig::default();
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        assert_eq!(instance.get_current(r0), Some(t));
        assert_eq!(instance.get_current(r), Some(u));
        assert_eq!(instance.get_current(ru), Some(v));

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("leave")).unwrap());
        assert_eq!(instance.get_current(r0), Some(outside));

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("enter")).unwrap());
        assert_eq!(instance.get_current(r0), Some(t));
        assert_eq!(instance.get_current(r), Some(u));
        assert_eq!(instance.get_current(ru), Some(v));
    }

    // Scenario 5: orthogonal completion only fires once both regions have reached final.
    #[test]
    fn orthogonal_completion_waits_for_every_region() {
        let mut m: StateMachine<&str, ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let root_initial = m.add_pseudo_state("root-initial", r0, PseudoStateKind::Initial);
        let o = m.add_state("o", r0);
        let f = m.add_state("f", r0);
        m.add_transition("root-init", root_initial, Some(o), TransitionKind::External);
        let complete = m.add_transition("complete", o, Some(f), TransitionKind::External);
        m.transition(complete).when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.is_completion()));

        let r1 = m.add_region("r1", Some(o));
        let r1_initial = m.add_pseudo_state("r1-initial", r1, PseudoStateKind::Initial);
        let l1 = m.add_state("l1", r1);
        let fin1 = m.add_final_state("fin1", r1);
        m.add_transition("r1-init", r1_initial, Some(l1), TransitionKind::External);
        let a1 = m.add_transition("a", l1, Some(fin1), TransitionKind::External);
        m.transition(a1).when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"a")));

        let r2 = m.add_region("r2", Some(o));
        let r2_initial = m.add_pseudo_state("r2-initial", r2, PseudoStateKind::Initial);
        let l2 = m.add_state("l2", r2);
        let fin2 = m.add_final_state("fin2", r2);
        m.add_transition("r2-init", r2_initial, Some(l2), TransitionKind::External);
        let b2 = m.add_transition("b", l2, Some(fin2), TransitionKind::External);
        m.transition(b2).when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"b")));

        let config = EngineConfig::default();
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        assert_eq!(instance.get_current(r0), Some(o));

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("a")).unwrap());
        assert_eq!(instance.get_current(r1), Some(fin1));
        // o is not complete yet: r2 hasn't reached final.
        assert_eq!(instance.get_current(r0), Some(o));

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("b")).unwrap());
        assert_eq!(instance.get_current(r2), Some(fin2));
        // both regions final now: o's completion transition should have fired.
        assert_eq!(instance.get_current(r0), Some(f));
    }

    // Scenario 6: internal vs local vs external transitions around a composite S containing C.
    #[test]
    fn internal_local_and_external_transitions_differ_in_scope() {
        let (log, make) = tracker();
        let mut m: StateMachine<&str, ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let root_initial = m.add_pseudo_state("root-initial", r0, PseudoStateKind::Initial);
        let s = m.add_state("s", r0);
        m.state(s).entry(make(log.clone(), "entry-s")).exit(make(log.clone(), "exit-s"));
        m.add_transition("root-init", root_initial, Some(s), TransitionKind::External);

        let rs = m.add_region("rs", Some(s));
        let s_initial = m.add_pseudo_state("s-initial", rs, PseudoStateKind::Initial);
        let c = m.add_state("c", rs);
        m.state(c).entry(make(log.clone(), "entry-c")).exit(make(log.clone(), "exit-c"));
        m.add_transition("s-init", s_initial, Some(c), TransitionKind::External);

        let internal = m.add_transition("internal", s, None, TransitionKind::Internal);
        m.transition(internal)
            .when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"internal")))
            .effect(make(log.clone(), "internal-effect"));

        let local = m.add_transition("local", s, Some(c), TransitionKind::Local);
        m.transition(local).when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"local")));

        let config = EngineConfig::default();
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        log.lock().unwrap().clear();

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("internal")).unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["internal-effect".to_string()]);
        log.lock().unwrap().clear();

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("local")).unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["exit-c".to_string(), "entry-c".to_string()]);
        assert_eq!(instance.get_current(r0), Some(s));
        log.lock().unwrap().clear();

        let external = m.add_transition("external", s, Some(c), TransitionKind::External);
        m.transition(external)
            .when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"external")));
        compile::compile(&mut m, &config).unwrap();

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("external")).unwrap());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["exit-c".to_string(), "exit-s".to_string(), "entry-s".to_string(), "entry-c".to_string()]
        );
    }

    // Terminate: once entered, every later evaluate is a silent no-op.
    #[test]
    fn terminate_short_circuits_all_later_evaluation() {
        let mut m: StateMachine<&str, ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let a = m.add_state("a", r0);
        let terminate = m.add_pseudo_state("x", r0, PseudoStateKind::Terminate);
        m.add_transition("init", initial, Some(a), TransitionKind::External);
        let die = m.add_transition("die", a, Some(terminate), TransitionKind::External);
        m.transition(die).when(Arc::new(|msg: &Message<&str>, _i: &dyn Instance<()>| msg.event() == Some(&"die")));

        let config = EngineConfig::default();
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();

        assert!(evaluate(&mut m, &config, &mut instance, &Message::Event("die")).unwrap());
        assert!(instance.is_terminated());
        assert!(!evaluate(&mut m, &config, &mut instance, &Message::Event("die")).unwrap());
    }

    // Universal invariant (spec.md §8): initialising and then evaluating nothing leaves the
    // configuration exactly as initialise alone produced it.
    #[test]
    fn initialise_with_no_events_is_stable() {
        let mut m: StateMachine<&str, ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let a = m.add_state("a", r0);
        let b = m.add_state("b", r0);
        m.add_transition("init", initial, Some(a), TransitionKind::External);
        let go = m.add_transition("go", a, Some(b), TransitionKind::External);
        m.transition(go).when(Arc::new(|msg: &Message<&str>, _inst: &dyn Instance<()>| msg.event() == Some(&"go")));

        let config = EngineConfig::default();
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        initialise(&mut m, &config, Some(&mut instance)).unwrap();
        let after_init = instance.get_current(r0);

        let consumed = evaluate(&mut m, &config, &mut instance, &Message::Event("unrelated")).unwrap();
        assert!(!consumed);
        assert_eq!(instance.get_current(r0), after_init);
    }

    #[test]
    fn compile_is_idempotent() {
        let mut m: StateMachine<(), ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let initial = m.add_pseudo_state("initial", r0, PseudoStateKind::Initial);
        let a = m.add_state("a", r0);
        m.add_transition("init", initial, Some(a), TransitionKind::External);

        let config = EngineConfig::default();
        initialise(&mut m, &config, None).unwrap();
        assert!(m.is_compiled());
        initialise(&mut m, &config, None).unwrap();
        assert!(m.is_compiled());
    }
}

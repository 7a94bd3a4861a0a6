/*!
A hierarchical, orthogonal UML-style state machine engine.

The goal is to not just provide another state machine crate but to do so with a formal
specification that describes the construction and execution semantics. This implementation
is based upon the [2.5.1](https://www.omg.org/spec/UML/2.5.1/PDF) version of the Unified
Modeling Language, dated 5th December 2017, §14.2 **State Machines**.

A model (`definition::StateMachine`) is assembled programmatically from regions, states,
pseudo-states and transitions (`definition::builder`). Once assembled it is validated and
compiled (`definition::validate`, `definition::compile`) into flat, precomputed action
pipelines; one or more independent instances (`instance::Instance`) then have messages
evaluated against that shared, read-only model (`execution`), each instance owning nothing
but its own active-configuration bookkeeping.

# Example

```
use hfsm_engine::config::EngineConfig;
use hfsm_engine::definition::types::{PseudoStateKind, StateMachine, TransitionKind};
use hfsm_engine::execution::instance::HashMapInstance;
use hfsm_engine::execution::{evaluate, initialise};
use hfsm_engine::message::Message;

let mut machine: StateMachine<&str, ()> = StateMachine::new("turnstile");
let region = machine.add_region("default", None);
let initial = machine.add_pseudo_state("initial", region, PseudoStateKind::Initial);
let locked = machine.add_state("locked", region);
let unlocked = machine.add_state("unlocked", region);
machine.add_transition("init", initial, Some(locked), TransitionKind::External);
let coin = machine.add_transition("coin", locked, Some(unlocked), TransitionKind::External);
machine
    .transition(coin)
    .when(std::sync::Arc::new(|m: &Message<&str>, _i: &dyn hfsm_engine::instance::Instance<()>| {
        m.event() == Some(&"coin")
    }));

let config = EngineConfig::default();
let mut instance: HashMapInstance<()> = HashMapInstance::new(());
initialise(&mut machine, &config, Some(&mut instance)).unwrap();
assert!(evaluate(&mut machine, &config, &mut instance, &Message::Event("coin")).unwrap());
```

# See Also

* [OMG Unified Modeling Language, Version 2.5.1](https://www.omg.org/spec/UML/2.5.1/PDF)
* [State Diagram (Wikipedia)](https://en.wikipedia.org/wiki/State_diagram)
* [UML State Machine (Wikipedia)](https://en.wikipedia.org/wiki/UML_state_machine)
* [StateMachines: A Visual Formalism for Complex Systems](https://www.inf.ed.ac.uk/teaching/courses/seoc/2005_2006/resources/StateMachines.pdf)

*/

#![warn(
    // ---------- Stylistic
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    // ---------- Public
    // missing_debug_implementations,
    // missing_docs,
    unreachable_pub,
    // ---------- Unsafe
    unsafe_code,
    // ---------- Unused
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
)]

#[macro_use]
extern crate error_chain;

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod error;

pub mod config;

pub mod id;

pub mod message;

pub mod instance;

pub mod definition;

pub mod execution;

pub mod visitor;

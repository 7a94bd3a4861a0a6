/*!
The declarative model: an arena-backed `StateMachine` of regions, vertices
and transitions (`types`), a fluent construction surface over it
(`builder`), a static validator (`validate`), and the two-pass compiler that
turns a validated model into flat action pipelines (`compile`).
*/

pub mod builder;
pub mod compile;
pub mod types;
pub mod validate;

pub use types::{
    Action, Guard, PseudoStateKind, RegionId, StateMachine, TransitionId, TransitionKind, VertexId,
};

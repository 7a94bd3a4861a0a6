/*!
The default `Instance` implementation (C5): a plain `HashMap` tracking which
vertex is current in each region that has ever been entered, generalized
from the teacher's `StateMachineInstance::active: HashSet<StateID>` (one flat
set of active leaf states) to a per-region map, since an orthogonal region's
last-recorded occupant is exactly the bookkeeping History restoration needs.
*/

use crate::definition::types::{RegionId, VertexId};
use crate::instance::Instance;
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// A ready-to-use `Instance<D>` backed by an in-memory `HashMap`. Good enough
/// for a single running instance kept in process memory; a host that needs
/// to persist or replicate instance state implements `Instance<D>` itself
/// against whatever store it already has.
#[derive(Debug)]
pub struct HashMapInstance<D> {
    current: HashMap<RegionId, VertexId>,
    terminated: bool,
    data: D,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl<D> HashMapInstance<D> {
    pub fn new(data: D) -> Self {
        Self {
            current: HashMap::new(),
            terminated: false,
            data,
        }
    }

    /// Unwraps the instance, giving back the host data it was carrying.
    pub fn into_data(self) -> D {
        self.data
    }
}

impl<D> Instance<D> for HashMapInstance<D> {
    fn set_current(&mut self, region: RegionId, vertex: VertexId) {
        let _ = self.current.insert(region, vertex);
    }

    fn get_current(&self, region: RegionId) -> Option<VertexId> {
        self.current.get(&region).copied()
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn set_terminated(&mut self, value: bool) {
        self.terminated = value;
    }

    fn data(&self) -> &D {
        &self.data
    }

    fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::types::StateMachine;

    #[test]
    fn fresh_instance_has_no_recorded_vertices() {
        let mut m: StateMachine<(), ()> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let instance: HashMapInstance<()> = HashMapInstance::new(());
        assert_eq!(instance.get_current(r0), None);
        assert!(!instance.is_terminated());
    }

    #[test]
    fn set_and_get_current_round_trips() {
        let mut instance: HashMapInstance<u32> = HashMapInstance::new(0);
        let mut m: StateMachine<(), u32> = StateMachine::new("m");
        let r0 = m.add_region("default", None);
        let s1 = m.add_state("s1", r0);
        instance.set_current(r0, s1);
        assert_eq!(instance.get_current(r0), Some(s1));
        *instance.data_mut() += 1;
        assert_eq!(*instance.data(), 1);
    }

    #[test]
    fn terminated_flag_is_settable() {
        let mut instance: HashMapInstance<()> = HashMapInstance::new(());
        instance.set_terminated(true);
        assert!(instance.is_terminated());
    }
}

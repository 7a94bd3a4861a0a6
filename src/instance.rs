/*!
The pluggable instance store (C5): everything the engine needs to know about
one running instance of a compiled model, without caring how or where it is
actually kept.

Folds the teacher's separate `context: RefCell<D>` field into the instance
itself: the construction/action/guard signatures this engine exposes pass
only `(message, instance, ...)`, with no separate context parameter, so the
natural reading is that host data lives behind the instance handle rather
than beside it (see DESIGN.md, Open Question 4).
*/

use crate::definition::types::{RegionId, VertexId};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Tracks, for one running instance, which vertex is current in each region
/// that has ever been entered, whether the instance has terminated, and
/// carries the host's own data alongside.
pub trait Instance<D> {
    /// Records `vertex` as the current occupant of `region`. Overwrites any
    /// previous occupant, which is exactly how history recording works: the
    /// last vertex recorded before a region was left is what a later History
    /// pseudo-state restores.
    fn set_current(&mut self, region: RegionId, vertex: VertexId);

    /// The vertex last recorded as current in `region`, if the region has
    /// ever been entered.
    fn get_current(&self, region: RegionId) -> Option<VertexId>;

    fn is_terminated(&self) -> bool;

    fn set_terminated(&mut self, value: bool);

    fn data(&self) -> &D;

    fn data_mut(&mut self) -> &mut D;
}

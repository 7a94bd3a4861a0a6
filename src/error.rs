/*!
Provides a common error implementation, error kind enumeration, and constrained result type.
*/

error_chain! {
    errors {
        #[doc = "A state machine was constructed with no vertices."]
        ChartStatesEmpty {
            description("a state machine must have at least one vertex")
            display("state machine has no vertices")
        }

        #[doc = "A state machine has no reachable final state."]
        ChartNoFinalState {
            description("a state machine must have at least one final state")
            display("state machine has no final state")
        }

        #[doc = "A region was constructed with no vertices."]
        RegionVerticesEmpty(region: String) {
            description("a region must have at least one vertex")
            display("region '{}' has no vertices", region)
        }

        #[doc = "A region has no initial-family pseudo-state."]
        RegionMissingInitial(region: String) {
            description("a region must have exactly one initial-family pseudo-state")
            display("region '{}' has no initial-family pseudo-state", region)
        }

        #[doc = "A region has more than one initial-family pseudo-state."]
        RegionMultipleInitial(region: String) {
            description("a region must have exactly one initial-family pseudo-state")
            display("region '{}' has more than one initial-family pseudo-state", region)
        }

        #[doc = "A final state has at least one outgoing transition."]
        FinalStateHasOutgoing(state: String) {
            description("a final state may not have outgoing transitions")
            display("final state '{}' has an outgoing transition", state)
        }

        #[doc = "A Choice/Junction/Initial/History pseudo-state has no outgoing transition."]
        PseudoStateNoOutgoing(vertex: String) {
            description("a choice, junction, initial or history pseudo-state must have at least one outgoing transition")
            display("pseudo-state '{}' has no outgoing transition", vertex)
        }

        #[doc = "A Choice/Junction has no else branch and fewer than two guarded outgoing transitions."]
        ChoiceJunctionDeadEnd(vertex: String) {
            description("a choice or junction pseudo-state should have an else branch or at least two guarded outgoing transitions")
            display("pseudo-state '{}' has no else branch and fewer than two guarded outgoing transitions: dead-end risk", vertex)
        }

        #[doc = "A Terminate pseudo-state has at least one outgoing transition."]
        TerminateHasOutgoing(vertex: String) {
            description("a terminate pseudo-state may not have outgoing transitions")
            display("terminate pseudo-state '{}' has an outgoing transition", vertex)
        }

        #[doc = "A History pseudo-state has no resolvable default target."]
        HistoryNoDefaultTarget(vertex: String) {
            description("a history pseudo-state must have exactly one unguarded outgoing transition, used as its default target")
            display("history pseudo-state '{}' has no resolvable default target", vertex)
        }

        #[doc = "An `else` transition originates from a vertex that is not a Choice or Junction."]
        ElseOnNonPseudoState(vertex: String) {
            description("an else transition may only originate from a choice or junction pseudo-state")
            display("vertex '{}' has an else transition but is not a choice or junction", vertex)
        }

        #[doc = "A transition's source or target vertex does not exist in the model."]
        TransitionDanglingEndpoint(transition: String) {
            description("a transition must reference vertices that exist in the model")
            display("transition '{}' references a vertex that does not exist", transition)
        }

        #[doc = "One or more validation diagnostics were errors."]
        ModelInvalid(count: usize) {
            description("the model failed validation")
            display("model failed validation with {} error(s)", count)
        }

        #[doc = "More than one non-else guard matched at a Junction pseudo-state."]
        JunctionAmbiguous(vertex: String) {
            description("at most one non-else guard may match at a junction pseudo-state")
            display("junction pseudo-state '{}' has more than one matching guard", vertex)
        }

        #[doc = "No guard matched at a Choice/Junction and no else transition was present."]
        NoTransitionSelected(vertex: String) {
            description("a choice or junction pseudo-state must always have a transition to take")
            display("no guard matched at pseudo-state '{}' and there is no else transition", vertex)
        }

        #[doc = "An identifier string was empty."]
        EmptyIdentifier {
            description("an identifier may not be empty")
            display("identifier is empty")
        }
    }
}

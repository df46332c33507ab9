//! Property-based tests for the typestate edge-function algebra
//!
//! Laws the solver relies on, checked for arbitrary transition relations
//! over a four-state alphabet:
//! - Composition is associative and identity is neutral
//! - Meet is idempotent, commutative and associative
//! - Composition distributes over meet
//! - Applying a composed / met function equals applying the parts

use codegraph_ideal::features::typestate::{State, StateSet, TransitionFunction};
use codegraph_ideal::{EdgeFunction, ValueTransformer};
use proptest::prelude::*;

type Ef = EdgeFunction<StateSet, TransitionFunction>;

fn state() -> impl Strategy<Value = State> {
    prop::sample::select(vec!["A", "B", "C", "D"]).prop_map(State::new)
}

fn state_set() -> impl Strategy<Value = StateSet> {
    prop::collection::btree_set(state(), 0..4).prop_map(|s| s.into_iter().collect())
}

fn transition_function() -> impl Strategy<Value = TransitionFunction> {
    prop::collection::vec((state(), state()), 0..6).prop_map(TransitionFunction::from_transitions)
}

fn edge_function() -> impl Strategy<Value = Ef> {
    prop_oneof![
        Just(EdgeFunction::Identity),
        Just(EdgeFunction::AllTop(StateSet::empty())),
        transition_function().prop_map(EdgeFunction::Transformer),
    ]
}

proptest! {
    #[test]
    fn prop_compose_is_associative(
        f in transition_function(),
        g in transition_function(),
        h in transition_function(),
    ) {
        prop_assert_eq!(f.compose_with(&g.compose_with(&h)), f.compose_with(&g).compose_with(&h));
    }

    #[test]
    fn prop_identity_is_neutral(f in transition_function()) {
        let id = TransitionFunction::identity();
        prop_assert_eq!(f.compose_with(&id), f.clone());
        prop_assert_eq!(id.compose_with(&f), f);
    }

    #[test]
    fn prop_meet_is_idempotent_and_commutative(
        f in transition_function(),
        g in transition_function(),
    ) {
        prop_assert_eq!(f.meet_with(&f), f.clone());
        prop_assert_eq!(f.meet_with(&g), g.meet_with(&f));
    }

    #[test]
    fn prop_meet_is_associative(
        f in transition_function(),
        g in transition_function(),
        h in transition_function(),
    ) {
        prop_assert_eq!(f.meet_with(&g.meet_with(&h)), f.meet_with(&g).meet_with(&h));
    }

    #[test]
    fn prop_compose_distributes_over_meet(
        f in transition_function(),
        g in transition_function(),
        h in transition_function(),
    ) {
        prop_assert_eq!(
            f.meet_with(&g).compose_with(&h),
            f.compose_with(&h).meet_with(&g.compose_with(&h))
        );
        prop_assert_eq!(
            h.compose_with(&f.meet_with(&g)),
            h.compose_with(&f).meet_with(&h.compose_with(&g))
        );
    }

    #[test]
    fn prop_composed_function_applies_in_order(
        f in transition_function(),
        g in transition_function(),
        v in state_set(),
    ) {
        prop_assert_eq!(
            f.compose_with(&g).compute_target(&v),
            g.compute_target(&f.compute_target(&v))
        );
    }

    #[test]
    fn prop_met_function_unions_images(
        f in transition_function(),
        g in transition_function(),
        v in state_set(),
    ) {
        prop_assert_eq!(
            f.meet_with(&g).compute_target(&v),
            f.compute_target(&v).union(&g.compute_target(&v))
        );
    }

    #[test]
    fn prop_edge_function_compose_applies_in_order(
        f in edge_function(),
        g in edge_function(),
        v in state_set(),
    ) {
        prop_assert_eq!(
            f.compose_with(&g).compute_target(&v),
            g.compute_target(&f.compute_target(&v))
        );
    }

    #[test]
    fn prop_edge_function_meet_unions_values(
        f in edge_function(),
        g in edge_function(),
        v in state_set(),
    ) {
        prop_assert_eq!(
            f.meet_with(&g).compute_target(&v),
            f.compute_target(&v).union(&g.compute_target(&v))
        );
    }

    #[test]
    fn prop_all_top_is_meet_neutral(f in edge_function(), v in state_set()) {
        let top = EdgeFunction::AllTop(StateSet::empty());
        prop_assert_eq!(f.meet_with(&top).compute_target(&v), f.compute_target(&v));
    }
}

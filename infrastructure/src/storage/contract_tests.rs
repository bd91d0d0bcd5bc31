//! Behaviour every [`SessionStore`] must share, run against each adapter.

use lattia_application::ports::session_store::{SessionStore, StoreError, TurnCommit};
use lattia_domain::{
    FieldRequest, FieldSpec, IntakeDomain, InterviewState, InterviewTurn, NextFieldSelection,
    Role, TurnDecision, ValueType, ValueUpdate,
};

pub(crate) async fn run_all(store: &dyn SessionStore) {
    profiles_are_unique_and_listed_newest_first(store).await;
    state_round_trips_with_versions(store).await;
    commit_turn_is_atomic(store).await;
    delete_cascades(store).await;
    unknown_profiles_are_not_found(store).await;
}

fn sample_state() -> InterviewState {
    let mut state = InterviewState::new();
    state.apply(&TurnDecision::from(
        InterviewTurn::new(
            NextFieldSelection::new("sleep_hours", IntakeDomain::Sleep),
            "How many hours do you sleep?",
        )
        .with_field(FieldRequest::new(
            FieldSpec::new(
                "sleep_hours",
                "Sleep hours",
                IntakeDomain::Sleep,
                ValueType::BucketedChoice,
            )
            .with_option("4to6h", "4-6h"),
            "volunteered",
        ))
        .with_update(ValueUpdate::new("sleep_hours", "4to6h"))
        .with_completed_domain(IntakeDomain::Sleep),
    ));
    state
}

async fn profiles_are_unique_and_listed_newest_first(store: &dyn SessionStore) {
    let first = store.create_profile("contract-a").await.unwrap();
    let second = store.create_profile("contract-b").await.unwrap();
    assert!(second.id > first.id);

    assert!(matches!(
        store.create_profile("contract-a").await,
        Err(StoreError::AlreadyExists(_))
    ));

    let listed = store.list_profiles().await.unwrap();
    let pos_a = listed.iter().position(|p| p.id == first.id).unwrap();
    let pos_b = listed.iter().position(|p| p.id == second.id).unwrap();
    assert!(pos_b < pos_a);

    assert_eq!(store.get_profile(first.id).await.unwrap().name, "contract-a");
}

async fn state_round_trips_with_versions(store: &dyn SessionStore) {
    let profile = store.create_profile("contract-state").await.unwrap();
    let initial = store.load_state(profile.id).await.unwrap();
    assert_eq!(initial.version, 0);
    assert!(initial.state.fields().is_empty());

    let state = sample_state();
    assert_eq!(store.save_state(profile.id, &state, 0).await.unwrap(), 1);

    let loaded = store.load_state(profile.id).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.state, state);

    // Stale writer loses
    assert!(matches!(
        store.save_state(profile.id, &InterviewState::new(), 0).await,
        Err(StoreError::Conflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
    assert_eq!(store.load_state(profile.id).await.unwrap().state, state);
}

async fn commit_turn_is_atomic(store: &dyn SessionStore) {
    let profile = store.create_profile("contract-commit").await.unwrap();
    store
        .append_message(profile.id, Role::Assistant, "Hello!")
        .await
        .unwrap();

    let state = sample_state();
    let assistant = store
        .commit_turn(
            profile.id,
            TurnCommit {
                user_message: "I sleep 5 hours",
                assistant_message: "How rested do you feel?",
                state: &state,
                expected_version: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.content, "How rested do you feel?");

    let messages = store.messages(profile.id).await.unwrap();
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    assert!(messages.windows(2).all(|w| w[0].id < w[1].id));

    // Conflicting commit writes nothing
    let result = store
        .commit_turn(
            profile.id,
            TurnCommit {
                user_message: "late",
                assistant_message: "late",
                state: &InterviewState::new(),
                expected_version: 0,
            },
        )
        .await;
    assert!(matches!(result, Err(StoreError::Conflict { .. })));
    assert_eq!(store.messages(profile.id).await.unwrap().len(), 3);
    let loaded = store.load_state(profile.id).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.state, state);
}

async fn delete_cascades(store: &dyn SessionStore) {
    let profile = store.create_profile("contract-delete").await.unwrap();
    store
        .append_message(profile.id, Role::Assistant, "Hi")
        .await
        .unwrap();

    store.delete_profile(profile.id).await.unwrap();

    assert!(matches!(
        store.get_profile(profile.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.load_state(profile.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(store.messages(profile.id).await.unwrap().is_empty());

    // Name is free again
    store.create_profile("contract-delete").await.unwrap();
}

async fn unknown_profiles_are_not_found(store: &dyn SessionStore) {
    let missing = 9_999;
    assert!(matches!(
        store.delete_profile(missing).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store
            .append_message(missing, Role::User, "hello")
            .await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store
            .save_state(missing, &InterviewState::new(), 0)
            .await,
        Err(StoreError::NotFound(_))
    ));
}

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use goap_planner::{
    Action, Agent, AgentConfig, FnEffect, FnPredicate, Goal, Planner, RunOutcome, State, Value,
};

/// An action whose planning-relevant change is synchronous, with an async check and
/// an async side effect that count how often they are awaited.
fn counted_sync(calls: Arc<AtomicUsize>, ready: bool) -> Action {
    let check_calls = calls.clone();
    let effect_calls = calls;

    let mut action = Action::new("sync_issue");
    action
        .add_precondition("synced", |v| v.as_bool() == Some(false))
        .add_effect("synced", |_| true)
        .add_async_precondition(
            "synced",
            FnPredicate::new(move |_v: Value| {
                let calls = check_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    ready
                }
            }),
        )
        .add_async_effect(
            "synced",
            FnEffect::new(move |v: Value| {
                let calls = effect_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    v
                }
            }),
        );
    action
}

#[tokio::test]
async fn test_run_async_awaits_async_parts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut agent = Agent::new("syncer", Planner::new("astar"));
    agent.state.set("synced", false);
    agent.add_action(counted_sync(calls.clone(), true));
    agent.add_goal(Goal::new("synced").with_target("synced", true));

    assert_eq!(agent.run_async().await.unwrap(), RunOutcome::Completed);
    assert_eq!(agent.state, State::new().with("synced", true));
    // one async precondition check plus one async effect
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_run_async_stalls_when_async_check_refuses() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut agent = Agent::new("syncer", Planner::new("astar"));
    agent.state.set("synced", false);
    agent.add_action(counted_sync(calls.clone(), false));
    agent.add_goal(Goal::new("synced").with_target("synced", true));

    assert_eq!(
        agent.run_async().await.unwrap(),
        RunOutcome::Stalled {
            goal: "synced".to_string()
        }
    );
    assert_eq!(agent.state, State::new().with("synced", false));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_async_effects_run_concurrently() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let mut action = Action::new("fan_out");
    for key in ["a", "b", "c"] {
        let in_flight = in_flight.clone();
        let max_in_flight = max_in_flight.clone();
        action.add_async_effect(
            key,
            FnEffect::new(move |v: Value| {
                let in_flight = in_flight.clone();
                let max_in_flight = max_in_flight.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    v.as_i64().unwrap_or_default() * 10
                }
            }),
        );
    }

    let state = State::new().with("a", 1).with("b", 2).with("c", 3);
    let next = action.simulate_async(&state).await.unwrap();

    // all three effects were suspended at the same time
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 3);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(next, State::new().with("a", 10).with("b", 20).with("c", 30));
    assert_eq!(state, State::new().with("a", 1).with("b", 2).with("c", 3));
}

#[test]
fn test_run_stalls_on_action_guarded_by_async_check() {
    let mut agent = Agent::new("deployer", Planner::new("astar"));
    agent.state.set("deployed", false);
    agent
        .action("deploy")
        .add_async_precondition("deployed", FnPredicate::new(|_v: Value| async { false }))
        .add_effect("deployed", |_| true);
    agent.add_goal(Goal::new("live").with_target("deployed", true));

    assert_eq!(
        agent.run().unwrap(),
        RunOutcome::Stalled {
            goal: "live".to_string()
        }
    );
    assert_eq!(agent.state, State::new().with("deployed", false));
}

#[tokio::test]
async fn test_run_async_stops_at_cycle_limit() {
    let ticks = Arc::new(AtomicI64::new(0));
    let config = AgentConfig {
        max_cycles: Some(5),
    };
    let mut agent = Agent::with_config("restless", Planner::new("astar"), config);
    agent.state.set("ticks", 100);

    // Planned as a reset to zero, but the async effect keeps drifting the counter.
    let drift = ticks.clone();
    agent
        .action("reset")
        .add_effect("ticks", |_| 0)
        .add_async_effect(
            "ticks",
            FnEffect::new(move |_v: Value| {
                let drift = drift.clone();
                async move { drift.fetch_add(1, Ordering::SeqCst) + 1 }
            }),
        );
    agent.add_goal(Goal::new("settled").with_target("ticks", 0));

    assert_eq!(
        agent.run_async().await.unwrap(),
        RunOutcome::CycleLimit { cycles: 5 }
    );
    assert_eq!(ticks.load(Ordering::SeqCst), 5);
    assert_eq!(agent.goals().len(), 1);
}

use goap_planner::{Action, Agent, GoapError, Goal, Planner, RunOutcome, State, Value};

fn increment() -> Action {
    let mut action = Action::new("increment");
    action
        .add_precondition("value", |v| v.as_i64().map_or(false, |n| n > 5))
        .add_effect("value", |v| v.as_i64().unwrap_or_default() + 1);
    action
}

fn add_three() -> Action {
    let mut action = Action::new("add_three");
    action
        .add_precondition("value", |v| v.as_i64().map_or(false, |n| n > 5))
        .add_effect("value", |v| v.as_i64().unwrap_or_default() + 3);
    action
}

fn subtract_two() -> Action {
    let mut action = Action::new("subtract_two");
    action
        .add_precondition("value", |v| v.as_i64().map_or(false, |n| n < 50))
        .add_effect("value", |v| v.as_i64().unwrap_or_default() - 2);
    action
}

fn names(plan: &[Action]) -> Vec<&str> {
    plan.iter().map(|a| a.name.as_str()).collect()
}

fn absolute(current: Option<&Value>, target: &Value) -> f64 {
    match (current.and_then(Value::as_f64), target.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs(),
        _ => 1.0,
    }
}

fn replay(start: &State, plan: &[Action]) -> State {
    let mut state = start.clone();
    for action in plan {
        assert!(action.apply(&mut state).unwrap(), "{} not eligible", action);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_action_counts_up_to_goal() {
        let state = State::new().with("value", 6);
        let goals = vec![Goal::new("ten")
            .with_target("value", 10)
            .set_distance("value", absolute)];

        let plan = Planner::new("astar")
            .plan(&state, &goals, &[increment()])
            .unwrap();
        assert_eq!(names(&plan), ["increment"; 4]);
        assert_eq!(replay(&state, &plan), State::new().with("value", 10));
    }

    #[test]
    fn test_agent_run_leaves_goal_state_and_no_goals() {
        let mut agent = Agent::new("agent", Planner::new("astar"));
        agent.state.set("value", 6);
        agent.add_action(increment());
        agent.add_goal(
            Goal::new("ten")
                .with_target("value", 10)
                .set_distance("value", absolute),
        );

        assert_eq!(agent.run().unwrap(), RunOutcome::Completed);
        assert_eq!(agent.state, State::new().with("value", 10));
        assert!(agent.goals().is_empty());
    }

    #[test]
    fn test_interleaved_actions_land_exactly_on_goal() {
        let state = State::new().with("value", 6);
        let goals = vec![Goal::new("ten").with_target("value", 10)];

        let plan = Planner::new("astar")
            .plan(&state, &goals, &[add_three(), subtract_two()])
            .unwrap();

        // 6 + 3 + 3 - 2 = 10, the shortest combination
        assert_eq!(names(&plan), ["add_three", "add_three", "subtract_two"]);
        assert_eq!(replay(&state, &plan), State::new().with("value", 10));
    }

    #[test]
    fn test_goal_key_missing_from_state() {
        let state = State::new().with("value", 6);
        let goal = Goal::new("needs_flag")
            .with_target("value", 6)
            .with_target("flag", true);

        assert!(!goal.evaluate(&state));
        assert_eq!(goal.distance(&state), 1.0);

        // Effects never create keys, so the goal is out of reach.
        let mut bump = Action::new("bump");
        bump.add_precondition("value", |v| v.as_i64().map_or(false, |n| n < 8))
            .add_effect("value", |v| v.as_i64().unwrap_or_default() + 1);
        let plan = Planner::new("astar").plan(&state, &[goal], &[bump]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_no_actions_yields_empty_plan() {
        let state = State::new().with("value", 6);
        let goals = vec![Goal::new("ten").with_target("value", 10)];
        let plan = Planner::new("astar").plan(&state, &goals, &[]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_evaluate_is_full_set_equality() {
        let goal = Goal::new("g").with_target("a", 1).with_target("b", "x");

        assert!(goal.evaluate(&State::new().with("b", "x").with("a", 1)));
        assert!(!goal.evaluate(&State::new().with("a", 1)));
        assert!(!goal.evaluate(&State::new().with("a", 1).with("b", "x").with("c", 0)));
        assert!(!goal.evaluate(&State::new().with("a", 2).with("b", "x")));
    }

    #[test]
    fn test_shortest_plan_with_admissible_distance() {
        let mut up_one = Action::new("up_one");
        up_one.add_effect("n", |v| v.as_i64().unwrap_or_default() + 1);
        let mut up_five = Action::new("up_five");
        up_five.add_effect("n", |v| v.as_i64().unwrap_or_default() + 5);
        let mut down_one = Action::new("down_one");
        down_one.add_effect("n", |v| v.as_i64().unwrap_or_default() - 1);

        // Each action moves at most 5, so ceil(|d| / 5) never overestimates.
        let goal = Goal::new("thirteen")
            .with_target("n", 13)
            .set_distance("n", |current, target| {
                match (current.and_then(Value::as_f64), target.as_f64()) {
                    (Some(x), Some(y)) => ((x - y).abs() / 5.0).ceil(),
                    _ => 1.0,
                }
            });
        let state = State::new().with("n", 0);

        let plan = Planner::new("astar")
            .plan(&state, &[goal], &[up_one, up_five, down_one])
            .unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(replay(&state, &plan), State::new().with("n", 13));
    }

    #[test]
    fn test_planning_is_deterministic() {
        let state = State::new().with("value", 6);
        let goals = vec![Goal::new("twenty").with_target("value", 20)];
        let actions = [add_three(), subtract_two(), increment()];
        let planner = Planner::new("astar");

        let first = planner.plan(&state, &goals, &actions).unwrap();
        let second = planner.plan(&state, &goals, &actions).unwrap();
        assert!(!first.is_empty());
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_planning_does_not_touch_input_state() {
        let state = State::new().with("value", 6);
        let goals = vec![Goal::new("ten").with_target("value", 10)];
        Planner::new("astar")
            .plan(&state, &goals, &[increment()])
            .unwrap();
        assert_eq!(state, State::new().with("value", 6));
    }

    #[test]
    fn test_agent_surfaces_predicate_violation() {
        let mut agent = Agent::new("agent", Planner::new("astar"));
        agent.state.set("value", 6);
        agent
            .action("broken")
            .add_value_precondition("value", |v| v.clone())
            .add_effect("value", |v| v.as_i64().unwrap_or_default() + 1);
        agent.add_goal(Goal::new("ten").with_target("value", 10));

        let err = agent.run().unwrap_err();
        assert!(matches!(err, GoapError::InvalidPredicateResult { .. }));
        assert_eq!(agent.state, State::new().with("value", 6));
    }

    #[test]
    fn test_agent_stalls_on_unreachable_goal() {
        let mut agent = Agent::new("agent", Planner::new("astar"));
        agent.state.set("lamp", false);
        agent
            .action("toggle")
            .add_effect("lamp", |v| !v.as_bool().unwrap_or_default());
        agent.add_goal(Goal::new("dimmed").with_target("lamp", "dim"));

        assert_eq!(
            agent.run().unwrap(),
            RunOutcome::Stalled {
                goal: "dimmed".to_string()
            }
        );
        assert_eq!(agent.goals().len(), 1);
    }

    #[test]
    fn test_agent_surfaces_exhausted_search() {
        let mut agent = Agent::new("agent", Planner::new("astar"));
        agent.state.set("value", 6);
        agent.add_action(subtract_two());
        agent.add_goal(Goal::new("ten").with_target("value", 10));

        match agent.run() {
            Err(GoapError::SearchExhausted { goal, expansions }) => {
                assert_eq!(goal, "ten");
                assert_eq!(expansions, 10_000);
            }
            other => panic!("expected exhausted search, got {:?}", other),
        }
    }
}

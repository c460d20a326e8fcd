use std::error::Error;

use goap_planner::{goal::metric, Agent, Goal, PlanVisualizer, Planner, RunOutcome, Value};

fn main() -> Result<(), Box<dyn Error>> {
    // Create an agent that triages an issue before a patch can be proposed
    let mut agent = Agent::new("triage_agent", Planner::new("astar"));
    agent.state.set("issue", "open");
    agent.state.set("findings", 0);
    agent.state.set("patched", false);

    // Scan the repository, one finding per pass
    agent
        .action("scan_repository")
        .add_precondition("issue", |v| v.as_str() == Some("open"))
        .add_effect("findings", |v| v.as_i64().unwrap_or_default() + 1);

    // Triage once enough findings are in
    agent
        .action("triage_issue")
        .add_precondition("findings", |v| v.as_i64().map_or(false, |n| n >= 2))
        .add_precondition("issue", |v| v.as_str() == Some("open"))
        .add_effect("issue", |_| "triaged");

    // Propose a patch for a triaged issue
    agent
        .action("propose_patch")
        .add_precondition("issue", |v| v.as_str() == Some("triaged"))
        .add_effect("patched", |_| true);

    let goal = Goal::new("patch_proposed")
        .with_target("issue", "triaged")
        .with_target("findings", 2)
        .with_target("patched", true)
        .set_distance("issue", metric::unit)
        .set_distance("patched", |current: Option<&Value>, _| match current {
            Some(Value::Bool(true)) => 0.0,
            _ => 1.0,
        });

    // Render the plan before executing it
    let plan = Planner::new("preview").plan(&agent.state, &[goal.clone()], agent.actions())?;
    println!("Planned {} actions:", plan.len());
    for (i, action) in plan.iter().enumerate() {
        println!("  Step {}: {}", i + 1, action);
    }
    PlanVisualizer::new().visualize_plan(&agent.state, &goal, &plan, "triage_plan.dot")?;
    println!("Plan trace written to triage_plan.dot");

    agent.add_goal(goal);
    println!("Initial state: {}", agent.state);
    match agent.run()? {
        RunOutcome::Completed => println!("Final state: {}", agent.state),
        RunOutcome::Stalled { goal } => println!("Stalled on goal {}", goal),
        RunOutcome::CycleLimit { cycles } => println!("Stopped after {} cycles", cycles),
    }

    Ok(())
}

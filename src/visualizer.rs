use crate::{Action, Goal, Result, State};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Renders a plan as a Graphviz DOT trace: start state, each simulated intermediate
/// state, and the goal.
pub struct PlanVisualizer;

impl PlanVisualizer {
    pub fn new() -> Self {
        Self
    }

    /// Write the DOT trace of `plan` starting from `start` into `out`.
    ///
    /// Intermediate states are projected the way the planner sees them, so `start` is
    /// not touched and async preconditions are taken as holding.
    pub fn render<W: Write>(
        &self,
        start: &State,
        goal: &Goal,
        plan: &[Action],
        out: &mut W,
    ) -> Result<()> {
        writeln!(out, "digraph GOAP {{")?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(
            out,
            "    node [shape=box, style=filled, fillcolor=lightblue];"
        )?;
        writeln!(out, "    edge [fontsize=10];")?;

        writeln!(
            out,
            "    state_0 [label=\"Start\\n{}\", fillcolor=lightgreen];",
            Self::state_label(start)
        )?;

        let mut current = start.substate(&[]);
        for (i, action) in plan.iter().enumerate() {
            current = action.project(&current);
            writeln!(
                out,
                "    state_{} [label=\"{}\"];",
                i + 1,
                Self::state_label(&current)
            )?;
            writeln!(
                out,
                "    state_{} -> state_{} [label=\"{}\"];",
                i,
                i + 1,
                Self::escape(&action.name)
            )?;
        }

        writeln!(
            out,
            "    goal [label=\"Goal {}\\n{}\", fillcolor=lightpink];",
            Self::escape(goal.name()),
            Self::state_label(goal.final_state())
        )?;

        // Highlight whether the trace actually lands on the goal
        if goal.evaluate(&current) {
            writeln!(
                out,
                "    state_{} -> goal [label=\"achieves\", color=red, penwidth=2.0];",
                plan.len()
            )?;
        } else {
            writeln!(
                out,
                "    state_{} -> goal [label=\"distance {}\", style=dashed];",
                plan.len(),
                goal.distance(&current)
            )?;
        }

        writeln!(out, "}}")?;
        Ok(())
    }

    /// Write the DOT trace of `plan` to `filename`.
    pub fn visualize_plan(
        &self,
        start: &State,
        goal: &Goal,
        plan: &[Action],
        filename: impl AsRef<Path>,
    ) -> Result<()> {
        let mut file = BufWriter::new(File::create(filename)?);
        self.render(start, goal, plan, &mut file)?;
        file.flush()?;
        Ok(())
    }

    fn state_label(state: &State) -> String {
        state
            .iter()
            .map(|(key, value)| Self::escape(&format!("{}: {}", key, value)))
            .collect::<Vec<_>>()
            .join("\\n")
    }

    fn escape(text: &str) -> String {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

impl Default for PlanVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::{HashMap, HashSet};

use crate::error::{Result, WorkflowError};
use crate::types::WorkflowStep;

/// Checks step ids are unique, every `depends_on` entry resolves, and the
/// resulting graph is acyclic. Returns nothing on success — callers walk the
/// graph themselves during scheduling rather than consuming a precomputed
/// order, since readiness also depends on runtime outcomes.
pub fn validate(steps: &[WorkflowStep]) -> Result<()> {
    let mut seen = HashSet::with_capacity(steps.len());
    for step in steps {
        if !seen.insert(step.id.as_str()) {
            return Err(WorkflowError::DuplicateStepId(step.id.clone()));
        }
    }

    for step in steps {
        for dep in &step.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(WorkflowError::DependencyMissing {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    detect_cycle(steps)
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Mark {
    Visiting,
    Done,
}

fn detect_cycle(steps: &[WorkflowStep]) -> Result<()> {
    let by_id: HashMap<&str, &WorkflowStep> = steps.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a WorkflowStep>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<()> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(WorkflowError::DependencyCycle(id.to_string())),
            None => {}
        }
        marks.insert(id, Mark::Visiting);
        for dep in &by_id[id].depends_on {
            visit(dep.as_str(), by_id, marks)?;
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    for step in steps {
        visit(step.id.as_str(), &by_id, &mut marks)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn step(id: &str, depends_on: &[&str]) -> WorkflowStep {
        WorkflowStep {
            id: id.to_string(),
            target_agent_id: "agent-1".to_string(),
            skill_name: "noop".to_string(),
            operation: "run".to_string(),
            parameters: Map::new(),
            timeout: None,
            order: 0,
            required: true,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            missing_dependency_policy: Default::default(),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let steps = vec![step("a", &[]), step("a", &[])];
        assert!(matches!(validate(&steps), Err(WorkflowError::DuplicateStepId(id)) if id == "a"));
    }

    #[test]
    fn rejects_missing_dependency() {
        let steps = vec![step("a", &["ghost"])];
        assert!(matches!(
            validate(&steps),
            Err(WorkflowError::DependencyMissing { step, dependency })
                if step == "a" && dependency == "ghost"
        ));
    }

    #[test]
    fn rejects_cycle() {
        let steps = vec![step("a", &["b"]), step("b", &["a"])];
        assert!(matches!(validate(&steps), Err(WorkflowError::DependencyCycle(_))));
    }

    #[test]
    fn accepts_valid_dag() {
        let steps = vec![step("a", &[]), step("b", &["a"]), step("c", &["a", "b"])];
        assert!(validate(&steps).is_ok());
    }
}

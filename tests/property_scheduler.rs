use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use taskpipe::dag::Scheduler;
use taskpipe::errors::TaskpipeError;
use taskpipe::fs::MockFileSystem;
use taskpipe::pipeline::PipelineExecutor;
use taskpipe_test_utils::builders::recording_registry;

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut deps: Vec<usize> = potential
                        .into_iter()
                        .filter(|_| i > 0)
                        .map(|d| d % i.max(1))
                        .collect::<HashSet<_>>()
                        .into_iter()
                        .collect();
                    deps.sort_unstable();
                    deps
                })
                .collect()
        })
    })
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("task_{i}")).collect()
}

fn run_graph(
    deps: &[Vec<usize>],
    target: usize,
) -> (Result<Vec<String>, TaskpipeError>, Vec<String>) {
    let names = names(deps.len());
    let prereq_names: Vec<Vec<&str>> = deps
        .iter()
        .map(|ds| ds.iter().map(|d| names[*d].as_str()).collect())
        .collect();
    let spec: Vec<(&str, &[&str])> = names
        .iter()
        .zip(prereq_names.iter())
        .map(|(n, ds)| (n.as_str(), ds.as_slice()))
        .collect();

    let (registry, log) = recording_registry(&spec, &[]);
    let scheduler = Scheduler::new(
        Arc::new(registry),
        PipelineExecutor::new(Arc::new(MockFileSystem::new())),
    );
    let result = scheduler.execute(&names[target]).map(|s| s.executed);
    let ran = log.lock().unwrap().clone();
    (result, ran)
}

fn transitive_prereqs(deps: &[Vec<usize>], target: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut stack = vec![target];
    while let Some(t) = stack.pop() {
        if seen.insert(t) {
            stack.extend(deps[t].iter().copied());
        }
    }
    seen
}

proptest! {
    #[test]
    fn acyclic_graphs_run_every_prerequisite_once_before_dependents(
        deps in dag_strategy(12),
        target_seed in any::<usize>(),
    ) {
        let target = target_seed % deps.len();
        let (result, ran) = run_graph(&deps, target);
        let executed = result.unwrap();
        prop_assert_eq!(&executed, &ran);

        // Exactly the transitive closure, each once.
        let expected: HashSet<String> = transitive_prereqs(&deps, target)
            .into_iter()
            .map(|i| format!("task_{i}"))
            .collect();
        let unique: HashSet<String> = ran.iter().cloned().collect();
        prop_assert_eq!(unique.len(), ran.len());
        prop_assert_eq!(unique, expected);

        // Every prerequisite precedes its dependent.
        let position: HashMap<&str, usize> =
            ran.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
        for (i, ds) in deps.iter().enumerate() {
            let Some(&pos) = position.get(format!("task_{i}").as_str()) else { continue };
            for d in ds {
                let dep_pos = position[format!("task_{d}").as_str()];
                prop_assert!(dep_pos < pos);
            }
        }
        prop_assert_eq!(ran.last().cloned(), Some(format!("task_{target}")));
    }

    #[test]
    fn cyclic_graphs_fail_without_running_any_body(
        deps in dag_strategy(10),
        from_seed in any::<usize>(),
        to_seed in any::<usize>(),
    ) {
        // Add a back edge from a prerequisite to one of its transitive
        // dependents, closing a cycle through `target`.
        let mut deps = deps;
        let target = from_seed % deps.len();
        let closure: Vec<usize> = {
            let mut c: Vec<usize> = transitive_prereqs(&deps, target).into_iter().collect();
            c.sort_unstable();
            c
        };
        let lower = closure[to_seed % closure.len()];
        deps[lower].push(target);

        let (result, ran) = run_graph(&deps, target);
        let is_cycle = matches!(result, Err(TaskpipeError::CyclicDependency { .. }));
        prop_assert!(is_cycle);
        prop_assert!(ran.is_empty());
    }
}

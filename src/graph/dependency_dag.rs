use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::TaskGraph;
use crate::error::{ScheduleError, ScheduleResult};
use crate::task::TaskId;

/// Dependency edges of a [`TaskGraph`] as a petgraph digraph.
pub struct DependencyDag {
    pub graph: DiGraph<TaskId, ()>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl DependencyDag {
    pub fn build(tasks: &TaskGraph) -> Self {
        let mut graph: DiGraph<TaskId, ()> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::new();

        // Add nodes first, in display order
        for task in tasks.tasks() {
            let node_ix = graph.add_node(task.id());
            id_to_index.insert(task.id(), node_ix);
        }

        // Add edges: precedent -> dependant
        for (precedent, dependant) in tasks.relations() {
            if let (Some(&u), Some(&v)) = (id_to_index.get(&precedent), id_to_index.get(&dependant))
            {
                graph.add_edge(u, v, ());
            }
        }

        Self { graph, id_to_index }
    }

    pub fn has_path(&self, from: TaskId, to: TaskId) -> bool {
        match (self.id_to_index.get(&from), self.id_to_index.get(&to)) {
            (Some(&u), Some(&v)) => has_path_connecting(&self.graph, u, v, None),
            _ => false,
        }
    }

    pub fn topological_order(&self) -> ScheduleResult<Vec<TaskId>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()];
            ScheduleError::DependencyCycle {
                precedent: id,
                dependant: id,
            }
        })?;
        Ok(sorted.into_iter().map(|ix| self.graph[ix]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn dag_mirrors_dependency_edges() {
        let mut tasks = TaskGraph::new();
        let ids: Vec<TaskId> = (0..3)
            .map(|i| {
                let t = Task::new(format!("T{i}"));
                let id = t.id();
                tasks.add(t).unwrap();
                id
            })
            .collect();
        tasks.relate(ids[0], ids[1]).unwrap();
        tasks.relate(ids[0], ids[2]).unwrap();

        let dag = DependencyDag::build(&tasks);
        assert_eq!(dag.graph.node_count(), 3);
        assert_eq!(dag.graph.edge_count(), 2);
        assert!(dag.has_path(ids[0], ids[2]));
        assert!(!dag.has_path(ids[2], ids[0]));
    }
}

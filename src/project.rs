use std::fmt;

use crate::calendar::WorkCalendar;
use crate::config::EngineConfig;
use crate::directory::ResourceDirectory;
use crate::engagement::EngagementEngine;
use crate::graph::TaskGraph;
use crate::metadata::ProjectMetadata;

/// What caused a state change reported to [`Project::on_change`] listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Execute,
    Undo,
    Redo,
    Rollback,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub description: String,
    pub origin: ChangeOrigin,
}

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// The two stores the history mutates, plus the calendar they are read against.
pub struct Project {
    metadata: ProjectMetadata,
    calendar: WorkCalendar,
    tasks: TaskGraph,
    resources: ResourceDirectory,
    listeners: Vec<Listener>,
}

impl Project {
    pub fn new(metadata: ProjectMetadata, config: &EngineConfig) -> Self {
        let calendar = WorkCalendar::from_config(metadata.project_start_date, &config.calendar);
        Self {
            metadata,
            calendar,
            tasks: TaskGraph::new(),
            resources: ResourceDirectory::new(),
            listeners: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        metadata: ProjectMetadata,
        calendar: WorkCalendar,
        tasks: TaskGraph,
        resources: ResourceDirectory,
    ) -> Self {
        Self {
            metadata,
            calendar,
            tasks,
            resources,
            listeners: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn tasks(&self) -> &TaskGraph {
        &self.tasks
    }

    /// Direct access bypasses the history; changes made here cannot be undone.
    pub fn tasks_mut(&mut self) -> &mut TaskGraph {
        &mut self.tasks
    }

    pub fn resources(&self) -> &ResourceDirectory {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceDirectory {
        &mut self.resources
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.metadata.project_name = name.into();
    }

    pub fn engagement(&self) -> EngagementEngine<'_> {
        EngagementEngine::new(&self.tasks, &self.resources, &self.calendar)
    }

    pub fn on_change(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn notify(&mut self, event: ChangeEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("metadata", &self.metadata)
            .field("calendar", &self.calendar)
            .field("tasks", &self.tasks)
            .field("resources", &self.resources)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new(ProjectMetadata::default(), &EngineConfig::default())
    }
}

pub mod calendar;
pub mod config;
pub mod directory;
pub mod engagement;
pub mod error;
pub mod graph;
pub mod history;
pub mod interval;
pub mod metadata;
pub mod persistence;
pub mod project;
pub mod resource;
pub mod task;

pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::EngineConfig;
pub use directory::{DirectoryEdit, Record, RecordKey, ResourceDirectory};
pub use engagement::{DayState, DayStatus, EngagementEngine, EngagementSummary};
pub use error::{ScheduleError, ScheduleResult};
pub use graph::{Changeset, SplitMemento, TaskGraph};
pub use history::{Action, CompositeAction, History};
pub use interval::DayRange;
pub use metadata::ProjectMetadata;
pub use persistence::{LoadedProject, PersistenceError, ProjectSnapshot};
pub use project::{ChangeEvent, ChangeOrigin, Project};
pub use resource::{Absence, Holiday, ParticipationInterval, Resource, ResourceAssignment, Role};
pub use task::{Task, TaskId};

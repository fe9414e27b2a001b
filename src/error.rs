use thiserror::Error;
use uuid::Uuid;

use crate::resource::ResourceId;
use crate::task::TaskId;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors raised by graph, directory and history operations.
///
/// Every variant is reported before any state is touched, so the model stays
/// usable after a rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("identity {0} already exists")]
    DuplicateId(Uuid),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("record {0} not found")]
    RecordNotFound(Uuid),

    #[error("grouping {member} under {group} would create a cycle")]
    Cycle { group: TaskId, member: TaskId },

    #[error("relating {precedent} -> {dependant} would create a dependency cycle")]
    DependencyCycle { precedent: TaskId, dependant: TaskId },

    #[error("task {member} is already grouped under {group}")]
    AlreadyGrouped { group: TaskId, member: TaskId },

    #[error("task {member} is not a member of group {group}")]
    NotGrouped { group: TaskId, member: TaskId },

    #[error("task {dependant} does not depend on {precedent}")]
    NotRelated { precedent: TaskId, dependant: TaskId },

    #[error("task {0} still has group, split or dependency relations")]
    TaskInUse(TaskId),

    #[error("resource {0} is still referenced by intervals or assignments")]
    ResourceInUse(ResourceId),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("a transaction is already active")]
    TransactionAlreadyActive,

    #[error("no transaction is active")]
    NoActiveTransaction,

    #[error("undo/redo is not available while a transaction is open")]
    TransactionInProgress,
}

impl ScheduleError {
    /// Structural errors concern identities and relations rather than history state.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ScheduleError::TransactionAlreadyActive
                | ScheduleError::NoActiveTransaction
                | ScheduleError::TransactionInProgress
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ScheduleError::InvalidOperation(message.into())
    }
}

/// Result of one `execute` call on a leaf.
///
/// A leaf never blocks: every call returns exactly one of these, and `Running`
/// means "call me again next tick on the same instance".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TaskStatus {
    Running,
    Success,
    Failure,
}

/// A finished status. Selects which outgoing edge of a node is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TaskOutcome {
    Success,
    Failure,
}

impl From<TaskOutcome> for TaskStatus {
    fn from(value: TaskOutcome) -> Self {
        match value {
            TaskOutcome::Success => TaskStatus::Success,
            TaskOutcome::Failure => TaskStatus::Failure,
        }
    }
}

impl TaskStatus {
    pub fn outcome(self) -> Option<TaskOutcome> {
        match self {
            TaskStatus::Running => None,
            TaskStatus::Success => Some(TaskOutcome::Success),
            TaskStatus::Failure => Some(TaskOutcome::Failure),
        }
    }

    pub fn is_running(self) -> bool {
        self == TaskStatus::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failure",
        }
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Task list — the to-dos whose completion feeds the pet.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use pomopet_lms::Assignment;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DeskError, Result};

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task ID.
    pub id: TaskId,
    /// What to do.
    pub title: String,
    /// Due date, if any.
    pub due: Option<NaiveDate>,
    /// Course name for imported coursework.
    pub course: Option<String>,
    /// LMS-side ID for imported coursework; used to skip re-imports.
    pub external_id: Option<String>,
    /// When the task was added.
    pub created_at: DateTime<Utc>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether the task is done.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Ordered collection of tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task and return its ID.
    pub fn add(&mut self, title: impl Into<String>, due: Option<NaiveDate>) -> TaskId {
        let task = Task {
            id: TaskId::new(),
            title: title.into(),
            due,
            course: None,
            external_id: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let id = task.id;
        debug!(task = %id, title = %task.title, "Task added");
        self.tasks.push(task);
        id
    }

    /// Mark a task done.
    ///
    /// # Errors
    /// [`DeskError::UnknownTask`] or [`DeskError::TaskAlreadyDone`].
    pub fn complete(&mut self, id: TaskId) -> Result<&Task> {
        let task = self.get_mut(id)?;
        if task.is_done() {
            return Err(DeskError::TaskAlreadyDone(id));
        }
        task.completed_at = Some(Utc::now());
        info!(task = %id, title = %task.title, "Task completed");
        Ok(task)
    }

    /// Delete a task.
    ///
    /// # Errors
    /// [`DeskError::UnknownTask`].
    pub fn remove(&mut self, id: TaskId) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(DeskError::UnknownTask(id))?;
        Ok(self.tasks.remove(index))
    }

    /// Change a task's title.
    ///
    /// # Errors
    /// [`DeskError::UnknownTask`].
    pub fn rename(&mut self, id: TaskId, title: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.title = title.into();
        Ok(())
    }

    /// Look up a task.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Every task, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Number of tasks, done or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Open tasks.
    #[must_use]
    pub fn pending(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| !t.is_done()).collect()
    }

    /// Tasks (done or not) due on `date`.
    #[must_use]
    pub fn due_on(&self, date: NaiveDate) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.due == Some(date)).collect()
    }

    /// Open tasks whose due date is before `today`.
    #[must_use]
    pub fn overdue(&self, today: NaiveDate) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !t.is_done() && t.due.is_some_and(|due| due < today))
            .collect()
    }

    /// Add imported assignments, skipping any already on the list.
    ///
    /// Returns the number of new tasks.
    pub fn import<I>(&mut self, assignments: I) -> usize
    where
        I: IntoIterator<Item = Assignment>,
    {
        let mut added = 0;
        for assignment in assignments {
            let seen = self
                .tasks
                .iter()
                .any(|t| t.external_id.as_deref() == Some(assignment.external_id.as_str()));
            if seen {
                continue;
            }
            self.tasks.push(Task {
                id: TaskId::new(),
                title: assignment.title,
                due: assignment.due_at.map(|at| at.date_naive()),
                course: Some(assignment.course),
                external_id: Some(assignment.external_id),
                created_at: Utc::now(),
                completed_at: None,
            });
            added += 1;
        }
        info!(added, total = self.tasks.len(), "Assignments imported");
        added
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DeskError::UnknownTask(id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn assignment(id: &str, title: &str, due: Option<NaiveDate>) -> Assignment {
        Assignment {
            external_id: id.to_string(),
            course: "Physics".to_string(),
            title: title.to_string(),
            due_at: due.map(|d| {
                Utc.from_utc_datetime(&d.and_hms_opt(23, 59, 0).expect("valid time"))
            }),
        }
    }

    #[test]
    fn complete_is_once_only() {
        let mut tasks = TaskList::new();
        let id = tasks.add("Read chapter 4", None);
        assert!(tasks.complete(id).is_ok());
        assert!(matches!(tasks.complete(id), Err(DeskError::TaskAlreadyDone(_))));
        assert!(matches!(
            tasks.complete(TaskId::new()),
            Err(DeskError::UnknownTask(_))
        ));
        assert!(tasks.pending().is_empty());
    }

    #[test]
    fn rename_and_remove() {
        let mut tasks = TaskList::new();
        let id = tasks.add("Draft", None);
        tasks.rename(id, "Final draft").expect("rename");
        assert_eq!(tasks.get(id).map(|t| t.title.as_str()), Some("Final draft"));
        assert_eq!(tasks.remove(id).expect("remove").title, "Final draft");
        assert!(tasks.is_empty());
        assert!(tasks.remove(id).is_err());
    }

    #[test]
    fn due_and_overdue_queries() {
        let mut tasks = TaskList::new();
        let late = tasks.add("Lab report", Some(date(2026, 3, 1)));
        let done_late = tasks.add("Quiz", Some(date(2026, 3, 1)));
        tasks.add("Essay", Some(date(2026, 3, 5)));
        tasks.add("Someday", None);
        tasks.complete(done_late).expect("complete");

        let today = date(2026, 3, 3);
        let overdue: Vec<TaskId> = tasks.overdue(today).iter().map(|t| t.id).collect();
        assert_eq!(overdue, [late]);
        assert_eq!(tasks.due_on(date(2026, 3, 1)).len(), 2);
        assert_eq!(tasks.pending().len(), 3);
    }

    #[test]
    fn import_dedupes_by_external_id() {
        let mut tasks = TaskList::new();
        let batch = vec![
            assignment("canvas:1", "Problem Set 1", Some(date(2026, 3, 2))),
            assignment("canvas:2", "Problem Set 2", None),
        ];
        assert_eq!(tasks.import(batch.clone()), 2);
        assert_eq!(tasks.import(batch), 0);
        assert_eq!(
            tasks.import(vec![assignment("canvas:3", "Midterm", None)]),
            1
        );
        assert_eq!(tasks.len(), 3);

        let first = tasks.iter().next().expect("first");
        assert_eq!(first.due, Some(date(2026, 3, 2)));
        assert_eq!(first.course.as_deref(), Some("Physics"));
    }
}

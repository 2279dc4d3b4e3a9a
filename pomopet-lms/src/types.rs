//! Course and assignment types, plus the provider wire formats they are
//! decoded from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course the student is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Provider-side course ID.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// An assignment imported from the LMS, ready to become a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Stable ID used to dedupe repeated imports (e.g. `"canvas:4411"`).
    pub external_id: String,
    /// Name of the course the assignment belongs to.
    pub course: String,
    /// Assignment title.
    pub title: String,
    /// Due date, if the instructor set one.
    pub due_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Whether the assignment is due at or after `now`. Undated assignments
    /// count as upcoming.
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.due_at.is_none_or(|due| due >= now)
    }
}

// ---------------------------------------------------------------------------
// Canvas wire format
// ---------------------------------------------------------------------------

/// Course object as returned by `GET /api/v1/courses`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CanvasCourse {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
}

impl CanvasCourse {
    pub(crate) fn into_course(self) -> Course {
        let name = self
            .name
            .or(self.course_code)
            .unwrap_or_else(|| format!("Course {}", self.id));
        Course { id: self.id, name }
    }
}

/// Assignment object as returned by `GET /api/v1/courses/:id/assignments`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CanvasAssignment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

impl CanvasAssignment {
    pub(crate) fn into_assignment(self, course: &Course) -> Assignment {
        Assignment {
            external_id: format!("canvas:{}", self.id),
            course: course.name.clone(),
            title: self.name,
            due_at: self.due_at,
        }
    }
}

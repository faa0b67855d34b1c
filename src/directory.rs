//! Production directory lookups.
//!
//! The tracker application owns the real entity and permission data; this
//! service only needs existence checks and three permission primitives.
//! [`ProductionDirectory`] is the seam those lookups come through, and
//! [`InMemoryDirectory`] is the implementation used by tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use uuid::Uuid;

use crate::entity::EntityKind;

/// Minimal view of a domain entity, as needed by the picture workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRecord {
    /// Entity id.
    pub id: Uuid,
    /// Task the entity belongs to (preview files, working files).
    pub task_id: Option<Uuid>,
    /// Project the entity belongs to (projects, shots, assets).
    pub project_id: Option<Uuid>,
}

/// Minimal view of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRecord {
    /// Task id.
    pub id: Uuid,
    /// Project the task belongs to.
    pub project_id: Uuid,
}

/// Entity-existence and permission lookups provided by the tracker.
pub trait ProductionDirectory: Send + Sync {
    /// Look up an entity of the given kind. `None` means it does not exist.
    fn entity(&self, kind: EntityKind, id: Uuid) -> Option<EntityRecord>;

    /// Look up a task record.
    fn task(&self, id: Uuid) -> Option<TaskRecord>;

    /// Whether the actor has manager permissions.
    fn is_manager(&self, actor: Uuid) -> bool;

    /// Whether the actor is assigned to the given task.
    fn is_assigned_to_task(&self, actor: Uuid, task_id: Uuid) -> bool;

    /// Whether the actor is related to the given project.
    fn is_related_to_project(&self, actor: Uuid, project_id: Uuid) -> bool;
}

#[derive(Default)]
struct Inner {
    persons: HashSet<Uuid>,
    managers: HashSet<Uuid>,
    projects: HashSet<Uuid>,
    /// project id -> persons related to it
    members: HashMap<Uuid, HashSet<Uuid>>,
    /// task id -> (project id, assignees)
    tasks: HashMap<Uuid, (Uuid, HashSet<Uuid>)>,
    /// shot id -> project id
    shots: HashMap<Uuid, Uuid>,
    /// asset id -> project id
    assets: HashMap<Uuid, Uuid>,
    /// working file id -> task id
    working_files: HashMap<Uuid, Uuid>,
    /// preview file id -> task id
    preview_files: HashMap<Uuid, Uuid>,
}

/// In-memory production directory.
///
/// Holds the entity graph behind a `RwLock` so handlers can query it from
/// concurrent requests. A production deployment substitutes a directory
/// backed by the tracker database.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Inner>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a person.
    pub fn add_person(&self, id: Uuid) {
        self.inner.write().unwrap().persons.insert(id);
    }

    /// Register a person with manager permissions.
    pub fn add_manager(&self, id: Uuid) {
        let mut inner = self.inner.write().unwrap();
        inner.persons.insert(id);
        inner.managers.insert(id);
    }

    /// Register a project.
    pub fn add_project(&self, id: Uuid) {
        self.inner.write().unwrap().projects.insert(id);
    }

    /// Relate a person to a project.
    pub fn add_project_member(&self, project_id: Uuid, person_id: Uuid) {
        self.inner
            .write()
            .unwrap()
            .members
            .entry(project_id)
            .or_default()
            .insert(person_id);
    }

    /// Register a task within a project.
    pub fn add_task(&self, id: Uuid, project_id: Uuid) {
        self.inner
            .write()
            .unwrap()
            .tasks
            .insert(id, (project_id, HashSet::new()));
    }

    /// Assign a person to a task.
    pub fn assign_task(&self, task_id: Uuid, person_id: Uuid) {
        if let Some((_, assignees)) = self.inner.write().unwrap().tasks.get_mut(&task_id) {
            assignees.insert(person_id);
        }
    }

    /// Register a shot within a project.
    pub fn add_shot(&self, id: Uuid, project_id: Uuid) {
        self.inner.write().unwrap().shots.insert(id, project_id);
    }

    /// Register an asset within a project.
    pub fn add_asset(&self, id: Uuid, project_id: Uuid) {
        self.inner.write().unwrap().assets.insert(id, project_id);
    }

    /// Register a working file attached to a task.
    pub fn add_working_file(&self, id: Uuid, task_id: Uuid) {
        self.inner.write().unwrap().working_files.insert(id, task_id);
    }

    /// Register a preview file attached to a task.
    pub fn add_preview_file(&self, id: Uuid, task_id: Uuid) {
        self.inner.write().unwrap().preview_files.insert(id, task_id);
    }
}

impl ProductionDirectory for InMemoryDirectory {
    fn entity(&self, kind: EntityKind, id: Uuid) -> Option<EntityRecord> {
        let inner = self.inner.read().unwrap();
        match kind {
            EntityKind::Person => inner.persons.contains(&id).then_some(EntityRecord {
                id,
                task_id: None,
                project_id: None,
            }),
            EntityKind::Project => inner.projects.contains(&id).then_some(EntityRecord {
                id,
                task_id: None,
                project_id: Some(id),
            }),
            EntityKind::Shot => inner.shots.get(&id).map(|&project_id| EntityRecord {
                id,
                task_id: None,
                project_id: Some(project_id),
            }),
            EntityKind::Asset => inner.assets.get(&id).map(|&project_id| EntityRecord {
                id,
                task_id: None,
                project_id: Some(project_id),
            }),
            EntityKind::WorkingFile => {
                inner.working_files.get(&id).map(|&task_id| EntityRecord {
                    id,
                    task_id: Some(task_id),
                    project_id: None,
                })
            }
            EntityKind::PreviewFile => {
                inner.preview_files.get(&id).map(|&task_id| EntityRecord {
                    id,
                    task_id: Some(task_id),
                    project_id: None,
                })
            }
        }
    }

    fn task(&self, id: Uuid) -> Option<TaskRecord> {
        self.inner
            .read()
            .unwrap()
            .tasks
            .get(&id)
            .map(|&(project_id, _)| TaskRecord { id, project_id })
    }

    fn is_manager(&self, actor: Uuid) -> bool {
        self.inner.read().unwrap().managers.contains(&actor)
    }

    fn is_assigned_to_task(&self, actor: Uuid, task_id: Uuid) -> bool {
        self.inner
            .read()
            .unwrap()
            .tasks
            .get(&task_id)
            .is_some_and(|(_, assignees)| assignees.contains(&actor))
    }

    fn is_related_to_project(&self, actor: Uuid, project_id: Uuid) -> bool {
        self.inner
            .read()
            .unwrap()
            .members
            .get(&project_id)
            .is_some_and(|members| members.contains(&actor))
    }
}

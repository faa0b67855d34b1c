//! Per-entity-kind access decisions for picture upload and retrieval.
//!
//! The gate is a pure predicate over the actor and the entity's relations;
//! all role and assignment facts come from the production directory.
//! Existence must be checked before this gate runs, so denial (403) never
//! leaks whether an entity exists (404).

use uuid::Uuid;

use crate::directory::{EntityRecord, ProductionDirectory};
use crate::entity::EntityKind;

/// What the actor is trying to do with the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureAction {
    Upload,
    Retrieve,
}

/// Decide whether the actor may perform the action on the entity's picture.
///
/// Managers are always allowed. Otherwise:
/// - preview file upload: actor assigned to the file's task
/// - preview file retrieval: actor related to the task's project
/// - person upload: actor is that person; person retrieval: any actor
/// - project/shot/asset/working-file retrieval: actor related to the
///   entity's project
/// - project/shot/asset/working-file upload: managers only
pub fn allowed(
    directory: &dyn ProductionDirectory,
    kind: EntityKind,
    action: PictureAction,
    actor: Uuid,
    entity: &EntityRecord,
) -> bool {
    if directory.is_manager(actor) {
        return true;
    }

    match (kind, action) {
        (EntityKind::PreviewFile, PictureAction::Upload) => entity
            .task_id
            .is_some_and(|task| directory.is_assigned_to_task(actor, task)),
        (EntityKind::PreviewFile, PictureAction::Retrieve) => {
            related_to_entity_project(directory, actor, entity)
        }
        (EntityKind::Person, PictureAction::Upload) => actor == entity.id,
        (EntityKind::Person, PictureAction::Retrieve) => true,
        (_, PictureAction::Retrieve) => related_to_entity_project(directory, actor, entity),
        (_, PictureAction::Upload) => false,
    }
}

/// Resolve the entity's project (directly, or through its task) and check
/// the actor's relation to it.
fn related_to_entity_project(
    directory: &dyn ProductionDirectory,
    actor: Uuid,
    entity: &EntityRecord,
) -> bool {
    let project_id = entity.project_id.or_else(|| {
        entity
            .task_id
            .and_then(|task| directory.task(task))
            .map(|task| task.project_id)
    });
    project_id.is_some_and(|project| directory.is_related_to_project(actor, project))
}

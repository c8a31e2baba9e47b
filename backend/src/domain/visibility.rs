//! Visibility decisions for birthday fields.
//!
//! A member chooses who may see their birthday field; the engine honors
//! that choice when assembling results. Friend-level checks delegate to the
//! relationship collaborator and fail closed when it cannot answer.

use log::debug;
use shared::{ViewerContext, VisibilityLevel};

use crate::storage::traits::RelationshipStore;

/// Decide whether `viewer` may see a field the subject tagged with `level`.
///
/// Unrecognized custom levels are permissive; `onlyme` is always excluded
/// because this engine never runs on the subject's own behalf.
pub async fn is_visible(
    level: &VisibilityLevel,
    viewer: &ViewerContext,
    subject_id: &str,
    relationships: &dyn RelationshipStore,
) -> bool {
    match level {
        VisibilityLevel::Public => true,
        VisibilityLevel::LoggedIn => viewer.viewer_id.is_some(),
        VisibilityLevel::AdminsOnly => viewer.is_admin,
        VisibilityLevel::OnlyMe => false,
        VisibilityLevel::Friends => match &viewer.viewer_id {
            Some(viewer_id) => relationships
                .are_friends(viewer_id, subject_id)
                .await
                .unwrap_or(false),
            None => false,
        },
        VisibilityLevel::Other(tag) => {
            debug!("Treating unrecognized visibility level '{}' as visible", tag);
            true
        }
    }
}

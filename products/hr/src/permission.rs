use entity::employee;
use platform_authz::{Action, PolicyEngine, Resource, Viewer};

/// Whether `viewer` may edit `record`; drives the `allow_edit` output field
/// and gates updates.
pub fn has_permission_to_edit(viewer: &Viewer, record: &employee::Model) -> bool {
    PolicyEngine.allows(viewer, Action::Edit, Resource::authored_by(record.creator_id))
}

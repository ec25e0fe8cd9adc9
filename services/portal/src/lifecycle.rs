//! Project lifecycle state machine
//!
//! The status graph is `submitted → pending → approved → completed`, with
//! `rejected` reachable from the review states and `deleted` an
//! administrative soft delete from anywhere. Each edge names the role that
//! may trigger it; anything off the table is rejected outright.

use crate::error::ApiError;
use crate::models::{ProjectStatus, Role};

/// Who may trigger a given transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAuthority {
    /// Admin only
    Admin,
    /// Admin, or the mentor currently assigned to the project
    AdminOrAssignedMentor,
}

/// Look up the authority for a (from, to) edge; `None` means the edge does
/// not exist in the lifecycle
pub fn authority(from: ProjectStatus, to: ProjectStatus) -> Option<TransitionAuthority> {
    use ProjectStatus::*;

    match (from, to) {
        (Submitted, Pending) => Some(TransitionAuthority::Admin),
        (Pending, Approved) => Some(TransitionAuthority::AdminOrAssignedMentor),
        (Approved, Completed) => Some(TransitionAuthority::AdminOrAssignedMentor),
        (Submitted | Pending | Approved, Rejected) => {
            Some(TransitionAuthority::AdminOrAssignedMentor)
        }
        (_, Deleted) => Some(TransitionAuthority::Admin),
        _ => None,
    }
}

/// Validate that `role` may move a project from `from` to `to`
///
/// `is_assigned_mentor` must be the result of matching the project's
/// `mentor_id` against the requester; callers resolve it before invoking the
/// guard. A same-status "transition" is treated as an admin field edit and
/// allowed to pass through unchanged.
pub fn check_transition(
    from: ProjectStatus,
    to: ProjectStatus,
    role: Role,
    is_assigned_mentor: bool,
) -> Result<(), ApiError> {
    if from == to {
        return match role {
            Role::Admin => Ok(()),
            Role::Mentor if is_assigned_mentor => Ok(()),
            _ => Err(ApiError::Forbidden),
        };
    }

    let authority = authority(from, to).ok_or_else(|| {
        ApiError::InvalidArgument(format!(
            "invalid status transition: {:?} -> {:?}",
            from, to
        ))
    })?;

    match (authority, role) {
        (TransitionAuthority::Admin, Role::Admin) => Ok(()),
        (TransitionAuthority::AdminOrAssignedMentor, Role::Admin) => Ok(()),
        (TransitionAuthority::AdminOrAssignedMentor, Role::Mentor) if is_assigned_mentor => Ok(()),
        (_, Role::Mentor) => Err(crate::authz::mentor_scope_error()),
        _ => Err(ApiError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProjectStatus::*;

    #[test]
    fn test_happy_path_edges_exist() {
        assert_eq!(authority(Submitted, Pending), Some(TransitionAuthority::Admin));
        assert_eq!(
            authority(Pending, Approved),
            Some(TransitionAuthority::AdminOrAssignedMentor)
        );
        assert_eq!(
            authority(Approved, Completed),
            Some(TransitionAuthority::AdminOrAssignedMentor)
        );
    }

    #[test]
    fn test_rejection_reachable_from_review_states() {
        for from in [Submitted, Pending, Approved] {
            assert_eq!(
                authority(from, Rejected),
                Some(TransitionAuthority::AdminOrAssignedMentor)
            );
        }
        assert_eq!(authority(Completed, Rejected), None);
        assert_eq!(authority(Rejected, Rejected), None);
    }

    #[test]
    fn test_deletion_reachable_from_any_state_admin_only() {
        for from in [Submitted, Pending, Approved, Rejected, Completed] {
            assert_eq!(authority(from, Deleted), Some(TransitionAuthority::Admin));
            assert!(check_transition(from, Deleted, Role::Admin, false).is_ok());
            assert!(check_transition(from, Deleted, Role::Mentor, true).is_err());
        }
    }

    #[test]
    fn test_unlisted_edges_rejected() {
        assert!(matches!(
            check_transition(Submitted, Approved, Role::Admin, false),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            check_transition(Completed, Pending, Role::Admin, false),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            check_transition(Rejected, Approved, Role::Admin, false),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_assigned_mentor_may_approve_and_complete() {
        assert!(check_transition(Pending, Approved, Role::Mentor, true).is_ok());
        assert!(check_transition(Approved, Completed, Role::Mentor, true).is_ok());
        assert!(check_transition(Pending, Rejected, Role::Mentor, true).is_ok());
    }

    #[test]
    fn test_unassigned_mentor_gets_conflated_not_found() {
        let err = check_transition(Pending, Approved, Role::Mentor, false).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_mentor_cannot_move_submitted_to_pending() {
        // That edge is admin-only even for the assigned mentor
        assert!(check_transition(Submitted, Pending, Role::Mentor, true).is_err());
    }

    #[test]
    fn test_students_forbidden_everywhere() {
        assert!(matches!(
            check_transition(Pending, Approved, Role::Student, false),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_same_status_passthrough_for_admin_field_edits() {
        assert!(check_transition(Pending, Pending, Role::Admin, false).is_ok());
        assert!(check_transition(Pending, Pending, Role::Mentor, true).is_ok());
        assert!(check_transition(Pending, Pending, Role::Student, false).is_err());
    }
}

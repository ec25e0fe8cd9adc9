//! Authorization gate
//!
//! Single capability check evaluated before any mutation. Route handlers
//! call [`can_perform`] once with the authenticated user, the action class,
//! and the user's relation to the resource; they never re-derive role checks
//! inline. Mentor- and author-scoped denials come back as the conflated
//! not-found shape so existence is never leaked.

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::Role;

/// Authenticated identity attached to every request by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Action classes the gate decides over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// View a project's detail or its comments
    ReadProject,
    /// Create a new project (initiator becomes the team leader)
    CreateProject,
    /// Transition a project's lifecycle status
    UpdateStatus,
    /// Administrative field edits (projects, comments), roster changes, and
    /// mentor assignment
    UpdateFields,
    /// Soft-delete a project
    DeleteProject,
    /// Administrative listings (all projects, all users including banned)
    AdminRead,
    /// Add a comment to a project
    CreateComment,
    /// Soft-delete a comment
    DeleteComment,
    /// List or update user accounts
    ManageUsers,
}

/// The requesting user's relationship to the resource under action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Holds a membership row on the project
    TeamMember,
    /// Is the project's currently assigned mentor
    AssignedMentor,
    /// Authored the comment
    CommentAuthor,
    /// No relationship
    None,
}

/// The conflated failure for mentor-scoped operations; deliberately does not
/// distinguish "project doesn't exist" from "project isn't yours"
pub fn mentor_scope_error() -> ApiError {
    ApiError::NotFound("project not found or mentor not authorized".to_string())
}

/// The conflated failure for author-scoped comment deletion
pub fn comment_scope_error() -> ApiError {
    ApiError::NotFound("comment not found or user not authorized to delete".to_string())
}

/// Decide whether `user` may perform `action` given its `relation` to the
/// resource
pub fn can_perform(user: &AuthUser, action: Action, relation: Relation) -> Result<(), ApiError> {
    match action {
        // Any authenticated user may read project details and comments;
        // listings are scoped per role at the query level.
        Action::ReadProject | Action::CreateComment => Ok(()),

        Action::CreateProject => match user.role {
            Role::Student => Ok(()),
            _ => Err(ApiError::Forbidden),
        },

        Action::UpdateStatus => match (user.role, relation) {
            (Role::Admin, _) => Ok(()),
            (Role::Mentor, Relation::AssignedMentor) => Ok(()),
            (Role::Mentor, _) => Err(mentor_scope_error()),
            (Role::Student, _) => Err(ApiError::Forbidden),
        },

        // General field edits, roster changes, and mentor assignment are
        // administrative.
        Action::UpdateFields | Action::DeleteProject | Action::AdminRead | Action::ManageUsers => {
            match user.role {
                Role::Admin => Ok(()),
                _ => Err(ApiError::Forbidden),
            }
        }

        // Author-only, with no admin override on this path; the admin
        // comment-update route is a distinct channel.
        Action::DeleteComment => match relation {
            Relation::CommentAuthor => Ok(()),
            _ => Err(comment_scope_error()),
        },
    }
}

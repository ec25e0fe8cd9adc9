//! Portal service models

pub mod comment;
pub mod project;
pub mod user;

// Re-export for convenience
pub use comment::{Comment, CommentStatus, NewComment, UpdateComment};
pub use project::{
    MemberIdentity, NewProject, Project, ProjectDetail, ProjectMember, ProjectStatus,
    StatusUpdate, UpdateProject, UserIdentity,
};
pub use user::{LoginCredentials, NewUser, Role, UpdateUser, User, UserStatus};

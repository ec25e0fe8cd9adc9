//! Repositories for database operations

pub mod comment;
pub mod project;
pub mod user;

pub use comment::CommentRepository;
pub use project::ProjectRepository;
pub use user::UserRepository;

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod character_repo;
pub mod scene_repo;
pub mod story_repo;
pub mod user_repo;

pub use character_repo::CharacterRepo;
pub use scene_repo::SceneRepo;
pub use story_repo::StoryRepo;
pub use user_repo::UserRepo;

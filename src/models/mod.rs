pub mod invitation;
pub mod note;
pub mod project;
pub mod role;
pub mod task;
pub mod user;

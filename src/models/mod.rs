pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskInput, TaskStatus, UpdateOutcome};
pub use user::{Credentials, NewUser, User};

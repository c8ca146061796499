pub mod container;
pub mod info;
pub mod job;
pub mod policy;
pub mod protection;
pub mod recovery_point;

pub use container::handle_container_command;
pub use info::{run_api_info, run_providers};
pub use job::handle_job_command;
pub use policy::handle_policy_command;
pub use protection::{handle_protection_command, resolve_item, run_backup, run_restore};
pub use recovery_point::handle_recovery_point_command;

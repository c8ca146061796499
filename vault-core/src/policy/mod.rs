//! 备份策略模型：保留层级、备份计划、校验与服务端格式转换

pub mod converter;
pub mod retention;
pub mod schedule;
pub mod types;
pub mod validator;
pub mod wire;

// 重新导出公共接口
pub use converter::{policy_from_resource, policy_to_resource, to_domain, to_wire_retention, to_wire_schedule};
pub use retention::{RetentionPolicy, RetentionRule, RetentionSelector};
pub use schedule::{BackupSchedule, build_schedule, resolve_schedule_type};
pub use types::{DayOfWeek, DurationType, Month, RetentionFormat, RetentionType, ScheduleType, WeekNumber};
pub use validator::{NameRules, PolicyValidator, RetentionLimits};

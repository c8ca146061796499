//! 策略模型使用的枚举类型
//!
//! 线上格式统一使用 PascalCase 名称，解析时忽略大小写。

use crate::error::VaultError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 为枚举生成 `as_str` / `Display` / 忽略大小写的 `FromStr`
macro_rules! named_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = VaultError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        VaultError::invalid_argument($field, format!("无法识别的取值: {s}"))
                    })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

named_enum!(DayOfWeek, "DaysOfWeek", {
    Sunday => "Sunday",
    Monday => "Monday",
    Tuesday => "Tuesday",
    Wednesday => "Wednesday",
    Thursday => "Thursday",
    Friday => "Friday",
    Saturday => "Saturday",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

named_enum!(Month, "MonthsOfYear", {
    January => "January",
    February => "February",
    March => "March",
    April => "April",
    May => "May",
    June => "June",
    July => "July",
    August => "August",
    September => "September",
    October => "October",
    November => "November",
    December => "December",
});

/// 月内第几周
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekNumber {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

named_enum!(WeekNumber, "WeeksOfTheMonth", {
    First => "First",
    Second => "Second",
    Third => "Third",
    Fourth => "Fourth",
    Last => "Last",
});

/// 备份计划重复方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleType {
    Daily,
    Weekly,
}

named_enum!(ScheduleType, "ScheduleRunFrequency", {
    Daily => "Daily",
    Weekly => "Weekly",
});

/// 保留层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RetentionType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

named_enum!(RetentionType, "RetentionType", {
    Daily => "Daily",
    Weekly => "Weekly",
    Monthly => "Monthly",
    Yearly => "Yearly",
});

/// 月/年保留的日期选择方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetentionFormat {
    Daily,
    Weekly,
}

named_enum!(RetentionFormat, "RetentionScheduleType", {
    Daily => "Daily",
    Weekly => "Weekly",
});

/// 保留时长单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationType {
    Days,
    Weeks,
    Months,
    Years,
}

named_enum!(DurationType, "DurationType", {
    Days => "Days",
    Weeks => "Weeks",
    Months => "Months",
    Years => "Years",
});

impl RetentionType {
    /// 该层级在线上格式中的时长单位
    pub fn duration_type(&self) -> DurationType {
        match self {
            RetentionType::Daily => DurationType::Days,
            RetentionType::Weekly => DurationType::Weeks,
            RetentionType::Monthly => DurationType::Months,
            RetentionType::Yearly => DurationType::Years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!(" FRIDAY ".parse::<DayOfWeek>().unwrap(), DayOfWeek::Friday);
        assert_eq!("last".parse::<WeekNumber>().unwrap(), WeekNumber::Last);
        assert_eq!("weekly".parse::<ScheduleType>().unwrap(), ScheduleType::Weekly);
    }

    #[test]
    fn test_unknown_name_reports_field() {
        let err = "Funday".parse::<DayOfWeek>().unwrap_err();
        match err {
            VaultError::InvalidArgument { field, .. } => assert_eq!(field, "DaysOfWeek"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serde_uses_pascal_case_names() {
        let json = serde_json::to_string(&vec![Month::January, Month::December]).unwrap();
        assert_eq!(json, r#"["January","December"]"#);
        let unit: DurationType = serde_json::from_str(r#""Weeks""#).unwrap();
        assert_eq!(unit, RetentionType::Weekly.duration_type());
    }
}

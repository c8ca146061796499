use super::types::{DayOfWeek, Month, RetentionFormat, RetentionType, WeekNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单层保留策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetentionPolicy {
    /// 保留数量，单位由层级决定（天/周/月/年）
    pub retention: u32,
    /// 与备份计划运行时间保持一致
    #[serde(default)]
    pub retention_times: Vec<DateTime<Utc>>,
    #[serde(flatten)]
    pub rule: RetentionRule,
}

/// 各层级特有的日期规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "RetentionType", rename_all = "PascalCase")]
pub enum RetentionRule {
    Daily,
    Weekly {
        #[serde(rename = "DaysOfWeek")]
        days_of_week: Vec<DayOfWeek>,
    },
    Monthly {
        #[serde(rename = "Selector")]
        selector: RetentionSelector,
    },
    Yearly {
        #[serde(rename = "MonthsOfYear")]
        months_of_year: Vec<Month>,
        #[serde(rename = "Selector")]
        selector: RetentionSelector,
    },
}

/// 月/年保留的日期选择
///
/// `Daily` 按月内日期选择，29 代表当月最后一天；
/// `Weekly` 按"第几周的星期几"选择。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "RetentionFormat", rename_all = "PascalCase")]
pub enum RetentionSelector {
    Daily {
        #[serde(rename = "DaysOfMonth")]
        days_of_month: Vec<u8>,
    },
    Weekly {
        #[serde(rename = "WeekNumber")]
        week_numbers: Vec<WeekNumber>,
        #[serde(rename = "DaysOfWeek")]
        days_of_week: Vec<DayOfWeek>,
    },
}

impl RetentionSelector {
    pub fn format(&self) -> RetentionFormat {
        match self {
            RetentionSelector::Daily { .. } => RetentionFormat::Daily,
            RetentionSelector::Weekly { .. } => RetentionFormat::Weekly,
        }
    }
}

impl RetentionPolicy {
    pub fn daily(retention: u32) -> Self {
        Self {
            retention,
            retention_times: Vec::new(),
            rule: RetentionRule::Daily,
        }
    }

    pub fn weekly(retention: u32, days_of_week: Vec<DayOfWeek>) -> Self {
        Self {
            retention,
            retention_times: Vec::new(),
            rule: RetentionRule::Weekly { days_of_week },
        }
    }

    pub fn monthly(retention: u32, selector: RetentionSelector) -> Self {
        Self {
            retention,
            retention_times: Vec::new(),
            rule: RetentionRule::Monthly { selector },
        }
    }

    pub fn yearly(retention: u32, months_of_year: Vec<Month>, selector: RetentionSelector) -> Self {
        Self {
            retention,
            retention_times: Vec::new(),
            rule: RetentionRule::Yearly {
                months_of_year,
                selector,
            },
        }
    }

    pub fn with_times(mut self, times: Vec<DateTime<Utc>>) -> Self {
        self.retention_times = times;
        self
    }

    pub fn retention_type(&self) -> RetentionType {
        match self.rule {
            RetentionRule::Daily => RetentionType::Daily,
            RetentionRule::Weekly { .. } => RetentionType::Weekly,
            RetentionRule::Monthly { .. } => RetentionType::Monthly,
            RetentionRule::Yearly { .. } => RetentionType::Yearly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_type_follows_rule() {
        let policies = vec![
            RetentionPolicy::daily(30),
            RetentionPolicy::weekly(4, vec![DayOfWeek::Sunday]),
            RetentionPolicy::monthly(
                12,
                RetentionSelector::Daily {
                    days_of_month: vec![1, 29],
                },
            ),
        ];

        let types: Vec<_> = policies.iter().map(|p| p.retention_type()).collect();
        assert_eq!(
            types,
            vec![
                RetentionType::Daily,
                RetentionType::Weekly,
                RetentionType::Monthly
            ]
        );
    }

    #[test]
    fn test_json_shape_is_tagged() {
        let policy = RetentionPolicy::yearly(
            5,
            vec![Month::March],
            RetentionSelector::Weekly {
                week_numbers: vec![WeekNumber::Last],
                days_of_week: vec![DayOfWeek::Friday],
            },
        );

        let value = serde_json::to_value(&policy).unwrap();
        assert_eq!(value["RetentionType"], "Yearly");
        assert_eq!(value["Retention"], 5);
        assert_eq!(value["Selector"]["RetentionFormat"], "Weekly");

        let back: RetentionPolicy = serde_json::from_value(value).unwrap();
        assert_eq!(back, policy);
    }
}

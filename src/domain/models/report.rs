// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 调度定义错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// 时间格式错误（期望 HH:MM）
    #[error("invalid time of day: {0}")]
    InvalidTime(String),
    /// 未知频率
    #[error("invalid schedule frequency: {0}")]
    InvalidFrequency(String),
    /// 未知调度类型
    #[error("invalid schedule type: {0}")]
    InvalidScheduleType(String),
    /// 周期内日期超出范围
    #[error("day {day} is out of range for {frequency} schedule")]
    DayOutOfRange { frequency: Frequency, day: i32 },
    /// 定时报告缺少频率或时间
    #[error("scheduled report is missing {0}")]
    Incomplete(&'static str),
    /// 报告不是定时报告
    #[error("report is not scheduled")]
    NotScheduled,
    /// 未知的民用时区
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
    /// 触发时间超出可表示范围
    #[error("next occurrence is out of the representable date range")]
    OutOfRange,
}

/// 调度类型
///
/// 手动报告永远不会被扫描器选中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    Manual,
    Scheduled,
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleType::Manual => write!(f, "manual"),
            ScheduleType::Scheduled => write!(f, "scheduled"),
        }
    }
}

impl FromStr for ScheduleType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ScheduleType::Manual),
            "scheduled" => Ok(ScheduleType::Scheduled),
            other => Err(ScheduleError::InvalidScheduleType(other.to_string())),
        }
    }
}

/// 重复频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(ScheduleError::InvalidFrequency(other.to_string())),
        }
    }
}

/// 民用时区中的时刻（时:分）
///
/// 存储格式为 `HH:MM`，读取时容忍末尾的 `:SS` 并忽略秒
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    /// 创建新的时刻
    ///
    /// # 参数
    ///
    /// * `hour` - 小时 (0-23)
    /// * `minute` - 分钟 (0-59)
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime(format!(
                "{:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// 自午夜起的分钟数
    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_string());
        let mut parts = s.trim().split(':');

        let hour = parts
            .next()
            .and_then(|h| h.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minute = parts
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(invalid)?;

        // Seconds are accepted for legacy rows but carry no meaning
        if let Some(seconds) = parts.next() {
            if seconds.parse::<u32>().map(|s| s > 59).unwrap_or(true) {
                return Err(invalid());
            }
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// 经过校验的重复规则
///
/// `day_of_period` 对每周调度为星期几（0 = 周日），
/// 对每月调度为月中日期（1-31），每日调度为 `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    pub time_of_day: TimeOfDay,
    pub day_of_period: Option<u32>,
}

impl Schedule {
    /// 创建并校验重复规则
    ///
    /// 每周/每月调度缺省日期时按 1 处理（周一 / 每月 1 日）
    ///
    /// # 参数
    ///
    /// * `frequency` - 重复频率
    /// * `time_of_day` - 民用时区中的触发时刻
    /// * `day_of_period` - 周期内日期
    ///
    /// # 返回值
    ///
    /// * `Ok(Schedule)` - 合法的规则
    /// * `Err(ScheduleError)` - 日期超出范围
    pub fn new(
        frequency: Frequency,
        time_of_day: TimeOfDay,
        day_of_period: Option<i32>,
    ) -> Result<Self, ScheduleError> {
        let day_of_period = match frequency {
            Frequency::Daily => None,
            Frequency::Weekly => {
                let day = day_of_period.unwrap_or(1);
                if !(0..=6).contains(&day) {
                    return Err(ScheduleError::DayOutOfRange { frequency, day });
                }
                Some(day as u32)
            }
            Frequency::Monthly => {
                let day = day_of_period.unwrap_or(1);
                if !(1..=31).contains(&day) {
                    return Err(ScheduleError::DayOutOfRange { frequency, day });
                }
                Some(day as u32)
            }
        };

        Ok(Self {
            frequency,
            time_of_day,
            day_of_period,
        })
    }

    pub fn daily(time_of_day: TimeOfDay) -> Self {
        Self {
            frequency: Frequency::Daily,
            time_of_day,
            day_of_period: None,
        }
    }

    /// 每周调度，`weekday` 以 0 表示周日
    pub fn weekly(weekday: u32, time_of_day: TimeOfDay) -> Result<Self, ScheduleError> {
        Self::new(Frequency::Weekly, time_of_day, Some(weekday as i32))
    }

    pub fn monthly(day: u32, time_of_day: TimeOfDay) -> Result<Self, ScheduleError> {
        Self::new(Frequency::Monthly, time_of_day, Some(day as i32))
    }
}

/// 定时报告
///
/// 字段与持久化列一一对应，调度相关字段保留原始形式，
/// 通过 [`ScheduledReport::schedule`] 解析为经过校验的规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledReport {
    /// 报告ID
    pub id: Uuid,
    /// 创建者（所有者）ID
    pub owner_id: Uuid,
    /// 团队报告的实际创建者
    pub created_by_user_id: Option<Uuid>,
    /// 标题
    pub title: String,
    /// 发送给生成服务的提示词
    pub prompt: String,
    pub schedule_type: ScheduleType,
    /// 原始频率字符串
    pub schedule_frequency: Option<String>,
    /// 原始时间字符串（HH:MM）
    pub schedule_time: Option<String>,
    /// 原始周期内日期
    pub schedule_day: Option<i32>,
    pub is_active: bool,
    pub is_team_report: bool,
    /// 上次触发时间
    pub last_fired_at: Option<DateTime<Utc>>,
    /// 下次触发时间，`None` 表示当前未调度
    pub next_fire_at: Option<DateTime<Utc>>,
    /// 租约到期时间
    pub claimed_until: Option<DateTime<Utc>>,
    /// 租约令牌
    pub claim_token: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduledReport {
    /// 创建新的手动报告
    ///
    /// # 参数
    ///
    /// * `owner_id` - 所有者ID
    /// * `title` - 标题
    /// * `prompt` - 提示词
    pub fn new(owner_id: Uuid, title: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            created_by_user_id: None,
            title: title.into(),
            prompt: prompt.into(),
            schedule_type: ScheduleType::Manual,
            schedule_frequency: None,
            schedule_time: None,
            schedule_day: None,
            is_active: true,
            is_team_report: false,
            last_fired_at: None,
            next_fire_at: None,
            claimed_until: None,
            claim_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置重复规则并切换为定时报告
    pub fn with_schedule(mut self, schedule: &Schedule) -> Self {
        self.schedule_type = ScheduleType::Scheduled;
        self.schedule_frequency = Some(schedule.frequency.to_string());
        self.schedule_time = Some(schedule.time_of_day.to_string());
        self.schedule_day = schedule.day_of_period.map(|d| d as i32);
        self
    }

    /// 解析并校验报告的重复规则
    ///
    /// # 返回值
    ///
    /// * `Ok(Schedule)` - 合法的规则
    /// * `Err(ScheduleError)` - 报告不是定时报告或字段非法
    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        if self.schedule_type != ScheduleType::Scheduled {
            return Err(ScheduleError::NotScheduled);
        }

        let frequency: Frequency = self
            .schedule_frequency
            .as_deref()
            .ok_or(ScheduleError::Incomplete("schedule_frequency"))?
            .parse()?;
        let time_of_day: TimeOfDay = self
            .schedule_time
            .as_deref()
            .ok_or(ScheduleError::Incomplete("schedule_time"))?
            .parse()?;

        Schedule::new(frequency, time_of_day, self.schedule_day)
    }

    /// 报告当前是否由扫描器负责
    pub fn is_dispatchable(&self) -> bool {
        self.is_active && self.schedule_type == ScheduleType::Scheduled
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;

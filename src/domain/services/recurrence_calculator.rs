// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::report::{Frequency, Schedule, ScheduleError};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

/// 缺省民用时区
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// 候选日期解析不到合法时刻时，最多向后推进的周期数
const MAX_PERIOD_ADVANCES: usize = 4;

/// 重复规则计算器
///
/// 将重复规则和参考时刻映射为下一次触发的 UTC 时刻。
/// 所有调用方（调度、补齐首次触发时间、预览接口）共用同一个实现。
///
/// 夏令时处理：
/// - 不存在的本地时刻（春季跳变）按跳变前的偏移解释，即顺延跳变时长
/// - 重复的本地时刻（秋季回拨）只在最早的映射触发一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceCalculator {
    tz: Tz,
}

impl Default for RecurrenceCalculator {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
        }
    }
}

impl RecurrenceCalculator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// 根据 IANA 时区名创建计算器
    ///
    /// # 参数
    ///
    /// * `name` - 时区名，例如 `America/New_York`
    ///
    /// # 返回值
    ///
    /// * `Ok(RecurrenceCalculator)` - 计算器
    /// * `Err(ScheduleError)` - 时区名未知
    pub fn from_name(name: &str) -> Result<Self, ScheduleError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// 计算下一次触发时刻
    ///
    /// 纯函数，结果总是严格晚于 `reference`
    ///
    /// # 参数
    ///
    /// * `schedule` - 重复规则
    /// * `reference` - 参考时刻（通常为当前时间）
    ///
    /// # 返回值
    ///
    /// * `Ok(DateTime<Utc>)` - 下一次触发时刻
    /// * `Err(ScheduleError)` - 日期超出可表示范围
    pub fn next_fire_instant(
        &self,
        schedule: &Schedule,
        reference: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let local = reference.with_timezone(&self.tz);
        let today = local.date_naive();
        let current_minutes = local.hour() * 60 + local.minute();
        let elapsed = schedule.time_of_day.minutes_since_midnight() <= current_minutes;

        let time = schedule.time_of_day.to_naive_time();
        let mut target = self.target_date(schedule, today, elapsed)?;

        for _ in 0..MAX_PERIOD_ADVANCES {
            if let Some(instant) = self.resolve(target, time, reference) {
                return Ok(instant);
            }
            target = self.following_date(schedule, target)?;
        }

        Err(ScheduleError::OutOfRange)
    }

    /// 从 `from` 开始连续计算 `count` 个触发时刻
    pub fn upcoming(
        &self,
        schedule: &Schedule,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
        let mut instants = Vec::with_capacity(count);
        let mut reference = from;
        for _ in 0..count {
            let next = self.next_fire_instant(schedule, reference)?;
            instants.push(next);
            reference = next;
        }
        Ok(instants)
    }

    /// 将 UTC 时刻转换为民用时区时刻
    pub fn to_civil(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    fn target_date(
        &self,
        schedule: &Schedule,
        today: NaiveDate,
        elapsed: bool,
    ) -> Result<NaiveDate, ScheduleError> {
        match schedule.frequency {
            Frequency::Daily => {
                if elapsed {
                    add_days(today, 1)
                } else {
                    Ok(today)
                }
            }
            Frequency::Weekly => {
                let wanted = schedule.day_of_period.unwrap_or(1) % 7;
                let current = today.weekday().num_days_from_sunday();
                let mut ahead = (wanted + 7 - current) % 7;
                if ahead == 0 && elapsed {
                    ahead = 7;
                }
                add_days(today, ahead as i64)
            }
            Frequency::Monthly => {
                let wanted = schedule.day_of_period.unwrap_or(1);
                // Compare against the day clamped to this month, so day 31 on
                // the 30th of a 30-day month is "today", not a past date.
                let this_month = clamp_day(today.year(), today.month(), wanted)?;
                if today.day() > this_month || (today.day() == this_month && elapsed) {
                    let (year, month) = next_month(today.year(), today.month());
                    ymd(year, month, clamp_day(year, month, wanted)?)
                } else {
                    ymd(today.year(), today.month(), this_month)
                }
            }
        }
    }

    fn following_date(
        &self,
        schedule: &Schedule,
        date: NaiveDate,
    ) -> Result<NaiveDate, ScheduleError> {
        match schedule.frequency {
            Frequency::Daily => add_days(date, 1),
            Frequency::Weekly => add_days(date, 7),
            Frequency::Monthly => {
                let wanted = schedule.day_of_period.unwrap_or(1);
                let (year, month) = next_month(date.year(), date.month());
                ymd(year, month, clamp_day(year, month, wanted)?)
            }
        }
    }

    /// 将民用日期和时刻解析为严格晚于 `reference` 的 UTC 时刻
    ///
    /// 重复的本地时刻只取最早的映射；该映射已不晚于 `reference` 时
    /// 这一次民用触发视为已发生，返回 `None` 由调用方推进到下一周期
    fn resolve(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        reference: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let naive = date.and_time(time);
        let instant = match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(first, second) => {
                first.with_timezone(&Utc).min(second.with_timezone(&Utc))
            }
            LocalResult::None => self.shift_over_gap(naive)?,
        };
        Some(instant).filter(|instant| *instant > reference)
    }

    /// 用跳变前的偏移解释落在春季跳变空隙中的本地时刻
    fn shift_over_gap(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        let before = (1..=24).find_map(|hours| {
            self.tz
                .from_local_datetime(&(naive - Duration::hours(hours)))
                .earliest()
        })?;
        let offset = before.offset().fix().local_minus_utc() as i64;
        Some((naive - Duration::seconds(offset)).and_utc())
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ScheduleError::OutOfRange)
}

fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, ScheduleError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or(ScheduleError::OutOfRange)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> Result<u32, ScheduleError> {
    let (following_year, following_month) = next_month(year, month);
    ymd(following_year, following_month, 1)?
        .pred_opt()
        .map(|last| last.day())
        .ok_or(ScheduleError::OutOfRange)
}

fn clamp_day(year: i32, month: u32, wanted: u32) -> Result<u32, ScheduleError> {
    Ok(wanted.clamp(1, days_in_month(year, month)?))
}

#[cfg(test)]
#[path = "recurrence_calculator_test.rs"]
mod tests;

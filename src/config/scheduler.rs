//! Periodic task schedule

use chrono::Duration;
use serde::Serialize;
use tracing::info;

use super::file::ConfStore;
use crate::utils::error::AppResult;

/// Schedule entry name for the change queue reminder
pub const CHANGE_QUEUE_REMINDER: &str = "send-change-queue-reminder-email";
/// Task sending the change queue reminder email
pub const CHANGE_QUEUE_TASK: &str = "cred.tasks.change_queue_emails";

/// A periodic task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    /// Entry name
    pub name: String,
    /// Task to run
    pub task: String,
    /// Interval in days
    pub period_days: u32,
}

impl ScheduleEntry {
    /// Recurrence interval
    pub fn period(&self) -> Duration {
        Duration::days(i64::from(self.period_days))
    }
}

/// Task queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerSettings {
    pub broker_url: String,
    pub task_serializer: String,
    pub accept_content: Vec<String>,
    pub result_backend: String,
    /// Time zone used to evaluate schedules
    pub timezone: String,
    pub schedule: Vec<ScheduleEntry>,
}

impl SchedulerSettings {
    /// Read `[scheduler]`; the reminder period is required
    pub fn from_store(store: &ConfStore, timezone: &str) -> AppResult<Self> {
        let reminder_days: i64 = store.get_int("scheduler", "change_queue_reminder_period")?;

        let mut schedule = Vec::new();
        if reminder_days > 0 {
            info!("Change queue reminder every {} days", reminder_days);
            schedule.push(ScheduleEntry {
                name: CHANGE_QUEUE_REMINDER.to_string(),
                task: CHANGE_QUEUE_TASK.to_string(),
                period_days: u32::try_from(reminder_days).unwrap_or(u32::MAX),
            });
        }

        Ok(Self {
            broker_url: "django://".to_string(),
            task_serializer: "json".to_string(),
            accept_content: vec!["json".to_string()],
            result_backend: "djcelery.backends.database:DatabaseBackend".to_string(),
            timezone: timezone.to_string(),
            schedule,
        })
    }

    /// Look up an entry by name
    pub fn entry(&self, name: &str) -> Option<&ScheduleEntry> {
        self.schedule.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;

    fn scheduler(period: &str) -> AppResult<SchedulerSettings> {
        let ini = format!("[scheduler]\nchange_queue_reminder_period = {}\n", period);
        let store = ConfStore::from_ini_layers(&[&ini]).unwrap();
        SchedulerSettings::from_store(&store, "UTC")
    }

    #[test]
    fn test_zero_period_has_no_entry() {
        assert!(scheduler("0").unwrap().schedule.is_empty());
        assert!(scheduler("-3").unwrap().schedule.is_empty());
    }

    #[test]
    fn test_positive_period_creates_one_entry() {
        let settings = scheduler("7").unwrap();
        assert_eq!(settings.schedule.len(), 1);
        let entry = settings.entry(CHANGE_QUEUE_REMINDER).unwrap();
        assert_eq!(entry.task, CHANGE_QUEUE_TASK);
        assert_eq!(entry.period(), Duration::days(7));
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_missing_or_malformed_period() {
        let store = ConfStore::from_ini_layers(&["[scheduler]\n"]).unwrap();
        assert!(matches!(
            SchedulerSettings::from_store(&store, "UTC"),
            Err(AppError::MissingOption { .. })
        ));
        assert!(matches!(scheduler("weekly"), Err(AppError::InvalidInt { .. })));
    }
}

//! Caregiver dashboard summary, and the content of the mom display's
//! dashboard screen.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::Result;
use crate::hub::FamilyHub;
use crate::model::{
    DoseLog, Event, FamilyId, Medication, MemberId, Message, ShoppingItem, ShoppingStatus, Task,
    TimeWindow,
};
use crate::storage::Storage;

/// Days ahead the mom display looks for events.
const UPCOMING_DAYS: i64 = 7;

/// Most events shown on the mom display.
const UPCOMING_LIMIT: usize = 5;

/// Dose progress for one part of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowProgress {
    /// Part of the day.
    pub window: TimeWindow,
    /// Doses given, on time or late.
    pub taken: usize,
    /// Active medications due in the window.
    pub scheduled: usize,
}

impl WindowProgress {
    /// Whether every scheduled dose was given.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.taken >= self.scheduled
    }
}

/// The member on duty for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnDuty {
    /// Member id.
    pub member_id: MemberId,
    /// First name shown on screens.
    pub first_name: String,
    /// Rotation note.
    pub note: Option<String>,
}

/// Counts shown at the top of the caregiver dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareSummary {
    /// Day the dose counts refer to.
    pub date: NaiveDate,
    /// One entry per time window, morning first.
    pub doses: Vec<WindowProgress>,
    /// Window whose doses are due now, if any.
    pub current_window: Option<TimeWindow>,
    /// Medications of the current window not yet given.
    pub due_now: Vec<Medication>,
    /// Tasks neither completed nor cancelled.
    pub open_tasks: usize,
    /// Shopping items still needed.
    pub open_shopping: usize,
    /// Newest unread message, shown as a banner.
    pub latest_unread: Option<Message>,
    /// Who is on duty today.
    pub on_duty: Option<OnDuty>,
}

/// What the mom display's dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MomDashboard {
    /// Day the content refers to.
    pub date: Option<NaiveDate>,
    /// Dose progress per time window, morning first.
    pub doses: Vec<WindowProgress>,
    /// Who is coming today.
    pub today: Option<OnDuty>,
    /// Who covers the coming weekend.
    pub weekend: Option<OnDuty>,
    /// Events in the next week that mom may see, soonest first.
    pub upcoming: Vec<Event>,
}

/// The medication window covering `time`.
///
/// Morning runs 07:00 to 14:00 and evening 19:00 to 02:00.
#[must_use]
pub fn current_window(time: NaiveTime) -> Option<TimeWindow> {
    match time.hour() {
        7..=13 => Some(TimeWindow::Morning),
        19..=23 | 0..=1 => Some(TimeWindow::Evening),
        _ => None,
    }
}

/// Fold already-loaded rows into a summary.
///
/// Only doses of the given (active) medications are counted, so a log for a
/// retired medication cannot push a window past its schedule.
#[must_use]
pub fn compute(
    date: NaiveDate,
    time: NaiveTime,
    medications: &[Medication],
    doses: &[DoseLog],
    tasks: &[Task],
    shopping: &[ShoppingItem],
    latest_unread: Option<Message>,
) -> CareSummary {
    let taken = |medication: &Medication| {
        doses.iter().any(|dose| {
            dose.medication_id == medication.id
                && dose.date == date
                && dose.time_window == medication.time_window
                && dose.status.is_taken()
        })
    };

    let doses = TimeWindow::ALL
        .iter()
        .map(|&window| {
            let due: Vec<&Medication> = medications
                .iter()
                .filter(|m| m.is_active && m.time_window == window)
                .collect();
            WindowProgress {
                window,
                taken: due.iter().filter(|m| taken(m)).count(),
                scheduled: due.len(),
            }
        })
        .collect();

    let current_window = current_window(time);
    let due_now = medications
        .iter()
        .filter(|m| m.is_active && Some(m.time_window) == current_window && !taken(m))
        .cloned()
        .collect();

    CareSummary {
        date,
        doses,
        current_window,
        due_now,
        open_tasks: tasks.iter().filter(|t| t.status.is_open()).count(),
        open_shopping: shopping
            .iter()
            .filter(|item| item.status == ShoppingStatus::Open)
            .count(),
        latest_unread,
        on_duty: None,
    }
}

/// The Friday that starts the weekend on or after `date`.
///
/// On a Saturday this is the following Friday.
#[must_use]
pub fn weekend_start(date: NaiveDate) -> NaiveDate {
    let weekday = i64::from(date.weekday().num_days_from_sunday());
    let ahead = if weekday <= 5 { 5 - weekday } else { 6 };
    date + Duration::days(ahead)
}

fn on_duty(storage: &Storage, family_id: FamilyId, date: NaiveDate) -> Result<Option<OnDuty>> {
    let Some(entry) = storage.rotation_on(family_id, date)? else {
        return Ok(None);
    };
    Ok(storage.member(entry.member_id)?.map(|member| OnDuty {
        member_id: member.id,
        first_name: member.first_name,
        note: entry.note,
    }))
}

/// Load a family's rows and summarise them for `date` at `time`.
///
/// # Errors
///
/// Returns an error if any read fails.
pub fn load(hub: &FamilyHub, family_id: FamilyId, date: NaiveDate, time: NaiveTime) -> Result<CareSummary> {
    hub.read(|s| {
        let medications = s.medications(family_id)?;
        let doses = s.doses_on(family_id, date)?;
        let tasks = s.tasks(family_id)?;
        let shopping = s.shopping_items(family_id)?;
        let latest_unread = s.messages(family_id, true, 1)?.into_iter().next();
        let mut summary = compute(
            date,
            time,
            &medications,
            &doses,
            &tasks,
            &shopping,
            latest_unread,
        );
        summary.on_duty = on_duty(s, family_id, date)?;
        Ok(summary)
    })
}

/// Load the mom display's dashboard content at `now`.
///
/// Upcoming events run from the start of today through the next week.
///
/// # Errors
///
/// Returns an error if any read fails.
pub fn load_mom(storage: &Storage, family_id: FamilyId, now: NaiveDateTime) -> Result<MomDashboard> {
    let date = now.date();
    let medications = storage.medications(family_id)?;
    let doses = storage.doses_on(family_id, date)?;
    let summary = compute(date, now.time(), &medications, &doses, &[], &[], None);

    let upcoming = storage.events_between(
        family_id,
        date.and_time(NaiveTime::MIN),
        now + Duration::days(UPCOMING_DAYS),
        true,
        UPCOMING_LIMIT,
    )?;

    Ok(MomDashboard {
        date: Some(date),
        doses: summary.doses,
        today: on_duty(storage, family_id, date)?,
        weekend: on_duty(storage, family_id, weekend_start(date))?,
        upcoming,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{
        DoseStatus, EventCategory, NewEvent, NewMedication, NewMember, NewMessage, Role,
        TaskStatus,
    };

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
    }

    fn at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn test_current_window() {
        assert_eq!(current_window(at(7)), Some(TimeWindow::Morning));
        assert_eq!(current_window(at(13)), Some(TimeWindow::Morning));
        assert_eq!(current_window(at(14)), None);
        assert_eq!(current_window(at(19)), Some(TimeWindow::Evening));
        assert_eq!(current_window(at(1)), Some(TimeWindow::Evening));
        assert_eq!(current_window(at(2)), None);
    }

    #[test]
    fn test_weekend_start() {
        // 2024-05-14 is a Tuesday
        assert_eq!(weekend_start(day()), NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        let friday = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(weekend_start(friday), friday);
        let saturday = NaiveDate::from_ymd_opt(2024, 5, 18).unwrap();
        assert_eq!(weekend_start(saturday), NaiveDate::from_ymd_opt(2024, 5, 24).unwrap());
        let sunday = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert_eq!(weekend_start(sunday), NaiveDate::from_ymd_opt(2024, 5, 24).unwrap());
    }

    #[test]
    fn test_empty_summary() {
        let summary = compute(day(), at(10), &[], &[], &[], &[], None);
        assert_eq!(summary.doses.len(), 2);
        assert!(summary.doses.iter().all(WindowProgress::is_complete));
        assert_eq!(summary.open_tasks, 0);
        assert!(summary.due_now.is_empty());
    }

    #[tokio::test]
    async fn test_load_counts_rows() {
        let hub = FamilyHub::in_memory(Config::default()).unwrap();
        let family_id = hub.read(|s| s.create_family("Levi")).unwrap().id;

        hub.read(|s| {
            let pill = |name: &str, time_window| NewMedication {
                family_id,
                name: name.to_string(),
                dosage: None,
                time_window,
            };
            let aspirin = s.add_medication(&pill("Aspirin", TimeWindow::Morning))?;
            let vitamin = s.add_medication(&pill("Vitamin D", TimeWindow::Morning))?;
            let statin = s.add_medication(&pill("Statin", TimeWindow::Evening))?;
            s.log_dose(family_id, aspirin.id, day(), DoseStatus::DoneLate, None)?;
            s.log_dose(family_id, vitamin.id, day(), DoseStatus::Missed, None)?;
            s.log_dose(family_id, statin.id, day(), DoseStatus::Done, None)?;

            s.add_task(family_id, "Book checkup", None)?;
            let done = s.add_task(family_id, "Pick up glasses", None)?;
            s.set_task_status(family_id, done.id, TaskStatus::Completed)?;
            s.add_shopping_item(family_id, "Milk", Some("2"))?;
            Ok(())
        })
        .unwrap();
        hub.send_message(&NewMessage {
            family_id,
            from_member_id: None,
            text: "Thanks for the flowers".to_string(),
            is_urgent: false,
        })
        .await
        .unwrap();

        let summary = load(&hub, family_id, day(), at(9)).unwrap();
        assert_eq!(
            summary.doses,
            vec![
                WindowProgress {
                    window: TimeWindow::Morning,
                    taken: 1,
                    scheduled: 2
                },
                WindowProgress {
                    window: TimeWindow::Evening,
                    taken: 1,
                    scheduled: 1
                },
            ]
        );
        assert_eq!(summary.current_window, Some(TimeWindow::Morning));
        assert_eq!(summary.due_now.len(), 1);
        assert_eq!(summary.due_now[0].name, "Vitamin D");
        assert_eq!(summary.open_tasks, 1);
        assert_eq!(summary.open_shopping, 1);
        assert_eq!(
            summary.latest_unread.map(|m| m.text),
            Some("Thanks for the flowers".to_string())
        );
        assert_eq!(summary.on_duty, None);
    }

    #[test]
    fn test_mom_dashboard_content() {
        let hub = FamilyHub::in_memory(Config::default()).unwrap();
        let now = day().and_hms_opt(10, 0, 0).unwrap();
        let friday = weekend_start(day());

        let family_id = hub
            .read(|s| {
                let family_id = s.create_family("Levi")?.id;
                let caregiver = |user_id: &str, first_name: &str| NewMember {
                    family_id,
                    user_id: user_id.to_string(),
                    first_name: first_name.to_string(),
                    role: Role::Editor,
                    is_mother: false,
                    phone: None,
                };
                let dana = s.insert_member(&caregiver("dana@example.com", "Dana"))?;
                let avi = s.insert_member(&caregiver("avi@example.com", "Avi"))?;
                s.set_rotation(family_id, day(), dana.id, Some("lunch"))?;
                s.set_rotation(family_id, friday, avi.id, None)?;

                let pill = s.add_medication(&NewMedication {
                    family_id,
                    name: "Aspirin".to_string(),
                    dosage: None,
                    time_window: TimeWindow::Morning,
                })?;
                s.log_dose(family_id, pill.id, day(), DoseStatus::Done, None)?;

                let event = |title: &str, starts_at: NaiveDateTime, visible| NewEvent {
                    family_id,
                    title: title.to_string(),
                    category: EventCategory::Family,
                    starts_at,
                    responsible_member_id: Some(dana.id),
                    visible_to_mother: visible,
                };
                // Earlier today still counts as upcoming
                s.add_event(&event("Haircut", day().and_hms_opt(8, 0, 0).unwrap(), true))?;
                s.add_event(&event("Dinner", now + Duration::days(2), true))?;
                s.add_event(&event("Surprise party", now + Duration::days(3), false))?;
                s.add_event(&event("Wedding", now + Duration::days(8), true))?;
                Ok(family_id)
            })
            .unwrap();

        let content = hub.read(|s| load_mom(s, family_id, now)).unwrap();
        assert_eq!(content.date, Some(day()));
        assert_eq!(content.doses[0].taken, 1);
        assert_eq!(content.doses[0].scheduled, 1);

        let today = content.today.unwrap();
        assert_eq!(today.first_name, "Dana");
        assert_eq!(today.note.as_deref(), Some("lunch"));
        assert_eq!(content.weekend.map(|d| d.first_name), Some("Avi".to_string()));

        let titles: Vec<&str> = content.upcoming.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Haircut", "Dinner"]);

        let summary = load(&hub, family_id, day(), at(10)).unwrap();
        assert_eq!(summary.on_duty.map(|d| d.first_name), Some("Dana".to_string()));
    }
}

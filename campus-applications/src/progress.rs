//! Learning progress derivation
//!
//! Pure functions turning enrollment and progress records into what a
//! dashboard shows: per-course completion, a status bucket, and orderings.

use campus_core::{CourseProgress, Enrollment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl CourseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CourseStatus::NotStarted => "not started",
            CourseStatus::InProgress => "in progress",
            CourseStatus::Completed => "completed",
        }
    }
}

/// One enrolled course as the dashboard sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseOverview {
    pub course_id: String,
    pub title: Option<String>,
    pub completed_lessons: u32,
    pub total_lessons: u32,
    pub percentage: u8,
    pub status: CourseStatus,
    pub last_activity: Option<DateTime<Utc>>,
    pub enrolled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Title,
    /// Most complete first
    ProgressDesc,
    /// Most recently active first; never-touched courses last
    LastActivity,
}

/// Rounded completion in percent, 0 for a course without lessons.
///
/// 100 is reserved for courses with every lesson done; anything short of
/// that is capped at 99.
pub fn completion_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    if completed >= total {
        return 100;
    }
    let percentage = (f64::from(completed) / f64::from(total) * 100.0).round();
    percentage.min(99.0) as u8
}

pub fn course_status(enrollment_completed: bool, completed: u32, total: u32) -> CourseStatus {
    if enrollment_completed || (total > 0 && completed >= total) {
        CourseStatus::Completed
    } else if completed == 0 {
        CourseStatus::NotStarted
    } else {
        CourseStatus::InProgress
    }
}

/// Join enrollments with their progress records by course id
pub fn merge_overview(
    enrollments: &[Enrollment],
    progress: &[CourseProgress],
) -> Vec<CourseOverview> {
    let by_course: HashMap<&str, &CourseProgress> = progress
        .iter()
        .map(|record| (record.course_id.as_str(), record))
        .collect();

    enrollments
        .iter()
        .map(|enrollment| {
            let record = by_course.get(enrollment.course_id.as_str());
            let completed = record.map_or(0, |r| r.completed_lessons);
            let total = record.map_or(0, |r| r.total_lessons);

            CourseOverview {
                course_id: enrollment.course_id.clone(),
                title: enrollment.course_title.clone(),
                completed_lessons: completed,
                total_lessons: total,
                percentage: completion_percentage(completed, total),
                status: course_status(enrollment.completed, completed, total),
                last_activity: record.and_then(|r| r.last_activity),
                enrolled_at: enrollment.enrolled_at,
            }
        })
        .collect()
}

pub fn filter_by_status(overview: &[CourseOverview], status: CourseStatus) -> Vec<CourseOverview> {
    overview
        .iter()
        .filter(|course| course.status == status)
        .cloned()
        .collect()
}

pub fn sort_overview(overview: &mut [CourseOverview], order: SortOrder) {
    match order {
        SortOrder::Title => overview.sort_by(|a, b| title_key(a).cmp(&title_key(b))),
        SortOrder::ProgressDesc => overview.sort_by(|a, b| {
            b.percentage
                .cmp(&a.percentage)
                .then_with(|| title_key(a).cmp(&title_key(b)))
        }),
        SortOrder::LastActivity => overview.sort_by(|a, b| match (a.last_activity, b.last_activity) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
}

fn title_key(course: &CourseOverview) -> String {
    course
        .title
        .as_deref()
        .unwrap_or(&course.course_id)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn enrollment(course_id: &str, title: &str, completed: bool) -> Enrollment {
        Enrollment {
            id: format!("e{}", course_id),
            course_id: course_id.to_string(),
            course_title: Some(title.to_string()),
            enrolled_at: None,
            completed,
        }
    }

    fn progress(course_id: &str, completed: u32, total: u32, day: Option<u32>) -> CourseProgress {
        CourseProgress {
            course_id: course_id.to_string(),
            completed_lessons: completed,
            total_lessons: total,
            last_activity: day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(5, 0), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(3, 3), 100);
        assert_eq!(completion_percentage(7, 3), 100);
        assert_eq!(completion_percentage(199, 200), 99);
        assert_eq!(completion_percentage(1, 201), 0);
    }

    #[test]
    fn test_one_lesson_short_is_still_in_progress() {
        assert_eq!(course_status(false, 199, 200), CourseStatus::InProgress);
        assert_eq!(course_status(false, 200, 200), CourseStatus::Completed);

        let overview = merge_overview(
            &[enrollment("1", "Long course", false)],
            &[progress("1", 199, 200, None)],
        );
        assert_eq!(overview[0].percentage, 99);
        assert_eq!(overview[0].status, CourseStatus::InProgress);
    }

    #[test]
    fn test_course_status() {
        assert_eq!(course_status(false, 0, 10), CourseStatus::NotStarted);
        assert_eq!(course_status(false, 0, 0), CourseStatus::NotStarted);
        assert_eq!(course_status(false, 4, 10), CourseStatus::InProgress);
        assert_eq!(course_status(false, 10, 10), CourseStatus::Completed);
        assert_eq!(course_status(true, 0, 10), CourseStatus::Completed);
    }

    #[test]
    fn test_merge_overview_defaults_missing_progress() {
        let enrollments = vec![
            enrollment("1", "Rust", false),
            enrollment("2", "Algebra", false),
        ];
        let records = vec![progress("1", 2, 4, Some(3)), progress("99", 1, 1, None)];

        let overview = merge_overview(&enrollments, &records);
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].percentage, 50);
        assert_eq!(overview[0].status, CourseStatus::InProgress);
        assert!(overview[0].last_activity.is_some());
        assert_eq!(overview[1].status, CourseStatus::NotStarted);
        assert_eq!(overview[1].total_lessons, 0);
    }

    #[test]
    fn test_filter_and_sort() {
        let enrollments = vec![
            enrollment("1", "rust", false),
            enrollment("2", "Algebra", false),
            enrollment("3", "Biology", true),
        ];
        let records = vec![
            progress("1", 1, 4, Some(1)),
            progress("2", 3, 4, None),
            progress("3", 4, 4, Some(9)),
        ];
        let mut overview = merge_overview(&enrollments, &records);

        let in_progress = filter_by_status(&overview, CourseStatus::InProgress);
        assert_eq!(in_progress.len(), 2);

        sort_overview(&mut overview, SortOrder::Title);
        let ids: Vec<_> = overview.iter().map(|c| c.course_id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);

        sort_overview(&mut overview, SortOrder::ProgressDesc);
        let ids: Vec<_> = overview.iter().map(|c| c.course_id.as_str()).collect();
        assert_eq!(ids, ["3", "2", "1"]);

        sort_overview(&mut overview, SortOrder::LastActivity);
        let ids: Vec<_> = overview.iter().map(|c| c.course_id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }
}

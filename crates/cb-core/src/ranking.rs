//! # Ranking
//!
//! The admin listing is produced in two phases:
//!
//! 1. [`refresh_open_scores`] recomputes the score of every open complaint
//!    and persists it. All writes are awaited before returning.
//! 2. [`rank`] sorts by score descending, oldest first on ties. Pure.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Complaint;
use crate::priority;
use crate::traits::ComplaintRepo;

/// Outcome of a refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Open complaints whose new score was persisted.
    pub refreshed: usize,
    /// Open complaints whose write failed; they keep their previous score.
    pub failed: usize,
}

/// Recomputes and persists scores for open complaints.
///
/// A failed write is logged and leaves that complaint's score untouched;
/// it never aborts the pass.
pub async fn refresh_open_scores(
    repo: &dyn ComplaintRepo,
    complaints: &mut [Complaint],
    now: DateTime<Utc>,
) -> RefreshReport {
    let targets: Vec<(usize, Uuid, i64)> = complaints
        .iter()
        .enumerate()
        .filter(|(_, c)| c.status.is_open())
        .map(|(idx, c)| (idx, c.id, priority::score(c.category, c.urgency, c.created_at, now)))
        .collect();

    let writes = targets
        .iter()
        .map(|&(_, id, score)| repo.update_priority_score(id, score));
    let results = join_all(writes).await;

    let mut report = RefreshReport::default();
    for (&(idx, id, score), result) in targets.iter().zip(results) {
        match result {
            Ok(()) => {
                complaints[idx].priority_score = score;
                report.refreshed += 1;
            }
            Err(err) => {
                warn!(complaint_id = %id, error = %err, "failed to persist refreshed priority score");
                report.failed += 1;
            }
        }
    }

    debug!(refreshed = report.refreshed, failed = report.failed, "priority refresh complete");
    report
}

/// Higher score first; equal scores put the older complaint first.
pub fn compare(a: &Complaint, b: &Complaint) -> Ordering {
    b.priority_score
        .cmp(&a.priority_score)
        .then(a.created_at.cmp(&b.created_at))
}

/// Sorts complaints for administrative display.
pub fn rank(complaints: &mut [Complaint]) {
    complaints.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Status, Urgency};
    use crate::traits::MockComplaintRepo;
    use chrono::{Duration, TimeZone};
    use mockall::predicate::eq;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 8, 30, 0).unwrap()
    }

    fn complaint(score: i64, created_at: DateTime<Utc>, status: Status) -> Complaint {
        Complaint {
            id: Uuid::now_v7(),
            title: "Broken projector".to_string(),
            description: "Room 204 projector flickers".to_string(),
            category: Category::Facility,
            urgency: Urgency::Low,
            status,
            is_anonymous: true,
            user_id: None,
            admin_response: String::new(),
            updates: Vec::new(),
            priority_score: score,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn ties_resolve_older_first() {
        let t1 = base_time();
        let t2 = t1 + Duration::hours(1);
        let t3 = t1 + Duration::hours(2);
        let mut list = vec![
            complaint(80, t2, Status::Resolved),
            complaint(80, t1, Status::Resolved),
            complaint(95, t3, Status::Resolved),
        ];

        rank(&mut list);

        let order: Vec<(i64, DateTime<Utc>)> =
            list.iter().map(|c| (c.priority_score, c.created_at)).collect();
        assert_eq!(order, vec![(95, t3), (80, t1), (80, t2)]);
    }

    #[tokio::test]
    async fn refresh_skips_closed_complaints() {
        let now = base_time() + Duration::days(12);
        let open = complaint(15, base_time(), Status::Pending);
        let in_progress = complaint(15, base_time(), Status::InProgress);
        let resolved = complaint(15, base_time(), Status::Resolved);
        let rejected = complaint(15, base_time(), Status::Rejected);

        let mut repo = MockComplaintRepo::new();
        repo.expect_update_priority_score()
            .with(eq(open.id), eq(27))
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_update_priority_score()
            .with(eq(in_progress.id), eq(27))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut list = vec![open, in_progress, resolved, rejected];
        let report = refresh_open_scores(&repo, &mut list, now).await;

        assert_eq!(report, RefreshReport { refreshed: 2, failed: 0 });
        assert_eq!(list[0].priority_score, 27);
        assert_eq!(list[1].priority_score, 27);
        assert_eq!(list[2].priority_score, 15);
        assert_eq!(list[3].priority_score, 15);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_score() {
        let now = base_time() + Duration::days(3);
        let healthy = complaint(15, base_time(), Status::Pending);
        let broken = complaint(15, base_time(), Status::Pending);
        let broken_id = broken.id;

        let mut repo = MockComplaintRepo::new();
        repo.expect_update_priority_score()
            .returning(move |id, _| {
                if id == broken_id {
                    Err(anyhow::anyhow!("database is locked"))
                } else {
                    Ok(())
                }
            });

        let mut list = vec![healthy, broken];
        let report = refresh_open_scores(&repo, &mut list, now).await;

        assert_eq!(report, RefreshReport { refreshed: 1, failed: 1 });
        assert_eq!(list[0].priority_score, 18);
        assert_eq!(list[1].priority_score, 15);
    }

    #[tokio::test]
    async fn refreshed_scores_drive_the_sort() {
        // Stored scores say the newer complaint wins; a week of waiting flips that.
        let now = base_time() + Duration::days(7);
        let older = complaint(15, base_time(), Status::Pending);
        let newer = complaint(20, base_time() + Duration::days(7), Status::Pending);
        let older_id = older.id;

        let mut repo = MockComplaintRepo::new();
        repo.expect_update_priority_score().returning(|_, _| Ok(()));

        let mut list = vec![newer, older];
        refresh_open_scores(&repo, &mut list, now).await;
        rank(&mut list);

        assert_eq!(list[0].id, older_id);
        assert_eq!(list[0].priority_score, 22);
        assert_eq!(list[1].priority_score, 15);
    }
}

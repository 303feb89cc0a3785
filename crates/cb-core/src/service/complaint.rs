use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Category, Complaint, ComplaintUpdate, ComplaintView, Editor, Status, UpdateView, Urgency,
    User, UserSummary,
};
use crate::priority;
use crate::ranking::{self, RefreshReport};
use crate::traits::{ComplaintRepo, UserRepo};

/// Submission payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewComplaint {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub urgency: Option<Urgency>,
    pub is_anonymous: Option<bool>,
}

/// An admin's edit: a new status, a response message, or both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusChange {
    pub status: Option<String>,
    pub admin_response: Option<String>,
}

/// The admin listing together with how the score refresh went.
#[derive(Debug, Clone)]
pub struct RankedListing {
    pub complaints: Vec<ComplaintView>,
    pub refresh: RefreshReport,
}

#[derive(Clone)]
pub struct ComplaintService {
    complaints: Arc<dyn ComplaintRepo>,
    users: Arc<dyn UserRepo>,
}

impl ComplaintService {
    pub fn new(complaints: Arc<dyn ComplaintRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { complaints, users }
    }

    /// Validates and stores a complaint, scoring it at its creation instant.
    ///
    /// The complaint is linked to `submitter` only when the caller is signed in
    /// and explicitly opted out of anonymity.
    pub async fn submit(
        &self,
        submitter: Option<Uuid>,
        input: NewComplaint,
        now: DateTime<Utc>,
    ) -> Result<Complaint> {
        let (Some(title), Some(description)) = (non_blank(input.title), non_blank(input.description))
        else {
            return Err(AppError::Validation(
                "Title and description are required".to_string(),
            ));
        };

        let category = input.category.unwrap_or_default();
        let urgency = input.urgency.unwrap_or_default();
        let user_id = match (submitter, input.is_anonymous) {
            (Some(id), Some(false)) => Some(id),
            _ => None,
        };

        let complaint = Complaint {
            id: Uuid::now_v7(),
            title,
            description,
            category,
            urgency,
            status: Status::Pending,
            is_anonymous: user_id.is_none(),
            user_id,
            admin_response: String::new(),
            updates: Vec::new(),
            priority_score: priority::score(category, urgency, now, now),
            created_at: now,
            updated_at: now,
        };
        self.complaints.insert_complaint(&complaint).await?;

        info!(
            complaint_id = %complaint.id,
            category = category.as_str(),
            urgency = urgency.as_str(),
            score = complaint.priority_score,
            anonymous = complaint.is_anonymous,
            "complaint submitted"
        );
        Ok(complaint)
    }

    /// Every complaint, freshly scored and ranked for administrators.
    pub async fn ranked(&self, now: DateTime<Utc>) -> Result<RankedListing> {
        let mut complaints = self.complaints.list_complaints().await?;

        let refresh = ranking::refresh_open_scores(self.complaints.as_ref(), &mut complaints, now).await;
        if refresh.failed > 0 {
            warn!(
                failed = refresh.failed,
                refreshed = refresh.refreshed,
                "listing served with partially stale priority scores"
            );
        }
        ranking::rank(&mut complaints);

        Ok(RankedListing {
            complaints: self.present(complaints, true).await?,
            refresh,
        })
    }

    /// The caller's own signed complaints, newest first. Scores are not refreshed.
    pub async fn owned_by(&self, user_id: Uuid) -> Result<Vec<ComplaintView>> {
        let complaints = self.complaints.list_complaints_by_owner(user_id).await?;
        self.present(complaints, false).await
    }

    /// Applies an admin's status change and/or response and logs it on the complaint.
    pub async fn update(
        &self,
        id: Uuid,
        admin_id: Uuid,
        change: StatusChange,
        now: DateTime<Utc>,
    ) -> Result<ComplaintView> {
        let status = non_blank(change.status);
        let response = non_blank(change.admin_response);
        if status.is_none() && response.is_none() {
            return Err(AppError::Validation(
                "Provide a status or progress update message.".to_string(),
            ));
        }
        let status = status.map(|s| s.parse::<Status>()).transpose()?;

        let mut complaint = self
            .complaints
            .get_complaint(id)
            .await?
            .ok_or(AppError::NotFound("Complaint"))?;

        if let Some(status) = status {
            complaint.status = status;
        }
        if let Some(response) = &response {
            complaint.admin_response = response.clone();
        }
        complaint.updates.push(ComplaintUpdate {
            status,
            message: response.unwrap_or_default(),
            updated_by: admin_id,
            created_at: now,
        });
        complaint.updated_at = now;

        self.complaints.save_complaint(&complaint).await?;
        info!(complaint_id = %id, status = complaint.status.as_str(), "complaint updated");

        let mut views = self.present(vec![complaint], true).await?;
        views.pop().ok_or(AppError::NotFound("Complaint"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.complaints.delete_complaint(id).await? {
            return Err(AppError::NotFound("Complaint"));
        }
        info!(complaint_id = %id, "complaint deleted");
        Ok(())
    }

    /// Resolves update log writers and, when `with_authors` is set, the authors
    /// of signed complaints. Each distinct account is looked up once.
    async fn present(
        &self,
        complaints: Vec<Complaint>,
        with_authors: bool,
    ) -> Result<Vec<ComplaintView>> {
        let mut accounts: HashMap<Uuid, Option<User>> = HashMap::new();
        let authors = complaints
            .iter()
            .filter(|_| with_authors)
            .filter_map(|c| c.user_id);
        let editors = complaints
            .iter()
            .flat_map(|c| c.updates.iter().map(|u| u.updated_by));
        let user_ids: Vec<Uuid> = authors.chain(editors).collect();
        for user_id in user_ids {
            if !accounts.contains_key(&user_id) {
                let user = self.users.get_user(user_id).await?;
                accounts.insert(user_id, user);
            }
        }
        let account = |id: Uuid| accounts.get(&id).and_then(Option::as_ref);

        Ok(complaints
            .into_iter()
            .map(|c| {
                let author = c
                    .user_id
                    .filter(|_| with_authors)
                    .and_then(account)
                    .map(UserSummary::from);
                let updates = c
                    .updates
                    .iter()
                    .map(|u| UpdateView::new(u, account(u.updated_by).map(Editor::from)))
                    .collect();
                ComplaintView::new(c, author, updates)
            })
            .collect())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::priority::PriorityLevel;
    use crate::traits::{MockComplaintRepo, MockUserRepo};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 14, 10, 0, 0).unwrap()
    }

    fn service(complaints: MockComplaintRepo, users: MockUserRepo) -> ComplaintService {
        ComplaintService::new(Arc::new(complaints), Arc::new(users))
    }

    fn stored(score: i64, created_at: DateTime<Utc>, status: Status) -> Complaint {
        Complaint {
            id: Uuid::now_v7(),
            title: "Noise in library".to_string(),
            description: "Group study on the silent floor".to_string(),
            category: Category::Other,
            urgency: Urgency::Medium,
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

    fn new_complaint(is_anonymous: Option<bool>) -> NewComplaint {
        NewComplaint {
            title: Some("Harassment in dorm".to_string()),
            description: Some("Repeated incidents in block C".to_string()),
            category: Some(Category::Bullying),
            urgency: Some(Urgency::Critical),
            is_anonymous,
        }
    }

    #[tokio::test]
    async fn submit_scores_at_creation_and_stays_anonymous_by_default() {
        let mut repo = MockComplaintRepo::new();
        repo.expect_insert_complaint()
            .withf(|c| c.priority_score == 150 && c.user_id.is_none() && c.is_anonymous)
            .times(1)
            .returning(|_| Ok(()));

        let complaint = service(repo, MockUserRepo::new())
            .submit(Some(Uuid::now_v7()), new_complaint(None), now())
            .await
            .unwrap();

        assert_eq!(complaint.status, Status::Pending);
        assert_eq!(complaint.created_at, now());
    }

    #[tokio::test]
    async fn submit_links_owner_only_when_signed_in_and_opted_out() {
        let mut repo = MockComplaintRepo::new();
        repo.expect_insert_complaint().returning(|_| Ok(()));
        let svc = service(repo, MockUserRepo::new());
        let student = Uuid::now_v7();

        let signed = svc.submit(Some(student), new_complaint(Some(false)), now()).await.unwrap();
        assert_eq!(signed.user_id, Some(student));
        assert!(!signed.is_anonymous);

        let guest = svc.submit(None, new_complaint(Some(false)), now()).await.unwrap();
        assert_eq!(guest.user_id, None);
        assert!(guest.is_anonymous);
    }

    #[tokio::test]
    async fn submit_defaults_category_and_urgency() {
        let mut repo = MockComplaintRepo::new();
        repo.expect_insert_complaint().returning(|_| Ok(()));
        let input = NewComplaint {
            title: Some("Cafeteria".to_string()),
            description: Some("Cold food".to_string()),
            ..NewComplaint::default()
        };

        let complaint = service(repo, MockUserRepo::new())
            .submit(None, input, now())
            .await
            .unwrap();

        assert_eq!(complaint.category, Category::Other);
        assert_eq!(complaint.urgency, Urgency::Medium);
        assert_eq!(complaint.priority_score, 35);
    }

    #[tokio::test]
    async fn submit_rejects_blank_title_before_touching_storage() {
        let input = NewComplaint {
            title: Some("   ".to_string()),
            description: Some("Something".to_string()),
            ..NewComplaint::default()
        };
        let err = service(MockComplaintRepo::new(), MockUserRepo::new())
            .submit(None, input, now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title and description are required");
    }

    #[tokio::test]
    async fn ranked_refreshes_open_complaints_then_sorts() {
        let stale_open = stored(35, now() - Duration::days(20), Status::Pending);
        let frozen = stored(40, now() - Duration::days(25), Status::Resolved);
        let fresh = stored(35, now(), Status::InProgress);
        let (stale_id, frozen_id, fresh_id) = (stale_open.id, frozen.id, fresh.id);

        let mut repo = MockComplaintRepo::new();
        let listed = vec![fresh, frozen, stale_open];
        repo.expect_list_complaints()
            .returning(move || Ok(listed.clone()));
        repo.expect_update_priority_score()
            .withf(move |id, _| *id != frozen_id)
            .times(2)
            .returning(|_, _| Ok(()));

        let listing = service(repo, MockUserRepo::new()).ranked(now()).await.unwrap();

        let order: Vec<(Uuid, i64)> = listing
            .complaints
            .iter()
            .map(|v| (v.complaint.id, v.complaint.priority_score))
            .collect();
        assert_eq!(order, vec![(stale_id, 55), (frozen_id, 40), (fresh_id, 35)]);
        assert_eq!(listing.complaints[0].priority_level, PriorityLevel::Medium);
        assert_eq!(listing.refresh, RefreshReport { refreshed: 2, failed: 0 });
    }

    fn account(id: Uuid, username: &str, role: Role) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{username}@college.edu"),
            password_hash: String::new(),
            role,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn ranked_attaches_authors_to_signed_complaints() {
        let author = account(Uuid::now_v7(), "lina", Role::Student);
        let mut signed = stored(35, now(), Status::Resolved);
        signed.user_id = Some(author.id);
        signed.is_anonymous = false;

        let mut repo = MockComplaintRepo::new();
        repo.expect_list_complaints()
            .returning(move || Ok(vec![signed.clone()]));
        let mut users = MockUserRepo::new();
        let found = author.clone();
        users
            .expect_get_user()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let listing = service(repo, users).ranked(now()).await.unwrap();
        assert_eq!(
            listing.complaints[0].author.as_ref().map(|a| a.username.as_str()),
            Some("lina")
        );
    }

    #[tokio::test]
    async fn update_requires_status_or_message() {
        let err = service(MockComplaintRepo::new(), MockUserRepo::new())
            .update(Uuid::now_v7(), Uuid::now_v7(), StatusChange::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rejects_unknown_status() {
        let change = StatusChange {
            status: Some("closed".to_string()),
            admin_response: None,
        };
        let err = service(MockComplaintRepo::new(), MockUserRepo::new())
            .update(Uuid::now_v7(), Uuid::now_v7(), change, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_appends_to_the_log() {
        let complaint = stored(35, now() - Duration::days(1), Status::Pending);
        let id = complaint.id;
        let admin = Uuid::now_v7();

        let mut repo = MockComplaintRepo::new();
        repo.expect_get_complaint()
            .returning(move |_| Ok(Some(complaint.clone())));
        repo.expect_save_complaint()
            .withf(move |c| {
                c.status == Status::InProgress
                    && c.admin_response == "Maintenance notified"
                    && c.updates.len() == 1
                    && c.updates[0].updated_by == admin
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut users = MockUserRepo::new();
        let dean = account(admin, "dean", Role::Admin);
        users
            .expect_get_user()
            .withf(move |id| *id == admin)
            .times(1)
            .returning(move |_| Ok(Some(dean.clone())));

        let change = StatusChange {
            status: Some("in-progress".to_string()),
            admin_response: Some("Maintenance notified".to_string()),
        };
        let view = service(repo, users)
            .update(id, admin, change, now())
            .await
            .unwrap();

        assert_eq!(view.complaint.updates[0].status, Some(Status::InProgress));
        assert_eq!(view.complaint.updated_at, now());
        let editor = view.updates[0].updated_by.as_ref().unwrap();
        assert_eq!((editor.username.as_str(), editor.role), ("dean", Role::Admin));
    }

    #[tokio::test]
    async fn owner_listing_names_update_writers_once_each() {
        let owner = Uuid::now_v7();
        let admin = Uuid::now_v7();
        let mut mine = stored(35, now() - Duration::days(2), Status::InProgress);
        mine.user_id = Some(owner);
        mine.is_anonymous = false;
        for message in ["Looking into it", "Parts ordered"] {
            mine.updates.push(ComplaintUpdate {
                status: None,
                message: message.to_string(),
                updated_by: admin,
                created_at: now(),
            });
        }

        let mut repo = MockComplaintRepo::new();
        repo.expect_list_complaints_by_owner()
            .returning(move |_| Ok(vec![mine.clone()]));
        let mut users = MockUserRepo::new();
        let registrar = account(admin, "registrar", Role::Admin);
        users
            .expect_get_user()
            .withf(move |id| *id == admin)
            .times(1)
            .returning(move |_| Ok(Some(registrar.clone())));

        let views = service(repo, users).owned_by(owner).await.unwrap();

        let writers: Vec<Option<&str>> = views[0]
            .updates
            .iter()
            .map(|u| u.updated_by.as_ref().map(|e| e.username.as_str()))
            .collect();
        assert_eq!(writers, vec![Some("registrar"), Some("registrar")]);
        assert!(views[0].author.is_none());
    }

    #[tokio::test]
    async fn writers_of_deleted_accounts_render_as_unknown() {
        let mut complaint = stored(35, now(), Status::Resolved);
        complaint.updates.push(ComplaintUpdate {
            status: Some(Status::Resolved),
            message: String::new(),
            updated_by: Uuid::now_v7(),
            created_at: now(),
        });

        let mut repo = MockComplaintRepo::new();
        repo.expect_list_complaints()
            .returning(move || Ok(vec![complaint.clone()]));
        let mut users = MockUserRepo::new();
        users.expect_get_user().returning(|_| Ok(None));

        let listing = service(repo, users).ranked(now()).await.unwrap();
        assert_eq!(listing.complaints[0].updates.len(), 1);
        assert!(listing.complaints[0].updates[0].updated_by.is_none());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_complaints() {
        let mut repo = MockComplaintRepo::new();
        repo.expect_get_complaint().returning(|_| Ok(None));
        repo.expect_delete_complaint().returning(|_| Ok(false));
        let svc = service(repo, MockUserRepo::new());

        let change = StatusChange {
            status: Some("resolved".to_string()),
            admin_response: None,
        };
        assert!(matches!(
            svc.update(Uuid::now_v7(), Uuid::now_v7(), change, now()).await,
            Err(AppError::NotFound("Complaint"))
        ));
        assert!(matches!(
            svc.delete(Uuid::now_v7()).await,
            Err(AppError::NotFound("Complaint"))
        ));
    }
}

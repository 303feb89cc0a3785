//! # Domain Models
//!
//! These structs represent the core entities of Complaint Box.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::priority::PriorityLevel;

/// What a complaint is about. Drives the category weight of the priority score.
///
/// Deserialization never fails: any label outside the closed set, or a value
/// that is not a string at all, becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bullying,
    Academic,
    Staff,
    Facility,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Bullying => "bullying",
            Category::Academic => "academic",
            Category::Staff => "staff",
            Category::Facility => "facility",
            Category::Other => "other",
        }
    }

    /// Lenient parse used for request payloads and stored rows alike.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "bullying" => Category::Bullying,
            "academic" => Category::Academic,
            "staff" => Category::Staff,
            "facility" => Category::Facility,
            _ => Category::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Label::deserialize(deserializer)?
            .text()
            .map_or_else(Category::default, Category::from_label))
    }
}

/// How quickly the submitter thinks the complaint needs attention.
///
/// Like [`Category`], unknown labels degrade to the default (`Medium`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Urgency::Low,
            "high" => Urgency::High,
            "critical" => Urgency::Critical,
            _ => Urgency::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Urgency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Label::deserialize(deserializer)?
            .text()
            .map_or_else(Urgency::default, Urgency::from_label))
    }
}

/// Wire shape of a category or urgency: a label, or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Unrecognized(IgnoredAny),
}

impl Label {
    fn text(&self) -> Option<&str> {
        match self {
            Label::Text(label) => Some(label),
            Label::Unrecognized(_) => None,
        }
    }
}

/// Review state of a complaint. Unlike category and urgency this is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
        }
    }

    /// Open complaints get their score recomputed on every ranking pass.
    pub fn is_open(self) -> bool {
        matches!(self, Status::Pending | Status::InProgress)
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "in-progress" => Ok(Status::InProgress),
            "resolved" => Ok(Status::Resolved),
            "rejected" => Ok(Status::Rejected),
            other => Err(AppError::Validation(format!(
                "Invalid status '{other}'. Must be pending, in-progress, resolved or rejected."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            _ => Err(AppError::Validation(
                "Invalid role. Must be admin or student.".to_string(),
            )),
        }
    }
}

/// One entry of a complaint's append-only progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub message: String,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A complaint as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub urgency: Urgency,
    pub status: Status,
    pub is_anonymous: bool,
    /// Set only for complaints the submitter chose to sign
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub admin_response: String,
    /// Rendered by [`ComplaintView`], which resolves who wrote each entry.
    #[serde(skip_serializing, default)]
    pub updates: Vec<ComplaintUpdate>,
    pub priority_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The public slice of a user attached to complaints in admin listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// The account behind an update log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Editor {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<&User> for Editor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// An update log entry as returned to API clients. `updated_by` is `None`
/// once the account that wrote it has gone away.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub message: String,
    pub updated_by: Option<Editor>,
    pub created_at: DateTime<Utc>,
}

impl UpdateView {
    pub fn new(update: &ComplaintUpdate, updated_by: Option<Editor>) -> Self {
        Self {
            status: update.status,
            message: update.message.clone(),
            updated_by,
            created_at: update.created_at,
        }
    }
}

/// A complaint as returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintView {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub updates: Vec<UpdateView>,
    pub priority_level: PriorityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,
}

impl ComplaintView {
    pub fn new(complaint: Complaint, author: Option<UserSummary>, updates: Vec<UpdateView>) -> Self {
        Self {
            priority_level: PriorityLevel::from_score(complaint.priority_score),
            complaint,
            updates,
            author,
        }
    }
}

/// A freshly submitted complaint: no author attached and nothing logged yet.
impl From<Complaint> for ComplaintView {
    fn from(complaint: Complaint) -> Self {
        let updates = complaint
            .updates
            .iter()
            .map(|update| UpdateView::new(update, None))
            .collect();
        Self::new(complaint, None, updates)
    }
}

//! Database models
//!
//! Wire format is camelCase to match the existing web client.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ============================================================================
// Enumerations
// ============================================================================

/// Access role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Commander: reviews and acts on topics
    Admin,
    /// Submits reports
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "STAFF" => Ok(Role::Staff),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report or topic priority
///
/// Parsing is case-insensitive. Values outside low/medium/high are carried
/// through verbatim (lower-cased) and never count as high.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Other(String),
}

impl Priority {
    /// Case-folding parse; total
    pub fn parse(s: &str) -> Self {
        let folded = s.trim().to_lowercase();
        match folded.as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Other(folded),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Other(s) => s,
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Priority::High)
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        Priority::parse(&s)
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic lifecycle status
///
/// Open states (`Pending`, `Validated`, `PriorityAlert`) accept new reports
/// during triage; `Approved` and `Archived` are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Pending,
    Validated,
    PriorityAlert,
    Approved,
    Archived,
}

impl TopicStatus {
    /// Statuses eligible for consolidation
    pub const OPEN: [TopicStatus; 3] = [
        TopicStatus::Pending,
        TopicStatus::Validated,
        TopicStatus::PriorityAlert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Pending => "pending",
            TopicStatus::Validated => "validated",
            TopicStatus::PriorityAlert => "priority_alert",
            TopicStatus::Approved => "approved",
            TopicStatus::Archived => "archived",
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    /// Status implied by a priority at triage time
    pub fn for_priority(priority: &Priority) -> Self {
        if priority.is_high() {
            TopicStatus::PriorityAlert
        } else {
            TopicStatus::Validated
        }
    }
}

impl FromStr for TopicStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TopicStatus::Pending),
            "validated" => Ok(TopicStatus::Validated),
            "priority_alert" => Ok(TopicStatus::PriorityAlert),
            "approved" => Ok(TopicStatus::Approved),
            "archived" => Ok(TopicStatus::Archived),
            other => Err(Error::InvalidInput(format!("Unknown topic status: {}", other))),
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact category of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactType {
    #[serde(rename = "Logística")]
    Logistica,
    #[serde(rename = "Segurança")]
    Seguranca,
    #[serde(rename = "Eficiência")]
    Eficiencia,
    #[serde(rename = "Moral")]
    Moral,
}

impl ImpactType {
    /// Map a report category to its impact category
    ///
    /// Total: unrecognized categories map to `Moral`.
    pub fn from_category(category: &str) -> Self {
        match category {
            "Logística" => ImpactType::Logistica,
            "Segurança" => ImpactType::Seguranca,
            "Manutenção" => ImpactType::Eficiencia,
            _ => ImpactType::Moral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactType::Logistica => "Logística",
            ImpactType::Seguranca => "Segurança",
            ImpactType::Eficiencia => "Eficiência",
            ImpactType::Moral => "Moral",
        }
    }
}

impl FromStr for ImpactType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Logística" => Ok(ImpactType::Logistica),
            "Segurança" => Ok(ImpactType::Seguranca),
            "Eficiência" => Ok(ImpactType::Eficiencia),
            "Moral" => Ok(ImpactType::Moral),
            other => Err(Error::InvalidInput(format!("Unknown impact type: {}", other))),
        }
    }
}

impl fmt::Display for ImpactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feedback classification sent to reporters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    Commendation,
    Notice,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Commendation => "Commendation",
            FeedbackKind::Notice => "Notice",
        }
    }
}

impl FromStr for FeedbackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Commendation" => Ok(FeedbackKind::Commendation),
            "Notice" => Ok(FeedbackKind::Notice),
            other => Err(Error::InvalidInput(format!("Unknown feedback type: {}", other))),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// User account (password material never serialized)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub rank: Option<String>,
    pub status: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub sector: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Incident report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub priority: Priority,
    pub status: String,
    pub media: Value,
    pub metadata: Value,
    pub user_id: i64,
    pub topic_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

/// Suggested course of action attached to a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Cluster of related reports
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub ai_summary: String,
    pub status: TopicStatus,
    pub priority: Priority,
    pub impact_type: ImpactType,
    pub suggestions: Vec<Suggestion>,
    pub action: Option<String>,
    pub final_solution: Option<String>,
    pub feedback_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Message delivered to a reporter after a commander action
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub date: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!(Priority::parse("High"), Priority::High);
        assert_eq!(Priority::parse(" LOW "), Priority::Low);
        assert_eq!(Priority::parse("Medium"), Priority::Medium);
    }

    #[test]
    fn test_priority_unknown_passes_through_lowercased() {
        let p = Priority::parse("Critica");
        assert_eq!(p, Priority::Other("critica".to_string()));
        assert!(!p.is_high());
        assert_eq!(p.as_str(), "critica");
    }

    #[test]
    fn test_priority_serde_as_string() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");
        let back: Priority = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(back, Priority::Medium);
    }

    #[test]
    fn test_topic_status_open_states() {
        assert!(TopicStatus::Pending.is_open());
        assert!(TopicStatus::Validated.is_open());
        assert!(TopicStatus::PriorityAlert.is_open());
        assert!(!TopicStatus::Approved.is_open());
        assert!(!TopicStatus::Archived.is_open());
    }

    #[test]
    fn test_topic_status_for_priority() {
        assert_eq!(TopicStatus::for_priority(&Priority::High), TopicStatus::PriorityAlert);
        assert_eq!(TopicStatus::for_priority(&Priority::Low), TopicStatus::Validated);
        assert_eq!(
            TopicStatus::for_priority(&Priority::Other("x".into())),
            TopicStatus::Validated
        );
    }

    #[test]
    fn test_topic_status_serde_snake_case() {
        let json = serde_json::to_string(&TopicStatus::PriorityAlert).unwrap();
        assert_eq!(json, "\"priority_alert\"");
        assert_eq!("priority_alert".parse::<TopicStatus>().unwrap(), TopicStatus::PriorityAlert);
    }

    #[test]
    fn test_impact_type_mapping_is_total() {
        assert_eq!(ImpactType::from_category("Logística"), ImpactType::Logistica);
        assert_eq!(ImpactType::from_category("Segurança"), ImpactType::Seguranca);
        assert_eq!(ImpactType::from_category("Manutenção"), ImpactType::Eficiencia);
        assert_eq!(ImpactType::from_category("Infraestrutura"), ImpactType::Moral);
        assert_eq!(ImpactType::from_category(""), ImpactType::Moral);
    }

    #[test]
    fn test_impact_type_serializes_display_name() {
        let json = serde_json::to_string(&ImpactType::Eficiencia).unwrap();
        assert_eq!(json, "\"Eficiência\"");
    }

    #[test]
    fn test_role_round_trip_text() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Staff.to_string(), "STAFF");
        assert!("COMMANDER".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            id: 1,
            name: "Sgt. Oliveira".into(),
            email: "sgt@example.com".into(),
            password_hash: "h".into(),
            role: Role::Staff,
            rank: Some("2º Sgt".into()),
            status: "Ativo".into(),
            avatar: None,
            phone: None,
            location: None,
            unit: None,
            sector: None,
            created_at: NaiveDateTime::default(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "STAFF");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00");
    }
}

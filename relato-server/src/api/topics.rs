//! Topic listing and commander actions

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use relato_common::db::models::{FeedbackKind, ImpactType, Priority, Suggestion, Topic, TopicStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::auth::{AdminUser, AuthUser};
use crate::db::topics::{self, NewTopic, TopicPatch};
use crate::db::{feedback, reports};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Author recorded when a suggestion arrives without one
pub const ANONYMOUS_AUTHOR: &str = "Anônimo";

/// Rank buckets for the origin breakdown, in display order
pub const ORIGIN_LABELS: [&str; 3] = ["Sd/Cb EV", "Sd/Cb EP", "Sgt/St"];

#[derive(Debug, Serialize)]
pub struct OriginStat {
    pub label: &'static str,
    pub val: i64,
}

/// Topic as listed, with linked report count and origin breakdown
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicView {
    #[serde(flatten)]
    pub topic: Topic,
    pub reports_count: i64,
    pub origin_stats: Vec<OriginStat>,
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    pub title: String,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub impact_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicActionRequest {
    pub action: String,
    #[serde(default, alias = "finalSolution")]
    pub final_solution: Option<String>,
    #[serde(default, alias = "feedbackMessage")]
    pub feedback_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicActionResponse {
    pub message: String,
    pub topic: Topic,
    pub feedback_sent: u64,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPatchRequest {
    pub title: Option<String>,
    pub ai_summary: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub impact_type: Option<String>,
    pub final_solution: Option<String>,
    pub feedback_message: Option<String>,
}

/// Commander decision on a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicAction {
    Approve,
    Archive,
    Hold,
}

impl TopicAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "approve" => Some(TopicAction::Approve),
            "archive" => Some(TopicAction::Archive),
            "hold" => Some(TopicAction::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicAction::Approve => "approve",
            TopicAction::Archive => "archive",
            TopicAction::Hold => "hold",
        }
    }

    /// Status the topic moves to
    pub fn target_status(&self) -> TopicStatus {
        match self {
            TopicAction::Approve => TopicStatus::Approved,
            TopicAction::Archive => TopicStatus::Archived,
            TopicAction::Hold => TopicStatus::Validated,
        }
    }

    pub fn feedback_kind(&self) -> FeedbackKind {
        match self {
            TopicAction::Approve => FeedbackKind::Commendation,
            TopicAction::Archive | TopicAction::Hold => FeedbackKind::Notice,
        }
    }
}

/// Bucket a reporter's rank; unknown ranks count as `Sd/Cb EV`
pub fn origin_bucket(rank: Option<&str>) -> usize {
    let rank = rank.unwrap_or("");
    if rank.contains("EV") {
        0
    } else if rank.contains("EP") {
        1
    } else if rank.contains("Sgt") || rank.contains("St") {
        2
    } else {
        0
    }
}

fn parse_status(raw: &str) -> ApiResult<TopicStatus> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown topic status: {}", raw)))
}

fn parse_impact(raw: &str) -> ApiResult<ImpactType> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown impact type: {}", raw)))
}

/// GET /api/topics
pub async fn list_topics(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<TopicQuery>,
) -> ApiResult<Json<Vec<TopicView>>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .transpose()?;

    let listed = topics::list_topics(&state.db, status).await?;

    let mut origins: HashMap<i64, [i64; 3]> = HashMap::new();
    for (topic_id, rank) in reports::linked_report_ranks(&state.db).await? {
        origins.entry(topic_id).or_default()[origin_bucket(rank.as_deref())] += 1;
    }

    let views = listed
        .into_iter()
        .map(|topic| {
            let counts = origins.get(&topic.id).copied().unwrap_or_default();
            TopicView {
                reports_count: counts.iter().sum(),
                origin_stats: ORIGIN_LABELS
                    .into_iter()
                    .zip(counts)
                    .map(|(label, val)| OriginStat { label, val })
                    .collect(),
                topic,
            }
        })
        .collect();

    Ok(Json(views))
}

/// POST /api/topics
pub async fn create_topic(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateTopicRequest>,
) -> ApiResult<(StatusCode, Json<Topic>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }

    let new_topic = NewTopic {
        title: req.title,
        ai_summary: req.ai_summary.unwrap_or_default(),
        status: match req.status.as_deref() {
            Some(s) => parse_status(s)?,
            None => TopicStatus::Validated,
        },
        priority: Priority::parse(req.priority.as_deref().unwrap_or("low")),
        impact_type: match req.impact_type.as_deref() {
            Some(s) => parse_impact(s)?,
            None => ImpactType::Moral,
        },
        suggestions: Vec::new(),
    };

    let topic = topics::create_topic(&state.db, &new_topic).await?;
    info!(topic_id = topic.id, by = admin.user_id, "Topic created manually");

    Ok((StatusCode::CREATED, Json(topic)))
}

/// POST /api/topics/:id/action
///
/// Moves the topic to the action's status and, when a feedback message is
/// given, notifies each distinct reporter once.
pub async fn topic_action(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<TopicActionRequest>,
) -> ApiResult<Json<TopicActionResponse>> {
    let action = TopicAction::parse(&req.action)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown action: {}", req.action)))?;

    let topic = topics::apply_action(
        &state.db,
        id,
        action.target_status(),
        action.as_str(),
        req.final_solution.as_deref(),
        req.feedback_message.as_deref(),
    )
    .await?;

    let mut feedback_sent = 0;
    if let Some(message) = req.feedback_message.as_deref().filter(|m| !m.trim().is_empty()) {
        let reporters = reports::reporters_for_topic(&state.db, id).await?;
        if !reporters.is_empty() {
            feedback_sent =
                feedback::create_for_users(&state.db, &reporters, message, action.feedback_kind())
                    .await?;
        }
    }

    info!(
        topic_id = id,
        action = action.as_str(),
        by = admin.user_id,
        feedback_sent,
        "Topic action processed"
    );

    Ok(Json(TopicActionResponse {
        message: "Action processed successfully".to_string(),
        topic,
        feedback_sent,
    }))
}

/// POST /api/topics/:id/suggestions
///
/// The new suggestion goes to the front of the list.
pub async fn add_suggestion(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<SuggestionRequest>,
) -> ApiResult<Json<Topic>> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }

    let topic = topics::get_topic(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    let author = req
        .author
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());

    let mut suggestions = topic.suggestions;
    suggestions.insert(
        0,
        Suggestion {
            text: req.text,
            author: Some(author),
        },
    );
    topics::set_suggestions(&state.db, id, &suggestions).await?;

    let topic = topics::get_topic(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    Ok(Json(topic))
}

/// PATCH /api/topics/:id
pub async fn patch_topic(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<TopicPatchRequest>,
) -> ApiResult<Json<Topic>> {
    let patch = TopicPatch {
        title: req.title,
        ai_summary: req.ai_summary,
        status: req.status.as_deref().map(parse_status).transpose()?,
        priority: req.priority.as_deref().map(Priority::parse),
        impact_type: req.impact_type.as_deref().map(parse_impact).transpose()?,
        final_solution: req.final_solution,
        feedback_message: req.feedback_message,
    };

    Ok(Json(topics::update_topic(&state.db, id, patch).await?))
}

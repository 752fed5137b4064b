//! Report submission and listing

use axum::{extract::State, http::StatusCode, Json};
use relato_common::db::models::{Priority, Report};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::api::auth::AuthUser;
use crate::db::reports::{self, NewReport, ReportWithAuthor};
use crate::db::settings;
use crate::error::{ApiError, ApiResult};
use crate::triage::{self, TriageError, TriageOutcome};
use crate::AppState;

/// Report submission body
///
/// The free-form form fields (`details` through `urgency`) are kept together
/// in the report's metadata object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub category: String,
    pub subcategory: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub media: Option<Value>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub hierarchy: Option<Value>,
    #[serde(default)]
    pub identify: Option<Value>,
    #[serde(default)]
    pub war_name: Option<Value>,
    #[serde(default)]
    pub squadron: Option<Value>,
    #[serde(default)]
    pub solution: Option<Value>,
    #[serde(default)]
    pub impact: Option<Value>,
    #[serde(default)]
    pub urgency: Option<Value>,
}

impl CreateReportRequest {
    fn metadata(&self) -> Value {
        json!({
            "details": self.details,
            "hierarchy": self.hierarchy,
            "identify": self.identify,
            "warName": self.war_name,
            "squadron": self.squadron,
            "solution": self.solution,
            "impact": self.impact,
            "urgency": self.urgency,
        })
    }
}

/// POST /api/reports
///
/// Stores the report, then runs triage when `ai_triage` is enabled. Triage
/// failures are logged and never fail the submission.
pub async fn create_report(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    if req.category.trim().is_empty() || req.subcategory.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "category and subcategory are required".to_string(),
        ));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::BadRequest("description is required".to_string()));
    }

    let media = match &req.media {
        None | Some(Value::Null) => json!([]),
        Some(media @ Value::Array(_)) => media.clone(),
        Some(_) => return Err(ApiError::BadRequest("media must be an array".to_string())),
    };

    let new_report = NewReport {
        category: req.category.clone(),
        subcategory: req.subcategory.clone(),
        description: req.description.clone(),
        priority: Priority::parse(req.priority.as_deref().unwrap_or("low")),
        status: None,
        media,
        metadata: req.metadata(),
        user_id: user.user_id,
    };
    let report_id = reports::create_report(&state.db, &new_report).await?;
    info!(report_id, user_id = user.user_id, "Report stored");

    run_triage(&state, report_id).await;

    let report = reports::get_report(&state.db, report_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Report {} vanished after insert", report_id)))?;

    Ok((StatusCode::CREATED, Json(report)))
}

async fn run_triage(state: &AppState, report_id: i64) {
    match settings::ai_triage_enabled(&state.db).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(report_id, "AI triage disabled, report left unassigned");
            return;
        }
        Err(e) => {
            warn!(report_id, "Could not read ai_triage setting, skipping triage: {}", e);
            return;
        }
    }

    match triage::triage_report(&state.db, report_id).await {
        Ok(TriageOutcome::Consolidated {
            topic,
            total_reports,
        }) => {
            debug!(report_id, topic_id = topic.id, total_reports, "Triage consolidated report");
        }
        Ok(TriageOutcome::Created { topic }) => {
            debug!(report_id, topic_id = topic.id, "Triage opened topic");
        }
        Err(e @ (TriageError::ReportNotFound(_) | TriageError::AlreadyLinked { .. })) => {
            warn!(report_id, "Triage skipped: {}", e);
        }
        Err(e) => {
            error!(report_id, "Triage failed: {}", e);
        }
    }
}

/// GET /api/reports
pub async fn list_reports(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<ReportWithAuthor>>> {
    Ok(Json(reports::list_reports_with_authors(&state.db).await?))
}

/// GET /api/reports/my-history
pub async fn my_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(reports::list_reports_by_user(&state.db, user.user_id).await?))
}

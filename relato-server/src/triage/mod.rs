//! Report triage and consolidation
//!
//! Given a freshly stored report, either fold it into the oldest open topic
//! that already holds a report with the same category and subcategory, or
//! open a new topic for it. The report is linked to the resulting topic last.
//!
//! The candidate search and the topic write are separate statements with no
//! transaction around them. Two concurrent submissions for the same
//! category/subcategory can both open topics, or one consolidation can
//! overwrite the other's summary note.

pub mod classify;

use relato_common::db::models::{ImpactType, Topic, TopicStatus};
use relato_common::time;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{reports, topics, users};
use classify::{
    consolidated_priority, derive_title, effective_priority, initial_suggestions, initial_summary,
    update_note,
};

/// Triage errors
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Report {0} not found")]
    ReportNotFound(i64),

    /// Triage runs once per report
    #[error("Report {report_id} is already linked to topic {topic_id}")]
    AlreadyLinked { report_id: i64, topic_id: i64 },

    #[error("Store error: {0}")]
    Store(#[from] relato_common::Error),
}

/// What triage did with a report
#[derive(Debug, Clone)]
pub enum TriageOutcome {
    /// Report merged into an existing open topic
    Consolidated { topic: Topic, total_reports: i64 },
    /// Report opened a new topic
    Created { topic: Topic },
}

impl TriageOutcome {
    pub fn topic(&self) -> &Topic {
        match self {
            TriageOutcome::Consolidated { topic, .. } | TriageOutcome::Created { topic } => topic,
        }
    }
}

/// Classify a stored report and attach it to a topic
pub async fn triage_report(pool: &SqlitePool, report_id: i64) -> Result<TriageOutcome, TriageError> {
    let report = reports::get_report(pool, report_id)
        .await?
        .ok_or(TriageError::ReportNotFound(report_id))?;

    if let Some(topic_id) = report.topic_id {
        return Err(TriageError::AlreadyLinked {
            report_id,
            topic_id,
        });
    }

    let preview: String = report.description.chars().take(50).collect();
    info!("[triage] Analyzing report {}: \"{}\"", report_id, preview);

    let priority = effective_priority(&report.priority, &report.description);
    debug!(
        report_id,
        declared = %report.priority,
        effective = %priority,
        "[triage] Urgency classified"
    );

    let candidate =
        topics::find_open_topic_for(pool, &report.category, &report.subcategory).await?;

    let outcome = match candidate {
        Some(topic) => {
            info!(
                "[triage] Consolidating report {} into topic {}",
                report_id, topic.id
            );

            let total_reports = reports::count_reports_for_topic(pool, topic.id).await? + 1;
            let new_priority = consolidated_priority(&topic.priority, total_reports, &priority);
            let new_status = TopicStatus::for_priority(&new_priority);

            let reporter = users::get_user(pool, report.user_id).await?;
            let note = update_note(
                time::local_today(),
                reporter.as_ref().map(|u| u.name.as_str()),
                &report.subcategory,
            );
            let summary = format!("{}{}", topic.ai_summary, note);

            let topic =
                topics::update_triage_fields(pool, topic.id, &new_priority, new_status, &summary)
                    .await?;

            TriageOutcome::Consolidated {
                topic,
                total_reports,
            }
        }
        None => {
            info!("[triage] Creating new topic for report {}", report_id);

            let new_topic = topics::NewTopic {
                title: derive_title(&report.category, &report.subcategory, &report.description),
                ai_summary: initial_summary(&report.category, &report.subcategory),
                status: TopicStatus::for_priority(&priority),
                priority,
                impact_type: ImpactType::from_category(&report.category),
                suggestions: initial_suggestions(),
            };
            let topic = topics::create_topic(pool, &new_topic).await?;

            TriageOutcome::Created { topic }
        }
    };

    reports::set_report_topic(pool, report_id, outcome.topic().id).await?;

    info!(
        report_id,
        topic_id = outcome.topic().id,
        status = %outcome.topic().status,
        priority = %outcome.topic().priority,
        "[triage] Report linked"
    );

    Ok(outcome)
}

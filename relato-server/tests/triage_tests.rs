//! Integration tests for the triage engine
//!
//! Tests cover:
//! - Keyword escalation on new topics
//! - Consolidation threshold and priority/status coupling
//! - Topic isolation by category/subcategory
//! - Append-only summaries
//! - Closed topics never reopened
//! - Pending topics accept consolidation
//! - Blank reporter names fall back to a placeholder
//! - Re-triage and missing reports rejected without changes

mod common;

use common::{create_user, setup_test_db, store_report};
use relato_common::db::models::{ImpactType, Priority, Role, TopicStatus};
use relato_server::db::topics::NewTopic;
use relato_server::db::{reports, topics};
use relato_server::triage::classify::{MAINTENANCE_TITLE, SUGGESTION_AUTHOR, UNKNOWN_REPORTER};
use relato_server::triage::{triage_report, TriageError, TriageOutcome};

#[tokio::test]
async fn test_keyword_escalates_new_topic() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;
    let report = store_report(&db, user, "Logística", "Rações", "FALTA de rações no 2º Esqd", "low").await;

    let outcome = triage_report(&db, report).await.unwrap();
    let topic = match outcome {
        TriageOutcome::Created { topic } => topic,
        other => panic!("expected new topic, got {:?}", other),
    };

    assert_eq!(topic.priority, Priority::High);
    assert_eq!(topic.status, TopicStatus::PriorityAlert);
    assert_eq!(topic.title, "Logística: Rações");
    assert_eq!(topic.impact_type, ImpactType::Logistica);
    assert_eq!(topic.suggestions.len(), 2);
    assert_eq!(topic.suggestions[0].author.as_deref(), Some(SUGGESTION_AUTHOR));
}

#[tokio::test]
async fn test_third_report_escalates_topic() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;

    let first = store_report(&db, user, "Infraestrutura", "Alojamento", "Pintura desgastada", "low").await;
    let first_topic = triage_report(&db, first).await.unwrap().topic().clone();
    assert_eq!(first_topic.priority, Priority::Low);
    assert_eq!(first_topic.status, TopicStatus::Validated);

    let second = store_report(&db, user, "Infraestrutura", "Alojamento", "Pintura descascando", "low").await;
    let outcome = triage_report(&db, second).await.unwrap();
    match &outcome {
        TriageOutcome::Consolidated {
            topic,
            total_reports,
        } => {
            assert_eq!(topic.id, first_topic.id);
            assert_eq!(*total_reports, 2);
            assert_eq!(topic.priority, Priority::Low);
            assert_eq!(topic.status, TopicStatus::Validated);
        }
        other => panic!("expected consolidation, got {:?}", other),
    }

    let third = store_report(&db, user, "Infraestrutura", "Alojamento", "Pintura antiga", "low").await;
    match triage_report(&db, third).await.unwrap() {
        TriageOutcome::Consolidated {
            topic,
            total_reports,
        } => {
            assert_eq!(topic.id, first_topic.id);
            assert_eq!(total_reports, 3);
            assert_eq!(topic.priority, Priority::High);
            assert_eq!(topic.status, TopicStatus::PriorityAlert);
        }
        other => panic!("expected consolidation, got {:?}", other),
    }

    assert_eq!(reports::count_reports_for_topic(&db, first_topic.id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_status_tracks_priority_after_every_write() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;

    let descriptions = ["Tudo certo", "Atraso leve", "Pedido atendido", "Quadro novo"];
    for description in descriptions {
        let id = store_report(&db, user, "Pessoal", "Escala", description, "medium").await;
        let topic = triage_report(&db, id).await.unwrap().topic().clone();
        assert_eq!(topic.status, TopicStatus::for_priority(&topic.priority));
    }
}

#[tokio::test]
async fn test_different_subcategory_opens_separate_topic() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;

    let a = store_report(&db, user, "Logística", "Transporte", "Ônibus atrasado", "low").await;
    let b = store_report(&db, user, "Logística", "Rancho", "Cardápio repetido", "low").await;
    let c = store_report(&db, user, "Segurança", "Transporte", "Cinto de segurança", "low").await;

    let topic_a = triage_report(&db, a).await.unwrap().topic().id;
    let topic_b = triage_report(&db, b).await.unwrap().topic().id;
    let topic_c = triage_report(&db, c).await.unwrap().topic().id;

    assert_ne!(topic_a, topic_b);
    assert_ne!(topic_a, topic_c);
    assert_ne!(topic_b, topic_c);
    assert_eq!(topics::list_topics(&db, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_summary_is_append_only() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Sgt. Oliveira", "sgt@example.com", Role::Staff).await;

    let first = store_report(&db, user, "Saúde", "Enfermaria", "Fila longa", "low").await;
    let original = triage_report(&db, first).await.unwrap().topic().ai_summary.clone();

    let second = store_report(&db, user, "Saúde", "Enfermaria", "Fila ainda longa", "low").await;
    let updated = triage_report(&db, second).await.unwrap().topic().ai_summary.clone();

    assert!(updated.starts_with(&original));
    assert!(updated.len() > original.len());
    assert!(updated.contains("Novo relato de Sgt. Oliveira confirma agravamento em Enfermaria."));
}

#[tokio::test]
async fn test_blank_reporter_name_uses_placeholder() {
    let db = setup_test_db().await;
    let user = create_user(&db, "", "anon@example.com", Role::Staff).await;

    let first = store_report(&db, user, "Saúde", "Enfermaria", "Fila longa", "low").await;
    triage_report(&db, first).await.unwrap();

    let second = store_report(&db, user, "Saúde", "Enfermaria", "Fila ainda longa", "low").await;
    let summary = triage_report(&db, second).await.unwrap().topic().ai_summary.clone();

    assert!(summary.contains(&format!(
        "Novo relato de {} confirma agravamento em Enfermaria.",
        UNKNOWN_REPORTER
    )));
    assert!(!summary.contains("Novo relato de  confirma"));
}

#[tokio::test]
async fn test_pending_topic_accepts_consolidation() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;

    let pending = topics::create_topic(
        &db,
        &NewTopic {
            title: "Infraestrutura: Iluminação".to_string(),
            ai_summary: "Aberto manualmente".to_string(),
            status: TopicStatus::Pending,
            priority: Priority::Low,
            impact_type: ImpactType::Moral,
            suggestions: Vec::new(),
        },
    )
    .await
    .unwrap();
    let linked = store_report(&db, user, "Infraestrutura", "Iluminação", "Lâmpada queimada", "low").await;
    reports::set_report_topic(&db, linked, pending.id).await.unwrap();

    let next = store_report(&db, user, "Infraestrutura", "Iluminação", "Lâmpada queimada de novo", "low").await;
    match triage_report(&db, next).await.unwrap() {
        TriageOutcome::Consolidated {
            topic,
            total_reports,
        } => {
            assert_eq!(topic.id, pending.id);
            assert_eq!(total_reports, 2);
            assert_eq!(topic.priority, Priority::Low);
            assert_eq!(topic.status, TopicStatus::Validated);
            assert!(topic.ai_summary.starts_with("Aberto manualmente"));
        }
        other => panic!("expected consolidation, got {:?}", other),
    }
    assert_eq!(topics::list_topics(&db, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_closed_topic_is_not_reopened() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;

    let first = store_report(&db, user, "Logística", "Combustível", "Tanque baixo", "low").await;
    let closed = triage_report(&db, first).await.unwrap().topic().id;
    topics::apply_action(&db, closed, TopicStatus::Archived, "archive", None, None)
        .await
        .unwrap();

    let second = store_report(&db, user, "Logística", "Combustível", "Tanque baixo de novo", "low").await;
    let outcome = triage_report(&db, second).await.unwrap();

    assert!(matches!(outcome, TriageOutcome::Created { .. }));
    assert_ne!(outcome.topic().id, closed);
    let archived = topics::get_topic(&db, closed).await.unwrap().unwrap();
    assert_eq!(archived.status, TopicStatus::Archived);
    assert_eq!(reports::count_reports_for_topic(&db, closed).await.unwrap(), 1);
}

#[tokio::test]
async fn test_maintenance_report_end_to_end() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;
    let report = store_report(
        &db,
        user,
        "Manutenção",
        "Viaturas",
        "Viatura aguardando manutenção no pátio",
        "low",
    )
    .await;

    let outcome = triage_report(&db, report).await.unwrap();
    let topic = outcome.topic();

    assert!(matches!(outcome, TriageOutcome::Created { .. }));
    assert_eq!(topic.status, TopicStatus::Validated);
    assert_eq!(topic.priority, Priority::Low);
    assert_eq!(topic.impact_type, ImpactType::Eficiencia);
    assert_eq!(topic.title, MAINTENANCE_TITLE);

    let stored = reports::get_report(&db, report).await.unwrap().unwrap();
    assert_eq!(stored.topic_id, Some(topic.id));
}

#[tokio::test]
async fn test_retriage_of_linked_report_is_rejected() {
    let db = setup_test_db().await;
    let user = create_user(&db, "Cb Lima", "lima@example.com", Role::Staff).await;
    let report = store_report(&db, user, "Pessoal", "Férias", "Escala publicada", "low").await;

    let topic = triage_report(&db, report).await.unwrap().topic().clone();
    let err = triage_report(&db, report).await.unwrap_err();

    match err {
        TriageError::AlreadyLinked {
            report_id,
            topic_id,
        } => {
            assert_eq!(report_id, report);
            assert_eq!(topic_id, topic.id);
        }
        other => panic!("expected AlreadyLinked, got {:?}", other),
    }

    let unchanged = topics::get_topic(&db, topic.id).await.unwrap().unwrap();
    assert_eq!(unchanged.ai_summary, topic.ai_summary);
    assert_eq!(reports::count_reports_for_topic(&db, topic.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_report_is_not_found() {
    let db = setup_test_db().await;
    let err = triage_report(&db, 404).await.unwrap_err();
    assert!(matches!(err, TriageError::ReportNotFound(404)));
    assert!(topics::list_topics(&db, None).await.unwrap().is_empty());
}

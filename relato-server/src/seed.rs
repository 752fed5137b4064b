//! Demo data for development databases
//!
//! Wipes users, reports, topics and feedback, then inserts a fixed set of
//! accounts, four topics with two linked reports each, three feedback entries
//! and the default system settings. The token secret is left alone.

use relato_common::db::init::DEFAULT_SETTINGS;
use relato_common::db::models::{
    FeedbackKind, ImpactType, Priority, Role, Suggestion, TopicStatus,
};
use relato_common::Result;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::reports::{NewReport, STATUS_APPROVED, STATUS_PENDING};
use crate::db::topics::NewTopic;
use crate::db::{feedback, reports, settings, topics, users};

/// Row counts written by [`seed_database`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub topics: usize,
    pub reports: usize,
    pub feedback: usize,
}

struct SeedUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    rank: &'static str,
    avatar: &'static str,
    phone: &'static str,
    location: &'static str,
    sector: &'static str,
}

const SEED_UNIT: &str = "8º RC Mec";

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        name: "Commander Shepard",
        email: "admin@example.com",
        password: "admin123",
        role: Role::Admin,
        rank: "Ten Cel",
        avatar: "https://i.pravatar.cc/150?u=admin",
        phone: "555-0199",
        location: "Comando de Regimento",
        sector: "A-124",
    },
    SeedUser {
        name: "Pvt. Jenkins",
        email: "staff@example.com",
        password: "staff123",
        role: Role::Staff,
        rank: "Sd EP",
        avatar: "https://i.pravatar.cc/150?u=staff",
        phone: "555-0101",
        location: "4º Esquadrão",
        sector: "B-202",
    },
    SeedUser {
        name: "Sgt. Oliveira",
        email: "sgt.oliveira@example.com",
        password: "staff123",
        role: Role::Staff,
        rank: "2º Sgt",
        avatar: "https://i.pravatar.cc/150?u=sgt",
        phone: "555-0155",
        location: "Garagem de Viaturas",
        sector: "V-10",
    },
    SeedUser {
        name: "Admin User",
        email: "admin@gmail.com",
        password: "123",
        role: Role::Admin,
        rank: "Gen Ex",
        avatar: "https://i.pravatar.cc/150?u=admin2",
        phone: "555-0000",
        location: "HQ",
        sector: "ADM",
    },
];

fn suggestion(text: &str, author: Option<&str>) -> Suggestion {
    Suggestion {
        text: text.to_string(),
        author: author.map(str::to_string),
    }
}

fn seed_topics() -> Vec<NewTopic> {
    vec![
        NewTopic {
            title: "Manutenção de Viaturas - Esquadrão B".into(),
            ai_summary: "Falhas hidráulicas recorrentes nas viaturas do Esquadrão B. Possível descuido na manutenção preventiva identificado no Setor 4.".into(),
            status: TopicStatus::Validated,
            priority: Priority::High,
            impact_type: ImpactType::Seguranca,
            suggestions: vec![
                suggestion("Aumentar frequência de verificação de pressão", Some("Sgt. Oliveira")),
                suggestion("Substituir kits de vedação das unidades do Setor 4", None),
                suggestion("Upgrade para fluido de alta performance", Some("Cb. Mendes")),
            ],
        },
        NewTopic {
            title: "Falha de Comunicação - Ala Norte".into(),
            ai_summary: "Atenuação de sinal reportada durante horários de pico operacional. Provável interferência de redes externas.".into(),
            status: TopicStatus::Validated,
            priority: Priority::Medium,
            impact_type: ImpactType::Eficiencia,
            suggestions: vec![
                suggestion("Instalar repetidores de sinal a cada 50m", None),
                suggestion("Mudar para frequência criptografada 7", Some("Ten. Costa")),
                suggestion("Reorientar antenas das torres de guarda", None),
            ],
        },
        NewTopic {
            title: "Atraso no Suprimento Médico".into(),
            ai_summary: "Atraso na distribuição de kits de trauma primário. Erro de sincronização no sistema de inventário da enfermaria.".into(),
            status: TopicStatus::PriorityAlert,
            priority: Priority::High,
            impact_type: ImpactType::Moral,
            suggestions: vec![
                suggestion("Autorizar distribuição manual de emergência", Some("Maj. Rocha")),
                suggestion("Reiniciar logs de sincronização do banco de dados", None),
                suggestion("Aumentar estoque de kits nas zonas de deslocamento rápido", None),
            ],
        },
        NewTopic {
            title: "Erro de Protocolo - Reserva de Armamento".into(),
            ai_summary: "Desalinhamento do sensor no portão biométrico. Rejeição incorreta de pessoal autorizado detectada.".into(),
            status: TopicStatus::Validated,
            priority: Priority::Low,
            impact_type: ImpactType::Seguranca,
            suggestions: vec![
                suggestion("Recalibrar sensores biométricos", None),
                suggestion("Implementar protocolo temporário de liberação manual", Some("Subten. Almeida")),
                suggestion("Atualizar logs de acesso de pessoal", None),
            ],
        },
    ]
}

async fn clear_tables(pool: &SqlitePool) -> Result<()> {
    for table in ["feedback", "reports", "topics", "users"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await?;
    }
    // Restart AUTOINCREMENT ids so the demo accounts get ids 1..=4
    sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('feedback', 'reports', 'topics', 'users')")
        .execute(pool)
        .await?;

    Ok(())
}

/// Replace all domain data with the demo set
pub async fn seed_database(pool: &SqlitePool) -> Result<SeedSummary> {
    info!("Clearing existing data");
    clear_tables(pool).await?;

    info!("Creating users");
    let mut user_ids = Vec::with_capacity(SEED_USERS.len());
    for seed in SEED_USERS {
        let mut user = users::NewUser::basic(seed.name, seed.email, seed.password, seed.role);
        user.rank = Some(seed.rank.to_string());
        user.avatar = Some(seed.avatar.to_string());
        user.phone = Some(seed.phone.to_string());
        user.location = Some(seed.location.to_string());
        user.unit = Some(SEED_UNIT.to_string());
        user.sector = Some(seed.sector.to_string());
        user_ids.push(users::create_user(pool, &user).await?);
    }
    let (admin, jenkins, oliveira) = (user_ids[0], user_ids[1], user_ids[2]);

    info!("Creating topics and reports");
    let seed_topics = seed_topics();
    let mut report_count = 0;
    for new_topic in &seed_topics {
        let topic = topics::create_topic(pool, new_topic).await?;

        let initial = NewReport {
            category: "Infraestrutura".into(),
            subcategory: "Manutenção".into(),
            description: format!("Relatório inicial identificando problemas em {}", topic.title),
            priority: topic.priority.clone(),
            status: Some(STATUS_APPROVED.into()),
            media: json!([]),
            metadata: json!({}),
            user_id: jenkins,
        };
        let confirmation = NewReport {
            category: "Operacional".into(),
            subcategory: "Campo".into(),
            description: format!("Confirmação de impacto em campo referente a {}", topic.title),
            priority: if topic.priority.is_high() {
                Priority::High
            } else {
                Priority::Low
            },
            status: Some(STATUS_PENDING.into()),
            media: json!([]),
            metadata: json!({}),
            user_id: oliveira,
        };

        for report in [initial, confirmation] {
            let report_id = reports::create_report(pool, &report).await?;
            reports::set_report_topic(pool, report_id, topic.id).await?;
            report_count += 1;
        }
    }

    info!("Creating feedback");
    let feedback_entries = [
        (jenkins, FeedbackKind::Notice, "Manutenção da Viatura 102 concluída com sucesso."),
        (oliveira, FeedbackKind::Commendation, "Excelente desempenho na coordenação da Ala Norte."),
        (admin, FeedbackKind::Notice, "Reunião de comando agendada para amanhã às 08:00."),
    ];
    for (user_id, kind, message) in feedback_entries {
        feedback::create_for_users(pool, &[user_id], message, kind).await?;
    }

    info!("Resetting system settings");
    for (key, value) in DEFAULT_SETTINGS {
        settings::set_setting(pool, key, value).await?;
    }

    Ok(SeedSummary {
        users: SEED_USERS.len(),
        topics: seed_topics.len(),
        reports: report_count,
        feedback: feedback_entries.len(),
    })
}

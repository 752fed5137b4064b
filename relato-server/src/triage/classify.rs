//! Pure triage rules
//!
//! Urgency escalation, consolidation priority, title derivation and the
//! summary/suggestion templates. No I/O; the engine in `triage` wires these
//! to the store.

use chrono::NaiveDate;
use relato_common::db::models::{Priority, Suggestion};
use relato_common::time::format_br_date;

/// Description fragments that escalate a report to high priority (matched case-folded)
pub const HIGH_URGENCY_KEYWORDS: &[&str] = &[
    "falta", "grave", "urgente", "parado", "crítico", "sem", "não há", "lack", "no more", "urgent",
    "critical", "missing", "broken", "failed",
];

/// Linked reports at which a topic is escalated regardless of declared priority
pub const CONSOLIDATION_THRESHOLD: i64 = 3;

const DRIVER_KEYWORDS: &[&str] = &["motorista", "condutor", "driver"];
const MAINTENANCE_KEYWORDS: &[&str] = &["manutenção", "quebrado", "maintenance", "broken"];

pub const DRIVER_SHORTAGE_TITLE: &str = "Pessoal: Escassez de Motoristas / Drivers (1º Esqd)";
pub const MAINTENANCE_TITLE: &str = "Manutenção: Indisponibilidade de Meios / Maintenance";

/// Author recorded on generated suggestions
pub const SUGGESTION_AUTHOR: &str = "Consultor IA";

/// Reporter name used in update notes when the author is unknown
pub const UNKNOWN_REPORTER: &str = "Militar";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Priority after keyword escalation
///
/// High if the declared priority is high or the description contains any
/// urgency keyword; otherwise the declared priority unchanged.
pub fn effective_priority(declared: &Priority, description: &str) -> Priority {
    let folded = description.to_lowercase();
    if declared.is_high() || contains_any(&folded, HIGH_URGENCY_KEYWORDS) {
        Priority::High
    } else {
        declared.clone()
    }
}

/// Topic priority after absorbing one more report
///
/// Never lowers an existing priority.
pub fn consolidated_priority(current: &Priority, total_reports: i64, effective: &Priority) -> Priority {
    if total_reports >= CONSOLIDATION_THRESHOLD || effective.is_high() {
        Priority::High
    } else {
        current.clone()
    }
}

/// Title for a topic opened by a report; first matching rule wins
pub fn derive_title(category: &str, subcategory: &str, description: &str) -> String {
    let folded = description.to_lowercase();
    if contains_any(&folded, DRIVER_KEYWORDS) {
        DRIVER_SHORTAGE_TITLE.to_string()
    } else if contains_any(&folded, MAINTENANCE_KEYWORDS) {
        MAINTENANCE_TITLE.to_string()
    } else {
        format!("{}: {}", category, subcategory)
    }
}

pub fn initial_summary(category: &str, subcategory: &str) -> String {
    format!(
        "Análise Estratégica: Identificado novo ponto de atenção em {}. \
         Relato inicial indica impacto direto em {}. \
         Recomendado monitoramento de recorrência para validação de padrão operacional.",
        category, subcategory
    )
}

/// Note appended to a topic summary on consolidation
///
/// A missing or blank reporter name is written as [`UNKNOWN_REPORTER`].
pub fn update_note(date: NaiveDate, reporter: Option<&str>, subcategory: &str) -> String {
    let reporter = reporter
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_REPORTER);

    format!(
        "\n\n[Atualização {}]: Novo relato de {} confirma agravamento em {}.",
        format_br_date(date),
        reporter,
        subcategory
    )
}

pub fn initial_suggestions() -> Vec<Suggestion> {
    [
        "Avaliar redistribuição de recursos nas seções adjacentes",
        "Solicitar relatório circunstanciado do S-4",
    ]
    .into_iter()
    .map(|text| Suggestion {
        text: text.to_string(),
        author: Some(SUGGESTION_AUTHOR.to_string()),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_escalate_in_both_languages() {
        let low = Priority::Low;
        assert_eq!(effective_priority(&low, "Falta de combustível"), Priority::High);
        assert_eq!(effective_priority(&low, "Radio BROKEN since monday"), Priority::High);
        assert_eq!(effective_priority(&low, "Situação CRÍTICO no pátio"), Priority::High);
        assert_eq!(effective_priority(&low, "não há rações"), Priority::High);
    }

    #[test]
    fn test_no_keyword_keeps_declared_priority() {
        assert_eq!(
            effective_priority(&Priority::Medium, "Pintura desgastada no alojamento"),
            Priority::Medium
        );
        assert_eq!(
            effective_priority(&Priority::Other("normal".into()), "Tudo em ordem"),
            Priority::Other("normal".into())
        );
    }

    #[test]
    fn test_declared_high_stays_high() {
        assert_eq!(effective_priority(&Priority::High, "ok"), Priority::High);
    }

    #[test]
    fn test_keyword_matches_inside_words() {
        // "sem" is a substring match, so "semana" escalates too
        assert_eq!(effective_priority(&Priority::Low, "Na próxima semana"), Priority::High);
    }

    #[test]
    fn test_consolidation_threshold() {
        assert_eq!(consolidated_priority(&Priority::Low, 2, &Priority::Low), Priority::Low);
        assert_eq!(consolidated_priority(&Priority::Low, 3, &Priority::Low), Priority::High);
        assert_eq!(consolidated_priority(&Priority::Medium, 2, &Priority::High), Priority::High);
    }

    #[test]
    fn test_consolidation_never_lowers() {
        assert_eq!(consolidated_priority(&Priority::High, 1, &Priority::Low), Priority::High);
    }

    #[test]
    fn test_title_rules_in_order() {
        assert_eq!(
            derive_title("Logística", "Transporte", "Motorista faltou e a viatura está quebrado"),
            DRIVER_SHORTAGE_TITLE
        );
        assert_eq!(
            derive_title("Manutenção", "Viaturas", "Viatura aguardando MANUTENÇÃO"),
            MAINTENANCE_TITLE
        );
        assert_eq!(derive_title("Saúde", "Enfermaria", "Fila longa"), "Saúde: Enfermaria");
    }

    #[test]
    fn test_update_note_format() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        assert_eq!(
            update_note(date, Some("Sgt. Oliveira"), "Rações"),
            "\n\n[Atualização 09/02/2026]: Novo relato de Sgt. Oliveira confirma agravamento em Rações."
        );
        assert!(update_note(date, None, "Rações").contains("Novo relato de Militar "));
        assert!(update_note(date, Some("  "), "Rações").contains("Novo relato de Militar confirma"));
    }

    #[test]
    fn test_initial_summary_mentions_category_and_subcategory() {
        let summary = initial_summary("Segurança", "Guarda");
        assert!(summary.starts_with("Análise Estratégica: Identificado novo ponto de atenção em Segurança."));
        assert!(summary.contains("impacto direto em Guarda."));
    }

    #[test]
    fn test_initial_suggestions_are_authored() {
        let suggestions = initial_suggestions();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions
            .iter()
            .all(|s| s.author.as_deref() == Some(SUGGESTION_AUTHOR)));
    }
}

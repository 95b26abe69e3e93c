//! Results table construction and client-side filtering.

use crate::model::Claim;
use crate::render::Tone;

/// Shown as the only row when the claim list is empty.
pub const EMPTY_TABLE_MESSAGE: &str = "No claims found";

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// One rendered claim row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub claim_id: String,
    pub pill_label: &'static str,
    pub pill_tone: Tone,
    pub error_type: String,
    /// Explanation lines with their leading bullet markers stripped.
    pub explanation: Vec<String>,
    /// Recommended actions, one per `;`-separated segment.
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Claim(ResultRow),
    Placeholder(&'static str),
}

/// Rebuild the whole table from scratch — no diffing, so rendering the same
/// list twice produces an identical result.  An empty list renders exactly
/// one placeholder row.
pub fn table_rows(claims: &[Claim]) -> Vec<TableRow> {
    if claims.is_empty() {
        return vec![TableRow::Placeholder(EMPTY_TABLE_MESSAGE)];
    }
    claims
        .iter()
        .map(|claim| {
            let (pill_label, pill_tone) = if claim.is_validated() {
                ("Success", Tone::Success)
            } else {
                ("Error", Tone::Error)
            };
            TableRow::Claim(ResultRow {
                claim_id: claim.claim_id.clone(),
                pill_label,
                pill_tone,
                error_type: claim.error_type.clone(),
                explanation: explanation_items(&claim.error_explanation),
                actions: action_items(&claim.recommended_action),
            })
        })
        .collect()
}

/// Split the explanation on newlines and strip a leading `-`/`•`/`*` marker
/// from each line.  Blank lines are dropped.
fn explanation_items(explanation: &str) -> Vec<String> {
    explanation
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '•', '*'])
                .trim_start()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Recommended actions come `;`-separated; each becomes its own link/entry.
fn action_items(actions: &str) -> Vec<String> {
    actions
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ─── Filtering ────────────────────────────────────────────────────────────────

/// Filter the full in-memory claim list (never the rendered rows).
///
/// `query` matches case-insensitively as a substring against claim id, error
/// type, or status (OR across fields).  `status_filter` and `error_filter`
/// require exact equality when non-empty.
pub fn filter(
    claims: &[Claim],
    query: &str,
    status_filter: &str,
    error_filter: &str,
) -> Vec<Claim> {
    let query = query.trim().to_lowercase();
    claims
        .iter()
        .filter(|c| {
            let query_ok = query.is_empty()
                || c.claim_id.to_lowercase().contains(&query)
                || c.error_type.to_lowercase().contains(&query)
                || c.status.to_lowercase().contains(&query);
            let status_ok = status_filter.is_empty() || c.status == status_filter;
            let error_ok = error_filter.is_empty() || c.error_type == error_filter;
            query_ok && status_ok && error_ok
        })
        .cloned()
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(id: &str, status: &str, error_type: &str) -> Claim {
        Claim {
            claim_id: id.to_string(),
            status: status.to_string(),
            error_type: error_type.to_string(),
            error_explanation: String::new(),
            recommended_action: String::new(),
        }
    }

    #[test]
    fn test_empty_list_renders_single_placeholder() {
        let rows = table_rows(&[]);
        assert_eq!(rows, vec![TableRow::Placeholder(EMPTY_TABLE_MESSAGE)]);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let claims = vec![
            claim("C1", "Validated", "No error"),
            claim("C2", "Not validated", "Medical error"),
        ];
        assert_eq!(table_rows(&claims), table_rows(&claims));
        assert_eq!(table_rows(&claims).len(), 2);
    }

    #[test]
    fn test_pill_requires_exact_validated_status() {
        let rows = table_rows(&[
            claim("C1", "Validated", "No error"),
            claim("C2", "validated", "No error"),
            claim("C3", "Not validated", "Both"),
        ]);
        let pills: Vec<_> = rows
            .iter()
            .map(|r| match r {
                TableRow::Claim(row) => (row.pill_label, row.pill_tone),
                TableRow::Placeholder(_) => unreachable!(),
            })
            .collect();
        assert_eq!(
            pills,
            vec![
                ("Success", Tone::Success),
                ("Error", Tone::Error),
                ("Error", Tone::Error),
            ]
        );
    }

    #[test]
    fn test_explanation_bullets_stripped() {
        let mut c = claim("C1", "Not validated", "Both");
        c.error_explanation = "- First issue\n• Second issue\nThird issue\n\n".to_string();
        let rows = table_rows(&[c]);
        let TableRow::Claim(row) = &rows[0] else {
            panic!("expected claim row");
        };
        assert_eq!(row.explanation, vec!["First issue", "Second issue", "Third issue"]);
    }

    #[test]
    fn test_actions_split_on_semicolons() {
        let mut c = claim("C1", "Not validated", "Technical error");
        c.recommended_action = "Resubmit claim; Contact payer ;".to_string();
        let rows = table_rows(&[c]);
        let TableRow::Claim(row) = &rows[0] else {
            panic!("expected claim row");
        };
        assert_eq!(row.actions, vec!["Resubmit claim", "Contact payer"]);
    }

    #[test]
    fn test_empty_filter_reproduces_list_and_order() {
        let claims = vec![
            claim("C3", "Validated", "No error"),
            claim("C1", "Not validated", "Medical error"),
            claim("C2", "Not validated", "Technical error"),
        ];
        let filtered = filter(&claims, "", "", "");
        assert_eq!(filtered, claims);
        assert_eq!(table_rows(&filtered).len(), table_rows(&claims).len());
    }

    #[test]
    fn test_query_matches_any_field_case_insensitively() {
        let claims = vec![
            claim("CLM-001", "Validated", "No error"),
            claim("CLM-002", "Not validated", "Medical error"),
        ];
        assert_eq!(filter(&claims, "clm-001", "", "").len(), 1);
        assert_eq!(filter(&claims, "MEDICAL", "", "").len(), 1);
        assert_eq!(filter(&claims, "not valid", "", "").len(), 1);
        assert_eq!(filter(&claims, "clm", "", "").len(), 2);
        assert_eq!(filter(&claims, "zzz", "", "").len(), 0);
    }

    #[test]
    fn test_status_and_error_filters_are_exact() {
        let claims = vec![
            claim("C1", "Validated", "No error"),
            claim("C2", "Not validated", "Medical error"),
            claim("C3", "Not validated", "Technical error"),
        ];
        assert_eq!(filter(&claims, "", "Not validated", "").len(), 2);
        assert_eq!(filter(&claims, "", "", "Medical error").len(), 1);
        // Exact match — a prefix does not qualify.
        assert_eq!(filter(&claims, "", "Not", "").len(), 0);
        // Query and filters combine with AND.
        assert_eq!(filter(&claims, "C3", "Not validated", "").len(), 1);
        assert_eq!(filter(&claims, "C1", "Not validated", "").len(), 0);
    }
}

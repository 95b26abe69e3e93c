// SPDX-License-Identifier: MIT
//! Integration tests for the upload-validate-render pipeline at the library
//! boundary: raw backend JSON in, rendered rows/bars and summaries out.

use serde_json::json;

use claimctl::api::types::ValidateResponse;
use claimctl::model::{normalize_claims, MetricRow};
use claimctl::render::metrics::{chart, ChartView};
use claimctl::render::results::{filter, table_rows, TableRow, EMPTY_TABLE_MESSAGE};
use claimctl::render::Tone;
use claimctl::settings::{CapsEditor, EMPTY_CAPS_MESSAGE};
use claimctl::upload::classify;

/// Validate response with one clean claim → success summary, normalized
/// status "Validated".
#[test]
fn test_clean_validate_response_scenario() {
    let resp: ValidateResponse = serde_json::from_value(json!({
        "claims": [{"claim_id": "C1", "error_type": "No error"}],
        "processed": 1
    }))
    .unwrap();

    let claims = normalize_claims(&resp.claims);
    assert_eq!(claims[0].status, "Validated");

    let outcome = classify(resp.processed.unwrap(), &claims);
    assert_eq!(outcome.summary, "1 processed, no errors found");
    assert_eq!(outcome.tone, Tone::Success);
}

/// One medical error → "1 failed checks" in the error tone.
#[test]
fn test_failed_validate_response_scenario() {
    let resp: ValidateResponse = serde_json::from_value(json!({
        "claims": [{"claim_id": "C1", "error_type": "Medical error",
                    "explanation": "- Diagnosis does not support procedure"}],
        "processed": 1
    }))
    .unwrap();

    let claims = normalize_claims(&resp.claims);
    assert_eq!(claims[0].status, "Not validated");

    let outcome = classify(1, &claims);
    assert_eq!(outcome.summary, "1 failed checks");
    assert_eq!(outcome.tone, Tone::Error);
}

/// Rendering then filtering with empty query/filters reproduces the original
/// list's row count and order, even for mixed-field-name backends.
#[test]
fn test_render_then_empty_filter_is_identity() {
    let raws = vec![
        json!({"claimId": "C3", "errorType": "Technical error"}),
        json!({"claim_id": "C1", "error_type": "No error"}),
        json!({"id": "C2", "error_type": "Both", "status": "Not validated"}),
    ];
    let claims = normalize_claims(&raws);
    let filtered = filter(&claims, "", "", "");

    assert_eq!(filtered, claims);
    let rows = table_rows(&filtered);
    assert_eq!(rows.len(), 3);
    let ids: Vec<_> = rows
        .iter()
        .map(|r| match r {
            TableRow::Claim(row) => row.claim_id.as_str(),
            TableRow::Placeholder(_) => unreachable!(),
        })
        .collect();
    assert_eq!(ids, vec!["C3", "C1", "C2"]);
}

#[test]
fn test_empty_inputs_render_placeholders() {
    assert_eq!(table_rows(&[]), vec![TableRow::Placeholder(EMPTY_TABLE_MESSAGE)]);
    assert!(chart(&[], ChartView::Counts, "AED").is_empty());
    assert!(chart(&[], ChartView::Amounts, "AED").is_empty());
}

/// Positional metric rows flow through deserialization into chart bars whose
/// widths sum to 100%.
#[test]
fn test_positional_metrics_to_chart() {
    let metrics: Vec<MetricRow> = serde_json::from_value(json!([
        ["No error", 6, 600.0],
        ["Medical error", 3, -300.0],
        ["Technical error", 1, 100.0]
    ]))
    .unwrap();

    let bars = chart(&metrics, ChartView::Amounts, "AED");
    let total: f64 = bars.iter().map(|b| b.percent).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(bars[1].value_label, "-AED 300.00");
}

/// addCap then removeCap(0) leaves the caps list empty and the table showing
/// its empty-state message.
#[test]
fn test_caps_add_remove_scenario() {
    let mut caps = CapsEditor::default();
    caps.add("99213", 150.0);
    caps.remove(0);

    assert!(caps.is_empty());
    assert_eq!(EMPTY_CAPS_MESSAGE, "No caps configured");
    // The serialized payload round-trips as an empty array.
    assert_eq!(caps.to_json(), "[]");
}

// ─── Property tests ───────────────────────────────────────────────────────────

mod properties {
    use super::*;
    use claimctl::model::Claim;
    use proptest::prelude::*;

    fn arb_claim() -> impl Strategy<Value = Claim> {
        (
            "[A-Z]{1,3}-[0-9]{1,4}",
            prop_oneof![Just("Validated"), Just("Not validated")],
            prop_oneof![
                Just("No error"),
                Just("Medical error"),
                Just("Technical error"),
                Just("Both")
            ],
        )
            .prop_map(|(id, status, error_type)| Claim {
                claim_id: id,
                status: status.to_string(),
                error_type: error_type.to_string(),
                error_explanation: String::new(),
                recommended_action: String::new(),
            })
    }

    proptest! {
        /// Empty query and filters never drop or reorder claims.
        #[test]
        fn prop_empty_filter_identity(claims in prop::collection::vec(arb_claim(), 0..20)) {
            prop_assert_eq!(&filter(&claims, "", "", ""), &claims);
        }

        /// Filtering is monotone: adding a status filter never grows the set.
        #[test]
        fn prop_status_filter_shrinks(claims in prop::collection::vec(arb_claim(), 0..20)) {
            let all = filter(&claims, "", "", "");
            let validated = filter(&claims, "", "Validated", "");
            prop_assert!(validated.len() <= all.len());
            prop_assert!(validated.iter().all(|c| c.status == "Validated"));
        }

        /// Chart widths sum to ~100% whenever any count is positive, and
        /// every width is within [0, 100].
        #[test]
        fn prop_chart_widths(counts in prop::collection::vec(0u64..1000, 1..6)) {
            let metrics: Vec<MetricRow> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| MetricRow {
                    category: format!("cat-{i}"),
                    count: *c,
                    amount: 0.0,
                })
                .collect();
            let bars = chart(&metrics, ChartView::Counts, "AED");
            let total: f64 = bars.iter().map(|b| b.percent).sum();
            if counts.iter().any(|c| *c > 0) {
                prop_assert!((total - 100.0).abs() < 1e-6);
            } else {
                prop_assert_eq!(total, 0.0);
            }
            prop_assert!(bars.iter().all(|b| (0.0..=100.0).contains(&b.percent)));
        }

        /// Amount labels always carry the currency code and never panic.
        #[test]
        fn prop_amount_labels(amount in -1e9f64..1e9f64) {
            let label = claimctl::render::metrics::format_amount(amount, "AED");
            prop_assert!(label.contains("AED"));
            prop_assert_eq!(amount < 0.0, label.starts_with('-'));
        }
    }
}

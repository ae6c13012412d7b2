//! Integration tests for bom-recon
//!
//! These tests verify end-to-end functionality of catalog import, version
//! resolution, reconciliation, finalize and report generation.

use bom_recon::{
    BomReconError,
    actions::{FinalizeSelection, SelectedItem},
    catalog::{Activation, BomCatalog, MaterialDraft, plan_version_edit},
    config::{AppConfig, FinalizeConfig},
    model::{ActionItemStatus, ActionItemType, ActualPart, parse_line_items, parse_observation},
    pipeline::{ReportSubject, Workspace, load_inputs, load_observation, render_report},
    reconcile::{Classification, ReconcileEngine},
    reports::{ReportConfig, ReportFormat},
    viewmodel::{action_groups, bom_groups},
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("Failed to read fixture")
}

fn catalog() -> BomCatalog {
    let items = parse_line_items(&fixture("catalog.json")).expect("Failed to parse catalog");
    let upper: Vec<_> = items
        .into_iter()
        .map(|mut item| {
            item.material = item.material.trim().to_uppercase();
            item
        })
        .collect();
    BomCatalog::restore(upper, Vec::new()).expect("Failed to restore catalog")
}

fn scenario_parts() -> Vec<ActualPart> {
    vec![
        ActualPart::new("CAP-100", 3).unwrap(),
        ActualPart::new("RES-220", 3).unwrap(),
        ActualPart::new("DIODE-9", 2).unwrap(),
    ]
}

// ============================================================================
// Wire Boundary Tests
// ============================================================================

mod wire_tests {
    use super::*;

    #[test]
    fn test_catalog_fixture_normalizes_versions() {
        let items = parse_line_items(&fixture("catalog.json")).unwrap();
        assert_eq!(items.len(), 7);

        let panel: Vec<_> = items.iter().filter(|i| i.bom_code == "PNL-7").collect();
        assert!(panel.iter().all(|i| i.version_tag == "default"));
        assert_eq!(panel[0].description, "Breaker 16A");
        assert_eq!(panel[1].qty, 1);
    }

    #[test]
    fn test_observation_fixture_nullable_fields() {
        let observation = parse_observation(&fixture("observation.json")).unwrap();
        assert_eq!(observation.bom_code, "BC-01");
        assert_eq!(observation.wbs_number.as_deref(), Some("WBS-2024-118"));
        assert_eq!(observation.project, None);
        assert_eq!(observation.tested_by.as_deref(), Some("QA line 2"));
        assert_eq!(observation.total_qty(), 8);
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let json = r#"{"bomCode": "BC-01", "actualParts": [{"material": "CAP-100", "qty": 2.5}]}"#;
        let err = parse_observation(json).unwrap_err();
        assert!(err.to_string().contains("Invalid quantity"), "got: {err}");
    }

    #[test]
    fn test_negative_line_item_quantity_rejected() {
        let json = r#"[{"id": 1, "bomCode": "BC-01", "material": "CAP-100", "qty": -1}]"#;
        assert!(parse_line_items(json).is_err());
    }

    #[test]
    fn test_null_actual_parts_is_empty_observation() {
        let json = r#"{"bomCode": "BC-01", "actualParts": null}"#;
        let observation = parse_observation(json).unwrap();
        assert!(observation.parts.is_empty());
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

mod scenario_tests {
    use super::*;

    /// Shortage and unlisted are reported, the exact match is not.
    #[test]
    fn test_scenario_a_reconciliation() {
        let mut catalog = BomCatalog::new();
        catalog
            .insert(bom_recon::model::NewLineItem::new("BC-01", "CAP-100", 5))
            .unwrap();
        catalog
            .insert(bom_recon::model::NewLineItem::new("BC-01", "RES-220", 3))
            .unwrap();

        let items = catalog.active_items("BC-01").unwrap();
        let result = ReconcileEngine::new()
            .reconcile_version("BC-01", "default", &items, &scenario_parts())
            .unwrap();

        assert_eq!(result.items.len(), 2);
        let cap = result.find("CAP-100").unwrap();
        assert_eq!(cap.classification, Classification::Shortage);
        assert_eq!(cap.missing(), 2);
        let diode = result.find("DIODE-9").unwrap();
        assert_eq!(diode.classification, Classification::Unlisted);
        assert_eq!(diode.surplus(), 2);
        assert!(result.find("RES-220").is_none());
    }

    /// Finalizing both findings creates one shortage and one unlisted item.
    #[test]
    fn test_scenario_b_finalize() {
        let catalog = catalog();
        let observation = bom_recon::model::Observation::new("BC-01", scenario_parts());
        let result = ReconcileEngine::new()
            .reconcile_observation(&catalog, &observation)
            .unwrap();

        let workspace = Workspace::new(true);
        let selection = result.proposal(&FinalizeConfig::default());
        let created = workspace
            .actions
            .finalize("BC-01", &selection, Some(result.fingerprint))
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].item_type, ActionItemType::Shortage);
        assert_eq!(created[0].quantity_diff, -2);
        assert_eq!(created[0].status, ActionItemStatus::BaruMasuk);
        assert_eq!(created[1].item_type, ActionItemType::Unlisted);
        assert_eq!(created[1].quantity_diff, 2);
        assert_eq!(created[1].status, ActionItemStatus::BaruMasuk);

        let batches = workspace.actions.batches_for("BC-01");
        assert_eq!(batches[0].fingerprint, Some(result.fingerprint));
    }

    /// Activating an empty tag fails; re-activating is a no-op.
    #[test]
    fn test_scenario_c_activation() {
        let catalog = catalog();
        match catalog.set_active_version("BC-01", "rev-c") {
            Err(BomReconError::InvalidVersion { version_tag, .. }) => {
                assert_eq!(version_tag, "rev-c");
            }
            other => panic!("Expected InvalidVersion, got {other:?}"),
        }

        let first = catalog.set_active_version("BC-01", "rev-b").unwrap();
        assert_eq!(first, Activation::Changed { previous: None });
        let snapshot = catalog.active_snapshot();
        let second = catalog.set_active_version("BC-01", "rev-b").unwrap();
        assert_eq!(second, Activation::Unchanged);
        assert_eq!(catalog.active_snapshot(), snapshot);
    }

    #[test]
    fn test_unknown_bom_code() {
        let catalog = catalog();
        assert!(matches!(
            catalog.set_active_version("BC-99", "default"),
            Err(BomReconError::UnknownBomCode(_))
        ));
    }
}

// ============================================================================
// Catalog Tests
// ============================================================================

mod catalog_tests {
    use super::*;

    #[test]
    fn test_reconcile_follows_active_version() {
        let catalog = catalog();
        let observation = bom_recon::model::Observation::new("BC-01", scenario_parts());
        let engine = ReconcileEngine::new();

        let before = engine.reconcile_observation(&catalog, &observation).unwrap();
        assert_eq!(before.version_tag, "default");

        catalog.set_active_version("BC-01", "rev-b").unwrap();
        let after = engine.reconcile_observation(&catalog, &observation).unwrap();
        assert_eq!(after.version_tag, "rev-b");
        assert_eq!(after.items.len(), 1);
        assert_eq!(after.items[0].classification, Classification::Shortage);
        assert_eq!(after.items[0].difference, -1);
        assert_ne!(before.fingerprint, after.fingerprint);
    }

    #[test]
    fn test_edit_fixture_plans_one_batch() {
        let mut catalog = catalog();
        let drafts: Vec<MaterialDraft> =
            serde_json::from_str(&fixture("edit_drafts.json")).unwrap();
        let original = catalog.version_items("BC-01", "default");

        let plan = plan_version_edit("BC-01", None, &original, drafts, true).unwrap();
        assert_eq!(plan.counts(), (1, 1, 1));

        let report = catalog.apply_batch(plan).unwrap();
        assert_eq!(report.updated, vec![1]);
        assert_eq!(report.deleted, vec![2]);

        let materials: Vec<String> = catalog
            .version_items("BC-01", "default")
            .into_iter()
            .map(|i| i.material)
            .collect();
        assert_eq!(materials, vec!["CAP-100", "LED-5"]);
    }

    #[test]
    fn test_failed_batch_leaves_catalog_untouched() {
        let mut catalog = catalog();
        let before: Vec<_> = catalog.items().cloned().collect();
        let plan = bom_recon::catalog::BatchPlan::new()
            .delete(1)
            .delete(404)
            .create(bom_recon::model::NewLineItem::new("BC-01", "LED-5", 0));

        match catalog.apply_batch(plan) {
            Err(BomReconError::PartialBatchFailure { failed, total, .. }) => {
                assert_eq!(failed, 2);
                assert_eq!(total, 3);
            }
            other => panic!("Expected PartialBatchFailure, got {other:?}"),
        }
        let after: Vec<_> = catalog.items().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_deleting_active_version_falls_back() {
        let mut catalog = catalog();
        catalog.set_active_version("BC-01", "rev-b").unwrap();
        catalog.delete_version("BC-01", "rev-b").unwrap();
        assert_eq!(catalog.active_version("BC-01").unwrap(), "default");
    }

    #[test]
    fn test_grouped_views() {
        let catalog = catalog();
        let groups = catalog.groups().unwrap();
        let views = bom_groups(&groups, 2);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].bom_code, "BC-01");
        assert_eq!(views[0].versions, vec!["default", "rev-b"]);
        assert_eq!(views[0].total_qty, 8);
        assert_eq!(views[1].line_count, 2);
    }

    #[test]
    fn test_flat_rows_conserve_quantity() {
        let catalog = catalog();
        let rows = catalog.aggregated(None);
        let raw: i64 = catalog.items().map(|i| i.qty).sum();
        let flat: i64 = rows.iter().map(|r| r.qty).sum();
        assert_eq!(raw, flat);
    }
}

// ============================================================================
// Detection Tests
// ============================================================================

mod detection_tests {
    use super::*;

    #[test]
    fn test_detection_fixture_sums_views() {
        let observation =
            load_observation(&fixture_path("detections.json"), Some("BC-01"), true).unwrap();
        let find = |m: &str| observation.parts.iter().find(|p| p.material == m).unwrap();

        assert_eq!(find("CAP-100").qty, 3);
        assert_eq!(find("DIODE-9").qty, 2);
        assert_eq!(find("DIODE-9").views.len(), 2);
        assert!(!observation.parts.iter().any(|p| p.material == "FAN-80"));
    }

    #[test]
    fn test_detection_requires_bom_code() {
        assert!(load_observation(&fixture_path("detections.json"), None, true).is_err());
    }
}

// ============================================================================
// Workspace and Action Tests
// ============================================================================

mod workspace_tests {
    use super::*;

    fn seeded_state(tmp: &TempDir) -> PathBuf {
        let state = tmp.path().join("state.json");
        let mut workspace = Workspace::new(true);
        let items = parse_line_items(&fixture("catalog.json")).unwrap();
        workspace.import_items(items).unwrap();
        workspace.save(&state).unwrap();
        state
    }

    #[test]
    fn test_joint_load_and_reconcile() {
        let tmp = TempDir::new().unwrap();
        let state = seeded_state(&tmp);

        let inputs = load_inputs(&state, &fixture_path("observation.json"), None, true).unwrap();
        let result = ReconcileEngine::new()
            .reconcile_observation(&inputs.workspace.catalog, &inputs.observation)
            .unwrap();
        assert_eq!(result.summary.shortages, 1);
        assert_eq!(result.summary.unlisted, 1);
    }

    #[test]
    fn test_joint_load_fails_when_either_input_fails() {
        let tmp = TempDir::new().unwrap();
        let state = seeded_state(&tmp);
        let missing = tmp.path().join("missing.json");
        assert!(load_inputs(&state, &missing, None, true).is_err());

        let corrupt = tmp.path().join("corrupt.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        assert!(load_inputs(&corrupt, &fixture_path("observation.json"), None, true).is_err());
    }

    #[test]
    fn test_double_finalize_then_reset() {
        let workspace = Workspace::new(true);
        let selection = FinalizeSelection {
            shortages: vec![SelectedItem::new("CAP-100", 2)],
            unlisted: Vec::new(),
        };
        let created = workspace.actions.finalize("BC-01", &selection, None).unwrap();

        assert!(matches!(
            workspace.actions.finalize("BC-01", &selection, None),
            Err(BomReconError::AlreadyFinalized { batch: 1, unresolved: 1, .. })
        ));

        workspace
            .actions
            .update_status(created[0].id, ActionItemStatus::Selesai)
            .unwrap();
        let second = workspace.actions.finalize("BC-01", &selection, None).unwrap();
        assert_eq!(second[0].batch, 2);

        assert_eq!(workspace.actions.reset("BC-01"), 2);
        let third = workspace.actions.finalize("BC-01", &selection, None).unwrap();
        assert_eq!(third[0].batch, 1);
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_ledger() {
        let tmp = TempDir::new().unwrap();
        let state = seeded_state(&tmp);
        let workspace = Workspace::load(&state, true).unwrap();
        workspace.catalog.set_active_version("BC-01", "rev-b").unwrap();
        let selection = FinalizeSelection {
            shortages: Vec::new(),
            unlisted: vec![SelectedItem::new("FAN-80", 1)],
        };
        workspace.actions.finalize("BC-01", &selection, Some(7)).unwrap();
        workspace.save(&state).unwrap();

        let reloaded = Workspace::load(&state, true).unwrap();
        assert_eq!(reloaded.catalog.active_version("BC-01").unwrap(), "rev-b");
        assert_eq!(reloaded.actions.list().len(), 1);
        assert_eq!(reloaded.actions.batches_for("BC-01")[0].fingerprint, Some(7));
    }
}

// ============================================================================
// Report Tests
// ============================================================================

mod report_tests {
    use super::*;

    fn config(format: ReportFormat) -> AppConfig {
        AppConfig::builder().output_format(format).no_color(true).build()
    }

    #[test]
    fn test_json_reconcile_report() {
        let catalog = catalog();
        let observation = bom_recon::model::Observation::new("BC-01", scenario_parts());
        let result = ReconcileEngine::new()
            .reconcile_observation(&catalog, &observation)
            .unwrap();

        let output = render_report(
            &config(ReportFormat::Json),
            ReportSubject::Reconcile(&result),
            &ReportConfig::default(),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["bomCode"], "BC-01");
        assert_eq!(json["summary"]["shortages"], 1);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_table_action_report() {
        let workspace = Workspace::new(true);
        let selection = FinalizeSelection {
            shortages: vec![SelectedItem::new("CAP-100", 2), SelectedItem::new("RES-220", 1)],
            unlisted: vec![
                SelectedItem::new("D-9", 2),
                SelectedItem::new("F-8", 1),
                SelectedItem::new("L-5", 3),
            ],
        };
        workspace.actions.finalize("BC-01", &selection, None).unwrap();
        let groups = action_groups(&workspace.actions.list(), 2);

        let output = render_report(
            &config(ReportFormat::Table),
            ReportSubject::Actions(&groups),
            &ReportConfig::default(),
        )
        .unwrap();
        assert!(output.contains("BC-01 (5)"));
        assert!(output.contains("D-9 (+2), F-8 (+1) +1"));
    }
}

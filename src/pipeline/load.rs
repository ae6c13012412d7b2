//! Loading catalog, observation and detection files.

use super::PipelineError;
use super::state::Workspace;
use crate::model::{BomLineItem, Observation, parse_line_items, parse_observation};
use crate::reconcile::{DetectionResult, ObservationSet};
use anyhow::{Context, Result};
use std::path::Path;

/// Read a JSON array of line item records.
pub fn load_line_items(path: &Path) -> Result<Vec<BomLineItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let items = parse_line_items(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;
    tracing::debug!("Read {} line items from {}", items.len(), path.display());
    Ok(items)
}

/// Read an observation file.
///
/// The file is either one observation record (`{"bomCode": ..,
/// "actualParts": [..]}`) or the raw detector output, a JSON array of
/// per-view results. Detector output carries no BOM code, so `bom_code`
/// is required for it; for a record it overrides the recorded code.
pub fn load_observation(
    path: &Path,
    bom_code: Option<&str>,
    upper_case_materials: bool,
) -> Result<Observation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read observation file: {}", path.display()))?;

    let observation = if content.trim_start().starts_with('[') {
        let Some(code) = bom_code else {
            anyhow::bail!(
                "{} holds detection output; pass the BOM code it was taken for",
                path.display()
            );
        };
        let detections: Vec<DetectionResult> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse detection output: {}", path.display()))?;
        ObservationSet::from_detections(code, &detections, upper_case_materials)?
            .into_observation()
    } else {
        let mut observation = parse_observation(&content)
            .with_context(|| format!("Failed to parse observation: {}", path.display()))?;
        if let Some(code) = bom_code {
            code.clone_into(&mut observation.bom_code);
        }
        observation
    };

    tracing::debug!(
        "Observation for {}: {} materials, {} parts in total",
        observation.bom_code,
        observation.parts.len(),
        observation.total_qty()
    );
    Ok(observation)
}

/// Workspace and observation, loaded together.
#[derive(Debug)]
pub struct LoadedInputs {
    pub workspace: Workspace,
    pub observation: Observation,
}

/// Load the workspace snapshot and the observation in parallel.
///
/// Both must succeed: a reconciliation against a partially loaded catalog
/// would report wrong shortages.
pub fn load_inputs(
    state_path: &Path,
    observation_path: &Path,
    bom_code: Option<&str>,
    upper_case_materials: bool,
) -> Result<LoadedInputs> {
    let (workspace, observation) = rayon::join(
        || Workspace::load(state_path, upper_case_materials),
        || load_observation(observation_path, bom_code, upper_case_materials),
    );

    let workspace = workspace.map_err(|source| PipelineError::LoadFailed {
        path: state_path.display().to_string(),
        source,
    })?;
    let observation = observation.map_err(|source| PipelineError::LoadFailed {
        path: observation_path.display().to_string(),
        source,
    })?;
    Ok(LoadedInputs {
        workspace,
        observation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_observation_record() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "obs.json",
            r#"{"bomCode": "BC-01", "actualParts": [{"material": "CAP-100", "qty": 3}]}"#,
        );
        let obs = load_observation(&path, None, true).unwrap();
        assert_eq!(obs.bom_code, "BC-01");
        assert_eq!(obs.total_qty(), 3);

        let obs = load_observation(&path, Some("BC-02"), true).unwrap();
        assert_eq!(obs.bom_code, "BC-02");
    }

    #[test]
    fn test_load_detection_output_needs_code() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "detections.json",
            r#"[
                {"view": "front", "summary": [{"className": "cap-100", "count": 2}]},
                {"view": "left", "summary": [{"className": "CAP-100", "crops": ["a.png"]}]}
            ]"#,
        );
        assert!(load_observation(&path, None, true).is_err());

        let obs = load_observation(&path, Some("BC-01"), true).unwrap();
        assert_eq!(obs.parts.len(), 1);
        assert_eq!(obs.parts[0].qty, 3);
        assert_eq!(obs.parts[0].views.len(), 2);
    }

    #[test]
    fn test_load_inputs_fails_when_either_side_fails() {
        let tmp = TempDir::new().unwrap();
        let state = tmp.path().join("state.json");
        let missing = tmp.path().join("missing.json");

        let err = load_inputs(&state, &missing, None, true).unwrap_err();
        assert!(err.to_string().contains("missing.json"));

        let obs = write(&tmp, "obs.json", r#"{"bomCode": "BC-01", "actualParts": null}"#);
        let inputs = load_inputs(&state, &obs, None, true).unwrap();
        assert!(inputs.workspace.catalog.is_empty());
        assert!(inputs.observation.parts.is_empty());
    }

    #[test]
    fn test_load_line_items_rejects_fractional_qty() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "catalog.json",
            r#"[{"id": 1, "bomCode": "BC-01", "material": "CAP-100", "qty": 1.5}]"#,
        );
        let err = load_line_items(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid quantity"));
    }
}

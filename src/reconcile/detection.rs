//! Building observation sets from detection output or manual entry.

use crate::error::{BomReconError, Result};
use crate::model::{ActualPart, Observation, add_qty, normalize_material};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-class detections of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub class_name: String,
    /// Explicit count; the number of crops is used when absent
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub crops: Vec<String>,
}

impl DetectionSummary {
    #[must_use]
    pub fn quantity(&self) -> i64 {
        self.count
            .unwrap_or_else(|| i64::try_from(self.crops.len()).unwrap_or(i64::MAX))
    }
}

/// Detector output for one viewpoint image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub view: String,
    #[serde(default)]
    pub summary: Vec<DetectionSummary>,
}

/// Observed parts of one BOM code, keyed by normalized material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationSet {
    bom_code: String,
    parts: IndexMap<String, ActualPart>,
    upper_case_materials: bool,
}

impl ObservationSet {
    pub fn new(bom_code: impl Into<String>) -> Self {
        Self {
            bom_code: bom_code.into(),
            parts: IndexMap::new(),
            upper_case_materials: true,
        }
    }

    #[must_use]
    pub const fn with_material_case(mut self, upper_case: bool) -> Self {
        self.upper_case_materials = upper_case;
        self
    }

    /// Sum detector counts per material across views.
    ///
    /// Classes with a zero count are skipped; a negative count is rejected.
    pub fn from_detections(
        bom_code: impl Into<String>,
        detections: &[DetectionResult],
        upper_case: bool,
    ) -> Result<Self> {
        let mut set = Self::new(bom_code).with_material_case(upper_case);
        for detection in detections {
            for summary in &detection.summary {
                let qty = summary.quantity();
                let context =
                    || format!("detection of {} in view {}", summary.class_name, detection.view);
                if qty < 0 {
                    return Err(BomReconError::invalid_quantity(context(), qty));
                }
                if qty == 0 || summary.class_name.trim().is_empty() {
                    continue;
                }
                let material = normalize_material(&summary.class_name, upper_case);
                let part = set
                    .parts
                    .entry(material.clone())
                    .or_insert_with(|| ActualPart {
                        material,
                        qty: 0,
                        views: Default::default(),
                    });
                part.qty = add_qty(context(), part.qty, qty)?;
                part.views.insert(detection.view.clone());
            }
        }
        tracing::debug!(
            "Built observation for {} from {} views: {} materials",
            set.bom_code,
            detections.len(),
            set.parts.len()
        );
        Ok(set)
    }

    #[must_use]
    pub fn bom_code(&self) -> &str {
        &self.bom_code
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn get(&self, material: &str) -> Option<&ActualPart> {
        self.parts
            .get(&normalize_material(material, self.upper_case_materials))
    }

    /// Add a manually counted material.
    ///
    /// Rejects blank and duplicate materials and non-positive quantities.
    pub fn add_manual<I, S>(&mut self, material: &str, qty: i64, views: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let part = ActualPart::new(material, qty)?
            .with_views(views)
            .normalized(self.upper_case_materials);
        if self.parts.contains_key(&part.material) {
            return Err(BomReconError::validation(format!(
                "material {} is already in the observation",
                part.material
            )));
        }
        self.parts.insert(part.material.clone(), part);
        Ok(())
    }

    /// Replace the quantity of a material already in the set.
    pub fn set_qty(&mut self, material: &str, qty: i64) -> Result<()> {
        let key = normalize_material(material, self.upper_case_materials);
        let qty = crate::model::validate_qty(format!("observed part {key}"), qty)?;
        let part = self.parts.get_mut(&key).ok_or_else(|| {
            BomReconError::validation(format!("material {key} is not in the observation"))
        })?;
        part.qty = qty;
        Ok(())
    }

    /// Add `view` to a material if absent, remove it if present. Returns
    /// whether the view is now set.
    pub fn toggle_view(&mut self, material: &str, view: &str) -> Result<bool> {
        let key = normalize_material(material, self.upper_case_materials);
        let part = self.parts.get_mut(&key).ok_or_else(|| {
            BomReconError::validation(format!("material {key} is not in the observation"))
        })?;
        if part.views.remove(view) {
            Ok(false)
        } else {
            part.views.insert(view.to_string());
            Ok(true)
        }
    }

    pub fn remove(&mut self, material: &str) -> Option<ActualPart> {
        self.parts
            .shift_remove(&normalize_material(material, self.upper_case_materials))
    }

    pub fn parts(&self) -> impl Iterator<Item = &ActualPart> {
        self.parts.values()
    }

    #[must_use]
    pub fn into_observation(self) -> Observation {
        Observation::new(self.bom_code, self.parts.into_values().collect())
    }
}

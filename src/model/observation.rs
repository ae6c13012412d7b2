//! Actual-part observations.

use super::bom::{normalize_material, validate_qty};
use crate::error::{BomReconError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An observed physical part count, optionally tagged with the image
/// viewpoints it was seen in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualPart {
    pub material: String,
    pub qty: i64,
    /// Viewpoints, deduplicated; ordering carries no meaning
    #[serde(default)]
    pub views: BTreeSet<String>,
}

impl ActualPart {
    /// Create an observation, rejecting blank materials and `qty < 1`.
    pub fn new(material: impl Into<String>, qty: i64) -> Result<Self> {
        let material = material.into();
        if material.trim().is_empty() {
            return Err(BomReconError::validation("observed part has a blank material"));
        }
        let qty = validate_qty(format!("observed part {material}"), qty)?;
        Ok(Self {
            material,
            qty,
            views: BTreeSet::new(),
        })
    }

    #[must_use]
    pub fn with_views<I, S>(mut self, views: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.views.extend(views.into_iter().map(Into::into));
        self
    }

    /// Apply the same material normalization used by the catalog.
    #[must_use]
    pub fn normalized(mut self, upper_case: bool) -> Self {
        self.material = normalize_material(&self.material, upper_case);
        self
    }
}

/// A submitted observation set for one BOM code, plus the optional context
/// the tracking record carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub bom_code: String,
    /// Version the observation was taken against, if the source recorded one
    pub version_tag: Option<String>,
    pub wbs_number: Option<String>,
    pub project: Option<String>,
    pub tested_by: Option<String>,
    pub switchboard_name: String,
    pub compartment_number: String,
    pub parts: Vec<ActualPart>,
}

impl Observation {
    pub fn new(bom_code: impl Into<String>, parts: Vec<ActualPart>) -> Self {
        Self {
            bom_code: bom_code.into(),
            parts,
            ..Self::default()
        }
    }

    /// Total observed quantity across all parts.
    #[must_use]
    pub fn total_qty(&self) -> i64 {
        self.parts.iter().fold(0, |acc, p| acc.saturating_add(p.qty))
    }
}

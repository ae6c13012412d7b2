//! Serialization-boundary records.
//!
//! Upstream services send optional foreign fields as `{value, present}`
//! pairs (the legacy `{String, Valid}` spelling is accepted too) and
//! quantities as arbitrary JSON numbers. These records decode that shape
//! and convert into the domain types, which only ever see `Option<T>` and
//! validated integer quantities.

use super::bom::{BomLineItem, normalize_version_tag, validate_qty};
use super::observation::{ActualPart, Observation};
use crate::error::{BomReconError, ErrorContext, ParseErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Explicit-presence optional used on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nullable<T> {
    #[serde(default, alias = "String", alias = "Int64")]
    pub value: T,
    #[serde(default, alias = "Valid")]
    pub present: bool,
}

impl<T> Nullable<T> {
    pub fn into_option(self) -> Option<T> {
        self.present.then_some(self.value)
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self {
                value,
                present: true,
            },
            None => Self {
                value: T::default(),
                present: false,
            },
        }
    }
}

/// Decode a wire quantity: must be a positive integer.
///
/// Integral floats such as `5.0` are accepted when they fit in `i64`.
pub fn qty_from_number(context: &str, number: &Number) -> Result<i64> {
    let qty = number
        .as_i64()
        .or_else(|| number.as_f64().and_then(integral_f64))
        .ok_or_else(|| BomReconError::invalid_quantity(context, number))?;
    validate_qty(context, qty)
}

#[allow(clippy::cast_possible_truncation)]
fn integral_f64(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then(|| value as i64)
}

/// BOM line item as exchanged with the web boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLineItemRecord {
    pub id: u64,
    pub bom_code: String,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub part_reference: String,
    #[serde(alias = "partName")]
    pub material: String,
    #[serde(default, alias = "materialDescription", alias = "partDescription")]
    pub description: String,
    #[serde(alias = "quantity")]
    pub qty: Number,
}

impl BomLineItemRecord {
    pub fn into_domain(self) -> Result<BomLineItem> {
        let context = format!("line item {} ({})", self.id, self.material);
        let qty = qty_from_number(&context, &self.qty)?;
        let item = BomLineItem {
            id: self.id,
            bom_code: self.bom_code,
            version_tag: normalize_version_tag(self.version_tag.as_deref()),
            part_reference: self.part_reference,
            material: self.material,
            description: self.description,
            qty,
        };
        item.validate()?;
        Ok(item)
    }
}

impl From<&BomLineItem> for BomLineItemRecord {
    fn from(item: &BomLineItem) -> Self {
        Self {
            id: item.id,
            bom_code: item.bom_code.clone(),
            version_tag: Some(item.version_tag.clone()),
            part_reference: item.part_reference.clone(),
            material: item.material.clone(),
            description: item.description.clone(),
            qty: Number::from(item.qty),
        }
    }
}

/// Observed part as exchanged with the web boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualPartRecord {
    pub material: String,
    pub qty: Number,
    #[serde(default)]
    pub views: Vec<String>,
}

impl ActualPartRecord {
    pub fn into_domain(self) -> Result<ActualPart> {
        let qty = qty_from_number(&format!("observed part {}", self.material), &self.qty)?;
        Ok(ActualPart::new(self.material, qty)?.with_views(self.views))
    }
}

/// Tracking/observation record as exchanged with the web boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    pub bom_code: String,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub wbs_number: Nullable<String>,
    #[serde(default)]
    pub project: Nullable<String>,
    #[serde(default)]
    pub tested_by: Nullable<String>,
    #[serde(default)]
    pub switchboard_name: String,
    #[serde(default)]
    pub compartment_number: String,
    /// `null` when nothing was entered
    #[serde(default)]
    pub actual_parts: Option<Vec<ActualPartRecord>>,
}

impl ObservationRecord {
    pub fn into_domain(self) -> Result<Observation> {
        if self.bom_code.trim().is_empty() {
            return Err(BomReconError::parse(
                "observation record",
                ParseErrorKind::InvalidValue {
                    field: "bomCode".to_string(),
                    message: "must not be blank".to_string(),
                },
            ));
        }
        let parts = self
            .actual_parts
            .unwrap_or_default()
            .into_iter()
            .map(ActualPartRecord::into_domain)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("observation for {}", self.bom_code))?;

        Ok(Observation {
            bom_code: self.bom_code,
            version_tag: self
                .version_tag
                .as_deref()
                .map(|t| normalize_version_tag(Some(t))),
            wbs_number: self.wbs_number.into_option(),
            project: self.project.into_option(),
            tested_by: self.tested_by.into_option(),
            switchboard_name: self.switchboard_name,
            compartment_number: self.compartment_number,
            parts,
        })
    }
}

impl From<&Observation> for ObservationRecord {
    fn from(obs: &Observation) -> Self {
        Self {
            bom_code: obs.bom_code.clone(),
            version_tag: obs.version_tag.clone(),
            wbs_number: obs.wbs_number.clone().into(),
            project: obs.project.clone().into(),
            tested_by: obs.tested_by.clone().into(),
            switchboard_name: obs.switchboard_name.clone(),
            compartment_number: obs.compartment_number.clone(),
            actual_parts: (!obs.parts.is_empty()).then(|| {
                obs.parts
                    .iter()
                    .map(|p| ActualPartRecord {
                        material: p.material.clone(),
                        qty: Number::from(p.qty),
                        views: p.views.iter().cloned().collect(),
                    })
                    .collect()
            }),
        }
    }
}

/// Parse a JSON array of line item records into domain line items.
pub fn parse_line_items(json: &str) -> Result<Vec<BomLineItem>> {
    let records: Vec<BomLineItemRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .map(BomLineItemRecord::into_domain)
        .collect()
}

/// Parse a single JSON observation record.
pub fn parse_observation(json: &str) -> Result<Observation> {
    let record: ObservationRecord = serde_json::from_str(json)?;
    record.into_domain()
}

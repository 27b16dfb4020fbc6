use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

use warehouse_core::{DomainError, Entity};
use warehouse_inventory::{Dimensions, ExpirationGroup, Pallet, StorageBox, StorageItem};

use crate::app::services::{NewBox, Overview};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePalletRequest {
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

impl CreatePalletRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_measure("width", self.dimensions.width)?;
        check_measure("height", self.dimensions.height)?;
        check_measure("depth", self.dimensions.depth)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBoxRequest {
    #[serde(flatten)]
    pub dimensions: Dimensions,
    pub weight: f64,
    #[serde(default, deserialize_with = "timestamp_or_date")]
    pub manufacture_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp_or_date")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn timestamp_or_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|d| Some(d.and_time(NaiveTime::MIN).and_utc()))
        .map_err(|_| {
            serde::de::Error::custom(format!(
                "{raw:?} is neither an RFC 3339 timestamp nor a YYYY-MM-DD date"
            ))
        })
}

impl CreateBoxRequest {
    /// Boundary rules: a manufacture date is mandatory here even though the
    /// domain model treats it as optional.
    pub fn into_new_box(self) -> Result<NewBox, DomainError> {
        check_measure("width", self.dimensions.width)?;
        check_measure("height", self.dimensions.height)?;
        check_measure("depth", self.dimensions.depth)?;
        check_measure("weight", self.weight)?;
        if self.manufacture_date.is_none() {
            return Err(DomainError::validation("manufacture_date is required"));
        }

        Ok(NewBox {
            width: self.dimensions.width,
            height: self.dimensions.height,
            depth: self.dimensions.depth,
            weight: self.weight,
            manufacture_date: self.manufacture_date,
            expiration_date: self.expiration_date,
        })
    }
}

fn check_measure(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!(
            "{field} must be a finite, non-negative number"
        )));
    }
    Ok(())
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn box_to_json(item: &StorageBox) -> serde_json::Value {
    let dims = item.dimensions();
    serde_json::json!({
        "id": item.id().to_string(),
        "pallet_id": item.pallet_id().to_string(),
        "width": dims.width,
        "height": dims.height,
        "depth": dims.depth,
        "weight": item.weight(),
        "volume": item.volume(),
        "manufacture_date": item.manufacture_date(),
        "expiration_date": item.expiration_date(),
    })
}

pub fn pallet_to_json(pallet: &Pallet) -> serde_json::Value {
    let dims = pallet.dimensions();
    serde_json::json!({
        "id": pallet.id().to_string(),
        "width": dims.width,
        "height": dims.height,
        "depth": dims.depth,
        "weight": pallet.weight(),
        "volume": pallet.volume(),
        "expiration_date": pallet.expiration_date(),
        "boxes": pallet.boxes().iter().map(box_to_json).collect::<Vec<_>>(),
    })
}

fn group_to_json(group: &ExpirationGroup<'_>) -> serde_json::Value {
    serde_json::json!({
        "date": group.date.to_string(),
        "pallets": group.pallets.iter().map(|p| pallet_to_json(p)).collect::<Vec<_>>(),
    })
}

pub fn overview_to_json(overview: &Overview) -> serde_json::Value {
    serde_json::json!({
        "pallets": overview.pallets.iter().map(pallet_to_json).collect::<Vec<_>>(),
        "expiration_groups": overview
            .expiration_groups()
            .iter()
            .map(group_to_json)
            .collect::<Vec<_>>(),
        "top_pallets": overview
            .top_pallets()
            .into_iter()
            .map(pallet_to_json)
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_request_requires_manufacture_date() {
        let req: CreateBoxRequest = serde_json::from_value(serde_json::json!({
            "width": 1.0, "height": 1.0, "depth": 1.0, "weight": 2.0
        }))
        .unwrap();
        assert!(matches!(req.into_new_box(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn box_request_rejects_negative_weight() {
        let req: CreateBoxRequest = serde_json::from_value(serde_json::json!({
            "width": 1.0, "height": 1.0, "depth": 1.0, "weight": -2.0,
            "manufacture_date": "2023-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(matches!(req.into_new_box(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn box_request_accepts_plain_dates() {
        let req: CreateBoxRequest = serde_json::from_value(serde_json::json!({
            "width": 1.0, "height": 1.0, "depth": 1.0, "weight": 2.0,
            "manufacture_date": "2023-01-01",
            "expiration_date": "2023-03-01T12:00:00+02:00"
        }))
        .unwrap();
        let new_box = req.into_new_box().unwrap();
        assert_eq!(
            new_box.manufacture_date,
            Some("2023-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
        assert_eq!(
            new_box.expiration_date,
            Some("2023-03-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }

    #[test]
    fn box_request_rejects_unparseable_dates() {
        let res = serde_json::from_value::<CreateBoxRequest>(serde_json::json!({
            "width": 1.0, "height": 1.0, "depth": 1.0, "weight": 2.0,
            "manufacture_date": "01/01/2023"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn pallet_request_accepts_flat_dimensions() {
        let req: CreatePalletRequest = serde_json::from_value(serde_json::json!({
            "width": 3.0, "height": 2.0, "depth": 2.0
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.dimensions.volume(), 12.0);
    }
}

//! Read-side views over a set of pallets (the warehouse overview).

use chrono::NaiveDate;

use crate::item::StorageItem;
use crate::pallet::Pallet;

/// How many pallets the "longest shelf life" listing shows.
pub const TOP_PALLETS_LIMIT: usize = 3;

/// Pallets sharing the same expiration day.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpirationGroup<'a> {
    pub date: NaiveDate,
    pub pallets: Vec<&'a Pallet>,
}

/// Group dated pallets by the calendar day (UTC) they expire on.
///
/// Groups come out in ascending date order; within a group pallets are ordered
/// by expiration timestamp, then by weight. Pallets without an expiration date
/// are left out.
pub fn group_by_expiration(pallets: &[Pallet]) -> Vec<ExpirationGroup<'_>> {
    let mut dated: Vec<&Pallet> = pallets
        .iter()
        .filter(|p| p.expiration_date().is_some())
        .collect();
    dated.sort_by(|a, b| {
        a.expiration_date()
            .cmp(&b.expiration_date())
            .then_with(|| a.weight().total_cmp(&b.weight()))
    });

    let mut groups: Vec<ExpirationGroup<'_>> = Vec::new();
    for pallet in dated {
        let Some(expires) = pallet.expiration_date() else {
            continue;
        };
        let day = expires.date_naive();
        match groups.last_mut() {
            Some(group) if group.date == day => group.pallets.push(pallet),
            _ => groups.push(ExpirationGroup {
                date: day,
                pallets: vec![pallet],
            }),
        }
    }
    groups
}

/// Up to `limit` non-empty pallets whose boxes keep the longest: ordered by
/// the latest box expiration descending (undated last), then by volume ascending.
pub fn top_pallets(pallets: &[Pallet], limit: usize) -> Vec<&Pallet> {
    let mut loaded: Vec<&Pallet> = pallets.iter().filter(|p| !p.boxes().is_empty()).collect();
    loaded.sort_by(|a, b| {
        b.latest_box_expiration()
            .cmp(&a.latest_box_expiration())
            .then_with(|| a.volume().total_cmp(&b.volume()))
    });
    loaded.truncate(limit);
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use warehouse_core::{BoxId, Entity, PalletId};

    use crate::storage_box::StorageBox;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn pallet_with(height: f64, boxes: &[(f64, Option<DateTime<Utc>>)]) -> Pallet {
        let mut pallet = Pallet::new(PalletId::new(), 3.0, height, 2.0);
        for (weight, expires) in boxes {
            let item = StorageBox::new(
                BoxId::new(),
                1.0,
                1.0,
                1.0,
                *weight,
                pallet.id(),
                None,
                *expires,
            );
            pallet.add_box(item).unwrap();
        }
        pallet
    }

    #[test]
    fn groups_by_day_then_orders_by_weight() {
        let heavy = pallet_with(1.0, &[(20.0, Some(at(2023, 4, 1, 8)))]);
        let light = pallet_with(1.0, &[(5.0, Some(at(2023, 4, 1, 8)))]);
        let later_same_day = pallet_with(1.0, &[(1.0, Some(at(2023, 4, 1, 20)))]);
        let next_day = pallet_with(1.0, &[(1.0, Some(at(2023, 4, 2, 0)))]);
        let undated = pallet_with(1.0, &[(1.0, None)]);
        let empty = pallet_with(1.0, &[]);

        let pallets = vec![
            next_day.clone(),
            heavy.clone(),
            undated,
            later_same_day.clone(),
            light.clone(),
            empty,
        ];
        let groups = group_by_expiration(&pallets);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        let first: Vec<PalletId> = groups[0].pallets.iter().map(|p| p.id()).collect();
        assert_eq!(first, vec![light.id(), heavy.id(), later_same_day.id()]);
        assert_eq!(groups[1].pallets[0].id(), next_day.id());
    }

    #[test]
    fn top_pallets_prefers_latest_expiry_then_smaller_volume() {
        let soon = pallet_with(1.0, &[(1.0, Some(at(2023, 1, 1, 0)))]);
        let late_big = pallet_with(5.0, &[(1.0, Some(at(2024, 1, 1, 0)))]);
        let late_small = pallet_with(1.0, &[(1.0, Some(at(2023, 2, 1, 0))), (1.0, Some(at(2024, 1, 1, 0)))]);
        let undated = pallet_with(1.0, &[(1.0, None)]);
        let empty = pallet_with(1.0, &[]);

        let pallets = vec![
            undated.clone(),
            soon.clone(),
            empty,
            late_big.clone(),
            late_small.clone(),
        ];
        let top: Vec<PalletId> = top_pallets(&pallets, TOP_PALLETS_LIMIT)
            .iter()
            .map(|p| p.id())
            .collect();

        assert_eq!(top, vec![late_small.id(), late_big.id(), soon.id()]);

        let all: Vec<PalletId> = top_pallets(&pallets, 10).iter().map(|p| p.id()).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3], undated.id());
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use super::Holding;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcategoryTotal {
    pub subcategory: String,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_cents: i64,
    /// Share of the grand total in basis points.
    pub share_bps: u32,
    pub subcategories: Vec<SubcategoryTotal>,
}

/// Clamped to `0..=10_000`; negative categories may push a part above the total.
fn share_bps(part: i64, total: i64) -> u32 {
    if total <= 0 || part <= 0 {
        return 0;
    }
    ((part as i128 * 10_000) / total as i128).clamp(0, 10_000) as u32
}

fn checked_total(values: impl IntoIterator<Item = i64>) -> Option<i64> {
    values.into_iter().try_fold(0i64, |acc, v| acc.checked_add(v))
}

fn by_total_then_name<T>(items: &mut [T], total: impl Fn(&T) -> i64, name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| total(b).cmp(&total(a)).then_with(|| name(a).cmp(name(b))));
}

/// Sum closing balances per category and subcategory.
///
/// Categories and subcategories are ordered by total descending, ties by name.
/// Returns the categories and the grand total, or `None` when any total overflows `i64`.
pub fn aggregate(holdings: &[Holding]) -> Option<(Vec<CategoryTotal>, i64)> {
    let mut tree: BTreeMap<&str, BTreeMap<&str, i64>> = BTreeMap::new();
    for h in holdings {
        let slot = tree
            .entry(h.category.as_str())
            .or_default()
            .entry(h.subcategory.as_str())
            .or_default();
        *slot = slot.checked_add(h.closing_balance_cents)?;
    }
    let grand = checked_total(holdings.iter().map(|h| h.closing_balance_cents))?;

    let mut categories = Vec::with_capacity(tree.len());
    for (category, subs) in tree {
        let mut subcategories: Vec<SubcategoryTotal> = subs
            .into_iter()
            .map(|(s, t)| SubcategoryTotal { subcategory: s.to_string(), total_cents: t })
            .collect();
        by_total_then_name(&mut subcategories, |s| s.total_cents, |s| s.subcategory.as_str());
        let total_cents = checked_total(subcategories.iter().map(|s| s.total_cents))?;
        categories.push(CategoryTotal {
            category: category.to_string(),
            total_cents,
            share_bps: share_bps(total_cents, grand),
            subcategories,
        });
    }
    by_total_then_name(&mut categories, |c| c.total_cents, |c| c.category.as_str());
    Some((categories, grand))
}

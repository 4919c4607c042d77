use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// 1-based calendar index of an English month name (case-insensitive, 3-letter abbreviations accepted).
pub fn month_index(name: &str) -> Option<u32> {
    let name = name.trim();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| {
            m.eq_ignore_ascii_case(name)
                || (name.len() == 3 && m[..3].eq_ignore_ascii_case(name))
        })
        .map(|i| i as u32 + 1)
}

/// Canonical month name for storage, e.g. `"mar"` -> `"March"`.
pub fn normalize_month(name: &str) -> Result<String, ModelError> {
    month_index(name)
        .map(|i| MONTHS[(i - 1) as usize].to_string())
        .ok_or_else(|| ModelError::Validation(format!("unknown month: {name}")))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub month: String,
    pub year: i32,
    pub file_key: String,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// `(year, month index)` for calendar-correct ordering; unknown months sort first.
    pub fn period(&self) -> (i32, u32) {
        (self.year, month_index(&self.month).unwrap_or(0))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lookup() {
        assert_eq!(month_index("January"), Some(1));
        assert_eq!(month_index("december"), Some(12));
        assert_eq!(month_index("Sep"), Some(9));
        assert_eq!(month_index("Ju"), None);
        assert_eq!(month_index("Smarch"), None);
    }

    #[test]
    fn normalizes_month_names() {
        assert_eq!(normalize_month("aug").unwrap(), "August");
        assert_eq!(normalize_month(" MAY ").unwrap(), "May");
        assert!(normalize_month("").is_err());
    }
}

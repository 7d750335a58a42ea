use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, AppError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Text and creation-time filters shared by user and product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl ListFilter {
    /// Case-insensitive substring match against any of `fields`.
    pub fn matches_text(&self, fields: &[&str]) -> bool {
        let Some(search) = &self.search else {
            return true;
        };
        let needle = search.to_lowercase();
        fields
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Inclusive on both bounds.
    pub fn matches_created(&self, created_at: DateTime<Utc>) -> bool {
        self.created_from.is_none_or(|from| created_at >= from)
            && self.created_to.is_none_or(|to| created_at <= to)
    }
}

/// Query string accepted by paginated list routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub created_at_from: Option<String>,
    pub created_at_to: Option<String>,
}

impl ListQuery {
    pub fn into_parts(self) -> Result<(Page, ListFilter), AppError> {
        let page = Page::new(self.page, self.limit)?;
        let filter = ListFilter {
            search: self.search.filter(|s| !s.is_empty()),
            created_from: self
                .created_at_from
                .as_deref()
                .map(|s| parse_timestamp("createdAtFrom", s))
                .transpose()?,
            created_to: self
                .created_at_to
                .as_deref()
                .map(|s| parse_timestamp("createdAtTo", s))
                .transpose()?,
        };
        Ok((page, filter))
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Validation(format!("{field} must be a date or RFC 3339 timestamp")))
}

/// Envelope returned by every paginated listing.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            data,
            total,
            page: page.page,
            limit: page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn page_defaults_and_offset() {
        let page = Page::new(None, None).unwrap();
        assert_eq!(page, Page { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
        assert_eq!(Page::new(Some(3), Some(10)).unwrap().offset(), 20);
    }

    #[test]
    fn page_rejects_out_of_range_values() {
        assert!(Page::new(Some(0), None).is_err());
        assert!(Page::new(None, Some(0)).is_err());
        assert!(Page::new(None, Some(MAX_LIMIT + 1)).is_err());
    }

    #[test]
    fn query_parses_dates_and_drops_empty_search() {
        let query = ListQuery {
            search: Some(String::new()),
            created_at_from: Some("2024-03-01".to_string()),
            created_at_to: Some("2024-03-31T23:59:59Z".to_string()),
            ..Default::default()
        };
        let (_, filter) = query.into_parts().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(
            filter.created_from,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            filter.created_to,
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn query_rejects_garbage_dates() {
        let query = ListQuery {
            created_at_from: Some("last tuesday".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_parts(), Err(AppError::Validation(_))));
    }

    #[test]
    fn filter_matching() {
        let at = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let filter = ListFilter {
            search: Some("PHONE".to_string()),
            created_from: Some(at),
            created_to: Some(at),
        };
        assert!(filter.matches_text(&["Headphones", "x"]));
        assert!(!filter.matches_text(&["Speaker", "loud"]));
        assert!(filter.matches_created(at));
        assert!(!filter.matches_created(at + chrono::Duration::seconds(1)));
    }
}

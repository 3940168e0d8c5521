use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds text for search and ordering: decomposes, strips combining
/// marks, maps the Vietnamese đ/Đ (which do not decompose), lowercases.
/// "Đồng Hồ" and "dong ho" compare equal after folding.
pub fn normalize_text(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Case- and diacritic-insensitive containment test.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    normalize_text(haystack).contains(&normalize_text(needle))
}

/// Client-side list filters. Entities consult the fields that apply to
/// them and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Free-text search, matched diacritic-insensitively
    pub search: Option<String>,
    /// Exact status match, case-insensitive
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
    /// Owning record for child collections (attribute values)
    pub parent_id: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    /// Inclusive creation-date window; the end date extends to 23:59:59
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ListFilter {
    /// True when no filter is active, which makes an unforced fetch
    /// eligible for the mirror-serve fast path.
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.status.is_none()
            && self.category_id.is_none()
            && self.brand_id.is_none()
            && self.parent_id.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// The trimmed search term, if one is set. Whitespace-only input
    /// counts as no search.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn matches_status(&self, actual: &str) -> bool {
        match &self.status {
            Some(wanted) => actual.eq_ignore_ascii_case(wanted),
            None => true,
        }
    }

    pub fn matches_amount(&self, amount: i64) -> bool {
        if let Some(min) = self.price_min {
            if amount < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if amount > max {
                return false;
            }
        }
        true
    }

    /// Date-window test against a record instant. A windowed filter
    /// excludes records that carry no timestamp at all.
    pub fn matches_instant(&self, at: Option<DateTime<Utc>>) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }
        let Some(at) = at else {
            return false;
        };
        if let Some(from) = self.date_from {
            let start = from
                .and_hms_opt(0, 0, 0)
                .map(|n| n.and_utc())
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            if at < start {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            let end = to
                .and_hms_opt(23, 59, 59)
                .map(|n| n.and_utc())
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if at > end {
                return false;
            }
        }
        true
    }
}

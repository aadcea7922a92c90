//! Region and season context
//!
//! Both shift ideal ranges. Unrecognised strings map to "no adjustment".

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Macro-regions with their own ideal-range offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Mashonaland,
    Manicaland,
    Matabeleland,
}

impl Region {
    /// Substring match, so "Mashonaland Central" and "matabeleland_south" both resolve.
    pub fn parse(name: &str) -> Option<Region> {
        let key = name.trim().to_ascii_lowercase();
        let region = if key.contains("mashonaland") {
            Some(Region::Mashonaland)
        } else if key.contains("manicaland") {
            Some(Region::Manicaland)
        } else if key.contains("matabeleland") {
            Some(Region::Matabeleland)
        } else {
            None
        };

        if region.is_none() && !key.is_empty() {
            tracing::debug!(region = name, "unrecognised region, no range adjustment");
        }
        region
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Region::Mashonaland => "Mashonaland",
            Region::Manicaland => "Manicaland",
            Region::Matabeleland => "Matabeleland",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// November to March
    Rainy,
    /// May to August
    Dry,
    /// April, September, October
    Transition,
}

impl Season {
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            11 | 12 | 1 | 2 | 3 => Some(Season::Rainy),
            5..=8 => Some(Season::Dry),
            4 | 9 | 10 => Some(Season::Transition),
            _ => None,
        }
    }

    pub fn current() -> Season {
        let month = chrono::Local::now().month();
        Season::from_month(month).unwrap_or(Season::Rainy)
    }

    /// Accepts season names, month numbers and month names.
    pub fn parse(value: &str) -> Option<Season> {
        let key = value.trim().to_ascii_lowercase();
        let season = match key.as_str() {
            "rainy" | "wet" | "summer" | "rain" => Some(Season::Rainy),
            "dry" | "winter" => Some(Season::Dry),
            "transition" | "transitional" => Some(Season::Transition),
            other => match other.parse::<u32>() {
                Ok(month) => Season::from_month(month),
                Err(_) => month_from_name(other).and_then(Season::from_month),
            },
        };

        if season.is_none() {
            tracing::debug!(season = value, "unrecognised season, no range adjustment");
        }
        season
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Rainy => "rainy",
            Season::Dry => "dry",
            Season::Transition => "transition",
        }
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| name.starts_with(m))
        .map(|i| i as u32 + 1)
}

/// How the season for a request is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonSelection {
    /// Derive from today's calendar month
    #[default]
    Current,
    Explicit(Season),
    /// Caller supplied something unrecognised
    Unadjusted,
}

impl SeasonSelection {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => SeasonSelection::Current,
            Some(s) => match Season::parse(s) {
                Some(season) => SeasonSelection::Explicit(season),
                None => SeasonSelection::Unadjusted,
            },
        }
    }

    pub fn resolve(self) -> Option<Season> {
        match self {
            SeasonSelection::Current => Some(Season::current()),
            SeasonSelection::Explicit(season) => Some(season),
            SeasonSelection::Unadjusted => None,
        }
    }
}

impl From<Season> for SeasonSelection {
    fn from(season: Season) -> Self {
        SeasonSelection::Explicit(season)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_substring_match() {
        assert_eq!(Region::parse("Mashonaland Central"), Some(Region::Mashonaland));
        assert_eq!(Region::parse("matabeleland_south"), Some(Region::Matabeleland));
        assert_eq!(Region::parse("MANICALAND"), Some(Region::Manicaland));
        assert_eq!(Region::parse("Midlands"), None);
        assert_eq!(Region::parse(""), None);
    }

    #[test]
    fn test_months_cover_year() {
        for month in 1..=12 {
            assert!(Season::from_month(month).is_some());
        }
        assert_eq!(Season::from_month(1), Some(Season::Rainy));
        assert_eq!(Season::from_month(6), Some(Season::Dry));
        assert_eq!(Season::from_month(9), Some(Season::Transition));
        assert_eq!(Season::from_month(13), None);
    }

    #[test]
    fn test_season_parse_variants() {
        assert_eq!(Season::parse("Rainy"), Some(Season::Rainy));
        assert_eq!(Season::parse("winter"), Some(Season::Dry));
        assert_eq!(Season::parse("10"), Some(Season::Transition));
        assert_eq!(Season::parse("December"), Some(Season::Rainy));
        assert_eq!(Season::parse("jul"), Some(Season::Dry));
        assert_eq!(Season::parse("monsoon"), None);
    }

    #[test]
    fn test_selection() {
        assert_eq!(SeasonSelection::parse(None), SeasonSelection::Current);
        assert_eq!(
            SeasonSelection::parse(Some("dry")),
            SeasonSelection::Explicit(Season::Dry)
        );
        assert_eq!(SeasonSelection::parse(Some("??")).resolve(), None);
        assert!(SeasonSelection::Current.resolve().is_some());
    }
}

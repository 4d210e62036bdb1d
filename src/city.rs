//! City name → numeric id resolution against a static reference table.
//!
//! The table ships inside the binary (`data/city.json`) and is parsed once
//! per process. Lookups are exact-match; callers normalize names first with
//! [`trim_city`]. Anything that cannot be resolved maps to
//! [`FALLBACK_CITY_ID`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Id returned for names missing from the table, or when the table failed to load.
pub const FALLBACK_CITY_ID: i32 = 880;

const BUNDLED_CITY_JSON: &str = include_str!("../data/city.json");

/// Administrative suffixes stripped by [`trim_city`], longest first.
/// County-level suffixes ("县", "地区") are left alone: "长沙县" is not "长沙".
const CITY_SUFFIXES: &[&str] = &[
    "特别行政区",
    "维吾尔自治区",
    "壮族自治区",
    "回族自治区",
    "自治区",
    "自治州",
    "省",
    "市",
    "盟",
];

/// Municipalities and provincial capitals. A located upper-level city in
/// this list is used as the city itself; otherwise the lower-level city is.
const CAPITAL_CITIES: &[&str] = &[
    "北京", "天津", "上海", "重庆", "石家庄", "太原", "呼和浩特", "沈阳",
    "长春", "哈尔滨", "南京", "杭州", "合肥", "福州", "南昌", "济南",
    "郑州", "武汉", "长沙", "广州", "南宁", "海口", "成都", "贵阳",
    "昆明", "西安", "兰州", "西宁", "拉萨", "银川", "乌鲁木齐",
];

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    pub id: i32,
}

/// Ordered, read-only name → id table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CityReferenceTable {
    records: Vec<CityRecord>,
}

/// Reference table loading errors.
#[derive(Debug)]
pub enum CityError {
    Io(String),
    Parse(String),
}

impl fmt::Display for CityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "Cannot read city table: {}", msg),
            Self::Parse(msg) => write!(f, "Invalid city table: {}", msg),
        }
    }
}

impl std::error::Error for CityError {}

impl CityReferenceTable {
    pub fn new(records: Vec<CityRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of `{ "name": ..., "id": ... }` objects.
    pub fn from_json(data: &str) -> Result<Self, CityError> {
        let records: Vec<CityRecord> =
            serde_json::from_str(data).map_err(|e| CityError::Parse(e.to_string()))?;
        Ok(Self { records })
    }

    /// Load a table from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CityError> {
        let data = fs::read_to_string(path)
            .map_err(|e| CityError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&data)
    }

    /// Load from `path`, or fall back to an empty table (every lookup then
    /// resolves to [`FALLBACK_CITY_ID`]).
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("{}. City ids will fall back to {}", e, FALLBACK_CITY_ID);
            Self::default()
        })
    }

    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The table compiled into the binary, parsed on first use.
pub fn bundled() -> Arc<CityReferenceTable> {
    static TABLE: OnceLock<Arc<CityReferenceTable>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let table = CityReferenceTable::from_json(BUNDLED_CITY_JSON).unwrap_or_else(|e| {
                warn!("{}. City ids will fall back to {}", e, FALLBACK_CITY_ID);
                CityReferenceTable::default()
            });
            debug!("Loaded {} bundled city records", table.len());
            Arc::new(table)
        })
        .clone()
}

/// Id of the first record whose name equals `name` exactly, else the fallback id.
pub fn resolve_id(name: &str, table: &CityReferenceTable) -> i32 {
    table
        .records
        .iter()
        .find(|city| city.name == name)
        .map(|city| city.id)
        .unwrap_or(FALLBACK_CITY_ID)
}

/// [`resolve_id`] against the bundled table.
pub fn resolve_bundled_id(name: &str) -> i32 {
    resolve_id(name, &bundled())
}

/// Strip surrounding whitespace and one administrative suffix
/// ("北京市" → "北京", "广西壮族自治区" → "广西").
pub fn trim_city(name: &str) -> &str {
    let name = name.trim();
    for suffix in CITY_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            // keep single-character names such as "沙市" intact
            if stripped.chars().count() >= 2 {
                return stripped.trim_end();
            }
        }
    }
    name
}

/// Whether `name` (already trimmed) is a municipality or provincial capital.
pub fn is_capital(name: &str) -> bool {
    CAPITAL_CITIES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_table() -> CityReferenceTable {
        CityReferenceTable::new(vec![
            CityRecord { name: "北京".into(), id: 290 },
            CityRecord { name: "上海".into(), id: 292 },
            CityRecord { name: "Chengdu".into(), id: 433 },
            CityRecord { name: "上海".into(), id: 999 },
        ])
    }

    #[test]
    fn test_resolve_exact() {
        let table = sample_table();
        assert_eq!(resolve_id("北京", &table), 290);
        assert_eq!(resolve_id("Chengdu", &table), 433);
    }

    #[test]
    fn test_resolve_first_match_wins() {
        assert_eq!(resolve_id("上海", &sample_table()), 292);
    }

    #[test]
    fn test_resolve_unknown_is_fallback() {
        assert_eq!(resolve_id("火星", &sample_table()), FALLBACK_CITY_ID);
        assert_eq!(resolve_id("", &sample_table()), FALLBACK_CITY_ID);
    }

    #[test]
    fn test_resolve_empty_table() {
        assert_eq!(resolve_id("北京", &CityReferenceTable::default()), FALLBACK_CITY_ID);
    }

    #[test]
    fn test_resolve_no_substring_or_case_folding() {
        let table = sample_table();
        assert_eq!(resolve_id("北京市", &table), FALLBACK_CITY_ID);
        assert_eq!(resolve_id("北", &table), FALLBACK_CITY_ID);
        assert_eq!(resolve_id("chengdu", &table), FALLBACK_CITY_ID);
        assert_eq!(resolve_id(" Chengdu", &table), FALLBACK_CITY_ID);
    }

    #[test]
    fn test_bundled_table() {
        let table = bundled();
        assert!(!table.is_empty());
        assert_eq!(resolve_bundled_id("北京"), 290);
        assert_eq!(resolve_bundled_id("成都"), 433);
        assert_eq!(resolve_bundled_id("不存在"), FALLBACK_CITY_ID);
    }

    #[test]
    fn test_bundled_names_unique() {
        let table = bundled();
        let mut names: Vec<&str> = table.records().iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            CityReferenceTable::from_json("{not json"),
            Err(CityError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("city.json");
        fs::write(&path, r#"[{"name": "拉萨", "id": 438}]"#).unwrap();

        let table = CityReferenceTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(resolve_id("拉萨", &table), 438);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let table = CityReferenceTable::load_or_empty(&dir.path().join("missing.json"));
        assert!(table.is_empty());
        assert_eq!(resolve_id("北京", &table), FALLBACK_CITY_ID);
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("city.json");
        fs::write(&path, r#"[{"name": "北京", "id": "#).unwrap();

        let table = CityReferenceTable::load_or_empty(&path);
        assert!(table.is_empty());
        assert_eq!(resolve_id("北京", &table), FALLBACK_CITY_ID);
    }

    #[test]
    fn test_trim_city() {
        assert_eq!(trim_city("北京市"), "北京");
        assert_eq!(trim_city(" 成都市 "), "成都");
        assert_eq!(trim_city("四川省"), "四川");
        assert_eq!(trim_city("广西壮族自治区"), "广西");
        assert_eq!(trim_city("新疆维吾尔自治区"), "新疆");
        assert_eq!(trim_city("内蒙古自治区"), "内蒙古");
        assert_eq!(trim_city("香港特别行政区"), "香港");
        assert_eq!(trim_city("锡林郭勒盟"), "锡林郭勒");
        assert_eq!(trim_city("上海"), "上海");
        assert_eq!(trim_city("沙市"), "沙市");
    }

    #[test]
    fn test_trim_city_keeps_counties_distinct() {
        assert_eq!(trim_city("长沙县"), "长沙县");
        assert_eq!(trim_city("大兴安岭地区"), "大兴安岭地区");
        assert_eq!(resolve_bundled_id(trim_city("长沙县")), FALLBACK_CITY_ID);
        assert_eq!(resolve_bundled_id(trim_city("长沙市")), 413);
    }

    #[test]
    fn test_is_capital() {
        assert!(is_capital("北京"));
        assert!(is_capital("乌鲁木齐"));
        assert!(!is_capital("苏州"));
        assert!(!is_capital("北京市"));
        assert!(!is_capital("京"));
    }
}

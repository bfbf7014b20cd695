use serde::{Deserialize, Serialize};

/// What a composite view is about.
///
/// The primary domestic index anchors every fragment; an optional sector
/// filter narrows the sector-derived fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextScope {
    /// Primary domestic index symbol (e.g., "NIFTY")
    pub index: String,

    /// Sectors to report on; empty means all sectors
    #[serde(default)]
    pub sectors: Vec<String>,
}

impl ContextScope {
    pub fn index(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            sectors: Vec::new(),
        }
    }

    pub fn with_sectors<I, S>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sectors = sectors.into_iter().map(Into::into).collect();
        self
    }

    /// Normalized index symbol used in cache keys.
    pub fn index_key(&self) -> String {
        self.index.trim().to_uppercase()
    }

    /// Index plus the normalized, sorted sector filter.
    ///
    /// Two scopes naming the same sectors in a different order or case share
    /// a key.
    pub fn full_key(&self) -> String {
        if self.sectors.is_empty() {
            return self.index_key();
        }
        let mut sectors: Vec<String> = self
            .sectors
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        sectors.sort();
        sectors.dedup();
        format!("{}[{}]", self.index_key(), sectors.join(","))
    }

    /// Whether `sector` passes the filter.
    pub fn includes_sector(&self, sector: &str) -> bool {
        self.sectors.is_empty()
            || self
                .sectors
                .iter()
                .any(|s| s.trim().eq_ignore_ascii_case(sector.trim()))
    }
}

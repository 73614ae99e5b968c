use feruca::Collator;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Item name -> image URL, exactly as served by `/images`.
pub type ImageMap = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub name: String,
    pub count: i64,
    // Unix epoch milliseconds; zero or negative means there is no countdown
    #[serde(default)]
    pub restock_time: i64,
    // Only used for row identity, never displayed
    #[serde(default)]
    pub stock_time: i64,
}

impl StockItem {
    pub fn key(&self) -> ItemKey {
        ItemKey {
            stock_time: self.stock_time,
            name: self.name.clone(),
            count: self.count,
        }
    }
}

/// Identity of a rendered row. Two polls that deliver an item with the same
/// key keep the same row (and with it the purchased flag and countdown).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub stock_time: i64,
    pub name: String,
    pub count: i64,
}

/// `/wanted` has been served both as structured items and as bare names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WantedEntry {
    Item(StockItem),
    Name(String),
}

impl From<WantedEntry> for StockItem {
    fn from(entry: WantedEntry) -> Self {
        match entry {
            WantedEntry::Item(item) => item,
            WantedEntry::Name(name) => StockItem {
                name,
                count: 0,
                restock_time: 0,
                stock_time: 0,
            },
        }
    }
}

/// Unicode collation (CLDR root order): accents and case only break ties,
/// and lowercase sorts before uppercase, so "apple" < "Apple" < "Éclair".
pub fn compare_names(a: &str, b: &str) -> Ordering {
    Collator::default().collate(a, b)
}

/// Sort by name ascending. Stable, so equal names keep their delivered order.
pub fn sort_by_name(items: &mut [StockItem]) {
    let mut collator = Collator::default();
    items.sort_by(|a, b| collator.collate(a.name.as_str(), b.name.as_str()));
}

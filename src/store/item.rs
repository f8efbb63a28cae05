//! Item record and identifier types

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named, priced record held by the store.
///
/// Decoding is lenient: keys match `name` and `price` ignoring ASCII case,
/// missing or `null` fields keep their defaults, unknown keys are skipped and
/// a bare `null` is the default item. So `{"Price": 19.99}` is accepted as a
/// partial item.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Item {
    pub name: String,
    pub price: f64,
}

impl Item {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    /// Decode the first JSON value in `bytes`; anything after it is ignored
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        match serde_json::Deserializer::from_slice(bytes)
            .into_iter::<Self>()
            .next()
        {
            Some(item) => item,
            // Empty or blank body, reported as an EOF error
            None => serde_json::from_slice(bytes),
        }
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ItemVisitor)
    }
}

struct ItemVisitor;

impl<'de> Visitor<'de> for ItemVisitor {
    type Value = Item;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an item object or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Item, E> {
        Ok(Item::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Item, E> {
        Ok(Item::default())
    }

    // Later keys overwrite earlier ones, whatever their case
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Item, A::Error> {
        let mut item = Item::default();
        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("name") {
                if let Some(name) = map.next_value::<Option<String>>()? {
                    item.name = name;
                }
            } else if key.eq_ignore_ascii_case("price") {
                if let Some(price) = map.next_value::<Option<f64>>()? {
                    item.price = price;
                }
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(item)
    }
}

/// Store-assigned identifier of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    pub const FIRST: Self = Self(1);

    pub const MAX: Self = Self(i64::MAX);

    /// The id after this one, or `None` once the id space is used up
    pub(crate) const fn checked_next(self) -> Option<Self> {
        if self.0 == Self::MAX.0 {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every id up to `i64::MAX` has been handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("item id space exhausted")]
pub struct IdsExhausted;

/// Raw path segment that is not a base-10 integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid item id {raw:?}")]
pub struct InvalidItemId {
    pub raw: String,
}

impl FromStr for ItemId {
    type Err = InvalidItemId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self).map_err(|_| InvalidItemId { raw: s.to_string() })
    }
}

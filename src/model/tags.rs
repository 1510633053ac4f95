//! Closed-set categorical attributes (§3, §9: "tagged variants, not
//! dynamic maps"), using `strum`'s `EnumIter`/`VariantArray` derives the
//! way the teacher enumerates closed tag sets.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, VariantArray};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, VariantArray, Serialize, Deserialize)]
pub enum Surface {
    Paved,
    Gravel,
    Dirt,
    Boardwalk,
    Sand,
    Rock,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, VariantArray, Serialize, Deserialize)]
pub enum TrailType {
    Path,
    Footway,
    Track,
    Bridleway,
    Steps,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, VariantArray, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    Expert,
}

/// Unknown upstream tags land here, typed as a closed key/value bag
/// rather than a dynamic map — §9's "dynamic records carrying free-form
/// attributes" redesign flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraTags(pub Vec<(String, String)>);

impl ExtraTags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

// ============================================================
// Layer 3 - Chromosome Identifier
// ============================================================
// Human autosomes 1-22 plus X (=23) and Y (=24). The numeric
// index is also the suffix used to name per-chromosome token files.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

pub const NUM_CHROMOSOMES: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chromosome(u8);

impl Chromosome {
    /// Build from a 1-based index (1..=24)
    pub fn from_index(index: u8) -> PipelineResult<Self> {
        if (1..=NUM_CHROMOSOMES).contains(&index) {
            Ok(Self(index))
        } else {
            Err(PipelineError::UnknownChromosome(index.to_string()))
        }
    }

    /// Parse names such as `chr1`, `1`, `chrX` or `Y`.
    pub fn parse(name: &str) -> PipelineResult<Self> {
        let trimmed = name.trim();
        let bare = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
            _ => trimmed,
        };

        let index = match bare {
            "X" | "x" => 23,
            "Y" | "y" => 24,
            digits => digits
                .parse::<u8>()
                .ok()
                .filter(|n| (1..=22).contains(n))
                .ok_or_else(|| PipelineError::UnknownChromosome(name.to_string()))?,
        };
        Ok(Self(index))
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> String {
        match self.0 {
            23 => "chrX".to_string(),
            24 => "chrY".to_string(),
            n => format!("chr{n}"),
        }
    }

    /// All supported chromosomes in index order
    pub fn all() -> impl Iterator<Item = Chromosome> {
        (1..=NUM_CHROMOSOMES).map(Chromosome)
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl TryFrom<String> for Chromosome {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Chromosome> for String {
    fn from(c: Chromosome) -> Self {
        c.name()
    }
}

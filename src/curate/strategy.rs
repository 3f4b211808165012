use crate::store::{RegionId, Store};
use crate::utils::{BaitError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// Tie-break rule applied to the undecided members of each conflict block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Most distinct flanking SNP columns.
    MaxSnp,
    /// Fewest flanking gap/unknown columns.
    MinBad,
    /// Lowest recorded variant + gap + bad count inside the region.
    MinVariants,
    /// Fewest distinct flanking SNP columns.
    MinSnp,
}

impl FromStr for Strategy {
    type Err = String;
    fn from_str(strategy: &str) -> std::result::Result<Self, Self::Err> {
        match strategy {
            "snp" | "max-snp" => Ok(Strategy::MaxSnp),
            "bad" | "min-bad" => Ok(Strategy::MinBad),
            "var" | "min-var" => Ok(Strategy::MinVariants),
            "min-snp" => Ok(Strategy::MinSnp),
            _ => Err(format!(
                "Invalid strategy '{}'. Options are: snp, bad, var, min-snp",
                strategy
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::MaxSnp => "snp",
            Strategy::MinBad => "bad",
            Strategy::MinVariants => "var",
            Strategy::MinSnp => "min-snp",
        };
        write!(f, "{}", name)
    }
}

impl Strategy {
    pub fn direction(&self) -> Direction {
        match self {
            Strategy::MaxSnp => Direction::Maximize,
            Strategy::MinBad | Strategy::MinVariants | Strategy::MinSnp => Direction::Minimize,
        }
    }

    pub fn uses_flank(&self) -> bool {
        !matches!(self, Strategy::MinVariants)
    }

    /// Score of every region in the store under this rule.
    pub fn scores(&self, store: &Store, flank: i64) -> Result<HashMap<RegionId, i64>> {
        if self.uses_flank() {
            validate_flank_distance(flank)?;
        }
        let scores = match self {
            Strategy::MaxSnp | Strategy::MinSnp => store
                .flanking_counts(flank)?
                .into_iter()
                .map(|(regid, counts)| (regid, counts.snps))
                .collect(),
            Strategy::MinBad => store
                .flanking_counts(flank)?
                .into_iter()
                .map(|(regid, counts)| (regid, counts.bad))
                .collect(),
            Strategy::MinVariants => store.variant_burdens()?,
        };
        Ok(scores)
    }
}

pub fn validate_flank_distance(flank: i64) -> Result<i64> {
    if flank <= 0 {
        return Err(BaitError::Configuration(format!(
            "Flanking distance must be at least 1, got {}",
            flank
        )));
    }
    Ok(flank)
}

pub fn parse_flank_distance(s: &str) -> Result<i64> {
    let flank = s.trim().parse::<i64>().map_err(|_| {
        BaitError::Configuration(format!(
            "Flanking distance does not appear to be an integer: '{}'",
            s
        ))
    })?;
    validate_flank_distance(flank)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected(RegionId),
    Tied(Vec<RegionId>),
    /// Every candidate scored zero under a maximising rule.
    NoSignal,
}

/// Picks the best of the scored undecided members of one block.
pub fn decide(scored: &[(RegionId, i64)], direction: Direction) -> Outcome {
    if let [(only, _)] = scored {
        return Outcome::Selected(*only);
    }
    let best = match direction {
        Direction::Maximize => scored.iter().map(|(_, s)| *s).max(),
        Direction::Minimize => scored.iter().map(|(_, s)| *s).min(),
    };
    let Some(best) = best else {
        return Outcome::NoSignal;
    };
    if direction == Direction::Maximize && best == 0 {
        return Outcome::NoSignal;
    }
    let winners: Vec<RegionId> = scored
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(regid, _)| *regid)
        .collect();
    if winners.len() == 1 {
        Outcome::Selected(winners[0])
    } else {
        Outcome::Tied(winners)
    }
}

use std::cmp::Reverse;
use std::collections::HashMap;
use std::ops::Add;

use rayon::prelude::*;
use thiserror::Error;

use crate::model::{AnalysisSummary, ByColor, Color, ColorOutcome, OpeningTally, RawGameRecord};

/// Openings kept per color after ranking.
pub const TOP_OPENINGS: usize = 5;
/// Bucket for games without a classified opening.
pub const UNKNOWN_OPENING: &str = "Unknown Opening";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Why a record contributed nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Skip {
    MissingPlayer,
    NotParticipant,
    Provisional,
}

/// Per-call record accounting; not part of the summary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SkipStats {
    pub attributed: u64,
    pub missing_player: u64,
    pub not_participant: u64,
    pub provisional: u64,
}

impl SkipStats {
    fn count(&mut self, skip: Skip) {
        match skip {
            Skip::MissingPlayer => self.missing_player += 1,
            Skip::NotParticipant => self.not_participant += 1,
            Skip::Provisional => self.provisional += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.attributed + self.missing_player + self.not_participant + self.provisional
    }
}

impl Add for SkipStats {
    type Output = SkipStats;

    fn add(self, other: SkipStats) -> Self::Output {
        SkipStats {
            attributed: self.attributed + other.attributed,
            missing_player: self.missing_player + other.missing_player,
            not_participant: self.not_participant + other.not_participant,
            provisional: self.provisional + other.provisional,
        }
    }
}

/// Opening tallies in first-seen order.
#[derive(Clone, Debug, Default)]
struct OpeningBook {
    index: HashMap<String, usize>,
    tallies: Vec<OpeningTally>,
}

impl OpeningBook {
    fn entry(&mut self, name: &str) -> &mut OpeningTally {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.index.insert(name.to_string(), self.tallies.len());
                self.tallies.push(OpeningTally::new(name));
                self.tallies.len() - 1
            }
        };
        &mut self.tallies[i]
    }

    /// Append `other` after `self`; names new to `self` keep `other`'s order.
    fn merge(mut self, other: OpeningBook) -> OpeningBook {
        for t in &other.tallies {
            self.entry(&t.name).merge(t);
        }
        self
    }

    /// Highest counts first; stable sort keeps first-seen order among ties.
    fn top(mut self, n: usize) -> Vec<OpeningTally> {
        self.tallies.sort_by_key(|t| Reverse(t.count));
        self.tallies.truncate(n);
        self.tallies
    }
}

#[derive(Clone, Debug, Default)]
struct Accumulator {
    openings: ByColor<OpeningBook>,
    outcomes: ByColor<ColorOutcome>,
    stats: SkipStats,
}

impl Accumulator {
    fn push(mut self, analyzer: &GameAnalyzer, record: &RawGameRecord) -> Self {
        let played = match analyzer.attribute(record) {
            Ok(c) => c,
            Err(skip) => {
                self.stats.count(skip);
                return self;
            }
        };
        let winner = record.winner();
        let opening = record.opening_name().unwrap_or(UNKNOWN_OPENING);

        self.openings
            .get_mut(played)
            .entry(opening)
            .add_result(played, winner);
        self.outcomes.get_mut(played).add_result(played, winner);
        self.stats.attributed += 1;
        self
    }

    fn merge(self, other: Accumulator) -> Accumulator {
        let ByColor { white, black } = other.openings;
        Accumulator {
            openings: ByColor {
                white: self.openings.white.merge(white),
                black: self.openings.black.merge(black),
            },
            outcomes: ByColor {
                white: self.outcomes.white + other.outcomes.white,
                black: self.outcomes.black + other.outcomes.black,
            },
            stats: self.stats + other.stats,
        }
    }

    fn finish(self) -> (AnalysisSummary, SkipStats) {
        let summary = AnalysisSummary {
            top_openings: self.openings.map(|book| book.top(TOP_OPENINGS)),
            color_outcomes: self.outcomes,
        };
        (summary, self.stats)
    }
}

/// Summarizes one player's games: results per color and their most played openings.
///
/// The target name is matched case-insensitively. Records that cannot be
/// attributed to the target (missing names, target not playing, provisional
/// rating on the target's side) are skipped without error.
#[derive(Clone, Debug)]
pub struct GameAnalyzer {
    target: String,
}

impl GameAnalyzer {
    pub fn new(username: &str) -> Result<Self, AnalyzeError> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(AnalyzeError::InvalidInput(
                "target username is empty".to_string(),
            ));
        }
        Ok(Self {
            target: normalize(trimmed),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Side the target played in `record`. White is checked first, so a
    /// game against oneself counts as white.
    pub fn attribute(&self, record: &RawGameRecord) -> Result<Color, Skip> {
        let (Some(white), Some(black)) = (
            record.player_name(Color::White),
            record.player_name(Color::Black),
        ) else {
            return Err(Skip::MissingPlayer);
        };

        let played = if normalize(white) == self.target {
            Color::White
        } else if normalize(black) == self.target {
            Color::Black
        } else {
            return Err(Skip::NotParticipant);
        };

        if record.is_provisional(played) {
            return Err(Skip::Provisional);
        }
        Ok(played)
    }

    pub fn analyze(&self, records: &[RawGameRecord]) -> AnalysisSummary {
        self.analyze_with_stats(records).0
    }

    pub fn analyze_with_stats(&self, records: &[RawGameRecord]) -> (AnalysisSummary, SkipStats) {
        records
            .iter()
            .fold(Accumulator::default(), |acc, r| acc.push(self, r))
            .finish()
    }

    /// Fold `batch_size` chunks on the rayon pool and merge them in order.
    /// Produces the same summary as [`GameAnalyzer::analyze_with_stats`].
    pub fn analyze_parallel(
        &self,
        records: &[RawGameRecord],
        batch_size: usize,
    ) -> (AnalysisSummary, SkipStats) {
        records
            .par_chunks(batch_size.max(1))
            .map(|chunk| {
                chunk
                    .iter()
                    .fold(Accumulator::default(), |acc, r| acc.push(self, r))
            })
            .reduce(Accumulator::default, Accumulator::merge)
            .finish()
    }
}

/// Analyze `records` for `username` in a single pass.
pub fn analyze(records: &[RawGameRecord], username: &str) -> Result<AnalysisSummary, AnalyzeError> {
    Ok(GameAnalyzer::new(username)?.analyze(records))
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
}

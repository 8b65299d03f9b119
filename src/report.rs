use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::model::{AnalysisSummary, ByColor, Color, ColorOutcome, OpeningTally};

/// One ranked opening as shown to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningLine {
    pub name: String,
    pub count: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_rate: u8,
}

impl From<&OpeningTally> for OpeningLine {
    fn from(t: &OpeningTally) -> Self {
        Self {
            name: t.name.clone(),
            count: t.count,
            wins: t.wins,
            losses: t.losses,
            win_rate: t.win_rate(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerReport {
    pub username: String,
    pub generated_at: String, // RFC 3339
    pub games_analyzed: u64,
    pub stats: ByColor<ColorOutcome>,
    pub openings: ByColor<Vec<OpeningLine>>,
}

impl PlayerReport {
    pub fn from_summary(username: &str, summary: &AnalysisSummary) -> Self {
        let stats = summary.color_outcomes.clone();
        Self {
            username: username.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            games_analyzed: stats.white.games() + stats.black.games(),
            stats,
            openings: summary
                .top_openings
                .clone()
                .map(|list| list.iter().map(OpeningLine::from).collect()),
        }
    }

    /// Canned sample shown when there is no data to analyze.
    pub fn example() -> Self {
        fn line(name: &str, count: u64, win_rate: u8) -> OpeningLine {
            let wins = (count * win_rate as u64 + 50) / 100;
            OpeningLine {
                name: name.to_string(),
                count,
                wins,
                losses: count - wins,
                win_rate,
            }
        }

        let stats = ByColor {
            white: ColorOutcome { wins: 400, losses: 150, draws: 200 },
            black: ColorOutcome { wins: 350, losses: 200, draws: 200 },
        };
        Self {
            username: "GrandMaster123".to_string(),
            generated_at: Utc::now().to_rfc3339(),
            games_analyzed: stats.white.games() + stats.black.games(),
            stats,
            openings: ByColor {
                white: vec![
                    line("Queen's Gambit", 180, 65),
                    line("Ruy Lopez", 150, 58),
                    line("London System", 120, 62),
                    line("Italian Game", 100, 55),
                    line("Scotch Game", 90, 60),
                ],
                black: vec![
                    line("Sicilian Defense", 250, 70),
                    line("French Defense", 120, 63),
                    line("Caro-Kann", 110, 58),
                    line("King's Indian", 100, 65),
                    line("Nimzo-Indian", 90, 61),
                ],
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One row per ranked opening, white first.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "color,rank,opening,games,wins,losses,win_rate")?;
        for color in Color::BOTH {
            for (rank, o) in self.openings.get(color).iter().enumerate() {
                writeln!(
                    w,
                    "{},{},{},{},{},{},{}",
                    color.as_str(),
                    rank + 1,
                    escape_csv(&o.name),
                    o.count,
                    o.wins,
                    o.losses,
                    o.win_rate
                )?;
            }
        }
        Ok(())
    }
}

pub fn write_csv(report: &PlayerReport, out_path: &Path) -> io::Result<()> {
    let f = File::create(out_path)?;
    let mut w = io::BufWriter::new(f);
    report.write_csv(&mut w)?;
    w.flush()
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

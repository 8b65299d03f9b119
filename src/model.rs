use std::ops::Add;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    /// `winner` field value; anything but "white"/"black" is a draw or unknown.
    pub fn from_winner(s: &str) -> Option<Color> {
        match s {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

/// One finished game as exported by Lichess (`/api/games/user`, NDJSON).
/// Every field is optional so a malformed game still decodes and can be skipped.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGameRecord {
    #[serde(default)]
    pub players: Option<Players>,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub opening: Option<Opening>,
    #[serde(default)]
    pub perf: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>, // epoch millis
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Players {
    #[serde(default)]
    pub white: Option<PlayerSide>,
    #[serde(default)]
    pub black: Option<PlayerSide>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlayerSide {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub provisional: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Opening {
    #[serde(default)]
    pub name: Option<String>,
}

impl RawGameRecord {
    pub fn side(&self, color: Color) -> Option<&PlayerSide> {
        let players = self.players.as_ref()?;
        match color {
            Color::White => players.white.as_ref(),
            Color::Black => players.black.as_ref(),
        }
    }

    /// Player name on `color`; empty names count as missing.
    pub fn player_name(&self, color: Color) -> Option<&str> {
        self.side(color)?
            .user
            .as_ref()?
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
    }

    pub fn is_provisional(&self, color: Color) -> bool {
        self.side(color).is_some_and(|s| s.provisional)
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner.as_deref().and_then(Color::from_winner)
    }

    pub fn opening_name(&self) -> Option<&str> {
        self.opening
            .as_ref()?
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
    }
}

/// Pair of values, one per piece color.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ByColor<T> {
    pub white: T,
    pub black: T,
}

impl<T> ByColor<T> {
    pub fn get(&self, color: Color) -> &T {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn get_mut(&mut self, color: Color) -> &mut T {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ByColor<U> {
        ByColor {
            white: f(self.white),
            black: f(self.black),
        }
    }
}

/// Games, wins and losses for one opening in one color.
/// Draws and unresolved games count in `count` only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpeningTally {
    pub name: String,
    pub count: u64,
    pub wins: u64,
    pub losses: u64,
}

impl OpeningTally {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            wins: 0,
            losses: 0,
        }
    }

    /// Count one game from the perspective of `played`.
    pub fn add_result(&mut self, played: Color, winner: Option<Color>) {
        self.count += 1;
        match winner {
            Some(w) if w == played => self.wins += 1,
            Some(w) if w == played.opponent() => self.losses += 1,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &OpeningTally) {
        self.count += other.count;
        self.wins += other.wins;
        self.losses += other.losses;
    }

    pub fn win_rate(&self) -> u8 {
        win_rate(self.wins, self.count)
    }
}

/// Integer percentage of `wins` over `count`, rounded half up (62.5 -> 63).
pub fn win_rate(wins: u64, count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    let wins = wins.min(count);
    ((200 * wins + count) / (2 * count)) as u8
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ColorOutcome {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

impl ColorOutcome {
    pub fn add_result(&mut self, played: Color, winner: Option<Color>) {
        match winner {
            Some(w) if w == played => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.draws += 1,
        }
    }

    pub fn games(&self) -> u64 {
        self.wins + self.losses + self.draws
    }
}

impl Add for ColorOutcome {
    type Output = ColorOutcome;

    fn add(self, other: ColorOutcome) -> Self::Output {
        ColorOutcome {
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub top_openings: ByColor<Vec<OpeningTally>>,
    pub color_outcomes: ByColor<ColorOutcome>,
}

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::player::{
    AdvancedStats, Defense, GoalShotCreation, Passing, PlayerDocument, Stats, Team,
};
use crate::source::SourceRow;

pub const COL_PLAYER_ID: &str = "Player_id";
pub const COL_PLAYER: &str = "Player";
pub const COL_NATION: &str = "Nation";
pub const COL_POSITION: &str = "Pos";
pub const COL_AGE: &str = "Age";
pub const COL_BORN: &str = "Born";
pub const COL_SQUAD_ID: &str = "Squad_id";
pub const COL_SQUAD: &str = "Squad";

pub const DEFAULT_START_YEAR_MIN: i32 = 2012;
pub const DEFAULT_START_YEAR_MAX: i32 = 2024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("line {line}: required column `{column}` is missing or empty")]
    MissingRequired { line: u64, column: String },
    #[error("line {line}: column `{column}` holds non-numeric value `{value}`")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
}

/// How `start_year` is derived for each mapped row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartYearPolicy {
    /// Uniform draw from the inclusive range.
    Random { min: i32, max: i32 },
    Column(String),
    Fixed(i32),
}

impl Default for StartYearPolicy {
    fn default() -> Self {
        StartYearPolicy::Random {
            min: DEFAULT_START_YEAR_MIN,
            max: DEFAULT_START_YEAR_MAX,
        }
    }
}

impl fmt::Display for StartYearPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartYearPolicy::Random { min, max } => write!(f, "random:{min}-{max}"),
            StartYearPolicy::Column(column) => write!(f, "column:{column}"),
            StartYearPolicy::Fixed(year) => write!(f, "fixed:{year}"),
        }
    }
}

impl FromStr for StartYearPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("random") {
            return Ok(StartYearPolicy::default());
        }
        if let Some(range) = raw.strip_prefix("random:") {
            let (min, max) = range
                .split_once('-')
                .ok_or_else(|| format!("expected random:<min>-<max>, got `{raw}`"))?;
            let min = min
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid start year `{min}`"))?;
            let max = max
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid start year `{max}`"))?;
            if min > max {
                return Err(format!("empty start year range {min}-{max}"));
            }
            return Ok(StartYearPolicy::Random { min, max });
        }
        if let Some(column) = raw.strip_prefix("column:") {
            let column = column.trim();
            if column.is_empty() {
                return Err("column policy needs a column name".to_string());
            }
            return Ok(StartYearPolicy::Column(column.to_string()));
        }
        if let Some(year) = raw.strip_prefix("fixed:") {
            let year = year
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid start year `{year}`"))?;
            return Ok(StartYearPolicy::Fixed(year));
        }
        Err(format!("unknown start year policy `{raw}`"))
    }
}

/// Turns source rows into player documents.
pub struct RecordMapper<R: Rng> {
    start_year: StartYearPolicy,
    rng: R,
}

impl RecordMapper<StdRng> {
    pub fn seeded(start_year: StartYearPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(start_year, rng)
    }
}

impl<R: Rng> RecordMapper<R> {
    pub fn with_rng(start_year: StartYearPolicy, rng: R) -> Self {
        Self { start_year, rng }
    }

    pub fn start_year_policy(&self) -> &StartYearPolicy {
        &self.start_year
    }

    pub fn map_rows(&mut self, rows: &[&SourceRow]) -> Result<Vec<PlayerDocument>, MapError> {
        rows.iter().map(|row| self.map_row(row)).collect()
    }

    pub fn map_row(&mut self, row: &SourceRow) -> Result<PlayerDocument, MapError> {
        let cells = Cells { row };
        let start_year = self.start_year(&cells)?;

        Ok(PlayerDocument {
            player_id: cells.required(COL_PLAYER_ID)?,
            name: cells.required(COL_PLAYER)?,
            nationality: cells.text_or_empty(COL_NATION),
            position: cells.required(COL_POSITION)?,
            age: cells.age(COL_AGE)?,
            birth_year: cells.opt_int(COL_BORN)?,
            start_year,
            team: Team {
                squad_id: cells.required(COL_SQUAD_ID)?,
                name: cells.required(COL_SQUAD)?,
            },
            stats: Stats {
                matches_played: cells.int("MP")?,
                starts: cells.int("Starts")?,
                minutes_played: cells.int("Min")?,
                goals: cells.int("Gls")?,
                assists: cells.int("Ast")?,
                goals_minus_pks: cells.int("G-PK")?,
                penalty_goals: cells.int("PK")?,
                penalty_attempts: cells.int("PKatt")?,
                yellow_cards: cells.int("CrdY")?,
                red_cards: cells.int("CrdR")?,
                second_yellow_cards: cells.int("2CrdY")?,
            },
            advanced_stats: AdvancedStats {
                xg: cells.float("xG")?,
                npxg: cells.float("npxG")?,
                xag: cells.float("xAG")?,
                shots: cells.int("Sh")?,
                shots_on_target: cells.int("SoT")?,
                goals_per_shot: cells.float("G_by_Sh")?,
                goals_per_shot_on_target: cells.float("G_by_SoT")?,
                average_shot_distance: cells.float("Dist")?,
                free_kicks: cells.int("FK")?,
                npxg_per_shot: cells.float("npxG_by_Sh")?,
                goals_minus_xg: cells.float("G-xG")?,
                np_goals_minus_xg: cells.float("np:G-xG")?,
            },
            passing: Passing {
                passes_completed: cells.int("Total_Cmp")?,
                passes_attempted: cells.int("Total_Att")?,
                pass_completion_pct: cells.float("Cmp")?,
                total_pass_distance: cells.int("Total_TotDist")?,
                progressive_pass_distance: cells.int("Total_PrgDist")?,
                expected_assists: cells.float("xA")?,
                assists_minus_xag: cells.float("A-xAG")?,
                key_passes: cells.int("KP")?,
                passes_into_final_third: cells.int("LastThird")?,
                passes_into_penalty_area: cells.int("PPA")?,
                crosses_into_penalty_area: cells.int("CrsPA")?,
                progressive_passes: cells.int("Prog")?,
            },
            goal_shot_creation: GoalShotCreation {
                shot_creating_actions: cells.int("SCA")?,
                sca_pass_live: cells.int("SCA_PassLive")?,
                sca_pass_dead: cells.int("SCA_PassDead")?,
                sca_dribble: cells.int("SCA_Drib")?,
                sca_shot: cells.int("SCA_Sh")?,
                sca_foul_drawn: cells.int("SCA_Fld")?,
                sca_defense: cells.int("SCA_Def")?,
                goal_creating_actions: cells.int("GCA")?,
                gca_pass_live: cells.int("GCA_PassLive")?,
                gca_pass_dead: cells.int("GCA_PassDead")?,
                gca_dribble: cells.int("GCA_Drib")?,
                gca_shot: cells.int("GCA_Sh")?,
                gca_foul_drawn: cells.int("GCA_Fld")?,
                gca_defense: cells.int("GCA_Def")?,
            },
            defense: Defense {
                tackles: cells.int("Tackles_Tkl")?,
                tackles_won: cells.int("Tackles_TklW")?,
                tackles_def_3rd: cells.int("Tackles_Def3rd")?,
                tackles_mid_3rd: cells.int("Tackles_Mid3rd")?,
                tackles_att_3rd: cells.int("Tackles_Att3rd")?,
                dribble_tackles: cells.int("VsDribbles_Tkl")?,
                dribbles_against: cells.int("VsDribbles_Att")?,
                dribbled_past: cells.int("VsDribbles_Past")?,
                blocks: cells.int("Blocks_Blocks")?,
                blocked_shots: cells.int("Blocks_Sh")?,
                blocked_passes: cells.int("Blocks_Pass")?,
                interceptions: cells.int("Int")?,
                tackles_interceptions: cells.int("Tkl_plus_Int")?,
                clearances: cells.int("Clr")?,
                errors: cells.int("Err")?,
            },
        })
    }

    fn start_year(&mut self, cells: &Cells<'_>) -> Result<i32, MapError> {
        match &self.start_year {
            StartYearPolicy::Random { min, max } => Ok(self.rng.gen_range(*min..=*max)),
            StartYearPolicy::Fixed(year) => Ok(*year),
            StartYearPolicy::Column(column) => {
                cells
                    .opt_int(column)?
                    .ok_or_else(|| MapError::MissingRequired {
                        line: cells.row.line(),
                        column: column.clone(),
                    })
            }
        }
    }
}

struct Cells<'a> {
    row: &'a SourceRow,
}

impl Cells<'_> {
    fn required(&self, column: &str) -> Result<String, MapError> {
        self.row
            .get(column)
            .map(str::to_string)
            .ok_or_else(|| MapError::MissingRequired {
                line: self.row.line(),
                column: column.to_string(),
            })
    }

    fn text_or_empty(&self, column: &str) -> String {
        self.row.get(column).unwrap_or_default().to_string()
    }

    fn int(&self, column: &str) -> Result<i32, MapError> {
        Ok(self.opt_int(column)?.unwrap_or(0))
    }

    fn float(&self, column: &str) -> Result<f64, MapError> {
        let Some(raw) = self.row.get(column) else {
            return Ok(0.0);
        };
        parse_float(raw).ok_or_else(|| self.invalid(column, raw))
    }

    fn opt_int(&self, column: &str) -> Result<Option<i32>, MapError> {
        let Some(raw) = self.row.get(column) else {
            return Ok(None);
        };
        parse_int(raw)
            .map(Some)
            .ok_or_else(|| self.invalid(column, raw))
    }

    fn age(&self, column: &str) -> Result<Option<i32>, MapError> {
        let Some(raw) = self.row.get(column) else {
            return Ok(None);
        };
        parse_age(raw)
            .map(Some)
            .ok_or_else(|| self.invalid(column, raw))
    }

    fn invalid(&self, column: &str, raw: &str) -> MapError {
        MapError::InvalidNumber {
            line: self.row.line(),
            column: column.to_string(),
            value: raw.to_string(),
        }
    }
}

/// Integer cell, accepting thousands separators and truncating float text.
pub fn parse_int(raw: &str) -> Option<i32> {
    let cleaned = raw.trim().replace(',', "");
    if let Ok(n) = cleaned.parse::<i64>() {
        return i32::try_from(n).ok();
    }
    let f = cleaned.parse::<f64>().ok().filter(|f| f.is_finite())?;
    let truncated = f.trunc();
    if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return None;
    }
    Some(truncated as i32)
}

pub fn parse_float(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Age cells look like `"24-135"` (years-days); only the year part is kept.
pub fn parse_age(raw: &str) -> Option<i32> {
    let years = raw.trim().split('-').next()?;
    parse_int(years)
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{BsonType, SchemaNode, Validator};

pub const PLAYERS_COLLECTION: &str = "players";

pub const REQUIRED_FIELDS: &[&str] = &["player_id", "name", "position", "team", "start_year"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDocument {
    pub player_id: String,
    pub name: String,
    pub nationality: String,
    pub position: String,
    pub age: Option<i32>,
    pub birth_year: Option<i32>,
    pub start_year: i32,
    pub team: Team,
    pub stats: Stats,
    pub advanced_stats: AdvancedStats,
    pub passing: Passing,
    pub goal_shot_creation: GoalShotCreation,
    pub defense: Defense,
}

impl PlayerDocument {
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn from_document(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub squad_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub matches_played: i32,
    pub starts: i32,
    pub minutes_played: i32,
    pub goals: i32,
    pub assists: i32,
    pub goals_minus_pks: i32,
    pub penalty_goals: i32,
    pub penalty_attempts: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub second_yellow_cards: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedStats {
    #[serde(rename = "xG")]
    pub xg: f64,
    #[serde(rename = "npxG")]
    pub npxg: f64,
    #[serde(rename = "xAG")]
    pub xag: f64,
    pub shots: i32,
    pub shots_on_target: i32,
    pub goals_per_shot: f64,
    pub goals_per_shot_on_target: f64,
    pub average_shot_distance: f64,
    pub free_kicks: i32,
    #[serde(rename = "npxG_per_shot")]
    pub npxg_per_shot: f64,
    #[serde(rename = "goals_minus_xG")]
    pub goals_minus_xg: f64,
    #[serde(rename = "np_goals_minus_xG")]
    pub np_goals_minus_xg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passing {
    pub passes_completed: i32,
    pub passes_attempted: i32,
    pub pass_completion_pct: f64,
    pub total_pass_distance: i32,
    pub progressive_pass_distance: i32,
    pub expected_assists: f64,
    #[serde(rename = "assists_minus_xAG")]
    pub assists_minus_xag: f64,
    pub key_passes: i32,
    pub passes_into_final_third: i32,
    pub passes_into_penalty_area: i32,
    pub crosses_into_penalty_area: i32,
    pub progressive_passes: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalShotCreation {
    pub shot_creating_actions: i32,
    pub sca_pass_live: i32,
    pub sca_pass_dead: i32,
    pub sca_dribble: i32,
    pub sca_shot: i32,
    pub sca_foul_drawn: i32,
    pub sca_defense: i32,
    pub goal_creating_actions: i32,
    pub gca_pass_live: i32,
    pub gca_pass_dead: i32,
    pub gca_dribble: i32,
    pub gca_shot: i32,
    pub gca_foul_drawn: i32,
    pub gca_defense: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defense {
    pub tackles: i32,
    pub tackles_won: i32,
    pub tackles_def_3rd: i32,
    pub tackles_mid_3rd: i32,
    pub tackles_att_3rd: i32,
    pub dribble_tackles: i32,
    pub dribbles_against: i32,
    pub dribbled_past: i32,
    pub blocks: i32,
    pub blocked_shots: i32,
    pub blocked_passes: i32,
    pub interceptions: i32,
    pub tackles_interceptions: i32,
    pub clearances: i32,
    pub errors: i32,
}

const STATS_FIELDS: &[(&str, BsonType)] = &[
    ("matches_played", BsonType::Int),
    ("starts", BsonType::Int),
    ("minutes_played", BsonType::Int),
    ("goals", BsonType::Int),
    ("assists", BsonType::Int),
    ("goals_minus_pks", BsonType::Int),
    ("penalty_goals", BsonType::Int),
    ("penalty_attempts", BsonType::Int),
    ("yellow_cards", BsonType::Int),
    ("red_cards", BsonType::Int),
    ("second_yellow_cards", BsonType::Int),
];

const ADVANCED_STATS_FIELDS: &[(&str, BsonType)] = &[
    ("xG", BsonType::Double),
    ("npxG", BsonType::Double),
    ("xAG", BsonType::Double),
    ("shots", BsonType::Int),
    ("shots_on_target", BsonType::Int),
    ("goals_per_shot", BsonType::Double),
    ("goals_per_shot_on_target", BsonType::Double),
    ("average_shot_distance", BsonType::Double),
    ("free_kicks", BsonType::Int),
    ("npxG_per_shot", BsonType::Double),
    ("goals_minus_xG", BsonType::Double),
    ("np_goals_minus_xG", BsonType::Double),
];

const PASSING_FIELDS: &[(&str, BsonType)] = &[
    ("passes_completed", BsonType::Int),
    ("passes_attempted", BsonType::Int),
    ("pass_completion_pct", BsonType::Double),
    ("total_pass_distance", BsonType::Int),
    ("progressive_pass_distance", BsonType::Int),
    ("expected_assists", BsonType::Double),
    ("assists_minus_xAG", BsonType::Double),
    ("key_passes", BsonType::Int),
    ("passes_into_final_third", BsonType::Int),
    ("passes_into_penalty_area", BsonType::Int),
    ("crosses_into_penalty_area", BsonType::Int),
    ("progressive_passes", BsonType::Int),
];

const GOAL_SHOT_CREATION_FIELDS: &[(&str, BsonType)] = &[
    ("shot_creating_actions", BsonType::Int),
    ("sca_pass_live", BsonType::Int),
    ("sca_pass_dead", BsonType::Int),
    ("sca_dribble", BsonType::Int),
    ("sca_shot", BsonType::Int),
    ("sca_foul_drawn", BsonType::Int),
    ("sca_defense", BsonType::Int),
    ("goal_creating_actions", BsonType::Int),
    ("gca_pass_live", BsonType::Int),
    ("gca_pass_dead", BsonType::Int),
    ("gca_dribble", BsonType::Int),
    ("gca_shot", BsonType::Int),
    ("gca_foul_drawn", BsonType::Int),
    ("gca_defense", BsonType::Int),
];

const DEFENSE_FIELDS: &[(&str, BsonType)] = &[
    ("tackles", BsonType::Int),
    ("tackles_won", BsonType::Int),
    ("tackles_def_3rd", BsonType::Int),
    ("tackles_mid_3rd", BsonType::Int),
    ("tackles_att_3rd", BsonType::Int),
    ("dribble_tackles", BsonType::Int),
    ("dribbles_against", BsonType::Int),
    ("dribbled_past", BsonType::Int),
    ("blocks", BsonType::Int),
    ("blocked_shots", BsonType::Int),
    ("blocked_passes", BsonType::Int),
    ("interceptions", BsonType::Int),
    ("tackles_interceptions", BsonType::Int),
    ("clearances", BsonType::Int),
    ("errors", BsonType::Int),
];

/// Validator enforced on the players collection.
pub fn player_validator() -> Validator {
    let team = SchemaNode::object()
        .require(&["squad_id", "name"])
        .property("squad_id", SchemaNode::of(BsonType::String))
        .property("name", SchemaNode::of(BsonType::String));

    let schema = SchemaNode::object()
        .require(REQUIRED_FIELDS)
        .property("player_id", SchemaNode::of(BsonType::String))
        .property("name", SchemaNode::of(BsonType::String))
        .property("nationality", SchemaNode::nullable(BsonType::String))
        .property("position", SchemaNode::of(BsonType::String))
        .property("age", SchemaNode::nullable(BsonType::Int))
        .property("birth_year", SchemaNode::nullable(BsonType::Int))
        .property("start_year", SchemaNode::of(BsonType::Int))
        .property("team", team)
        .property("stats", stat_group(STATS_FIELDS))
        .property("advanced_stats", stat_group(ADVANCED_STATS_FIELDS))
        .property("passing", stat_group(PASSING_FIELDS))
        .property("goal_shot_creation", stat_group(GOAL_SHOT_CREATION_FIELDS))
        .property("defense", stat_group(DEFENSE_FIELDS));

    Validator::new(schema)
}

fn stat_group(fields: &[(&str, BsonType)]) -> SchemaNode {
    fields
        .iter()
        .fold(SchemaNode::object(), |node, (name, bson_type)| {
            node.property(name, SchemaNode::of(*bson_type))
        })
}

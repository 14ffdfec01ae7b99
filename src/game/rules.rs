use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    cards::{CardId, CardType, PlayerId},
    elo::EloConfig,
    stats::LayerSlot,
};

const DEFAULT_POINTS_FOR_SURVIVING: u32 = 1;
const DEFAULT_POINTS_FOR_DEFEATING: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleError {
    #[error("card {card_id} is a {actual} and cannot fill the {slot} slot (expected {expected})")]
    #[serde(rename_all = "camelCase")]
    CardTypeMismatch {
        card_id: CardId,
        slot: LayerSlot,
        expected: CardType,
        actual: CardType,
    },
    #[error("a sleeve must be selected before committing")]
    MissingSleeve,
    #[error("an animal must be selected before committing")]
    MissingAnimal,
    #[error("both combatants share the player id {player_id}")]
    #[serde(rename_all = "camelCase")]
    DuplicatePlayer { player_id: PlayerId },
    #[error("card pool has no {slot} cards")]
    EmptyPool { slot: CardType },
    #[error("invalid game rules: {reason}")]
    InvalidRules { reason: String },
}

/// 计分方式，由规则文档中出现的字段决定。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScoringScheme {
    /// Survivors earn `pointsForSurviving`, plus `pointsForDefeating` for a kill.
    SurviveAndDefeat,
    /// As above, plus per-point multipliers on overkill and absorbed damage.
    #[serde(rename_all = "camelCase")]
    Breakdown {
        points_per_overkill: u32,
        points_per_absorbed: u32,
    },
}

/// 对局规则常量，只读输入。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    #[serde(default = "default_points_for_surviving")]
    pub points_for_surviving: u32,
    #[serde(default = "default_points_for_defeating", alias = "pointsForKill")]
    pub points_for_defeating: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_per_overkill: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_per_absorbed: Option<u32>,
    #[serde(default)]
    pub default_initiative: i32,
    #[serde(default)]
    pub elo: EloConfig,
}

fn default_points_for_surviving() -> u32 {
    DEFAULT_POINTS_FOR_SURVIVING
}

fn default_points_for_defeating() -> u32 {
    DEFAULT_POINTS_FOR_DEFEATING
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            points_for_surviving: DEFAULT_POINTS_FOR_SURVIVING,
            points_for_defeating: DEFAULT_POINTS_FOR_DEFEATING,
            points_per_overkill: None,
            points_per_absorbed: None,
            default_initiative: 0,
            elo: EloConfig::default(),
        }
    }
}

impl GameRules {
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        serde_json::from_str(json).map_err(|error| RuleError::InvalidRules {
            reason: error.to_string(),
        })
    }

    pub fn with_breakdown_scoring(mut self, per_overkill: u32, per_absorbed: u32) -> Self {
        self.points_per_overkill = Some(per_overkill);
        self.points_per_absorbed = Some(per_absorbed);
        self
    }

    pub fn scoring_scheme(&self) -> ScoringScheme {
        match (self.points_per_overkill, self.points_per_absorbed) {
            (None, None) => ScoringScheme::SurviveAndDefeat,
            (overkill, absorbed) => ScoringScheme::Breakdown {
                points_per_overkill: overkill.unwrap_or(0),
                points_per_absorbed: absorbed.unwrap_or(0),
            },
        }
    }
}

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

const DEFAULT_PROVISIONAL_GAMES: u32 = 30;
const DEFAULT_PROVISIONAL_K: f64 = 40.0;
const DEFAULT_ESTABLISHED_K: f64 = 20.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    pub fn actual_score(self) -> f64 {
        match self {
            MatchResult::Win => 1.0,
            MatchResult::Loss => 0.0,
            MatchResult::Draw => 0.5,
        }
    }

    pub fn from_scores(own: u32, opponent: u32) -> Self {
        match own.cmp(&opponent) {
            Ordering::Greater => MatchResult::Win,
            Ordering::Less => MatchResult::Loss,
            Ordering::Equal => MatchResult::Draw,
        }
    }

    /// The same game seen from the other seat.
    pub fn inverse(self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Loss => MatchResult::Win,
            MatchResult::Draw => MatchResult::Draw,
        }
    }
}

/// K 系数设置：新玩家使用更大的 K 以便更快收敛。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EloConfig {
    pub provisional_games: u32,
    pub provisional_k: f64,
    pub established_k: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            provisional_games: DEFAULT_PROVISIONAL_GAMES,
            provisional_k: DEFAULT_PROVISIONAL_K,
            established_k: DEFAULT_ESTABLISHED_K,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EloChange {
    pub new_elo: i32,
    pub elo_change: i32,
}

impl EloConfig {
    pub fn k_factor(&self, games_played: u32) -> f64 {
        if games_played < self.provisional_games {
            self.provisional_k
        } else {
            self.established_k
        }
    }

    pub fn calculate(
        &self,
        self_rating: i32,
        opponent_rating: i32,
        self_games_played: u32,
        result: MatchResult,
    ) -> EloChange {
        let expected = expected_score(self_rating, opponent_rating);
        let k = self.k_factor(self_games_played);
        let delta = k * (result.actual_score() - expected);
        let new_elo = (f64::from(self_rating) + delta).round() as i32;

        EloChange {
            new_elo,
            elo_change: new_elo - self_rating,
        }
    }
}

pub fn expected_score(self_rating: i32, opponent_rating: i32) -> f64 {
    let exponent = (f64::from(opponent_rating) - f64::from(self_rating)) / 400.0;
    1.0 / (1.0 + 10f64.powf(exponent))
}

/// Elo update with the default K-factor settings.
pub fn calculate_elo_change(
    self_rating: i32,
    opponent_rating: i32,
    self_games_played: u32,
    result: MatchResult,
) -> EloChange {
    EloConfig::default().calculate(self_rating, opponent_rating, self_games_played, result)
}

use std::str::FromStr;

use log::{debug, trace};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{
    preview_round, CardDefinition, CardType, Composition, GameRules, PlayerStanding, RoundEntry,
    RoundResult, RuleError,
};

const OPPONENT_ID: &str = "theorycraft-opponent";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimulationDepth {
    Quick,
    Standard,
    Thorough,
}

impl FromStr for SimulationDepth {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" | "fast" => Ok(SimulationDepth::Quick),
            "standard" | "normal" => Ok(SimulationDepth::Standard),
            "thorough" | "deep" => Ok(SimulationDepth::Thorough),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TheorycraftConfig {
    pub samples: u32,
    pub max_equipment: usize,
}

impl TheorycraftConfig {
    pub fn from_depth(depth: SimulationDepth) -> Self {
        match depth {
            SimulationDepth::Quick => Self {
                samples: 100,
                max_equipment: 2,
            },
            SimulationDepth::Standard => Self {
                samples: 500,
                max_equipment: 2,
            },
            SimulationDepth::Thorough => Self {
                samples: 2_000,
                max_equipment: 3,
            },
        }
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_max_equipment(mut self, max_equipment: usize) -> Self {
        self.max_equipment = max_equipment;
        self
    }
}

impl Default for TheorycraftConfig {
    fn default() -> Self {
        TheorycraftConfig::from_depth(SimulationDepth::Standard)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TheorycraftReport {
    pub samples: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub times_survived: u32,
    pub effects_triggered: u32,
    pub average_points: f64,
    pub win_rate: f64,
    /// Opponent that beat the candidate by the widest margin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardest_matchup: Option<Composition>,
}

/// Card pool split by slot.
struct Pool<'a> {
    sleeves: Vec<&'a CardDefinition>,
    animals: Vec<&'a CardDefinition>,
    equipment: Vec<&'a CardDefinition>,
}

impl<'a> Pool<'a> {
    fn split(cards: &'a [CardDefinition]) -> Result<Self, RuleError> {
        let of_type = |card_type: CardType| -> Vec<&'a CardDefinition> {
            cards
                .iter()
                .filter(|card| card.card_type() == card_type)
                .collect()
        };

        let pool = Self {
            sleeves: of_type(CardType::Sleeve),
            animals: of_type(CardType::Animal),
            equipment: of_type(CardType::Equipment),
        };
        if pool.sleeves.is_empty() {
            return Err(RuleError::EmptyPool {
                slot: CardType::Sleeve,
            });
        }
        if pool.animals.is_empty() {
            return Err(RuleError::EmptyPool {
                slot: CardType::Animal,
            });
        }
        Ok(pool)
    }
}

pub struct Theorycrafter {
    config: TheorycraftConfig,
    rng: SmallRng,
}

impl Theorycrafter {
    pub fn new(config: TheorycraftConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: TheorycraftConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn random_opponent(&mut self, pool: &Pool<'_>) -> Composition {
        let sleeve = pool.sleeves.choose(&mut self.rng).map(|card| (*card).clone());
        let animal = pool.animals.choose(&mut self.rng).map(|card| (*card).clone());
        let mut composition = Composition::new(sleeve, animal);

        if !pool.equipment.is_empty() {
            let count = self.rng.gen_range(0..=self.config.max_equipment);
            for _ in 0..count {
                if let Some(card) = pool.equipment.choose(&mut self.rng) {
                    composition.equipment.push((*card).clone());
                }
            }
        }
        composition
    }

    /// Plays `candidate` against random opponents drawn from `pool`.
    ///
    /// Opponents carry no persistent modifiers, the candidate uses `standing`.
    pub fn evaluate(
        &mut self,
        candidate: &Composition,
        standing: &PlayerStanding,
        pool: &[CardDefinition],
        rules: &GameRules,
    ) -> Result<TheorycraftReport, RuleError> {
        candidate.validate()?;
        let pool = Pool::split(pool)?;
        let entry = RoundEntry::new(standing.clone(), candidate.clone());

        let mut report = TheorycraftReport::default();
        let mut total_points = 0u64;
        let mut worst_margin = 0i64;

        for sample in 0..self.config.samples {
            let opponent = RoundEntry::new(
                PlayerStanding::new(OPPONENT_ID),
                self.random_opponent(&pool),
            );
            let round = preview_round(&entry, &opponent, rules)?;
            let own = &round.combat.p1;
            let theirs = &round.combat.p2;

            report.samples += 1;
            match round.combat.round_result {
                RoundResult::Player1 => report.wins += 1,
                RoundResult::Player2 => report.losses += 1,
                RoundResult::Draw => report.draws += 1,
            }
            if own.outcome.survived {
                report.times_survived += 1;
            }
            if own.effect_triggered.is_some() {
                report.effects_triggered += 1;
            }
            total_points += u64::from(own.outcome.points_earned);

            let margin =
                i64::from(theirs.outcome.points_earned) - i64::from(own.outcome.points_earned);
            if margin > worst_margin {
                worst_margin = margin;
                report.hardest_matchup = Some(opponent.composition.clone());
            }
            trace!(
                "sample {sample}: {:?} ({} vs {} points)",
                round.combat.round_result,
                own.outcome.points_earned,
                theirs.outcome.points_earned
            );
        }

        if report.samples > 0 {
            let samples = f64::from(report.samples);
            report.average_points = total_points as f64 / samples;
            report.win_rate = f64::from(report.wins) / samples;
        }

        debug!(
            "theorycraft: {} samples, {} wins, {} losses, {} draws",
            report.samples, report.wins, report.losses, report.draws
        );
        Ok(report)
    }
}

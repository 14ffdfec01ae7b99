//! 双方单回合战斗结算。

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{
    cards::PlayerId,
    effects::{EffectEngine, TriggeredEffect},
    rules::{GameRules, ScoringScheme},
    stats::ResolvedStats,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub player_id: PlayerId,
    pub stats: ResolvedStats,
}

impl Combatant {
    pub fn new(player_id: impl Into<PlayerId>, stats: ResolvedStats) -> Self {
        Self {
            player_id: player_id.into(),
            stats,
        }
    }
}

/// 单个玩家本回合的结果。被摧毁的一方得分恒为 0。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub survived: bool,
    pub final_health: u32,
    pub damage_dealt: u32,
    pub damage_absorbed: u32,
    #[serde(default)]
    pub overkill: u32,
    pub kill_bonus: u32,
    pub points_earned: u32,
    /// This player's attack destroyed the opponent.
    pub defeated: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttackOrder {
    Simultaneous,
    Player1First,
    Player2First,
}

impl AttackOrder {
    pub fn from_initiative(p1: i32, p2: i32) -> Self {
        match p1.cmp(&p2) {
            Ordering::Equal => AttackOrder::Simultaneous,
            Ordering::Greater => AttackOrder::Player1First,
            Ordering::Less => AttackOrder::Player2First,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundResult {
    Player1,
    Player2,
    Draw,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombatSide {
    pub outcome: RoundOutcome,
    pub effect_triggered: Option<TriggeredEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombatResult {
    pub p1: CombatSide,
    pub p2: CombatSide,
    pub attack_order: AttackOrder,
    pub round_result: RoundResult,
    #[serde(default)]
    pub combat_log: Vec<String>,
}

/// Damage bookkeeping for one side of the exchange.
#[derive(Debug, Default, Clone, Copy)]
struct Exchange {
    attacked: bool,
    dealt: u32,
    taken: u32,
}

/// Resolves one round of combat between two resolved stat sets.
pub fn resolve_combat(p1: &Combatant, p2: &Combatant, rules: &GameRules) -> CombatResult {
    let sides = [p1, p2];
    let mut exchange = [Exchange::default(); 2];
    let mut log = Vec::new();

    let order = AttackOrder::from_initiative(p1.stats.initiative, p2.stats.initiative);
    log.push(format!(
        "{} (initiative {}) vs {} (initiative {})",
        p1.player_id, p1.stats.initiative, p2.player_id, p2.stats.initiative
    ));

    match order {
        AttackOrder::Simultaneous => {
            log.push(format!(
                "Equal initiative ({}): both attack at once",
                p1.stats.initiative
            ));
            strike(&sides, &mut exchange, 0, &mut log);
            strike(&sides, &mut exchange, 1, &mut log);
        }
        AttackOrder::Player1First | AttackOrder::Player2First => {
            let first = if order == AttackOrder::Player1First { 0 } else { 1 };
            let second = 1 - first;
            log.push(format!(
                "{} strikes first ({} vs {} initiative)",
                sides[first].player_id,
                sides[first].stats.initiative,
                sides[second].stats.initiative
            ));
            strike(&sides, &mut exchange, first, &mut log);

            if exchange[second].taken >= sides[second].stats.health {
                log.push(format!(
                    "{} is destroyed before it can counterattack",
                    sides[second].player_id
                ));
            } else {
                log.push(format!("{} counterattacks", sides[second].player_id));
                strike(&sides, &mut exchange, second, &mut log);
            }
        }
    }

    let final_health = [
        p1.stats.health.saturating_sub(exchange[0].taken),
        p2.stats.health.saturating_sub(exchange[1].taken),
    ];
    let survived = [final_health[0] > 0, final_health[1] > 0];

    let mut outcomes = [0, 1].map(|index| {
        let opponent = 1 - index;
        let own = exchange[index];
        let defeated = own.attacked && own.dealt > 0 && !survived[opponent];
        let overkill = if own.attacked {
            own.dealt.saturating_sub(sides[opponent].stats.health)
        } else {
            0
        };

        RoundOutcome {
            survived: survived[index],
            final_health: final_health[index],
            damage_dealt: own.dealt,
            damage_absorbed: own.taken.min(sides[index].stats.health),
            overkill,
            kill_bonus: 0,
            points_earned: 0,
            defeated,
        }
    });

    for (index, outcome) in outcomes.iter_mut().enumerate() {
        score(outcome, rules);
        let player = &sides[index].player_id;
        if outcome.survived {
            log.push(format!(
                "{player} survives with {} health and earns {} point(s)",
                outcome.final_health, outcome.points_earned
            ));
        } else {
            log.push(format!("{player} is destroyed"));
        }
    }

    let round_result = match outcomes[0].points_earned.cmp(&outcomes[1].points_earned) {
        Ordering::Greater => RoundResult::Player1,
        Ordering::Less => RoundResult::Player2,
        Ordering::Equal => RoundResult::Draw,
    };

    let [o1, o2] = outcomes;
    let e1 = EffectEngine::trigger_for(&p1.player_id, p1.stats.special_effect.as_ref(), &o1);
    let e2 = EffectEngine::trigger_for(&p2.player_id, p2.stats.special_effect.as_ref(), &o2);
    for triggered in e1.iter().chain(e2.iter()) {
        log.push(format!(
            "{} triggers: {}",
            triggered.player_id, triggered.effect
        ));
    }

    CombatResult {
        p1: CombatSide {
            outcome: o1,
            effect_triggered: e1,
        },
        p2: CombatSide {
            outcome: o2,
            effect_triggered: e2,
        },
        attack_order: order,
        round_result,
        combat_log: log,
    }
}

fn strike(
    sides: &[&Combatant; 2],
    exchange: &mut [Exchange; 2],
    attacker: usize,
    log: &mut Vec<String>,
) {
    let defender = 1 - attacker;
    let damage = sides[attacker].stats.damage;
    let before = sides[defender].stats.health.saturating_sub(exchange[defender].taken);

    exchange[attacker].attacked = true;
    exchange[attacker].dealt = damage;
    exchange[defender].taken = exchange[defender].taken.saturating_add(damage);

    log.push(format!(
        "{} deals {} damage to {} ({} -> {})",
        sides[attacker].player_id,
        damage,
        sides[defender].player_id,
        before,
        before.saturating_sub(damage)
    ));
}

fn score(outcome: &mut RoundOutcome, rules: &GameRules) {
    if !outcome.survived {
        outcome.kill_bonus = 0;
        outcome.points_earned = 0;
        return;
    }

    outcome.kill_bonus = if outcome.defeated {
        rules.points_for_defeating
    } else {
        0
    };

    let mut points = rules.points_for_surviving.saturating_add(outcome.kill_bonus);
    if let ScoringScheme::Breakdown {
        points_per_overkill,
        points_per_absorbed,
    } = rules.scoring_scheme()
    {
        points = points
            .saturating_add(outcome.overkill.saturating_mul(points_per_overkill))
            .saturating_add(outcome.damage_absorbed.saturating_mul(points_per_absorbed));
    }
    outcome.points_earned = points;
}

//! 回合编排：解析双方属性、结算战斗，并把触发的效果结转到下一回合。
//!
//! Everything here is still pure. Persisting the returned standings is the
//! caller's job.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{
    cards::{EffectAction, PersistentModifier, PlayerId},
    combat::{resolve_combat, CombatResult, CombatSide, Combatant},
    rules::{GameRules, RuleError},
    stats::{resolve_breakdown, Composition, StatBreakdown},
};

/// 玩家跨回合的累积状态。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    #[serde(default)]
    pub score: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub persistent_modifiers: Vec<PersistentModifier>,
    #[serde(default)]
    pub initiative_modifier: i32,
    /// Cards owed from effects triggered in the last resolved round.
    #[serde(default)]
    pub cards_to_draw: u32,
}

impl PlayerStanding {
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    pub fn with_persistent_modifier(mut self, modifier: PersistentModifier) -> Self {
        self.persistent_modifiers.push(modifier);
        self
    }

    pub fn with_initiative_modifier(mut self, amount: i32) -> Self {
        self.initiative_modifier = amount;
        self
    }

    /// Standing for the next round after `side` was resolved for this player.
    pub fn advance(&self, side: &CombatSide) -> PlayerStanding {
        let mut next = PlayerStanding {
            player_id: self.player_id.clone(),
            score: self.score.saturating_add(side.outcome.points_earned),
            persistent_modifiers: self.persistent_modifiers.clone(),
            initiative_modifier: 0,
            cards_to_draw: 0,
        };

        if let Some(triggered) = &side.effect_triggered {
            next.apply(&triggered.effect);
        }
        next
    }

    pub fn apply(&mut self, action: &EffectAction) {
        match *action {
            EffectAction::DrawCards { count } => {
                self.cards_to_draw = self.cards_to_draw.saturating_add(count);
            }
            EffectAction::ModifyInitiative { amount } => {
                self.initiative_modifier = self.initiative_modifier.saturating_add(amount);
            }
            EffectAction::AddPersistentModifier { stat, amount } => {
                self.persistent_modifiers
                    .push(PersistentModifier::new(stat, amount));
            }
        }
    }
}

/// One player's committed (or previewed) cards for the round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntry {
    pub standing: PlayerStanding,
    pub composition: Composition,
}

impl RoundEntry {
    pub fn new(standing: PlayerStanding, composition: Composition) -> Self {
        Self {
            standing,
            composition,
        }
    }

    fn resolve(&self, rules: &GameRules) -> StatBreakdown {
        resolve_breakdown(
            self.composition.layers(),
            &self.standing.persistent_modifiers,
            self.standing.initiative_modifier,
            rules.default_initiative,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    pub p1_stats: StatBreakdown,
    pub p2_stats: StatBreakdown,
    pub combat: CombatResult,
    pub p1_next: PlayerStanding,
    pub p2_next: PlayerStanding,
}

/// Authoritative round resolution: both compositions must be complete.
pub fn play_round(
    p1: &RoundEntry,
    p2: &RoundEntry,
    rules: &GameRules,
) -> Result<RoundReport, RuleError> {
    for entry in [p1, p2] {
        if let Err(error) = entry.composition.validate_for_commit() {
            warn!("rejecting commit from {}: {error}", entry.standing.player_id);
            return Err(error);
        }
    }
    run_round(p1, p2, rules)
}

/// Same as [`play_round`] but accepts incomplete compositions, for live preview.
pub fn preview_round(
    p1: &RoundEntry,
    p2: &RoundEntry,
    rules: &GameRules,
) -> Result<RoundReport, RuleError> {
    p1.composition.validate()?;
    p2.composition.validate()?;
    run_round(p1, p2, rules)
}

fn run_round(
    p1: &RoundEntry,
    p2: &RoundEntry,
    rules: &GameRules,
) -> Result<RoundReport, RuleError> {
    if p1.standing.player_id == p2.standing.player_id {
        return Err(RuleError::DuplicatePlayer {
            player_id: p1.standing.player_id.clone(),
        });
    }

    let p1_stats = p1.resolve(rules);
    let p2_stats = p2.resolve(rules);

    let combat = resolve_combat(
        &Combatant::new(p1.standing.player_id.clone(), p1_stats.stats.clone()),
        &Combatant::new(p2.standing.player_id.clone(), p2_stats.stats.clone()),
        rules,
    );

    debug!(
        "round {} vs {}: {:?}, points {}/{}",
        p1.standing.player_id,
        p2.standing.player_id,
        combat.round_result,
        combat.p1.outcome.points_earned,
        combat.p2.outcome.points_earned
    );

    let p1_next = p1.standing.advance(&combat.p1);
    let p2_next = p2.standing.advance(&combat.p2);

    Ok(RoundReport {
        p1_stats,
        p2_stats,
        combat,
        p1_next,
        p2_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{CardDefinition, CardStats, StatKind, TriggerKind};
    use crate::game::combat::RoundResult;

    fn entry(id: &str, sleeve: CardStats, animal: CardStats) -> RoundEntry {
        let composition = Composition::new(
            Some(CardDefinition::sleeve(
                format!("{id}-sleeve"),
                "Sleeve",
                None,
                Some(sleeve),
            )),
            Some(CardDefinition::animal(format!("{id}-animal"), "Animal", animal)),
        );
        RoundEntry::new(PlayerStanding::new(id), composition)
    }

    #[test]
    fn winner_carries_points_and_persistent_modifier() {
        let p1 = entry(
            "p1",
            CardStats::new().with_special_effect(
                TriggerKind::IfSurvives,
                EffectAction::AddPersistentModifier {
                    stat: StatKind::Damage,
                    amount: 2,
                },
            ),
            CardStats::new().with_damage(6).with_health(6).with_initiative(1),
        );
        let p2 = entry(
            "p2",
            CardStats::new(),
            CardStats::new().with_damage(3).with_health(4),
        );

        let report = play_round(&p1, &p2, &GameRules::default()).expect("round should resolve");
        assert_eq!(report.combat.round_result, RoundResult::Player1);
        assert_eq!(report.p1_next.score, 2);
        assert_eq!(
            report.p1_next.persistent_modifiers,
            vec![PersistentModifier::new(StatKind::Damage, 2)]
        );
        assert_eq!(report.p2_next.score, 0);
    }

    #[test]
    fn initiative_effect_lands_next_round_only() {
        let mut p1 = entry(
            "p1",
            CardStats::new().with_special_effect(
                TriggerKind::OnPlay,
                EffectAction::ModifyInitiative { amount: 3 },
            ),
            CardStats::new().with_damage(1).with_health(10),
        );
        p1.standing.initiative_modifier = 1;
        let p2 = entry("p2", CardStats::new(), CardStats::new().with_damage(1).with_health(10));

        let report = play_round(&p1, &p2, &GameRules::default()).expect("round should resolve");
        assert_eq!(report.p1_stats.stats.initiative, 1, "current modifier consumed");
        assert_eq!(report.p1_next.initiative_modifier, 3, "old modifier reset, new one stored");
        assert_eq!(report.p2_next.initiative_modifier, 0);
    }

    #[test]
    fn draw_effect_is_reported() {
        let p1 = entry(
            "p1",
            CardStats::new().with_special_effect(
                TriggerKind::IfDestroyed,
                EffectAction::DrawCards { count: 2 },
            ),
            CardStats::new().with_damage(1).with_health(1),
        );
        let p2 = entry("p2", CardStats::new(), CardStats::new().with_damage(5).with_health(5));

        let report = play_round(&p1, &p2, &GameRules::default()).expect("round should resolve");
        assert_eq!(report.p1_next.cards_to_draw, 2);
    }

    #[test]
    fn persistent_modifiers_feed_resolution() {
        let mut p1 = entry("p1", CardStats::new(), CardStats::new().with_damage(2).with_health(2));
        p1.standing = p1
            .standing
            .with_persistent_modifier(PersistentModifier::new(StatKind::Health, 5));
        let p2 = entry("p2", CardStats::new(), CardStats::new().with_damage(4).with_health(1));

        let report = play_round(&p1, &p2, &GameRules::default()).expect("round should resolve");
        assert_eq!(report.p1_stats.stats.health, 7);
        assert!(report.combat.p1.outcome.survived);
    }

    #[test]
    fn commit_rejects_incomplete_but_preview_allows_it() {
        let mut p1 = entry("p1", CardStats::new(), CardStats::new().with_damage(1).with_health(1));
        p1.composition.sleeve = None;
        let p2 = entry("p2", CardStats::new(), CardStats::new().with_damage(1).with_health(1));

        assert_eq!(
            play_round(&p1, &p2, &GameRules::default()),
            Err(RuleError::MissingSleeve)
        );
        assert!(preview_round(&p1, &p2, &GameRules::default()).is_ok());
    }

    #[test]
    fn same_player_cannot_fight_itself() {
        let p1 = entry("p1", CardStats::new(), CardStats::new().with_health(1));
        let result = preview_round(&p1, &p1.clone(), &GameRules::default());
        assert!(matches!(result, Err(RuleError::DuplicatePlayer { .. })));
    }

    #[test]
    fn default_initiative_applies_when_unset() {
        let rules = GameRules {
            default_initiative: 2,
            ..GameRules::default()
        };
        let p1 = entry("p1", CardStats::new(), CardStats::new().with_damage(1).with_health(3));
        let p2 = entry(
            "p2",
            CardStats::new(),
            CardStats::new().with_damage(1).with_health(3).with_initiative(1),
        );

        let report = preview_round(&p1, &p2, &rules).expect("preview should resolve");
        assert_eq!(report.p1_stats.stats.initiative, 2);
        assert_eq!(report.p2_stats.stats.initiative, 1);
    }
}

use serde::{Deserialize, Serialize};

use super::{
    cards::{EffectAction, PlayerId, SpecialEffect, TriggerKind},
    combat::RoundOutcome,
};

impl TriggerKind {
    pub fn is_satisfied(&self, outcome: &RoundOutcome) -> bool {
        match self {
            TriggerKind::OnPlay => true,
            TriggerKind::IfSurvives => outcome.survived,
            TriggerKind::IfDestroyed => !outcome.survived,
            TriggerKind::IfDefeats => outcome.defeated,
            TriggerKind::IfDoesntDefeat => !outcome.defeated,
        }
    }
}

/// 本回合实际触发的特殊效果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredEffect {
    pub player_id: PlayerId,
    pub effect: EffectAction,
}

/// Decides whether special effects fire. Applying them is left to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectEngine;

impl EffectEngine {
    /// Returns the action unchanged when `trigger` matches the player's own outcome.
    pub fn evaluate(
        trigger: TriggerKind,
        effect: &EffectAction,
        own_outcome: &RoundOutcome,
    ) -> Option<EffectAction> {
        trigger.is_satisfied(own_outcome).then_some(*effect)
    }

    pub fn trigger_for(
        player_id: &PlayerId,
        special_effect: Option<&SpecialEffect>,
        own_outcome: &RoundOutcome,
    ) -> Option<TriggeredEffect> {
        let special_effect = special_effect?;
        Self::evaluate(special_effect.trigger, &special_effect.effect, own_outcome).map(|effect| {
            TriggeredEffect {
                player_id: player_id.clone(),
                effect,
            }
        })
    }
}

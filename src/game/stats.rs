//! 卡牌属性分层合成。
//!
//! A composed card stacks, bottom to top: sleeve background, animal, each
//! equipment in order, sleeve foreground. Each layer only overwrites the
//! fields it defines.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    cards::{
        CardDefinition, CardId, CardStats, CardType, PersistentModifier, SpecialEffect,
        StatKind, StatModifier,
    },
    rules::RuleError,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum LayerSlot {
    SleeveBackground,
    Animal,
    Equipment,
    SleeveForeground,
}

impl LayerSlot {
    pub fn expected_type(&self) -> CardType {
        match self {
            LayerSlot::SleeveBackground | LayerSlot::SleeveForeground => CardType::Sleeve,
            LayerSlot::Animal => CardType::Animal,
            LayerSlot::Equipment => CardType::Equipment,
        }
    }
}

impl fmt::Display for LayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LayerSlot::SleeveBackground => "sleeve background",
            LayerSlot::Animal => "animal",
            LayerSlot::Equipment => "equipment",
            LayerSlot::SleeveForeground => "sleeve foreground",
        };
        f.write_str(label)
    }
}

/// One stat-contributing layer of a composed card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLayer<'a> {
    pub slot: LayerSlot,
    pub card_id: &'a str,
    pub stats: &'a CardStats,
}

impl StatLayer<'_> {
    fn source(&self) -> StatSource {
        StatSource {
            slot: self.slot,
            card_id: self.card_id.to_owned(),
        }
    }
}

/// The layer that supplied a base value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatSource {
    pub slot: LayerSlot,
    pub card_id: CardId,
}

/// 合成后的最终属性。伤害与生命不小于 0，先攻可以为负。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStats {
    pub damage: u32,
    pub health: u32,
    pub initiative: i32,
    #[serde(default)]
    pub modifier: Option<StatModifier>,
    #[serde(default)]
    pub special_effect: Option<SpecialEffect>,
}

impl ResolvedStats {
    pub fn new(damage: u32, health: u32, initiative: i32) -> Self {
        Self {
            damage,
            health,
            initiative,
            modifier: None,
            special_effect: None,
        }
    }

    pub fn with_special_effect(mut self, special_effect: SpecialEffect) -> Self {
        self.special_effect = Some(special_effect);
        self
    }
}

/// Resolved stats plus where each base value came from, for the preview breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatBreakdown {
    pub stats: ResolvedStats,
    pub base_damage: i32,
    pub base_health: i32,
    pub base_initiative: i32,
    pub damage_source: Option<StatSource>,
    pub health_source: Option<StatSource>,
    pub initiative_source: Option<StatSource>,
    pub persistent_damage: i64,
    pub persistent_health: i64,
}

/// The cards a player has placed into each slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(default)]
    pub sleeve: Option<CardDefinition>,
    #[serde(default)]
    pub animal: Option<CardDefinition>,
    #[serde(default)]
    pub equipment: Vec<CardDefinition>,
}

impl Composition {
    pub fn new(sleeve: Option<CardDefinition>, animal: Option<CardDefinition>) -> Self {
        Self {
            sleeve,
            animal,
            equipment: Vec::new(),
        }
    }

    pub fn with_equipment(mut self, equipment: CardDefinition) -> Self {
        self.equipment.push(equipment);
        self
    }

    /// Ordered layers, bottom first.
    pub fn layers(&self) -> Vec<StatLayer<'_>> {
        collect_layers(self.sleeve.as_ref(), self.animal.as_ref(), &self.equipment)
    }

    /// Checks that every slot holds a card of the matching type.
    pub fn validate(&self) -> Result<(), RuleError> {
        if let Some(sleeve) = &self.sleeve {
            ensure_slot(sleeve, LayerSlot::SleeveBackground)?;
        }
        if let Some(animal) = &self.animal {
            ensure_slot(animal, LayerSlot::Animal)?;
        }
        for equipment in &self.equipment {
            ensure_slot(equipment, LayerSlot::Equipment)?;
        }
        Ok(())
    }

    /// Stricter check used before a round commit: sleeve and animal are mandatory.
    pub fn validate_for_commit(&self) -> Result<(), RuleError> {
        if self.sleeve.is_none() {
            return Err(RuleError::MissingSleeve);
        }
        if self.animal.is_none() {
            return Err(RuleError::MissingAnimal);
        }
        self.validate()
    }

    pub fn resolve(
        &self,
        persistent_modifiers: &[PersistentModifier],
        initiative_modifier: i32,
    ) -> ResolvedStats {
        resolve_layers(self.layers(), persistent_modifiers, initiative_modifier)
    }
}

fn ensure_slot(card: &CardDefinition, slot: LayerSlot) -> Result<(), RuleError> {
    let expected = slot.expected_type();
    let actual = card.card_type();
    if actual != expected {
        return Err(RuleError::CardTypeMismatch {
            card_id: card.id.clone(),
            slot,
            expected,
            actual,
        });
    }
    Ok(())
}

pub fn collect_layers<'a>(
    sleeve: Option<&'a CardDefinition>,
    animal: Option<&'a CardDefinition>,
    equipment: &'a [CardDefinition],
) -> Vec<StatLayer<'a>> {
    let mut layers = Vec::with_capacity(equipment.len() + 3);

    if let Some(card) = sleeve {
        if let Some(stats) = card.background_stats() {
            layers.push(StatLayer {
                slot: LayerSlot::SleeveBackground,
                card_id: &card.id,
                stats,
            });
        }
    }
    if let Some(card) = animal {
        if let Some(stats) = card.stats() {
            layers.push(StatLayer {
                slot: LayerSlot::Animal,
                card_id: &card.id,
                stats,
            });
        }
    }
    for card in equipment {
        if let Some(stats) = card.stats() {
            layers.push(StatLayer {
                slot: LayerSlot::Equipment,
                card_id: &card.id,
                stats,
            });
        }
    }
    if let Some(card) = sleeve {
        if let Some(stats) = card.foreground_stats() {
            layers.push(StatLayer {
                slot: LayerSlot::SleeveForeground,
                card_id: &card.id,
                stats,
            });
        }
    }

    layers.retain(|layer| !layer.stats.is_empty());
    layers
}

/// Resolves a composed card. `sleeve` and `animal` may be absent for previews.
pub fn resolve_stats(
    sleeve: Option<&CardDefinition>,
    animal: Option<&CardDefinition>,
    equipment: &[CardDefinition],
    persistent_modifiers: &[PersistentModifier],
    initiative_modifier: i32,
) -> ResolvedStats {
    resolve_layers(
        collect_layers(sleeve, animal, equipment),
        persistent_modifiers,
        initiative_modifier,
    )
}

pub fn resolve_layers<'a, I>(
    layers: I,
    persistent_modifiers: &[PersistentModifier],
    initiative_modifier: i32,
) -> ResolvedStats
where
    I: IntoIterator<Item = StatLayer<'a>>,
{
    resolve_breakdown(layers, persistent_modifiers, initiative_modifier, 0).stats
}

/// Full resolution. `default_initiative` is the base used when no layer sets one.
pub fn resolve_breakdown<'a, I>(
    layers: I,
    persistent_modifiers: &[PersistentModifier],
    initiative_modifier: i32,
    default_initiative: i32,
) -> StatBreakdown
where
    I: IntoIterator<Item = StatLayer<'a>>,
{
    let mut acc = CardStats::default();
    let mut damage_source = None;
    let mut health_source = None;
    let mut initiative_source = None;

    for layer in layers {
        if layer.stats.damage.is_some() {
            damage_source = Some(layer.source());
        }
        if layer.stats.health.is_some() {
            health_source = Some(layer.source());
        }
        if layer.stats.initiative.is_some() {
            initiative_source = Some(layer.source());
        }
        acc.merge(layer.stats);
    }

    let base_damage = acc.damage.unwrap_or(0);
    let base_health = acc.health.unwrap_or(0);
    let base_initiative = acc.initiative.unwrap_or(default_initiative);

    let (persistent_damage, persistent_health) =
        persistent_modifiers
            .iter()
            .fold((0i64, 0i64), |(damage, health), modifier| match modifier.stat {
                StatKind::Damage => (damage + i64::from(modifier.amount), health),
                StatKind::Health => (damage, health + i64::from(modifier.amount)),
            });

    // i64 keeps large modifier stacks from wrapping before the floor.
    let mut damage = i64::from(base_damage) + persistent_damage;
    let mut health = i64::from(base_health) + persistent_health;

    if let Some(modifier) = acc.modifier {
        match modifier.kind {
            StatKind::Damage => damage += i64::from(modifier.amount),
            StatKind::Health => health += i64::from(modifier.amount),
        }
    }

    let stats = ResolvedStats {
        damage: floor_to_u32(damage),
        health: floor_to_u32(health),
        initiative: base_initiative.saturating_add(initiative_modifier),
        modifier: acc.modifier,
        special_effect: acc.special_effect,
    };

    StatBreakdown {
        stats,
        base_damage,
        base_health,
        base_initiative,
        damage_source,
        health_source,
        initiative_source,
        persistent_damage,
        persistent_health,
    }
}

fn floor_to_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{EffectAction, TriggerKind};

    fn sleeve(background: Option<CardStats>, foreground: Option<CardStats>) -> CardDefinition {
        CardDefinition::sleeve("sleeve", "Test Sleeve", background, foreground)
    }

    fn animal(stats: CardStats) -> CardDefinition {
        CardDefinition::animal("animal", "Test Animal", stats)
    }

    fn equipment(id: &str, stats: CardStats) -> CardDefinition {
        CardDefinition::equipment(id, id, stats)
    }

    #[test]
    fn animal_beats_background_when_foreground_is_silent() {
        let sleeve = sleeve(
            Some(CardStats::new().with_damage(2)),
            Some(CardStats::new().with_health(1)),
        );
        let animal = animal(CardStats::new().with_damage(5));

        let stats = resolve_stats(Some(&sleeve), Some(&animal), &[], &[], 0);
        assert_eq!(stats.damage, 5);
        assert_eq!(stats.health, 1, "foreground health should win");
    }

    #[test]
    fn later_equipment_overwrites_earlier() {
        let animal = animal(CardStats::new().with_damage(1).with_health(4));
        let gear = vec![
            equipment("first", CardStats::new().with_damage(3).with_initiative(1)),
            equipment("second", CardStats::new().with_damage(6)),
        ];

        let stats = resolve_stats(None, Some(&animal), &gear, &[], 0);
        assert_eq!(stats.damage, 6);
        assert_eq!(stats.initiative, 1, "first equipment initiative is kept");
        assert_eq!(stats.health, 4);
    }

    #[test]
    fn foreground_is_the_final_overwrite() {
        let sleeve = sleeve(None, Some(CardStats::new().with_damage(1)));
        let animal = animal(CardStats::new().with_damage(9).with_health(10));
        let gear = vec![equipment("axe", CardStats::new().with_damage(12))];

        let stats = resolve_stats(Some(&sleeve), Some(&animal), &gear, &[], 0);
        assert_eq!(stats.damage, 1);
        assert_eq!(stats.health, 10, "foreground leaves health untouched");
    }

    #[test]
    fn persistent_and_card_modifiers_add_up() {
        let animal = animal(CardStats::new().with_damage(4).with_health(4));
        let gear = vec![equipment(
            "shield",
            CardStats::new().with_modifier(StatKind::Health, 3),
        )];
        let persistent = [
            PersistentModifier::new(StatKind::Damage, 2),
            PersistentModifier::new(StatKind::Health, -1),
            PersistentModifier::new(StatKind::Damage, 1),
        ];

        let stats = resolve_stats(None, Some(&animal), &gear, &persistent, 0);
        assert_eq!(stats.damage, 7);
        assert_eq!(stats.health, 6);
        assert_eq!(stats.modifier, Some(StatModifier::new(StatKind::Health, 3)));
    }

    #[test]
    fn only_topmost_modifier_applies() {
        let animal = animal(
            CardStats::new()
                .with_damage(2)
                .with_health(2)
                .with_modifier(StatKind::Damage, 10),
        );
        let gear = vec![equipment(
            "charm",
            CardStats::new().with_modifier(StatKind::Health, 1),
        )];

        let stats = resolve_stats(None, Some(&animal), &gear, &[], 0);
        assert_eq!(stats.damage, 2);
        assert_eq!(stats.health, 3);
    }

    #[test]
    fn damage_and_health_floor_at_zero() {
        let animal = animal(CardStats::new().with_damage(5).with_health(2));
        let persistent = [
            PersistentModifier::new(StatKind::Damage, -60),
            PersistentModifier::new(StatKind::Damage, -40),
            PersistentModifier::new(StatKind::Health, -3),
        ];

        let stats = resolve_stats(None, Some(&animal), &[], &persistent, 0);
        assert_eq!(stats.damage, 0);
        assert_eq!(stats.health, 0);
    }

    #[test]
    fn initiative_is_not_floored() {
        let animal = animal(CardStats::new().with_damage(1).with_health(1));
        let stats = resolve_stats(None, Some(&animal), &[], &[], -3);
        assert_eq!(stats.initiative, -3);
    }

    #[test]
    fn empty_composition_resolves_to_zeroes() {
        let stats = resolve_stats(None, None, &[], &[], 0);
        assert_eq!(stats, ResolvedStats::default());
    }

    #[test]
    fn special_effect_follows_layer_order() {
        let draw = SpecialEffect::new(TriggerKind::OnPlay, EffectAction::DrawCards { count: 1 });
        let sleeve = sleeve(
            Some(CardStats::new().with_special_effect(
                TriggerKind::IfSurvives,
                EffectAction::DrawCards { count: 3 },
            )),
            None,
        );
        let animal = animal(CardStats::new().with_special_effect(draw.trigger, draw.effect));

        let stats = resolve_stats(Some(&sleeve), Some(&animal), &[], &[], 0);
        assert_eq!(stats.special_effect, Some(draw));
    }

    #[test]
    fn breakdown_reports_sources_and_default_initiative() {
        let sleeve = sleeve(Some(CardStats::new().with_health(3)), None);
        let animal = animal(CardStats::new().with_damage(4));
        let composition = Composition::new(Some(sleeve), Some(animal));

        let breakdown = resolve_breakdown(
            composition.layers(),
            &[PersistentModifier::new(StatKind::Health, 2)],
            1,
            5,
        );
        assert_eq!(
            breakdown.damage_source,
            Some(StatSource {
                slot: LayerSlot::Animal,
                card_id: "animal".into(),
            })
        );
        assert_eq!(
            breakdown.health_source.map(|source| source.slot),
            Some(LayerSlot::SleeveBackground)
        );
        assert_eq!(breakdown.initiative_source, None);
        assert_eq!(breakdown.base_initiative, 5);
        assert_eq!(breakdown.persistent_health, 2);
        assert_eq!(breakdown.stats.initiative, 6);
        assert_eq!(breakdown.stats.health, 5);
    }

    #[test]
    fn blank_stat_blocks_add_no_layer() {
        let sleeve = sleeve(Some(CardStats::new()), Some(CardStats::new().with_damage(2)));
        let gear = vec![
            equipment("plain", CardStats::new()),
            equipment("spiked", CardStats::new().with_damage(3)),
        ];
        let composition = Composition {
            sleeve: Some(sleeve),
            animal: Some(animal(CardStats::new().with_health(4))),
            equipment: gear,
        };

        let ids: Vec<(LayerSlot, &str)> = composition
            .layers()
            .iter()
            .map(|layer| (layer.slot, layer.card_id))
            .collect();
        assert_eq!(
            ids,
            vec![
                (LayerSlot::Animal, "animal"),
                (LayerSlot::Equipment, "spiked"),
                (LayerSlot::SleeveForeground, "sleeve"),
            ]
        );

        let breakdown = resolve_breakdown(composition.layers(), &[], 0, 0);
        assert_eq!(
            breakdown.damage_source.map(|source| source.card_id),
            Some("sleeve".to_string())
        );
    }

    #[test]
    fn validate_rejects_misplaced_cards() {
        let composition = Composition::new(None, Some(animal(CardStats::new())))
            .with_equipment(animal(CardStats::new()));

        let error = composition.validate().expect_err("animal in equipment slot");
        assert!(matches!(
            error,
            RuleError::CardTypeMismatch {
                slot: LayerSlot::Equipment,
                expected: CardType::Equipment,
                actual: CardType::Animal,
                ..
            }
        ));
    }

    #[test]
    fn commit_requires_sleeve_and_animal() {
        let preview = Composition::new(None, Some(animal(CardStats::new())));
        assert!(preview.validate().is_ok(), "previews may skip the sleeve");
        assert_eq!(preview.validate_for_commit(), Err(RuleError::MissingSleeve));

        let no_animal = Composition::new(Some(sleeve(None, None)), None);
        assert_eq!(no_animal.validate_for_commit(), Err(RuleError::MissingAnimal));
    }
}

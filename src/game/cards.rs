use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 卡牌标识（与存储层文档 id 一致）。
pub type CardId = String;
/// 玩家标识。
pub type PlayerId = String;

/// 可被修正的数值属性。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Damage,
    Health,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Damage => f.write_str("damage"),
            StatKind::Health => f.write_str("health"),
        }
    }
}

/// 卡面自带的单次修正，只有最顶层的那一个生效。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatModifier {
    #[serde(rename = "type")]
    pub kind: StatKind,
    pub amount: i32,
}

impl StatModifier {
    pub fn new(kind: StatKind, amount: i32) -> Self {
        Self { kind, amount }
    }
}

/// 跨回合累积的修正，由外部状态保存。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistentModifier {
    pub stat: StatKind,
    pub amount: i32,
}

impl PersistentModifier {
    pub fn new(stat: StatKind, amount: i32) -> Self {
        Self { stat, amount }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    OnPlay,
    IfSurvives,
    IfDestroyed,
    IfDefeats,
    IfDoesntDefeat,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TriggerKind::OnPlay => "on play",
            TriggerKind::IfSurvives => "if survives",
            TriggerKind::IfDestroyed => "if destroyed",
            TriggerKind::IfDefeats => "if defeats",
            TriggerKind::IfDoesntDefeat => "if doesn't defeat",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EffectAction {
    DrawCards { count: u32 },
    /// Applies to the next round, never to the round that triggered it.
    ModifyInitiative { amount: i32 },
    AddPersistentModifier { stat: StatKind, amount: i32 },
}

impl fmt::Display for EffectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectAction::DrawCards { count } => write!(f, "draw {count} card(s)"),
            EffectAction::ModifyInitiative { amount } => {
                write!(f, "{amount:+} initiative next round")
            }
            EffectAction::AddPersistentModifier { stat, amount } => {
                write!(f, "{amount:+} {stat} for the rest of the game")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialEffect {
    pub trigger: TriggerKind,
    pub effect: EffectAction,
}

impl SpecialEffect {
    pub fn new(trigger: TriggerKind, effect: EffectAction) -> Self {
        Self { trigger, effect }
    }
}

/// 单个图层声明的属性。所有字段都可缺省，缺省表示"本层不定义该属性"，与 0 不同。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<StatModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<SpecialEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
}

impl CardStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn with_modifier(mut self, kind: StatKind, amount: i32) -> Self {
        self.modifier = Some(StatModifier::new(kind, amount));
        self
    }

    pub fn with_special_effect(mut self, trigger: TriggerKind, effect: EffectAction) -> Self {
        self.special_effect = Some(SpecialEffect::new(trigger, effect));
        self
    }

    /// Overlays `layer` on top of `self`. Only fields the layer defines are replaced.
    pub fn merge(&mut self, layer: &CardStats) {
        if layer.damage.is_some() {
            self.damage = layer.damage;
        }
        if layer.health.is_some() {
            self.health = layer.health;
        }
        if layer.modifier.is_some() {
            self.modifier = layer.modifier;
        }
        if layer.special_effect.is_some() {
            self.special_effect = layer.special_effect;
        }
        if layer.initiative.is_some() {
            self.initiative = layer.initiative;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.damage.is_none()
            && self.health.is_none()
            && self.modifier.is_none()
            && self.special_effect.is_none()
            && self.initiative.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Sleeve,
    Animal,
    Equipment,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardType::Sleeve => f.write_str("sleeve"),
            CardType::Animal => f.write_str("animal"),
            CardType::Equipment => f.write_str("equipment"),
        }
    }
}

/// 卡牌种类及其属性块。卡套有前景、背景两层，其余卡只有一层。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CardKind {
    #[serde(rename_all = "camelCase")]
    Sleeve {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background_stats: Option<CardStats>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        foreground_stats: Option<CardStats>,
    },
    Animal {
        #[serde(default)]
        stats: CardStats,
    },
    Equipment {
        #[serde(default)]
        stats: CardStats,
    },
}

impl CardKind {
    pub fn card_type(&self) -> CardType {
        match self {
            CardKind::Sleeve { .. } => CardType::Sleeve,
            CardKind::Animal { .. } => CardType::Animal,
            CardKind::Equipment { .. } => CardType::Equipment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(flatten)]
    pub kind: CardKind,
}

impl CardDefinition {
    pub fn new(id: impl Into<CardId>, name: impl Into<String>, kind: CardKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            image_url: String::new(),
            kind,
        }
    }

    pub fn sleeve(
        id: impl Into<CardId>,
        name: impl Into<String>,
        background_stats: Option<CardStats>,
        foreground_stats: Option<CardStats>,
    ) -> Self {
        Self::new(
            id,
            name,
            CardKind::Sleeve {
                background_stats,
                foreground_stats,
            },
        )
    }

    pub fn animal(id: impl Into<CardId>, name: impl Into<String>, stats: CardStats) -> Self {
        Self::new(id, name, CardKind::Animal { stats })
    }

    pub fn equipment(id: impl Into<CardId>, name: impl Into<String>, stats: CardStats) -> Self {
        Self::new(id, name, CardKind::Equipment { stats })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn card_type(&self) -> CardType {
        self.kind.card_type()
    }

    pub fn background_stats(&self) -> Option<&CardStats> {
        match &self.kind {
            CardKind::Sleeve {
                background_stats, ..
            } => background_stats.as_ref(),
            _ => None,
        }
    }

    pub fn foreground_stats(&self) -> Option<&CardStats> {
        match &self.kind {
            CardKind::Sleeve {
                foreground_stats, ..
            } => foreground_stats.as_ref(),
            _ => None,
        }
    }

    /// 动物或装备卡的属性块；卡套返回 `None`。
    pub fn stats(&self) -> Option<&CardStats> {
        match &self.kind {
            CardKind::Animal { stats } | CardKind::Equipment { stats } => Some(stats),
            CardKind::Sleeve { .. } => None,
        }
    }
}

static SAMPLE_CATALOG: Lazy<Vec<CardDefinition>> = Lazy::new(build_sample_catalog);

/// 内置示例卡池，方便前端调试与模拟。
pub fn sample_catalog() -> &'static [CardDefinition] {
    &SAMPLE_CATALOG
}

fn build_sample_catalog() -> Vec<CardDefinition> {
    vec![
        CardDefinition::sleeve(
            "sleeve-ember",
            "Ember Sleeve",
            Some(CardStats::new().with_damage(2).with_health(2)),
            Some(CardStats::new().with_modifier(StatKind::Damage, 1)),
        )
        .with_description("Burns a little hotter than it looks."),
        CardDefinition::sleeve(
            "sleeve-bulwark",
            "Bulwark Sleeve",
            Some(CardStats::new().with_health(4)),
            Some(CardStats::new().with_special_effect(
                TriggerKind::IfSurvives,
                EffectAction::AddPersistentModifier {
                    stat: StatKind::Health,
                    amount: 1,
                },
            )),
        ),
        CardDefinition::sleeve(
            "sleeve-quicksilver",
            "Quicksilver Sleeve",
            None,
            Some(CardStats::new().with_initiative(2)),
        ),
        CardDefinition::animal(
            "animal-fox",
            "Fox",
            CardStats::new()
                .with_damage(4)
                .with_health(3)
                .with_initiative(2),
        ),
        CardDefinition::animal(
            "animal-bear",
            "Bear",
            CardStats::new().with_damage(6).with_health(8),
        ),
        CardDefinition::animal(
            "animal-owl",
            "Owl",
            CardStats::new()
                .with_damage(3)
                .with_health(4)
                .with_initiative(1)
                .with_special_effect(TriggerKind::OnPlay, EffectAction::DrawCards { count: 1 }),
        ),
        CardDefinition::equipment(
            "equipment-claws",
            "Iron Claws",
            CardStats::new().with_modifier(StatKind::Damage, 3),
        ),
        CardDefinition::equipment(
            "equipment-shell",
            "Turtle Shell",
            CardStats::new()
                .with_modifier(StatKind::Health, 4)
                .with_initiative(-1),
        ),
        CardDefinition::equipment(
            "equipment-banner",
            "War Banner",
            CardStats::new().with_special_effect(
                TriggerKind::IfDefeats,
                EffectAction::ModifyInitiative { amount: 1 },
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overwrites_defined_fields() {
        let mut acc = CardStats::new().with_damage(2).with_health(10);
        acc.merge(&CardStats::new().with_damage(7));

        assert_eq!(acc.damage, Some(7));
        assert_eq!(acc.health, Some(10), "absent health must not reset");
    }

    #[test]
    fn sleeve_round_trips_through_store_shape() {
        let json = r#"{
            "id": "s1",
            "name": "Plain Sleeve",
            "type": "sleeve",
            "imageUrl": "https://cdn.example/s1.png",
            "backgroundStats": { "damage": 2 },
            "foregroundStats": { "specialEffect": { "trigger": "ifDefeats", "effect": { "type": "drawCards", "count": 2 } } }
        }"#;

        let card: CardDefinition = serde_json::from_str(json).expect("sleeve should parse");
        assert_eq!(card.card_type(), CardType::Sleeve);
        assert_eq!(card.background_stats().and_then(|s| s.damage), Some(2));
        assert_eq!(
            card.foreground_stats().and_then(|s| s.special_effect),
            Some(SpecialEffect::new(
                TriggerKind::IfDefeats,
                EffectAction::DrawCards { count: 2 }
            ))
        );
        assert!(card.stats().is_none(), "sleeves have no single stats block");
    }

    #[test]
    fn absent_stats_are_not_serialized_as_zero() {
        let stats = CardStats::new().with_health(3);
        let json = serde_json::to_string(&stats).expect("stats should serialize");
        assert_eq!(json, r#"{"health":3}"#);
    }

    #[test]
    fn modifier_uses_type_key() {
        let modifier: StatModifier =
            serde_json::from_str(r#"{"type":"health","amount":-2}"#).expect("modifier should parse");
        assert_eq!(modifier, StatModifier::new(StatKind::Health, -2));
    }

    #[test]
    fn sample_catalog_has_every_slot() {
        let catalog = sample_catalog();
        for card_type in [CardType::Sleeve, CardType::Animal, CardType::Equipment] {
            assert!(
                catalog.iter().any(|card| card.card_type() == card_type),
                "catalog should contain a {card_type}"
            );
        }
    }
}

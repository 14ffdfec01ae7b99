//! 规则核心：属性分层、战斗结算、特效判定与积分计算。

pub mod cards;
pub mod combat;
pub mod effects;
pub mod elo;
pub mod round;
pub mod rules;
pub mod stats;

pub use cards::{
    sample_catalog,
    CardDefinition,
    CardId,
    CardKind,
    CardStats,
    CardType,
    EffectAction,
    PersistentModifier,
    PlayerId,
    SpecialEffect,
    StatKind,
    StatModifier,
    TriggerKind,
};
pub use combat::{
    resolve_combat,
    AttackOrder,
    CombatResult,
    CombatSide,
    Combatant,
    RoundOutcome,
    RoundResult,
};
pub use effects::{EffectEngine, TriggeredEffect};
pub use elo::{calculate_elo_change, EloChange, EloConfig, MatchResult};
pub use round::{play_round, preview_round, PlayerStanding, RoundEntry, RoundReport};
pub use rules::{GameRules, RuleError, ScoringScheme};
pub use stats::{
    collect_layers,
    resolve_breakdown,
    resolve_layers,
    resolve_stats,
    Composition,
    LayerSlot,
    ResolvedStats,
    StatBreakdown,
    StatLayer,
    StatSource,
};

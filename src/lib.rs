pub mod game;
pub mod sim;

use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    calculate_elo_change, collect_layers, play_round, preview_round, resolve_breakdown,
    resolve_combat, resolve_stats, sample_catalog, AttackOrder, CardDefinition, CardId, CardKind,
    CardStats, CardType, CombatResult, CombatSide, Combatant, Composition, EffectAction,
    EffectEngine, EloChange, EloConfig, GameRules, LayerSlot, MatchResult, PersistentModifier,
    PlayerId, PlayerStanding, ResolvedStats, RoundEntry, RoundOutcome, RoundReport, RoundResult,
    RuleError, ScoringScheme, SpecialEffect, StatBreakdown, StatKind, StatModifier, StatSource,
    TriggerKind, TriggeredEffect,
};
pub use sim::{SimulationDepth, TheorycraftConfig, TheorycraftReport, Theorycrafter};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    init_logging();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

/// Input for resolving one player's composed card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveStatsRequest {
    #[serde(default)]
    pub sleeve: Option<CardDefinition>,
    #[serde(default)]
    pub animal: Option<CardDefinition>,
    #[serde(default)]
    pub equipment: Vec<CardDefinition>,
    #[serde(default)]
    pub persistent_modifiers: Vec<PersistentModifier>,
    #[serde(default)]
    pub initiative_modifier: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<GameRules>,
}

impl ResolveStatsRequest {
    /// Same resolution path as a round, so `defaultInitiative` applies here too.
    fn resolve(&self, rules: &GameRules) -> ResolvedStats {
        resolve_breakdown(
            collect_layers(self.sleeve.as_ref(), self.animal.as_ref(), &self.equipment),
            &self.persistent_modifiers,
            self.initiative_modifier,
            rules.default_initiative,
        )
        .stats
    }
}

fn parse_match_result(result: &str) -> Result<MatchResult, JsValue> {
    serde_json::from_value(serde_json::Value::from(result)).map_err(serde_to_js_error)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatRequest {
    pub p1: Combatant,
    pub p2: Combatant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<GameRules>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRequest {
    pub p1: RoundEntry,
    pub p2: RoundEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheorycraftRequest {
    pub candidate: Composition,
    pub standing: PlayerStanding,
    /// Falls back to the built-in sample catalog when empty.
    #[serde(default)]
    pub pool: Vec<CardDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_equipment: Option<usize>,
}

/// 持有规则配置的结算引擎，供前端预览与服务端共用。
#[wasm_bindgen]
pub struct RulesEngine {
    rules: GameRules,
}

#[wasm_bindgen]
impl RulesEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(rules_json: Option<String>) -> Result<RulesEngine, JsValue> {
        let rules = match rules_json {
            Some(json) => GameRules::from_json(&json).map_err(to_js_error)?,
            None => GameRules::default(),
        };
        log::debug!("rules engine ready: {:?}", rules.scoring_scheme());
        Ok(RulesEngine { rules })
    }

    pub fn rules_json(&self) -> Result<String, JsValue> {
        to_json(&self.rules)
    }

    pub fn set_rules_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.rules = GameRules::from_json(json).map_err(to_js_error)?;
        Ok(())
    }

    pub fn resolve_stats_json(&self, request_json: &str) -> Result<String, JsValue> {
        let request: ResolveStatsRequest =
            serde_json::from_str(request_json).map_err(serde_to_js_error)?;
        let rules = request.rules.as_ref().unwrap_or(&self.rules);
        to_json(&request.resolve(rules))
    }

    pub fn resolve_combat_json(&self, request_json: &str) -> Result<String, JsValue> {
        let request: CombatRequest =
            serde_json::from_str(request_json).map_err(serde_to_js_error)?;
        let rules = request.rules.as_ref().unwrap_or(&self.rules);
        to_json(&resolve_combat(&request.p1, &request.p2, rules))
    }

    pub fn preview_round_json(&self, request_json: &str) -> Result<String, JsValue> {
        let request: RoundRequest =
            serde_json::from_str(request_json).map_err(serde_to_js_error)?;
        let report = preview_round(&request.p1, &request.p2, &self.rules).map_err(to_js_error)?;
        to_json(&report)
    }

    pub fn play_round_json(&self, request_json: &str) -> Result<String, JsValue> {
        let request: RoundRequest =
            serde_json::from_str(request_json).map_err(serde_to_js_error)?;
        let report = play_round(&request.p1, &request.p2, &self.rules).map_err(to_js_error)?;
        to_json(&report)
    }

    /// Elo update using this engine's K-factor settings.
    pub fn calculate_elo_change_json(
        &self,
        self_rating: i32,
        opponent_rating: i32,
        self_games_played: u32,
        result: &str,
    ) -> Result<String, JsValue> {
        let result = parse_match_result(result)?;
        let change =
            self.rules
                .elo
                .calculate(self_rating, opponent_rating, self_games_played, result);
        to_json(&change)
    }

    pub fn theorycraft(
        &self,
        request_json: String,
        depth: Option<String>,
        seed: Option<u64>,
        delay_ms: Option<u32>,
    ) -> Promise {
        let rules = self.rules.clone();
        let depth = depth
            .and_then(|value| SimulationDepth::from_str(&value).ok())
            .unwrap_or(SimulationDepth::Standard);
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let request: TheorycraftRequest =
                serde_json::from_str(&request_json).map_err(serde_to_js_error)?;
            let mut config = TheorycraftConfig::from_depth(depth);
            if let Some(max_equipment) = request.max_equipment {
                config = config.with_max_equipment(max_equipment);
            }
            let mut crafter = match seed {
                Some(seed) => Theorycrafter::with_seed(config, seed),
                None => Theorycrafter::new(config),
            };
            let pool = if request.pool.is_empty() {
                sample_catalog()
            } else {
                request.pool.as_slice()
            };
            let report = crafter
                .evaluate(&request.candidate, &request.standing, pool, &rules)
                .map_err(to_js_error)?;
            Ok(JsValue::from_str(&to_json(&report)?))
        })
    }
}

#[wasm_bindgen(js_name = "resolveStats")]
pub fn resolve_stats_js(request: JsValue) -> Result<JsValue, JsValue> {
    let request: ResolveStatsRequest = from_value(request).map_err(JsValue::from)?;
    let rules = request.rules.clone().unwrap_or_default();
    to_value(&request.resolve(&rules)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "resolveCombat")]
pub fn resolve_combat_js(request: JsValue) -> Result<JsValue, JsValue> {
    let request: CombatRequest = from_value(request).map_err(JsValue::from)?;
    let rules = request.rules.unwrap_or_default();
    to_value(&resolve_combat(&request.p1, &request.p2, &rules)).map_err(JsValue::from)
}

/// 判断特效是否触发；触发时原样返回效果描述，否则返回 `null`。
#[wasm_bindgen(js_name = "evaluateEffect")]
pub fn evaluate_effect(
    trigger: JsValue,
    effect: JsValue,
    outcome: JsValue,
) -> Result<JsValue, JsValue> {
    let trigger: TriggerKind = from_value(trigger).map_err(JsValue::from)?;
    let effect: EffectAction = from_value(effect).map_err(JsValue::from)?;
    let outcome: RoundOutcome = from_value(outcome).map_err(JsValue::from)?;
    to_value(&EffectEngine::evaluate(trigger, &effect, &outcome)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "calculateEloChange")]
pub fn calculate_elo_change_js(
    self_rating: i32,
    opponent_rating: i32,
    self_games_played: u32,
    result: &str,
) -> Result<JsValue, JsValue> {
    let result = parse_match_result(result)?;
    let change = calculate_elo_change(self_rating, opponent_rating, self_games_played, result);
    to_value(&change).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "createSampleCatalog")]
pub fn create_sample_catalog() -> Result<JsValue, JsValue> {
    to_value(sample_catalog()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "defaultGameRules")]
pub fn default_game_rules() -> Result<JsValue, JsValue> {
    to_value(&GameRules::default()).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

#[cfg(feature = "console_log")]
fn init_logging() {
    let _ = console_log::init_with_level(log::Level::Debug);
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}

//! Scoring rules
//!
//! A turn's base score is the outer wedge's points plus the inner wedge's
//! points. Rules are checked in order and each matching rule applies its effect
//! to the running turn score.

use serde::{Deserialize, Serialize};

use crate::sim::SpinResult;
use crate::wheel::WheelRole;

/// When a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleCondition {
    /// A given wedge landed on the given wheel
    #[serde(rename_all = "camelCase")]
    SpecificWedge { role: WheelRole, wedge_id: String },
    /// An exact outer/inner combination
    #[serde(rename_all = "camelCase")]
    WedgePair { outer_id: String, inner_id: String },
    /// Both wedges carry the same label
    MatchingLabels,
    /// The player's total including this turn so far reaches `value`
    ScoreThreshold { value: i64 },
}

/// What a fired rule does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum RuleEffect {
    AddPoints(i64),
    /// Scale the turn score, rounded to the nearest point
    Multiply(f64),
    /// Knock the player out of the rotation
    Eliminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    #[serde(default)]
    pub name: String,
    pub condition: RuleCondition,
    pub effect: RuleEffect,
}

impl ScoringRule {
    pub fn new(name: impl Into<String>, condition: RuleCondition, effect: RuleEffect) -> Self {
        Self {
            name: name.into(),
            condition,
            effect,
        }
    }
}

/// Outcome of scoring one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnScore {
    /// Wedge points before rules
    pub base: i64,
    /// Final points for the turn
    pub points: i64,
    pub eliminated: bool,
    /// Names of the rules that fired, in order
    pub applied: Vec<String>,
}

impl RuleCondition {
    fn matches(&self, result: &SpinResult, projected_total: i64) -> bool {
        match self {
            RuleCondition::SpecificWedge { role, wedge_id } => {
                let wedge = match role {
                    WheelRole::Outer => &result.outer_wedge,
                    WheelRole::Inner => &result.inner_wedge,
                };
                &wedge.id == wedge_id
            }
            RuleCondition::WedgePair { outer_id, inner_id } => {
                &result.outer_wedge.id == outer_id && &result.inner_wedge.id == inner_id
            }
            RuleCondition::MatchingLabels => result.outer_wedge.label == result.inner_wedge.label,
            RuleCondition::ScoreThreshold { value } => projected_total >= *value,
        }
    }
}

/// Score a spin for a player whose total before this turn is `current_total`
pub fn score_turn(result: &SpinResult, rules: &[ScoringRule], current_total: i64) -> TurnScore {
    let base = result
        .outer_wedge
        .score_value()
        .saturating_add(result.inner_wedge.score_value());
    let mut score = TurnScore {
        base,
        points: base,
        eliminated: false,
        applied: Vec::new(),
    };

    for rule in rules {
        if !rule.condition.matches(result, current_total.saturating_add(score.points)) {
            continue;
        }
        match rule.effect {
            RuleEffect::AddPoints(points) => score.points = score.points.saturating_add(points),
            RuleEffect::Multiply(factor) => {
                let scaled = (score.points as f64 * factor).round();
                if scaled.is_finite() {
                    score.points = scaled as i64;
                }
            }
            RuleEffect::Eliminate => score.eliminated = true,
        }
        score.applied.push(rule.name.clone());
    }

    score
}

//! Physical and mental condition of an agent.
//!
//! Fatigue, hunger, and stress each range over `0..=1000`. They rise as
//! time passes and fall while the agent performs tasks that relieve them.
//! The condition determines the agent's performance rating, which in turn
//! gates mission eligibility and scales the work an agent gets done.

use serde::{Deserialize, Serialize};

use crate::enums::TaskKind;

/// Upper bound of every condition level.
pub const MAX_LEVEL: f64 = 1000.0;

/// Fatigue gained per millisol awake.
const FATIGUE_RATE: f64 = 0.1;
/// Hunger gained per millisol.
const HUNGER_RATE: f64 = 0.15;
/// Stress gained per millisol.
const STRESS_RATE: f64 = 0.03;

/// Fatigue, hunger, and stress levels of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentCondition {
    /// Tiredness, `0..=1000`.
    fatigue: f64,
    /// Hunger, `0..=1000`.
    hunger: f64,
    /// Stress, `0..=1000`.
    stress: f64,
}

impl AgentCondition {
    /// Build a condition, clamping every level into `0..=1000`.
    pub fn new(fatigue: f64, hunger: f64, stress: f64) -> Self {
        Self {
            fatigue: clamp_level(fatigue),
            hunger: clamp_level(hunger),
            stress: clamp_level(stress),
        }
    }

    /// Current fatigue.
    pub const fn fatigue(&self) -> f64 {
        self.fatigue
    }

    /// Current hunger.
    pub const fn hunger(&self) -> f64 {
        self.hunger
    }

    /// Current stress.
    pub const fn stress(&self) -> f64 {
        self.stress
    }

    /// Performance rating in `[0, 1]`.
    ///
    /// A rested, fed, calm agent performs at 1.0. Fatigue above 600,
    /// hunger above 600, and stress above 500 each subtract a growing
    /// penalty.
    pub fn performance_rating(&self) -> f64 {
        let fatigue_penalty = ((self.fatigue - 600.0) / 400.0).clamp(0.0, 1.0) * 0.5;
        let hunger_penalty = ((self.hunger - 600.0) / 400.0).clamp(0.0, 1.0) * 0.3;
        let stress_penalty = ((self.stress - 500.0) / 500.0).clamp(0.0, 1.0) * 0.4;
        (1.0 - fatigue_penalty - hunger_penalty - stress_penalty).clamp(0.0, 1.0)
    }

    /// Let `millisols` of time pass.
    pub fn elapse(&mut self, millisols: f64) {
        let t = millisols.max(0.0);
        self.fatigue = clamp_level(self.fatigue + FATIGUE_RATE * t);
        self.hunger = clamp_level(self.hunger + HUNGER_RATE * t);
        self.stress = clamp_level(self.stress + STRESS_RATE * t);
    }

    /// Apply the effect of spending `millisols` on a task of `kind`.
    pub fn relieve(&mut self, kind: TaskKind, millisols: f64) {
        let t = millisols.max(0.0);
        let (fatigue, hunger, stress) = match kind {
            TaskKind::Sleep => (-1.2, 0.0, -0.2),
            TaskKind::EatMeal => (0.0, -8.0, -0.5),
            TaskKind::Relax => (-0.2, 0.0, -2.0),
            TaskKind::Walk => (0.05, 0.0, -0.8),
            TaskKind::Maintenance | TaskKind::Research => (0.05, 0.0, 0.1),
            TaskKind::TendGreenhouse => (0.05, 0.0, -0.1),
            TaskKind::MedicalCheckup => (0.0, 0.0, 0.05),
        };
        self.fatigue = clamp_level(self.fatigue + fatigue * t);
        self.hunger = clamp_level(self.hunger + hunger * t);
        self.stress = clamp_level(self.stress + stress * t);
    }
}

fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rested_agent_performs_fully() {
        let condition = AgentCondition::default();
        assert!((condition.performance_rating() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exhausted_agent_performs_poorly() {
        let condition = AgentCondition::new(1000.0, 900.0, 800.0);
        assert!(condition.performance_rating() < 0.5);
    }

    #[test]
    fn levels_are_clamped() {
        let condition = AgentCondition::new(-10.0, 5000.0, f64::NAN);
        assert!(condition.fatigue().abs() < f64::EPSILON);
        assert!((condition.hunger() - MAX_LEVEL).abs() < f64::EPSILON);
        assert!(condition.stress().abs() < f64::EPSILON);
    }

    #[test]
    fn time_raises_levels_and_sleep_lowers_fatigue() {
        let mut condition = AgentCondition::default();
        condition.elapse(1000.0);
        assert!((condition.fatigue() - 100.0).abs() < 1e-9);
        assert!((condition.hunger() - 150.0).abs() < 1e-9);

        condition.relieve(TaskKind::Sleep, 50.0);
        assert!((condition.fatigue() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn eating_relieves_hunger() {
        let mut condition = AgentCondition::new(0.0, 400.0, 0.0);
        condition.relieve(TaskKind::EatMeal, 30.0);
        assert!((condition.hunger() - 160.0).abs() < 1e-9);
    }
}

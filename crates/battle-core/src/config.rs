/// Battle configuration constants and tunable parameters.
///
/// Timing thresholds are in seconds, matching the wall clock the tick loop
/// advances. Every parameter has a default mirroring the shipped tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Input accuracy below this distance from a beat counts as Perfect.
    pub perfect_threshold: f32,
    /// Input accuracy below this distance (and above perfect) counts as Good.
    pub good_threshold: f32,
    /// Per-action-id cooldown preventing result mashing.
    pub cooldown_duration: f32,
    /// Trailing portion of a quick-time prompt that accepts input.
    pub input_window: f32,
    /// Beats a quick-time prompt spans from arm to resolution.
    pub qte_total_beats: u32,
    /// Fraction of incoming damage removed while the target is guarding.
    pub guard_damage_reduction: f32,
    /// Turns the guard stance persists after Defend is chosen.
    pub guard_turns: u32,
    /// Chance the AI deliberately avoids exploiting a known weakness.
    pub ai_weakness_avoid_chance: f32,
    /// Delay between target-cycling steps while a direction is held.
    pub scroll_delay: f32,
}

impl BattleConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PERFECT_THRESHOLD: f32 = 0.05;
    pub const DEFAULT_GOOD_THRESHOLD: f32 = 0.125;
    pub const DEFAULT_COOLDOWN_DURATION: f32 = 0.4;
    pub const DEFAULT_INPUT_WINDOW: f32 = 0.5;
    pub const DEFAULT_QTE_TOTAL_BEATS: u32 = 4;
    pub const DEFAULT_GUARD_DAMAGE_REDUCTION: f32 = 0.4;
    pub const DEFAULT_GUARD_TURNS: u32 = 1;
    pub const DEFAULT_AI_WEAKNESS_AVOID_CHANCE: f32 = 0.5;
    pub const DEFAULT_SCROLL_DELAY: f32 = 0.2;

    pub fn new() -> Self {
        Self {
            perfect_threshold: Self::DEFAULT_PERFECT_THRESHOLD,
            good_threshold: Self::DEFAULT_GOOD_THRESHOLD,
            cooldown_duration: Self::DEFAULT_COOLDOWN_DURATION,
            input_window: Self::DEFAULT_INPUT_WINDOW,
            qte_total_beats: Self::DEFAULT_QTE_TOTAL_BEATS,
            guard_damage_reduction: Self::DEFAULT_GUARD_DAMAGE_REDUCTION,
            guard_turns: Self::DEFAULT_GUARD_TURNS,
            ai_weakness_avoid_chance: Self::DEFAULT_AI_WEAKNESS_AVOID_CHANCE,
            scroll_delay: Self::DEFAULT_SCROLL_DELAY,
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

use std::path::PathBuf;

use crate::ai::Strength;

/// Rule toggles and start-up settings parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    /// Draw once the half-move clock reaches 100.
    pub fifty_move_rule: bool,
    /// Draw when the current position has occurred three times.
    pub threefold_repetition: bool,
    /// Draw when neither side can mate.
    pub insufficient_material: bool,
    /// Strength handed to the move chooser.
    pub ai_strength: Strength,
    /// Opening table (TSV or JSON) to load at start-up.
    pub openings_path: Option<PathBuf>,
}

impl RulesConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = RulesConfig::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };
        RulesConfig {
            fifty_move_rule: flag("CHESS_FIFTY_MOVE_RULE", defaults.fifty_move_rule),
            threefold_repetition: flag("CHESS_THREEFOLD_REPETITION", defaults.threefold_repetition),
            insufficient_material: flag(
                "CHESS_INSUFFICIENT_MATERIAL",
                defaults.insufficient_material,
            ),
            ai_strength: lookup("CHESS_AI_STRENGTH")
                .and_then(|v| v.trim().parse::<u16>().ok())
                .map(Strength::new)
                .unwrap_or(defaults.ai_strength),
            openings_path: lookup("CHESS_OPENINGS_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            fifty_move_rule: true,
            threefold_repetition: true,
            insufficient_material: true,
            ai_strength: Strength::default(),
            openings_path: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

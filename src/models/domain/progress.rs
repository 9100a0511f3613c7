use serde::{Deserialize, Serialize};

/// Per-user repetition configuration. Owned by user settings and constant
/// for the duration of a session; the runtime only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub struct ProgressSettings {
    /// How many correct answers a fresh question needs before it counts as
    /// mastered.
    pub initial_reoccurrences: u32,
    /// How many additional correct answers a wrong answer adds back.
    pub wrong_answer_reoccurrences: u32,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        ProgressSettings {
            initial_reoccurrences: 1,
            wrong_answer_reoccurrences: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_require_at_least_one_correct_answer() {
        let settings = ProgressSettings::default();
        assert!(settings.initial_reoccurrences >= 1);
    }
}

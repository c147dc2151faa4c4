use serde::{Deserialize, Serialize};

/// The fixed set of tags a star can carry. The wire form is the
/// SCREAMING_SNAKE_CASE value, which is also what the database stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    Crush,
    FirstLove,
    UnsentApology,
    LongDistance,
    SecretAdmirer,
    MovingOn,
    WhatIf,
    Gratitude,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Crush,
        Theme::FirstLove,
        Theme::UnsentApology,
        Theme::LongDistance,
        Theme::SecretAdmirer,
        Theme::MovingOn,
        Theme::WhatIf,
        Theme::Gratitude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Crush => "CRUSH",
            Theme::FirstLove => "FIRST_LOVE",
            Theme::UnsentApology => "UNSENT_APOLOGY",
            Theme::LongDistance => "LONG_DISTANCE",
            Theme::SecretAdmirer => "SECRET_ADMIRER",
            Theme::MovingOn => "MOVING_ON",
            Theme::WhatIf => "WHAT_IF",
            Theme::Gratitude => "GRATITUDE",
        }
    }

    /// Exact match on the stored tag; no case folding.
    pub fn parse(value: &str) -> Option<Theme> {
        Theme::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Crush => "💕 Crush",
            Theme::FirstLove => "🌸 First Love",
            Theme::UnsentApology => "🕊️ Unsent Apology",
            Theme::LongDistance => "🌍 Long Distance",
            Theme::SecretAdmirer => "🎭 Secret Admirer",
            Theme::MovingOn => "🦋 Moving On",
            Theme::WhatIf => "✨ What If",
            Theme::Gratitude => "💖 Gratitude",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Theme::Crush => "That person you can't stop thinking about",
            Theme::FirstLove => "The one who started it all",
            Theme::UnsentApology => "Words you wish you could say",
            Theme::LongDistance => "Miles apart, hearts together",
            Theme::SecretAdmirer => "Anonymous feelings from afar",
            Theme::MovingOn => "Letting go, growing forward",
            Theme::WhatIf => "The roads not taken",
            Theme::Gratitude => "Thank you for existing",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an identity hash is being rate limited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Post,
    React,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Post => "post",
            ActionCategory::React => "react",
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

use std::fmt;

pub const PERSONALITY_MAX_CHARS: usize = 1000;

pub const DEFAULT_PERSONALITY: &str = "You are a helpful assistant who answers all of the user's questions.\nAnswer concisely and clearly.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonalityError {
    Empty,
    TooLong { chars: usize },
}

impl fmt::Display for PersonalityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonalityError::Empty => write!(f, "Personality cannot be empty"),
            PersonalityError::TooLong { chars } => write!(
                f,
                "Personality is {chars} characters long; the limit is {PERSONALITY_MAX_CHARS}"
            ),
        }
    }
}

impl std::error::Error for PersonalityError {}

/// System instruction sent ahead of every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personality(String);

impl Personality {
    pub fn new(text: impl AsRef<str>) -> Result<Self, PersonalityError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PersonalityError::Empty);
        }
        let chars = trimmed.chars().count();
        if chars > PERSONALITY_MAX_CHARS {
            return Err(PersonalityError::TooLong { chars });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self(DEFAULT_PERSONALITY.to_string())
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

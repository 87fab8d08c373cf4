// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::dialog::Validator;
use crate::model::nicknames_equal;

pub const NICKNAME_MIN_CHARS: usize = 2;
pub const NICKNAME_MAX_CHARS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NicknameError {
    #[error("Please enter a nickname for your Pokemon!")]
    Empty,
    #[error("Nickname must be at least 2 characters long!")]
    TooShort,
    #[error("Nickname must be at most 12 characters long!")]
    TooLong,
    #[error("That nickname is already taken! Choose another one.")]
    Taken,
}

/// Nickname rules checked against a snapshot of the nicknames already in the
/// collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NicknameRules {
    taken: Vec<String>,
}

impl NicknameRules {
    pub fn new(taken: Vec<String>) -> Self {
        Self { taken }
    }

    /// Rules run in order and only the first failure is reported.
    pub fn validate(&self, candidate: &str) -> Result<(), NicknameError> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(NicknameError::Empty);
        }
        let chars = trimmed.chars().count();
        if chars < NICKNAME_MIN_CHARS {
            return Err(NicknameError::TooShort);
        }
        if chars > NICKNAME_MAX_CHARS {
            return Err(NicknameError::TooLong);
        }
        if self
            .taken
            .iter()
            .any(|existing| nicknames_equal(existing, trimmed))
        {
            return Err(NicknameError::Taken);
        }
        Ok(())
    }

    pub fn into_validator(self) -> Validator {
        Box::new(move |candidate: &str| self.validate(candidate).err().map(|e| e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{NicknameError, NicknameRules};

    fn rules() -> NicknameRules {
        NicknameRules::new(vec!["Sparky".to_owned(), "Blaze".to_owned()])
    }

    #[test]
    fn blank_candidates_are_empty() {
        assert_eq!(rules().validate(""), Err(NicknameError::Empty));
        assert_eq!(rules().validate("   \t"), Err(NicknameError::Empty));
    }

    #[test]
    fn length_bounds_use_trimmed_characters() {
        assert_eq!(rules().validate(" a "), Err(NicknameError::TooShort));
        assert_eq!(rules().validate("ab"), Ok(()));
        assert_eq!(rules().validate("abcdefghijkl"), Ok(()));
        assert_eq!(rules().validate("abcdefghijklm"), Err(NicknameError::TooLong));
        assert_eq!(rules().validate("  abcdefghijkl  "), Ok(()));
        assert_eq!(rules().validate("ピカチュウ"), Ok(()));
    }

    #[test]
    fn taken_check_is_case_insensitive() {
        assert_eq!(rules().validate("sparky"), Err(NicknameError::Taken));
        assert_eq!(rules().validate(" BLAZE "), Err(NicknameError::Taken));
        assert_eq!(rules().validate("Sparks"), Ok(()));
    }

    #[test]
    fn first_failing_rule_wins() {
        let rules = NicknameRules::new(vec!["a".to_owned()]);
        assert_eq!(rules.validate("a"), Err(NicknameError::TooShort));
    }

    #[test]
    fn validator_reports_rule_message() {
        let validate = rules().into_validator();
        assert_eq!(
            validate("x").as_deref(),
            Some("Nickname must be at least 2 characters long!")
        );
        assert_eq!(validate("Pika"), None);
    }

    #[test]
    fn validate_matches_rule_predicate_for_sampled_candidates() {
        let rules = rules();
        let candidates = [
            "", " ", "a", "ab", " ab ", "sparky", "SPARKY ", "abcdefghijkl", "abcdefghijklm",
            "Blaze", "blazer",
        ];
        for candidate in candidates {
            let trimmed = candidate.trim();
            let len = trimmed.chars().count();
            let expected_error = trimmed.is_empty()
                || len < 2
                || len > 12
                || ["Sparky", "Blaze"]
                    .iter()
                    .any(|taken| taken.to_lowercase() == trimmed.to_lowercase());
            assert_eq!(
                rules.validate(candidate).is_err(),
                expected_error,
                "candidate {candidate:?}"
            );
        }
    }
}

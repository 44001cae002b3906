/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when creating a validated patient age.
#[derive(Debug, thiserror::Error)]
pub enum AgeError {
    #[error("Age must be between 0 and 150")]
    OutOfRange,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A patient age bounded to the plausible human range 0..=150.
///
/// Stored as the validated number of whole years. Serialises as a plain
/// integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u8);

impl Age {
    /// Upper bound on a plausible patient age, in years.
    pub const MAX_YEARS: i64 = 150;

    /// Creates a new `Age` from a number of whole years.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Age)` if the value lies in 0..=150, or
    /// `Err(AgeError::OutOfRange)` otherwise.
    pub fn new(years: i64) -> Result<Self, AgeError> {
        if !(0..=Self::MAX_YEARS).contains(&years) {
            return Err(AgeError::OutOfRange);
        }
        Ok(Self(years as u8))
    }

    /// Returns the age in whole years.
    pub fn years(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Age {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Age {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let years = i64::deserialize(deserializer)?;
        Age::new(years).map_err(serde::de::Error::custom)
    }
}

/// A patient clinical-history number.
///
/// The history number is the cross-referral uniqueness key, so it is trimmed
/// on construction to keep the key stable regardless of surrounding
/// whitespace in the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryNumber(String);

impl HistoryNumber {
    /// Creates a new `HistoryNumber` from the given input.
    ///
    /// # Returns
    ///
    /// Returns `Ok(HistoryNumber)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` otherwise.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HistoryNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for HistoryNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for HistoryNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for HistoryNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HistoryNumber::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  dyspnoea on exertion  ").expect("valid text");
        assert_eq!(text.as_str(), "dyspnoea on exertion");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
    }

    #[test]
    fn age_accepts_boundary_values() {
        assert_eq!(Age::new(0).expect("newborn").years(), 0);
        assert_eq!(Age::new(150).expect("upper bound").years(), 150);
    }

    #[test]
    fn age_rejects_out_of_range_values() {
        assert!(matches!(Age::new(-1), Err(AgeError::OutOfRange)));
        assert!(matches!(Age::new(151), Err(AgeError::OutOfRange)));
    }

    #[test]
    fn age_deserialisation_applies_range_check() {
        let err = serde_json::from_str::<Age>("200").expect_err("out of range");
        assert!(err.to_string().contains("between 0 and 150"));
        let age: Age = serde_json::from_str("62").expect("in range");
        assert_eq!(age.years(), 62);
    }

    #[test]
    fn history_number_trims_and_rejects_empty() {
        let number = HistoryNumber::new(" HC-1001 ").expect("valid number");
        assert_eq!(number.as_str(), "HC-1001");
        assert!(matches!(HistoryNumber::new("  "), Err(TextError::Empty)));
    }
}

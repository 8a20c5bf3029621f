//! Email verification code type.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long a verification code stays valid after issuance.
pub const CODE_VALIDITY: std::time::Duration = std::time::Duration::from_secs(10 * 60);

/// Errors that can occur when parsing a [`VerificationCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CodeError {
    /// The input is not exactly six ASCII digits.
    #[error("verification code must be exactly 6 digits")]
    NotSixDigits,
}

/// A 6-digit email verification code.
///
/// Codes are zero-padded decimal strings (`"000000"` through `"999999"`),
/// drawn uniformly from the full range so that leading zeros carry the same
/// probability mass as any other digit.
///
/// ## Examples
///
/// ```
/// use teslaverse_core::VerificationCode;
///
/// let code = VerificationCode::generate();
/// assert_eq!(code.as_str().len(), 6);
///
/// assert!(VerificationCode::parse("042917").is_ok());
/// assert!(VerificationCode::parse("12345").is_err());   // too short
/// assert!(VerificationCode::parse("12345a").is_err());  // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Number of digits in a code.
    pub const LENGTH: usize = 6;

    /// Generate a fresh random code.
    ///
    /// Uniform over `000000..=999999`; unpredictability per issuance is all
    /// that matters, uniqueness across accounts is not required.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let n: u32 = rand::rng().random_range(0..1_000_000);
        Self(format!("{n:06}"))
    }

    /// Parse a code from user input.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::NotSixDigits`] unless the trimmed input is
    /// exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let s = s.trim();
        if s.len() != Self::LENGTH || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(CodeError::NotSixDigits);
        }
        Ok(Self(s.to_owned()))
    }

    /// Compute the expiry instant for a code issued at `now`.
    #[must_use]
    pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
        now + CODE_VALIDITY
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for VerificationCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for VerificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for VerificationCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for VerificationCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for VerificationCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_format() {
        for _ in 0..100 {
            let code = VerificationCode::generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_preserves_leading_zeros() {
        // Parsing back as a number and re-padding must give the same string
        for _ in 0..100 {
            let code = VerificationCode::generate();
            let n: u32 = code.as_str().parse().unwrap();
            assert_eq!(format!("{n:06}"), code.as_str());
        }
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(
            VerificationCode::parse("000000").unwrap().as_str(),
            "000000"
        );
        assert_eq!(
            VerificationCode::parse(" 123456 ").unwrap().as_str(),
            "123456"
        );
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(VerificationCode::parse("12345").is_err());
        assert!(VerificationCode::parse("1234567").is_err());
        assert!(VerificationCode::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(VerificationCode::parse("12345a").is_err());
        assert!(VerificationCode::parse("12 456").is_err());
        assert!(VerificationCode::parse("½23456").is_err());
    }

    #[test]
    fn test_expiry_is_ten_minutes_out() {
        let now = Utc::now();
        let expiry = VerificationCode::expiry_from(now);
        assert_eq!((expiry - now).num_seconds(), 600);
    }

    #[test]
    fn test_serde_roundtrip() {
        let code = VerificationCode::parse("042917").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"042917\"");
        let parsed: VerificationCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, code);
    }
}

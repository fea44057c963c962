//! Validated identifiers naming the resource a gate throttles.

// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Resource identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Resource identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Resource identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Name of a throttled upstream resource, used to label spans and metrics.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);
impl ResourceId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Identifier assigned to gates that were not explicitly named.
	pub fn unnamed() -> Self {
		Self("default".into())
	}
}
impl Default for ResourceId {
	fn default() -> Self {
		Self::unnamed()
	}
}
impl AsRef<str> for ResourceId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ResourceId> for String {
	fn from(value: ResourceId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ResourceId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ResourceId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Resource({})", self.0)
	}
}
impl Display for ResourceId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ResourceId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn identifiers_reject_whitespace_and_empty() {
		assert_eq!(ResourceId::new(""), Err(IdentifierError::Empty));
		assert_eq!(ResourceId::new(" gemini"), Err(IdentifierError::ContainsWhitespace));
		assert_eq!(
			ResourceId::new(format!("gemini{}flash", '\u{00A0}')),
			Err(IdentifierError::ContainsWhitespace)
		);

		let id = ResourceId::new("gemini-flash").expect("Resource fixture should be valid.");

		assert_eq!(id.as_ref(), "gemini-flash");
		assert_eq!(format!("{id:?}"), "Resource(gemini-flash)");
	}

	#[test]
	fn length_limit_is_inclusive() {
		ResourceId::new("a".repeat(IDENTIFIER_MAX_LEN)).expect("Exact length should succeed.");

		assert_eq!(
			ResourceId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN })
		);
	}

	#[test]
	fn serde_enforces_validation() {
		let id: ResourceId = serde_json::from_str("\"openai-chat\"")
			.expect("Resource identifier should deserialize successfully.");

		assert_eq!(id.as_ref(), "openai-chat");
		assert!(serde_json::from_str::<ResourceId>("\"with space\"").is_err());
		assert_eq!(ResourceId::default().as_ref(), "default");
	}

	#[test]
	fn identifier_errors_convert_into_crate_errors() {
		fn parse(raw: &str) -> Result<ResourceId> {
			Ok(raw.parse::<ResourceId>()?)
		}

		assert!(parse("openai").is_ok());
		assert!(matches!(
			parse("open ai"),
			Err(Error::Identifier(IdentifierError::ContainsWhitespace))
		));
	}
}

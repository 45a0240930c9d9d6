use serde::{Deserialize, Serialize};

/// Ordered tuple of tokens preceding a target.
///
/// Two contexts are equal iff their tokens are equal in order. A full context
/// has `n - 1` tokens; shorter ones only arise from caller queries.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Context(Vec<String>);

impl Context {
	/// Builds a context holding all of `tokens`.
	pub fn new<S: AsRef<str>>(tokens: &[S]) -> Self {
		Self(tokens.iter().map(|t| t.as_ref().to_owned()).collect())
	}

	/// Builds a context from the last `len` tokens.
	///
	/// If `tokens` is shorter than `len`, it is used as-is.
	pub fn trailing<S: AsRef<str>>(tokens: &[S], len: usize) -> Self {
		let start = tokens.len().saturating_sub(len);
		Self::new(&tokens[start..])
	}

	/// The context tokens, oldest first.
	pub fn tokens(&self) -> &[String] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn trailing_keeps_last_tokens() {
		let ctx = Context::trailing(&["a", "b", "c", "d"], 2);
		assert_eq!(ctx.tokens(), ["c", "d"]);
	}

	#[test]
	fn trailing_keeps_short_context_as_is() {
		let ctx = Context::trailing(&["a"], 3);
		assert_eq!(ctx, Context::new(&["a"]));
	}

	#[test]
	fn zero_length_is_empty() {
		assert!(Context::trailing(&["a", "b"], 0).is_empty());
	}

	#[test]
	fn order_matters() {
		assert_ne!(Context::new(&["a", "b"]), Context::new(&["b", "a"]));
	}
}

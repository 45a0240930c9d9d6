use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Count row for a single context.
///
/// A `State` holds every target observed after one context, together with
/// the cached sum of those counts. Keeping the total in the same value as
/// the row means the two can only change together.
///
/// ## Invariants
/// - Each target count is strictly positive
/// - `total` equals the sum of all target counts
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct State {
	/// Sum of all target counts.
	total: u64,
	/// Occurrences of each target after this context.
	/// Example: { "cat" => 42, "dog" => 3 }
	targets: HashMap<String, u64>,
}

impl State {
	/// Creates a new empty row.
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `target`.
	pub(crate) fn add_transition(&mut self, target: &str) {
		match self.targets.get_mut(target) {
			Some(count) => *count += 1,
			None => {
				self.targets.insert(target.to_owned(), 1);
			}
		}
		self.total += 1;
	}

	/// Occurrences of `target`, 0 if never seen.
	pub(crate) fn count(&self, target: &str) -> u64 {
		self.targets.get(target).copied().unwrap_or(0)
	}

	/// Sum of all target counts.
	pub(crate) fn total(&self) -> u64 {
		self.total
	}

	/// Every (target, count) pair of the row.
	pub(crate) fn targets(&self) -> impl Iterator<Item = (&str, u64)> {
		self.targets.iter().map(|(target, count)| (target.as_str(), *count))
	}

	/// Number of distinct targets.
	pub(crate) fn len(&self) -> usize {
		self.targets.len()
	}

	/// Adds another row's counts to this one, cell by cell.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (target, count) in &other.targets {
			*self.targets.entry(target.clone()).or_insert(0) += *count;
		}
		self.total += other.total;
	}

	#[cfg(test)]
	pub(crate) fn is_consistent(&self) -> bool {
		self.targets.values().all(|c| *c > 0) && self.targets.values().sum::<u64>() == self.total
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_and_total_move_together() {
		let mut state = State::new();
		state.add_transition("b");
		state.add_transition("b");
		state.add_transition("c");
		assert_eq!(state.count("b"), 2);
		assert_eq!(state.count("c"), 1);
		assert_eq!(state.count("z"), 0);
		assert_eq!(state.total(), 3);
		assert_eq!(state.len(), 2);
		assert!(state.is_consistent());
	}

	#[test]
	fn merge_sums_cells() {
		let mut left = State::new();
		left.add_transition("a");
		let mut right = State::new();
		right.add_transition("a");
		right.add_transition("b");
		left.merge(&right);
		assert_eq!(left.count("a"), 2);
		assert_eq!(left.count("b"), 1);
		assert_eq!(left.total(), 3);
		assert!(left.is_consistent());
	}
}

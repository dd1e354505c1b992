//! Running per-key rating aggregation.

// self
use crate::{
	_prelude::*,
	error::ValidationError,
	obs::{self, Op, OpOutcome},
};

/// Running totals for one key.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RatingRecord {
	/// Number of contributions.
	pub count: u64,
	/// Sum of all contributed values.
	pub sum: f64,
}
impl RatingRecord {
	/// Folds `value` into the totals and returns the resulting summary.
	pub fn apply(&mut self, value: f64) -> RatingSummary {
		self.count += 1;
		self.sum += value;

		RatingSummary { count: self.count, average: self.sum / self.count as f64 }
	}

	/// Average of the contributions, defined only once something was contributed.
	pub fn average(&self) -> Option<f64> {
		(self.count > 0).then(|| self.sum / self.count as f64)
	}
}

/// Count and average observed atomically right after a contribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingSummary {
	/// Contributions so far, including the one that produced this summary.
	pub count: u64,
	/// Average over those contributions.
	pub average: f64,
}

/// Thread-safe aggregator keeping `(count, sum)` per key.
///
/// The increment and the read of the new totals happen inside one critical section, so no
/// contribution is ever lost or observed half-applied.
#[derive(Debug, Default)]
pub struct RatingAggregator(Mutex<HashMap<String, RatingRecord>>);
impl RatingAggregator {
	/// Adds `value` to `key`'s totals and returns the updated summary.
	pub fn contribute(&self, key: &str, value: f64) -> Result<RatingSummary, ValidationError> {
		const OP: Op = Op::RatingContribute;

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		if !value.is_finite() {
			obs::record_op_outcome(OP, OpOutcome::Failure);

			return Err(ValidationError::NonFiniteRating);
		}

		let summary = {
			let mut guard = self.0.lock();

			// Only a key's first contribution allocates.
			match guard.get_mut(key) {
				Some(record) => record.apply(value),
				None => guard.entry(key.to_owned()).or_default().apply(value),
			}
		};

		obs::record_op_outcome(OP, OpOutcome::Success);

		Ok(summary)
	}

	/// Current summary for `key`, if anything was contributed.
	pub fn summary(&self, key: &str) -> Option<RatingSummary> {
		let record = *self.0.lock().get(key)?;

		record.average().map(|average| RatingSummary { count: record.count, average })
	}

	/// Number of keys with at least one contribution.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns true if nothing was contributed yet.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// self
	use super::*;

	#[test]
	fn first_contribution_initializes_the_key() {
		let ratings = RatingAggregator::default();

		assert!(ratings.summary("laptop-1").is_none());

		let summary =
			ratings.contribute("laptop-1", 4.0).expect("Finite rating should be accepted.");

		assert_eq!(summary, RatingSummary { count: 1, average: 4.0 });

		let summary =
			ratings.contribute("laptop-1", 2.0).expect("Finite rating should be accepted.");

		assert_eq!(summary, RatingSummary { count: 2, average: 3.0 });
		assert_eq!(ratings.summary("laptop-1"), Some(summary));
		assert_eq!(ratings.len(), 1);
	}

	#[test]
	fn record_apply_tracks_count_and_average() {
		let mut record = RatingRecord::default();

		assert_eq!(record.average(), None);
		assert_eq!(record.apply(3.0), RatingSummary { count: 1, average: 3.0 });
		assert_eq!(record.apply(-1.0), RatingSummary { count: 2, average: 1.0 });
		assert_eq!(record, RatingRecord { count: 2, sum: 2.0 });
	}

	#[test]
	fn keys_are_independent() {
		let ratings = RatingAggregator::default();

		ratings.contribute("a", 5.0).expect("Finite rating should be accepted.");
		ratings.contribute("b", 1.0).expect("Finite rating should be accepted.");

		assert_eq!(ratings.summary("a"), Some(RatingSummary { count: 1, average: 5.0 }));
		assert_eq!(ratings.summary("b"), Some(RatingSummary { count: 1, average: 1.0 }));
	}

	#[test]
	fn non_finite_values_are_rejected_without_creating_a_record() {
		let ratings = RatingAggregator::default();

		assert_eq!(ratings.contribute("a", f64::NAN), Err(ValidationError::NonFiniteRating));
		assert_eq!(ratings.contribute("a", f64::INFINITY), Err(ValidationError::NonFiniteRating));
		assert!(ratings.is_empty());
	}

	#[test]
	fn threads_never_lose_updates() {
		const THREADS: u64 = 8;
		const PER_THREAD: u64 = 500;

		let ratings = Arc::new(RatingAggregator::default());
		let handles = (0..THREADS)
			.map(|_| {
				let ratings = ratings.clone();

				thread::spawn(move || {
					for _ in 0..PER_THREAD {
						ratings
							.contribute("laptop-1", 5.0)
							.expect("Finite rating should be accepted.");
					}
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			handle.join().expect("Rating thread should not panic.");
		}

		assert_eq!(
			ratings.summary("laptop-1"),
			Some(RatingSummary { count: THREADS * PER_THREAD, average: 5.0 })
		);
	}
}

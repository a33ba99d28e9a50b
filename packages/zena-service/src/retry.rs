use std::{fmt::Display, future::Future, time::Duration};

use rand::Rng;

/// Bounded retry with exponential backoff and uniform jitter.
///
/// After failed attempt `k` (1-based) of `retries`, the policy waits `backoff^k + U(0, jitter)`
/// seconds on the async timer before trying again. The error of the last attempt is returned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
	pub retries: u32,
	pub backoff: f64,
	pub jitter: f64,
}
impl RetryPolicy {
	pub fn new(retries: u32, backoff: f64, jitter: f64) -> Self {
		Self { retries: retries.max(1), backoff, jitter }
	}

	pub fn from_config(cfg: &zena_config::Retry) -> Self {
		Self::new(cfg.retries, cfg.backoff, cfg.jitter)
	}

	pub async fn execute<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: Display,
	{
		let mut attempt = 1;

		loop {
			match op().await {
				Ok(value) => return Ok(value),
				Err(err) if attempt < self.retries => {
					let delay = self.delay_for_attempt(attempt);

					tracing::warn!(
						operation = label,
						attempt,
						retries = self.retries,
						delay_ms = delay.as_millis() as u64,
						error = %err,
						"Operation failed. Retrying."
					);
					tokio::time::sleep(delay).await;

					attempt += 1;
				},
				Err(err) => {
					tracing::error!(
						operation = label,
						attempts = attempt,
						error = %err,
						"Operation failed after all retries."
					);

					return Err(err);
				},
			}
		}
	}

	/// Saturates at [`Duration::MAX`] once `backoff^attempt` leaves the representable range.
	pub fn base_delay(&self, attempt: u32) -> Duration {
		let secs = self.backoff.powi(attempt.min(i32::MAX as u32) as i32).max(0.0);

		Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
	}

	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let jitter =
			if self.jitter > 0.0 { rand::thread_rng().gen_range(0.0..self.jitter) } else { 0.0 };

		self.base_delay(attempt).saturating_add(Duration::from_secs_f64(jitter))
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(3, 2.0, 1.0)
	}
}

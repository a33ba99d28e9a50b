use std::sync::Mutex;

use tokio::time::{Duration, Instant};

use zena_service::RetryPolicy;

#[tokio::test(start_paused = true)]
async fn third_attempt_succeeds_after_two_bounded_sleeps() {
	let policy = RetryPolicy::new(3, 2.0, 1.0);
	let attempts = Mutex::new(Vec::new());
	let result = policy
		.execute("flaky", || {
			let attempt = {
				let mut attempts = attempts.lock().expect("Attempt log poisoned.");

				attempts.push(Instant::now());

				attempts.len()
			};

			async move {
				if attempt < 3 { Err(format!("attempt {attempt} failed")) } else { Ok(attempt) }
			}
		})
		.await;

	assert_eq!(result, Ok(3));

	let attempts = attempts.into_inner().expect("Attempt log poisoned.");

	assert_eq!(attempts.len(), 3);

	for (k, pair) in attempts.windows(2).enumerate() {
		let waited = pair[1] - pair[0];
		let base = Duration::from_secs_f64(2_f64.powi(k as i32 + 1));

		assert!(waited >= base, "Sleep {k} lasted {waited:?}, shorter than {base:?}.");
		assert!(waited < base + Duration::from_secs(1), "Sleep {k} lasted {waited:?}.");
	}
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_the_last_error() {
	let policy = RetryPolicy::new(3, 0.5, 0.0);
	let calls = Mutex::new(0);
	let result: Result<(), String> = policy
		.execute("always_failing", || {
			let call = {
				let mut calls = calls.lock().expect("Call counter poisoned.");

				*calls += 1;
				*calls
			};

			async move { Err(format!("failure {call}")) }
		})
		.await;

	assert_eq!(result, Err("failure 3".to_string()));
	assert_eq!(calls.into_inner().expect("Call counter poisoned."), 3);
}

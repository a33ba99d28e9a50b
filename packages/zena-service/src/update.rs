use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Error, LinkRebuildRequest, RebuildRequest, Result, ZenaService};
use zena_domain::EntityKind;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateRequest {
	pub entity: EntityKind,
	pub channel_id: i64,
	/// Explicit confirmation. Nothing runs unless it is `true`.
	#[serde(default)]
	pub update: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStep {
	Faq,
	Services,
	Links,
	Products,
}
impl UpdateStep {
	/// Steps run in order for an update of `entity`.
	pub fn plan(entity: EntityKind) -> &'static [Self] {
		match entity {
			EntityKind::Faq => &[Self::Faq],
			EntityKind::Services => &[Self::Services, Self::Links, Self::Products],
			EntityKind::Products => &[Self::Links, Self::Products],
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepTiming {
	pub step: UpdateStep,
	pub succeeded: bool,
	pub elapsed_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateResponse {
	pub success: bool,
	pub steps: Vec<StepTiming>,
	pub failed_step: Option<UpdateStep>,
}

impl ZenaService {
	/// Refreshes the collections that depend on `entity`, stopping at the first failing step.
	///
	/// Entity collections are shared by every channel and are rebuilt whole. Only the link step
	/// and its lookup collection are scoped to `channel_id`.
	pub async fn update(&self, req: UpdateRequest) -> Result<UpdateResponse> {
		if !req.update {
			return Err(Error::InvalidRequest {
				message: "Set update=true to confirm the rebuild.".to_string(),
			});
		}
		if req.channel_id <= 0 {
			return Err(Error::InvalidRequest {
				message: format!("channel_id must be positive, got {}.", req.channel_id),
			});
		}
		if !self.source.channel_exists(req.channel_id).await? {
			return Err(Error::NotFound { message: format!("Unknown channel {}.", req.channel_id) });
		}

		let mut steps = Vec::new();

		for step in UpdateStep::plan(req.entity).iter().copied() {
			let started = Instant::now();
			let succeeded = self.run_step(step, req.channel_id).await;
			let elapsed_ms = started.elapsed().as_millis() as u64;

			tracing::info!(
				channel_id = req.channel_id,
				?step,
				succeeded,
				elapsed_ms,
				"Update step finished."
			);
			steps.push(StepTiming { step, succeeded, elapsed_ms });

			if !succeeded {
				return Ok(UpdateResponse { success: false, steps, failed_step: Some(step) });
			}
		}

		Ok(UpdateResponse { success: true, steps, failed_step: None })
	}

	async fn run_step(&self, step: UpdateStep, channel_id: i64) -> bool {
		let rebuild = |entity| RebuildRequest { entity, collection: None, channel_id: None };
		let result = match step {
			UpdateStep::Faq =>
				self.rebuild(rebuild(EntityKind::Faq)).await.map(|report| report.succeeded()),
			UpdateStep::Services =>
				self.rebuild(rebuild(EntityKind::Services)).await.map(|report| report.succeeded()),
			UpdateStep::Products =>
				self.rebuild(rebuild(EntityKind::Products)).await.map(|report| report.succeeded()),
			UpdateStep::Links => self
				.rebuild_links(LinkRebuildRequest::new(channel_id))
				.await
				.map(|report| report.succeeded),
		};

		result.unwrap_or_else(|err| {
			tracing::error!(channel_id, ?step, error = %err, "Update step failed.");

			false
		})
	}
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use zena_domain::EntityKind;
use zena_service::{
	FilterCriteria, LinkRebuildRequest, RebuildRequest, SearchMode, SearchRequest, UpdateRequest,
	ZenaService,
};
use zena_storage::{db::Db, qdrant::QdrantStore};

#[derive(Debug, Parser)]
#[command(
	version = zena_cli::VERSION,
	rename_all = "kebab",
	styles = zena_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Recreate one entity collection from Postgres.
	Rebuild {
		#[arg(long, value_enum)]
		entity: Entity,
		#[arg(long, value_name = "ID")]
		channel_id: Option<i64>,
		/// Write into this collection instead of the configured one.
		#[arg(long, value_name = "NAME")]
		collection: Option<String>,
	},
	/// Recompute the product-service links of one channel.
	Links {
		#[arg(long, value_name = "ID")]
		channel_id: i64,
		#[arg(long, value_name = "N")]
		max_parallel: Option<usize>,
		#[arg(long)]
		skip_lookup_refresh: bool,
	},
	/// Refresh every collection that depends on an entity for one channel.
	Update {
		#[arg(long, value_enum)]
		entity: Entity,
		#[arg(long, value_name = "ID")]
		channel_id: i64,
		/// Confirms the rebuild.
		#[arg(long)]
		update: bool,
	},
	/// Query a collection.
	Search {
		#[arg(long, value_enum)]
		entity: Entity,
		#[arg(long, short = 'q', value_name = "TEXT")]
		query: Option<String>,
		#[arg(long, value_name = "ID")]
		channel_id: Option<i64>,
		#[arg(long = "indication", value_name = "TERM")]
		indications: Vec<String>,
		#[arg(long = "contraindication", value_name = "TERM")]
		contraindications: Vec<String>,
		#[arg(long = "body-part", value_name = "TERM")]
		body_parts: Vec<String>,
		#[arg(long = "product-type", value_name = "TERM")]
		product_types: Vec<String>,
		/// Treat indications as alternatives instead of requirements.
		#[arg(long)]
		any_indication: bool,
		/// Dense-only nearest neighbours instead of hybrid retrieval.
		#[arg(long)]
		dense: bool,
		#[arg(long, value_name = "N")]
		limit: Option<u32>,
		#[arg(long, value_name = "NAME")]
		collection: Option<String>,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Entity {
	Faq,
	Services,
	Products,
}
impl From<Entity> for EntityKind {
	fn from(entity: Entity) -> Self {
		match entity {
			Entity::Faq => Self::Faq,
			Entity::Services => Self::Services,
			Entity::Products => Self::Products,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = zena_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
	tracing::debug!(config = %args.config.display(), command = ?args.command, "Configuration loaded.");

	let db = Db::connect(&config.storage.postgres).await?;
	let qdrant = QdrantStore::new(&config.storage.qdrant)?;
	let service = ZenaService::new(config, db, qdrant)?;

	match args.command {
		Command::Rebuild { entity, channel_id, collection } => {
			let report = service
				.rebuild(RebuildRequest { entity: entity.into(), collection, channel_id })
				.await?;

			print_json(&report)?;

			if !report.succeeded() {
				return Err(eyre::eyre!("Rebuild finished with outcome {:?}.", report.outcome));
			}
		},
		Command::Links { channel_id, max_parallel, skip_lookup_refresh } => {
			let report = service
				.rebuild_links(LinkRebuildRequest {
					channel_id,
					max_parallel,
					refresh_lookup: !skip_lookup_refresh,
				})
				.await?;

			print_json(&report)?;

			if !report.succeeded {
				return Err(eyre::eyre!("Link rebuild failed for channel {channel_id}."));
			}
		},
		Command::Update { entity, channel_id, update } => {
			let response =
				service.update(UpdateRequest { entity: entity.into(), channel_id, update }).await?;

			print_json(&response)?;

			if let Some(step) = response.failed_step {
				return Err(eyre::eyre!("Update stopped at step {step:?}."));
			}
		},
		Command::Search {
			entity,
			query,
			channel_id,
			indications,
			contraindications,
			body_parts,
			product_types,
			any_indication,
			dense,
			limit,
			collection,
		} => {
			let filter = FilterCriteria {
				channel_id,
				indications,
				contraindications,
				body_parts,
				product_type: product_types,
				use_should: any_indication,
			};
			let mode = if dense { SearchMode::Dense } else { SearchMode::Hybrid };
			let response = service
				.search(SearchRequest {
					entity: entity.into(),
					collection,
					query,
					filter,
					mode,
					limit,
				})
				.await?;

			print_json(&response)?;
		},
	}

	Ok(())
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}

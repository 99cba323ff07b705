use chrono::{NaiveDate, Utc};

mod error;
mod ioutil;
mod fetch;
mod progress;
pub mod config;
mod names;
pub mod normalize;
pub mod resolve;
pub mod merge;
mod timeseries;
pub mod cases;
pub mod geometry;
pub mod popctrs;
pub mod interventions;
pub mod tagger;
pub mod workbook;
pub mod sources;
pub mod pipeline;

pub use error::{Error, Result};
pub use ioutil::{magic_open, write_atomic};
pub use fetch::{fetch, is_remote, open_source};
pub use progress::*;
pub use config::PipelineConfig;
pub use names::*;
pub use timeseries::*;


pub fn naive_today() -> NaiveDate {
	Utc::today().naive_local()
}

pub fn init_stage() -> Result<PipelineConfig> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	PipelineConfig::from_env()
}


pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
	Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
}

// None unless exactly one argument follows the program name
pub fn date_from_args<I: IntoIterator<Item = String>>(args: I) -> Option<Result<NaiveDate>> {
	let args: Vec<String> = args.into_iter().skip(1).collect();
	match &args[..] {
		[date] => Some(parse_date_arg(date)),
		_ => None,
	}
}

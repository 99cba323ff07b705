use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Weekday};

use log::debug;

use serde::Deserialize;

use super::error::{Error, Result};
use super::geometry::GeometrySchema;
use super::interventions::{SeverityLevel, SeverityScale};
use super::merge::DiagnosticPolicy;
use super::names::{CanonicalKey, JurisdictionAliases};
use super::normalize::{Normalizers, RuleSetSpec};
use super::resolve::{AmbiguitySpec, AmbiguityTable};
use super::tagger::{KeywordDictionary, KeywordTagger};


pub const CONFIG_ENV: &'static str = "COVIDTIMELINE_CONFIG";
pub const DEFAULT_CONFIG: &'static str = "config/pipeline.json";

pub const CASES: &'static str = "cases";
pub const BOUNDARIES: &'static str = "boundaries";
pub const ONTARIO_PHU: &'static str = "ontario_phu";


#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
	pub case_source: String,
	pub daily_cases: PathBuf,
	pub weekly_cases: PathBuf,
	pub boundaries: PathBuf,
	pub merged_regions: PathBuf,
	pub centres: PathBuf,
	pub centres_output_dir: PathBuf,
	pub framework_source: String,
	pub manual_log: PathBuf,
	pub manual_sheet: String,
	pub interventions: PathBuf,
	pub processed_dir: PathBuf,
	pub cihi_scan: PathBuf,
	pub cihi_sheet: String,
	// title rows above the header of the scan sheet
	pub cihi_skip_rows: usize,
	pub cihi_previous: PathBuf,
	pub cihi_output: PathBuf,
}

impl Default for Paths {
	fn default() -> Self {
		Self{
			case_source: "https://raw.githubusercontent.com/ishaberry/Covid19Canada/master/timeseries_hr/cases_timeseries_hr.csv".into(),
			daily_cases: "data/daily_ts.csv".into(),
			weekly_cases: "data/weekly_ts.csv".into(),
			boundaries: "data/shapefiles/health_regions.geojson".into(),
			merged_regions: "data/shapefiles/mergedHR.geojson".into(),
			centres: "data/POPCTRS/POPCTRS_30.csv".into(),
			centres_output_dir: "data/output".into(),
			framework_source: "https://data.ontario.ca/dataset/cbb4d08c-4e56-4b07-9db6-48335241b88a/resource/ce9f043d-f0d4-40f0-9b96-4c8a83ded3f6/download/response_framework.csv".into(),
			manual_log: "data/interventions/master_closures_openings.xlsx".into(),
			manual_sheet: "top30".into(),
			interventions: "data/interventions/master.csv".into(),
			processed_dir: "data/output".into(),
			cihi_scan: "data/interventions/covid-19-intervention-scan-data-tables-en-web.xlsx".into(),
			cihi_sheet: "Intervention scan".into(),
			cihi_skip_rows: 2,
			cihi_previous: "data/interventions/master.csv".into(),
			cihi_output: "data/interventions/InterventionScan_update.csv".into(),
		}
	}
}


#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterventionSettings {
	pub framework_jurisdiction: String,
	pub framework_source_type: String,
	pub keep_phus: Vec<String>,
	pub manual_cutoff: NaiveDate,
	pub excluded_types: Vec<String>,
	pub cihi_jurisdictions: Vec<String>,
	pub cihi_source_type: String,
}

impl Default for InterventionSettings {
	fn default() -> Self {
		Self{
			framework_jurisdiction: "Ont.".into(),
			framework_source_type: "Ontario Data Catalogue".into(),
			keep_phus: Vec::new(),
			manual_cutoff: default_cutoff(),
			excluded_types: vec!["education".into(), "daycare".into()],
			cihi_jurisdictions: Vec::new(),
			cihi_source_type: "CIHI intervention scan".into(),
		}
	}
}

impl InterventionSettings {
	pub fn keep_set(&self) -> HashSet<CanonicalKey> {
		self.keep_phus.iter().map(|s| s.as_str().into()).collect()
	}
}


fn default_cutoff() -> NaiveDate {
	NaiveDate::from_ymd(2020, 7, 20)
}


#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
	pub paths: Paths,
	pub case_cutoff: NaiveDate,
	pub week_anchor: Weekday,
	pub excluded_jurisdictions: Vec<String>,
	pub jurisdiction_aliases: JurisdictionAliases,
	pub rulesets: HashMap<String, RuleSetSpec>,
	pub ambiguities: Vec<AmbiguitySpec>,
	pub diagnostics: DiagnosticPolicy,
	pub severity: Vec<SeverityLevel>,
	pub type_aliases: HashMap<String, String>,
	pub industries: KeywordDictionary,
	pub place_types: KeywordDictionary,
	pub geometry: GeometrySchema,
	pub centres: usize,
	pub interventions: InterventionSettings,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self{
			paths: Paths::default(),
			case_cutoff: default_cutoff(),
			week_anchor: Weekday::Mon,
			excluded_jurisdictions: vec!["NWT".into(), "Yukon".into(), "Nunavut".into()],
			jurisdiction_aliases: JurisdictionAliases::new(),
			rulesets: HashMap::new(),
			ambiguities: Vec::new(),
			diagnostics: DiagnosticPolicy::default(),
			severity: Vec::new(),
			type_aliases: HashMap::new(),
			industries: KeywordDictionary::new(),
			place_types: KeywordDictionary::new(),
			geometry: GeometrySchema::default(),
			centres: 30,
			interventions: InterventionSettings::default(),
		}
	}
}

impl PipelineConfig {
	pub fn from_str(s: &str) -> Result<Self> {
		Ok(serde_json::from_str(s)?)
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let data = fs::read_to_string(path).map_err(|e| {
			Error::Config(format!("failed to read {}: {}", path.display(), e))
		})?;
		debug!("loading configuration from {}", path.display());
		Self::from_str(&data)
	}

	pub fn from_env() -> Result<Self> {
		let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
		Self::load(path)
	}

	pub fn normalizers(&self) -> Result<Normalizers> {
		Normalizers::compile(&self.rulesets)
	}

	pub fn ambiguity_table(&self) -> AmbiguityTable {
		AmbiguityTable::from_specs(&self.ambiguities)
	}

	pub fn severity_scale(&self) -> SeverityScale {
		SeverityScale::new(&self.severity, &self.type_aliases)
	}

	pub fn industry_tagger(&self) -> KeywordTagger {
		KeywordTagger::from_dictionary(&self.industries)
	}

	pub fn place_tagger(&self) -> KeywordTagger {
		KeywordTagger::from_dictionary(&self.place_types)
	}

	pub fn is_excluded(&self, jurisdiction: &str) -> bool {
		self.excluded_jurisdictions.iter().any(|j| j.as_str() == jurisdiction)
	}
}

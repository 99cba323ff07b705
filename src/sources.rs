use std::collections::HashSet;

use chrono::NaiveDate;

use log::{debug, info};

use serde::Deserialize;

use super::interventions::{Category, InterventionEvent, SeverityScale};
use super::merge::{join, JoinKind};
use super::names::{CanonicalKey, Jurisdiction, JurisdictionAliases};
use super::normalize::Normalizer;
use super::tagger::KeywordTagger;


#[derive(Debug, Clone, Deserialize)]
pub struct FrameworkRecord {
	#[serde(rename = "Reporting_PHU")]
	pub phu: String,
	#[serde(rename = "Status_PHU")]
	pub status: String,
	pub start_date: NaiveDate,
	#[serde(default)]
	pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct FrameworkSettings<'x> {
	pub jurisdiction: &'x str,
	pub source: &'x str,
	pub source_type: &'x str,
	pub keep: &'x HashSet<CanonicalKey>,
}

pub fn framework_events(
		records: &[FrameworkRecord],
		normalizer: &Normalizer,
		scale: &SeverityScale,
		settings: &FrameworkSettings,
) -> Vec<InterventionEvent> {
	let mut result = Vec::new();
	let mut skipped_phus = HashSet::new();
	for rec in records.iter() {
		let t = scale.canonical_type(&rec.status);
		if t == "Other" {
			continue
		}
		let key = normalizer.normalize(&rec.phu);
		if !settings.keep.contains(&key) {
			skipped_phus.insert(key);
			continue
		}
		result.push(InterventionEvent{
			jurisdiction: settings.jurisdiction.into(),
			health_region: Some(key.0),
			implemented: rec.start_date,
			expired: rec.end_date,
			intervention_type: t.into(),
			category: None,
			summary: scale.summary(t).map(|s| s.to_string()),
			source: Some(settings.source.to_string()),
			source_type: Some(settings.source_type.to_string()),
		});
	}
	info!("response framework: {} of {} rows retained, {} public health units not retained", result.len(), records.len(), skipped_phus.len());
	result
}


#[derive(Debug, Clone, Deserialize)]
pub struct ManualRecord {
	#[serde(rename = "Jurisdiction")]
	pub jurisdiction: String,
	#[serde(rename = "Health region", default)]
	pub health_region: Option<String>,
	#[serde(rename = "Date implemented")]
	pub implemented: NaiveDate,
	#[serde(rename = "Date expired", default)]
	pub expired: Option<NaiveDate>,
	#[serde(rename = "Intervention type")]
	pub intervention_type: String,
	#[serde(rename = "Intervention category", default)]
	pub category: Option<String>,
	#[serde(rename = "Intervention summary", default)]
	pub summary: Option<String>,
	#[serde(rename = "Primary source (news release or specific resource)", alias = "Primary source", default)]
	pub source: Option<String>,
}

fn mentions_any(text: &str, keywords: &[String]) -> bool {
	let text = text.to_lowercase();
	keywords.iter().any(|k| text.contains(&k.to_lowercase()))
}

pub fn manual_events(records: &[ManualRecord], cutoff: NaiveDate, excluded_types: &[String]) -> Vec<InterventionEvent> {
	let mut result = Vec::new();
	for rec in records.iter() {
		let category = match rec.category.as_deref().and_then(Category::find_in) {
			Some(c) => c,
			None => continue,
		};
		if rec.implemented <= cutoff || mentions_any(&rec.intervention_type, excluded_types) {
			continue
		}
		result.push(InterventionEvent{
			jurisdiction: rec.jurisdiction.trim().into(),
			health_region: rec.health_region.as_deref().map(|h| h.into()),
			implemented: rec.implemented,
			expired: rec.expired,
			intervention_type: rec.intervention_type.trim().into(),
			category: Some(category),
			summary: rec.summary.clone(),
			source: rec.source.clone(),
			source_type: None,
		});
	}
	info!("manual log: {} of {} rows retained", result.len(), records.len());
	result
}


#[derive(Debug, Clone, Deserialize)]
pub struct ScanRecord {
	#[serde(rename = "Jurisdiction")]
	pub jurisdiction: String,
	#[serde(rename = "Level", default)]
	pub level: Option<String>,
	#[serde(rename = "Date implemented", default)]
	pub implemented: Option<NaiveDate>,
	#[serde(rename = "Intervention type")]
	pub intervention_type: String,
	#[serde(rename = "Intervention category", default)]
	pub category: Option<String>,
	#[serde(rename = "Intervention summary", default)]
	pub summary: Option<String>,
	#[serde(rename = "Source", alias = "Primary source (news release or specific resource)", default)]
	pub source: Option<String>,
}

impl ScanRecord {
	fn is_regional(&self) -> bool {
		match self.level.as_deref().map(|l| l.trim()) {
			Some("Regional") | Some("Municipal") => true,
			_ => false,
		}
	}

	fn to_event(&self, implemented: NaiveDate, health_region: Option<&str>, source_type: &str) -> InterventionEvent {
		let category = self.intervention_type.parse::<Category>().ok()
			.or_else(|| self.category.as_deref().and_then(|c| c.parse().ok()));
		InterventionEvent{
			jurisdiction: self.jurisdiction.trim().into(),
			health_region: health_region.map(|h| h.into()),
			implemented,
			expired: None,
			intervention_type: self.intervention_type.trim().into(),
			category,
			summary: self.summary.clone(),
			source: self.source.clone(),
			source_type: Some(source_type.to_string()),
		}
	}
}

pub type RegionReference = Vec<(Jurisdiction, CanonicalKey)>;

pub struct ScanSettings<'x> {
	pub cutoff: NaiveDate,
	pub jurisdictions: &'x [String],
	pub aliases: &'x JurisdictionAliases,
	pub source_type: &'x str,
}

pub fn scan_events(
		records: &[ScanRecord],
		reference: &RegionReference,
		places: &KeywordTagger,
		settings: &ScanSettings,
) -> Vec<InterventionEvent> {
	let keep: Vec<(&ScanRecord, NaiveDate)> = records.iter().filter_map(|r| {
		let implemented = r.implemented?;
		let t = &r.intervention_type;
		if (t.contains("Closures") || t.contains("Openings"))
				&& implemented >= settings.cutoff
				&& settings.jurisdictions.iter().any(|j| r.jurisdiction.contains(j.as_str())) {
			Some((r, implemented))
		} else {
			None
		}
	}).collect();
	info!("{} new scan entries since {}", keep.len(), settings.cutoff);

	let (regional, rest): (Vec<_>, Vec<_>) = keep.into_iter().partition(|(r, _)| r.is_regional());
	info!("{} regional entries, {} provincial/territorial", regional.len(), rest.len());

	let mut result = Vec::new();
	let joined = join(
		&rest[..],
		&reference[..],
		JoinKind::Left,
		|(r, _)| settings.aliases.canonical(&r.jurisdiction),
		|(j, _)| j.clone(),
	);
	for ((rec, implemented), region) in joined.rows.iter() {
		result.push(rec.to_event(*implemented, region.map(|(_, k)| &**k), settings.source_type));
	}
	if !joined.diagnostic.left_unmatched.is_empty() {
		debug!("no reference regions for {:?}", joined.diagnostic.left_unmatched);
	}

	for (rec, implemented) in regional.into_iter() {
		let suggested = places.tag_joined(rec.summary.as_deref());
		if suggested.is_none() {
			debug!("no health region found in {:?}", rec.summary);
		}
		result.push(rec.to_event(implemented, suggested.as_deref(), settings.source_type));
	}
	result
}

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use log::{info, warn};

use super::cases::{self, WeeklyCaseRecord};
use super::config::{PipelineConfig, BOUNDARIES, CASES, ONTARIO_PHU};
use super::error::{Error, Result};
use super::fetch::open_source;
use super::geometry::{self, MergedRecord};
use super::interventions::{self, Category, InterventionEvent};
use super::ioutil::{magic_open, write_atomic};
use super::merge::{find_duplicates, join, JoinKind};
use super::names::RegionKey;
use super::popctrs;
use super::progress::ProgressSink;
use super::resolve::warn_collisions;
use super::sources::{self, FrameworkRecord, FrameworkSettings, ManualRecord, ScanRecord, ScanSettings};
use super::workbook::read_sheet;


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSummary {
	pub daily_rows: usize,
	pub weekly_rows: usize,
}

pub fn collect_cases(cfg: &PipelineConfig, progress: &mut dyn ProgressSink) -> Result<CaseSummary> {
	info!("reading case time series from {}", cfg.paths.case_source);
	let records = cases::load_case_records(progress, open_source(&cfg.paths.case_source)?)?;
	write_atomic(&cfg.paths.daily_cases, |w| cases::write_records(w, &records))?;
	info!("wrote {} daily rows to {}", records.len(), cfg.paths.daily_cases.display());

	let weekly = cases::aggregate_weekly(&records, cfg.case_cutoff, cfg.week_anchor);
	write_atomic(&cfg.paths.weekly_cases, |w| cases::write_records(w, &weekly))?;
	info!("wrote {} weekly rows to {}", weekly.len(), cfg.paths.weekly_cases.display());
	Ok(CaseSummary{
		daily_rows: records.len(),
		weekly_rows: weekly.len(),
	})
}


struct KeyedCase {
	record: WeeklyCaseRecord,
	key: RegionKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSummary {
	pub merged_rows: usize,
	pub unmatched_cases: usize,
	pub unmatched_regions: usize,
	pub collisions: usize,
	pub above_tolerance: bool,
}

pub fn merge_regions(cfg: &PipelineConfig) -> Result<RegionSummary> {
	let normalizers = cfg.normalizers()?;
	let case_names = normalizers.get(CASES)?;
	let boundary_names = normalizers.get(BOUNDARIES)?;
	let ambiguities = cfg.ambiguity_table();
	let aliases = &cfg.jurisdiction_aliases;

	let weekly = cases::load_weekly(magic_open(&cfg.paths.weekly_cases)?)?;
	let mut normalized: BTreeSet<RegionKey> = BTreeSet::new();
	let mut keyed = Vec::with_capacity(weekly.len());
	for mut record in weekly.into_iter() {
		let jurisdiction = aliases.canonical(&record.province);
		if cfg.is_excluded(&jurisdiction) {
			continue
		}
		let name = case_names.normalize(&record.health_region);
		if let Some(display) = ambiguities.display(&jurisdiction, &name) {
			record.health_region = display.into();
		}
		let key = ambiguities.resolve(&jurisdiction, name.clone());
		normalized.insert((jurisdiction.clone(), name));
		keyed.push(KeyedCase{
			record,
			key: (jurisdiction, key),
		});
	}
	let collisions = ambiguities.find_collisions(normalized.iter());
	warn_collisions(&collisions);

	let duplicates = find_duplicates(&keyed[..], |c| (c.key.clone(), c.record.date_report));
	if let Some(((jurisdiction, key), date)) = duplicates.into_iter().next() {
		return Err(Error::DuplicateKey{
			jurisdiction: jurisdiction.into(),
			key: key.into(),
			date,
		})
	}

	let regions = geometry::load_regions(magic_open(&cfg.paths.boundaries)?, &cfg.geometry, aliases, boundary_names)?;
	let regions: Vec<_> = regions.into_iter().filter(|r| !cfg.is_excluded(&r.jurisdiction)).collect();
	info!("joining {} weekly case rows with {} regions", keyed.len(), regions.len());

	let joined = join(&keyed[..], &regions[..], JoinKind::Inner, |c| c.key.clone(), |r| r.region_key());
	let above_tolerance = cfg.diagnostics.report("region merge", "cases", "boundaries", &joined.diagnostic);

	let records: Vec<MergedRecord> = joined.matched().map(|(c, r)| MergedRecord{
		case: &c.record,
		key: &c.key.1,
		region: &**r,
	}).collect();
	write_atomic(&cfg.paths.merged_regions, |w| geometry::write_merged(w, &records))?;
	info!("wrote {} merged rows to {}", records.len(), cfg.paths.merged_regions.display());

	Ok(RegionSummary{
		merged_rows: records.len(),
		unmatched_cases: joined.diagnostic.left_unmatched.len(),
		unmatched_regions: joined.diagnostic.right_unmatched.len(),
		collisions: collisions.len(),
		above_tolerance,
	})
}


fn load_top_centres(cfg: &PipelineConfig) -> Result<(Vec<popctrs::PopulationCentre>, Vec<RegionKey>)> {
	let normalizers = cfg.normalizers()?;
	let centres = popctrs::load_centres(magic_open(&cfg.paths.centres)?)?;
	let top = popctrs::top_n(&centres, cfg.centres);
	let keys = popctrs::centre_keys(&top, &cfg.jurisdiction_aliases, normalizers.get(CASES)?, &cfg.ambiguity_table());
	Ok((top, keys))
}

pub fn top_centres(cfg: &PipelineConfig, date: NaiveDate) -> Result<PathBuf> {
	let (top, keys) = load_top_centres(cfg)?;
	let merged = geometry::load_merged(magic_open(&cfg.paths.merged_regions)?)?;
	let (features, diagnostic) = popctrs::overlay(&top, &keys, &merged);
	cfg.diagnostics.report("population centre overlay", "centres", "regions", &diagnostic);
	popctrs::check_retained(&features, cfg.centres);

	let path = cfg.paths.centres_output_dir.join(format!("cases_{}.geojson", date.format("%Y-%m-%d")));
	let n = features.len();
	write_atomic(&path, move |w| geometry::write_features(w, features))?;
	info!("wrote {} features to {}", n, path.display());
	Ok(path)
}


fn write_events(path: &Path, events: &[InterventionEvent]) -> Result<()> {
	write_atomic(path, |w| cases::write_records(w, events))?;
	interventions::log_category_counts(&path.display().to_string(), events);
	Ok(())
}

pub fn merge_interventions(cfg: &PipelineConfig) -> Result<usize> {
	let normalizers = cfg.normalizers()?;
	let scale = cfg.severity_scale();
	let settings = &cfg.interventions;

	let mut r = csv::Reader::from_reader(open_source(&cfg.paths.framework_source)?);
	let mut framework = Vec::new();
	for row in r.deserialize::<FrameworkRecord>() {
		framework.push(row?);
	}
	let keep = settings.keep_set();
	let events = sources::framework_events(
		&framework,
		normalizers.get(ONTARIO_PHU)?,
		&scale,
		&FrameworkSettings{
			jurisdiction: &settings.framework_jurisdiction,
			source: &cfg.paths.framework_source,
			source_type: &settings.framework_source_type,
			keep: &keep,
		},
	);
	let mut events = interventions::categorize(events, &scale);

	let sheet = read_sheet(&cfg.paths.manual_log, &cfg.paths.manual_sheet, 0)?;
	let manual: Vec<ManualRecord> = sheet.deserialize()?;
	events.extend(sources::manual_events(&manual, settings.manual_cutoff, &settings.excluded_types));

	write_events(&cfg.paths.interventions, &events)?;
	Ok(events.len())
}


pub const SUMMARY_COLUMN: &'static str = "Intervention summary";
pub const CATEGORY_COLUMN: &'static str = "Intervention category";
pub const INDUSTRY_COLUMN: &'static str = "suggested_industry";

pub fn tag_interventions(cfg: &PipelineConfig, date: NaiveDate) -> Result<PathBuf> {
	let tagger = cfg.industry_tagger();
	let mut r = csv::Reader::from_reader(magic_open(&cfg.paths.interventions)?);
	let headers = r.headers()?.clone();
	let column = |name: &str| headers.iter().position(|h| h == name).ok_or_else(|| {
		Error::Config(format!("{} has no {:?} column", cfg.paths.interventions.display(), name))
	});
	let summary_col = column(SUMMARY_COLUMN)?;
	let category_col = column(CATEGORY_COLUMN)?;

	let mut rows = Vec::new();
	let mut total = 0;
	for row in r.records() {
		let mut row = row?;
		total += 1;
		if row.get(category_col).and_then(Category::find_in).is_none() {
			continue
		}
		let summary = row.get(summary_col).filter(|s| s.len() > 0);
		let industry = tagger.tag_joined(summary).unwrap_or_default();
		row.push_field(&industry);
		rows.push(row);
	}
	info!("tagged {} of {} interventions", rows.len(), total);

	let mut out_headers = headers.clone();
	out_headers.push_field(INDUSTRY_COLUMN);
	let path = cfg.paths.processed_dir.join(format!("InterventionScan_Processed_{}.csv", date.format("%Y-%m-%d")));
	write_atomic(&path, |w| {
		let mut w = csv::Writer::from_writer(w);
		w.write_record(&out_headers)?;
		for row in rows.iter() {
			w.write_record(row)?;
		}
		w.flush()?;
		Ok(())
	})?;
	info!("wrote {}", path.display());
	Ok(path)
}


pub fn cihi_update(cfg: &PipelineConfig, cutoff: NaiveDate) -> Result<usize> {
	let mut events = interventions::load_events(magic_open(&cfg.paths.cihi_previous)?)?;
	let previous = events.len();

	let sheet = read_sheet(&cfg.paths.cihi_scan, &cfg.paths.cihi_sheet, cfg.paths.cihi_skip_rows)?;
	let scan: Vec<ScanRecord> = sheet.deserialize()?;

	let (_, keys) = load_top_centres(cfg)?;
	let reference = popctrs::reference(&keys);
	let new = sources::scan_events(
		&scan,
		&reference,
		&cfg.place_tagger(),
		&ScanSettings{
			cutoff,
			jurisdictions: &cfg.interventions.cihi_jurisdictions,
			aliases: &cfg.jurisdiction_aliases,
			source_type: &cfg.interventions.cihi_source_type,
		},
	);
	info!("{} previous entries, {} new entries for the top {} population centres since {}", previous, new.len(), cfg.centres, cutoff);
	events.extend(new);

	write_events(&cfg.paths.cihi_output, &events)?;
	warn!("suggested health regions in {} must be validated by hand", cfg.paths.cihi_output.display());
	Ok(events.len())
}

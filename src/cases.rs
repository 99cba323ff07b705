use std::collections::BTreeSet;
use std::io;

use chrono::{Duration, NaiveDate, Weekday};

use log::info;

use serde::{de, Deserialize, Deserializer, Serialize};

use smartstring::alias::{String as SmartString};

use super::error::Result;
use super::progress::{CountMeter, ProgressSink};
use super::timeseries::TimeSeries;


pub type CaseKey = (SmartString, SmartString);


// dd-mm-yyyy in the published series, ISO in files written here
fn case_date_compat<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
	where D: Deserializer<'de>
{
	let s = String::deserialize(deserializer)?;
	let s = s.trim();
	if s.len() != 10 {
		return Err(de::Error::custom("invalid length for date, must be 10 bytes"))
	}
	if s.as_bytes()[2] == b'-' {
		NaiveDate::parse_from_str(s, "%d-%m-%Y").map_err(de::Error::custom)
	} else {
		s.parse::<NaiveDate>().map_err(de::Error::custom)
	}
}


#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CaseRecord {
	pub province: SmartString,
	pub health_region: SmartString,
	#[serde(deserialize_with = "case_date_compat")]
	pub date_report: NaiveDate,
	pub cases: i64,
	#[serde(default)]
	pub cumulative_cases: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeeklyCaseRecord {
	pub province: SmartString,
	pub health_region: SmartString,
	#[serde(deserialize_with = "case_date_compat")]
	pub date_report: NaiveDate,
	pub cases: i64,
}


pub fn load_case_records<R: io::Read, S: ProgressSink + ?Sized>(s: &mut S, r: R) -> Result<Vec<CaseRecord>> {
	let mut r = csv::Reader::from_reader(r);
	let mut pm = CountMeter::new(s, 10000);
	let mut result = Vec::new();
	for row in r.deserialize() {
		let rec: CaseRecord = row?;
		result.push(rec);
		pm.tick();
	}
	pm.finish();
	Ok(result)
}

pub fn load_weekly<R: io::Read>(r: R) -> Result<Vec<WeeklyCaseRecord>> {
	let mut r = csv::Reader::from_reader(r);
	let mut result = Vec::new();
	for row in r.deserialize::<WeeklyCaseRecord>() {
		result.push(row?);
	}
	Ok(result)
}


pub fn aggregate_weekly(records: &[CaseRecord], cutoff: NaiveDate, anchor: Weekday) -> Vec<WeeklyCaseRecord> {
	let last = match records.iter().map(|r| r.date_report).max() {
		Some(d) if d >= cutoff => d,
		_ => return Vec::new(),
	};
	let mut ts: TimeSeries<CaseKey, i64> = TimeSeries::new(cutoff, last + Duration::days(1));
	let mut dropped = 0;
	for rec in records.iter() {
		if !ts.add_at((rec.province.clone(), rec.health_region.clone()), rec.date_report, rec.cases) {
			dropped += 1;
		}
	}
	info!("aggregating {} records into weeks, {} records before {} dropped", records.len() - dropped, dropped, cutoff);

	let keys: BTreeSet<&CaseKey> = ts.keys().collect();
	let mut result = Vec::new();
	for k in keys.into_iter() {
		for (week, cases) in ts.weekly(k, anchor).into_iter() {
			result.push(WeeklyCaseRecord{
				province: k.0.clone(),
				health_region: k.1.clone(),
				date_report: week,
				cases,
			});
		}
	}
	result
}


pub fn write_records<W: io::Write, T: Serialize>(w: W, records: &[T]) -> Result<()> {
	let mut w = csv::Writer::from_writer(w);
	for rec in records.iter() {
		w.serialize(rec)?;
	}
	w.flush()?;
	Ok(())
}

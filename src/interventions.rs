use std::collections::HashMap;
use std::fmt;
use std::io;
use std::str::FromStr;

use chrono::NaiveDate;

use enum_map::{Enum, EnumMap};

use log::{debug, info};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use smartstring::alias::{String as SmartString};

use super::error;
use super::names::Jurisdiction;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Enum)]
pub enum Category {
	Openings,
	Closures,
	Restrictions,
	// only ever taken from curated input
	RestrictionRelease,
}

impl Category {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Openings => "Openings",
			Self::Closures => "Closures",
			Self::Restrictions => "Restrictions",
			Self::RestrictionRelease => "Restriction release",
		}
	}

	pub fn find_in(label: &str) -> Option<Self> {
		[Self::RestrictionRelease, Self::Restrictions, Self::Openings, Self::Closures].iter()
			.copied()
			.find(|c| label.contains(c.as_str()))
	}
}

impl fmt::Display for Category {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "unknown intervention category: {:?}", self.0)
	}
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
	type Err = UnknownCategory;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"openings" => Ok(Self::Openings),
			"closures" => Ok(Self::Closures),
			"restrictions" => Ok(Self::Restrictions),
			"restriction release" | "restriction releases" => Ok(Self::RestrictionRelease),
			_ => Err(UnknownCategory(s.into())),
		}
	}
}

impl Serialize for Category {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Category {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(de::Error::custom)
	}
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionEvent {
	#[serde(rename = "Jurisdiction")]
	pub jurisdiction: Jurisdiction,
	#[serde(rename = "Health region", default)]
	pub health_region: Option<SmartString>,
	#[serde(rename = "Date implemented")]
	pub implemented: NaiveDate,
	#[serde(rename = "Date expired", default)]
	pub expired: Option<NaiveDate>,
	#[serde(rename = "Intervention type")]
	pub intervention_type: SmartString,
	#[serde(rename = "Intervention category", default)]
	pub category: Option<Category>,
	#[serde(rename = "Intervention summary", default)]
	pub summary: Option<String>,
	#[serde(rename = "Primary source", default)]
	pub source: Option<String>,
	#[serde(rename = "Source type", default)]
	pub source_type: Option<String>,
}

impl InterventionEvent {
	fn region(&self) -> (&str, &str) {
		(self.jurisdiction.as_str(), self.health_region.as_deref().unwrap_or(""))
	}
}


pub fn load_events<R: io::Read>(r: R) -> error::Result<Vec<InterventionEvent>> {
	let mut r = csv::Reader::from_reader(r);
	let mut result = Vec::new();
	for row in r.deserialize::<InterventionEvent>() {
		result.push(row?);
	}
	Ok(result)
}


#[derive(Debug, Clone, Deserialize)]
pub struct SeverityLevel {
	pub level: String,
	#[serde(default)]
	pub rank: Option<i32>,
	#[serde(default)]
	pub summary: Option<String>,
	#[serde(default)]
	pub category: Option<Category>,
}

#[derive(Debug, Clone, Default)]
pub struct SeverityScale {
	levels: HashMap<String, SeverityLevel>,
	aliases: HashMap<String, String>,
}

impl SeverityScale {
	pub fn new(levels: &[SeverityLevel], aliases: &HashMap<String, String>) -> Self {
		Self{
			levels: levels.iter().map(|l| (l.level.clone(), l.clone())).collect(),
			aliases: aliases.clone(),
		}
	}

	pub fn len(&self) -> usize {
		self.levels.len()
	}

	pub fn canonical_type<'x>(&'x self, t: &'x str) -> &'x str {
		let t = t.trim();
		match self.aliases.get(t) {
			Some(full) => full.as_str(),
			None => t,
		}
	}

	fn level(&self, t: &str) -> Option<&SeverityLevel> {
		self.levels.get(self.canonical_type(t))
	}

	pub fn rank(&self, t: &str) -> Option<i32> {
		self.level(t)?.rank
	}

	pub fn direct_category(&self, t: &str) -> Option<Category> {
		self.level(t)?.category
	}

	pub fn summary(&self, t: &str) -> Option<&str> {
		self.level(t)?.summary.as_deref()
	}
}


// no predecessor, or no rank on either side: uncategorized
pub fn infer_category(scale: &SeverityScale, previous: Option<&InterventionEvent>, current: &InterventionEvent) -> Option<Category> {
	if let Some(c) = current.category {
		return Some(c)
	}
	if let Some(c) = scale.direct_category(&current.intervention_type) {
		return Some(c)
	}
	let previous = previous?;
	let prev_rank = scale.rank(&previous.intervention_type)?;
	let rank = scale.rank(&current.intervention_type)?;
	if rank < prev_rank {
		Some(Category::Openings)
	} else {
		Some(Category::Closures)
	}
}

pub fn categorize(events: Vec<InterventionEvent>, scale: &SeverityScale) -> Vec<InterventionEvent> {
	let mut order: HashMap<(String, String), usize> = HashMap::new();
	let mut groups: Vec<Vec<InterventionEvent>> = Vec::new();
	for ev in events.into_iter() {
		let (j, r) = ev.region();
		let k = (j.to_string(), r.to_string());
		let index = match order.get(&k) {
			Some(i) => *i,
			None => {
				let i = groups.len();
				order.insert(k, i);
				groups.push(Vec::new());
				i
			},
		};
		groups[index].push(ev);
	}

	groups.into_iter().flat_map(|group| categorize_region(group, scale)).collect()
}

fn categorize_region(mut group: Vec<InterventionEvent>, scale: &SeverityScale) -> Vec<InterventionEvent> {
	group.sort_by_key(|ev| ev.implemented);
	let categories: Vec<Option<Category>> = group.iter().enumerate().map(|(i, ev)| {
		let previous = if i > 0 { Some(&group[i-1]) } else { None };
		infer_category(scale, previous, ev)
	}).collect();
	for (ev, category) in group.iter_mut().zip(categories.into_iter()) {
		if ev.category.is_none() && category.is_some() {
			debug!("{:?}/{}: {} on {} categorized as {:?}", ev.jurisdiction, ev.health_region.as_deref().unwrap_or("-"), ev.intervention_type, ev.implemented, category);
		}
		ev.category = category;
	}
	group
}


pub fn category_counts(events: &[InterventionEvent]) -> (EnumMap<Category, usize>, usize) {
	let mut counts: EnumMap<Category, usize> = EnumMap::default();
	let mut uncategorized = 0;
	for ev in events.iter() {
		match ev.category {
			Some(c) => counts[c] += 1,
			None => uncategorized += 1,
		}
	}
	(counts, uncategorized)
}

pub fn log_category_counts(what: &str, events: &[InterventionEvent]) {
	let (counts, uncategorized) = category_counts(events);
	let parts: Vec<String> = counts.iter().map(|(c, n)| format!("{}={}", c, n)).collect();
	info!("{}: {} events, {}, uncategorized={}", what, events.len(), parts.join(", "), uncategorized);
}


#[cfg(test)]
mod tests {
	use super::*;

	fn d(y: i32, m: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, day).unwrap()
	}

	fn ev(region: &str, date: NaiveDate, t: &str) -> InterventionEvent {
		InterventionEvent{
			jurisdiction: "Ont.".into(),
			health_region: Some(region.into()),
			implemented: date,
			expired: None,
			intervention_type: t.into(),
			category: None,
			summary: None,
			source: None,
			source_type: None,
		}
	}

	fn level(name: &str, rank: i32, category: Option<Category>) -> SeverityLevel {
		SeverityLevel{
			level: name.into(),
			rank: Some(rank),
			summary: Some(format!("{} measures", name)),
			category,
		}
	}

	fn scale() -> SeverityScale {
		let levels = vec![
			level("Green - Prevent", 1, None),
			level("Yellow - Protect", 2, None),
			level("Orange - Restrict", 3, None),
			level("Red - Control", 4, None),
			level("Grey - Lockdown", 5, Some(Category::Closures)),
		];
		let mut aliases = HashMap::new();
		aliases.insert("Prevent".to_string(), "Green - Prevent".to_string());
		aliases.insert("Protect".to_string(), "Yellow - Protect".to_string());
		aliases.insert("Restrict".to_string(), "Orange - Restrict".to_string());
		aliases.insert("Control".to_string(), "Red - Control".to_string());
		aliases.insert("Lockdown".to_string(), "Grey - Lockdown".to_string());
		SeverityScale::new(&levels, &aliases)
	}

	fn categories(events: &[InterventionEvent]) -> Vec<Option<Category>> {
		events.iter().map(|e| e.category).collect()
	}

	#[test]
	fn category_labels_parse_leniently() {
		assert_eq!("Openings".parse::<Category>().unwrap(), Category::Openings);
		assert_eq!(" closures ".parse::<Category>().unwrap(), Category::Closures);
		assert_eq!("Restriction release".parse::<Category>().unwrap(), Category::RestrictionRelease);
		assert!("Testing".parse::<Category>().is_err());
		assert_eq!(Category::find_in("Closures/openings"), Some(Category::Closures));
		assert_eq!(Category::find_in("Restriction release (partial)"), Some(Category::RestrictionRelease));
		assert_eq!(Category::find_in("New Restrictions"), Some(Category::Restrictions));
		assert_eq!(Category::find_in("closures"), None);
		assert_eq!(Category::find_in(""), None);
		assert_eq!(Category::RestrictionRelease.to_string(), "Restriction release");
	}

	#[test]
	fn lockdown_is_always_closures() {
		let s = scale();
		let events = vec![
			ev("Toronto", d(2020, 11, 23), "Lockdown"),
			ev("Peel", d(2020, 11, 1), "Red - Control"),
			ev("Peel", d(2020, 11, 23), "Lockdown"),
		];
		let result = categorize(events, &s);
		assert_eq!(categories(&result), vec![Some(Category::Closures), None, Some(Category::Closures)]);
	}

	#[test]
	fn first_unmapped_event_stays_uncategorized() {
		let s = scale();
		let result = categorize(vec![ev("Ottawa", d(2020, 11, 7), "Orange - Restrict")], &s);
		assert_eq!(categories(&result), vec![None]);
	}

	#[test]
	fn direction_of_change_decides() {
		let s = scale();
		let events = vec![
			ev("Ottawa", d(2020, 11, 21), "Yellow - Protect"),
			ev("Ottawa", d(2020, 11, 7), "Restrict"),
			ev("Ottawa", d(2020, 12, 14), "Orange - Restrict"),
			ev("Ottawa", d(2021, 1, 4), "Orange - Restrict"),
		];
		let result = categorize(events, &s);
		let dates: Vec<NaiveDate> = result.iter().map(|e| e.implemented).collect();
		assert_eq!(dates, vec![d(2020, 11, 7), d(2020, 11, 21), d(2020, 12, 14), d(2021, 1, 4)]);
		assert_eq!(categories(&result), vec![
			None,
			Some(Category::Openings),
			Some(Category::Closures),
			Some(Category::Closures),
		]);
	}

	#[test]
	fn regions_do_not_share_history() {
		let s = scale();
		let events = vec![
			ev("Ottawa", d(2020, 11, 7), "Red - Control"),
			ev("Toronto", d(2020, 11, 14), "Yellow - Protect"),
			ev("Ottawa", d(2020, 11, 21), "Yellow - Protect"),
		];
		let result = categorize(events, &s);
		let got: Vec<_> = result.iter().map(|e| (e.health_region.as_deref().unwrap(), e.category)).collect();
		assert_eq!(got, vec![
			("Ottawa", None),
			("Ottawa", Some(Category::Openings)),
			("Toronto", None),
		]);
	}

	#[test]
	fn unknown_rank_only_affects_that_event() {
		let s = scale();
		let events = vec![
			ev("Peel", d(2020, 11, 1), "Orange - Restrict"),
			ev("Peel", d(2020, 11, 8), "Curfew"),
			ev("Peel", d(2020, 11, 15), "Red - Control"),
			ev("Peel", d(2020, 11, 22), "Red - Control"),
		];
		let result = categorize(events, &s);
		assert_eq!(categories(&result), vec![None, None, None, Some(Category::Closures)]);
	}

	#[test]
	fn explicit_category_is_kept() {
		let s = scale();
		let mut first = ev("Peel", d(2020, 11, 1), "Capacity limits");
		first.category = Some(Category::RestrictionRelease);
		let result = categorize(vec![first], &s);
		assert_eq!(categories(&result), vec![Some(Category::RestrictionRelease)]);
	}

	#[test]
	fn summaries_come_from_the_scale() {
		let s = scale();
		assert_eq!(s.summary("Protect"), Some("Yellow - Protect measures"));
		assert_eq!(s.rank(" Control "), Some(4));
		assert_eq!(s.summary("Other"), None);
	}

	#[test]
	fn counts_per_category() {
		let mut events = vec![ev("a", d(2020, 11, 1), "x"), ev("a", d(2020, 11, 2), "x"), ev("a", d(2020, 11, 3), "x")];
		events[0].category = Some(Category::Openings);
		events[1].category = Some(Category::Openings);
		let (counts, none) = category_counts(&events);
		assert_eq!(counts[Category::Openings], 2);
		assert_eq!(counts[Category::Closures], 0);
		assert_eq!(none, 1);
	}

	#[test]
	fn events_round_trip_through_csv() {
		let mut e = ev("Toronto", d(2020, 11, 23), "Grey - Lockdown");
		e.category = Some(Category::Closures);
		let mut w = csv::Writer::from_writer(Vec::new());
		w.serialize(&e).unwrap();
		let buf = w.into_inner().unwrap();
		assert_eq!(load_events(&buf[..]).unwrap(), vec![e]);
	}
}

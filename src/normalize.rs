use std::collections::HashMap;

use log::{debug, trace};

use regex::{NoExpand, Regex, RegexBuilder};

use serde::Deserialize;

use super::error::{Error, Result};
use super::names::CanonicalKey;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
	Strip,
	Rename,
	Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
	Literal,
	// `$n` expands capture groups
	Regex,
	// whole name only
	Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
	Sensitive,
	Insensitive,
}

impl Default for CasePolicy {
	fn default() -> Self {
		Self::Sensitive
	}
}


#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
	pub kind: RuleKind,
	#[serde(rename = "match")]
	pub mode: MatchMode,
	pub pattern: String,
	#[serde(default)]
	pub replacement: String,
}

impl RuleSpec {
	pub fn new<P: Into<String>, R: Into<String>>(kind: RuleKind, mode: MatchMode, pattern: P, replacement: R) -> Self {
		Self{
			kind,
			mode,
			pattern: pattern.into(),
			replacement: replacement.into(),
		}
	}

	pub fn strip<P: Into<String>>(mode: MatchMode, pattern: P) -> Self {
		Self::new(RuleKind::Strip, mode, pattern, "")
	}

	pub fn rename<P: Into<String>, R: Into<String>>(pattern: P, replacement: R) -> Self {
		Self::new(RuleKind::Rename, MatchMode::Exact, pattern, replacement)
	}

	pub fn aggregate<P: Into<String>, R: Into<String>>(pattern: P, replacement: R) -> Self {
		Self::new(RuleKind::Aggregate, MatchMode::Exact, pattern, replacement)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSetSpec {
	#[serde(default)]
	pub case: CasePolicy,
	pub rules: Vec<RuleSpec>,
}


#[derive(Debug, Clone)]
enum Matcher {
	Pattern{re: Regex, expand: bool},
	Exact(String),
}

#[derive(Debug, Clone)]
pub struct RewriteRule {
	kind: RuleKind,
	matcher: Matcher,
	replacement: String,
}

impl RewriteRule {
	fn compile(spec: &RuleSpec, case: CasePolicy) -> Result<Self> {
		if spec.pattern.is_empty() {
			return Err(Error::Config(format!("empty {:?} pattern (replacement {:?})", spec.kind, spec.replacement)))
		}
		let insensitive = case == CasePolicy::Insensitive;
		let matcher = match spec.mode {
			MatchMode::Literal => Matcher::Pattern{
				re: RegexBuilder::new(&regex::escape(&spec.pattern)).case_insensitive(insensitive).build()?,
				expand: false,
			},
			MatchMode::Regex => Matcher::Pattern{
				re: RegexBuilder::new(&spec.pattern).case_insensitive(insensitive).build()?,
				expand: true,
			},
			MatchMode::Exact if insensitive => Matcher::Exact(spec.pattern.to_lowercase()),
			MatchMode::Exact => Matcher::Exact(spec.pattern.clone()),
		};
		Ok(Self{
			kind: spec.kind,
			matcher,
			replacement: spec.replacement.clone(),
		})
	}

	fn apply(&self, s: String, case: CasePolicy) -> String {
		match &self.matcher {
			Matcher::Pattern{re, expand: true} => re.replace_all(&s, self.replacement.as_str()).into_owned(),
			Matcher::Pattern{re, expand: false} => re.replace_all(&s, NoExpand(&self.replacement)).into_owned(),
			Matcher::Exact(pattern) => {
				let hit = match case {
					CasePolicy::Sensitive => &s == pattern,
					CasePolicy::Insensitive => &s.to_lowercase() == pattern,
				};
				if hit {
					self.replacement.clone()
				} else {
					s
				}
			},
		}
	}
}


#[derive(Debug, Clone)]
pub struct Normalizer {
	dataset: String,
	case: CasePolicy,
	rules: Vec<RewriteRule>,
}

impl Normalizer {
	pub fn compile(dataset: &str, spec: &RuleSetSpec) -> Result<Self> {
		let rules = spec.rules.iter()
			.map(|r| RewriteRule::compile(r, spec.case))
			.collect::<Result<Vec<_>>>()?;
		Ok(Self{
			dataset: dataset.into(),
			case: spec.case,
			rules,
		})
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn normalize(&self, raw: &str) -> CanonicalKey {
		let mut s = raw.to_string();
		for rule in self.rules.iter() {
			let next = rule.apply(s.clone(), self.case);
			if next != s {
				trace!("{}: {:?} rule {:?} -> {:?}", self.dataset, rule.kind, s, next);
			}
			s = next;
		}
		let key = collapse_whitespace(&s);
		if key != raw {
			debug!("{}: {:?} -> {:?}", self.dataset, raw, key);
		}
		key.into()
	}
}

fn collapse_whitespace(s: &str) -> String {
	s.split_whitespace().collect::<Vec<_>>().join(" ")
}


#[derive(Debug, Clone, Default)]
pub struct Normalizers {
	by_dataset: HashMap<String, Normalizer>,
}

impl Normalizers {
	pub fn compile(specs: &HashMap<String, RuleSetSpec>) -> Result<Self> {
		let mut by_dataset = HashMap::new();
		for (dataset, spec) in specs.iter() {
			by_dataset.insert(dataset.clone(), Normalizer::compile(dataset, spec)?);
		}
		Ok(Self{by_dataset})
	}

	pub fn get(&self, dataset: &str) -> Result<&Normalizer> {
		self.by_dataset.get(dataset).ok_or_else(|| Error::Config(format!("no rule set for dataset {:?}", dataset)))
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn case_rules() -> RuleSetSpec {
		RuleSetSpec{
			case: CasePolicy::Sensitive,
			rules: vec![
				RuleSpec::strip(MatchMode::Regex, r"\s\(.*\)"),
				RuleSpec::strip(MatchMode::Literal, ","),
				RuleSpec::new(RuleKind::Strip, MatchMode::Literal, "-", " "),
			],
		}
	}

	fn boundary_rules() -> RuleSetSpec {
		RuleSetSpec{
			case: CasePolicy::Sensitive,
			rules: vec![
				RuleSpec::strip(MatchMode::Literal, "Région du "),
				RuleSpec::strip(MatchMode::Literal, "Région de "),
				RuleSpec::strip(MatchMode::Literal, " Health Unit"),
				RuleSpec::strip(MatchMode::Literal, "City of "),
				RuleSpec::new(RuleKind::Strip, MatchMode::Literal, "-", " "),
				RuleSpec::new(RuleKind::Rename, MatchMode::Literal, "Vancouver  Coastal Health", "Vancouver Coastal"),
				RuleSpec::strip(MatchMode::Literal, " District"),
				RuleSpec::new(RuleKind::Rename, MatchMode::Literal, "Sudbury and", "Sudbury"),
				RuleSpec::rename("Windsor Essex County", "Windsor Essex"),
				RuleSpec::rename("Montréal", "Montreal"),
				RuleSpec::aggregate("South East", "South"),
				RuleSpec::aggregate("South West", "South"),
				RuleSpec::aggregate("South Central", "South"),
			],
		}
	}

	#[test]
	fn strips_parenthetical_qualifiers_and_punctuation() {
		let n = Normalizer::compile("cases", &case_rules()).unwrap();
		assert_eq!(&*n.normalize("Kingston Frontenac Lennox & Addington (KFL&A)"), "Kingston Frontenac Lennox & Addington");
		assert_eq!(&*n.normalize("Wellington-Dufferin-Guelph"), "Wellington Dufferin Guelph");
		assert_eq!(&*n.normalize("Haldimand-Norfolk, Ontario"), "Haldimand Norfolk Ontario");
	}

	#[test]
	fn result_is_trimmed_with_single_spaces() {
		let n = Normalizer::compile("cases", &case_rules()).unwrap();
		assert_eq!(&*n.normalize("  Simcoe - Muskoka  "), "Simcoe Muskoka");
	}

	#[test]
	fn same_region_from_two_datasets_meets_on_one_key() {
		let a = Normalizer::compile("boundaries", &boundary_rules()).unwrap();
		let b = Normalizer::compile("centres", &RuleSetSpec{
			case: CasePolicy::Sensitive,
			rules: vec![RuleSpec::strip(MatchMode::Literal, "City of ")],
		}).unwrap();
		assert_eq!(a.normalize("Région de Montréal"), b.normalize("City of Montreal"));
		assert_eq!(&*a.normalize("Région de Montréal"), "Montreal");
	}

	#[test]
	fn later_rules_see_output_of_earlier_rules() {
		let n = Normalizer::compile("boundaries", &boundary_rules()).unwrap();
		// " Health Unit", then " District", then "Sudbury and"
		assert_eq!(&*n.normalize("Sudbury and District Health Unit"), "Sudbury");
		// the double space only exists before whitespace is collapsed
		assert_eq!(&*n.normalize("Vancouver -Coastal Health"), "Vancouver Coastal");
	}

	#[test]
	fn rule_order_matters() {
		let mut spec = boundary_rules();
		spec.rules.reverse();
		let n = Normalizer::compile("boundaries", &spec).unwrap();
		// the exact rename now runs before " Health Unit" is stripped
		assert_eq!(&*n.normalize("Windsor Essex County Health Unit"), "Windsor Essex County");
	}

	#[test]
	fn exact_rules_only_match_whole_names() {
		let n = Normalizer::compile("boundaries", &boundary_rules()).unwrap();
		assert_eq!(&*n.normalize("South East"), "South");
		assert_eq!(&*n.normalize("South Central"), "South");
		assert_eq!(&*n.normalize("South Eastern Shore"), "South Eastern Shore");
		assert_eq!(&*n.normalize("Windsor Essex County Health Unit"), "Windsor Essex");
	}

	#[test]
	fn matching_is_case_sensitive_by_default() {
		let n = Normalizer::compile("boundaries", &boundary_rules()).unwrap();
		assert_eq!(&*n.normalize("south east"), "south east");
		assert_eq!(&*n.normalize("city of Toronto"), "city of Toronto");
	}

	#[test]
	fn insensitive_policy_applies_to_every_mode() {
		let mut spec = boundary_rules();
		spec.case = CasePolicy::Insensitive;
		let n = Normalizer::compile("boundaries", &spec).unwrap();
		assert_eq!(&*n.normalize("south east"), "South");
		assert_eq!(&*n.normalize("city of Toronto"), "Toronto");
	}

	#[test]
	fn normalization_is_deterministic() {
		let n = Normalizer::compile("boundaries", &boundary_rules()).unwrap();
		let names = ["Région du Nord", "Sudbury and District Health Unit", "South West", "Unmapped Place"];
		for name in names.iter() {
			assert_eq!(n.normalize(name), n.normalize(name));
		}
	}

	#[test]
	fn unmapped_names_pass_through() {
		let n = Normalizer::compile("boundaries", &boundary_rules()).unwrap();
		assert_eq!(&*n.normalize("Toronto"), "Toronto");
	}

	#[test]
	fn empty_patterns_are_rejected() {
		let spec = RuleSetSpec{
			case: CasePolicy::Sensitive,
			rules: vec![RuleSpec::strip(MatchMode::Literal, "")],
		};
		assert!(Normalizer::compile("x", &spec).is_err());
	}

	#[test]
	fn rule_sets_parse_from_json() {
		let spec: RuleSetSpec = serde_json::from_str(r#"{
			"case": "insensitive",
			"rules": [
				{"kind": "strip", "match": "literal", "pattern": " Health Unit"},
				{"kind": "aggregate", "match": "exact", "pattern": "Far North East", "replacement": "Far North"}
			]
		}"#).unwrap();
		let n = Normalizer::compile("boundaries", &spec).unwrap();
		assert_eq!(n.len(), 2);
		assert_eq!(&*n.normalize("far north east"), "Far North");
	}
}

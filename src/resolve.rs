use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::warn;

use serde::Deserialize;

use smartstring::alias::{String as SmartString};

use super::names::{CanonicalKey, Jurisdiction, RegionKey};


#[derive(Debug, Clone, Deserialize)]
pub struct AmbiguitySpec {
	pub jurisdiction: String,
	pub name: String,
	pub key: String,
	#[serde(default)]
	pub display: Option<String>,
}

#[derive(Debug, Clone)]
struct Override {
	key: CanonicalKey,
	display: Option<SmartString>,
}


#[derive(Debug, Clone, Default)]
pub struct AmbiguityTable {
	overrides: HashMap<(Jurisdiction, SmartString), Override>,
}

impl AmbiguityTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_specs(specs: &[AmbiguitySpec]) -> Self {
		let mut result = Self::new();
		for spec in specs.iter() {
			result.insert(&spec.jurisdiction, &spec.name, &spec.key, spec.display.as_deref());
		}
		result
	}

	pub fn insert(&mut self, jurisdiction: &str, name: &str, key: &str, display: Option<&str>) {
		self.overrides.insert(
			(jurisdiction.into(), name.into()),
			Override{
				key: key.into(),
				display: display.map(|d| d.into()),
			},
		);
	}

	pub fn len(&self) -> usize {
		self.overrides.len()
	}

	pub fn contains(&self, jurisdiction: &str, name: &str) -> bool {
		self.get(jurisdiction, name).is_some()
	}

	fn get(&self, jurisdiction: &str, name: &str) -> Option<&Override> {
		let k: (Jurisdiction, SmartString) = (jurisdiction.into(), name.into());
		self.overrides.get(&k)
	}

	pub fn resolve(&self, jurisdiction: &str, key: CanonicalKey) -> CanonicalKey {
		match self.get(jurisdiction, &key) {
			Some(o) => o.key.clone(),
			None => key,
		}
	}

	// label override for a normalized but unresolved name
	pub fn display(&self, jurisdiction: &str, name: &str) -> Option<&str> {
		self.get(jurisdiction, name)?.display.as_deref()
	}

	pub fn find_collisions<'x, I: IntoIterator<Item = &'x RegionKey>>(&self, keys: I) -> Vec<Collision> {
		let mut by_name: BTreeMap<&CanonicalKey, BTreeSet<&Jurisdiction>> = BTreeMap::new();
		for (jurisdiction, name) in keys {
			by_name.entry(name).or_default().insert(jurisdiction);
		}

		let mut result = Vec::new();
		for (name, jurisdictions) in by_name.into_iter() {
			if jurisdictions.len() < 2 {
				continue
			}
			let mut by_target: BTreeMap<CanonicalKey, Vec<Jurisdiction>> = BTreeMap::new();
			for j in jurisdictions.into_iter() {
				by_target.entry(self.resolve(j, name.clone())).or_default().push(j.clone());
			}
			for (key, jurisdictions) in by_target.into_iter() {
				if jurisdictions.len() >= 2 {
					result.push(Collision{
						name: name.clone(),
						key,
						jurisdictions,
					});
				}
			}
		}
		result
	}
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	pub name: CanonicalKey,
	pub key: CanonicalKey,
	pub jurisdictions: Vec<Jurisdiction>,
}

pub fn warn_collisions(collisions: &[Collision]) {
	for c in collisions.iter() {
		let js: Vec<&str> = c.jurisdictions.iter().map(|j| j.as_str()).collect();
		warn!("generic name {:?} resolves to {:?} in {} without a disambiguation entry", &*c.name, &*c.key, js.join(", "));
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn table() -> AmbiguityTable {
		let mut t = AmbiguityTable::new();
		t.insert("Manitoba", "Northern", "Northern Regional Health Authority", None);
		t.insert("BC", "Northern", "Northern Health", None);
		t.insert("NL", "Central", "Central Regional Health Authority", None);
		t.insert("Alberta", "Central", "Central Zone", None);
		t.insert("NL", "Eastern", "Eastern Regional Health Authority", Some("Eastern Regional Health Authority"));
		t.insert("Ontario", "Eastern", "The Eastern Ontario", None);
		t
	}

	#[test]
	fn resolution_is_keyed_on_jurisdiction() {
		let t = table();
		assert_eq!(&*t.resolve("Manitoba", "Northern".into()), "Northern Regional Health Authority");
		assert_eq!(&*t.resolve("BC", "Northern".into()), "Northern Health");
		assert_eq!(&*t.resolve("Saskatchewan", "Northern".into()), "Northern");
		assert_eq!(&*t.resolve("BC", "Fraser".into()), "Fraser");
	}

	#[test]
	fn known_collisions_resolve_to_distinct_keys() {
		let t = table();
		let pairs = [
			("Northern", ["Manitoba", "BC"]),
			("Central", ["NL", "Alberta"]),
			("Eastern", ["NL", "Ontario"]),
		];
		for (name, js) in pairs.iter() {
			let a = t.resolve(js[0], (*name).into());
			let b = t.resolve(js[1], (*name).into());
			assert_ne!(a, b, "{} collides", name);
		}
	}

	#[test]
	fn display_override_is_optional() {
		let t = table();
		assert_eq!(t.display("NL", "Eastern"), Some("Eastern Regional Health Authority"));
		assert_eq!(t.display("Ontario", "Eastern"), None);
		assert_eq!(t.display("Yukon", "Eastern"), None);
	}

	#[test]
	fn single_unresolved_jurisdiction_is_not_a_collision() {
		let t = table();
		let keys: Vec<RegionKey> = vec![
			("NL".into(), "Central".into()),
			("Alberta".into(), "Central".into()),
			("Saskatchewan".into(), "Central".into()),
		];
		assert!(t.find_collisions(keys.iter()).is_empty());
	}

	#[test]
	fn unresolved_generic_names_are_flagged() {
		let t = table();
		let keys: Vec<RegionKey> = vec![
			("Alberta".into(), "South".into()),
			("Saskatchewan".into(), "South".into()),
			("Saskatchewan".into(), "South".into()),
			("BC".into(), "Fraser".into()),
		];
		let collisions = t.find_collisions(keys.iter());
		assert_eq!(collisions.len(), 1);
		assert_eq!(&*collisions[0].name, "South");
		assert_eq!(collisions[0].jurisdictions.iter().map(|j| j.as_str()).collect::<Vec<_>>(), vec!["Alberta", "Saskatchewan"]);
	}

	#[test]
	fn table_loads_from_specs() {
		let specs: Vec<AmbiguitySpec> = serde_json::from_str(r#"[
			{"jurisdiction": "Alberta", "name": "North", "key": "North Zone"},
			{"jurisdiction": "NL", "name": "Western", "key": "Western Regional Health Authority"}
		]"#).unwrap();
		let t = AmbiguityTable::from_specs(&specs);
		assert_eq!(t.len(), 2);
		assert!(t.contains("Alberta", "North"));
		assert!(!t.contains("Saskatchewan", "North"));
	}
}

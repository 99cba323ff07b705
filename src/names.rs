use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use smartstring::alias::{String as SmartString};


pub type Jurisdiction = SmartString;

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(pub SmartString);

impl Deref for CanonicalKey {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl fmt::Display for CanonicalKey {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for CanonicalKey {
	fn from(other: &str) -> Self {
		Self(other.into())
	}
}

impl From<String> for CanonicalKey {
	fn from(other: String) -> Self {
		Self(other.into())
	}
}

impl From<CanonicalKey> for String {
	fn from(other: CanonicalKey) -> Self {
		other.0.into()
	}
}

pub type RegionKey = (Jurisdiction, CanonicalKey);


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct JurisdictionAliases {
	aliases: HashMap<String, Jurisdiction>,
}

impl JurisdictionAliases {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert<A: Into<String>, J: Into<Jurisdiction>>(&mut self, alias: A, canonical: J) {
		self.aliases.insert(alias.into(), canonical.into());
	}

	pub fn canonical(&self, raw: &str) -> Jurisdiction {
		let raw = raw.trim();
		match self.aliases.get(raw) {
			Some(j) => j.clone(),
			None => raw.into(),
		}
	}

	pub fn len(&self) -> usize {
		self.aliases.len()
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aliases_map_to_case_dataset_spelling() {
		let mut aliases = JurisdictionAliases::new();
		aliases.insert("B.C.", "BC");
		aliases.insert("59", "BC");
		assert_eq!(aliases.canonical("B.C.").as_str(), "BC");
		assert_eq!(aliases.canonical(" 59 ").as_str(), "BC");
		assert_eq!(aliases.canonical("Ontario").as_str(), "Ontario");
	}

	#[test]
	fn canonical_key_derefs_to_str() {
		let k = CanonicalKey::from("Toronto");
		assert_eq!(&*k, "Toronto");
		assert_eq!(k.to_string(), "Toronto");
	}

	#[test]
	fn heap_allocated_keys_survive_conversion() {
		let long = "Kingston Frontenac Lennox & Addington";
		assert!(long.len() > 23);
		let k = CanonicalKey::from(String::from(long));
		assert_eq!(&*k, long);
		assert_eq!(String::from(k.clone()), long);
		let region: RegionKey = ("Ontario".into(), k);
		assert_eq!(region.1.to_string(), long);

		let mut aliases = JurisdictionAliases::new();
		aliases.insert("NL", "Newfoundland and Labrador Province");
		assert_eq!(aliases.canonical("NL").as_str(), "Newfoundland and Labrador Province");
	}
}

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;


// a list, or one ", " separated string as in the concordance sheet
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeywordList {
	List(Vec<String>),
	Joined(String),
}

impl KeywordList {
	fn into_vec(self) -> Vec<String> {
		match self {
			Self::List(v) => v,
			Self::Joined(s) => s.split(", ").map(|s| s.to_string()).collect(),
		}
	}
}

pub type KeywordDictionary = BTreeMap<String, KeywordList>;


#[derive(Debug, Clone, Default)]
pub struct KeywordTagger {
	categories: Vec<(String, Vec<String>)>,
}

impl KeywordTagger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_dictionary(dict: &KeywordDictionary) -> Self {
		let mut result = Self::new();
		for (category, keywords) in dict.iter() {
			result.insert(category, keywords.clone().into_vec());
		}
		result
	}

	pub fn insert<C: Into<String>, I: IntoIterator<Item = S>, S: AsRef<str>>(&mut self, category: C, keywords: I) {
		let keywords = keywords.into_iter()
			.map(|k| k.as_ref().trim().to_lowercase())
			// an empty keyword would match everything
			.filter(|k| k.len() > 0)
			.collect();
		self.categories.push((category.into(), keywords));
	}

	pub fn len(&self) -> usize {
		self.categories.len()
	}

	pub fn tag(&self, text: Option<&str>) -> BTreeSet<&str> {
		let mut result = BTreeSet::new();
		let text = match text {
			Some(t) => t.to_lowercase(),
			None => return result,
		};
		for (category, keywords) in self.categories.iter() {
			if keywords.iter().any(|k| text.contains(k.as_str())) {
				result.insert(category.as_str());
			}
		}
		result
	}

	pub fn tag_joined(&self, text: Option<&str>) -> Option<String> {
		let tags = self.tag(text);
		if tags.is_empty() {
			return None
		}
		Some(tags.into_iter().collect::<Vec<_>>().join(", "))
	}
}

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use log::{info, warn};

use serde::Deserialize;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
	Inner,
	Left,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDiagnostic<K: Ord> {
	pub left_unmatched: BTreeSet<K>,
	pub right_unmatched: BTreeSet<K>,
}

impl<K: Ord> MatchDiagnostic<K> {
	pub fn is_clean(&self) -> bool {
		self.left_unmatched.is_empty() && self.right_unmatched.is_empty()
	}

	pub fn swapped(self) -> Self {
		Self{
			left_unmatched: self.right_unmatched,
			right_unmatched: self.left_unmatched,
		}
	}
}


pub struct Joined<'l, 'r, L, R, K: Ord> {
	pub rows: Vec<(&'l L, Option<&'r R>)>,
	pub diagnostic: MatchDiagnostic<K>,
}

impl<'l, 'r, L, R, K: Ord> Joined<'l, 'r, L, R, K> {
	pub fn matched(&self) -> impl Iterator<Item = (&'l L, &'r R)> + '_ {
		self.rows.iter().filter_map(|(l, r)| r.map(|r| (*l, r)))
	}
}

// n rows on the left and m on the right sharing a key give n*m rows
pub fn join<'l, 'r, L, R, K, FL, FR>(
		left: &'l [L],
		right: &'r [R],
		kind: JoinKind,
		key_l: FL,
		key_r: FR,
) -> Joined<'l, 'r, L, R, K>
	where K: Hash + Eq + Ord + Clone,
	      FL: Fn(&L) -> K,
	      FR: Fn(&R) -> K
{
	let mut index: HashMap<K, Vec<&'r R>> = HashMap::new();
	for r in right.iter() {
		index.entry(key_r(r)).or_default().push(r);
	}

	let mut rows = Vec::with_capacity(left.len());
	let mut left_keys = HashSet::new();
	let mut left_unmatched = BTreeSet::new();
	for l in left.iter() {
		let k = key_l(l);
		match index.get(&k) {
			Some(matches) => {
				for r in matches.iter() {
					rows.push((l, Some(*r)));
				}
			},
			None => {
				if kind == JoinKind::Left {
					rows.push((l, None));
				}
				left_unmatched.insert(k.clone());
			},
		}
		left_keys.insert(k);
	}

	let right_unmatched = index.into_iter()
		.map(|(k, _)| k)
		.filter(|k| !left_keys.contains(k))
		.collect();

	Joined{
		rows,
		diagnostic: MatchDiagnostic{
			left_unmatched,
			right_unmatched,
		},
	}
}


pub fn find_duplicates<T, K, F>(rows: &[T], key: F) -> Vec<K>
	where K: Hash + Eq + Clone,
	      F: Fn(&T) -> K
{
	let mut seen = HashSet::new();
	let mut reported = HashSet::new();
	let mut result = Vec::new();
	for row in rows.iter() {
		let k = key(row);
		if !seen.insert(k.clone()) && reported.insert(k.clone()) {
			result.push(k);
		}
	}
	result
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiagnosticPolicy {
	#[serde(default = "default_left_tolerance")]
	pub left_tolerance: usize,
	#[serde(default = "default_right_tolerance")]
	pub right_tolerance: usize,
}

fn default_left_tolerance() -> usize {
	1
}

fn default_right_tolerance() -> usize {
	3
}

impl Default for DiagnosticPolicy {
	fn default() -> Self {
		Self{
			left_tolerance: default_left_tolerance(),
			right_tolerance: default_right_tolerance(),
		}
	}
}

impl DiagnosticPolicy {
	pub fn exceeded<K: Ord>(&self, diag: &MatchDiagnostic<K>) -> bool {
		diag.left_unmatched.len() > self.left_tolerance || diag.right_unmatched.len() > self.right_tolerance
	}

	pub fn report<K: Ord + Debug>(&self, merge: &str, left: &str, right: &str, diag: &MatchDiagnostic<K>) -> bool {
		let exceeded = self.exceeded(diag);
		if exceeded {
			warn!("{}: {} keys missing from {}, {} keys missing from {}", merge, diag.right_unmatched.len(), left, diag.left_unmatched.len(), right);
			warn!("{}: only in {}: {:?}", merge, right, diag.right_unmatched);
			warn!("{}: only in {}: {:?}", merge, left, diag.left_unmatched);
		} else {
			info!("{}: {} unmatched in {}, {} unmatched in {} (within tolerance)", merge, diag.left_unmatched.len(), left, diag.right_unmatched.len(), right);
		}
		exceeded
	}
}

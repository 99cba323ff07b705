use std::collections::BTreeSet;
use std::io;

use geojson::Feature;

use log::{info, warn};

use serde::Deserialize;

use smartstring::alias::{String as SmartString};

use super::error::Result;
use super::geometry::MergedFeature;
use super::merge::{join, JoinKind, MatchDiagnostic};
use super::names::{JurisdictionAliases, RegionKey};
use super::normalize::Normalizer;
use super::resolve::AmbiguityTable;
use super::sources::RegionReference;


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationCentre {
	#[serde(rename = "POPCTRRAname")]
	pub name: SmartString,
	#[serde(rename = "Province")]
	pub province: SmartString,
	pub health_reg: SmartString,
	#[serde(rename = "POPCTRRApop_2016")]
	pub population: u64,
}

pub fn load_centres<R: io::Read>(r: R) -> Result<Vec<PopulationCentre>> {
	let mut r = csv::Reader::from_reader(r);
	let mut result = Vec::new();
	for row in r.deserialize::<PopulationCentre>() {
		result.push(row?);
	}
	Ok(result)
}

pub fn top_n(centres: &[PopulationCentre], n: usize) -> Vec<PopulationCentre> {
	let mut result = centres.to_vec();
	result.sort_by(|a, b| b.population.cmp(&a.population));
	result.truncate(n);
	result
}

pub fn centre_keys(
		centres: &[PopulationCentre],
		aliases: &JurisdictionAliases,
		normalizer: &Normalizer,
		ambiguities: &AmbiguityTable,
) -> Vec<RegionKey> {
	centres.iter().map(|c| {
		let jurisdiction = aliases.canonical(&c.province);
		let key = ambiguities.resolve(&jurisdiction, normalizer.normalize(&c.health_reg));
		(jurisdiction, key)
	}).collect()
}

pub fn reference(keys: &[RegionKey]) -> RegionReference {
	let set: BTreeSet<&RegionKey> = keys.iter().collect();
	set.into_iter().cloned().collect()
}


pub fn overlay(
		centres: &[PopulationCentre],
		keys: &[RegionKey],
		merged: &[MergedFeature],
) -> (Vec<Feature>, MatchDiagnostic<RegionKey>) {
	let keyed: Vec<(&PopulationCentre, &RegionKey)> = centres.iter().zip(keys.iter()).collect();
	let joined = join(&keyed[..], merged, JoinKind::Left, |(_, k)| (*k).clone(), |m| m.key.clone());

	let mut result = Vec::with_capacity(joined.rows.len());
	for ((centre, _), region) in joined.rows.iter() {
		let mut feature = match region {
			Some(m) => m.feature.clone(),
			None => Feature{
				bbox: None,
				geometry: None,
				id: None,
				properties: None,
				foreign_members: None,
			},
		};
		feature.set_property("POPCTRRAname", centre.name.as_str());
		feature.set_property("Province", centre.province.as_str());
		feature.set_property("health_reg", centre.health_reg.as_str());
		result.push(feature);
	}
	(result, joined.diagnostic)
}

pub fn check_retained(features: &[Feature], expected: usize) -> usize {
	let names: BTreeSet<String> = features.iter()
		.filter_map(|f| f.property("POPCTRRAname").and_then(|v| v.as_str()).map(|s| s.to_string()))
		.collect();
	if names.len() < expected {
		warn!("only retained {} population centres: {:?}", names.len(), names);
	} else {
		info!("retained {} population centres", names.len());
	}
	names.len()
}

use std::io;
use std::sync::Arc;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};

use log::debug;

use serde::Deserialize;

use smartstring::alias::{String as SmartString};

use super::cases::WeeklyCaseRecord;
use super::error::{Error, Result};
use super::names::{CanonicalKey, Jurisdiction, JurisdictionAliases, RegionKey};
use super::normalize::Normalizer;


#[derive(Debug, Clone, Deserialize)]
pub struct GeometrySchema {
	#[serde(default = "default_name_property")]
	pub name_property: String,
	#[serde(default = "default_jurisdiction_property")]
	pub jurisdiction_property: String,
	#[serde(default)]
	pub drop_properties: Vec<String>,
}

fn default_name_property() -> String {
	"ENGNAME".into()
}

fn default_jurisdiction_property() -> String {
	"PRUID".into()
}

impl Default for GeometrySchema {
	fn default() -> Self {
		Self{
			name_property: default_name_property(),
			jurisdiction_property: default_jurisdiction_property(),
			drop_properties: Vec::new(),
		}
	}
}


#[derive(Debug, Clone)]
pub struct RegionGeometry {
	pub jurisdiction: Jurisdiction,
	pub name: SmartString,
	pub key: CanonicalKey,
	pub geometry: Option<Geometry>,
	pub properties: JsonObject,
}

impl RegionGeometry {
	pub fn region_key(&self) -> RegionKey {
		(self.jurisdiction.clone(), self.key.clone())
	}
}


fn property_str(properties: &JsonObject, name: &str) -> Option<String> {
	match properties.get(name)? {
		JsonValue::String(s) => Some(s.clone()),
		JsonValue::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn read_collection<R: io::Read>(mut r: R) -> Result<FeatureCollection> {
	let mut s = String::new();
	r.read_to_string(&mut s)?;
	Ok(s.parse::<FeatureCollection>()?)
}

fn write_collection<W: io::Write>(mut w: W, features: Vec<Feature>) -> Result<()> {
	let collection: FeatureCollection = features.into_iter().collect();
	w.write_all(GeoJson::from(collection).to_string().as_bytes())?;
	Ok(())
}


pub fn load_regions<R: io::Read>(
		r: R,
		schema: &GeometrySchema,
		aliases: &JurisdictionAliases,
		normalizer: &Normalizer,
) -> Result<Vec<Arc<RegionGeometry>>> {
	let collection = read_collection(r)?;
	let mut result = Vec::with_capacity(collection.features.len());
	for (i, feature) in collection.features.into_iter().enumerate() {
		let mut properties = feature.properties.unwrap_or_default();
		let name = property_str(&properties, &schema.name_property).ok_or_else(|| Error::MissingProperty{
			feature: i,
			property: schema.name_property.clone(),
		})?;
		let jurisdiction = property_str(&properties, &schema.jurisdiction_property).ok_or_else(|| Error::MissingProperty{
			feature: i,
			property: schema.jurisdiction_property.clone(),
		})?;
		for p in schema.drop_properties.iter() {
			properties.remove(p);
		}
		result.push(Arc::new(RegionGeometry{
			jurisdiction: aliases.canonical(&jurisdiction),
			key: normalizer.normalize(&name),
			name: name.into(),
			geometry: feature.geometry,
			properties,
		}));
	}
	debug!("loaded {} region geometries", result.len());
	Ok(result)
}


pub struct MergedRecord<'a> {
	pub case: &'a WeeklyCaseRecord,
	pub key: &'a CanonicalKey,
	pub region: &'a RegionGeometry,
}

impl<'a> MergedRecord<'a> {
	pub fn to_feature(&self) -> Feature {
		let mut properties = self.region.properties.clone();
		properties.insert("province".into(), self.case.province.as_str().into());
		properties.insert("health_region".into(), self.case.health_region.as_str().into());
		properties.insert("clean_name".into(), self.key.to_string().into());
		properties.insert("date_report".into(), self.case.date_report.to_string().into());
		properties.insert("cases".into(), self.case.cases.into());
		Feature{
			bbox: None,
			geometry: self.region.geometry.clone(),
			id: None,
			properties: Some(properties),
			foreign_members: None,
		}
	}
}

pub fn write_merged<W: io::Write>(w: W, records: &[MergedRecord]) -> Result<()> {
	write_collection(w, records.iter().map(|r| r.to_feature()).collect())
}


#[derive(Debug, Clone)]
pub struct MergedFeature {
	pub key: RegionKey,
	pub feature: Feature,
}

pub fn load_merged<R: io::Read>(r: R) -> Result<Vec<MergedFeature>> {
	let collection = read_collection(r)?;
	let mut result = Vec::with_capacity(collection.features.len());
	for (i, feature) in collection.features.into_iter().enumerate() {
		let (province, clean_name) = {
			let properties = feature.properties.as_ref();
			let get = |name: &str| properties.and_then(|p| property_str(p, name)).ok_or_else(|| Error::MissingProperty{
				feature: i,
				property: name.into(),
			});
			(get("province")?, get("clean_name")?)
		};
		result.push(MergedFeature{
			key: (province.into(), clean_name.into()),
			feature,
		});
	}
	Ok(result)
}

pub fn write_features<W: io::Write>(w: W, features: Vec<Feature>) -> Result<()> {
	write_collection(w, features)
}


#[cfg(test)]
mod tests {
	use super::*;

	use chrono::NaiveDate;

	use crate::normalize::{MatchMode, RuleSetSpec, RuleSpec};

	static BOUNDARIES: &'static str = r#"{
		"type": "FeatureCollection",
		"features": [
			{"type": "Feature", "geometry": {"type": "Point", "coordinates": [-79.4, 43.7]},
			 "properties": {"ENGNAME": "City of Toronto Health Unit", "PRUID": 35, "TotalPop20": 2900000}},
			{"type": "Feature", "geometry": null,
			 "properties": {"ENGNAME": "Fraser Health", "PRUID": "59", "TotalPop20": 1900000}}
		]
	}"#;

	fn normalizer() -> Normalizer {
		Normalizer::compile("boundaries", &RuleSetSpec{
			rules: vec![
				RuleSpec::strip(MatchMode::Literal, " Health Unit"),
				RuleSpec::strip(MatchMode::Literal, "City of "),
				RuleSpec::rename("Fraser Health", "Fraser"),
			],
			..Default::default()
		}).unwrap()
	}

	fn aliases() -> JurisdictionAliases {
		let mut a = JurisdictionAliases::new();
		a.insert("35", "Ontario");
		a.insert("59", "BC");
		a
	}

	fn schema() -> GeometrySchema {
		GeometrySchema{
			drop_properties: vec!["TotalPop20".into()],
			..Default::default()
		}
	}

	#[test]
	fn regions_are_normalized_on_load() {
		let regions = load_regions(BOUNDARIES.as_bytes(), &schema(), &aliases(), &normalizer()).unwrap();
		assert_eq!(regions.len(), 2);
		assert_eq!(regions[0].region_key(), ("Ontario".into(), "Toronto".into()));
		assert_eq!(regions[1].region_key(), ("BC".into(), "Fraser".into()));
		assert!(regions[0].geometry.is_some());
		assert!(regions[1].geometry.is_none());
		assert!(!regions[0].properties.contains_key("TotalPop20"));
		assert!(regions[0].properties.contains_key("ENGNAME"));
	}

	#[test]
	fn missing_name_is_an_error() {
		let data = r#"{"type": "FeatureCollection", "features": [
			{"type": "Feature", "geometry": null, "properties": {"PRUID": 35}}
		]}"#;
		match load_regions(data.as_bytes(), &schema(), &aliases(), &normalizer()) {
			Err(Error::MissingProperty{feature: 0, property}) => assert_eq!(property, "ENGNAME"),
			other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
		}
	}

	#[test]
	fn merged_features_read_back() {
		let regions = load_regions(BOUNDARIES.as_bytes(), &schema(), &aliases(), &normalizer()).unwrap();
		let case = WeeklyCaseRecord{
			province: "Ontario".into(),
			health_region: "Toronto".into(),
			date_report: NaiveDate::from_ymd_opt(2020, 7, 27).unwrap(),
			cases: 15,
		};
		let records = vec![MergedRecord{
			case: &case,
			key: &regions[0].key,
			region: &regions[0],
		}];
		let mut buf = Vec::new();
		write_merged(&mut buf, &records).unwrap();

		let merged = load_merged(&buf[..]).unwrap();
		assert_eq!(merged.len(), 1);
		assert_eq!(merged[0].key, ("Ontario".into(), "Toronto".into()));
		let props = merged[0].feature.properties.as_ref().unwrap();
		assert_eq!(props.get("cases"), Some(&JsonValue::from(15)));
		assert_eq!(props.get("date_report"), Some(&JsonValue::from("2020-07-27")));
		assert!(merged[0].feature.geometry.is_some());
	}
}

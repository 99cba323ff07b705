use std::fmt;
use std::io;


#[derive(Debug)]
pub enum Error {
	Io(io::Error),
	Csv(csv::Error),
	Request(reqwest::Error),
	Json(serde_json::Error),
	Workbook(calamine::Error),
	GeoJson(geojson::Error),
	Pattern(regex::Error),
	Date(chrono::ParseError),
	Config(String),
	MissingProperty{feature: usize, property: String},
	DuplicateKey{jurisdiction: String, key: String, date: chrono::NaiveDate},
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Io(e) => fmt::Display::fmt(e, f),
			Self::Csv(e) => fmt::Display::fmt(e, f),
			Self::Request(e) => fmt::Display::fmt(e, f),
			Self::Json(e) => write!(f, "invalid json: {}", e),
			Self::Workbook(e) => write!(f, "failed to read workbook: {}", e),
			Self::GeoJson(e) => write!(f, "invalid geojson: {}", e),
			Self::Pattern(e) => write!(f, "invalid rewrite pattern: {}", e),
			Self::Date(e) => write!(f, "invalid date: {}", e),
			Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
			Self::MissingProperty{feature, property} => write!(f, "feature #{} has no usable property {:?}", feature, property),
			Self::DuplicateKey{jurisdiction, key, date} => write!(f, "case data is not one-to-one: ({}, {}) appears more than once for {}", jurisdiction, key, date),
		}
	}
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
	fn from(other: io::Error) -> Self {
		Self::Io(other)
	}
}

impl From<csv::Error> for Error {
	fn from(other: csv::Error) -> Self {
		Self::Csv(other)
	}
}

impl From<reqwest::Error> for Error {
	fn from(other: reqwest::Error) -> Self {
		Self::Request(other)
	}
}

impl From<serde_json::Error> for Error {
	fn from(other: serde_json::Error) -> Self {
		Self::Json(other)
	}
}

impl From<calamine::Error> for Error {
	fn from(other: calamine::Error) -> Self {
		Self::Workbook(other)
	}
}

impl From<geojson::Error> for Error {
	fn from(other: geojson::Error) -> Self {
		Self::GeoJson(other)
	}
}

impl From<regex::Error> for Error {
	fn from(other: regex::Error) -> Self {
		Self::Pattern(other)
	}
}

impl From<chrono::ParseError> for Error {
	fn from(other: chrono::ParseError) -> Self {
		Self::Date(other)
	}
}

impl From<tempfile::PersistError> for Error {
	fn from(other: tempfile::PersistError) -> Self {
		Self::Io(other.error)
	}
}

pub type Result<T> = std::result::Result<T, Error>;

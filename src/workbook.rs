use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};

use log::debug;

use serde::de::DeserializeOwned;

use super::error::{Error, Result};
use super::ioutil::magic_open;


#[derive(Debug, Clone)]
pub struct Sheet {
	headers: csv::StringRecord,
	rows: Vec<csv::StringRecord>,
}

fn clean_header(s: &str) -> String {
	s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn cell_text(cell: &Data) -> String {
	match cell {
		Data::Empty => String::new(),
		Data::String(s) => s.trim().to_string(),
		Data::Int(i) => i.to_string(),
		Data::Float(f) => {
			if f.fract() == 0.0 && f.abs() < 1e15 {
				(*f as i64).to_string()
			} else {
				f.to_string()
			}
		},
		Data::Bool(b) => b.to_string(),
		Data::DateTime(_) => match cell.as_date() {
			Some(d) => d.format("%Y-%m-%d").to_string(),
			None => String::new(),
		},
		Data::DateTimeIso(s) => match s.split('T').next() {
			Some(d) => d.to_string(),
			None => s.clone(),
		},
		Data::DurationIso(s) => s.clone(),
		Data::Error(e) => {
			debug!("treating cell error {:?} as empty", e);
			String::new()
		},
	}
}

impl Sheet {
	pub fn from_rows<I: IntoIterator<Item = Vec<String>>>(rows: I) -> Result<Self> {
		let mut rows = rows.into_iter();
		let headers = match rows.next() {
			Some(h) => h,
			None => return Err(Error::Config("sheet has no header row".into())),
		};
		let headers: csv::StringRecord = headers.iter().map(|h| clean_header(h)).collect();
		let rows = rows
			.filter(|r| r.iter().any(|c| c.len() > 0))
			.map(|r| r.into_iter().collect())
			.collect();
		Ok(Self{
			headers,
			rows,
		})
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
		let mut result = Vec::with_capacity(self.rows.len());
		for row in self.rows.iter() {
			result.push(row.deserialize(Some(&self.headers))?);
		}
		Ok(result)
	}
}

fn is_csv(path: &Path) -> bool {
	let name = path.to_string_lossy();
	name.ends_with(".csv") || name.ends_with(".csv.gz")
}

// a tab exported to CSV stands in for the whole workbook, `sheet` is ignored
fn read_csv_sheet(path: &Path, skip_rows: usize) -> Result<Sheet> {
	let mut r = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.from_reader(magic_open(path)?);
	let mut rows = Vec::new();
	for row in r.records().skip(skip_rows) {
		rows.push(row?.iter().map(|c| c.trim().to_string()).collect::<Vec<_>>());
	}
	debug!("{}: {} rows", path.display(), rows.len());
	Sheet::from_rows(rows)
}

pub fn read_sheet<P: AsRef<Path>>(path: P, sheet: &str, skip_rows: usize) -> Result<Sheet> {
	let path = path.as_ref();
	if is_csv(path) {
		return read_csv_sheet(path, skip_rows)
	}
	let mut workbook = open_workbook_auto(path)?;
	let range = workbook.worksheet_range(sheet)?;
	debug!("{}: sheet {:?} has {} rows", path.display(), sheet, range.height());
	Sheet::from_rows(range.rows().skip(skip_rows).map(|row| row.iter().map(cell_text).collect::<Vec<_>>()))
}

use std::io;
use std::io::Read;
use std::time::Duration;

use bytes::Bytes;

use log::{debug, info};

use reqwest;

use super::error::Result;
use super::ioutil::magic_open;


static USER_AGENT: &'static str = concat!("covidtimeline/", env!("CARGO_PKG_VERSION"));


pub fn is_remote(location: &str) -> bool {
	location.starts_with("https://") || location.starts_with("http://")
}

pub fn fetch(url: &str) -> Result<Bytes> {
	let client = reqwest::blocking::Client::builder()
		.user_agent(USER_AGENT)
		.timeout(Duration::from_secs(300))
		.build()?;
	info!("downloading {} ...", url);
	let resp = client.get(url).send()?.error_for_status()?;
	let body = resp.bytes()?;
	debug!("received {} bytes from {}", body.len(), url);
	Ok(body)
}

pub fn open_source(location: &str) -> Result<Box<dyn Read>> {
	if is_remote(location) {
		let body = fetch(location)?;
		Ok(Box::new(io::Cursor::new(body)))
	} else {
		Ok(magic_open(location)?)
	}
}

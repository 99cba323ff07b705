use std::io;
use std::io::{Read, Write};
use std::fs;
use std::path::Path;

use flate2;

use tempfile::NamedTempFile;

use super::error::Result;


fn is_gzip(path: &Path) -> bool {
	match path.extension() {
		Some(x) => x == "gz",
		None => false,
	}
}

pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	if is_gzip(path) {
		Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
	} else {
		Ok(Box::new(fs::File::open(path)?))
	}
}

// .gz targets are compressed
pub fn write_atomic<P, F>(path: P, f: F) -> Result<()>
	where P: AsRef<Path>,
	      F: FnOnce(&mut dyn Write) -> Result<()>
{
	let path = path.as_ref();
	let dir = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	fs::create_dir_all(dir)?;
	let mut tmp = NamedTempFile::new_in(dir)?;
	if is_gzip(path) {
		let mut w = flate2::write::GzEncoder::new(tmp.as_file_mut(), flate2::Compression::best());
		f(&mut w)?;
		w.finish()?;
	} else {
		let mut w = io::BufWriter::new(tmp.as_file_mut());
		f(&mut w)?;
		w.flush()?;
	}
	tmp.as_file().sync_all()?;
	tmp.persist(path)?;
	Ok(())
}


#[cfg(test)]
mod tests {
	use super::*;

	use crate::error::Error;

	#[test]
	fn atomic_write_replaces_existing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.csv");
		fs::write(&path, "old").unwrap();
		write_atomic(&path, |w| {
			w.write_all(b"new")?;
			Ok(())
		}).unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "new");
	}

	#[test]
	fn failed_write_leaves_target_untouched() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.csv");
		fs::write(&path, "old").unwrap();
		let result = write_atomic(&path, |w| {
			w.write_all(b"partial")?;
			Err(Error::Config("boom".into()))
		});
		assert!(result.is_err());
		assert_eq!(fs::read_to_string(&path).unwrap(), "old");
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
	}

	#[test]
	fn gzip_roundtrip_through_magic_open() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("sub").join("out.csv.gz");
		write_atomic(&path, |w| {
			w.write_all(b"a,b\n1,2\n")?;
			Ok(())
		}).unwrap();
		let mut s = String::new();
		magic_open(&path).unwrap().read_to_string(&mut s).unwrap();
		assert_eq!(s, "a,b\n1,2\n");
	}
}

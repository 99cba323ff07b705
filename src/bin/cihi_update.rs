fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cutoff = match covidtimeline::date_from_args(std::env::args()) {
		Some(date) => date?,
		None => {
			eprintln!("usage: cihi_update <final date of the previous release, YYYY-MM-DD>");
			std::process::exit(2);
		},
	};
	let cfg = covidtimeline::init_stage()?;
	let n = covidtimeline::pipeline::cihi_update(&cfg, cutoff)?;
	println!("wrote {} entries to {}, validate it by hand", n, cfg.paths.cihi_output.display());
	Ok(())
}

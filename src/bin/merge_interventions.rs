fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cfg = covidtimeline::init_stage()?;
	let n = covidtimeline::pipeline::merge_interventions(&cfg)?;
	println!("wrote {} interventions to {}", n, cfg.paths.interventions.display());
	Ok(())
}

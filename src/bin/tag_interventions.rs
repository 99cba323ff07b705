fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cfg = covidtimeline::init_stage()?;
	let path = covidtimeline::pipeline::tag_interventions(&cfg, covidtimeline::naive_today())?;
	println!("created {}", path.display());
	Ok(())
}

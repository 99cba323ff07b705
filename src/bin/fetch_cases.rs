fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cfg = covidtimeline::init_stage()?;
	let summary = covidtimeline::pipeline::collect_cases(&cfg, &mut *covidtimeline::default_output())?;
	println!("{} daily rows, {} weekly rows", summary.daily_rows, summary.weekly_rows);
	Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cfg = covidtimeline::init_stage()?;
	let summary = covidtimeline::pipeline::merge_regions(&cfg)?;
	println!(
		"{} merged rows; {} case keys and {} regions unmatched; {} unresolved generic names",
		summary.merged_rows,
		summary.unmatched_cases,
		summary.unmatched_regions,
		summary.collisions,
	);
	if summary.above_tolerance {
		println!("unmatched keys above tolerance, see the log for the lists");
	}
	Ok(())
}

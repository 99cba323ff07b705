use std::io;
use std::io::Write;
use std::time;

use log::info;


pub trait ProgressSink {
	fn update(&mut self, inow: usize, n: Option<usize>);
	fn finish(&mut self, inow: usize, n: Option<usize>);
}


pub struct TtyMeter {
	t0: time::Instant,
	tprev: time::Instant,
	iprev: usize,
}

impl TtyMeter {
	pub fn new() -> Self {
		let now = time::Instant::now();
		Self{
			t0: now,
			tprev: now,
			iprev: 0,
		}
	}

	fn print(&self, inow: usize, n: Option<usize>, rate: f64, end: &str) {
		match n {
			Some(n) if n > 0 => print!("{:6.0}% [{:8.2}/s]{}", (inow as f64) / (n as f64) * 100.0, rate, end),
			_ => print!("{:12} [{:8.2}/s]{}", inow, rate, end),
		}
		// nothing sensible to do if the terminal went away
		let _ = io::stdout().flush();
	}
}

impl ProgressSink for TtyMeter {
	fn update(&mut self, inow: usize, n: Option<usize>) {
		let now = time::Instant::now();
		let dt = (now - self.tprev).as_secs_f64().max(1e-9);
		let rate = inow.saturating_sub(self.iprev) as f64 / dt;
		self.print(inow, n, rate, "\r");
		self.iprev = inow;
		self.tprev = now;
	}

	fn finish(&mut self, inow: usize, n: Option<usize>) {
		let dt = (time::Instant::now() - self.t0).as_secs_f64().max(1e-9);
		self.print(n.unwrap_or(inow), n, inow as f64 / dt, "\n");
	}
}


pub struct LogMeter {
	what: &'static str,
}

impl LogMeter {
	pub fn new(what: &'static str) -> Self {
		Self{what}
	}
}

impl ProgressSink for LogMeter {
	fn update(&mut self, _inow: usize, _n: Option<usize>) {}

	fn finish(&mut self, inow: usize, _n: Option<usize>) {
		info!("processed {} {}", inow, self.what);
	}
}


pub fn default_output() -> Box<dyn ProgressSink> {
	if isatty::stdout_isatty() {
		Box::new(TtyMeter::new())
	} else {
		Box::new(LogMeter::new("rows"))
	}
}


pub struct CountMeter<'s, S: ProgressSink + ?Sized> {
	sink: &'s mut S,
	every: usize,
	n: usize,
}

impl<'s, S: ProgressSink + ?Sized> CountMeter<'s, S> {
	pub fn new(sink: &'s mut S, every: usize) -> Self {
		Self{
			sink,
			every: every.max(1),
			n: 0,
		}
	}

	pub fn tick(&mut self) {
		self.n += 1;
		if self.n % self.every == 0 {
			self.sink.update(self.n, None);
		}
	}

	pub fn finish(self) -> usize {
		self.sink.finish(self.n, None);
		self.n
	}
}

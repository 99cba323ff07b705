use std::collections::HashMap;
use std::hash::Hash;
use std::ops::AddAssign;

use num_traits::Zero;

use chrono::{Datelike, Duration, NaiveDate, Weekday};


pub trait TimeSeriesKey: Hash + Eq + Clone + std::fmt::Debug {}
impl<T: Hash + Eq + Clone + std::fmt::Debug> TimeSeriesKey for T {}


// first `anchor` strictly after `date`
pub fn week_ending(date: NaiveDate, anchor: Weekday) -> NaiveDate {
	let offset = (7 + anchor.num_days_from_monday() as i64 - date.weekday().num_days_from_monday() as i64) % 7;
	let offset = if offset == 0 { 7 } else { offset };
	date + Duration::days(offset)
}


#[derive(Debug, Clone)]
pub struct TimeSeries<T: Hash + Eq, V: Copy> {
	start: NaiveDate,
	keys: HashMap<T, usize>,
	time_series: Vec<Vec<V>>,
	// first and last index which received a value, per series
	spans: Vec<(usize, usize)>,
	len: usize,
}

impl<T: Hash + Eq, V: Copy> TimeSeries<T, V> {
	pub fn new(start: NaiveDate, last: NaiveDate) -> Self {
		let len = (last - start).num_days().max(0) as usize;
		Self{
			start,
			len,
			keys: HashMap::new(),
			time_series: Vec::new(),
			spans: Vec::new(),
		}
	}

	#[inline(always)]
	pub fn date_index(&self, other: NaiveDate) -> Option<usize> {
		let days = (other - self.start).num_days();
		if days < 0 || days as usize >= self.len {
			return None
		}
		return Some(days as usize)
	}

	#[inline(always)]
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn keys(&self) -> std::collections::hash_map::Keys<'_, T, usize> {
		self.keys.keys()
	}
}

impl<T: TimeSeriesKey, V: Copy + Zero + AddAssign> TimeSeries<T, V> {
	fn get_index_or_create(&mut self, k: T) -> usize {
		match self.keys.get(&k) {
			Some(v) => *v,
			None => {
				let v = self.time_series.len();
				let mut vec = Vec::with_capacity(self.len);
				vec.resize(self.len, V::zero());
				self.time_series.push(vec);
				self.spans.push((usize::MAX, 0));
				self.keys.insert(k, v);
				v
			},
		}
	}

	pub fn add_at(&mut self, k: T, date: NaiveDate, v: V) -> bool {
		let i = match self.date_index(date) {
			Some(i) => i,
			None => return false,
		};
		let index = self.get_index_or_create(k);
		self.time_series[index][i] += v;
		let span = &mut self.spans[index];
		span.0 = span.0.min(i);
		span.1 = span.1.max(i);
		true
	}

	pub fn weekly(&self, k: &T, anchor: Weekday) -> Vec<(NaiveDate, V)> {
		let index = match self.keys.get(k) {
			Some(i) => *i,
			None => return Vec::new(),
		};
		let (first, last) = self.spans[index];
		if first > last {
			return Vec::new()
		}
		let vec = &self.time_series[index];
		let first_week = week_ending(self.start + Duration::days(first as i64), anchor);
		let last_week = week_ending(self.start + Duration::days(last as i64), anchor);

		let mut result = Vec::new();
		let mut week = first_week;
		while week <= last_week {
			let mut sum = V::zero();
			for date in (week - Duration::days(7)).iter_days().take(7) {
				if let Some(i) = self.date_index(date) {
					sum += vec[i];
				}
			}
			result.push((week, sum));
			week = week + Duration::days(7);
		}
		result
	}
}

//! # Raft leader election test cases
//!
//! This subproject provides integration tests for the leader election state machine.

#[macro_use]
extern crate log;
extern crate chrono;
extern crate env_logger;

pub mod cases;
mod steps;

use chrono::prelude::{DateTime, Local};
use std::io::Write;

pub fn init_logger() {
	let _ = env_logger::builder()
		.format(|buf, record| {
			let now: DateTime<Local> = Local::now();
			let now_str = now.format("%H:%M:%S.%3f").to_string();
			writeln!(buf, "{:5}: {} - {}", record.level(), now_str, record.args())
		})
		.try_init();
}

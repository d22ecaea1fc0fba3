pub mod calculator;
pub mod dates;
pub mod recompute;

pub mod streak_sweep;

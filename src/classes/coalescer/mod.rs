pub mod _coalescer_stats;
pub mod _latency_tracker;
pub mod _pending_table;
pub mod _write_coalescer;

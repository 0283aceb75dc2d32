pub mod _idle_scheduler;
pub mod _manual_scheduler;
pub mod _tokio_scheduler;

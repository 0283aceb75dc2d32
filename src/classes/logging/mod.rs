pub mod _logger;

pub mod _console;

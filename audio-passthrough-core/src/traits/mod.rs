pub mod activity;
pub mod diagnostic_sink;
pub mod sound_driver;

// Library for tests to access modules

pub mod codec;
pub mod config;
pub mod cursor;
pub mod db;
pub mod models;
pub mod profiler;
pub mod report;

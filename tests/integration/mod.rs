//! Integration tests for the inspector bridge

mod config_integration;
mod connection;
mod filtering;
mod profiling;
mod selection;
mod test_utils;

//! Integration tests for the frame tree aggregation protocol

mod config_integration;
mod live_view;
mod scenarios;

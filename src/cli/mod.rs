//! CLI module containing argument parsing and validation

pub mod args;

pub use args::{
    parse_args, parse_property, validate_args, validate_metric_keys, validate_server_url, Args,
};

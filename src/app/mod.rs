//! Application orchestration module

pub mod initialization;
pub mod execution;
pub mod repository;

pub use repository::resolve_repository_path;
pub use initialization::{
    load_configuration,
    configure_logging,
    resolve_run_settings,
    RunSettings
};
pub use execution::{
    execute,
    list_tags,
    run_extraction,
    select_tags
};

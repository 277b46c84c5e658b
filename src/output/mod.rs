//! Output formatting and export module

pub mod export;
pub mod reports;
pub mod summary;

pub use export::{export_run, series_to_csv};
pub use reports::{
    format_compact_table,
    format_control_limits,
    format_run_summary,
    format_tag_table
};
pub use summary::{control_limits, debt_summary, CategoryDebt, ControlLimits, DebtPoint};

//! Editor widgets.
//!
//! - [`option_widget`] — one control per effect option, soft-clamped numerics

mod option_widget;

pub use option_widget::{
    OptionResponse, SoftRange, commit_inline, format_number, option_widget,
};

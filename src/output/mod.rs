pub mod formatter;

pub use formatter::{
    format_breakdown, format_classification, format_distance, format_elapsed, format_legacy_tsv,
    format_link_detail, format_links_table, format_reports, format_validation, should_use_colors,
    NamedLink,
};

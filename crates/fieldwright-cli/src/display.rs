//! Table rendering for the field type taxonomy.

use fieldwright_core::{FieldType, FieldTypeInfo};

const TYPE_WIDTH: usize = 26;
const FORMAT_WIDTH: usize = 10;
const USAGE_WIDTH: usize = 12;

// ── Public API ──

/// Print every field type with its format family and usage.
pub fn print_types() {
    print!("{}", render_types());
}

pub fn render_types() -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<TYPE_WIDTH$} {:<FORMAT_WIDTH$} {:<USAGE_WIDTH$} DESCRIPTION\n",
        "TYPE", "FORMAT", "USAGE"
    ));
    for info in FieldType::ALL.iter().map(FieldType::info) {
        out.push_str(&format!(
            "{:<TYPE_WIDTH$} {:<FORMAT_WIDTH$} {:<USAGE_WIDTH$} {}\n",
            info.field_type.tag(),
            info.format.as_str(),
            usage(&info),
            info.description
        ));
    }
    out
}

// ── Helpers ──

fn usage(info: &FieldTypeInfo) -> &'static str {
    if info.requires_array_type {
        "needs item"
    } else if !info.field_type.is_top_level() {
        "item only"
    } else if info.field_type.is_array_item_eligible() {
        "field, item"
    } else {
        "field"
    }
}

//! Purpose: JSON serializer for table layout summaries printed by the CLI.
//! Exports: `layout_json`.
//! Role: Keep the `info` envelope shape in one place.
//! Invariants: Stable key names; additive-only.

use std::path::Path;

use serde_json::{Map, Value, json};
use slotcsv::api::Table;

pub(crate) fn layout_json(path: &Path, table: &Table) -> Value {
    let mut map = Map::new();
    map.insert("path".to_string(), json!(path.display().to_string()));
    map.insert("encoding".to_string(), json!(table.encoding()));
    map.insert("unit_width".to_string(), json!(table.unit_width()));
    map.insert("rows".to_string(), json!(table.row_count()));
    map.insert("columns".to_string(), json!(table.column_count()));
    map.insert("row_stride".to_string(), json!(table.row_stride()));
    map.insert(
        "max_column_slot_width".to_string(),
        json!(table.max_column_slot_width()),
    );
    map.insert(
        "column_slot_starts".to_string(),
        json!(table.column_slot_starts()),
    );
    if let Some(layout) = table.layout() {
        map.insert(
            "slot_widths".to_string(),
            json!(layout.slot_widths().collect::<Vec<_>>()),
        );
        map.insert("packed_bytes".to_string(), json!(layout.packed_len()));
    }
    map.insert("options".to_string(), json!(table.options()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::layout_json;
    use slotcsv::api::{Encoding, Table};
    use std::path::Path;

    #[test]
    fn layout_json_has_geometry_fields() {
        let mut table = Table::new(Encoding::Utf8);
        table
            .compute_sizes_from(&b"a,bb\nccc,d\n"[..])
            .expect("size");
        let value = layout_json(Path::new("data.csv"), &table);

        assert_eq!(value["path"], "data.csv");
        assert_eq!(value["encoding"], "utf8");
        assert_eq!(value["unit_width"], 8);
        assert_eq!(value["rows"], 2);
        assert_eq!(value["columns"], 2);
        assert_eq!(value["row_stride"], 7);
        assert_eq!(value["column_slot_starts"], serde_json::json!([0, 4, 7]));
        assert_eq!(value["slot_widths"], serde_json::json!([3, 2]));
        assert_eq!(value["packed_bytes"], 15);
        assert_eq!(value["options"]["quoted_newlines"], "content");
    }
}

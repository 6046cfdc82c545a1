//! Purpose: Library crate backing the `slotcsv` CLI: CSV into a fixed-stride in-memory table.
//! Exports: `api` (stable surface), `core` (scanner, packer, layout, table, errors).
//! Role: Two-pass engine; pass 1 sizes every slot, pass 2 packs values or dispatches them.
//! Invariants: Cell access is pure arithmetic over one contiguous buffer.
//! Invariants: Core modules take explicit inputs (options, readers) and keep no global state.
pub mod api;
pub mod core;

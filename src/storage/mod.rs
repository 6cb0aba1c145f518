pub mod csv_store;
pub mod layout;

pub use csv_store::{CsvRow, find_batches, read_rows_from_path, write_batch, write_rows_to_path};
pub use layout::OutputLayout;

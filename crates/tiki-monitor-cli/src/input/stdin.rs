use std::io::{self, Read};

use tiki_monitor_core::dataset::loader::load_products;
use tiki_monitor_core::dataset::ProductTable;

/// Attempt to read a product CSV from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin_table() -> Result<Option<ProductTable>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }

    let table = load_products(buffer.as_bytes())?;
    log::debug!("read {} product rows from stdin", table.len());
    Ok(Some(table))
}

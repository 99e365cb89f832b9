//! Utility functions used in all other hemisym modules.

use std::path::Path;

/// Check whether the file extension ends with ".gz" or ".mgz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| {
            let name = a.to_string_lossy();
            name.ends_with(".gz") || name.ends_with(".mgz")
        })
        .unwrap_or(false)
}


/// Format a float so that parsing it back yields the identical value. Unlike `Display`, whole numbers keep their
/// decimal point (`1.0`, not `1`), which lets a reader tell float columns from integer ones.
pub fn format_float(v: f64) -> String {
    format!("{:?}", v)
}

mod entry;

pub use entry::{parse_desktop_entry, parse_desktop_file, DesktopEntry};

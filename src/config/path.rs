//! Module for searching for xinput-gadget config files

use std::{
    fs::{self, DirEntry},
    path::PathBuf,
};

/// Base system fallback path to use if one cannot be found with XDG
const FALLBACK_BASE_PATH: &str = "/usr/share/xinput-gadget";

/// Returns the base path for configuration data
pub fn get_base_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("xinput-gadget") else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_BASE_PATH);
    };

    // Get the data directories in preference order
    let data_dirs = base_dirs.get_data_dirs();
    for dir in data_dirs {
        if dir.exists() {
            return dir;
        }
    }

    log::warn!("Config base path not found. Using fallback path.");
    PathBuf::from(FALLBACK_BASE_PATH)
}

/// Returns a list of directories in load order to find device configurations.
/// E.g. ["/etc/xinput-gadget/devices.d", "/usr/share/xinput-gadget/devices"]
pub fn get_devices_paths() -> Vec<PathBuf> {
    let paths = vec![
        PathBuf::from("./rootfs/usr/share/xinput-gadget/devices"),
        PathBuf::from("/etc/xinput-gadget/devices.d"),
        get_base_path().join("devices"),
    ];

    paths
}

/// Returns the directory generated JSON schemas are written to
pub fn get_schema_path() -> PathBuf {
    PathBuf::from("./rootfs/usr/share/xinput-gadget/schema")
}

/// Returns a list of file paths for the given directories sorted by filename across
/// all given directories. The filter argument is a closure that should return
/// `true` for any files that should be included in the final results.
pub fn get_multidir_sorted_files<F>(paths: &[PathBuf], filter: F) -> Vec<PathBuf>
where
    F: Fn(&DirEntry) -> bool,
{
    // Look for files in the given locations
    let mut file_entries: Vec<DirEntry> = paths
        .iter()
        .flat_map(|path| {
            log::trace!("Checking {path:?} for files");
            let files = match fs::read_dir(path) {
                Ok(files) => files,
                Err(e) => {
                    log::debug!("Unable to read directory: {path:?}: {e}");
                    return vec![];
                }
            };
            files
                .filter_map(|r| {
                    let Ok(entry) = r else { return None };
                    filter(&entry).then_some(entry)
                })
                .collect()
        })
        .collect();

    // Sort by name, then by the priority of the directory the file was found in
    file_entries.sort_by_key(|entry| {
        let priority = entry
            .path()
            .parent()
            .and_then(|dir| {
                paths
                    .iter()
                    .position(|base_path| base_path.as_os_str() == dir.as_os_str())
            })
            .unwrap_or(paths.len());
        (entry.file_name(), priority)
    });
    log::trace!("Got sorted entries: {file_entries:?}");

    file_entries.into_iter().map(|entry| entry.path()).collect()
}

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug)]
pub struct SourceFile {
    pub file_path: PathBuf,
    pub name: String,
    pub size: u64,
}

/// A local directory and everything below it, children sorted by name.
#[derive(Clone, Debug, Default)]
pub struct LocalDir {
    pub name: String,
    pub files: Vec<SourceFile>,
    pub dirs: Vec<LocalDir>,
}

impl LocalDir {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum::<u64>()
            + self.dirs.iter().map(LocalDir::total_size).sum::<u64>()
    }

    pub fn file_count(&self) -> usize {
        self.files.len() + self.dirs.iter().map(LocalDir::file_count).sum::<usize>()
    }
}

/// Walks `root`. Any unreadable entry, or a name that is not valid UTF-8,
/// fails the whole scan.
pub fn scan_tree(root: &Path) -> io::Result<LocalDir> {
    scan_dir(root, String::new())
}

fn scan_dir(path: &Path, name: String) -> io::Result<LocalDir> {
    let mut dir = LocalDir {
        name,
        ..LocalDir::default()
    };

    let mut entries = fs::read_dir(path)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        // follows symlinks, like a plain copy would
        let metadata = fs::metadata(&path)?;
        if metadata.is_dir() {
            let name = file_name(&path)?;
            dir.dirs.push(scan_dir(&path, name)?);
        } else if metadata.is_file() {
            dir.files.push(SourceFile {
                name: file_name(&path)?,
                file_path: path,
                size: metadata.len(),
            });
        }
    }

    Ok(dir)
}

pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

// remote names must round-trip exactly
fn file_name(path: &Path) -> io::Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("file name is not valid UTF-8: {}", path.display()),
        )),
    }
}

use std::{fs, io, path::Path};

use console::style;

use crate::BROOM;

/// Disposes of the local build output once it has been deployed.
pub trait Cleanup {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Deletes the build output from disk.
pub struct RemoveBuildDir;

impl Cleanup for RemoveBuildDir {
    fn remove(&self, path: &Path) -> io::Result<()> {
        remove_build_dir(path)
    }
}

/// Removes the local build output. A path that does not exist is left alone.
pub fn remove_build_dir(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    println!(
        "{} {} Deleting {} ...",
        style("[3/3]").bold().dim(),
        BROOM,
        path.display()
    );
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    println!("{}", style("Build folder deleted.").green());

    Ok(())
}

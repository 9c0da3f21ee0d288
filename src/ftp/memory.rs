//! In-memory remote used by tests. Clones share the same file system, so a
//! test can keep one handle while the code under test owns another.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    io::Read,
    rc::Rc,
};

use super::{RemoteEntry, RemoteFs};
use crate::error::RemoteError;

#[derive(Default)]
struct State {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    cwd: String,
    closes: usize,
    rejected_upload: Option<String>,
}

#[derive(Clone)]
pub struct MemoryRemote {
    state: Rc<RefCell<State>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let mut state = State {
            cwd: "/".to_string(),
            ..State::default()
        };
        state.dirs.insert("/".to_string());
        MemoryRemote {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn add_dir(&self, path: &str) {
        let path = normalize(path);
        let mut state = self.state.borrow_mut();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            state.dirs.insert(current.clone());
        }
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        let path = normalize(path);
        self.add_dir(&parent(&path));
        self.state
            .borrow_mut()
            .files
            .insert(path, content.to_vec());
    }

    pub fn reject_uploads_named(&self, name: &str) {
        self.state.borrow_mut().rejected_upload = Some(name.to_string());
    }

    pub fn cwd(&self) -> String {
        self.state.borrow().cwd.clone()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.borrow().dirs.contains(&normalize(path))
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.state.borrow().files.contains_key(&normalize(path))
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.borrow().files.get(&normalize(path)).cloned()
    }

    /// Every file and directory strictly below `path`.
    pub fn paths_under(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", normalize(path).trim_end_matches('/'));
        let state = self.state.borrow();
        state
            .dirs
            .iter()
            .chain(state.files.keys())
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.state.borrow().closes
    }

    fn resolve(&self, name: &str) -> String {
        if name.starts_with('/') {
            normalize(name)
        } else {
            normalize(&format!("{}/{}", self.state.borrow().cwd, name))
        }
    }
}

fn rejected(message: String) -> RemoteError {
    RemoteError::Protocol(message)
}

fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent(path: &str) -> String {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((prefix, _)) => prefix.to_string(),
    }
}

impl RemoteFs for MemoryRemote {
    fn make_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        let path = self.resolve(name);
        let mut state = self.state.borrow_mut();
        if state.dirs.contains(&path) || state.files.contains_key(&path) {
            return Err(rejected(format!("550 {}: File exists", path)));
        }
        if !state.dirs.contains(&parent(&path)) {
            return Err(rejected(format!("550 {}: No such file or directory", path)));
        }
        state.dirs.insert(path);
        Ok(())
    }

    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let path = self.resolve(path);
        let mut state = self.state.borrow_mut();
        if !state.dirs.contains(&path) {
            return Err(rejected(format!("550 {}: No such file or directory", path)));
        }
        state.cwd = path;
        Ok(())
    }

    fn parent_dir(&mut self) -> Result<(), RemoteError> {
        let up = self.resolve("..");
        self.state.borrow_mut().cwd = up;
        Ok(())
    }

    fn list_dir(&mut self) -> Result<Vec<RemoteEntry>, RemoteError> {
        let state = self.state.borrow();
        let dirs = state
            .dirs
            .iter()
            .filter(|p| p.as_str() != "/" && parent(p) == state.cwd)
            .map(|p| (p, true));
        let files = state
            .files
            .keys()
            .filter(|p| parent(p) == state.cwd)
            .map(|p| (p, false));

        Ok(dirs
            .chain(files)
            .map(|(path, is_dir)| RemoteEntry {
                name: path.rsplit('/').next().unwrap_or_default().to_string(),
                is_dir,
            })
            .collect())
    }

    fn remove_file(&mut self, name: &str) -> Result<(), RemoteError> {
        let path = self.resolve(name);
        match self.state.borrow_mut().files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(rejected(format!("550 {}: No such file", path))),
        }
    }

    fn remove_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        let path = self.resolve(name);
        if !self.paths_under(&path).is_empty() {
            return Err(rejected(format!("550 {}: Directory not empty", path)));
        }
        if path == "/" || !self.state.borrow_mut().dirs.remove(&path) {
            return Err(rejected(format!("550 {}: No such directory", path)));
        }
        Ok(())
    }

    fn put_file(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        if self.state.borrow().rejected_upload.as_deref() == Some(name) {
            return Err(rejected(format!("553 {}: Permission denied", name)));
        }
        let path = self.resolve(name);
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let size = content.len() as u64;
        self.state.borrow_mut().files.insert(path, content);
        Ok(size)
    }

    fn close(&mut self) {
        self.state.borrow_mut().closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_resolved_against_the_working_directory() {
        let mut remote = MemoryRemote::new();
        remote.add_dir("/a/b");
        remote.change_dir("/a").unwrap();
        remote.change_dir("b").unwrap();
        assert_eq!(remote.cwd(), "/a/b");
        remote.parent_dir().unwrap();
        assert_eq!(remote.cwd(), "/a");
        assert!(remote.change_dir("missing").is_err());
    }

    #[test]
    fn listing_shows_direct_children_only() {
        let mut remote = MemoryRemote::new();
        remote.add_file("/x/one.txt", b"1");
        remote.add_file("/x/sub/two.txt", b"2");
        remote.change_dir("/x").unwrap();

        let mut names: Vec<_> = remote.list_dir().unwrap().into_iter().map(|e| e.name).collect();
        names.sort();
        assert_eq!(names, ["one.txt", "sub"]);
    }
}

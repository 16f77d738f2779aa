use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

const SKIPPED_DIR_NAMES: &[&str] = &["node_modules"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DirIdentity {
    #[cfg_attr(not(unix), allow(dead_code))]
    Inode { dev: u64, ino: u64 },
    #[cfg_attr(unix, allow(dead_code))]
    Path(PathBuf),
}

#[cfg(unix)]
fn dir_identity(path: &Path) -> Option<DirIdentity> {
    use std::os::unix::fs::MetadataExt;
    let metadata = fs::metadata(path).ok()?;
    Some(DirIdentity::Inode {
        dev: metadata.dev(),
        ino: metadata.ino(),
    })
}

#[cfg(not(unix))]
fn dir_identity(path: &Path) -> Option<DirIdentity> {
    fs::canonicalize(path).ok().map(DirIdentity::Path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedDir {
    pub path: PathBuf,
    pub subdirs: Vec<WalkEntry>,
    pub files: Vec<WalkEntry>,
}

impl WalkedDir {
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Breadth-first walk over directories under a root.
///
/// Hidden directories and `node_modules` are skipped. Symlinked directories
/// are followed only when their target lies under the root. Every directory
/// is expanded at most once (by device and inode where available), so symlink
/// loops terminate; `max_visited` caps the number of expanded directories.
/// Unreadable directories are skipped. Entries are yielded in name order.
#[derive(Debug)]
pub struct DirectoryWalk {
    canonical_root: Option<PathBuf>,
    queue: VecDeque<PathBuf>,
    seen: HashSet<DirIdentity>,
    visited: usize,
    max_visited: usize,
    limit_reached: bool,
}

impl DirectoryWalk {
    pub fn new(root: &Path, max_visited: usize) -> Self {
        let mut seen = HashSet::new();
        if let Some(identity) = dir_identity(root) {
            seen.insert(identity);
        }
        Self {
            canonical_root: fs::canonicalize(root).ok(),
            queue: VecDeque::from([root.to_path_buf()]),
            seen,
            visited: 0,
            max_visited,
            limit_reached: false,
        }
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    fn contains(&self, path: &Path) -> bool {
        match (&self.canonical_root, fs::canonicalize(path)) {
            (Some(root), Ok(target)) => target.starts_with(root),
            _ => false,
        }
    }

    fn expand(&mut self, current: PathBuf) -> Option<WalkedDir> {
        let mut entries: Vec<(String, PathBuf, fs::FileType)> = fs::read_dir(&current)
            .ok()?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let file_type = entry.file_type().ok()?;
                let name = entry.file_name().to_string_lossy().into_owned();
                Some((name, entry.path(), file_type))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for (name, path, file_type) in entries {
            let (is_dir, is_file) = if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(target) if target.is_dir() && !self.contains(&path) => continue,
                    Ok(target) => (target.is_dir(), target.is_file()),
                    Err(_) => continue,
                }
            } else {
                (file_type.is_dir(), file_type.is_file())
            };

            if is_dir {
                if name.starts_with('.') || SKIPPED_DIR_NAMES.contains(&name.as_str()) {
                    continue;
                }
                let Some(identity) = dir_identity(&path) else {
                    continue;
                };
                if !self.seen.insert(identity) {
                    continue;
                }
                self.queue.push_back(path.clone());
                subdirs.push(WalkEntry { name, path });
            } else if is_file {
                files.push(WalkEntry { name, path });
            }
        }

        Some(WalkedDir {
            path: current,
            subdirs,
            files,
        })
    }
}

impl Iterator for DirectoryWalk {
    type Item = WalkedDir;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.queue.pop_front() {
            self.visited += 1;
            if self.visited > self.max_visited {
                self.limit_reached = true;
                self.queue.clear();
                return None;
            }
            if let Some(walked) = self.expand(current) {
                return Some(walked);
            }
        }
        None
    }
}

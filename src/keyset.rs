//! Hidden service key set persistence
//!
//! Layout of a key set directory, as read by Tor:
//!
//! ```text
//! hs_ed25519_secret_key   "== ed25519v1-secret: type0 ==" NUL x3 || expanded secret (96 bytes)
//! hs_ed25519_public_key   "== ed25519v1-public: type0 ==" NUL x3 || public key      (64 bytes)
//! hostname                "<address>.onion\n"
//! authorized_clients/     client authorization keys, created empty
//! vanity.json             metadata record (ignored by Tor)
//! ```
//!
//! [`save`] writes each file under a hidden temporary name in the same
//! directory and renames it into place. A failed save restores the files
//! it replaced.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{Result, VanityError};
use crate::keys::ExpandedSecretKey;
use crate::onion::ONION_SUFFIX;
use crate::search::VanityResult;

pub const SECRET_KEY_FILE: &str = "hs_ed25519_secret_key";
pub const PUBLIC_KEY_FILE: &str = "hs_ed25519_public_key";
pub const HOSTNAME_FILE: &str = "hostname";
pub const METADATA_FILE: &str = "vanity.json";
pub const AUTHORIZED_CLIENTS_DIR: &str = "authorized_clients";

/// Header of Tor ed25519 secret key files: a 29 byte tag NUL-padded to 32
pub const SECRET_KEY_HEADER: &[u8; 32] = b"== ed25519v1-secret: type0 ==\0\0\0";
/// Header of Tor ed25519 public key files
pub const PUBLIC_KEY_HEADER: &[u8; 32] = b"== ed25519v1-public: type0 ==\0\0\0";

pub const SECRET_KEY_FILE_LEN: usize = 96;
pub const PUBLIC_KEY_FILE_LEN: usize = 64;

/// Metadata written next to the key files.
///
/// Holds no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VanityRecord {
    /// Hostname including the ".onion" suffix
    pub onion_address: String,
    /// Hex encoded public key
    pub public_key: String,
    pub attempts: u64,
    pub created_at: DateTime<Utc>,
}

impl VanityRecord {
    pub fn from_result(result: &VanityResult) -> Self {
        Self {
            onion_address: result.hostname(),
            public_key: result.public_key_hex(),
            attempts: result.attempts,
            created_at: Utc::now(),
        }
    }
}

/// The contents of a key set directory.
///
/// Headers are kept as found on disk; [`crate::verify::verify`] checks them.
#[derive(Debug, Clone)]
pub struct PersistedKeySet {
    pub dir: PathBuf,
    pub secret_header: [u8; 32],
    pub expanded_secret: ExpandedSecretKey,
    pub public_header: [u8; 32],
    pub public_key: [u8; 32],
    /// Hostname file contents without the trailing newline
    pub hostname: String,
    pub metadata: Option<VanityRecord>,
}

impl PersistedKeySet {
    /// The key set that [`save`] would write for `result`
    pub fn from_result(dir: impl Into<PathBuf>, result: &VanityResult) -> Self {
        Self {
            dir: dir.into(),
            secret_header: *SECRET_KEY_HEADER,
            expanded_secret: result.expanded_secret.clone(),
            public_header: *PUBLIC_KEY_HEADER,
            public_key: result.public_key,
            hostname: result.hostname(),
            metadata: Some(VanityRecord::from_result(result)),
        }
    }

    pub fn secret_key_file_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(SECRET_KEY_FILE_LEN);
        data.extend_from_slice(&self.secret_header);
        data.extend_from_slice(self.expanded_secret.as_bytes());
        data
    }

    pub fn public_key_file_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(PUBLIC_KEY_FILE_LEN);
        data.extend_from_slice(&self.public_header);
        data.extend_from_slice(&self.public_key);
        data
    }

    pub fn hostname_file_contents(&self) -> String {
        format!("{}\n", self.hostname)
    }
}

/// Write the key set for `result` into `dir`, replacing any previous set.
///
/// Only the files of the set are touched: other entries in `dir`,
/// including the contents of `authorized_clients/`, are kept. Each file is
/// written under a temporary name and renamed over its target; if any step
/// fails, every file is put back the way it was. New directories are
/// created 0700 and every file 0600.
pub fn save(dir: &Path, result: &VanityResult) -> Result<PersistedKeySet> {
    let key_set = PersistedKeySet::from_result(dir, result);

    let mut txn = Transaction::begin(dir)?;
    txn.ensure_clients_dir()?;
    txn.stage(SECRET_KEY_FILE, &key_set.secret_key_file_bytes())?;
    txn.stage(PUBLIC_KEY_FILE, &key_set.public_key_file_bytes())?;
    txn.stage(HOSTNAME_FILE, key_set.hostname_file_contents().as_bytes())?;
    if let Some(record) = &key_set.metadata {
        let mut json = serde_json::to_vec_pretty(record).map_err(|e| {
            let source = io::Error::new(io::ErrorKind::InvalidData, e);
            VanityError::io(dir.join(METADATA_FILE), source)
        })?;
        json.push(b'\n');
        txn.stage(METADATA_FILE, &json)?;
    }
    txn.commit()?;
    set_mode(dir, 0o700)?;

    info!(dir = %dir.display(), hostname = %key_set.hostname, "key set saved");
    Ok(key_set)
}

/// Read the key set stored in `dir`.
///
/// Returns [`VanityError::NotFound`] when none of the three key files
/// exist and [`VanityError::Corrupt`] when the set is incomplete or a file
/// has the wrong shape.
pub fn load(dir: &Path) -> Result<PersistedKeySet> {
    let secret_path = dir.join(SECRET_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);
    let hostname_path = dir.join(HOSTNAME_FILE);

    let secret = read_optional(&secret_path)?;
    let public = read_optional(&public_path)?;
    let hostname = read_optional(&hostname_path)?;

    let (secret, public, hostname) = match (secret, public, hostname) {
        (None, None, None) => return Err(VanityError::NotFound(dir.to_path_buf())),
        (Some(s), Some(p), Some(h)) => (s, p, h),
        (s, p, _) => {
            let missing = if s.is_none() {
                secret_path
            } else if p.is_none() {
                public_path
            } else {
                hostname_path
            };
            return Err(VanityError::corrupt(missing, "file missing from key set"));
        }
    };

    debug!(
        secret_len = secret.len(),
        public_len = public.len(),
        "read key set files"
    );

    if secret.len() != SECRET_KEY_FILE_LEN {
        return Err(VanityError::corrupt(
            secret_path,
            format!("expected {} bytes, found {}", SECRET_KEY_FILE_LEN, secret.len()),
        ));
    }
    if public.len() != PUBLIC_KEY_FILE_LEN {
        return Err(VanityError::corrupt(
            public_path,
            format!("expected {} bytes, found {}", PUBLIC_KEY_FILE_LEN, public.len()),
        ));
    }

    let hostname = String::from_utf8(hostname)
        .ok()
        .filter(|h| h.is_ascii())
        .ok_or_else(|| VanityError::corrupt(&hostname_path, "hostname is not ASCII text"))?;
    let hostname = hostname.trim_end().to_string();
    if !hostname.to_ascii_lowercase().ends_with(ONION_SUFFIX) {
        return Err(VanityError::corrupt(
            hostname_path,
            "hostname does not end with .onion",
        ));
    }

    let metadata_path = dir.join(METADATA_FILE);
    let metadata = match read_optional(&metadata_path)? {
        Some(raw) => Some(serde_json::from_slice::<VanityRecord>(&raw).map_err(|e| {
            VanityError::corrupt(&metadata_path, format!("invalid metadata: {}", e))
        })?),
        None => None,
    };

    let mut secret_header = [0u8; 32];
    secret_header.copy_from_slice(&secret[..32]);
    let mut expanded = [0u8; 64];
    expanded.copy_from_slice(&secret[32..]);

    let mut public_header = [0u8; 32];
    public_header.copy_from_slice(&public[..32]);
    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&public[32..]);

    Ok(PersistedKeySet {
        dir: dir.to_path_buf(),
        secret_header,
        expanded_secret: ExpandedSecretKey::from_bytes(expanded),
        public_header,
        public_key,
        hostname,
        metadata,
    })
}

/// Reset the directory to 0700 and the key files to 0600
pub fn restrict_permissions(dir: &Path) -> Result<()> {
    set_mode(dir, 0o700)?;
    for file in [SECRET_KEY_FILE, PUBLIC_KEY_FILE, HOSTNAME_FILE] {
        set_mode(&dir.join(file), 0o600)?;
    }
    Ok(())
}

/// A file of the set, written under a temporary name next to its target
struct StagedFile {
    name: &'static str,
    temp: PathBuf,
    backup: Option<PathBuf>,
    committed: bool,
}

/// The writes of one [`save`] call. Dropping it before [`commit`] undoes
/// everything it did.
///
/// [`commit`]: Transaction::commit
struct Transaction {
    dir: PathBuf,
    created_dir: bool,
    created_clients_dir: bool,
    files: Vec<StagedFile>,
    done: bool,
}

impl Transaction {
    fn begin(dir: &Path) -> Result<Self> {
        let created_dir = match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => false,
            Ok(_) => {
                return Err(VanityError::io(
                    dir,
                    io::Error::new(io::ErrorKind::InvalidInput, "key set path is not a directory"),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let parent = parent_of(dir);
                fs::create_dir_all(&parent).map_err(|e| VanityError::io(&parent, e))?;
                create_private_dir(dir)?;
                true
            }
            Err(e) => return Err(VanityError::io(dir, e)),
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            created_dir,
            created_clients_dir: false,
            files: Vec::new(),
            done: false,
        })
    }

    /// Create `authorized_clients/` unless it already exists
    fn ensure_clients_dir(&mut self) -> Result<()> {
        let path = self.dir.join(AUTHORIZED_CLIENTS_DIR);
        if path.is_dir() {
            return Ok(());
        }
        create_private_dir(&path)?;
        self.created_clients_dir = true;
        Ok(())
    }

    fn stage(&mut self, name: &'static str, data: &[u8]) -> Result<()> {
        let temp = self.dir.join(hidden_name(name, "tmp"));
        let mut file = create_private_file(&temp)?;
        self.files.push(StagedFile {
            name,
            temp: temp.clone(),
            backup: None,
            committed: false,
        });

        file.write_all(data).map_err(|e| VanityError::io(&temp, e))?;
        file.sync_all().map_err(|e| VanityError::io(&temp, e))?;
        debug!(path = %temp.display(), "staged key set file");
        Ok(())
    }

    /// Rename every staged file over its target, then drop the old files
    fn commit(mut self) -> Result<()> {
        for index in 0..self.files.len() {
            self.commit_file(index)?;
        }
        self.done = true;

        for staged in &self.files {
            if let Some(backup) = &staged.backup {
                if let Err(e) = fs::remove_file(backup) {
                    warn!(
                        path = %backup.display(),
                        error = %e,
                        "could not remove previous key file"
                    );
                }
            }
        }
        sync_dir(&self.dir);
        Ok(())
    }

    fn commit_file(&mut self, index: usize) -> Result<()> {
        let staged = &mut self.files[index];
        let target = self.dir.join(staged.name);

        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.is_dir() => {
                let source = io::Error::new(io::ErrorKind::InvalidInput, "found a directory");
                return Err(VanityError::io(&target, source));
            }
            Ok(_) => {
                let backup = self.dir.join(hidden_name(staged.name, "previous"));
                fs::rename(&target, &backup).map_err(|e| VanityError::io(&target, e))?;
                staged.backup = Some(backup);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(VanityError::io(&target, e)),
        }

        fs::rename(&staged.temp, &target).map_err(|e| VanityError::io(&target, e))?;
        staged.committed = true;
        Ok(())
    }

    fn rollback(&self) {
        for staged in self.files.iter().rev() {
            let target = self.dir.join(staged.name);
            let written = if staged.committed { &target } else { &staged.temp };
            remove_quietly(written);

            if let Some(backup) = &staged.backup {
                if let Err(e) = fs::rename(backup, &target) {
                    error!(
                        backup = %backup.display(),
                        error = %e,
                        "could not restore previous key file"
                    );
                }
            }
        }

        if self.created_clients_dir {
            remove_dir_quietly(&self.dir.join(AUTHORIZED_CLIENTS_DIR));
        }
        if self.created_dir {
            remove_dir_quietly(&self.dir);
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.done {
            warn!(dir = %self.dir.display(), "rolling back key set save");
            self.rollback();
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "could not remove file");
        }
    }
}

fn remove_dir_quietly(path: &Path) {
    if let Err(e) = fs::remove_dir(path) {
        warn!(path = %path.display(), error = %e, "could not remove directory");
    }
}

fn parent_of(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn hidden_name(name: &str, tag: &str) -> String {
    format!(
        ".{}.{}-{}-{:08x}",
        name,
        tag,
        std::process::id(),
        rand::random::<u32>()
    )
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VanityError::io(path, e)),
    }
}

fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|e| VanityError::io(path, e))?;
    set_mode(path, 0o700)
}

/// Open a new file with mode 0600; fails if `path` already exists
fn create_private_file(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options.open(path).map_err(|e| VanityError::io(path, e))?;
    set_mode(path, 0o600)?;
    Ok(file)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| VanityError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    fn sample_result(fill: u8) -> VanityResult {
        VanityResult::from_keypair(&KeyPair::from_seed([fill; 32]), 42)
    }

    const KEY_SET_ENTRIES: [&str; 5] = [
        AUTHORIZED_CLIENTS_DIR,
        HOSTNAME_FILE,
        PUBLIC_KEY_FILE,
        SECRET_KEY_FILE,
        METADATA_FILE,
    ];

    /// Sorted names in `dir`, hidden temporary files included
    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_headers_are_tag_plus_nul_padding() {
        assert_eq!(&SECRET_KEY_HEADER[..29], b"== ed25519v1-secret: type0 ==");
        assert_eq!(&PUBLIC_KEY_HEADER[..29], b"== ed25519v1-public: type0 ==");
        assert_eq!(&SECRET_KEY_HEADER[29..], &[0, 0, 0]);
        assert_eq!(&PUBLIC_KEY_HEADER[29..], &[0, 0, 0]);
    }

    #[test]
    fn test_save_writes_exact_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        let result = sample_result(1);
        save(&dir, &result).unwrap();

        let secret = fs::read(dir.join(SECRET_KEY_FILE)).unwrap();
        assert_eq!(secret.len(), 96);
        assert_eq!(&secret[..32], SECRET_KEY_HEADER);
        assert_eq!(&secret[32..], result.expanded_secret.as_bytes());

        let public = fs::read(dir.join(PUBLIC_KEY_FILE)).unwrap();
        assert_eq!(public.len(), 64);
        assert_eq!(&public[..32], PUBLIC_KEY_HEADER);
        assert_eq!(&public[32..], &result.public_key);

        let hostname = fs::read_to_string(dir.join(HOSTNAME_FILE)).unwrap();
        assert_eq!(hostname, format!("{}.onion\n", result.onion_address));

        assert!(dir.join(AUTHORIZED_CLIENTS_DIR).is_dir());
        let record: VanityRecord =
            serde_json::from_slice(&fs::read(dir.join(METADATA_FILE)).unwrap()).unwrap();
        assert_eq!(record.onion_address, result.hostname());
        assert_eq!(record.attempts, 42);
    }

    #[test]
    fn test_save_leaves_no_temporary_files_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(2)).unwrap();

        assert_eq!(entries(tmp.path()), vec!["hs"]);
        assert_eq!(entries(&dir), KEY_SET_ENTRIES);
    }

    #[test]
    fn test_save_replaces_previous_set() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(3)).unwrap();
        let second = sample_result(4);
        save(&dir, &second).unwrap();

        let loaded = load(&dir).unwrap();
        assert_eq!(loaded.public_key, second.public_key);
        assert_eq!(entries(tmp.path()), vec!["hs"]);
        assert_eq!(entries(&dir), KEY_SET_ENTRIES);
    }

    #[test]
    fn test_save_keeps_unrelated_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        fs::create_dir_all(dir.join(AUTHORIZED_CLIENTS_DIR)).unwrap();
        fs::write(dir.join("notes.txt"), b"operator notes").unwrap();
        let client = dir.join(AUTHORIZED_CLIENTS_DIR).join("alice.auth");
        fs::write(&client, b"descriptor:x25519:key").unwrap();

        save(&dir, &sample_result(10)).unwrap();
        save(&dir, &sample_result(11)).unwrap();

        assert_eq!(fs::read(dir.join("notes.txt")).unwrap(), b"operator notes");
        assert_eq!(fs::read(&client).unwrap(), b"descriptor:x25519:key");
        assert_eq!(load(&dir).unwrap().public_key, sample_result(11).public_key);
    }

    #[test]
    fn test_failed_save_reports_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        // a regular file where the parent directory should be
        let blocker = tmp.path().join("blocked");
        fs::write(&blocker, b"x").unwrap();

        let err = save(&blocker.join("hs"), &sample_result(5)).unwrap_err();
        assert!(matches!(err, VanityError::PersistenceIo { .. }));
        assert_eq!(fs::read(&blocker).unwrap(), b"x");
    }

    #[test]
    fn test_save_rejects_file_in_place_of_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        fs::write(&dir, b"not a directory").unwrap();

        let err = save(&dir, &sample_result(12)).unwrap_err();
        assert!(matches!(err, VanityError::PersistenceIo { .. }));
        assert_eq!(fs::read(&dir).unwrap(), b"not a directory");
        assert_eq!(entries(tmp.path()), vec!["hs"]);
    }

    #[test]
    fn test_failed_save_removes_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("notes.txt"), b"keep").unwrap();
        // a directory where the hostname file goes makes the third rename fail
        fs::create_dir_all(dir.join(HOSTNAME_FILE).join("nested")).unwrap();

        let err = save(&dir, &sample_result(13)).unwrap_err();
        match err {
            VanityError::PersistenceIo { path, .. } => assert!(path.ends_with(HOSTNAME_FILE)),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(entries(&dir), vec![HOSTNAME_FILE, "notes.txt"]);
        assert!(dir.join(HOSTNAME_FILE).join("nested").is_dir());
    }

    #[test]
    fn test_failed_save_restores_previous_set() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(14)).unwrap();
        let before: Vec<Vec<u8>> = [SECRET_KEY_FILE, PUBLIC_KEY_FILE, HOSTNAME_FILE]
            .iter()
            .map(|f| fs::read(dir.join(f)).unwrap())
            .collect();

        // metadata is committed last; every earlier file must be rolled back
        fs::remove_file(dir.join(METADATA_FILE)).unwrap();
        fs::create_dir(dir.join(METADATA_FILE)).unwrap();

        let err = save(&dir, &sample_result(15)).unwrap_err();
        assert!(matches!(err, VanityError::PersistenceIo { .. }));

        let after: Vec<Vec<u8>> = [SECRET_KEY_FILE, PUBLIC_KEY_FILE, HOSTNAME_FILE]
            .iter()
            .map(|f| fs::read(dir.join(f)).unwrap())
            .collect();
        assert_eq!(after, before);
        assert!(dir.join(METADATA_FILE).is_dir());
        assert_eq!(entries(&dir), KEY_SET_ENTRIES);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(6)).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(dir.as_path()), 0o700);
        for file in [SECRET_KEY_FILE, PUBLIC_KEY_FILE, HOSTNAME_FILE, METADATA_FILE] {
            assert_eq!(mode(dir.join(file).as_path()), 0o600, "{}", file);
        }
    }

    #[test]
    fn test_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        let result = sample_result(7);
        save(&dir, &result).unwrap();

        let loaded = load(&dir).unwrap();
        assert_eq!(&loaded.secret_header, SECRET_KEY_HEADER);
        assert_eq!(loaded.expanded_secret, result.expanded_secret);
        assert_eq!(loaded.public_key, result.public_key);
        assert_eq!(loaded.hostname, result.hostname());
        assert!(loaded.metadata.is_some());
    }

    #[test]
    fn test_load_missing_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&tmp.path().join("absent")),
            Err(VanityError::NotFound(_))
        ));
        assert!(matches!(load(tmp.path()), Err(VanityError::NotFound(_))));
    }

    #[test]
    fn test_load_partial_set_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(8)).unwrap();
        fs::remove_file(dir.join(PUBLIC_KEY_FILE)).unwrap();

        match load(&dir) {
            Err(VanityError::Corrupt { path, .. }) => assert!(path.ends_with(PUBLIC_KEY_FILE)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_wrong_secret_size() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(9)).unwrap();

        let mut secret = fs::read(dir.join(SECRET_KEY_FILE)).unwrap();
        secret.push(0);
        fs::write(dir.join(SECRET_KEY_FILE), &secret).unwrap();

        assert!(matches!(load(&dir), Err(VanityError::Corrupt { .. })));
    }

    #[test]
    fn test_load_rejects_hostname_without_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        let result = sample_result(10);
        save(&dir, &result).unwrap();
        fs::write(dir.join(HOSTNAME_FILE), format!("{}\n", result.onion_address)).unwrap();

        assert!(matches!(load(&dir), Err(VanityError::Corrupt { .. })));
    }

    #[test]
    fn test_load_without_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("hs");
        save(&dir, &sample_result(11)).unwrap();
        fs::remove_file(dir.join(METADATA_FILE)).unwrap();

        assert!(load(&dir).unwrap().metadata.is_none());
    }
}

//! On-disk certificate store.
//!
//! Layout under the CA directory:
//!
//! ```text
//! ca_crt.pem                CA certificate
//! ca_key.pem                CA private key (0600)
//! serial                    next serial number, hex
//! inventory.txt             one line per issued certificate
//! signed/<host>.pem         issued host certificates
//! requests/<host>.pem       pending certificate requests
//! private_keys/<host>.pem   keys of hosts issued locally (0600)
//! ```
//!
//! Every file is replaced atomically (temp file in the same directory, then
//! rename), so a reader sees either the old contents or the new ones. The
//! existence of `signed/<host>.pem` is what "issued" means.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use hostca_core::{validate_hostname, CaError, HostCertificateRecord, Result};

use crate::locks::{HostGuard, HostLocks};

const CA_CERT_FILE: &str = "ca_crt.pem";
const CA_KEY_FILE: &str = "ca_key.pem";
const SERIAL_FILE: &str = "serial";
const INVENTORY_FILE: &str = "inventory.txt";
const SIGNED_DIR: &str = "signed";
const REQUESTS_DIR: &str = "requests";
const KEYS_DIR: &str = "private_keys";

/// First serial handed out by a fresh CA.
pub const FIRST_SERIAL: u64 = 1;

/// Filesystem-backed certificate store.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    locks: HostLocks,
    serial_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [SIGNED_DIR, REQUESTS_DIR, KEYS_DIR] {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| CaError::storage(&path, e))?;
        }
        debug!(root = %root.display(), "opened certificate store");

        Ok(Self {
            root,
            locks: HostLocks::new(),
            serial_lock: Mutex::new(()),
        })
    }

    /// CA directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take the per-host lock. Callers hold it across read-check-write
    /// sequences such as "not yet signed, so sign and save".
    pub fn lock(&self, hostname: &str) -> HostGuard<'_> {
        self.locks.lock(hostname)
    }

    /// Path of the signed certificate for `hostname`.
    pub fn certificate_path(&self, hostname: &str) -> Result<PathBuf> {
        self.host_path(SIGNED_DIR, hostname)
    }

    /// Path of the pending request for `hostname`.
    pub fn request_path(&self, hostname: &str) -> Result<PathBuf> {
        self.host_path(REQUESTS_DIR, hostname)
    }

    /// Path of the CA-held private key for `hostname`.
    pub fn private_key_path(&self, hostname: &str) -> Result<PathBuf> {
        self.host_path(KEYS_DIR, hostname)
    }

    fn host_path(&self, dir: &str, hostname: &str) -> Result<PathBuf> {
        let hostname = validate_hostname(hostname)?;
        Ok(self.root.join(dir).join(format!("{hostname}.pem")))
    }

    /// Has a certificate been issued for `hostname`?
    pub fn exists(&self, hostname: &str) -> bool {
        self.certificate_path(hostname)
            .is_ok_and(|path| path.is_file())
    }

    /// The issued certificate, if any, exactly as it was written.
    pub fn certificate(&self, hostname: &str) -> Result<Option<String>> {
        read_optional(&self.certificate_path(hostname)?)
    }

    /// Load everything persisted for `hostname`.
    pub fn load(&self, hostname: &str) -> Result<HostCertificateRecord> {
        let record = HostCertificateRecord {
            hostname: hostname.to_string(),
            csr: read_optional(&self.request_path(hostname)?)?,
            certificate: read_optional(&self.certificate_path(hostname)?)?,
            private_key: read_optional(&self.private_key_path(hostname)?)?,
        };

        if record.csr.is_none() && record.certificate.is_none() && record.private_key.is_none() {
            return Err(CaError::not_found(hostname));
        }
        Ok(record)
    }

    /// Persist every artifact present in `record`.
    ///
    /// The certificate is written last so that a host only counts as issued
    /// once its key is in place.
    ///
    /// If a write fails, files this call created are removed again, so the
    /// host is left as it was before the call.
    pub fn save(&self, record: &HostCertificateRecord) -> Result<()> {
        let hostname = record.hostname.as_str();
        let artifacts = [
            (self.private_key_path(hostname)?, &record.private_key, FileMode::Private),
            (self.request_path(hostname)?, &record.csr, FileMode::Public),
            (self.certificate_path(hostname)?, &record.certificate, FileMode::Public),
        ];

        let mut created = Vec::new();
        for (path, contents, mode) in &artifacts {
            let Some(contents) = contents else { continue };
            let fresh = !path.exists();
            if let Err(e) = write_atomic(path, contents, *mode) {
                for path in created {
                    if let Err(undo) = remove_optional(path) {
                        warn!(hostname, error = %undo, "failed to roll back partial save");
                    }
                }
                return Err(e);
            }
            if fresh {
                created.push(path);
            }
        }

        debug!(hostname, issued = record.is_issued(), "saved host record");
        Ok(())
    }

    /// Remove every artifact for `hostname`.
    ///
    /// Returns [`CaError::NotFound`] when there was nothing to remove.
    pub fn delete(&self, hostname: &str) -> Result<()> {
        let mut removed = false;
        for path in [
            self.certificate_path(hostname)?,
            self.request_path(hostname)?,
            self.private_key_path(hostname)?,
        ] {
            removed |= remove_optional(&path)?;
        }

        if removed {
            debug!(hostname, "deleted host record");
            Ok(())
        } else {
            Err(CaError::not_found(hostname))
        }
    }

    /// File a pending request, replacing any earlier one.
    pub fn save_request(&self, hostname: &str, csr: &str) -> Result<()> {
        write_atomic(&self.request_path(hostname)?, csr, FileMode::Public)
    }

    /// The pending request for `hostname`, if any.
    pub fn load_request(&self, hostname: &str) -> Result<Option<String>> {
        read_optional(&self.request_path(hostname)?)
    }

    /// Drop a pending request. Returns whether one existed.
    pub fn remove_request(&self, hostname: &str) -> Result<bool> {
        remove_optional(&self.request_path(hostname)?)
    }

    /// Hostnames with a pending request, sorted.
    pub fn list_requests(&self) -> Result<Vec<String>> {
        list_hosts(&self.root.join(REQUESTS_DIR))
    }

    /// Hostnames with an issued certificate, sorted.
    pub fn list_signed(&self) -> Result<Vec<String>> {
        list_hosts(&self.root.join(SIGNED_DIR))
    }

    /// The CA certificate and key, if both exist.
    ///
    /// [`FileStore::save_ca`] writes the certificate last, so a key without
    /// a certificate is an interrupted CA creation: it is reported as no CA
    /// and gets overwritten by the next one. A certificate without its key
    /// is an [`CaError::Identity`] error.
    pub fn load_ca(&self) -> Result<Option<(String, String)>> {
        let cert = read_optional(&self.root.join(CA_CERT_FILE))?;
        let key = read_optional(&self.root.join(CA_KEY_FILE))?;

        match (cert, key) {
            (Some(cert), Some(key)) => Ok(Some((cert, key))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(CaError::Identity(format!(
                "{CA_CERT_FILE} exists but {CA_KEY_FILE} is missing in {}",
                self.root.display()
            ))),
            (None, Some(_)) => {
                warn!(
                    root = %self.root.display(),
                    "found {CA_KEY_FILE} without {CA_CERT_FILE}, discarding incomplete CA"
                );
                Ok(None)
            }
        }
    }

    /// Persist the CA key, then the CA certificate.
    pub fn save_ca(&self, certificate: &str, key: &str) -> Result<()> {
        write_atomic(&self.root.join(CA_KEY_FILE), key, FileMode::Private)?;
        write_atomic(&self.root.join(CA_CERT_FILE), certificate, FileMode::Public)
    }

    /// Allocate the next serial number.
    pub fn next_serial(&self) -> Result<u64> {
        let _guard = self.serial_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.root.join(SERIAL_FILE);

        let serial = match read_optional(&path)? {
            Some(text) => u64::from_str_radix(text.trim(), 16).map_err(|e| {
                CaError::Identity(format!("corrupt serial file {}: {e}", path.display()))
            })?,
            None => FIRST_SERIAL,
        };

        let next = serial
            .checked_add(1)
            .ok_or_else(|| CaError::Identity("serial numbers exhausted".into()))?;
        write_atomic(&path, &format!("{next:04X}\n"), FileMode::Public)?;
        Ok(serial)
    }

    /// Append one line to the issuance inventory.
    pub fn append_inventory(&self, line: &str) -> Result<()> {
        let path = self.root.join(INVENTORY_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CaError::storage(&path, e))?;
        writeln!(file, "{line}").map_err(|e| CaError::storage(&path, e))
    }

    /// Contents of the issuance inventory (empty if nothing was issued).
    pub fn inventory(&self) -> Result<String> {
        Ok(read_optional(&self.root.join(INVENTORY_FILE))?.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum FileMode {
    Public,
    Private,
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CaError::storage(path, e)),
    }
}

fn remove_optional(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CaError::storage(path, e)),
    }
}

/// Replace `path` with `contents` through a temp file in the same directory.
pub(crate) fn write_atomic(path: &Path, contents: &str, mode: FileMode) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| CaError::storage(path, ErrorKind::InvalidInput.into()))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CaError::storage(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| CaError::storage(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CaError::storage(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let bits = match mode {
            FileMode::Public => 0o644,
            FileMode::Private => 0o600,
        };
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(bits))
            .map_err(|e| CaError::storage(tmp.path(), e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path)
        .map_err(|e| CaError::storage(path, e.error))?;
    Ok(())
}

fn list_hosts(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CaError::storage(dir, e)),
    };

    let mut hosts = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CaError::storage(dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pem") {
            continue;
        }
        if let Some(host) = path.file_stem().and_then(|s| s.to_str()) {
            if validate_hostname(host).is_ok() {
                hosts.push(host.to_string());
            }
        }
    }
    hosts.sort();
    Ok(hosts)
}

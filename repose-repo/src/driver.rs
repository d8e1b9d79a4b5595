//! Orchestrates one end-to-end `repose` run: `load -> reduce/update (or
//! drop) -> write -> link -> sign`.
//!
//! Grounded on `original_source/src/repose.c`'s `main` and `db_write`: the
//! sequence of steps and the "skip the write when nothing changed" short
//! circuit (preserving the existing index's mtime when nothing changed)
//! are ported directly.

use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::fcntl::{FlockArg, flock};
use repose_cache::PackageCache;
use repose_compress::CompressionKind;
use repose_db::{Contents, load_index, write_index};
use repose_types::{Package, ReposeError, Result};

use crate::config::Config;
use crate::linker;
use crate::reconciler;
use crate::scanner;
use crate::signing::Signer;

/// What a [`Driver::run`] call actually did, for the CLI to turn into an
/// exit code and any `--list` output.
#[derive(Debug)]
pub struct RunReport {
    /// Whether the on-disk index was rewritten.
    pub dirty: bool,
    /// Whether the repository holds no packages once this run finished.
    pub empty: bool,
    /// The resulting package set, in cache list order. Populated even when
    /// nothing was written, so `--list` can always print it.
    pub packages: Vec<Package>,
}

/// Drives one `repose` invocation against a [`Config`].
pub struct Driver<'a> {
    config: &'a Config,
    signer: &'a dyn Signer,
}

impl std::fmt::Debug for Driver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("config", self.config)
            .field("signer", &"dyn Signer")
            .finish()
    }
}

impl<'a> Driver<'a> {
    /// Builds a driver for `config`, using `signer` as the OpenPGP backend
    /// for `--sign` and for verifying any `.sig` found alongside an
    /// existing index.
    pub fn new(config: &'a Config, signer: &'a dyn Signer) -> Self {
        Driver { config, signer }
    }

    fn db_link_path(&self) -> PathBuf {
        self.config.root.join(format!("{}.db", self.config.repo_name))
    }

    fn files_link_path(&self) -> PathBuf {
        self.config.root.join(format!("{}.files", self.config.repo_name))
    }

    fn load_named_index(&self, link_path: &Path) -> Result<PackageCache> {
        if self.config.rebuild {
            return Ok(PackageCache::create(0));
        }

        let target = match std::fs::read_link(link_path) {
            Ok(target) => target,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PackageCache::create(0)),
            Err(e) => return Err(e.into()),
        };

        let real_path = link_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&target);

        self.verify_signature(&real_path)?;

        let file = match File::open(&real_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PackageCache::create(0)),
            Err(e) => return Err(e.into()),
        };

        let kind = CompressionKind::from_path(&real_path);
        load_index(BufReader::new(file), kind)
    }

    fn verify_signature(&self, real_path: &Path) -> Result<()> {
        let sig_path = PathBuf::from(format!("{}.sig", real_path.display()));
        let sig_bytes = match std::fs::read(&sig_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut data = File::open(real_path)?;
        let mut sig: &[u8] = &sig_bytes;
        let valid = self.signer.verify(&mut data, &mut sig)?;
        if !valid {
            return Err(ReposeError::Fatal(format!(
                "{}: signature verification failed",
                real_path.display()
            )));
        }
        Ok(())
    }

    /// Runs load, reconciliation (or drop), write and link, per `self`'s
    /// configuration.
    ///
    /// # Errors
    ///
    /// Propagates any fatal I/O, parse, or signing error.
    pub fn run(&self) -> Result<RunReport> {
        let mut repo = self.load_named_index(&self.db_link_path())?;

        let dirty = if self.config.drop {
            reconciler::drop_targets(&mut repo, &self.config.targets, &self.config.root)?
        } else {
            let filecache = scanner::scan_pool(
                &self.config.pool,
                &self.config.arch,
                &self.config.targets,
            )?;
            let reduced = reconciler::reduce(&mut repo, &self.config.pool)?;
            let updated = reconciler::update(&mut repo, &filecache, &self.config.root)?;
            reduced || updated
        };

        let empty = repo.is_empty();
        let packages: Vec<Package> = repo.iter().cloned().collect();

        if self.config.list {
            return Ok(RunReport {
                dirty: false,
                empty,
                packages,
            });
        }

        if !dirty {
            log::info!("{}.db is up to date", self.config.repo_name);
            return Ok(RunReport {
                dirty: false,
                empty,
                packages,
            });
        }

        self.write_named_index(&mut repo, "db", Contents::DB, &self.db_link_path())?;
        if self.config.files {
            self.write_named_index(&mut repo, "files", Contents::FILES, &self.files_link_path())?;
        }

        linker::link_packages(&repo, &self.config.root, &self.config.pool, self.config.reflink)?;

        Ok(RunReport {
            dirty: true,
            empty,
            packages,
        })
    }

    fn write_named_index(
        &self,
        repo: &mut PackageCache,
        suffix: &str,
        contents: Contents,
        link_path: &Path,
    ) -> Result<()> {
        let real_name = format!(
            "{}.{suffix}.tar{}",
            self.config.repo_name,
            self.config.compression.extension()
        );
        let real_path = self.config.root.join(&real_name);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&real_path)?;
        flock(file.as_raw_fd(), FlockArg::LockExclusive)
            .map_err(|e| ReposeError::Io(std::io::Error::from(e)))?;

        write_index(repo, &file, self.config.compression, contents, &self.config.pool)?;
        drop(file);

        match std::fs::remove_file(link_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        std::os::unix::fs::symlink(&real_name, link_path)?;

        if self.config.sign {
            self.sign_index(&real_path)?;
        }

        Ok(())
    }

    fn sign_index(&self, real_path: &Path) -> Result<()> {
        let mut data = File::open(real_path)?;
        let sig = self.signer.sign(&mut data)?;
        let sig_path = PathBuf::from(format!("{}.sig", real_path.display()));
        std::fs::write(sig_path, sig)?;
        Ok(())
    }
}

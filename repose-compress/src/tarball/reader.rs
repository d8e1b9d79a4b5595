//! Reading tarballs.

use std::fmt;
use std::fmt::Debug;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use repose_types::Result;
use tar::{Archive, Entries, Entry, EntryType};

use crate::CompressionKind;
use crate::decompression::CompressionDecoder;

/// A generic tarball reader for both compressed and plain `.tar` archives.
pub struct TarballReader<R: BufRead> {
    archive: Archive<CompressionDecoder<R>>,
}

impl<R: BufRead> Debug for TarballReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarballReader")
            .field("archive", &"Archive<CompressionDecoder>")
            .finish()
    }
}

impl<R: BufRead> TarballReader<R> {
    /// Creates a new [`TarballReader`] reading from `reader`, decompressed
    /// according to `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the [`CompressionDecoder`] cannot be created.
    pub fn new(reader: R, kind: CompressionKind) -> Result<Self> {
        Ok(Self {
            archive: Archive::new(CompressionDecoder::new(reader, kind)?),
        })
    }

    /// Returns an iterator over the entries in the tarball.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Archive::entries`] fails.
    pub fn entries(&mut self) -> Result<TarballEntries<'_, R>> {
        Ok(self.archive.entries()?.into())
    }

    /// Reads a specific entry by its path. Returns `None` if it doesn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if iterating entries fails.
    pub fn read_entry<P: AsRef<Path>>(&mut self, path: P) -> Result<Option<TarballEntry<'_, R>>> {
        for entry in self.entries()? {
            let entry = entry?;
            if entry.path() == path.as_ref() {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

/// An entry in a tarball.
pub struct TarballEntry<'a, R: BufRead> {
    path: PathBuf,
    entry: Entry<'a, CompressionDecoder<R>>,
}

impl<R: BufRead> Debug for TarballEntry<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarballEntry")
            .field("path", &self.path)
            .finish()
    }
}

impl<'a, R: BufRead> TarballEntry<'a, R> {
    /// Returns the path of this entry within the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entire entry content into a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn content(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.entry.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.entry.header().entry_type() == EntryType::Directory
    }

    /// Whether this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.entry.header().entry_type() == EntryType::Regular
    }

    /// The raw tar entry, for accessing header metadata directly.
    pub fn raw(&self) -> &Entry<'a, CompressionDecoder<R>> {
        &self.entry
    }
}

impl<R: BufRead> Read for TarballEntry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.entry.read(buf)
    }
}

/// An iterator over the entries in a tarball.
pub struct TarballEntries<'a, R: BufRead> {
    inner: Entries<'a, CompressionDecoder<R>>,
}

impl<R: BufRead> Debug for TarballEntries<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarballEntries")
            .field("inner", &"Entries<CompressionDecoder>")
            .finish()
    }
}

impl<'a, R: BufRead> Iterator for TarballEntries<'a, R> {
    type Item = Result<TarballEntry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| {
            let entry = entry?;
            let path = entry.path()?.to_path_buf();
            Ok(TarballEntry { path, entry })
        })
    }
}

impl<'a, R: BufRead> From<Entries<'a, CompressionDecoder<R>>> for TarballEntries<'a, R> {
    fn from(inner: Entries<'a, CompressionDecoder<R>>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;
    use crate::tarball::builder::TarballBuilder;

    #[rstest]
    #[case::none(CompressionKind::None)]
    #[case::gzip(CompressionKind::Gzip)]
    #[case::bzip2(CompressionKind::Bzip2)]
    #[case::xz(CompressionKind::Xz)]
    fn reader_round_trips_builder_output(#[case] kind: CompressionKind) -> TestResult {
        let mut builder = TarballBuilder::new(Vec::new(), kind)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(9);
        header.set_cksum();
        builder
            .inner_mut()
            .append_data(&mut header, "testfile", &b"alpm4ever"[..])?;
        let bytes = builder.finish()?;

        let mut reader = TarballReader::new(BufReader::new(bytes.as_slice()), kind)?;
        let entry = reader.read_entry("testfile")?;
        assert!(entry.is_some());
        let mut entry = entry.unwrap();
        assert_eq!(entry.content()?, b"alpm4ever");
        Ok(())
    }
}

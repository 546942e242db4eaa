//! Package store: the raw ZIP member table
//!
//! Every member is held as the exact bytes read from the archive together with
//! the compression method it was stored with. Members nobody replaces are
//! written back byte for byte.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{XlsxError, XlsxResult};

/// Name of the content types part every package must have
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// One archive member
#[derive(Debug, Clone)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub is_dir: bool,
}

/// All members of an opened package, in archive order
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<PackagePart>,
    index: AHashMap<String, usize>,
}

impl Package {
    /// Read every member of the archive at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(XlsxError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read every member from any seekable source
    pub fn from_reader<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut package = Package::default();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if package.index.contains_key(&name) {
                log::warn!("duplicate archive member '{}' ignored", name);
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            package.index.insert(name.clone(), package.parts.len());
            package.parts.push(PackagePart {
                name,
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        if !package.contains(CONTENT_TYPES_PART) {
            return Err(XlsxError::InvalidFormat(format!(
                "Missing {}",
                CONTENT_TYPES_PART
            )));
        }

        log::debug!("loaded {} package members", package.parts.len());
        Ok(package)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Raw bytes of a member
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.parts[i].data.as_slice())
    }

    /// Like [`Package::get`], failing with [`XlsxError::MissingPart`]
    pub fn require(&self, name: &str) -> XlsxResult<&[u8]> {
        self.get(name)
            .ok_or_else(|| XlsxError::MissingPart(name.to_string()))
    }

    /// Replace a member's bytes, keeping its compression; new members are deflated
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.index.get(name) {
            Some(&i) => self.parts[i].data = data,
            None => {
                self.index.insert(name.to_string(), self.parts.len());
                self.parts.push(PackagePart {
                    name: name.to_string(),
                    data,
                    compression: CompressionMethod::Deflated,
                    is_dir: false,
                });
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PackagePart> {
        let i = self.index.remove(name)?;
        let part = self.parts.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(part)
    }

    /// Member names in archive order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    /// Write a complete archive
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> XlsxResult<W> {
        let mut zip = ZipWriter::new(writer);
        for part in &self.parts {
            let options = SimpleFileOptions::default().compression_method(part.compression);
            if part.is_dir {
                zip.add_directory(part.name.as_str(), options)?;
            } else {
                zip.start_file(part.name.as_str(), options)?;
                zip.write_all(&part.data)?;
            }
        }
        Ok(zip.finish()?)
    }

    /// Write to a temporary file beside `path`, then rename it over `path`
    ///
    /// The destination is untouched unless the whole archive was written.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        self.write_to(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;

        if let Ok(meta) = fs::metadata(path) {
            fs::set_permissions(tmp.path(), meta.permissions())?;
        }
        tmp.persist(path).map_err(|e| XlsxError::Io(e.error))?;

        log::debug!("wrote {} members to {}", self.parts.len(), path.display());
        Ok(())
    }
}

//! WAD container: header validation, lump directory, byte-range reads

use crate::error::{Result, WadError};
use crate::types::{DirectoryEntry, Name8, WadKind};
use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Size of the fixed archive header in bytes.
const HEADER_SIZE: usize = 12;
/// Size of one directory record in bytes.
const DIR_ENTRY_SIZE: usize = 16;

/// Backing storage for an opened archive.
#[derive(Debug)]
enum ArchiveData {
    /// Memory-mapped file.
    Mapped(Mmap),
    /// Whole archive resident in memory.
    Owned(Vec<u8>),
}

impl ArchiveData {
    fn bytes(&self) -> &[u8] {
        match self {
            ArchiveData::Mapped(mmap) => mmap,
            ArchiveData::Owned(buf) => buf,
        }
    }
}

/// An opened WAD archive: immutable bytes plus the parsed lump directory.
///
/// The byte buffer and directory never change after open, so an archive
/// can be read concurrently from any number of threads. Decoders borrow
/// lump slices and hand back owned records with no reference to the
/// archive.
#[derive(Debug)]
pub struct WadArchive {
    kind: WadKind,
    data: ArchiveData,
    directory: Vec<DirectoryEntry>,
    /// name -> directory index of the *last* entry carrying that name.
    by_name: HashMap<Name8, usize>,
}

impl WadArchive {
    /// Open an archive from disk, memory-mapping the file when possible.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        #[allow(unsafe_code)]
        let data = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => {
                debug!("memory-mapped {:?} ({} bytes)", path, mmap.len());
                ArchiveData::Mapped(mmap)
            }
            Err(err) => {
                debug!("mmap failed for {:?}, reading into memory: {err}", path);
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                ArchiveData::Owned(buf)
            }
        };

        Self::parse(data)
    }

    /// Open an archive from an in-memory byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::parse(ArchiveData::Owned(bytes))
    }

    fn parse(data: ArchiveData) -> Result<Self> {
        let bytes = data.bytes();
        if bytes.len() < HEADER_SIZE {
            return Err(WadError::InvalidHeader(format!(
                "{} bytes is too short for a WAD header",
                bytes.len()
            )));
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        let kind = WadKind::from_magic(&magic)
            .ok_or_else(|| WadError::InvalidHeader(format!("unrecognized magic {magic:?}")))?;

        let mut header = Cursor::new(&bytes[4..HEADER_SIZE]);
        let lump_count = header.read_u32::<LittleEndian>()?;
        let dir_offset = header.read_u32::<LittleEndian>()?;

        // The directory must fit inside the archive; nothing downstream
        // can be trusted when it does not.
        let dir_len = lump_count as usize * DIR_ENTRY_SIZE;
        let dir_end = (dir_offset as usize)
            .checked_add(dir_len)
            .filter(|end| *end <= bytes.len())
            .ok_or(WadError::OutOfRange {
                offset: dir_offset,
                size: dir_len as u32,
                archive_len: bytes.len(),
            })?;

        debug!("{kind:?}: {lump_count} lumps, directory at {dir_offset:#x}");

        let mut directory = Vec::with_capacity(lump_count as usize);
        let mut by_name = HashMap::with_capacity(lump_count as usize);
        let mut cursor = Cursor::new(&bytes[dir_offset as usize..dir_end]);
        for index in 0..lump_count as usize {
            let offset = cursor.read_u32::<LittleEndian>()?;
            let size = cursor.read_u32::<LittleEndian>()?;
            let mut raw = [0u8; 8];
            cursor.read_exact(&mut raw)?;
            let name = Name8::from_raw(raw);

            if (offset as usize)
                .checked_add(size as usize)
                .is_none_or(|end| end > bytes.len())
            {
                warn!(
                    "lump {name} claims {size} bytes at {offset:#x}, beyond the archive; kept but unreadable"
                );
            }

            trace!("lump {index}: {name} at {offset:#x} ({size} bytes)");
            // Later entries override earlier ones.
            by_name.insert(name, index);
            directory.push(DirectoryEntry {
                name,
                offset,
                size,
                index,
            });
        }

        Ok(Self {
            kind,
            data,
            directory,
            by_name,
        })
    }

    pub fn kind(&self) -> WadKind {
        self.kind
    }

    /// Raw bytes of the whole archive.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.bytes()
    }

    /// Number of directory entries.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Directory entries in archive order.
    pub fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.directory.iter()
    }

    pub fn entry_at(&self, index: usize) -> Option<&DirectoryEntry> {
        self.directory.get(index)
    }

    /// Find a lump by name, case-insensitively. When several entries share
    /// a name the last one in directory order wins; patch archives rely on
    /// this to override base resources.
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.find_name(Name8::new(name))
    }

    pub fn find_name(&self, name: Name8) -> Option<&DirectoryEntry> {
        self.by_name.get(&name).map(|&index| &self.directory[index])
    }

    /// Read the payload of a directory entry: exactly `size` bytes at
    /// `offset`, or `OutOfRange` when the range leaves the buffer.
    pub fn read_lump(&self, entry: &DirectoryEntry) -> Result<&[u8]> {
        let bytes = self.data.bytes();
        let start = entry.offset as usize;
        let end = start
            .checked_add(entry.size as usize)
            .filter(|end| *end <= bytes.len())
            .ok_or(WadError::OutOfRange {
                offset: entry.offset,
                size: entry.size,
                archive_len: bytes.len(),
            })?;
        Ok(&bytes[start..end])
    }

    /// Read a lump by name; `None` when no entry carries the name.
    pub fn read_by_name(&self, name: &str) -> Option<Result<&[u8]>> {
        self.find(name).map(|entry| self.read_lump(entry))
    }

    /// The ordered run of entries immediately following the named marker,
    /// stopping at the next entry whose name is itself a marker or at the
    /// end of the directory.
    pub fn entries_after(&self, marker: &str) -> Option<&[DirectoryEntry]> {
        let start = self.find(marker)?.index + 1;
        let stop = self.directory[start..]
            .iter()
            .position(|entry| entry.name.is_marker())
            .map_or(self.directory.len(), |relative| start + relative);
        Some(&self.directory[start..stop])
    }
}

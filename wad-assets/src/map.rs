//! Map geometry decoding: fixed-size record tables after a map marker
//!
//! Cross-references between tables stay plain integer indices as stored
//! on disk. The geometry graph is cyclic and shared (sidedefs belong to
//! sectors, sectors are referenced by many sidedefs), so the decoder
//! never materializes a pointer graph; consumers resolve indices into
//! views as needed.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use tracing::{debug, trace, warn};
use wad_archive::{DirectoryEntry, Name8, WadArchive};

use crate::error::{AssetError, Result};

/// A map vertex on the fixed-point grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
}

/// A wall segment joining two vertices, with one or two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDef {
    pub start: u16,
    pub end: u16,
    pub flags: u16,
    pub special: u16,
    pub tag: u16,
    /// Sidedef index; `-1` means the side is absent.
    pub front_side: i16,
    pub back_side: i16,
}

/// One face of a linedef: texture placement plus the owning sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideDef {
    pub x_offset: i16,
    pub y_offset: i16,
    pub upper: Name8,
    pub lower: Name8,
    pub middle: Name8,
    pub sector: u16,
}

/// A floor/ceiling region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    pub floor_height: i16,
    pub ceiling_height: i16,
    pub floor_tex: Name8,
    pub ceiling_tex: Name8,
    pub light: i16,
    pub special: u16,
    pub tag: u16,
}

/// A placed object: player start, monster, item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thing {
    pub x: i16,
    pub y: i16,
    pub angle: u16,
    pub type_id: u16,
    pub flags: u16,
}

/// Decoded geometry tables for one map.
///
/// Indices are preserved exactly as read, including out-of-range ones;
/// this decoder extracts structure and leaves semantic validation to the
/// consumer.
#[derive(Debug, Default)]
pub struct MapData {
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<LineDef>,
    pub sidedefs: Vec<SideDef>,
    pub sectors: Vec<Sector>,
    pub things: Vec<Thing>,
    /// Non-fatal structural violations found while decoding.
    pub issues: Vec<AssetError>,
}

/// Lump names recognized inside a map's marker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapLump {
    Things,
    Linedefs,
    Sidedefs,
    Vertexes,
    Segs,
    Ssectors,
    Nodes,
    Sectors,
    Reject,
    Blockmap,
}

impl MapLump {
    fn classify(name: Name8) -> Option<Self> {
        match name.as_str() {
            "THINGS" => Some(Self::Things),
            "LINEDEFS" => Some(Self::Linedefs),
            "SIDEDEFS" => Some(Self::Sidedefs),
            "VERTEXES" => Some(Self::Vertexes),
            "SEGS" => Some(Self::Segs),
            "SSECTORS" => Some(Self::Ssectors),
            "NODES" => Some(Self::Nodes),
            "SECTORS" => Some(Self::Sectors),
            "REJECT" => Some(Self::Reject),
            "BLOCKMAP" => Some(Self::Blockmap),
            _ => None,
        }
    }
}

/// Decode the geometry tables of the map starting at `marker`.
///
/// The marker's run is scanned in archive order; recognized table lumps
/// are decoded, auxiliary lumps are consumed without producing records,
/// and anything unrecognized between them is tolerated and skipped.
pub fn decode_map(archive: &WadArchive, marker: &str) -> Result<MapData> {
    let Some(run) = archive.entries_after(marker) else {
        return Err(AssetError::MapNotFound(marker.to_string()));
    };
    debug!("map {marker}: {} lumps in marker run", run.len());

    let mut map = MapData::default();
    for entry in run {
        let Some(kind) = MapLump::classify(entry.name) else {
            trace!("skipping unrecognized lump {} in map run", entry.name);
            continue;
        };
        let bytes = match archive.read_lump(entry) {
            Ok(bytes) => bytes,
            Err(err) => {
                // One unreadable table must not take the rest of the map
                // down; partial results are still useful.
                warn!("map table {} unreadable: {err}", entry.name);
                map.issues.push(err.into());
                continue;
            }
        };
        match kind {
            MapLump::Things => {
                map.things = decode_table(entry, bytes, 10, &mut map.issues, read_thing);
            }
            MapLump::Linedefs => {
                map.linedefs = decode_table(entry, bytes, 14, &mut map.issues, read_linedef);
            }
            MapLump::Sidedefs => {
                map.sidedefs = decode_table(entry, bytes, 30, &mut map.issues, read_sidedef);
            }
            MapLump::Vertexes => {
                map.vertices = decode_table(entry, bytes, 4, &mut map.issues, read_vertex);
            }
            MapLump::Sectors => {
                map.sectors = decode_table(entry, bytes, 26, &mut map.issues, read_sector);
            }
            MapLump::Segs
            | MapLump::Ssectors
            | MapLump::Nodes
            | MapLump::Reject
            | MapLump::Blockmap => {
                // BSP and lookup acceleration lumps: consumed so the run
                // scan tolerates them, no gameplay records come out.
                trace!("ignoring auxiliary lump {} ({} bytes)", entry.name, bytes.len());
            }
        }
    }
    Ok(map)
}

/// Split a lump into fixed-size records, decoding the maximal whole-record
/// prefix. A trailing remainder is reported as `TruncatedTable` without
/// aborting the rest of the map.
fn decode_table<T>(
    entry: &DirectoryEntry,
    bytes: &[u8],
    record_size: usize,
    issues: &mut Vec<AssetError>,
    read: impl Fn(&mut Cursor<&[u8]>) -> std::io::Result<T>,
) -> Vec<T> {
    let count = bytes.len() / record_size;
    if bytes.len() % record_size != 0 {
        warn!(
            "table {} is {} bytes, not a multiple of {record_size}; decoding {count} whole records",
            entry.name,
            bytes.len()
        );
        issues.push(AssetError::TruncatedTable {
            lump: entry.name.to_string(),
            size: bytes.len(),
            record_size,
        });
    }

    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        match read(&mut cursor) {
            Ok(record) => records.push(record),
            Err(err) => {
                // Unreachable after the count calculation, but a short
                // read must never panic the decoder.
                warn!("table {} short read: {err}", entry.name);
                break;
            }
        }
    }
    trace!("decoded {} records from {}", records.len(), entry.name);
    records
}

fn read_name8(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Name8> {
    let mut raw = [0u8; 8];
    cursor.read_exact(&mut raw)?;
    Ok(Name8::from_raw(raw))
}

fn read_vertex(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Vertex> {
    Ok(Vertex {
        x: cursor.read_i16::<LittleEndian>()?,
        y: cursor.read_i16::<LittleEndian>()?,
    })
}

fn read_linedef(cursor: &mut Cursor<&[u8]>) -> std::io::Result<LineDef> {
    Ok(LineDef {
        start: cursor.read_u16::<LittleEndian>()?,
        end: cursor.read_u16::<LittleEndian>()?,
        flags: cursor.read_u16::<LittleEndian>()?,
        special: cursor.read_u16::<LittleEndian>()?,
        tag: cursor.read_u16::<LittleEndian>()?,
        front_side: cursor.read_i16::<LittleEndian>()?,
        back_side: cursor.read_i16::<LittleEndian>()?,
    })
}

fn read_sidedef(cursor: &mut Cursor<&[u8]>) -> std::io::Result<SideDef> {
    Ok(SideDef {
        x_offset: cursor.read_i16::<LittleEndian>()?,
        y_offset: cursor.read_i16::<LittleEndian>()?,
        upper: read_name8(cursor)?,
        lower: read_name8(cursor)?,
        middle: read_name8(cursor)?,
        sector: cursor.read_u16::<LittleEndian>()?,
    })
}

fn read_sector(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Sector> {
    Ok(Sector {
        floor_height: cursor.read_i16::<LittleEndian>()?,
        ceiling_height: cursor.read_i16::<LittleEndian>()?,
        floor_tex: read_name8(cursor)?,
        ceiling_tex: read_name8(cursor)?,
        light: cursor.read_i16::<LittleEndian>()?,
        special: cursor.read_u16::<LittleEndian>()?,
        tag: cursor.read_u16::<LittleEndian>()?,
    })
}

fn read_thing(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Thing> {
    Ok(Thing {
        x: cursor.read_i16::<LittleEndian>()?,
        y: cursor.read_i16::<LittleEndian>()?,
        angle: cursor.read_u16::<LittleEndian>()?,
        type_id: cursor.read_u16::<LittleEndian>()?,
        flags: cursor.read_u16::<LittleEndian>()?,
    })
}

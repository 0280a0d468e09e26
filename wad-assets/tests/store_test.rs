//! End-to-end decoding over a complete synthetic archive: palette,
//! graphics, sound, and map geometry resolved through one store.

use std::sync::Arc;
use std::thread;

use wad_archive::WadArchive;
use wad_assets::{AssetError, AssetStore};
use wad_testkit::{WadBuilder, palette_lump, solid_patch_lump, sound_lump, vertex_lump};

fn fixture() -> WadBuilder {
    let linedef: Vec<u8> = [0u16, 1, 4, 0, 0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .chain(0i16.to_le_bytes())
        .chain((-1i16).to_le_bytes())
        .collect();

    WadBuilder::iwad()
        .lump("PLAYPAL", &palette_lump())
        .lump("TITLEPIC", &solid_patch_lump(4, 4, 0, &[1, 2]))
        .lump("FLOOR4_8", &[7u8; 4096])
        .lump("DSSHOT", &sound_lump(11025, &[0, 64, 128, 192, 255]))
        .marker("E1M1")
        .lump("THINGS", &[16, 0, 32, 0, 90, 0, 1, 0, 7, 0])
        .lump("LINEDEFS", &linedef)
        .lump("VERTEXES", &vertex_lump(&[(0, 0), (64, 0), (64, 64)]))
        .lump("SECTORS", &[])
        .marker("E1M2")
        .lump("VERTEXES", &vertex_lump(&[(1, 1)]))
}

#[test]
fn decodes_every_asset_kind() {
    let _ = tracing_subscriber::fmt::try_init();
    let store = AssetStore::new(WadArchive::from_bytes(fixture().build()).unwrap());

    let palette = store.palette();
    assert_eq!(palette.rgba(7), [7, 21, 248, 255]);

    let title = store.patch("TITLEPIC").unwrap();
    assert_eq!((title.width, title.height), (4, 4));
    assert_eq!(title.pixel(0, 0).unwrap(), [1, 3, 254, 255]);
    assert_eq!(title.pixel(0, 1).unwrap(), [2, 6, 253, 255]);
    assert_eq!(title.pixel(0, 2).unwrap(), [0, 0, 0, 0]);

    let floor = store.flat("FLOOR4_8").unwrap();
    assert_eq!((floor.width, floor.height), (64, 64));
    assert_eq!(floor.pixel(10, 10).unwrap(), [7, 21, 248, 255]);

    let shot = store.sound("DSSHOT").unwrap();
    assert_eq!(shot.sample_rate, 11025);
    assert_eq!(shot.samples, vec![-128, -64, 0, 64, 127]);

    let map = store.map("E1M1").unwrap();
    assert_eq!(map.vertices.len(), 3);
    assert_eq!(map.things.len(), 1);
    assert_eq!(map.linedefs.len(), 1);
    assert_eq!(map.linedefs[0].back_side, -1);
    assert!(map.sectors.is_empty());
    assert!(map.issues.is_empty());

    // The marker run ended at E1M2, whose own tables are separate.
    let next = store.map("E1M2").unwrap();
    assert_eq!(next.vertices.len(), 1);
}

#[test]
fn later_lump_overrides_earlier_one() {
    // A duplicated sound name, as produced by merging a patch archive
    // over a base set: the later lump must win.
    let wad = WadArchive::from_bytes(
        fixture()
            .lump("DSSHOT", &sound_lump(22050, &[128]))
            .build(),
    )
    .unwrap();
    let store = AssetStore::new(wad);

    let shot = store.sound("DSSHOT").unwrap();
    assert_eq!(shot.sample_rate, 22050);
    assert_eq!(shot.samples, vec![0]);
}

#[test]
fn corrupt_resource_does_not_poison_the_rest() {
    let wad = WadArchive::from_bytes(
        fixture()
            .lump("DSBAD", &[1, 2, 3]) // too short for a sound header
            .build(),
    )
    .unwrap();
    let store = AssetStore::new(wad);

    assert!(store.sound("DSBAD").is_none());
    assert!(store.sound("DSBAD").is_none());
    // Healthy resources are unaffected.
    assert!(store.sound("DSSHOT").is_some());
    assert!(store.patch("TITLEPIC").is_some());
}

#[test]
fn map_requires_its_marker() {
    let store = AssetStore::new(WadArchive::from_bytes(fixture().build()).unwrap());
    assert!(matches!(
        store.map("MAP01"),
        Err(AssetError::MapNotFound(_))
    ));
}

#[test]
fn concurrent_access_converges() {
    let store = Arc::new(AssetStore::new(
        WadArchive::from_bytes(fixture().build()).unwrap(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let palette = store.palette();
                let title = store.patch("TITLEPIC").unwrap();
                let shot = store.sound("DSSHOT").unwrap();
                assert!(store.sound("DSMISSING").is_none());
                (palette, title, shot)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Every thread ended up holding the same converged artifacts.
    let (palette, title, shot) = &results[0];
    for (p, t, s) in &results[1..] {
        assert!(Arc::ptr_eq(palette, p));
        assert!(Arc::ptr_eq(title, t));
        assert!(Arc::ptr_eq(shot, s));
    }
}

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSave {
    Saved { entries: usize },
    Failed(String),
}

impl SnapshotSave {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Result of restoring a snapshot. Every variant except `Loaded` is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLoad {
    Loaded { entries: usize },
    Missing,
    Unreadable(String),
    Malformed(String),
    UnsupportedVersion(u64),
}

impl SnapshotLoad {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

#[derive(Serialize)]
struct SnapshotFileRef<'a, V> {
    version: u64,
    entries: EntriesRef<'a, V>,
}

struct EntriesRef<'a, V>(&'a [(String, V)]);

impl<V: Serialize> Serialize for EntriesRef<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u64,
}

#[derive(Deserialize)]
struct SnapshotFile<V> {
    entries: OrderedEntries<V>,
}

/// JSON object decoded as a list so on-disk order survives the round trip.
struct OrderedEntries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of cache keys to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

pub(crate) fn write_snapshot<V: Serialize>(path: &Path, entries: &[(String, V)]) -> SnapshotSave {
    match try_write_snapshot(path, entries) {
        Ok(()) => SnapshotSave::Saved {
            entries: entries.len(),
        },
        Err(err) => SnapshotSave::Failed(format!("{}: {err}", path.display())),
    }
}

fn try_write_snapshot<V: Serialize>(path: &Path, entries: &[(String, V)]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let file = SnapshotFileRef {
        version: SNAPSHOT_SCHEMA_VERSION,
        entries: EntriesRef(entries),
    };
    let bytes = serde_json::to_vec_pretty(&file).map_err(io::Error::other)?;

    // Same directory as the destination so the rename stays on one filesystem.
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub(crate) fn read_snapshot<V: DeserializeOwned>(
    path: &Path,
) -> Result<Vec<(String, V)>, SnapshotLoad> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(SnapshotLoad::Missing),
        Err(err) => return Err(SnapshotLoad::Unreadable(err.to_string())),
    };

    let probe: VersionProbe = serde_json::from_slice(&bytes)
        .map_err(|err| SnapshotLoad::Malformed(err.to_string()))?;
    if probe.version != SNAPSHOT_SCHEMA_VERSION {
        return Err(SnapshotLoad::UnsupportedVersion(probe.version));
    }

    let file: SnapshotFile<V> = serde_json::from_slice(&bytes)
        .map_err(|err| SnapshotLoad::Malformed(err.to_string()))?;
    Ok(file.entries.0)
}

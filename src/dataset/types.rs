//! Dataset, snapshot, and property types.

use std::fmt;
use std::fs::File;

use serde::Serialize;

use crate::dataset::builders::{
    get_invocation, hold_invocation, holds_invocation, inherit_invocation, release_invocation,
    set_invocation, verbose_enabled, DestroyOptions, FindOptions, SendOptions, SnapshotOptions,
};
use crate::dataset::{find, open};
use crate::exec::{self, Row, SendStream, ZfsError};

/// Kind of a named storage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// A mountable filesystem.
    Filesystem,
    /// A block device volume.
    Volume,
    /// A read-only point-in-time snapshot.
    Snapshot,
}

impl DatasetKind {
    /// The name the zfs tool uses for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Volume => "volume",
            Self::Snapshot => "snapshot",
        }
    }

    pub(crate) fn parse(s: &str) -> Result<Self, ZfsError> {
        match s {
            "filesystem" => Ok(Self::Filesystem),
            "volume" => Ok(Self::Volume),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(ZfsError::UnexpectedOutput(format!(
                "unknown dataset type '{other}'"
            ))),
        }
    }
}

/// A named dataset reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    name: String,
    kind: DatasetKind,
}

impl Dataset {
    /// Wrap an already known dataset name.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DatasetKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub(crate) fn from_row(row: Row) -> Result<Self, ZfsError> {
        let [name, kind]: [String; 2] = row.try_into().map_err(|row: Row| {
            ZfsError::UnexpectedOutput(format!("expected name and type, got {} fields", row.len()))
        })?;
        Ok(Self {
            kind: DatasetKind::parse(&kind)?,
            name,
        })
    }

    /// The full dataset path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dataset kind.
    #[must_use]
    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// View this dataset as a snapshot, if it is one.
    #[must_use]
    pub fn as_snapshot(&self) -> Option<Snapshot> {
        (self.kind == DatasetKind::Snapshot).then(|| Snapshot::new(self.name.clone()))
    }

    /// Open the parent dataset, or `None` for a pool root.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying listing command.
    pub async fn parent(&self) -> Result<Option<Dataset>, ZfsError> {
        match self.name.rsplit_once('/') {
            Some((parent, _)) => Ok(Some(open(parent).await?)),
            None => Ok(None),
        }
    }

    /// Child filesystems, excluding this dataset itself.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying listing command.
    pub async fn filesystems(&self, recursive: bool) -> Result<Vec<Dataset>, ZfsError> {
        Ok(self
            .descendants(recursive, &[DatasetKind::Filesystem])
            .await?
            .into_iter()
            .filter(|d| d.name != self.name)
            .collect())
    }

    /// Snapshots of this dataset.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying listing command.
    pub async fn snapshots(&self, recursive: bool) -> Result<Vec<Snapshot>, ZfsError> {
        Ok(self
            .descendants(recursive, &[DatasetKind::Snapshot])
            .await?
            .into_iter()
            .map(|d| Snapshot::new(d.name))
            .collect())
    }

    /// Child datasets of every kind, excluding this dataset itself.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying listing command.
    pub async fn children(&self, recursive: bool) -> Result<Vec<Dataset>, ZfsError> {
        Ok(self
            .descendants(recursive, &[])
            .await?
            .into_iter()
            .filter(|d| d.name != self.name)
            .collect())
    }

    async fn descendants(
        &self,
        recursive: bool,
        types: &[DatasetKind],
    ) -> Result<Vec<Dataset>, ZfsError> {
        let mut options = FindOptions::default().types(types);
        if !recursive {
            options = options.depth(1);
        }
        find(&[&self.name], &options).await
    }

    /// Destroy this dataset.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::Busy` if the dataset is in use, or another typed
    /// error reported by the tool.
    pub async fn destroy(&self, options: &DestroyOptions) -> Result<(), ZfsError> {
        exec::run(&options.build(&self.name)).await
    }

    /// Take a snapshot named `snapname` of this dataset.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::AlreadyExists` if the snapshot exists, or
    /// another typed error reported by the tool.
    pub async fn snapshot(
        &self,
        snapname: &str,
        options: &SnapshotOptions,
    ) -> Result<Snapshot, ZfsError> {
        let name = format!("{}@{snapname}", self.name);
        exec::run(&options.build(&name)).await?;
        Ok(Snapshot::new(name))
    }

    /// All properties of this dataset.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying `zfs get` command.
    pub async fn props(&self) -> Result<Vec<Property>, ZfsError> {
        let rows = exec::capture(&get_invocation(&self.name, &["all"])).await?;
        rows.into_iter().map(Property::from_row).collect()
    }

    /// One property of this dataset.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying `zfs get` command, or
    /// `ZfsError::UnexpectedOutput` if the tool returned no row.
    pub async fn prop(&self, prop: &str) -> Result<Property, ZfsError> {
        let rows = exec::capture(&get_invocation(&self.name, &[prop])).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| {
                ZfsError::UnexpectedOutput(format!("no value reported for property '{prop}'"))
            })
            .and_then(Property::from_row)
    }

    /// The value of one property, with the tool's `-` placeholder mapped
    /// to `None`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying `zfs get` command.
    pub async fn prop_value(&self, prop: &str) -> Result<Option<String>, ZfsError> {
        let value = self.prop(prop).await?.value;
        Ok((value != "-").then_some(value))
    }

    /// Set a property on this dataset.
    ///
    /// # Errors
    ///
    /// Propagates the typed error reported by the tool.
    pub async fn set_prop(&self, prop: &str, value: &str) -> Result<(), ZfsError> {
        exec::run(&set_invocation(&self.name, prop, value)).await
    }

    /// Reset a property to its inherited value.
    ///
    /// # Errors
    ///
    /// Propagates the typed error reported by the tool.
    pub async fn inherit_prop(&self, prop: &str, recursive: bool) -> Result<(), ZfsError> {
        exec::run(&inherit_invocation(&self.name, prop, recursive)).await
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A snapshot, with the operations only snapshots support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    name: String,
}

impl Snapshot {
    /// Wrap an already known snapshot name (`dataset@snapname`).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The full snapshot path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The part after the `@`.
    #[must_use]
    pub fn snapname(&self) -> &str {
        self.name
            .rsplit_once('@')
            .map_or(self.name.as_str(), |(_, snap)| snap)
    }

    /// View as a plain dataset for the shared operations.
    #[must_use]
    pub fn as_dataset(&self) -> Dataset {
        Dataset::new(self.name.clone(), DatasetKind::Snapshot)
    }

    /// Open the dataset this snapshot belongs to.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying listing command.
    pub async fn parent(&self) -> Result<Option<Dataset>, ZfsError> {
        match self.name.rsplit_once('@') {
            Some((parent, _)) => Ok(Some(open(parent).await?)),
            None => Ok(None),
        }
    }

    /// Open a stream of this snapshot's contents.
    ///
    /// Returns as soon as the process has spawned; a failed send surfaces
    /// its typed error when the stream is closed.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::Io` if the process cannot be spawned.
    pub fn send(&self, options: &SendOptions) -> Result<SendStream, ZfsError> {
        SendStream::open(&options.build(&self.name, verbose_enabled()))
    }

    /// Write this snapshot's stream to an open file.
    ///
    /// # Errors
    ///
    /// Propagates the typed error reported by the tool.
    pub async fn send_to(&self, options: &SendOptions, output: File) -> Result<(), ZfsError> {
        exec::run_with_output(&options.build(&self.name, verbose_enabled()), output).await
    }

    /// Place a hold tag on this snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::TagExists` if the tag is already present, or
    /// another typed error reported by the tool.
    pub async fn hold(&self, tag: &str, recursive: bool) -> Result<(), ZfsError> {
        exec::run(&hold_invocation(&self.name, tag, recursive)).await
    }

    /// List the hold tags on this snapshot.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying `zfs holds` command, or
    /// `ZfsError::UnexpectedOutput` if a row lacks the tag column.
    pub async fn holds(&self) -> Result<Vec<String>, ZfsError> {
        let rows = exec::capture(&holds_invocation(&self.name)).await?;
        rows.into_iter()
            .map(|mut row| {
                if row.len() < 2 {
                    return Err(ZfsError::UnexpectedOutput(format!(
                        "expected name and tag, got {} fields",
                        row.len()
                    )));
                }
                Ok(row.swap_remove(1))
            })
            .collect()
    }

    /// Release a hold tag from this snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::TagNotFound` if the tag is absent, or another
    /// typed error reported by the tool.
    pub async fn release(&self, tag: &str, recursive: bool) -> Result<(), ZfsError> {
        exec::run(&release_invocation(&self.name, tag, recursive)).await
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One row of `zfs get -H -p` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Dataset the property was read from.
    pub dataset: String,
    /// Property name.
    pub name: String,
    /// Property value; `-` means unset.
    pub value: String,
    /// Where the value comes from (local, inherited, default, ...).
    pub source: String,
}

impl Property {
    pub(crate) fn from_row(row: Row) -> Result<Self, ZfsError> {
        let [dataset, name, value, source]: [String; 4] = row.try_into().map_err(|row: Row| {
            ZfsError::UnexpectedOutput(format!(
                "expected name, property, value, source, got {} fields",
                row.len()
            ))
        })?;
        Ok(Self {
            dataset,
            name,
            value,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            DatasetKind::Filesystem,
            DatasetKind::Volume,
            DatasetKind::Snapshot,
        ] {
            assert_eq!(DatasetKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_parse_rejects_unknown() {
        let err = DatasetKind::parse("bookmark").unwrap_err();
        assert!(matches!(err, ZfsError::UnexpectedOutput(_)));
    }

    #[test]
    fn test_dataset_from_row() {
        let row = vec!["tank/home".to_string(), "filesystem".to_string()];
        let dataset = Dataset::from_row(row).unwrap();
        assert_eq!(dataset.name(), "tank/home");
        assert_eq!(dataset.kind(), DatasetKind::Filesystem);
    }

    #[test]
    fn test_dataset_from_row_wrong_arity() {
        let err = Dataset::from_row(vec!["tank".to_string()]).unwrap_err();
        assert!(matches!(err, ZfsError::UnexpectedOutput(_)));
    }

    #[test]
    fn test_as_snapshot_requires_snapshot_kind() {
        let fs = Dataset::new("tank/home", DatasetKind::Filesystem);
        assert!(fs.as_snapshot().is_none());

        let snap = Dataset::new("tank/home@backup", DatasetKind::Snapshot);
        let snap = snap.as_snapshot().unwrap();
        assert_eq!(snap.snapname(), "backup");
    }

    #[test]
    fn test_snapname_splits_on_last_at() {
        let snap = Snapshot::new("tank/home@2026-08-29");
        assert_eq!(snap.snapname(), "2026-08-29");
        assert_eq!(snap.name(), "tank/home@2026-08-29");
    }

    #[test]
    fn test_property_from_row() {
        let row = vec![
            "tank/home".to_string(),
            "compression".to_string(),
            "lz4".to_string(),
            "local".to_string(),
        ];
        let prop = Property::from_row(row).unwrap();
        assert_eq!(prop.dataset, "tank/home");
        assert_eq!(prop.name, "compression");
        assert_eq!(prop.value, "lz4");
        assert_eq!(prop.source, "local");
    }

    #[test]
    fn test_property_from_row_wrong_arity() {
        let row = vec!["tank".to_string(), "quota".to_string()];
        let err = Property::from_row(row).unwrap_err();
        assert!(matches!(err, ZfsError::UnexpectedOutput(_)));
    }

    #[test]
    fn test_dataset_serializes_with_lowercase_kind() {
        let dataset = Dataset::new("tank", DatasetKind::Filesystem);
        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(json, r#"{"name":"tank","kind":"filesystem"}"#);
    }
}

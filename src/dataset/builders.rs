//! Option builders that assemble zfs invocations.
//!
//! Each builder owns the flag vocabulary of one subcommand and produces an
//! [`Invocation`] as a pure function, so the argv contract is testable
//! without touching a process.

use crate::dataset::DatasetKind;
use crate::exec::Invocation;

/// Whether transfer commands should ask the tool for verbose progress.
///
/// Mirrors the drain's severity policy: when INFO logging is enabled the
/// progress lines will actually be surfaced, so `-v` is worth the cost.
pub(crate) fn verbose_enabled() -> bool {
    tracing::enabled!(tracing::Level::INFO)
}

/// Options for `zfs list` style queries.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    depth: Option<u32>,
    types: Vec<DatasetKind>,
}

impl FindOptions {
    /// Limit recursion to `depth` levels; without this the listing is
    /// fully recursive.
    #[must_use]
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Restrict the listing to the given dataset kinds.
    #[must_use]
    pub fn types(mut self, types: &[DatasetKind]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub(crate) fn build(&self, paths: &[&str]) -> Invocation {
        let mut inv = Invocation::zfs("list");

        match self.depth {
            Some(depth) => inv = inv.arg("-d").arg(depth.to_string()),
            None => inv = inv.arg("-r"),
        }

        inv = inv.arg("-t");
        if self.types.is_empty() {
            inv = inv.arg("all");
        } else {
            let types: Vec<&str> = self.types.iter().copied().map(DatasetKind::as_str).collect();
            inv = inv.arg(types.join(","));
        }

        inv = inv.args(["-H", "-o", "name,type"]);
        inv.args(paths.iter().copied())
    }
}

/// Options for `zfs create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    parents: bool,
    props: Vec<(String, String)>,
}

impl CreateOptions {
    /// Create missing parent filesystems (`-p`).
    #[must_use]
    pub fn parents(mut self) -> Self {
        self.parents = true;
        self
    }

    /// Set a property on the new filesystem (`-o prop=value`).
    #[must_use]
    pub fn prop(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.push((prop.into(), value.into()));
        self
    }

    pub(crate) fn build(&self, name: &str) -> Invocation {
        let mut inv = Invocation::zfs("create");
        if self.parents {
            inv = inv.arg("-p");
        }
        for (prop, value) in &self.props {
            inv = inv.arg("-o").arg(format!("{prop}={value}"));
        }
        inv.arg(name)
    }
}

/// Options for `zfs destroy`.
#[derive(Debug, Clone, Default)]
pub struct DestroyOptions {
    defer: bool,
    force: bool,
}

impl DestroyOptions {
    /// Defer destruction of a held snapshot (`-d`).
    #[must_use]
    pub fn defer(mut self) -> Self {
        self.defer = true;
        self
    }

    /// Force unmount and destroy dependents (`-f -R`).
    #[must_use]
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub(crate) fn build(&self, name: &str) -> Invocation {
        let mut inv = Invocation::zfs("destroy");
        if self.defer {
            inv = inv.arg("-d");
        }
        if self.force {
            inv = inv.arg("-f").arg("-R");
        }
        inv.arg(name)
    }
}

/// Options for `zfs snapshot`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    recursive: bool,
    props: Vec<(String, String)>,
}

impl SnapshotOptions {
    /// Snapshot all descendant datasets too (`-r`).
    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Set a property on the new snapshot (`-o prop=value`).
    #[must_use]
    pub fn prop(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.push((prop.into(), value.into()));
        self
    }

    pub(crate) fn build(&self, name: &str) -> Invocation {
        let mut inv = Invocation::zfs("snapshot");
        if self.recursive {
            inv = inv.arg("-r");
        }
        for (prop, value) in &self.props {
            inv = inv.arg("-o").arg(format!("{prop}={value}"));
        }
        inv.arg(name)
    }
}

/// Options for `zfs send`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    base: Option<String>,
    intermediates: bool,
    replicate: bool,
    properties: bool,
    deduplicate: bool,
}

impl SendOptions {
    /// Send an incremental stream from `base` (`-i base`).
    #[must_use]
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Include intermediate snapshots in an incremental stream
    /// (`-I base` instead of `-i base`).
    #[must_use]
    pub fn intermediates(mut self) -> Self {
        self.intermediates = true;
        self
    }

    /// Send a replication stream (`-R`).
    #[must_use]
    pub fn replicate(mut self) -> Self {
        self.replicate = true;
        self
    }

    /// Include dataset properties (`-p`).
    #[must_use]
    pub fn properties(mut self) -> Self {
        self.properties = true;
        self
    }

    /// Deduplicate the stream (`-D`).
    #[must_use]
    pub fn deduplicate(mut self) -> Self {
        self.deduplicate = true;
        self
    }

    pub(crate) fn build(&self, name: &str, verbose: bool) -> Invocation {
        let mut inv = Invocation::zfs("send");
        if verbose {
            inv = inv.arg("-v");
        }
        if self.replicate {
            inv = inv.arg("-R");
        }
        if self.properties {
            inv = inv.arg("-p");
        }
        if self.deduplicate {
            inv = inv.arg("-D");
        }
        if let Some(base) = &self.base {
            inv = inv.arg(if self.intermediates { "-I" } else { "-i" });
            inv = inv.arg(base.clone());
        }
        inv.arg(name)
    }
}

/// Options for `zfs receive`.
#[derive(Debug, Clone, Default)]
pub struct ReceiveOptions {
    append_name: bool,
    append_path: bool,
    force: bool,
    nomount: bool,
}

impl ReceiveOptions {
    /// Append the sent snapshot's name to the target (`-e`).
    #[must_use]
    pub fn append_name(mut self) -> Self {
        self.append_name = true;
        self
    }

    /// Append the sent snapshot's path to the target (`-d`).
    ///
    /// Ignored when [`ReceiveOptions::append_name`] is also set, which
    /// takes precedence.
    #[must_use]
    pub fn append_path(mut self) -> Self {
        self.append_path = true;
        self
    }

    /// Roll back the target to the most recent snapshot first (`-F`).
    #[must_use]
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Do not mount the received filesystem (`-u`).
    #[must_use]
    pub fn nomount(mut self) -> Self {
        self.nomount = true;
        self
    }

    pub(crate) fn build(&self, name: &str, verbose: bool) -> Invocation {
        let mut inv = Invocation::zfs("receive");
        if verbose {
            inv = inv.arg("-v");
        }
        if self.append_name {
            inv = inv.arg("-e");
        } else if self.append_path {
            inv = inv.arg("-d");
        }
        if self.force {
            inv = inv.arg("-F");
        }
        if self.nomount {
            inv = inv.arg("-u");
        }
        inv.arg(name)
    }
}

pub(crate) fn get_invocation(name: &str, props: &[&str]) -> Invocation {
    Invocation::zfs("get")
        .args(["-H", "-p"])
        .arg(props.join(","))
        .arg(name)
}

pub(crate) fn set_invocation(name: &str, prop: &str, value: &str) -> Invocation {
    Invocation::zfs("set").arg(format!("{prop}={value}")).arg(name)
}

pub(crate) fn inherit_invocation(name: &str, prop: &str, recursive: bool) -> Invocation {
    let mut inv = Invocation::zfs("inherit");
    if recursive {
        inv = inv.arg("-r");
    }
    inv.arg(prop).arg(name)
}

pub(crate) fn hold_invocation(name: &str, tag: &str, recursive: bool) -> Invocation {
    let mut inv = Invocation::zfs("hold");
    if recursive {
        inv = inv.arg("-r");
    }
    inv.arg(tag).arg(name)
}

pub(crate) fn holds_invocation(name: &str) -> Invocation {
    Invocation::zfs("holds").arg("-H").arg(name)
}

pub(crate) fn release_invocation(name: &str, tag: &str, recursive: bool) -> Invocation {
    let mut inv = Invocation::zfs("release");
    if recursive {
        inv = inv.arg("-r");
    }
    inv.arg(tag).arg(name)
}

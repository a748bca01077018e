//! Command invocations: ordered argument vectors for the zfs binary.
//!
//! An invocation is a plain token sequence, one flag or value per element,
//! and is never passed through a shell. Dataset names containing spaces or
//! shell metacharacters therefore travel unmangled.

use std::fmt;

/// A fully assembled command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    /// Create an invocation for an arbitrary program.
    ///
    /// Used by tests to substitute a stand-in for the zfs binary; library
    /// callers go through [`Invocation::zfs`].
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Create an invocation of a zfs subcommand, e.g. `zfs list`.
    #[must_use]
    pub fn zfs(subcommand: &str) -> Self {
        Self::new("zfs").arg(subcommand)
    }

    /// Append a single token.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a sequence of tokens.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument tokens, in order.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Whether the invocation carries the verbose flag.
    ///
    /// Transfer and mutation subcommands (send, receive, destroy, mount,
    /// upgrade) emit progress on stderr when `-v` is passed; the drain
    /// logs their output at INFO instead of DEBUG.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.args.iter().any(|a| a == "-v")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zfs_invocation_tokens() {
        let inv = Invocation::zfs("list").arg("-H").args(["-o", "name,type"]);
        assert_eq!(inv.program(), "zfs");
        assert_eq!(inv.argv(), ["list", "-H", "-o", "name,type"]);
    }

    #[test]
    fn test_verbose_detection() {
        assert!(Invocation::zfs("send").arg("-v").arg("tank@snap").verbose());
        assert!(!Invocation::zfs("list").arg("-H").verbose());
    }

    #[test]
    fn test_verbose_only_matches_exact_token() {
        // A dataset name containing "-v" as a substring must not count.
        let inv = Invocation::zfs("destroy").arg("tank/some-volume");
        assert!(!inv.verbose());
    }

    #[test]
    fn test_display_joins_tokens() {
        let inv = Invocation::zfs("get").args(["-H", "-p", "all", "tank/foo"]);
        assert_eq!(inv.to_string(), "zfs get -H -p all tank/foo");
    }

    #[test]
    fn test_dataset_name_with_spaces_is_one_token() {
        let inv = Invocation::zfs("destroy").arg("tank/my data");
        assert_eq!(inv.argv(), ["destroy", "tank/my data"]);
    }
}

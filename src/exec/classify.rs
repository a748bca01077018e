//! Exit-status classification against known zfs diagnostic phrasing.
//!
//! This is a pure function of the captured exit status and diagnostic
//! text; it performs no I/O and can be unit-tested without spawning a
//! process. The patterns are a byte-exact contract with the zfs tool's
//! English error messages and must be kept in lockstep with them.

use std::sync::OnceLock;

use regex::Regex;

use crate::exec::ZfsError;

/// Which typed error a matched signature produces.
#[derive(Debug, Clone, Copy)]
enum SignatureKind {
    NotFound,
    AlreadyExists,
    Busy,
    TagNotFound,
    TagExists,
}

impl SignatureKind {
    fn into_error(self, name: String, stderr: String) -> ZfsError {
        match self {
            Self::NotFound => ZfsError::NotFound { name, stderr },
            Self::AlreadyExists => ZfsError::AlreadyExists { name, stderr },
            Self::Busy => ZfsError::Busy { name, stderr },
            Self::TagNotFound => ZfsError::TagNotFound { name, stderr },
            Self::TagExists => ZfsError::TagExists { name, stderr },
        }
    }
}

struct Signature {
    pattern: Regex,
    kind: SignatureKind,
}

/// Ordered signature table; the first match wins.
///
/// Capture group 1 is always the offending dataset or snapshot name.
fn signatures() -> &'static [Signature] {
    static SIGNATURES: OnceLock<Vec<Signature>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        [
            (
                r"^cannot open '([^']+)': dataset does not exist$",
                SignatureKind::NotFound,
            ),
            (
                r"^cannot create \w+ '([^']+)': dataset already exists$",
                SignatureKind::AlreadyExists,
            ),
            (
                r"^cannot destroy '([^']+)': dataset is busy$",
                SignatureKind::Busy,
            ),
            (
                r"^cannot release '[^']+' from '([^']+)': no such tag on this dataset$",
                SignatureKind::TagNotFound,
            ),
            (
                r"^cannot hold '([^']+)': tag already exists on this dataset$",
                SignatureKind::TagExists,
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, kind)| match Regex::new(pattern) {
            Ok(pattern) => Some(Signature { pattern, kind }),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compile diagnostic signature");
                None
            }
        })
        .collect()
    })
}

/// Classify a completed command's exit status and last diagnostic line.
///
/// Status 0 is success regardless of diagnostic content. Status 1 is
/// matched against the signature table; an unmatched diagnostic (or none
/// at all) and every other status fall through to [`ZfsError::Failure`]
/// with the diagnostic text preserved verbatim.
///
/// # Errors
///
/// Returns the typed error corresponding to the first matching signature,
/// or `ZfsError::Failure` for any other nonzero status.
pub fn classify_exit(status: i32, stderr: Option<&str>) -> Result<(), ZfsError> {
    if status == 0 {
        return Ok(());
    }

    if status == 1 {
        if let Some(line) = stderr {
            for signature in signatures() {
                if let Some(caps) = signature.pattern.captures(line) {
                    let name = caps[1].to_string();
                    return Err(signature.kind.into_error(name, line.to_string()));
                }
            }
        }
    }

    Err(ZfsError::Failure {
        status,
        stderr: stderr.unwrap_or_default().to_string(),
    })
}

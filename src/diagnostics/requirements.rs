//! Minimum package versions.

use crate::diagnostics::python::InstalledPackage;
use crate::settings::Requirement;
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
pub struct RequirementStatus {
    pub name: String,
    pub minimum: String,
    pub installed: Option<String>,
    pub satisfied: bool,
}

impl RequirementStatus {
    pub fn describe(&self) -> String {
        match (&self.installed, self.satisfied) {
            (Some(version), true) => format!("✓ {} {} installed", self.name, version),
            (Some(version), false) => format!(
                "{} version {} is older than required version {}",
                self.name, version, self.minimum
            ),
            (None, _) => format!("✗ {} not found", self.name),
        }
    }
}

/// Where a version sits relative to its release
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Dev,
    Alpha,
    Beta,
    Candidate,
    Final,
    Post,
}

const STAGE_PREFIXES: &[(&str, Stage)] = &[
    ("dev", Stage::Dev),
    ("post", Stage::Post),
    ("preview", Stage::Candidate),
    ("pre", Stage::Candidate),
    ("rev", Stage::Post),
    ("rc", Stage::Candidate),
    ("alpha", Stage::Alpha),
    ("beta", Stage::Beta),
    ("a", Stage::Alpha),
    ("b", Stage::Beta),
    ("c", Stage::Candidate),
    ("r", Stage::Post),
];

#[derive(Debug, PartialEq)]
struct Version {
    release: Vec<u64>,
    stage: Stage,
    number: u64,
}

/// Split `6.6.1.dev0` into release `[6, 6, 1]` and a `dev 0` suffix.
/// Local labels (`+cpu`) are ignored and an unknown suffix counts as final.
fn parse_version(v: &str) -> Version {
    let v = v.trim().to_lowercase();
    let v = v.split('+').next().unwrap_or_default();
    let v = v.strip_prefix('v').unwrap_or(v);

    let mut release = Vec::new();
    let mut rest = v;
    while !rest.is_empty() {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let Ok(part) = rest[..digits].parse::<u64>() else {
            break;
        };
        release.push(part);
        rest = &rest[digits..];
        match rest.strip_prefix('.') {
            Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
            _ => break,
        }
    }

    let suffix = rest.trim_start_matches(['.', '-', '_']);
    let (stage, number) = STAGE_PREFIXES
        .iter()
        .find_map(|(prefix, stage)| suffix.strip_prefix(*prefix).map(|tail| (*stage, tail)))
        .map(|(stage, tail)| {
            let tail = tail.trim_start_matches(['.', '-', '_']);
            let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
            (stage, digits.parse().unwrap_or(0))
        })
        .unwrap_or((Stage::Final, 0));

    Version {
        release,
        stage,
        number,
    }
}

/// Compare versions: release components first, zero-padded, then the
/// pre/dev/post suffix, so `6.6.1.dev0 < 6.6.1rc1 < 6.6.1 < 6.6.1.post1`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (parse_version(a), parse_version(b));
    let len = a.release.len().max(b.release.len());

    for i in 0..len {
        let (x, y) = (a.release.get(i).unwrap_or(&0), b.release.get(i).unwrap_or(&0));
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    (a.stage, a.number).cmp(&(b.stage, b.number))
}

/// Package names compare case-insensitively with `-` and `_` folded
fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

pub fn evaluate(requirements: &[Requirement], installed: &[InstalledPackage]) -> Vec<RequirementStatus> {
    requirements
        .iter()
        .map(|req| {
            let found = installed
                .iter()
                .find(|pkg| normalize(&pkg.name) == normalize(&req.name))
                .map(|pkg| pkg.version.clone());
            let satisfied = found
                .as_deref()
                .map(|v| compare_versions(v, &req.minimum) != Ordering::Less)
                .unwrap_or(false);

            RequirementStatus {
                name: req.name.clone(),
                minimum: req.minimum.clone(),
                installed: found,
                satisfied,
            }
        })
        .collect()
}

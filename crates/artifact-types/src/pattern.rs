//! Glob pattern sets for item selection
//!
//! A pattern set is one or more newline-separated globs. Lines starting with
//! `!` exclude. Supported syntax:
//!
//! - `*` matches any run of characters inside one path segment
//! - `?` matches exactly one character inside one path segment
//! - `**` as a whole segment matches zero or more segments
//!
//! ```rust
//! use artifact_types::PatternSet;
//!
//! let set = PatternSet::parse("**/*.txt\n!logs/**").unwrap();
//! assert!(set.is_match("dir/b.txt"));
//! assert!(!set.is_match("logs/run.txt"));
//! ```

use crate::{normalize_path, Error, Result};
use std::fmt;

/// Pattern that selects every item
pub const MATCH_ALL: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    AnyDepth,
    Glob(String),
}

/// A single compiled glob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    source: String,
    segments: Vec<Segment>,
}

impl Glob {
    /// Compile a glob
    pub fn new(pattern: &str) -> Result<Self> {
        let source = normalize_path(pattern);
        if source.is_empty() {
            return Err(Error::config(format!("Empty glob pattern: '{}'", pattern)));
        }

        let segments = source
            .split('/')
            .map(|segment| {
                if segment == "**" {
                    Segment::AnyDepth
                } else {
                    Segment::Glob(segment.to_string())
                }
            })
            .collect();

        Ok(Self { source, segments })
    }

    /// Check whether a normalized item path matches
    pub fn is_match(&self, path: &str) -> bool {
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        match_segments(&self.segments, &parts)
    }

    /// Normalized pattern text
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((head, tail)) => wildcard_match(glob, head) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Match one path segment against a glob supporting `*` and `?`.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = name.chars().collect();
    let (mut pi, mut si) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut match_i = 0usize;

    while si < s.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            pi += 1;
            match_i = si;
        } else if let Some(star_pi) = star {
            pi = star_pi + 1;
            match_i += 1;
            si = match_i;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Inclusion and exclusion globs parsed from an `item_pattern` option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    includes: Vec<Glob>,
    excludes: Vec<Glob>,
}

impl PatternSet {
    /// Parse newline-separated globs; `!` marks an exclusion.
    ///
    /// A set with only exclusions includes everything else.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();

        for line in pattern.lines().map(str::trim).filter(|line| !line.is_empty()) {
            match line.strip_prefix('!') {
                Some(negated) => excludes.push(Glob::new(negated.trim())?),
                None => includes.push(Glob::new(line)?),
            }
        }

        if includes.is_empty() && excludes.is_empty() {
            return Err(Error::config("Item pattern must not be empty"));
        }
        if includes.is_empty() {
            includes.push(Glob::new(MATCH_ALL)?);
        }

        Ok(Self { includes, excludes })
    }

    /// Pattern set selecting every item
    pub fn match_all() -> Self {
        Self {
            includes: vec![Glob {
                source: MATCH_ALL.to_string(),
                segments: vec![Segment::AnyDepth],
            }],
            excludes: Vec::new(),
        }
    }

    /// Check whether a normalized item path is selected
    pub fn is_match(&self, path: &str) -> bool {
        self.includes.iter().any(|glob| glob.is_match(path))
            && !self.excludes.iter().any(|glob| glob.is_match(path))
    }

    /// True when this set selects every path
    pub fn is_match_all(&self) -> bool {
        self.excludes.is_empty() && self.includes.iter().any(|glob| glob.as_str() == MATCH_ALL)
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::match_all()
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .includes
            .iter()
            .map(|glob| glob.as_str().to_string())
            .chain(self.excludes.iter().map(|glob| format!("!{}", glob.as_str())))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use orgdesk_app::{Descriptor, FaceDetector};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Replays face descriptors recorded by an external detector: one JSON
/// array of descriptors per line, one line per frame. Blank lines are
/// frames with no faces.
pub struct FeedDetector {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl FeedDetector {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| {
            format!(
                "open descriptor feed {} -- fix [visitors].feed_path",
                path.display()
            )
        })?;
        Ok(Self {
            path: path.to_owned(),
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }
}

impl FaceDetector for FeedDetector {
    fn next_frame(&mut self) -> Result<Option<Vec<Descriptor>>> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        self.line_number += 1;
        let line = line.with_context(|| format!("read descriptor feed {}", self.path.display()))?;
        if line.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        let frame = serde_json::from_str(&line).with_context(|| {
            format!(
                "{}:{}: expected a JSON array of descriptors",
                self.path.display(),
                self.line_number
            )
        })?;
        Ok(Some(frame))
    }
}

/// Stands in when no feed is configured.
pub struct NoDetector;

impl FaceDetector for NoDetector {
    fn next_frame(&mut self) -> Result<Option<Vec<Descriptor>>> {
        Ok(None)
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Tracing setup. The terminal belongs to the dashboard, so events go to a
//! log file instead of stderr.
//!
//! Filter priority: `ORGDESK_LOG`, then `RUST_LOG`, then `[log].level`.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub fn init(log_file: &Path, level: &str) -> Result<()> {
    if let Some(parent) = log_file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                log_file.display()
            )
        })?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(fmt_layer)
        .try_init()
        .context("install tracing subscriber")
}

fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(directives) = std::env::var("ORGDESK_LOG")
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use orgdesk_app::CredentialStore;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config;

const SESSION_FILE: &str = "session.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    token: Option<String>,
}

/// Keeps the credential under the key `token` in a small TOML file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ORGDESK_SESSION_PATH") {
            return Ok(PathBuf::from(path));
        }
        Ok(config::data_dir()?.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read session file {}", self.path.display()))?;
        let file: SessionFile = toml::from_str(&raw).with_context(|| {
            format!(
                "parse session file {} -- delete it or run `orgdesk --logout`",
                self.path.display()
            )
        })?;
        Ok(file.token.filter(|token| !token.trim().is_empty()))
    }

    fn save(&mut self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create session directory {}", parent.display()))?;
        }
        let body = toml::to_string(&SessionFile {
            token: Some(token.to_owned()),
        })
        .context("encode session file")?;
        fs::write(&self.path, body)
            .with_context(|| format!("write session file {}", self.path.display()))
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error)
                .with_context(|| format!("remove session file {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileCredentialStore;
    use crate::test_env::env_lock;
    use anyhow::Result;
    use orgdesk_app::CredentialStore;

    #[test]
    fn save_load_clear() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut store = FileCredentialStore::new(temp.path().join("nested").join("session.toml"));
        assert_eq!(store.load()?, None);

        store.save("abc.def.ghi")?;
        let raw = std::fs::read_to_string(store.path())?;
        assert!(raw.contains("token = \"abc.def.ghi\""));
        assert_eq!(store.load()?.as_deref(), Some("abc.def.ghi"));

        store.clear()?;
        assert!(!store.path().exists());
        store.clear()?;
        Ok(())
    }

    #[test]
    fn blank_token_reads_as_signed_out() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("session.toml");
        std::fs::write(&path, "token = \"  \"\n")?;
        assert_eq!(FileCredentialStore::new(path).load()?, None);
        Ok(())
    }

    #[test]
    fn corrupt_file_names_the_fix() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("session.toml");
        std::fs::write(&path, "token = ")?;
        let error = FileCredentialStore::new(path)
            .load()
            .expect_err("corrupt file should fail");
        assert!(error.to_string().contains("orgdesk --logout"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("elsewhere.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("ORGDESK_SESSION_PATH", &override_path);
        }
        let resolved = FileCredentialStore::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("ORGDESK_SESSION_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }
}

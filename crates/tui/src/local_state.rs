use std::{fs, path::Path};

use admin_client::{PageSize, RefreshInterval};
use serde::{Deserialize, Serialize};

use crate::{app::Section, error::Result};

/// Dashboard preferences that survive restarts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalState {
    pub sections: Vec<SectionPrefs>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPrefs {
    pub section: Section,
    pub page_size: PageSize,
    pub refresh_interval: RefreshInterval,
}

impl LocalState {
    pub fn load(path: &str) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }

    pub fn prefs_for(&self, section: Section) -> Option<SectionPrefs> {
        self.sections
            .iter()
            .find(|entry| entry.section == section)
            .copied()
    }

    pub fn set_prefs(&mut self, prefs: SectionPrefs) {
        if let Some(entry) = self
            .sections
            .iter_mut()
            .find(|entry| entry.section == prefs.section)
        {
            *entry = prefs;
            return;
        }
        self.sections.push(prefs);
    }
}

use super::value::FieldMap;
use super::{ArchiveError, ArchiveResult};
use crate::domain::Section;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// In-memory image of an archive file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveDocument {
    #[serde(default)]
    pub info: FieldMap,
    #[serde(default)]
    pub nuclides: Vec<NuclideEntry>,
}

/// One nuclide record. A section is `None` until something is written to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuclideEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FieldMap>,
}

impl NuclideEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: None,
            data: None,
        }
    }

    pub fn section(&self, section: Section) -> Option<&FieldMap> {
        match section {
            Section::Info => self.info.as_ref(),
            Section::Data => self.data.as_ref(),
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut FieldMap {
        let slot = match section {
            Section::Info => &mut self.info,
            Section::Data => &mut self.data,
        };
        slot.get_or_insert_with(FieldMap::new)
    }
}

impl ArchiveDocument {
    pub fn load(path: &Path) -> ArchiveResult<Self> {
        let bytes = fs::read(path).map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ArchiveError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`ArchiveDocument::load`], but a missing file is an empty archive.
    pub fn load_or_default(path: &Path) -> ArchiveResult<Self> {
        match fs::metadata(path) {
            Ok(_) => Self::load(path),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ArchiveError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Serialize to a sibling temporary file, sync it and rename it over `path`.
    pub fn persist(&self, path: &Path) -> ArchiveResult<()> {
        let write_error = |source| ArchiveError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut bytes = serde_json::to_vec(self).map_err(|source| ArchiveError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        bytes.push(b'\n');

        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
        temp.write_all(&bytes).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(path)
            .map_err(|persist_error| write_error(persist_error.error))?;
        Ok(())
    }

    pub fn nuclide_names(&self) -> Vec<String> {
        self.nuclides.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.nuclides.iter().position(|entry| entry.name == name)
    }

    pub fn entry(&self, name: &str) -> Option<&NuclideEntry> {
        self.nuclides.iter().find(|entry| entry.name == name)
    }

    /// Existing entry for `name`, or a new one appended at the end.
    pub fn entry_mut_or_insert(&mut self, name: &str) -> &mut NuclideEntry {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.nuclides.push(NuclideEntry::new(name));
                self.nuclides.len() - 1
            }
        };
        &mut self.nuclides[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchiveDocument, NuclideEntry};
    use crate::archive::FieldValue;
    use crate::domain::Section;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_empty_archive() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("absent.json");

        let document = ArchiveDocument::load_or_default(&path).expect("load");
        assert!(document.nuclides.is_empty());
        assert!(ArchiveDocument::load(&path).is_err());
    }

    #[test]
    fn persist_roundtrips_and_keeps_insertion_order() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run.json");

        let mut document = ArchiveDocument::default();
        document
            .entry_mut_or_insert("135Xe")
            .section_mut(Section::Info)
            .insert("z".to_string(), FieldValue::Number(54.0));
        document.entry_mut_or_insert("135I");
        document.entry_mut_or_insert("135Xe");
        document.persist(&path).expect("persist");

        let loaded = ArchiveDocument::load(&path).expect("load");
        assert_eq!(loaded.nuclide_names(), vec!["135Xe", "135I"]);
        assert_eq!(loaded, document);
        assert_eq!(loaded.entry("135I"), Some(&NuclideEntry::new("135I")));
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run.json");
        std::fs::write(&path, "{ not json").expect("fixture");

        let error = ArchiveDocument::load(&path).expect_err("parse must fail");
        assert_eq!(error.placeholder(), "ARCHIVE.PARSE");
    }
}

use super::document::ArchiveDocument;
use super::value::{FieldMap, FieldValue};
use super::{ArchiveError, ArchiveResult};
use crate::domain::Section;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes records into an archive file.
///
/// Each call loads the file, applies one mutation and persists it before returning,
/// so a crash never leaves a half-written archive behind. One writer per file.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    path: PathBuf,
}

impl ArchiveWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create or update run-wide metadata. Each key is replaced independently.
    pub fn set_general_info(&self, fields: &FieldMap) -> ArchiveResult<()> {
        self.mutate(|document| {
            for (key, value) in fields {
                document.info.insert(key.clone(), value.clone());
            }
            Ok(())
        })
    }

    pub fn write_nuclide_record(
        &self,
        name: &str,
        section: Section,
        fields: &FieldMap,
    ) -> ArchiveResult<()> {
        validate_name(name)?;
        debug!(nuclide = name, section = %section, fields = fields.len(), "writing record");
        self.mutate(|document| {
            let target = document.entry_mut_or_insert(name).section_mut(section);
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
            Ok(())
        })
    }

    pub fn write_nuclide_field(
        &self,
        name: &str,
        section: Section,
        field: &str,
        value: FieldValue,
    ) -> ArchiveResult<()> {
        validate_name(name)?;
        self.mutate(|document| {
            document
                .entry_mut_or_insert(name)
                .section_mut(section)
                .insert(field.to_string(), value);
            Ok(())
        })
    }

    fn mutate(
        &self,
        apply: impl FnOnce(&mut ArchiveDocument) -> ArchiveResult<()>,
    ) -> ArchiveResult<()> {
        let mut document = ArchiveDocument::load_or_default(&self.path)?;
        apply(&mut document)?;
        document.persist(&self.path)
    }
}

/// An archive held in memory for the length of a pass.
///
/// The file is read once. [`ArchiveSession::write_nuclide`] applies every section
/// of one nuclide and persists the document before returning, so progress is
/// durable per nuclide. [`ArchiveSession::stage_nuclide`] only touches memory
/// until [`ArchiveSession::persist`]. Nothing else may write the file meanwhile.
#[derive(Debug)]
pub struct ArchiveSession {
    path: PathBuf,
    document: ArchiveDocument,
}

impl ArchiveSession {
    /// Open an existing archive. Fails when the file is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let path = path.into();
        let document = ArchiveDocument::load(&path)?;
        Ok(Self { path, document })
    }

    /// Like [`ArchiveSession::open`], but a missing file starts an empty archive.
    pub fn open_or_create(path: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let path = path.into();
        let document = ArchiveDocument::load_or_default(&path)?;
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ArchiveDocument {
        &self.document
    }

    /// Merge run-wide metadata in memory.
    pub fn stage_general_info(&mut self, fields: &FieldMap) {
        for (key, value) in fields {
            self.document.info.insert(key.clone(), value.clone());
        }
    }

    /// Merge the sections of one nuclide in memory.
    pub fn stage_nuclide(
        &mut self,
        name: &str,
        sections: &[(Section, &FieldMap)],
    ) -> ArchiveResult<()> {
        validate_name(name)?;
        let entry = self.document.entry_mut_or_insert(name);
        for (section, fields) in sections {
            let target = entry.section_mut(*section);
            for (key, value) in *fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Merge the sections of one nuclide and persist the archive.
    pub fn write_nuclide(
        &mut self,
        name: &str,
        sections: &[(Section, &FieldMap)],
    ) -> ArchiveResult<()> {
        self.stage_nuclide(name, sections)?;
        debug!(nuclide = name, sections = sections.len(), "writing nuclide");
        self.persist()
    }

    pub fn persist(&self) -> ArchiveResult<()> {
        self.document.persist(&self.path)
    }
}

fn validate_name(name: &str) -> ArchiveResult<()> {
    if name.trim().is_empty() {
        return Err(ArchiveError::EmptyName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ArchiveSession, ArchiveWriter};
    use crate::archive::{ArchiveDocument, FieldMap, FieldValue};
    use crate::domain::Section;
    use tempfile::TempDir;

    fn fields(entries: &[(&str, FieldValue)]) -> FieldMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn writes_accumulate_and_replace_per_field() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = ArchiveWriter::new(temp.path().join("run.json"));

        writer
            .write_nuclide_record(
                "135I",
                Section::Info,
                &fields(&[("z", 53.0.into()), ("Q", 2634.0.into())]),
            )
            .expect("first write");
        writer
            .write_nuclide_field("135I", Section::Info, "Q", 2627.0.into())
            .expect("second write");

        let document = ArchiveDocument::load(writer.path()).expect("load");
        let info = document.entry("135I").and_then(|entry| entry.info.as_ref()).expect("info");
        assert_eq!(info["z"], FieldValue::Number(53.0));
        assert_eq!(info["Q"], FieldValue::Number(2627.0));
        assert!(document.entry("135I").expect("entry").data.is_none());
    }

    #[test]
    fn general_info_is_last_write_wins_per_key() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = ArchiveWriter::new(temp.path().join("run.json"));

        writer
            .set_general_info(&fields(&[("E_step", 1.0.into()), ("JEFF_release", "3.3".into())]))
            .expect("first");
        writer
            .set_general_info(&fields(&[("E_step", 50.0.into())]))
            .expect("second");

        let document = ArchiveDocument::load(writer.path()).expect("load");
        assert_eq!(document.info["E_step"], FieldValue::Number(50.0));
        assert_eq!(document.info["JEFF_release"], FieldValue::from("3.3"));
    }

    #[test]
    fn empty_names_are_rejected_before_touching_the_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = ArchiveWriter::new(temp.path().join("run.json"));

        let error = writer
            .write_nuclide_field(" ", Section::Info, "z", 1.0.into())
            .expect_err("empty name");
        assert_eq!(error.placeholder(), "ARCHIVE.NAME");
        assert!(!writer.path().exists());
    }

    #[test]
    fn session_writes_all_sections_of_a_nuclide_at_once() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = ArchiveWriter::new(temp.path().join("run.json"));
        writer
            .write_nuclide_field("135I", Section::Info, "z", 53.0.into())
            .expect("seed");

        let mut session = ArchiveSession::open(writer.path()).expect("open");
        let data = fields(&[("dN_dE_tot", FieldValue::Array(vec![0.5, 0.5]))]);
        let info = fields(&[("tag", "endf_b_c".into())]);
        session
            .write_nuclide("135I", &[(Section::Data, &data), (Section::Info, &info)])
            .expect("write");

        let document = ArchiveDocument::load(writer.path()).expect("load");
        assert_eq!(&document, session.document());
        let entry = document.entry("135I").expect("entry");
        assert_eq!(entry.info.as_ref().expect("info")["z"], FieldValue::Number(53.0));
        assert_eq!(entry.info.as_ref().expect("info")["tag"], FieldValue::from("endf_b_c"));
        assert!(entry.data.as_ref().expect("data").contains_key("dN_dE_tot"));
    }

    #[test]
    fn staged_records_reach_the_file_on_persist() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run.json");

        let mut session = ArchiveSession::open_or_create(&path).expect("open");
        session.stage_general_info(&fields(&[("JEFF_release", "3.3".into())]));
        session
            .stage_nuclide("88Kr", &[(Section::Info, &fields(&[("z", 36.0.into())]))])
            .expect("stage");
        assert!(!path.exists());
        assert!(session.stage_nuclide("", &[]).is_err());

        session.persist().expect("persist");
        let document = ArchiveDocument::load(&path).expect("load");
        assert_eq!(document.nuclide_names(), vec!["88Kr"]);
        assert_eq!(document.info["JEFF_release"], FieldValue::from("3.3"));
        assert!(ArchiveSession::open(temp.path().join("missing.json")).is_err());
    }
}

use super::{NuclideOutcome, PassSummary};
use crate::adapters::RecordSource;
use crate::archive::{ArchiveSession, ArchiveWriter};
use crate::domain::{RenshapeError, RenshapeResult};
use tracing::{debug, info};

/// Write every record of `source` into the archive, plus its general info.
///
/// Used for fission yields as well as Q-values and half-lives: records merge field
/// by field into whatever the archive already holds. Malformed records are logged
/// and skipped. The archive is written once, after the last record.
pub fn ingest_records(writer: &ArchiveWriter, source: &dyn RecordSource) -> RenshapeResult<PassSummary> {
    let mut session = ArchiveSession::open_or_create(writer.path())?;
    let general_info = source.general_info();
    if !general_info.is_empty() {
        session.stage_general_info(&general_info);
    }

    let mut summary = PassSummary::default();
    for record in source.read_records()? {
        let name = record
            .as_ref()
            .map(|record| record.name.clone())
            .unwrap_or_default();
        let outcome = record.and_then(|record| {
            if record.name.trim().is_empty() {
                return Err(RenshapeError::malformed_source(
                    "SOURCE.RECORD",
                    "record has an empty nuclide name",
                ));
            }
            debug!(nuclide = %record.name, section = %record.section, "ingesting record");
            session.stage_nuclide(&record.name, &[(record.section, &record.fields)])?;
            Ok(NuclideOutcome::Written)
        });
        summary.record(&name, outcome)?;
    }
    session.persist()?;

    info!(archive = %writer.path().display(), %summary, "ingest finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::ingest_records;
    use crate::adapters::{RecordSource, SourceRecord};
    use crate::archive::{ArchiveReader, ArchiveWriter, FieldMap, FieldValue};
    use crate::domain::{RenshapeError, RenshapeResult, Section};
    use tempfile::TempDir;

    struct FixedSource;

    impl RecordSource for FixedSource {
        fn read_records(&self) -> RenshapeResult<Vec<RenshapeResult<SourceRecord>>> {
            Ok(vec![
                Ok(SourceRecord {
                    name: "135I".to_string(),
                    section: Section::Info,
                    fields: FieldMap::from([("z".to_string(), FieldValue::Number(53.0))]),
                }),
                Err(RenshapeError::malformed_source("SOURCE.RECORD", "bad line 7")),
                Ok(SourceRecord {
                    name: String::new(),
                    section: Section::Info,
                    fields: FieldMap::new(),
                }),
            ])
        }

        fn general_info(&self) -> FieldMap {
            FieldMap::from([("JEFF_release".to_string(), FieldValue::from("3.3"))])
        }
    }

    #[test]
    fn malformed_records_are_skipped_and_the_rest_is_written() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = ArchiveWriter::new(temp.path().join("run.json"));

        let summary = ingest_records(&writer, &FixedSource).expect("ingest");
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 2);

        let reader = ArchiveReader::open(writer.path()).expect("open");
        assert_eq!(reader.nuclide_names().expect("names"), vec!["135I"]);
        assert_eq!(
            reader.general_info().expect("info")["JEFF_release"],
            FieldValue::from("3.3")
        );
    }

    #[test]
    fn ingest_merges_into_the_existing_archive() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = ArchiveWriter::new(temp.path().join("run.json"));
        writer
            .write_nuclide_field("135I", Section::Info, "Q", 2627.0.into())
            .expect("seed");
        writer
            .write_nuclide_field("88Kr", Section::Info, "z", 36.0.into())
            .expect("seed");

        ingest_records(&writer, &FixedSource).expect("ingest");

        let reader = ArchiveReader::open(writer.path()).expect("open");
        assert_eq!(reader.nuclide_names().expect("names"), vec!["135I", "88Kr"]);
        let record = reader.record("135I").expect("record");
        assert_eq!(record.z, Some(53));
        assert_eq!(record.q_value, Some(2627.0));
    }
}

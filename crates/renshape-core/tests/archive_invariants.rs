use renshape_core::archive::{
    ArchiveDocument, ArchiveReader, ArchiveWriter, EnergyWindow, FieldMap, FieldValue,
};
use renshape_core::domain::{ErrorCategory, RenshapeError, Section};
use renshape_core::numerics::matrix_row;
use std::fs;
use tempfile::TempDir;

fn fields(entries: &[(&str, FieldValue)]) -> FieldMap {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn spectrum_fields(values: Vec<f64>) -> FieldMap {
    fields(&[
        ("dN_dE_tot", FieldValue::Array(values)),
        ("transition_type", FieldValue::from(vec!["a".to_string()])),
    ])
}

#[test]
fn rewriting_identical_fields_leaves_the_file_byte_identical() {
    let temp = TempDir::new().expect("tempdir should be created");
    let writer = ArchiveWriter::new(temp.path().join("run.json"));
    let info = fields(&[
        ("z", FieldValue::Number(53.0)),
        ("Q", FieldValue::Number(2634.0)),
        ("half_life_sec", FieldValue::Number(f64::INFINITY)),
    ]);
    let data = spectrum_fields(vec![0.5, f64::NAN, 0.0]);

    writer
        .write_nuclide_record("135I", Section::Info, &info)
        .expect("info");
    writer
        .write_nuclide_record("135I", Section::Data, &data)
        .expect("data");
    let once = fs::read(writer.path()).expect("first read");

    writer
        .write_nuclide_record("135I", Section::Info, &info)
        .expect("info again");
    writer
        .write_nuclide_record("135I", Section::Data, &data)
        .expect("data again");
    let twice = fs::read(writer.path()).expect("second read");

    assert_eq!(once, twice);
}

#[test]
fn non_finite_values_survive_the_file_round_trip() {
    let temp = TempDir::new().expect("tempdir should be created");
    let writer = ArchiveWriter::new(temp.path().join("run.json"));
    writer
        .write_nuclide_record(
            "135I",
            Section::Data,
            &spectrum_fields(vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.5]),
        )
        .expect("write");

    let document = ArchiveDocument::load(writer.path()).expect("load");
    let data = document
        .entry("135I")
        .and_then(|entry| entry.data.as_ref())
        .expect("data");
    let values = data["dN_dE_tot"].as_array().expect("array");
    assert!(values[0].is_nan());
    assert_eq!(values[1], f64::INFINITY);
    assert_eq!(values[2], f64::NEG_INFINITY);
    assert_eq!(values[3], 1.5);
}

#[test]
fn present_and_absent_partition_the_nuclide_list() {
    let temp = TempDir::new().expect("tempdir should be created");
    let writer = ArchiveWriter::new(temp.path().join("run.json"));
    writer
        .set_general_info(&fields(&[("E_step", FieldValue::Number(1.0))]))
        .expect("info");

    let names = ["135I", "135Xe", "88Kr", "99Mo", "137Cs"];
    for (index, name) in names.iter().enumerate() {
        writer
            .write_nuclide_field(name, Section::Info, "z", FieldValue::Number(index as f64))
            .expect("z");
        if index % 2 == 0 {
            let spectrum = vec![index as f64; index + 1];
            writer
                .write_nuclide_record(name, Section::Data, &spectrum_fields(spectrum))
                .expect("spectrum");
        }
    }

    let reader = ArchiveReader::open(writer.path()).expect("open");
    let listed = reader.nuclide_names().expect("names");
    assert_eq!(listed, names);

    let window = EnergyWindow {
        e_min: 0.0,
        e_max: 10.0,
        e_step: None,
    };
    let matrix = reader
        .data_matrix_across_all("dN_dE_tot", window)
        .expect("matrix");

    let mut union: Vec<usize> = matrix.present.iter().chain(&matrix.absent).copied().collect();
    union.sort_unstable();
    assert_eq!(union, (0..listed.len()).collect::<Vec<_>>());
    assert!(matrix.present.iter().all(|index| !matrix.absent.contains(index)));

    for (row, &index) in matrix.present.iter().enumerate() {
        let stored = reader
            .record(&listed[index])
            .expect("record")
            .total_spectrum
            .expect("spectrum");
        let row_values = matrix_row(&matrix.values, row);
        assert_eq!(&row_values[..stored.len()], &stored[..]);
        assert!(row_values[stored.len()..].iter().all(|value| *value == 0.0));
    }
}

#[test]
fn reading_an_unknown_nuclide_is_not_found() {
    let temp = TempDir::new().expect("tempdir should be created");
    let writer = ArchiveWriter::new(temp.path().join("run.json"));
    writer
        .write_nuclide_field("135I", Section::Info, "z", FieldValue::Number(53.0))
        .expect("write");

    let reader = ArchiveReader::open(writer.path()).expect("open");
    let error = RenshapeError::from(reader.record("135Cs").expect_err("absent"));
    assert_eq!(error.category(), ErrorCategory::NotFound);
    assert_eq!(error.exit_code(), 3);

    assert_eq!(
        reader.parameter_across_all("Q", -1.0).expect("bulk"),
        vec![-1.0]
    );
}

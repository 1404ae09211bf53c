#![cfg(feature = "io-csv")]

use anyhow::Result;
use ironsieve::testing::*;
use ironsieve::*;
use std::fs;

#[test]
fn header_is_skipped_and_positions_are_row_indexes() -> Result<()> {
    let doc = sample_csv();
    let read = read_records_from(doc.as_bytes(), &PipelineConfig::default())?;

    assert_eq!(read.rows_read, 3);
    assert_eq!(read.malformed, 0);
    let names: Vec<&str> = read.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Jane", "John", "Amy"]);
    let positions: Vec<usize> = read.records.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn wrong_arity_rows_are_counted_and_excluded() -> Result<()> {
    let doc = csv_document(&[
        "12345678,Jane,1234567890,jane@x.com,Male",
        "too,few,fields",
        "1,2,3,4,5,6",
        "87654321,Amy,9876543210,amy@y.org,Female",
    ]);
    let read = read_records_from(doc.as_bytes(), &PipelineConfig::default())?;

    assert_eq!(read.rows_read, 4);
    assert_eq!(read.malformed, 2);
    let positions: Vec<usize> = read.records.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![0, 3]);
    Ok(())
}

#[test]
fn quotes_do_not_protect_the_delimiter() -> Result<()> {
    let doc = csv_document(&["12345678,\"Doe, Jane\",1234567890,jane@x.com,Female"]);
    let read = read_records_from(doc.as_bytes(), &PipelineConfig::default())?;
    assert_eq!(read.rows_read, 1);
    assert_eq!(read.malformed, 1);
    assert!(read.records.is_empty());
    Ok(())
}

#[test]
fn quoted_values_keep_their_quotes_and_fail_validation() -> Result<()> {
    let doc = csv_document(&["\"12345678\",Jo,1234567890,jo@x.com,Female"]);
    let read = read_records_from(doc.as_bytes(), &PipelineConfig::default())?;
    assert_eq!(read.records[0].id_number, "\"12345678\"");

    let output = TestPipeline::new().run(read.records)?;
    assert_partition_positions(&output.partitions, PartitionKind::Female, &[]);
    let jo = &output.partitions.get(PartitionKind::Invalid).records()[0];
    assert_eq!(jo.joined_errors(), "Invalid ID Number");
    Ok(())
}

#[test]
fn trailing_delimiter_counts_as_a_field() -> Result<()> {
    let doc = csv_document(&[
        "12345678,Jane,1234567890,jane@x.com,Male,",
        "12345678,Jane,1234567890,jane@x.com,",
    ]);
    let read = read_records_from(doc.as_bytes(), &PipelineConfig::default())?;
    assert_eq!(read.malformed, 1);
    assert_eq!(read.records.len(), 1);
    assert_eq!(read.records[0].position, 1);
    assert_eq!(read.records[0].gender, "");
    Ok(())
}

#[test]
fn custom_delimiter_and_no_header() -> Result<()> {
    let config = PipelineConfig {
        has_headers: false,
        ..PipelineConfig::default()
    }
    .with_delimiter(';');
    let doc = "12345678;Jane;1234567890;jane@x.com;Male\n";
    let read = read_records_from(doc.as_bytes(), &config)?;
    assert_eq!(read.records.len(), 1);
    assert_eq!(read.records[0].gender, "Male");
    Ok(())
}

#[test]
fn run_file_writes_one_file_per_partition() -> Result<()> {
    let input = mock_input_file(&sample_csv())?;
    let out = TempDirPath::new()?;
    let mut sink = CsvDirSink::new(out.path(), Compression::None);

    let output = TestPipeline::new().run_file(input.path(), &mut sink)?;
    assert_eq!(output.metrics.rows_read, 3);
    assert_eq!(sink.written().len(), 3);

    let male = fs::read_to_string(out.file_path("male.csv"))?;
    assert_eq!(
        male,
        "ID Number,Name,Phone Number,Email,Gender\n12345678,Jane,1234567890,jane@x.com,Male\n"
    );
    let female = fs::read_to_string(out.file_path("female.csv"))?;
    assert!(female.ends_with("87654321,Amy,9876543210,amy@y.org,Female\n"));

    let invalid = fs::read_to_string(out.file_path("invalid_records.csv"))?;
    let mut lines = invalid.lines();
    assert_eq!(
        lines.next(),
        Some("ID Number,Name,Phone Number,Email,Gender,Errors")
    );
    assert_eq!(
        lines.next(),
        Some("1,John,2,bad,Female,\"Invalid ID Number, Invalid Phone Number, Invalid Email\"")
    );
    assert_eq!(lines.next(), None);
    Ok(())
}

#[test]
fn empty_partitions_still_get_a_header() -> Result<()> {
    let input = mock_input_file(&csv_document(&["12345678,Jane,1234567890,jane@x.com,Male"]))?;
    let out = TempDirPath::new()?;
    let mut sink = CsvDirSink::new(out.path(), Compression::None);
    TestPipeline::new().run_file(input.path(), &mut sink)?;

    let female = fs::read_to_string(out.file_path("female.csv"))?;
    assert_eq!(female.lines().count(), 1);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_output_reads_back() -> Result<()> {
    use ironsieve::io::compression::auto_detect_reader;
    use std::fs::File;
    use std::io::Read;

    let input = mock_input_file(&sample_csv())?;
    let out = TempDirPath::new()?;
    let mut sink = CsvDirSink::new(out.path(), Compression::Gzip);
    TestPipeline::new().run_file(input.path(), &mut sink)?;

    let path = out.file_path("male.csv.gz");
    assert_eq!(sink.path_for(PartitionKind::Male), path);
    let mut text = String::new();
    auto_detect_reader(File::open(&path)?, &path)?.read_to_string(&mut text)?;
    assert!(text.contains("12345678,Jane"));
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn compressed_input_is_detected_by_magic_bytes() -> Result<()> {
    use ironsieve::io::compression::CompressedWriter;
    use std::fs::File;
    use std::io::Write;

    let dir = TempDirPath::new()?;
    // no telling extension, so detection falls back to the zstd frame magic
    let path = dir.file_path("people.dat");
    let mut writer = CompressedWriter::new(File::create(&path)?, Compression::Zstd)?;
    writer.write_all(sample_csv().as_bytes())?;
    writer.finish()?;

    let read = read_records(&path, &PipelineConfig::default())?;
    assert_eq!(read.records.len(), 3);
    Ok(())
}

#[test]
fn sink_failure_fails_the_run() -> Result<()> {
    let input = mock_input_file(&sample_csv())?;
    let err = TestPipeline::new()
        .run_file(input.path(), &mut FailingSink)
        .unwrap_err();
    assert!(format!("{err:#}").contains("refusing to write"));
    Ok(())
}

#[test]
fn nothing_is_written_when_the_run_fails() -> Result<()> {
    let input = mock_input_file(&sample_csv())?;
    let mut sink = MemorySink::new();
    let pipeline = Pipeline::new(test_config())?
        .with_validator(std::sync::Arc::new(PanickingValidator { position: 1 }));

    let err = pipeline.run_file(input.path(), &mut sink).unwrap_err();
    assert!(err.downcast_ref::<PipelineError>().is_some());
    assert!(sink.written_kinds().is_empty());
    assert!(!sink.is_finalized());
    Ok(())
}

#[test]
fn missing_input_is_an_error() {
    let mut sink = MemorySink::new();
    assert!(
        TestPipeline::new()
            .run_file("/definitely/not/here.csv", &mut sink)
            .is_err()
    );
}

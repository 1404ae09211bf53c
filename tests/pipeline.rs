//! End-to-end runs through batching, the pool, and routing.

use anyhow::Result;
use ironsieve::testing::*;
use ironsieve::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn sample_rows_route_as_expected() -> Result<()> {
    let config = PipelineConfig::default().with_batch_size(2).with_worker_count(2);
    let output = Pipeline::new(config)?.run(sample_records())?;
    let parts = &output.partitions;

    assert_partition_positions(parts, PartitionKind::Male, &[0]);
    assert_partition_positions(parts, PartitionKind::Female, &[2]);
    assert_partition_positions(parts, PartitionKind::Invalid, &[1]);

    assert_eq!(parts.get(PartitionKind::Male).records()[0].name, "Jane");
    assert_eq!(parts.get(PartitionKind::Female).records()[0].name, "Amy");
    let john = &parts.get(PartitionKind::Invalid).records()[0];
    assert_eq!(john.name, "John");
    assert_eq!(
        john.joined_errors(),
        "Invalid ID Number, Invalid Phone Number, Invalid Email"
    );
    Ok(())
}

#[test]
fn unrecognized_category_lands_in_invalid_with_empty_annotation() -> Result<()> {
    let records = vec![Record::new(0, "12345678", "Sam", "1234567890", "sam@z.net", "Other")];
    let output = TestPipeline::new().run(records)?;

    let invalid = output.partitions.get(PartitionKind::Invalid);
    assert_eq!(invalid.row_count(), 1);
    assert!(invalid.records()[0].errors().is_empty());
    assert_eq!(invalid.rows_for_sink().next().map(|row| row[5].clone()), Some(String::new()));
    assert_eq!(output.metrics.unrecognized_category, 1);
    assert_eq!(output.metrics.failed_validation, 0);
    Ok(())
}

#[test]
fn order_is_preserved_for_any_batch_size_and_worker_count() -> Result<()> {
    let input = generate_records(1_000);
    for (batch_size, workers) in [(1, 1), (1, 8), (7, 3), (64, 4), (333, 2), (1_000, 4), (5_000, 6)] {
        let config = PipelineConfig::default()
            .with_batch_size(batch_size)
            .with_worker_count(workers);
        let output = Pipeline::new(config)?.run(input.clone())?;

        assert_order_preserved(&output.partitions, &input);
        assert_eq!(output.partitions.total_rows(), input.len(), "bs={batch_size} w={workers}");
    }
    Ok(())
}

#[test]
fn parallel_result_matches_single_worker_result() -> Result<()> {
    let input = generate_records(300);
    let single = Pipeline::new(test_config().with_worker_count(1))?.run(input.clone())?;
    let many = Pipeline::new(test_config().with_worker_count(6).with_batch_size(9))?.run(input)?;

    for kind in PartitionKind::ALL {
        assert_eq!(
            single.partitions.get(kind).records(),
            many.partitions.get(kind).records(),
            "{kind} differs"
        );
    }
    Ok(())
}

#[test]
fn reversed_completion_does_not_reorder_output() -> Result<()> {
    let input = generate_records(24);
    let output = Pipeline::new(test_config().with_worker_count(4))?
        .with_validator(Arc::new(ReverseDelayValidator {
            total: input.len(),
            step: Duration::from_millis(2),
        }))
        .run(input.clone())?;
    assert_order_preserved(&output.partitions, &input);
    Ok(())
}

#[test]
fn capacity_bounds_every_partition() -> Result<()> {
    let input = generate_records(400);
    let output = Pipeline::new(test_config().with_partition_capacity(20))?.run(input.clone())?;

    assert_within_capacity(&output.partitions);
    assert_order_preserved(&output.partitions, &input);
    for kind in PartitionKind::ALL {
        assert_eq!(output.partitions.get(kind).row_count(), 20);
    }
    // 50 male, 100 female, 250 invalid
    assert_eq!(output.metrics.partitions[&PartitionKind::Male].dropped, 30);
    assert_eq!(output.metrics.partitions[&PartitionKind::Female].dropped, 80);
    assert_eq!(output.metrics.partitions[&PartitionKind::Invalid].dropped, 230);
    assert_eq!(output.metrics.total_dropped(), 340);
    Ok(())
}

#[test]
fn the_first_records_survive_a_full_partition() -> Result<()> {
    let input = generate_records(64);
    let output = Pipeline::new(test_config().with_partition_capacity(3))?.run(input)?;
    assert_partition_positions(&output.partitions, PartitionKind::Male, &[0, 8, 16]);
    Ok(())
}

#[test]
fn zero_batch_size_fails_before_processing() {
    let err = Pipeline::new(PipelineConfig::default().with_batch_size(0))
        .err()
        .expect("must reject");
    assert!(err.is_config_error());
}

#[test]
fn zero_workers_fails_before_processing() {
    let err = Pipeline::new(PipelineConfig::default().with_worker_count(0))
        .err()
        .expect("must reject");
    assert!(matches!(
        err,
        PipelineError::InvalidConfig {
            option: "worker_count",
            ..
        }
    ));
}

#[test]
fn worker_fault_fails_the_whole_run() -> Result<()> {
    let pipeline = Pipeline::new(test_config())?.with_validator(Arc::new(PanickingValidator { position: 5 }));
    let err = pipeline.run(generate_records(12)).unwrap_err();
    assert!(matches!(err, PipelineError::WorkerFault { batch: 2, .. }), "{err:?}");
    Ok(())
}

#[test]
fn timeout_fails_the_whole_run() -> Result<()> {
    let config = test_config()
        .with_worker_count(1)
        .with_batch_size(1)
        .with_shutdown_timeout(Duration::from_millis(40));
    let pipeline = Pipeline::new(config)?.with_validator(Arc::new(SlowValidator {
        delay: Duration::from_millis(150),
    }));
    let err = pipeline.run(generate_records(3)).unwrap_err();
    assert!(matches!(err, PipelineError::Timeout { total: 3, .. }), "{err:?}");
    Ok(())
}

#[test]
fn pool_that_will_not_drain_fails_the_run() -> Result<()> {
    // one batch, so no result waits behind the lingering work
    let config = test_config()
        .with_batch_size(4)
        .with_shutdown_timeout(Duration::from_millis(200));
    let pipeline = Pipeline::new(config)?.with_validator(Arc::new(LingeringValidator {
        linger: Duration::from_secs(2),
    }));
    let err = pipeline.run(generate_records(4)).unwrap_err();
    assert!(matches!(err, PipelineError::ShutdownTimeout { .. }), "{err:?}");
    Ok(())
}

#[test]
fn timed_out_run_does_not_wait_out_a_second_deadline() -> Result<()> {
    let timeout = Duration::from_millis(400);
    let config = test_config()
        .with_worker_count(1)
        .with_batch_size(1)
        .with_shutdown_timeout(timeout);
    let pipeline = Pipeline::new(config)?.with_validator(Arc::new(SlowValidator {
        delay: Duration::from_secs(2),
    }));

    let started = std::time::Instant::now();
    let err = pipeline.run(generate_records(2)).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, PipelineError::Timeout { .. }), "{err:?}");
    assert!(
        elapsed < timeout * 2 - Duration::from_millis(50),
        "failed run took {elapsed:?}"
    );
    Ok(())
}

#[test]
fn empty_input_is_a_successful_empty_run() -> Result<()> {
    let output = TestPipeline::new().run(Vec::new())?;
    assert_eq!(output.partitions.total_rows(), 0);
    assert_eq!(output.metrics.batches, 0);
    Ok(())
}

#[test]
fn metrics_describe_the_run() -> Result<()> {
    let output = TestPipeline::new().run(generate_records(16))?;
    let m = &output.metrics;
    assert_eq!(m.records, 16);
    assert_eq!(m.batches, 8);
    assert_eq!(m.workers, 2);
    assert_eq!(m.failed_validation, 8);
    assert_eq!(m.unrecognized_category, 2);
    assert_eq!(m.rows_in(PartitionKind::Male), 2);
    assert_eq!(m.rows_in(PartitionKind::Female), 4);
    assert_eq!(m.rows_in(PartitionKind::Invalid), 10);
    assert!(m.elapsed().is_some());
    Ok(())
}

#[test]
fn partitions_hold_only_matching_records() -> Result<()> {
    let output = TestPipeline::new().run(generate_records(64))?;
    let parts = &output.partitions;

    assert_all_records(parts.get(PartitionKind::Male).records(), |r| {
        !r.has_errors() && r.gender.trim().eq_ignore_ascii_case("male")
    });
    assert_all_records(parts.get(PartitionKind::Female).records(), |r| {
        !r.has_errors() && r.gender.trim().eq_ignore_ascii_case("female")
    });
    assert_all_records(parts.get(PartitionKind::Invalid).records(), |r| {
        r.has_errors() || PartitionKind::from_category(&r.gender).is_none()
    });
    Ok(())
}

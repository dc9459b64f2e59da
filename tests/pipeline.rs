//! End-to-end runs of the pipeline over the CSV fixtures.

use labelfit::parse::{Dataset, Label};
use labelfit::scale::{scale, FEATURE_DIVISOR};
use labelfit::split::{train_test_split, SplitConfig};
use labelfit::{run, Config, PipelineError};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn seeded(name: &str, seed: u64) -> Config {
    Config::new(fixture(name)).with_seed(seed)
}

#[test]
fn separable_data_splits_seventy_thirty_and_knn_is_exact() {
    let report = run(&seeded("separable_two_class.csv", 3)).unwrap();

    assert_eq!(report.table.len(), 100);
    assert_eq!(report.rows_dropped, 0);
    assert_eq!((report.train_size, report.test_size), (70, 30));
    assert_eq!(report.classes, vec![Label::from("left"), Label::from("right")]);

    assert!((report.knn.test_accuracy - 1.0).abs() < 1e-12);
    assert!((report.knn.train_accuracy - 1.0).abs() < 1e-12);
    assert!(report.logistic.test_accuracy >= 0.9);
    assert_eq!(report.logistic.test_predictions.len(), 30);
    assert_eq!(report.coefficients.dim(), (2, 2));
}

#[test]
fn accuracies_stay_in_unit_interval() {
    for seed in 0..5 {
        let report = run(&seeded("three_class_with_gaps.csv", seed)).unwrap();

        for score in [
            report.logistic.train_accuracy,
            report.logistic.test_accuracy,
            report.knn.train_accuracy,
            report.knn.test_accuracy,
        ] {
            assert!((0.0..=1.0).contains(&score), "seed {seed}: {score}");
        }
    }
}

#[test]
fn incomplete_rows_are_dropped_before_splitting() {
    let report = run(&seeded("three_class_with_gaps.csv", 11)).unwrap();

    assert_eq!(report.table.len(), 90);
    assert_eq!(report.rows_dropped, 6);
    assert_eq!(report.train_size + report.test_size, 84);
    assert_eq!(report.test_size, 26);
    assert_eq!(
        report.feature_columns,
        vec!["x".to_string(), "y".to_string(), "z".to_string()]
    );
}

#[test]
fn numeric_labels_are_ordered_numerically() {
    let report = run(&seeded("three_class_with_gaps.csv", 1)).unwrap();

    let classes: Vec<&str> = report.classes.iter().map(Label::as_str).collect();
    assert_eq!(classes, vec!["1", "2", "10"]);
    assert_eq!(report.coefficients.dim(), (3, 3));
    assert_eq!(report.intercepts.len(), 3);
}

#[test]
fn well_separated_clusters_are_learned_by_both_models() {
    let report = run(&seeded("three_class_with_gaps.csv", 5)).unwrap();

    assert!((report.knn.test_accuracy - 1.0).abs() < 1e-12);
    assert!(report.logistic.test_accuracy >= 0.9);
}

#[test]
fn fixed_seed_reproduces_the_run() {
    let first = run(&seeded("three_class_with_gaps.csv", 42)).unwrap();
    let second = run(&seeded("three_class_with_gaps.csv", 42)).unwrap();

    assert_eq!(first.logistic, second.logistic);
    assert_eq!(first.knn, second.knn);
    assert_eq!(first.coefficients, second.coefficients);
    assert_eq!(first.intercepts, second.intercepts);
}

#[test]
fn split_partitions_cleaned_rows() {
    let dataset = Dataset::from_path(fixture("three_class_with_gaps.csv"))
        .unwrap()
        .drop_missing();
    let (features, labels) = scale(&dataset, FEATURE_DIVISOR).unwrap();

    for seed in 0..10 {
        let config = SplitConfig {
            seed: Some(seed),
            ..SplitConfig::default()
        };
        let split = train_test_split(&features, &labels, &config).unwrap();

        let train: HashSet<usize> = split.train.indices.iter().copied().collect();
        let test: HashSet<usize> = split.test.indices.iter().copied().collect();

        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), dataset.len());

        let fraction = test.len() as f64 / dataset.len() as f64;
        assert!((fraction - 0.3).abs() <= 1.0 / dataset.len() as f64);
    }
}

#[test]
fn scaled_cells_are_source_values_over_one_hundred() {
    let dataset = Dataset::from_path(fixture("separable_two_class.csv")).unwrap();
    let (features, _) = scale(&dataset, FEATURE_DIVISOR).unwrap();

    for (i, row) in dataset.rows().iter().enumerate() {
        for (j, cell) in row.features.iter().enumerate() {
            let expected = cell.unwrap() / 100.0;
            assert!((features.values()[(i, j)] - expected).abs() < 1e-12);
        }
    }
}

#[test]
fn ragged_file_fails_to_load() {
    let error = run(&Config::new(fixture("ragged.csv"))).unwrap_err();

    assert!(matches!(error, PipelineError::Csv(_)));
}

#[test]
fn non_numeric_feature_fails_to_load() {
    let error = run(&Config::new(fixture("non_numeric.csv"))).unwrap_err();

    assert!(matches!(
        error,
        PipelineError::InvalidValue { row: 2, .. }
    ));
}

#[test]
fn fully_incomplete_file_fails_after_cleaning() {
    let error = run(&Config::new(fixture("all_missing.csv"))).unwrap_err();

    assert!(matches!(error, PipelineError::EmptyDataset("scale")));
}

#[test]
fn knn_needs_enough_training_rows() {
    let config = seeded("separable_two_class.csv", 0).with_neighbors(71);
    let error = run(&config).unwrap_err();

    assert!(matches!(
        error,
        PipelineError::TooFewSamples { k: 71, samples: 70 }
    ));
}

#[test]
fn report_renders_table_and_scores() {
    let report = run(&seeded("separable_two_class.csv", 9)).unwrap();

    let table = report.table.to_string();
    assert!(table.ends_with("[100 rows x 3 columns]"));

    let rendered = report.to_string();
    assert!(rendered.contains("logistic regression coefficients (f1, f2):"));
    assert!(rendered.contains("K: 2 train score: 1.0000, test score: 1.0000"));
}

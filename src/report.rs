use ndarray::{Array1, Array2};
use std::fmt;

use crate::classifier::Evaluation;
use crate::parse::{Dataset, Label};

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct Report {
    /// The table as loaded, before cleaning.
    pub table: Dataset,
    pub rows_dropped: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub feature_columns: Vec<String>,
    pub classes: Vec<Label>,
    /// Logistic-regression weights, one row per class in `classes` order.
    pub coefficients: Array2<f64>,
    pub intercepts: Array1<f64>,
    pub logistic_iterations: usize,
    pub logistic: Evaluation,
    pub neighbors: usize,
    pub knn: Evaluation,
}

fn write_labels(f: &mut fmt::Formatter<'_>, labels: &[Label]) -> fmt::Result {
    let joined: Vec<&str> = labels.iter().map(Label::as_str).collect();
    writeln!(f, "[{}]", joined.join(" "))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "rows: {} loaded, {} dropped; train {} / test {}",
            self.table.len(),
            self.rows_dropped,
            self.train_size,
            self.test_size
        )?;

        write!(f, "classes: ")?;
        write_labels(f, &self.classes)?;

        writeln!(
            f,
            "logistic regression coefficients ({}):",
            self.feature_columns.join(", ")
        )?;
        writeln!(f, "{:.6}", self.coefficients)?;
        writeln!(f, "logistic regression intercepts:")?;
        writeln!(f, "{:.6}", self.intercepts)?;
        writeln!(
            f,
            "logistic regression ({} iterations): train score {:.4}, test score {:.4}",
            self.logistic_iterations, self.logistic.train_accuracy, self.logistic.test_accuracy
        )?;

        write!(f, "logistic regression test predictions: ")?;
        write_labels(f, &self.logistic.test_predictions)?;

        write!(
            f,
            "K: {} train score: {:.4}, test score: {:.4}",
            self.neighbors, self.knn.train_accuracy, self.knn.test_accuracy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn renders_scores_and_predictions() {
        let table = Dataset::from_reader("a,Label\n1,x\n2,y\n3,x\n".as_bytes()).unwrap();
        let report = Report {
            table,
            rows_dropped: 0,
            train_size: 2,
            test_size: 1,
            feature_columns: vec!["a".to_string()],
            classes: vec![Label::from("x"), Label::from("y")],
            coefficients: array![[0.5], [-0.5]],
            intercepts: array![0.1, -0.1],
            logistic_iterations: 4,
            logistic: Evaluation {
                train_accuracy: 1.0,
                test_accuracy: 0.5,
                test_predictions: vec![Label::from("x")],
            },
            neighbors: 2,
            knn: Evaluation {
                train_accuracy: 1.0,
                test_accuracy: 1.0,
                test_predictions: vec![Label::from("x")],
            },
        };

        let rendered = report.to_string();

        assert!(rendered.contains("rows: 3 loaded, 0 dropped; train 2 / test 1"));
        assert!(rendered.contains("classes: [x y]"));
        assert!(rendered.contains("logistic regression coefficients (a):"));
        assert!(rendered.contains("0.500000"));
        assert!(rendered.contains("train score 1.0000, test score 0.5000"));
        assert!(rendered.contains("test predictions: [x]"));
        assert!(rendered.ends_with("K: 2 train score: 1.0000, test score: 1.0000"));
    }
}

use csv::{ReaderBuilder, Trim};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

pub const LABEL_COLUMN: &str = "Label";

/// Cells that count as missing, as pandas reads them by default.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// Categorical class value.
///
/// Finite numeric text is stored in canonical form, so `1`, `1.0` and
/// `01` are one class. Numeric labels order numerically (`2, 10, 1` sorts
/// as `1, 2, 10`) and sort before text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();

        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => Self(canonical_number(number)),
            _ => Self(value),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|value| !value.is_nan())
    }
}

fn canonical_number(number: f64) -> String {
    // Adding zero folds -0 into 0.
    let number = number + 0.0;

    if number.fract() == 0.0 {
        format!("{number:.0}")
    } else {
        number.to_string()
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(left), Some(right)) => left.total_cmp(&right).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One record; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub features: Vec<Option<f64>>,
    pub label: Option<Label>,
}

impl Row {
    pub fn is_complete(&self) -> bool {
        self.label.is_some() && self.features.iter().all(Option::is_some)
    }
}

/// In-memory table of numeric feature columns plus the `Label` column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn from_path(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        let file = File::open(file_path)?;
        let dataset = Self::from_reader(BufReader::new(file))?;

        info!(
            path = %file_path.display(),
            rows = dataset.len(),
            features = dataset.columns.len(),
            "loaded dataset"
        );

        Ok(dataset)
    }

    /// Reads a headed CSV. Every column except `Label` must hold numbers or
    /// missing markers; ragged records are rejected by the CSV reader.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let label_index = headers
            .iter()
            .position(|header| header == LABEL_COLUMN)
            .ok_or_else(|| PipelineError::ColumnNotFound(LABEL_COLUMN.to_string()))?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != label_index)
            .map(|(_, header)| header.to_string())
            .collect();

        let mut rows = Vec::new();

        for (record_index, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record_index + 1;

            let mut features = Vec::with_capacity(columns.len());
            let mut label = None;

            for (index, cell) in record.iter().enumerate() {
                if index == label_index {
                    label = (!is_missing(cell)).then(|| Label::from(cell));
                    continue;
                }

                if is_missing(cell) {
                    features.push(None);
                    continue;
                }

                let value = cell
                    .parse::<f64>()
                    .map_err(|_| PipelineError::InvalidValue {
                        row: row_number,
                        column: headers.get(index).unwrap_or_default().to_string(),
                        value: cell.to_string(),
                    })?;

                features.push((!value.is_nan()).then_some(value));
            }

            rows.push(Row { features, label });
        }

        debug!(rows = rows.len(), "parsed csv records");

        Ok(Self { columns, rows })
    }

    /// Feature column names, in file order, without `Label`.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only rows with every feature and the label present.
    #[must_use]
    pub fn drop_missing(self) -> Self {
        let before = self.rows.len();
        let rows: Vec<Row> = self.rows.into_iter().filter(Row::is_complete).collect();

        info!(
            kept = rows.len(),
            dropped = before - rows.len(),
            "dropped rows with missing values"
        );

        Self {
            columns: self.columns,
            rows,
        }
    }
}

/// Head/tail preview in the spirit of a dataframe print.
impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_FULL_ROWS: usize = 60;
        const PREVIEW_ROWS: usize = 5;

        let shown: Vec<Option<usize>> = if self.rows.len() > MAX_FULL_ROWS {
            (0..PREVIEW_ROWS)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((self.rows.len() - PREVIEW_ROWS..self.rows.len()).map(Some))
                .collect()
        } else {
            (0..self.rows.len()).map(Some).collect()
        };

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        header.push(LABEL_COLUMN.to_string());

        let lines: Vec<Vec<String>> = shown
            .iter()
            .map(|row_index| match row_index {
                Some(index) => {
                    let row = &self.rows[*index];
                    let mut cells = vec![index.to_string()];
                    cells.extend(row.features.iter().map(|cell| match cell {
                        Some(value) => format!("{value:?}"),
                        None => "NaN".to_string(),
                    }));
                    cells.push(
                        row.label
                            .as_ref()
                            .map_or_else(|| "NaN".to_string(), ToString::to_string),
                    );
                    cells
                }
                None => vec!["...".to_string(); header.len()],
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|column| {
                lines
                    .iter()
                    .map(|cells| cells[column].len())
                    .chain(std::iter::once(header[column].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for cells in std::iter::once(&header).chain(lines.iter()) {
            let rendered: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect();
            writeln!(f, "{}", rendered.join("  ").trim_end())?;
        }

        write!(
            f,
            "\n[{} rows x {} columns]",
            self.rows.len(),
            self.columns.len() + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load(text: &str) -> Result<Dataset> {
        Dataset::from_reader(text.as_bytes())
    }

    #[test]
    fn label_column_is_split_from_features() {
        let dataset = load("a,Label,b\n1,x,2\n3,y,4\n").unwrap();

        assert_eq!(dataset.columns(), ["a".to_string(), "b".to_string()]);
        assert_eq!(
            dataset.rows()[1],
            Row {
                features: vec![Some(3.0), Some(4.0)],
                label: Some(Label::from("y")),
            }
        );
    }

    #[test]
    fn missing_markers_become_none() {
        let dataset = load("a,b,Label\n,NaN,x\nNA,1,\n2,3,y\n").unwrap();

        assert_eq!(dataset.rows()[0].features, vec![None, None]);
        assert_eq!(dataset.rows()[1].features, vec![None, Some(1.0)]);
        assert_eq!(dataset.rows()[1].label, None);
        assert!(dataset.rows()[2].is_complete());
    }

    #[test]
    fn drop_missing_keeps_complete_rows_in_order() {
        let dataset = load("a,Label\n1,x\n,y\n3,\n4,z\n").unwrap().drop_missing();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0].features, vec![Some(1.0)]);
        assert_eq!(dataset.rows()[1].label, Some(Label::from("z")));
    }

    #[test]
    fn drop_missing_may_empty_the_dataset() {
        let dataset = load("a,Label\n,x\n").unwrap().drop_missing();

        assert!(dataset.is_empty());
    }

    #[test]
    fn missing_label_column_is_rejected() {
        let error = load("a,b\n1,2\n").unwrap_err();

        assert!(matches!(error, PipelineError::ColumnNotFound(column) if column == "Label"));
    }

    #[test]
    fn ragged_records_are_rejected() {
        let error = load("a,b,Label\n1,2,x\n3,y\n").unwrap_err();

        assert!(matches!(error, PipelineError::Csv(_)));
    }

    #[test]
    fn non_numeric_feature_is_rejected() {
        let error = load("a,Label\n1,x\nabc,y\n").unwrap_err();

        assert!(matches!(
            error,
            PipelineError::InvalidValue { row: 2, ref column, ref value } if column == "a" && value == "abc"
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = Dataset::from_path("does/not/exist.csv").unwrap_err();

        assert!(matches!(error, PipelineError::Io(_)));
    }

    #[test]
    fn numeric_labels_sort_numerically() {
        let mut labels: Vec<Label> = ["10", "2", "b", "1", "a"].into_iter().map(Label::from).collect();
        labels.sort();

        let sorted: Vec<&str> = labels.iter().map(Label::as_str).collect();
        assert_eq!(sorted, vec!["1", "2", "10", "a", "b"]);
    }

    #[test]
    fn numerically_equal_labels_are_one_class() {
        let labels: Vec<Label> = ["1", "1.0", "01", "2", "-0", "0", "2.50"]
            .into_iter()
            .map(Label::from)
            .collect();

        let rendered: Vec<&str> = labels.iter().map(Label::as_str).collect();
        assert_eq!(rendered, vec!["1", "1", "1", "2", "0", "0", "2.5"]);
        assert_eq!(Label::from("1"), Label::from("1.0"));
        assert_ne!(Label::from("a1"), Label::from("1"));
    }

    #[test]
    fn display_previews_long_tables() {
        use std::fmt::Write;

        let mut text = String::from("a,Label\n");
        for i in 0..100 {
            writeln!(text, "{i},x").unwrap();
        }
        let rendered = load(&text).unwrap().to_string();

        assert!(rendered.contains("..."));
        assert!(rendered.contains("99"));
        assert!(!rendered.contains("50.0"));
        assert!(rendered.ends_with("[100 rows x 2 columns]"));
    }
}

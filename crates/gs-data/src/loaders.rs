use std::fs;
use std::path::Path;

use gs_types::{DataError, FeatureNode, GsResult, Problem, SparseVector};

/// Loader for the sparse `<label> <index>:<value>` text format
#[derive(Debug, Default, Clone, Copy)]
pub struct ProblemLoader;

impl ProblemLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a dataset file
    pub fn load_file<P: AsRef<Path>>(&self, file_path: P) -> GsResult<Problem> {
        let path = file_path.as_ref();
        tracing::info!("Loading dataset from: {}", path.display());

        let bytes = fs::read(path).map_err(|e| DataError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let problem = self.parse_bytes(&bytes)?;
        tracing::info!(
            "Loaded {} instances with max feature index {}",
            problem.len(),
            problem.max_index()
        );
        Ok(problem)
    }

    /// Parse dataset text. Any malformed line fails the whole load.
    pub fn parse_str(&self, text: &str) -> GsResult<Problem> {
        self.parse_bytes(text.as_bytes())
    }

    /// Parse raw dataset bytes, decoding each line separately so that
    /// invalid UTF-8 is reported against its line.
    pub fn parse_bytes(&self, bytes: &[u8]) -> GsResult<Problem> {
        let mut labels = Vec::new();
        let mut instances = Vec::new();

        for (line_idx, raw) in bytes.split_inclusive(|&b| b == b'\n').enumerate() {
            let line_num = line_idx + 1;
            let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = std::str::from_utf8(raw).map_err(|e| DataError::MalformedLine {
                line: line_num,
                message: format!("invalid UTF-8: {e}"),
            })?;

            let (label, vector) = self.parse_line(line, line_num)?;
            labels.push(label);
            instances.push(vector);
        }

        if labels.is_empty() {
            return Err(DataError::Empty.into());
        }
        Ok(Problem::new(labels, instances))
    }

    /// Parse one instance line
    fn parse_line(&self, line: &str, line_num: usize) -> Result<(f64, SparseVector), DataError> {
        let malformed = |message: String| DataError::MalformedLine {
            line: line_num,
            message,
        };

        let mut tokens = line.split_whitespace();
        let label_str = tokens
            .next()
            .ok_or_else(|| malformed("empty line".to_string()))?;
        let label: f64 = label_str
            .parse()
            .map_err(|_| malformed(format!("invalid label '{label_str}'")))?;

        let mut nodes = Vec::new();
        let mut last_index: Option<u32> = None;
        for token in tokens {
            let (idx_str, val_str) = token
                .split_once(':')
                .ok_or_else(|| malformed(format!("expected index:value, got '{token}'")))?;

            let index: u32 = idx_str
                .parse()
                .map_err(|_| malformed(format!("invalid feature index '{idx_str}'")))?;
            if last_index.is_some_and(|last| index <= last) {
                return Err(malformed(format!(
                    "feature index {index} is not in ascending order"
                )));
            }
            let value: f64 = val_str
                .parse()
                .map_err(|_| malformed(format!("invalid feature value '{val_str}'")))?;

            last_index = Some(index);
            nodes.push(FeatureNode { index, value });
        }

        Ok((label, SparseVector::from_sorted(nodes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_types::GsError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn line_of(err: GsError) -> usize {
        match err {
            GsError::Data(DataError::MalformedLine { line, .. }) => line,
            other => panic!("expected malformed line, got {other:?}"),
        }
    }

    #[test]
    fn parses_labels_and_features() {
        let problem = ProblemLoader::new()
            .parse_str("+1 1:0.5 3:-1\n-1 2:1e-2\t4:2 \n2\n")
            .unwrap();

        assert_eq!(problem.labels, vec![1.0, -1.0, 2.0]);
        assert_eq!(problem.instances[0].nodes().len(), 2);
        assert_eq!(problem.instances[0].nodes()[1].value, -1.0);
        assert_eq!(problem.instances[1].nodes()[0].value, 0.01);
        assert!(problem.instances[2].is_empty());
        assert_eq!(problem.max_index(), 4);
    }

    #[test]
    fn empty_line_is_rejected_with_its_number() {
        let err = ProblemLoader::new()
            .parse_str("1 1:1\n\n-1 1:2\n")
            .unwrap_err();
        assert_eq!(line_of(err), 2);
    }

    #[test]
    fn bad_tokens_are_rejected() {
        let loader = ProblemLoader::new();
        assert_eq!(line_of(loader.parse_str("abc 1:1").unwrap_err()), 1);
        assert_eq!(line_of(loader.parse_str("1 1:1\n1 2").unwrap_err()), 2);
        assert_eq!(line_of(loader.parse_str("1 x:1").unwrap_err()), 1);
        assert_eq!(line_of(loader.parse_str("1 1:y").unwrap_err()), 1);
        assert_eq!(line_of(loader.parse_str("1 -2:1").unwrap_err()), 1);
    }

    #[test]
    fn indices_must_ascend_strictly() {
        let loader = ProblemLoader::new();
        assert_eq!(line_of(loader.parse_str("1 3:1 2:1").unwrap_err()), 1);
        assert_eq!(line_of(loader.parse_str("1 2:1 2:1").unwrap_err()), 1);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = ProblemLoader::new().parse_str("").unwrap_err();
        assert!(matches!(err, GsError::Data(DataError::Empty)));
    }

    #[test]
    fn load_file_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 1:0.25 2:0.75").unwrap();
        writeln!(file, "-1 1:-0.5").unwrap();

        let problem = ProblemLoader::new().load_file(file.path()).unwrap();
        assert_eq!(problem.len(), 2);
        assert_eq!(problem.labels[1], -1.0);
    }

    #[test]
    fn invalid_utf8_is_a_malformed_line() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"1 1:0.5\n-1 1:\xff\xfe\n").unwrap();

        let err = ProblemLoader::new().load_file(file.path()).unwrap_err();
        assert_eq!(line_of(err), 2);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let problem = ProblemLoader::new()
            .parse_bytes(b"1 1:0.5\r\n-1 2:1\r\n")
            .unwrap();
        assert_eq!(problem.len(), 2);
        assert_eq!(problem.instances[1].nodes()[0].index, 2);
    }

    #[test]
    fn missing_file_reports_open_failure() {
        let err = ProblemLoader::new()
            .load_file("/definitely/not/here.txt")
            .unwrap_err();
        assert!(matches!(err, GsError::Data(DataError::OpenFailed { .. })));
    }
}

// Splits one multi-table export into its logical tables.
//
// The export stacks up to three tables (previous day, today, day-over-day)
// in one file. Each table starts with a header row whose first cell carries
// the key column label; everything up to the next such row belongs to it.

pub const DEFAULT_HEADER_MARKER: &str = "city_id";

/// A tokenized line.
pub type RawRow = Vec<String>;

/// Data rows of each logical table, header rows already stripped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedTables {
    pub previous_day: Vec<RawRow>,
    pub today: Vec<RawRow>,
    /// `None` when the file carries no third header row.
    pub day_over_day: Option<Vec<RawRow>>,
    /// Number of header rows found, including any beyond the third.
    pub marker_count: usize,
}

/// Comma tokenizer with quote toggling: a `"` flips the in-quotes state and
/// is dropped from the output; commas inside quotes are literal.
pub fn tokenize_line(line: &str) -> RawRow {
    let mut row = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => row.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    row.push(current);
    row
}

pub fn is_header_row(row: &[String], marker: &str) -> bool {
    row.first().is_some_and(|cell| cell.contains(marker))
}

/// Blank rows, rows with an empty first cell and header rows are not data.
pub fn is_data_row(row: &[String], marker: &str) -> bool {
    match row.first() {
        Some(first) => !first.trim().is_empty() && !first.contains(marker),
        None => false,
    }
}

pub fn segment_tables(text: &str, marker: &str) -> SegmentedTables {
    let rows: Vec<RawRow> = text.lines().map(tokenize_line).collect();
    let markers: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| is_header_row(row, marker))
        .map(|(idx, _)| idx)
        .collect();

    // Rows strictly between marker `n` and the next marker (or end of input).
    let table = |n: usize| -> Option<Vec<RawRow>> {
        let start = *markers.get(n)? + 1;
        let end = markers.get(n + 1).copied().unwrap_or(rows.len());
        Some(
            rows[start..end]
                .iter()
                .filter(|row| is_data_row(row, marker))
                .cloned()
                .collect(),
        )
    };

    SegmentedTables {
        previous_day: table(0).unwrap_or_default(),
        today: table(1).unwrap_or_default(),
        day_over_day: table(2),
        marker_count: markers.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "city_id,city_name,manager,seq3,seq3_pct,seq9,cheating,active,expired,active_pct,triggers,passed,failed,skipped,sponsorship";

    #[test]
    fn tokenizer_respects_quotes() {
        assert_eq!(
            tokenize_line(r#"1,Riyadh,"Smith, John","1,204",5%"#),
            vec!["1", "Riyadh", "Smith, John", "1,204", "5%"]
        );
        assert_eq!(tokenize_line(""), vec![""]);
        assert_eq!(tokenize_line("a,,b,"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn splits_three_tables() {
        let text = format!(
            "Previous Day\n{HEADER}\n1,Jeddah,A\n2,Abha,B\n\n{HEADER}\n1,Jeddah,A\n2,Abha,B\n3,Taif,C\n{HEADER}\n1,Jeddah,A\n"
        );
        let tables = segment_tables(&text, DEFAULT_HEADER_MARKER);
        assert_eq!(tables.marker_count, 3);
        assert_eq!(tables.previous_day.len(), 2);
        assert_eq!(tables.today.len(), 3);
        assert_eq!(tables.day_over_day.map(|t| t.len()), Some(1));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let text = format!("{HEADER}\n1,Jeddah,A\n,,\n   \n{HEADER}\n2,Abha,B\nTotals,,\n");
        let tables = segment_tables(&text, DEFAULT_HEADER_MARKER);
        assert_eq!(tables.previous_day.len(), 1);
        // "Totals" has a non-empty first cell, so it is kept as data.
        assert_eq!(tables.today.len(), 2);
        assert!(tables.day_over_day.is_none());
    }

    #[test]
    fn missing_markers_yield_empty_tables() {
        let none = segment_tables("1,Jeddah,A\n2,Abha,B", DEFAULT_HEADER_MARKER);
        assert!(none.previous_day.is_empty());
        assert!(none.today.is_empty());
        assert!(none.day_over_day.is_none());
        assert_eq!(none.marker_count, 0);

        let one = segment_tables(&format!("{HEADER}\n1,Jeddah,A\n"), DEFAULT_HEADER_MARKER);
        assert_eq!(one.previous_day.len(), 1);
        assert!(one.today.is_empty());
    }

    #[test]
    fn handles_crlf_line_endings() {
        let text = format!("{HEADER}\r\n1,Jeddah,A\r\n{HEADER}\r\n1,Jeddah,A\r\n");
        let tables = segment_tables(&text, DEFAULT_HEADER_MARKER);
        assert_eq!(tables.today[0][2], "A");
    }

    #[test]
    fn custom_marker() {
        let text = "id,city\n1,Jeddah\nid,city\n2,Abha\n";
        let tables = segment_tables(text, "id");
        assert_eq!(tables.previous_day, vec![vec!["1".to_string(), "Jeddah".to_string()]]);
        assert_eq!(tables.today.len(), 1);
    }
}

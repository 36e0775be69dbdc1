//! Raw score detail returned with a score check: a small comma-separated table.

/// Parsed score detail. The first line is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ScoreTable {
    /// Splits on commas outside double quotes; fields are trimmed and unquoted.
    /// Interior blank lines become rows with one empty field. Returns `None`
    /// for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut lines = raw
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .map(split_fields);

        let header = lines.next()?;
        Some(Self {
            header,
            rows: lines.collect(),
        })
    }

    /// Fixed-width text rendering for terminals.
    pub fn render_text(&self) -> String {
        let columns = std::iter::once(&self.header)
            .chain(&self.rows)
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let render_row = |row: &Vec<String>| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = vec![render_row(&self.header)];
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.extend(self.rows.iter().map(render_row));
        out.join("\n")
    }
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => fields.push(clean_field(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    fields.push(clean_field(&current));
    fields
}

/// Doubled quotes are unescaped only inside a quoted field.
fn clean_field(field: &str) -> String {
    let field = field.trim();
    match field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.to_string(),
    }
}

//! Side-by-side view of generated code and the original lines it came from.

use crate::runner::error::SourceMapError;
use crate::runner::sourcemap::{InlineSourceMap, LineMapping};
use tracing::warn;

/// Left-aligns `text` in a field of `width` characters. Longer text is kept
/// whole.
pub fn pad_right(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

/// Annotates `generated` using its trailing inline source map.
///
/// Best effort: without a map comment, or when the map cannot be decoded,
/// the input is returned unchanged.
pub fn annotate(generated: &str) -> String {
    match try_annotate(generated) {
        Ok(Some(annotated)) => annotated,
        Ok(None) => generated.to_string(),
        Err(e) => {
            warn!(error = %e, "Inline source map could not be decoded, leaving source unannotated");
            generated.to_string()
        }
    }
}

/// Like [`annotate`] but surfaces decoding problems. `Ok(None)` means the
/// source carries no inline map.
pub fn try_annotate(generated: &str) -> Result<Option<String>, SourceMapError> {
    let Some(map) = InlineSourceMap::extract(generated)? else {
        return Ok(None);
    };
    let original = map.first_source_content()?;
    Ok(Some(render(generated, original, map.mappings())))
}

struct Row<'a> {
    generated: &'a str,
    annotation: Option<(String, String)>,
}

/// Renders the annotated text from explicit inputs.
///
/// The last element of the generated line split is not emitted: it is either
/// the empty remainder after a trailing newline or the map comment itself.
pub fn render(generated: &str, original: &str, mappings: &[LineMapping]) -> String {
    let generated_lines: Vec<&str> = generated.split('\n').collect();
    let original_lines: Vec<&str> = original.split('\n').collect();

    // Indexed by 1-based generated line.
    let mut contributors: Vec<Vec<u32>> = vec![Vec::new(); generated_lines.len() + 1];
    for mapping in mappings {
        if let Some(lines) = contributors.get_mut(mapping.generated_line as usize) {
            if !lines.contains(&mapping.original_line) {
                lines.push(mapping.original_line);
            }
        }
    }

    let body = &generated_lines[..generated_lines.len().saturating_sub(1)];
    let rows: Vec<Row> = body
        .iter()
        .enumerate()
        .map(|(idx, &generated)| Row {
            generated,
            annotation: describe(&contributors[idx + 1], &original_lines),
        })
        .collect();

    let generated_width = rows
        .iter()
        .filter(|row| row.annotation.is_some())
        .map(|row| row.generated.chars().count())
        .max()
        .unwrap_or(0);
    let label_width = rows
        .iter()
        .filter_map(|row| row.annotation.as_ref())
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|row| match &row.annotation {
            Some((label, original)) => format!(
                "{}{}| {}",
                pad_right(row.generated, generated_width + 3),
                pad_right(label, label_width + 1),
                original
            ),
            None => row.generated.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the `(label, original text)` pair for one generated line, or `None`
/// when no original line contributed to it.
fn describe(origins: &[u32], original_lines: &[&str]) -> Option<(String, String)> {
    match origins {
        [] => None,
        [single] => Some((
            format!("Line: {single}"),
            original_line(original_lines, *single).to_string(),
        )),
        many => {
            let numbers: Vec<String> = many.iter().map(u32::to_string).collect();
            let text: String = many
                .iter()
                .map(|&line| original_line(original_lines, line))
                .collect();
            Some((format!("Lines: {}", numbers.join(",")), text))
        }
    }
}

fn original_line<'a>(original_lines: &[&'a str], line: u32) -> &'a str {
    (line as usize)
        .checked_sub(1)
        .and_then(|idx| original_lines.get(idx))
        .copied()
        .unwrap_or("")
}

use super::parse::{normalize_line_endings, parse_patch, Hunk, HunkLine};
use super::PatchError;

pub const MAX_FUZZ: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Context lines that must survive fuzz trimming for a relocated hunk.
    pub min_context_lines: usize,
    pub max_fuzz: usize,
    pub ignore_whitespace_in_context: bool,
}

impl PatchOptions {
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.max_fuzz > MAX_FUZZ {
            return Err(PatchError::FuzzOutOfRange {
                requested: self.max_fuzz,
                max: MAX_FUZZ,
            });
        }
        Ok(())
    }

    /// Numbered hunks that miss their declared position are only searched for
    /// elsewhere when the caller opted into some leniency.
    pub fn relocation_enabled(&self) -> bool {
        self.max_fuzz > 0 || self.ignore_whitespace_in_context || self.min_context_lines > 0
    }
}

/// Applies every hunk of `patch_text` to `original`. The result keeps the
/// original's line-ending convention. Any failure leaves nothing applied.
pub fn apply_unified_patch(
    original: &str,
    patch_text: &str,
    options: &PatchOptions,
) -> Result<String, PatchError> {
    options.validate()?;
    let hunks = parse_hunks(patch_text)?;
    apply_hunks(original, &hunks, options)
}

/// Parses `patch_text`, rejecting text that carries no hunk at all.
pub fn parse_hunks(patch_text: &str) -> Result<Vec<Hunk>, PatchError> {
    let hunks = parse_patch(patch_text)?;
    if hunks.is_empty() {
        return Err(PatchError::NoHunks);
    }
    Ok(hunks)
}

/// Applies already parsed hunks to `original`.
pub fn apply_hunks(
    original: &str,
    hunks: &[Hunk],
    options: &PatchOptions,
) -> Result<String, PatchError> {
    if hunks.is_empty() {
        return Err(PatchError::NoHunks);
    }

    let uses_crlf = original.contains("\r\n");
    let mut lines: Vec<String> = normalize_line_endings(original)
        .split('\n')
        .map(str::to_string)
        .collect();

    let mut offset: isize = 0;
    for hunk in hunks {
        offset = apply_hunk(&mut lines, hunk, offset, options)?;
    }

    let joined = lines.join("\n");
    if uses_crlf {
        Ok(joined.replace('\n', "\r\n"))
    } else {
        Ok(joined)
    }
}

/// Returns the cumulative offset to use for the next hunk.
fn apply_hunk(
    lines: &mut Vec<String>,
    hunk: &Hunk,
    offset: isize,
    options: &PatchOptions,
) -> Result<isize, PatchError> {
    let loose = options.ignore_whitespace_in_context;
    let delta = hunk.net_delta();

    let declared = hunk
        .position
        .map(|position| position.old_start.saturating_sub(1) as isize);

    if let Some(declared) = declared {
        let start = declared + offset;
        match verify_at(lines, start, &hunk.lines, loose, &hunk.header) {
            Ok(start) => {
                splice_at(lines, start, &hunk.lines);
                return Ok(offset + delta);
            }
            Err(err) if !options.relocation_enabled() => return Err(err),
            Err(_) => {}
        }
    }

    let relocation = relocate(lines, hunk, options)?;
    let body = trim_body(&hunk.lines, relocation.leading_trim, relocation.trailing_trim);
    let start = verify_at(lines, relocation.start as isize, &body, loose, &hunk.header)?;
    splice_at(lines, start, &body);

    Ok(match declared {
        Some(declared) => {
            relocation.start as isize - relocation.leading_trim as isize - declared + delta
        }
        None => offset + delta,
    })
}

/// Checks every context and removal line against `lines` starting at `start`
/// without mutating anything.
fn verify_at(
    lines: &[String],
    start: isize,
    body: &[HunkLine],
    loose: bool,
    header: &str,
) -> Result<usize, PatchError> {
    if start < 0 || start as usize > lines.len() {
        return Err(PatchError::HunkOutOfRange {
            header: header.to_string(),
            line: start + 1,
        });
    }
    let start = start as usize;

    let mut cursor = start;
    for line in body {
        match line {
            HunkLine::Context(expected) => {
                let matched = lines
                    .get(cursor)
                    .is_some_and(|actual| context_matches(actual, expected, loose));
                if !matched {
                    return Err(PatchError::ContextMismatch { line: cursor + 1 });
                }
                cursor += 1;
            }
            HunkLine::Removal(expected) => {
                if lines.get(cursor) != Some(expected) {
                    return Err(PatchError::RemovalMismatch { line: cursor + 1 });
                }
                cursor += 1;
            }
            HunkLine::Addition(_) => {}
        }
    }
    Ok(start)
}

/// Context lines keep the file's own text so whitespace-insensitive matches
/// do not rewrite them.
fn splice_at(lines: &mut Vec<String>, start: usize, body: &[HunkLine]) {
    let old_len = body.iter().filter(|line| line.consumes_old_line()).count();
    let mut replacement = Vec::with_capacity(body.len());
    let mut cursor = start;
    for line in body {
        match line {
            HunkLine::Context(_) => {
                replacement.push(lines[cursor].clone());
                cursor += 1;
            }
            HunkLine::Removal(_) => cursor += 1,
            HunkLine::Addition(text) => replacement.push(text.clone()),
        }
    }
    lines.splice(start..start + old_len, replacement);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Relocation {
    start: usize,
    leading_trim: usize,
    trailing_trim: usize,
}

fn relocate(
    lines: &[String],
    hunk: &Hunk,
    options: &PatchOptions,
) -> Result<Relocation, PatchError> {
    let old: Vec<&HunkLine> = hunk
        .lines
        .iter()
        .filter(|line| line.consumes_old_line())
        .collect();
    let leading_context = old
        .iter()
        .take_while(|line| matches!(line, HunkLine::Context(_)))
        .count();
    let trailing_context = old
        .iter()
        .rev()
        .take_while(|line| matches!(line, HunkLine::Context(_)))
        .count();

    let mut previous: Option<(usize, usize)> = None;
    for level in 0..=options.max_fuzz {
        let leading_trim = level.min(leading_context);
        let trailing_trim = level.min(trailing_context).min(old.len() - leading_trim);
        if previous == Some((leading_trim, trailing_trim)) {
            break;
        }
        previous = Some((leading_trim, trailing_trim));

        let window = &old[leading_trim..old.len() - trailing_trim];
        let available = window
            .iter()
            .filter(|line| matches!(line, HunkLine::Context(_)))
            .count();
        if available < options.min_context_lines {
            return Err(PatchError::InsufficientContext {
                header: hunk.header.clone(),
                required: options.min_context_lines,
                available,
            });
        }

        let matches = find_window_matches(lines, window, options.ignore_whitespace_in_context);
        match matches.as_slice() {
            [] => continue,
            [start] => {
                return Ok(Relocation {
                    start: *start,
                    leading_trim,
                    trailing_trim,
                })
            }
            many => {
                return Err(PatchError::AmbiguousContext {
                    header: hunk.header.clone(),
                    matches: many.len(),
                })
            }
        }
    }

    Err(PatchError::ContextNotFound {
        header: hunk.header.clone(),
    })
}

fn find_window_matches(lines: &[String], window: &[&HunkLine], loose: bool) -> Vec<usize> {
    if window.len() > lines.len() {
        return Vec::new();
    }
    (0..=lines.len() - window.len())
        .filter(|&start| {
            window
                .iter()
                .zip(&lines[start..])
                .all(|(expected, actual)| match expected {
                    HunkLine::Context(text) => context_matches(actual, text, loose),
                    HunkLine::Removal(text) => actual == text,
                    HunkLine::Addition(_) => true,
                })
        })
        .collect()
}

/// Drops the first `leading` and last `trailing` context lines of the body.
/// Additions interleaved with them stay in place.
fn trim_body(body: &[HunkLine], leading: usize, trailing: usize) -> Vec<HunkLine> {
    let mut keep = vec![true; body.len()];

    let mut remaining = leading;
    for (index, line) in body.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        if matches!(line, HunkLine::Context(_)) {
            keep[index] = false;
            remaining -= 1;
        }
    }

    let mut remaining = trailing;
    for (index, line) in body.iter().enumerate().rev() {
        if remaining == 0 {
            break;
        }
        if matches!(line, HunkLine::Context(_)) && keep[index] {
            keep[index] = false;
            remaining -= 1;
        }
    }

    body.iter()
        .zip(keep)
        .filter_map(|(line, keep)| keep.then(|| line.clone()))
        .collect()
}

fn context_matches(actual: &str, expected: &str, loose: bool) -> bool {
    if actual == expected {
        return true;
    }
    loose && collapse_whitespace(actual) == collapse_whitespace(expected)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzy(max_fuzz: usize) -> PatchOptions {
        PatchOptions {
            max_fuzz,
            ..PatchOptions::default()
        }
    }

    #[test]
    fn exact_hunk_replaces_middle_line() {
        let patched = apply_unified_patch(
            "a\nb\nc",
            "@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n",
            &PatchOptions::default(),
        )
        .expect("apply");
        assert_eq!(patched, "a\nB\nc");
    }

    #[test]
    fn later_hunks_are_shifted_by_earlier_additions() {
        let original = "one\ntwo\nthree\nfour\nfive\nsix";
        let patch = "@@ -1,2 +1,4 @@\n one\n+one-a\n+one-b\n two\n@@ -5,2 +7,2 @@\n five\n-six\n+SIX\n";
        let patched =
            apply_unified_patch(original, patch, &PatchOptions::default()).expect("apply");
        assert_eq!(
            patched,
            "one\none-a\none-b\ntwo\nthree\nfour\nfive\nSIX"
        );
    }

    #[test]
    fn context_mismatch_names_the_line() {
        let err = apply_unified_patch(
            "a\nb\nc",
            "@@ -2,2 +2,2 @@\n x\n-c\n+C\n",
            &PatchOptions::default(),
        )
        .expect_err("mismatch");
        assert_eq!(err, PatchError::ContextMismatch { line: 2 });
    }

    #[test]
    fn removal_mismatch_names_the_line() {
        let err = apply_unified_patch(
            "a\nb\nc",
            "@@ -1,2 +1,2 @@\n a\n-z\n+B\n",
            &PatchOptions::default(),
        )
        .expect_err("mismatch");
        assert_eq!(err, PatchError::RemovalMismatch { line: 2 });
    }

    #[test]
    fn hunk_beyond_end_of_file_is_out_of_range() {
        let err = apply_unified_patch("a", "@@ -9,1 +9,1 @@\n-a\n+b\n", &PatchOptions::default())
            .expect_err("out of range");
        assert!(matches!(err, PatchError::HunkOutOfRange { line: 9, .. }));
    }

    #[test]
    fn misplaced_hunk_is_relocated_with_fuzz() {
        let patched = apply_unified_patch(
            "inserted\na\nb\nc",
            "@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n",
            &fuzzy(1),
        )
        .expect("apply");
        assert_eq!(patched, "inserted\na\nB\nc");
    }

    #[test]
    fn misplaced_hunk_fails_without_leniency() {
        let err = apply_unified_patch(
            "inserted\na\nb\nc",
            "@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n",
            &PatchOptions::default(),
        )
        .expect_err("strict mode");
        assert_eq!(err, PatchError::ContextMismatch { line: 1 });
    }

    #[test]
    fn fuzz_trims_stale_outer_context_but_never_removals() {
        let original = "header\nx = 1\ny = 2\nfooter";
        let patch = "@@ -1,4 +1,4 @@\n stale header\n x = 1\n-y = 2\n+y = 3\n footer\n";

        let err = apply_unified_patch(original, patch, &fuzzy(0)).expect_err("no fuzz");
        assert!(matches!(err, PatchError::ContextMismatch { .. }));

        let patched = apply_unified_patch(original, patch, &fuzzy(1)).expect("apply");
        assert_eq!(patched, "header\nx = 1\ny = 3\nfooter");

        let removal_only = "@@\n-missing\n+added\n";
        let err = apply_unified_patch(original, removal_only, &fuzzy(2)).expect_err("not found");
        assert!(matches!(err, PatchError::ContextNotFound { .. }));
    }

    #[test]
    fn duplicated_context_is_ambiguous() {
        let original = "start\nvalue = 1\nend\nstart\nvalue = 1\nend";
        let err = apply_unified_patch(
            original,
            "@@\n start\n-value = 1\n+value = 2\n end\n",
            &PatchOptions::default(),
        )
        .expect_err("ambiguous");
        assert!(matches!(err, PatchError::AmbiguousContext { matches: 2, .. }));
    }

    #[test]
    fn positionless_hunk_is_located_by_content() {
        let patched = apply_unified_patch(
            "def run():\n    return 1\n",
            "*** Begin Patch\n@@ def run():\n def run():\n-    return 1\n+    return 2\n*** End Patch",
            &PatchOptions::default(),
        )
        .expect("apply");
        assert_eq!(patched, "def run():\n    return 2\n");
    }

    #[test]
    fn whitespace_insensitive_context_keeps_file_text() {
        let patched = apply_unified_patch(
            "if  (x)  {\n  call();\n}",
            "@@ -1,3 +1,3 @@\n if (x) {\n-  call();\n+  other();\n }\n",
            &PatchOptions {
                ignore_whitespace_in_context: true,
                ..PatchOptions::default()
            },
        )
        .expect("apply");
        assert_eq!(patched, "if  (x)  {\n  other();\n}");
    }

    #[test]
    fn min_context_floor_rejects_thin_relocation() {
        let err = apply_unified_patch(
            "a\nb\nc",
            "@@\n a\n-b\n+B\n",
            &PatchOptions {
                min_context_lines: 2,
                ..PatchOptions::default()
            },
        )
        .expect_err("insufficient context");
        assert!(matches!(
            err,
            PatchError::InsufficientContext {
                required: 2,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn crlf_files_keep_crlf() {
        let patched = apply_unified_patch(
            "a\r\nb\r\nc\r\n",
            "@@ -1,3 +1,3 @@\r\n a\r\n-b\r\n+B\r\n c\r\n",
            &PatchOptions::default(),
        )
        .expect("apply");
        assert_eq!(patched, "a\r\nB\r\nc\r\n");
    }

    #[test]
    fn lines_that_look_like_file_headers_are_edited_inside_a_hunk() {
        let patched = apply_unified_patch(
            "a\n-- x\nc",
            "@@ -1,3 +1,3 @@\n a\n--- x\n+++ y\n c\n",
            &PatchOptions::default(),
        )
        .expect("apply");
        assert_eq!(patched, "a\n++ y\nc");
    }

    #[test]
    fn patch_without_hunks_is_rejected() {
        let err = apply_unified_patch("a", "-a\n+b\n", &PatchOptions::default())
            .expect_err("no hunks");
        assert_eq!(err, PatchError::NoHunks);
        assert!(err.is_validation());
    }

    #[test]
    fn fuzz_above_two_is_rejected() {
        let err = apply_unified_patch("a", "@@ -1 +1 @@\n-a\n+b\n", &fuzzy(3))
            .expect_err("fuzz too high");
        assert_eq!(
            err,
            PatchError::FuzzOutOfRange {
                requested: 3,
                max: MAX_FUZZ
            }
        );
    }

    #[test]
    fn trim_body_keeps_interleaved_additions() {
        let body = vec![
            HunkLine::Context("a".to_string()),
            HunkLine::Addition("x".to_string()),
            HunkLine::Context("b".to_string()),
            HunkLine::Removal("c".to_string()),
            HunkLine::Context("d".to_string()),
        ];
        assert_eq!(
            trim_body(&body, 1, 1),
            vec![
                HunkLine::Addition("x".to_string()),
                HunkLine::Context("b".to_string()),
                HunkLine::Removal("c".to_string()),
            ]
        );
    }
}

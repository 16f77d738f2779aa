use super::PatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkPosition {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Removal(String),
    Addition(String),
}

impl HunkLine {
    pub fn text(&self) -> &str {
        match self {
            Self::Context(text) | Self::Removal(text) | Self::Addition(text) => text,
        }
    }

    pub fn consumes_old_line(&self) -> bool {
        !matches!(self, Self::Addition(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub header: String,
    /// `None` for `@@` headers that carry no line numbers.
    pub position: Option<HunkPosition>,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn net_delta(&self) -> isize {
        self.lines.iter().fold(0, |delta, line| match line {
            HunkLine::Addition(_) => delta + 1,
            HunkLine::Removal(_) => delta - 1,
            HunkLine::Context(_) => delta,
        })
    }
}

const WRAPPER_PREFIXES: &[&str] = &[
    "*** Begin Patch",
    "*** End Patch",
    "*** Update File:",
    "*** Add File:",
    "*** Delete File:",
    "*** Move to:",
    "*** End of File",
    "diff --git ",
    "index ",
    "new file mode",
    "deleted file mode",
    "old mode",
    "new mode",
    "similarity index",
    "rename from",
    "rename to",
];

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

pub fn is_wrapper_line(line: &str) -> bool {
    WRAPPER_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn is_file_header_pair(lines: &[&str], index: usize) -> bool {
    lines[index].starts_with("--- ")
        && lines
            .get(index + 1)
            .is_some_and(|next| next.starts_with("+++ "))
}

struct OpenHunk {
    hunk: Hunk,
    pending_blank_lines: usize,
}

impl OpenHunk {
    /// A numbered hunk whose declared old and new lengths are both used up.
    /// Positionless hunks never complete early, so `--- `/`+++ ` inside them
    /// stay body lines.
    fn is_complete(&self) -> bool {
        let Some(position) = self.hunk.position else {
            return false;
        };
        let (old, new) = self
            .hunk
            .lines
            .iter()
            .fold((0, 0), |(old, new), line| match line {
                HunkLine::Context(_) => (old + 1, new + 1),
                HunkLine::Removal(_) => (old + 1, new),
                HunkLine::Addition(_) => (old, new + 1),
            });
        let blanks = self.pending_blank_lines;
        old + blanks >= position.old_len && new + blanks >= position.new_len
    }

    fn push(&mut self, line: HunkLine) {
        for _ in 0..self.pending_blank_lines {
            self.hunk.lines.push(HunkLine::Context(String::new()));
        }
        self.pending_blank_lines = 0;
        self.hunk.lines.push(line);
    }
}

/// Splits normalized patch text into hunks. Wrapper and file-header lines
/// are dropped; text before the first hunk is ignored. A `--- `/`+++ ` pair
/// is only a file header outside a hunk body.
pub fn parse_patch(patch_text: &str) -> Result<Vec<Hunk>, PatchError> {
    let normalized = normalize_line_endings(patch_text);
    let lines: Vec<&str> = normalized.split('\n').collect();
    let mut hunks = Vec::new();
    let mut open: Option<OpenHunk> = None;

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];

        if line.starts_with("@@") {
            if let Some(done) = open.take() {
                hunks.push(done.hunk);
            }
            open = Some(OpenHunk {
                hunk: Hunk {
                    header: line.to_string(),
                    position: parse_hunk_header(line)?,
                    lines: Vec::new(),
                },
                pending_blank_lines: 0,
            });
            index += 1;
            continue;
        }

        let header_allowed = open.as_ref().map_or(true, OpenHunk::is_complete);
        if header_allowed && is_file_header_pair(&lines, index) {
            if let Some(done) = open.take() {
                hunks.push(done.hunk);
            }
            index += 2;
            continue;
        }

        if is_wrapper_line(line) {
            if let Some(done) = open.take() {
                hunks.push(done.hunk);
            }
            index += 1;
            continue;
        }

        if let Some(current) = open.as_mut() {
            if line.is_empty() {
                current.pending_blank_lines += 1;
            } else if let Some(body) = parse_body_line(line) {
                current.push(body);
            } else if !line.starts_with('\\') {
                return Err(PatchError::InvalidHunkLine {
                    header: current.hunk.header.clone(),
                    line: line.to_string(),
                });
            }
        }
        index += 1;
    }

    if let Some(done) = open.take() {
        hunks.push(done.hunk);
    }
    Ok(hunks)
}

fn parse_body_line(line: &str) -> Option<HunkLine> {
    let mut chars = line.chars();
    let marker = chars.next()?;
    let rest = chars.as_str().to_string();
    match marker {
        ' ' => Some(HunkLine::Context(rest)),
        '-' => Some(HunkLine::Removal(rest)),
        '+' => Some(HunkLine::Addition(rest)),
        _ => None,
    }
}

/// `@@ -a[,b] +c[,d] @@[ section]` yields a position; `@@` or `@@ section`
/// yields `None`.
pub fn parse_hunk_header(line: &str) -> Result<Option<HunkPosition>, PatchError> {
    let invalid = || PatchError::InvalidHunkHeader {
        header: line.to_string(),
    };

    let rest = line.trim_start_matches('@').trim_start();
    if !rest.starts_with('-') {
        return Ok(None);
    }

    let mut tokens = rest.split_whitespace();
    let old = tokens
        .next()
        .and_then(|token| token.strip_prefix('-'))
        .ok_or_else(invalid)?;
    let new = tokens
        .next()
        .and_then(|token| token.strip_prefix('+'))
        .ok_or_else(invalid)?;
    if !tokens.next().is_some_and(|token| token.starts_with("@@")) {
        return Err(invalid());
    }

    let (old_start, old_len) = parse_range(old).ok_or_else(invalid)?;
    let (new_start, new_len) = parse_range(new).ok_or_else(invalid)?;
    Ok(Some(HunkPosition {
        old_start,
        old_len,
        new_start,
        new_len,
    }))
}

fn parse_range(raw: &str) -> Option<(usize, usize)> {
    match raw.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((raw.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_header_parses_with_and_without_lengths() {
        let position = parse_hunk_header("@@ -3,4 +5,6 @@ fn main()")
            .expect("parse")
            .expect("position");
        assert_eq!(
            position,
            HunkPosition {
                old_start: 3,
                old_len: 4,
                new_start: 5,
                new_len: 6
            }
        );

        let short = parse_hunk_header("@@ -7 +7 @@")
            .expect("parse")
            .expect("position");
        assert_eq!((short.old_start, short.old_len), (7, 1));
    }

    #[test]
    fn headers_without_numbers_are_positionless() {
        assert_eq!(parse_hunk_header("@@").expect("parse"), None);
        assert_eq!(parse_hunk_header("@@ def handler():").expect("parse"), None);
    }

    #[test]
    fn malformed_numbered_header_is_rejected() {
        let err = parse_hunk_header("@@ -x,2 +1,2 @@").expect_err("invalid header");
        assert!(matches!(err, PatchError::InvalidHunkHeader { .. }));
        let err = parse_hunk_header("@@ -1,2 +1,2").expect_err("missing closing marker");
        assert!(matches!(err, PatchError::InvalidHunkHeader { .. }));
    }

    #[test]
    fn wrapper_lines_and_file_headers_are_stripped() {
        let patch = "*** Begin Patch\n*** Update File: node.py\ndiff --git a/node.py b/node.py\nindex 111..222 100644\n--- a/node.py\n+++ b/node.py\n@@ -1,2 +1,2 @@\n a\n-b\n+B\n*** End Patch\n";
        let hunks = parse_patch(patch).expect("parse");
        assert_eq!(hunks.len(), 1);
        assert_eq!(
            hunks[0].lines,
            vec![
                HunkLine::Context("a".to_string()),
                HunkLine::Removal("b".to_string()),
                HunkLine::Addition("B".to_string()),
            ]
        );
    }

    #[test]
    fn interior_blank_lines_become_empty_context_and_trailing_ones_are_dropped() {
        let hunks = parse_patch("@@ -1,3 +1,3 @@\n a\n\n-c\n+C\n\n\n").expect("parse");
        assert_eq!(
            hunks[0].lines,
            vec![
                HunkLine::Context("a".to_string()),
                HunkLine::Context(String::new()),
                HunkLine::Removal("c".to_string()),
                HunkLine::Addition("C".to_string()),
            ]
        );
    }

    #[test]
    fn single_dash_lines_inside_a_body_stay_removals() {
        let hunks = parse_patch("@@ -1,2 +1,1 @@\n--- separator\n keep\n").expect("parse");
        assert_eq!(
            hunks[0].lines[0],
            HunkLine::Removal("-- separator".to_string())
        );
    }

    #[test]
    fn dashed_removal_followed_by_plussed_addition_stays_in_the_hunk() {
        let hunks = parse_patch("@@ -1,3 +1,3 @@\n a\n--- x\n+++ y\n c\n").expect("parse");
        assert_eq!(hunks.len(), 1);
        assert_eq!(
            hunks[0].lines,
            vec![
                HunkLine::Context("a".to_string()),
                HunkLine::Removal("-- x".to_string()),
                HunkLine::Addition("++ y".to_string()),
                HunkLine::Context("c".to_string()),
            ]
        );
    }

    #[test]
    fn file_headers_after_a_completed_hunk_start_the_next_file() {
        let patch = "--- a/one.py\n+++ b/one.py\n@@ -1 +1 @@\n-a\n+b\n--- a/two.py\n+++ b/two.py\n@@ -1 +1 @@\n-c\n+d\n";
        let hunks = parse_patch(patch).expect("parse");
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!(hunks[1].lines[0], HunkLine::Removal("c".to_string()));
    }

    #[test]
    fn unknown_body_line_is_rejected_and_no_newline_marker_is_ignored() {
        let err = parse_patch("@@ -1 +1 @@\n-a\n+b\ngarbage\n").expect_err("invalid line");
        assert!(matches!(err, PatchError::InvalidHunkLine { .. }));

        let hunks =
            parse_patch("@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n").expect("parse");
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!(hunks[0].net_delta(), 0);
    }

    #[test]
    fn text_without_hunk_markers_yields_no_hunks() {
        assert!(parse_patch("just some prose\n-not a diff\n")
            .expect("parse")
            .is_empty());
    }
}

// Copyright (c) 2026 rezky_nightky

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

struct Rows<'a> {
    rows: Vec<String>,
    indent: &'a str,
    indent_w: usize,
    cur: String,
    cur_w: usize,
    /// `cur` holds nothing but the indent.
    fresh: bool,
}

impl<'a> Rows<'a> {
    fn new(indent: &'a str) -> Self {
        let indent_w = indent.width();
        Self {
            rows: Vec::new(),
            indent,
            indent_w,
            cur: indent.to_string(),
            cur_w: indent_w,
            fresh: true,
        }
    }

    fn break_row(&mut self) {
        let done = std::mem::replace(&mut self.cur, self.indent.to_string());
        self.rows.push(done.trim_end().to_string());
        self.cur_w = self.indent_w;
        self.fresh = true;
    }

    fn push_str(&mut self, s: &str) {
        self.cur.push_str(s);
        self.cur_w += s.width();
        self.fresh = false;
    }

    fn hard_split(&mut self, word: &str, max: usize) {
        for ch in word.chars() {
            let cw = ch.width().unwrap_or(0);
            if self.cur_w + cw > max && !self.fresh {
                self.break_row();
            }
            self.cur.push(ch);
            self.cur_w += cw;
            self.fresh = false;
        }
    }

    fn finish(mut self) -> Vec<String> {
        if !self.fresh || self.rows.is_empty() {
            self.rows.push(self.cur.trim_end().to_string());
        }
        self.rows
    }
}

/// Greedy word wrap by display width. Continuation rows repeat the line's
/// leading indent; a word wider than the row is split mid-word.
pub fn wrap(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if text.width() <= max {
        return vec![text.to_string()];
    }
    let body = text.trim_start_matches(' ');
    let lead = &text[..text.len() - body.len()];
    let indent = if lead.len() < max / 2 { lead } else { "" };

    let mut rows = Rows::new(indent);
    for token in body.split_inclusive(' ') {
        let word = token.trim_end_matches(' ');
        let spaces = &token[word.len()..];
        if word.is_empty() {
            // Runs of spaces: keep them mid-row, drop them at a row start.
            if !rows.fresh {
                rows.cur.push_str(spaces);
                rows.cur_w += spaces.len();
            }
            continue;
        }
        let ww = word.width();
        if rows.cur_w + ww > max && !rows.fresh {
            rows.break_row();
        }
        if rows.cur_w + ww <= max {
            rows.push_str(word);
        } else {
            rows.hard_split(word, max);
        }
        if !spaces.is_empty() {
            rows.cur.push_str(spaces);
            rows.cur_w += spaces.len();
        }
    }
    rows.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_lines_are_untouched() {
        assert_eq!(wrap("  help    список", 40), vec!["  help    список"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn breaks_between_words() {
        assert_eq!(wrap("hello world foo", 11), vec!["hello world", "foo"]);
    }

    #[test]
    fn continuation_rows_keep_the_indent() {
        assert_eq!(
            wrap("  indented text here", 10),
            vec!["  indented", "  text", "  here"]
        );
    }

    #[test]
    fn long_words_are_hard_split() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
    }

    #[test]
    fn measures_cyrillic_by_display_width() {
        let rows = wrap("ОТЧЁТ СУБЪЕКТА НЕ НАЙДЕН", 14);
        assert_eq!(rows, vec!["ОТЧЁТ СУБЪЕКТА", "НЕ НАЙДЕН"]);
    }

    proptest! {
        #[test]
        fn rows_fit_and_keep_every_visible_char(text in "[a-z ]{0,80}", max in 1usize..30) {
            let rows = wrap(&text, max);
            for r in &rows {
                prop_assert!(r.width() <= max, "{:?} wider than {}", r, max);
            }
            let joined: String = rows.concat().chars().filter(|c| *c != ' ').collect();
            let original: String = text.chars().filter(|c| *c != ' ').collect();
            prop_assert_eq!(joined, original);
        }
    }
}

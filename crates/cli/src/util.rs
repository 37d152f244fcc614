use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string. Emoji in verdict labels count as two columns.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s.chars().take_while(|&ch| char_width(ch) <= width).take(1).collect();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = char_width(ch);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Left text and right text on one line of exactly `width` columns.
/// The left side is truncated first; the right side is dropped if it alone
/// does not fit.
pub(crate) fn spread(left: &str, right: &str, width: usize) -> String {
    let rw = display_width(right);
    if rw + 1 > width {
        let left = truncate_display(left, width);
        let pad = width.saturating_sub(display_width(&left));
        return format!("{}{}", left, " ".repeat(pad));
    }
    let left = truncate_display(left, width - rw - 1);
    let pad = width - rw - display_width(&left);
    format!("{}{}{}", left, " ".repeat(pad), right)
}

/// Greedy word wrap to `width` display columns. Words longer than a line
/// are cut. Blank input lines are kept as paragraph breaks.
pub(crate) fn wrap_display(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for word in paragraph.split_whitespace() {
            let ww = display_width(word);
            if used > 0 && used + 1 + ww > width {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            if ww > width {
                for ch in word.chars() {
                    let cw = char_width(ch);
                    if used + cw > width {
                        lines.push(std::mem::take(&mut line));
                        used = 0;
                    }
                    line.push(ch);
                    used += cw;
                }
                continue;
            }
            if used > 0 {
                line.push(' ');
                used += 1;
            }
            line.push_str(word);
            used += ww;
        }
        lines.push(line);
    }

    lines
}

/// Finalize a letter body for review and diffing
///
/// Strips trailing whitespace from every line, collapses runs of blank lines
/// to a single blank line, and drops leading and trailing blank lines.
pub fn clean_letter_text<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut cleaned: Vec<&str> = Vec::new();
    let mut previous_blank = true;

    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            if !previous_blank {
                cleaned.push("");
            }
            previous_blank = true;
        } else {
            cleaned.push(line);
            previous_blank = false;
        }
    }

    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_runs() {
        let text = clean_letter_text(["", "  ", "Dear Liz,   ", "", "", "\t", "body", "", ""]);
        assert_eq!(text, "Dear Liz,\n\nbody");
    }

    #[test]
    fn test_all_blank_is_empty() {
        assert_eq!(clean_letter_text(["", " "]), "");
    }

    #[test]
    fn test_keeps_leading_indentation() {
        assert_eq!(clean_letter_text(["    indented"]), "    indented");
    }
}

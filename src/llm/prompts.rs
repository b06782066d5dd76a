/// System prompt for entity extraction
pub const SYSTEM_PROMPT: &str = r#"You are reading one transcribed 19th-century personal letter. List the people and places it mentions.

RULES:
1. Copy names exactly as written, including initials and titles (e.g. "Mrs. Perry", "B. F. Perry").
2. Places are towns, court houses, districts, states and countries. Do not list rooms, buildings or meals.
3. Do not invent names that are not in the text.
4. List each distinct name once.
5. Submit the result with the submit_entities tool."#;

/// Build the user prompt for one letter
pub fn build_letter_prompt(letter_number: u32, text: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("# Letter {}\n\n", letter_number));
    prompt.push_str("```text\n");
    prompt.push_str(text);
    prompt.push_str("\n```\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_letter_prompt() {
        let prompt = build_letter_prompt(4, "Dear Liz,\nColumbia");
        assert!(prompt.starts_with("# Letter 4\n"));
        assert!(prompt.contains("Dear Liz,\nColumbia\n```"));
    }
}

pub const TUTOR_SYSTEM_PROMPT: &str = r#"
You are a helpful AI assistant.
"#;

pub const EXPLAIN_SYSTEM_PROMPT: &str = r#"
You are a writing tutor helping non-native English speakers improve their professional English.
Be comprehensive but concise in your answers.
"#;

pub fn judge_prompt(text: &str) -> String {
    format!(
        "Is the following grammatically correct? \
         Just tell me yes or no, nothing else.\n\n\"{text}\""
    )
}

pub fn correct_prompt(text: &str) -> String {
    format!(
        "Check the following for spelling and grammatical errors. \
         Just return the corrected text, nothing else.\n\n\"{text}\""
    )
}

pub fn explain_prompt(original: &str, corrected: &str) -> String {
    format!(
        "Sentence B is the grammatically corrected version of sentence A. \
         Given every difference which sentence B corrects, \
         explain why sentence A needs to be changed, using understandable everyday language. \
         Precede this with a short, easy to remember description of the error, or errors, \
         followed by a newline. \
         Keep the explanation under or as close to 20 words as possible per error.\n\n\
         A: {original}\nB: {corrected}"
    )
}

pub fn incorrect_variant_prompt(seed: &str) -> String {
    format!(
        "Generate a sentence with the same grammatical error as sentence A\n\n\
         A: Your child were at school today\nB: She were eating dinner\n\n\
         A: The dogs were eat at the park\nB: The children were sit at the table\n\n\
         A: We need to get our sale's numbers up\nB: There are many desk's in this room\n\n\
         A: {seed}\nB:"
    )
}

pub fn correct_variant_prompt(seed: &str) -> String {
    format!(
        "Generate a grammatically correct sentence using the grammar concept \
         that the following sentence uses incorrectly, but change the subject. \
         Just give me the sentence, nothing else.\n\n\"{seed}\""
    )
}

pub fn list_incorrect_prompt(text: &str) -> String {
    format!(
        "List the grammatically incorrect sentence, or sentences, \
         each separated by the '|' character. Nothing else. \
         If there is only one, just return the sentence.\n\n\"{text}\""
    )
}

pub fn correct_list_prompt(sentences: &[String]) -> String {
    format!(
        "Correct each sentence, separating each with the '|' character. \
         If there is only one, just return the corrected sentence.\n\n\"{}\"",
        sentences.join("|")
    )
}

/// Strips the whitespace and wrapping quotes models like to add around a sentence.
pub fn clean_sentence(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

pub fn parse_yes_no(raw: &str) -> bool {
    clean_sentence(raw)
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

pub fn split_pipe_list(raw: &str) -> Vec<String> {
    clean_sentence(raw)
        .split('|')
        .map(clean_sentence)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

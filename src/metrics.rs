use serde::{Deserialize, Serialize};

/// Performance snapshot derived from the full text, the input so far, and
/// elapsed seconds. Always recomputed from its inputs; nothing is cached
/// between keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
}

/// Count of positions where the input matches the text. Comparison stops at
/// the shorter of the two, so input typed past the end never counts as
/// correct.
pub fn correct_chars(reference: &str, typed: &str) -> usize {
    reference
        .chars()
        .zip(typed.chars())
        .filter(|(expected, actual)| expected == actual)
        .count()
}

/// Whitespace-delimited tokens in the input.
pub fn words_typed(typed: &str) -> usize {
    typed.split_whitespace().count()
}

/// Accuracy is the share of typed characters that match, rounded half up;
/// an empty input reads as 100. Wpm is words per elapsed minute, rounded
/// half up; zero elapsed time reads as 0.
pub fn compute(reference: &str, typed: &str, elapsed_secs: f64) -> TypingStats {
    let total_chars = typed.chars().count();
    let correct_chars = correct_chars(reference, typed);
    let incorrect_chars = total_chars - correct_chars;

    let accuracy = if total_chars > 0 {
        ((correct_chars as f64 / total_chars as f64) * 100.0).round() as u32
    } else {
        100
    };

    let wpm = if elapsed_secs > 0.0 {
        (words_typed(typed) as f64 * 60.0 / elapsed_secs).round() as u32
    } else {
        0
    };

    TypingStats {
        wpm,
        accuracy,
        correct_chars,
        incorrect_chars,
        total_chars,
    }
}

/// Render class for one position of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// The next position to type.
    Cursor,
    /// Past the cursor, not reached yet.
    Untyped,
    Correct,
    Incorrect,
}

/// Class of the text character at `index` given the input so far.
pub fn classify(reference: &str, typed: &str, index: usize) -> CharClass {
    let cursor = typed.chars().count();
    if index >= cursor {
        return if index == cursor {
            CharClass::Cursor
        } else {
            CharClass::Untyped
        };
    }
    match (reference.chars().nth(index), typed.chars().nth(index)) {
        (Some(expected), Some(actual)) if expected == actual => CharClass::Correct,
        _ => CharClass::Incorrect,
    }
}

/// Classes for every position of the text in one pass; same results as
/// calling [`classify`] per index.
pub fn classes(reference: &str, typed: &str) -> Vec<CharClass> {
    let cursor = typed.chars().count();
    let mut typed_chars = typed.chars();
    reference
        .chars()
        .enumerate()
        .map(|(index, expected)| match typed_chars.next() {
            Some(actual) if actual == expected => CharClass::Correct,
            Some(_) => CharClass::Incorrect,
            None if index == cursor => CharClass::Cursor,
            None => CharClass::Untyped,
        })
        .collect()
}

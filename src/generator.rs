use itertools::Itertools;
use rand::Rng;

use crate::config::TestConfig;
use crate::words;

/// Chance that a word gets 1-3 digits glued to one side.
pub const NUMBER_CHANCE: f64 = 0.10;
/// Chance that a word gets a punctuation mark.
pub const PUNCTUATION_CHANCE: f64 = 0.15;

pub const PUNCTUATION_MARKS: [char; 11] =
    [',', '.', '!', '?', ';', ':', '"', '\'', '-', '(', ')'];

/// Produces the text to type for one session. Words are drawn uniformly
/// with replacement from the cumulative pool for the configured difficulty.
pub struct TextGenerator {
    pool: Vec<String>,
    punctuation: bool,
    numbers: bool,
}

impl TextGenerator {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            pool: words::selectable_words(config.difficulty),
            punctuation: config.punctuation,
            numbers: config.numbers,
        }
    }

    /// Generate `word_count` space-joined words using the thread rng.
    pub fn generate(&self, word_count: usize) -> String {
        self.generate_with(word_count, &mut rand::thread_rng())
    }

    /// Seedable variant so tests can pin the draw sequence.
    pub fn generate_with<R: Rng>(&self, word_count: usize, rng: &mut R) -> String {
        (0..word_count).map(|_| self.pick_word(rng)).join(" ")
    }

    fn pick_word<R: Rng>(&self, rng: &mut R) -> String {
        let word = &self.pool[rng.gen_range(0..self.pool.len())];
        self.augment(word, rng)
    }

    /// Digits are applied before punctuation, so a quoted or parenthesized
    /// word wraps its digits too.
    fn augment<R: Rng>(&self, word: &str, rng: &mut R) -> String {
        let mut word = word.to_string();

        if self.numbers && rng.gen_bool(NUMBER_CHANCE) {
            let digits = random_digits(rng);
            word = if rng.gen_bool(0.5) {
                format!("{digits}{word}")
            } else {
                format!("{word}{digits}")
            };
        }

        if self.punctuation && rng.gen_bool(PUNCTUATION_CHANCE) {
            word = match PUNCTUATION_MARKS[rng.gen_range(0..PUNCTUATION_MARKS.len())] {
                mark @ ('"' | '\'') => format!("{mark}{word}{mark}"),
                '(' | ')' => format!("({word})"),
                mark => format!("{word}{mark}"),
            };
        }

        word
    }
}

fn random_digits<R: Rng>(rng: &mut R) -> String {
    let count = rng.gen_range(1..=3);
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::words::selectable_words;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_config() -> TestConfig {
        TestConfig::words(10, Difficulty::Medium)
    }

    fn strip_augmentation(token: &str) -> String {
        token
            .trim_matches(|c: char| PUNCTUATION_MARKS.contains(&c))
            .trim_matches(|c: char| c.is_ascii_digit())
            .to_string()
    }

    #[test]
    fn generates_requested_word_count() {
        for count in [1, 10, 100] {
            let text = TextGenerator::new(&create_test_config()).generate(count);
            assert_eq!(text.split_whitespace().count(), count);
        }
    }

    #[test]
    fn zero_words_yields_empty_text() {
        let text = TextGenerator::new(&create_test_config()).generate(0);
        assert_eq!(text, "");
    }

    #[test]
    fn plain_config_draws_only_pool_words() {
        let pool = selectable_words(Difficulty::Medium);
        let text = TextGenerator::new(&create_test_config()).generate(50);
        for token in text.split_whitespace() {
            assert!(pool.contains(&token.to_string()), "unexpected word {token}");
        }
    }

    #[test]
    fn same_seed_same_text() {
        let mut config = create_test_config();
        config.punctuation = true;
        config.numbers = true;
        let generator = TextGenerator::new(&config);

        let a = generator.generate_with(40, &mut StdRng::seed_from_u64(7));
        let b = generator.generate_with(40, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn numbers_glue_digits_to_one_side() {
        let mut config = create_test_config();
        config.numbers = true;
        let generator = TextGenerator::new(&config);
        let pool = selectable_words(Difficulty::Medium);

        let text = generator.generate_with(400, &mut StdRng::seed_from_u64(1));
        let mut augmented = 0;
        for token in text.split_whitespace() {
            if token.chars().any(|c| c.is_ascii_digit()) {
                augmented += 1;
                let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
                assert!((1..=3).contains(&digits.len()), "digit run in {token}");
                assert!(
                    token.starts_with(&digits) || token.ends_with(&digits),
                    "digits split across {token}"
                );
            }
            assert!(pool.contains(&strip_augmentation(token)));
        }
        assert!(augmented > 0, "no token was augmented in 400 draws");
    }

    #[test]
    fn punctuation_wraps_or_appends() {
        let mut config = create_test_config();
        config.punctuation = true;
        let generator = TextGenerator::new(&config);
        let pool = selectable_words(Difficulty::Medium);

        let text = generator.generate_with(400, &mut StdRng::seed_from_u64(2));
        let mut augmented = 0;
        for token in text.split_whitespace() {
            if token.chars().any(|c| PUNCTUATION_MARKS.contains(&c)) {
                augmented += 1;
                let first = token.chars().next().unwrap();
                let last = token.chars().last().unwrap();
                match first {
                    '"' | '\'' => assert_eq!(last, first, "unbalanced quote in {token}"),
                    '(' => assert_eq!(last, ')', "unbalanced paren in {token}"),
                    _ => assert!(PUNCTUATION_MARKS.contains(&last), "mark not at end of {token}"),
                }
            }
            assert!(pool.contains(&strip_augmentation(token)));
        }
        assert!(augmented > 0, "no token was augmented in 400 draws");
    }

    #[test]
    fn hard_text_still_draws_easy_words() {
        let easy = selectable_words(Difficulty::Easy);
        let config = TestConfig::words(200, Difficulty::Hard);
        let text = TextGenerator::new(&config).generate_with(200, &mut StdRng::seed_from_u64(3));

        let hits = text
            .split_whitespace()
            .filter(|token| easy.contains(&token.to_string()))
            .count();
        assert!(hits > 0, "cumulative pool never produced an easy word");
    }
}

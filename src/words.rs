use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

use crate::config::Difficulty;

static POOL_DIR: Dir = include_dir!("src/words");

/// One difficulty tier of practice words, embedded at build time.
#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
pub struct WordPool {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordPool {
    pub fn load(difficulty: Difficulty) -> Self {
        read_pool_from_dir(&format!("{difficulty}.json"))
    }
}

fn read_pool_from_dir(file_name: &str) -> WordPool {
    let file = POOL_DIR
        .get_file(file_name)
        .expect("Word pool file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    from_str(file_as_str).expect("Unable to deserialize word pool json")
}

/// All words selectable at a difficulty. Tiers are cumulative: harder
/// settings extend the easier pools instead of replacing them, so hard
/// tests keep a share of short common words.
pub fn selectable_words(difficulty: Difficulty) -> Vec<String> {
    let tiers: &[Difficulty] = match difficulty {
        Difficulty::Easy => &[Difficulty::Easy],
        Difficulty::Medium => &[Difficulty::Easy, Difficulty::Medium],
        Difficulty::Hard => &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard],
    };
    tiers
        .iter()
        .flat_map(|tier| WordPool::load(*tier).words)
        .collect()
}

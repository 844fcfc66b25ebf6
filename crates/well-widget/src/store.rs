use well_engine::Word;

/// The authoritative word list, owned by the host process.
///
/// Append and vote-increment only; the protocol has no removal path. Ids are
/// monotonic within a session, so they are unique and stable for the body
/// map on the surface side. Last write wins — no durability guarantees
/// beyond that.
pub struct WordStore {
    words: Vec<Word>,
    next_id: u64,
}

impl WordStore {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            next_id: 1,
        }
    }

    /// Seed the store with an existing word list (e.g. synced widget state).
    /// The id counter resumes past the largest numeric id present.
    pub fn with_words(words: Vec<Word>) -> Self {
        let next_id = words
            .iter()
            .filter_map(|w| w.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Self { words, next_id }
    }

    /// The full current word list.
    pub fn get_all(&self) -> &[Word] {
        &self.words
    }

    /// Append a new word with a fresh id and zero votes. Returns the id.
    pub fn append(&mut self, text: &str, color: &str) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.words.push(Word {
            id: id.clone(),
            text: text.to_owned(),
            votes: 0,
            color: color.to_owned(),
        });
        id
    }

    /// Increment the vote count for a word. Unknown ids are logged and
    /// ignored — a stale vote from a closing surface is not an error.
    pub fn increment_vote(&mut self, id: &str) -> bool {
        match self.words.iter_mut().find(|w| w.id == id) {
            Some(word) => {
                word.votes += 1;
                true
            }
            None => {
                log::warn!("vote for unknown word id {id}");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for WordStore {
    fn default() -> Self {
        Self::new()
    }
}

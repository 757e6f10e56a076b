//! Word ↔ token id mapping.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::ast::{BinaryOp, UnaryOp, COEFFICIENT_WORD};
use super::grammar::PLACEHOLDER_VARIABLE;

/// Padding word. Always id 0.
pub const PAD_WORD: &str = "P";
/// Start-of-sequence sentinel.
pub const START_WORD: &str = "S";
/// End-of-sequence marker.
pub const FINISH_WORD: &str = "F";

/// Errors raised while building or using a [`Vocabulary`].
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("vocabulary is missing the special word `{0}`")]
    MissingSpecial(&'static str),

    #[error("padding word must have id 0, found {0}")]
    PaddingNotZero(u32),

    #[error("id {id} is assigned to both `{first}` and `{second}`")]
    DuplicateId { id: u32, first: String, second: String },

    #[error("unknown token id {0}")]
    UnknownId(u32),

    #[error("unknown word `{0}`")]
    UnknownWord(String),

    #[error("failed to read vocabulary: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid vocabulary JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bidirectional word ↔ id map, read-only after construction.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    word2id: HashMap<String, u32>,
    id2word: BTreeMap<u32, String>,
    pad: u32,
    start: u32,
    finish: u32,
}

impl Vocabulary {
    /// Build from a word → id map. The special words must be present and
    /// padding must be id 0.
    pub fn from_word2id(word2id: HashMap<String, u32>) -> Result<Self, VocabError> {
        let mut id2word = BTreeMap::new();
        for (word, &id) in &word2id {
            if let Some(first) = id2word.insert(id, word.clone()) {
                // Report in a stable order
                let (first, second) = if first < *word {
                    (first, word.clone())
                } else {
                    (word.clone(), first)
                };
                return Err(VocabError::DuplicateId { id, first, second });
            }
        }

        let lookup = |w: &'static str| word2id.get(w).copied().ok_or(VocabError::MissingSpecial(w));
        let pad = lookup(PAD_WORD)?;
        let start = lookup(START_WORD)?;
        let finish = lookup(FINISH_WORD)?;
        if pad != 0 {
            return Err(VocabError::PaddingNotZero(pad));
        }

        Ok(Self {
            word2id,
            id2word,
            pad,
            start,
            finish,
        })
    }

    /// Build from words listed in id order (`words[i]` gets id `i`).
    pub fn from_words<I, S>(words: I) -> Result<Self, VocabError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (id, word) in words.into_iter().enumerate() {
            let word = word.into();
            let id = id as u32;
            if let Some(prev) = map.insert(word.clone(), id) {
                return Err(VocabError::DuplicateId {
                    id: prev,
                    first: word.clone(),
                    second: word,
                });
            }
        }
        Self::from_word2id(map)
    }

    /// Read a JSON object `{"word": id, ...}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, VocabError> {
        let map: HashMap<String, u32> = serde_json::from_reader(reader)?;
        Self::from_word2id(map)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VocabError> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Standard skeleton vocabulary: specials, the coefficient, the
    /// placeholder variable, every operator and the integers -5..=5.
    pub fn skeleton_default() -> Self {
        let mut words: Vec<String> = [PAD_WORD, START_WORD, FINISH_WORD, COEFFICIENT_WORD, PLACEHOLDER_VARIABLE]
            .iter()
            .map(|w| w.to_string())
            .collect();
        words.extend(BinaryOp::ALL.iter().map(|op| op.name().to_string()));
        words.extend(UnaryOp::ALL.iter().map(|op| op.name().to_string()));
        words.extend((-5i64..=5).map(|n| n.to_string()));

        let word2id = words
            .into_iter()
            .enumerate()
            .map(|(i, w)| (w, i as u32))
            .collect::<HashMap<_, _>>();
        let id2word = word2id.iter().map(|(w, &i)| (i, w.clone())).collect();
        Self {
            word2id,
            id2word,
            pad: 0,
            start: 1,
            finish: 2,
        }
    }

    pub fn len(&self) -> usize {
        self.word2id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word2id.is_empty()
    }

    pub fn pad_id(&self) -> u32 {
        self.pad
    }

    pub fn start_id(&self) -> u32 {
        self.start
    }

    pub fn finish_id(&self) -> u32 {
        self.finish
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.word2id.get(word).copied()
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.id2word.get(&id).map(String::as_str)
    }

    /// Map ids to words. Start sentinels are skipped; the sequence ends at the
    /// first finish or padding id.
    pub fn detokenize(&self, ids: &[u32]) -> Result<Vec<&str>, VocabError> {
        let mut words = Vec::with_capacity(ids.len());
        for &id in ids {
            if id == self.finish || id == self.pad {
                break;
            }
            if id == self.start {
                continue;
            }
            words.push(self.word(id).ok_or(VocabError::UnknownId(id))?);
        }
        Ok(words)
    }

    /// Map words to ids, wrapped in start and finish sentinels.
    pub fn encode<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<u32>, VocabError> {
        let mut ids = Vec::with_capacity(words.len() + 2);
        ids.push(self.start);
        for w in words {
            let w = w.as_ref();
            ids.push(self.id(w).ok_or_else(|| VocabError::UnknownWord(w.to_string()))?);
        }
        ids.push(self.finish);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary_has_specials() {
        let v = Vocabulary::skeleton_default();
        assert_eq!(v.pad_id(), 0);
        assert_eq!(v.word(v.start_id()), Some(START_WORD));
        assert_eq!(v.word(v.finish_id()), Some(FINISH_WORD));
        assert_eq!(v.len(), 5 + 5 + 13 + 11);
        assert!(v.id("sin").is_some());
        assert!(v.id("-5").is_some());
    }

    #[test]
    fn encode_detokenize() {
        let v = Vocabulary::skeleton_default();
        let ids = v.encode(&["add", "c", "x_1"]).unwrap();
        assert_eq!(ids.first(), Some(&v.start_id()));
        assert_eq!(ids.last(), Some(&v.finish_id()));

        let mut padded = ids.clone();
        padded.extend([0, 0, 0]);
        assert_eq!(v.detokenize(&padded).unwrap(), vec!["add", "c", "x_1"]);
        assert!(matches!(v.detokenize(&[999]), Err(VocabError::UnknownId(999))));
        assert!(matches!(v.encode(&["zeta"]), Err(VocabError::UnknownWord(_))));
    }

    #[test]
    fn json_loading_validates_specials() {
        let json = r#"{"P": 0, "S": 1, "F": 2, "c": 3, "x_1": 4, "sin": 5}"#;
        let v = Vocabulary::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(v.word(5), Some("sin"));

        let json = r#"{"P": 1, "S": 0, "F": 2}"#;
        assert!(matches!(
            Vocabulary::from_json_reader(json.as_bytes()),
            Err(VocabError::PaddingNotZero(1))
        ));
        let json = r#"{"P": 0, "S": 1}"#;
        assert!(matches!(
            Vocabulary::from_json_reader(json.as_bytes()),
            Err(VocabError::MissingSpecial("F"))
        ));
        let json = r#"{"P": 0, "S": 1, "F": 1}"#;
        assert!(matches!(
            Vocabulary::from_json_reader(json.as_bytes()),
            Err(VocabError::DuplicateId { id: 1, .. })
        ));
    }
}

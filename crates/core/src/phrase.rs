//! Words, phrases and input sentences
//!
//! Words are shared `Arc<str>` handles: a phrase table entry, every
//! translation option built from it and every hypothesis applying it point
//! at the same allocation.

use crate::range::Range;
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// A single surface token
pub type Word = Arc<str>;

/// Short word sequence, inline up to four tokens
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Phrase {
    words: SmallVec<[Word; 4]>,
}

impl Phrase {
    /// Empty phrase (used by dropped unknown words)
    pub fn empty() -> Self {
        Phrase::default()
    }

    /// Split `text` on whitespace
    pub fn parse(text: &str) -> Self {
        text.split_whitespace().map(Word::from).collect()
    }

    /// The tokens
    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Number of tokens
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True for the empty phrase
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterate tokens
    pub fn iter(&self) -> std::slice::Iter<'_, Word> {
        self.words.iter()
    }
}

impl FromIterator<Word> for Phrase {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Phrase {
            words: iter.into_iter().collect(),
        }
    }
}

impl<'a> From<&'a [Word]> for Phrase {
    fn from(words: &'a [Word]) -> Self {
        Phrase {
            words: words.iter().cloned().collect(),
        }
    }
}

// Phrase hashes exactly like its word slice, so maps keyed by Phrase can
// be probed with a borrowed `&[Word]`.
impl Borrow<[Word]> for Phrase {
    fn borrow(&self) -> &[Word] {
        &self.words
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_words(f, &self.words)
    }
}

impl fmt::Debug for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phrase(\"{}\")", self)
    }
}

/// One tokenised input line
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    words: Vec<Word>,
}

impl Sentence {
    /// Tokenise `line` on whitespace
    pub fn parse(line: &str) -> Self {
        Sentence {
            words: line.split_whitespace().map(Word::from).collect(),
        }
    }

    /// All tokens
    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Token at `pos`
    #[inline]
    pub fn word(&self, pos: usize) -> &Word {
        &self.words[pos]
    }

    /// Tokens covered by `range`
    #[inline]
    pub fn span(&self, range: Range) -> &[Word] {
        &self.words[range.start()..=range.end()]
    }

    /// Number of tokens
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True for a blank line
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_words(f, &self.words)
    }
}

impl fmt::Debug for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sentence(\"{}\")", self)
    }
}

fn write_words(f: &mut fmt::Formatter<'_>, words: &[Word]) -> fmt::Result {
    for (i, w) in words.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        f.write_str(w)?;
    }
    Ok(())
}

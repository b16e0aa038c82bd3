//! Target-text generation and line segmentation.

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("word bank has no words")]
    EmptyWordBank,
    #[error("invalid test size {0}")]
    InvalidTestSize(usize),
}

/// A freshly generated target and its wrapped-line offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedTest {
    pub target: String,
    pub line_offsets: Vec<usize>,
}

/// Draws `size` words uniformly at random (with replacement) from `words`,
/// joins them with single spaces, and segments the result every
/// `words_per_line` words.
pub fn generate_test<R: Rng>(
    words: &[String],
    size: usize,
    words_per_line: usize,
    rng: &mut R,
) -> Result<GeneratedTest, GenerateError> {
    if words.is_empty() {
        return Err(GenerateError::EmptyWordBank);
    }
    if size == 0 {
        return Err(GenerateError::InvalidTestSize(size));
    }

    let mut picked = Vec::with_capacity(size);
    for _ in 0..size {
        picked.push(words[rng.gen_range(0..words.len())].as_str());
    }

    let target = picked.join(" ");
    let line_offsets = compute_line_offsets(&target, words_per_line);

    Ok(GeneratedTest {
        target,
        line_offsets,
    })
}

/// Walks the target once; every `words_per_line` spaces the byte index just
/// past the space starts a new line. Offset 0 is always present.
pub fn compute_line_offsets(target: &str, words_per_line: usize) -> Vec<usize> {
    let mut offsets = vec![0];

    if words_per_line == 0 {
        return offsets;
    }

    let mut count = 0;
    for (i, b) in target.bytes().enumerate() {
        if b == b' ' {
            count += 1;
            if count == words_per_line {
                count = 0;
                offsets.push(i + 1);
            }
        }
    }

    offsets
}

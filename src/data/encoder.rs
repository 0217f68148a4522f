// ============================================================
// Layer 4 - Sequence Encoder
// ============================================================
// Turns a window's token strings into fixed-length model input:
//
//   [CLS] t1 t2 ... tn [SEP] [PAD] [PAD] ...
//
// The chromosome files are already tokenized, so each token is
// looked up directly in the pretrained tokenizer's vocabulary.
// Tokens missing from the vocabulary map to [UNK]. Sequences
// longer than max_len are truncated before [SEP] is appended.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";

/// Ids of the special tokens used to frame a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub cls: u32,
    pub sep: u32,
    pub pad: u32,
    pub unk: u32,
}

impl SpecialTokens {
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Result<Self> {
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .with_context(|| format!("Tokenizer vocabulary has no '{token}' token"))
        };
        Ok(Self {
            cls: id(CLS_TOKEN)?,
            sep: id(SEP_TOKEN)?,
            pad: id(PAD_TOKEN)?,
            unk: id(UNK_TOKEN)?,
        })
    }

    fn is_special(&self, id: u32) -> bool {
        id == self.cls || id == self.sep || id == self.pad
    }
}

/// Fixed-length encoded input for one sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSequence {
    pub input_ids:      Vec<u32>,
    /// 1 = real token (including [CLS]/[SEP]), 0 = padding
    pub attention_mask: Vec<u32>,
}

impl EncodedSequence {
    /// Number of non-padding positions
    pub fn real_length(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

pub struct SequenceEncoder {
    tokenizer: Tokenizer,
    special:   SpecialTokens,
    max_len:   usize,
}

impl SequenceEncoder {
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Result<Self> {
        ensure!(max_len >= 2, "max_len must leave room for [CLS] and [SEP], got {max_len}");
        let special = SpecialTokens::from_tokenizer(&tokenizer)?;
        Ok(Self { tokenizer, special, max_len })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    /// One past the largest id the tokenizer can emit
    pub fn id_bound(&self) -> usize {
        self.tokenizer
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |&id| id as usize + 1)
    }

    /// Every id must index into an embedding table of `vocab_size` rows.
    pub fn check_vocab_size(&self, vocab_size: usize) -> Result<()> {
        let bound = self.id_bound();
        ensure!(
            bound <= vocab_size,
            "Tokenizer ids reach {} but the encoder's vocab_size is {vocab_size}; \
             tokenizer.json and config.json do not belong together",
            bound - 1,
        );
        Ok(())
    }

    /// Vocabulary ids for raw tokens, without special tokens
    pub fn token_ids<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.tokenizer.token_to_id(t.as_ref()).unwrap_or(self.special.unk))
            .collect()
    }

    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> EncodedSequence {
        let body_len = tokens.len().min(self.max_len - 2);
        if body_len < tokens.len() {
            tracing::debug!("Truncating sequence of {} tokens to {}", tokens.len(), body_len);
        }

        let mut input_ids = Vec::with_capacity(self.max_len);
        input_ids.push(self.special.cls);
        input_ids.extend(self.token_ids(&tokens[..body_len]));
        input_ids.push(self.special.sep);

        let real_len = input_ids.len();
        let mut attention_mask = vec![1u32; real_len];

        input_ids.resize(self.max_len, self.special.pad);
        attention_mask.resize(self.max_len, 0);

        EncodedSequence { input_ids, attention_mask }
    }

    /// Strip special tokens and padding, returning the body ids
    pub fn decode(&self, encoded: &EncodedSequence) -> Vec<u32> {
        encoded
            .input_ids
            .iter()
            .zip(&encoded.attention_mask)
            .filter(|&(&id, &mask)| mask == 1 && !self.special.is_special(id))
            .map(|(&id, _)| id)
            .collect()
    }
}

//! Deduplicating token index.
//!
//! Assigns each distinct C-state group token a dense index in first-seen
//! order. Shared package names and `_CSD` resolution both walk the table in
//! index order, so the order must be reproducible from the same input.

use crate::error::{Error, Result};
use crate::records::{ProcessorRecord, Token};

/// Upper bound on processors per table; also the name synthesizer's range.
pub const MAX_PROCESSORS: usize = 0x1000;

#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: Vec<Token>,
    capacity: usize,
}

impl TokenTable {
    /// Empty table able to hold `capacity` distinct tokens.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut tokens = Vec::new();
        tokens.try_reserve_exact(capacity)?;
        Ok(Self { tokens, capacity })
    }

    /// Indexes the `cst_token` of every processor that has a non-null one.
    pub fn build(processors: &[ProcessorRecord]) -> Result<Self> {
        if processors.is_empty() {
            return Err(Error::invalid("no processor records"));
        }
        if processors.len() > MAX_PROCESSORS {
            return Err(Error::invalid(format!(
                "{} processor records exceed the limit of {MAX_PROCESSORS}",
                processors.len()
            )));
        }

        let mut table = Self::with_capacity(processors.len())?;
        for token in processors
            .iter()
            .filter_map(|p| p.cst_token.and_then(Token::non_null))
        {
            table.insert_or_find(token);
        }
        Ok(table)
    }

    /// Returns the index of `token`, appending it first if it is new.
    ///
    /// Panics if a new token would exceed the construction capacity.
    pub fn insert_or_find(&mut self, token: Token) -> usize {
        if let Some(index) = self.index_of(token) {
            return index;
        }
        assert!(
            self.tokens.len() < self.capacity,
            "token table full ({} entries)",
            self.capacity
        );
        self.tokens.push(token);
        self.tokens.len() - 1
    }

    pub fn index_of(&self, token: Token) -> Option<usize> {
        self.tokens.iter().position(|&t| t == token)
    }

    pub fn get(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in index order.
    pub fn iter(&self) -> impl Iterator<Item = Token> + '_ {
        self.tokens.iter().copied()
    }

    /// Frees the backing storage. Safe to call more than once.
    pub fn release(&mut self) {
        self.tokens = Vec::new();
        self.capacity = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(uid: u32, cst: Option<u64>) -> ProcessorRecord {
        ProcessorRecord {
            cst_token: cst.map(Token),
            ..ProcessorRecord::new(uid)
        }
    }

    #[test]
    fn first_seen_order_defines_indices() {
        let cpus = [
            cpu(0, Some(0x30)),
            cpu(1, Some(0x10)),
            cpu(2, Some(0x30)),
            cpu(3, None),
            cpu(4, Some(0x20)),
            cpu(5, Some(0x10)),
        ];
        let table = TokenTable::build(&cpus).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![Token(0x30), Token(0x10), Token(0x20)]
        );
        assert_eq!(table.index_of(Token(0x20)), Some(2));
        assert_eq!(table.index_of(Token(0x99)), None);
    }

    #[test]
    fn insert_or_find_returns_existing_index() {
        let mut table = TokenTable::with_capacity(2).unwrap();
        assert_eq!(table.insert_or_find(Token(7)), 0);
        assert_eq!(table.insert_or_find(Token(9)), 1);
        assert_eq!(table.insert_or_find(Token(7)), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[should_panic(expected = "token table full")]
    fn exceeding_capacity_panics() {
        let mut table = TokenTable::with_capacity(1).unwrap();
        table.insert_or_find(Token(1));
        table.insert_or_find(Token(2));
    }

    #[test]
    fn no_cstates_yields_empty_table() {
        let table = TokenTable::build(&[cpu(0, None), cpu(1, None)]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn null_cst_tokens_are_not_indexed() {
        let cpus = [
            cpu(0, Some(Token::NULL.0)),
            cpu(1, Some(0x40)),
            cpu(2, Some(Token::NULL.0)),
        ];
        let table = TokenTable::build(&cpus).unwrap();
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![Token(0x40)]);
        assert_eq!(table.index_of(Token::NULL), None);
    }

    #[test]
    fn empty_or_oversized_input_rejected() {
        assert!(matches!(
            TokenTable::build(&[]),
            Err(Error::InvalidArgument(_))
        ));
        let too_many = vec![cpu(0, None); MAX_PROCESSORS + 1];
        assert!(matches!(
            TokenTable::build(&too_many),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn release_is_idempotent() {
        let mut table = TokenTable::build(&[cpu(0, Some(1))]).unwrap();
        table.release();
        table.release();
        assert!(table.is_empty());
        assert_eq!(table.get(0), None);
    }
}

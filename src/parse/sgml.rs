//! The SGML flavour of OFX used by 1.x documents.

pub use self::token::{Token, Tokenizer};

pub mod element;
pub mod header;
pub mod token;
pub mod tree;

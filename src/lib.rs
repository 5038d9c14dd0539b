//! Reading and writing OFX 1.x (SGML) documents, and a small client for downloading bank
//! statements over OFX.
//!
//! Documents are parsed into a generic tree of [`Aggregate`]s and [`Leaf`]s; leaf values stay as
//! strings until read through one of the typed accessors.
//!
//! ```no_run
//! let ofx = ofx_banking::from_str(&std::fs::read_to_string("statement.ofx")?)?;
//! let account = ofx_banking::client::statement(&ofx)?;
//! for trn in &account.transactions {
//!     println!("{} {} {}", trn.posted.date(), trn.amount, trn.name.as_deref().unwrap_or(""));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod error;
pub mod ofx;
pub mod parse;
pub mod ser;
pub mod value;

pub use client::{Bank, BankAccount, BankConfig};
pub use error::{ClientError, Error, Result};
pub use ofx::{Aggregate, Header, Leaf, Node, Ofx};
pub use parse::{from_bytes, from_str, from_str_with, ParseOptions};
pub use ser::{to_string, to_writer};
pub use value::{Value, ValueKind};

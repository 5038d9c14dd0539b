use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::token::Token;
use crate::error::{Error, Result};
use crate::ofx::{Aggregate, Leaf, Node};
use crate::parse::ParseOptions;

/// An open aggregate, with the number of times each non-repeatable child name has appeared in it.
struct Frame<'a> {
    aggregate: Aggregate,
    seen: HashMap<&'a str, usize>,
}

impl<'a> Frame<'a> {
    fn new(name: &str) -> Self {
        Frame {
            aggregate: Aggregate::new(name),
            seen: HashMap::new(),
        }
    }
}

/// Rebuilds the element tree of an OFX SGML body from its tokens.
///
/// Aggregates are held on an explicit stack above an unnamed root. Only leaf-context tags are ever
/// closed implicitly; an aggregate stays open until its own end tag, an ancestor's end tag or the
/// end of input.
pub(crate) struct TreeBuilder<'o, 'a> {
    options: &'o ParseOptions,
    /// Names that carry an inline value somewhere in the document.
    inline: HashSet<&'a str>,
    root: Frame<'a>,
    stack: Vec<Frame<'a>>,
}

impl<'o, 'a> TreeBuilder<'o, 'a> {
    fn new(options: &'o ParseOptions, inline: HashSet<&'a str>) -> Self {
        TreeBuilder {
            options,
            inline,
            root: Frame::new(""),
            stack: Vec::new(),
        }
    }

    fn top(&mut self) -> &mut Frame<'a> {
        match self.stack.last_mut() {
            Some(top) => top,
            None => &mut self.root,
        }
    }

    fn parent_name(&self) -> &str {
        self.stack.last().map_or("(root)", |f| f.aggregate.name())
    }

    fn is_leaf_context(&self, name: &str) -> bool {
        self.options.is_leaf(name) || self.inline.contains(name)
    }

    /// Records `name` as a child of the current aggregate, checking whether it repeats a sibling.
    fn note_child(&mut self, name: &'a str) -> Result<()> {
        if self.options.is_repeatable(name) {
            return Ok(());
        }
        let seen = {
            let count = self.top().seen.entry(name).or_insert(0);
            *count += 1;
            *count
        };
        if seen == 1 {
            return Ok(());
        }
        if self.options.strict {
            return Err(Error::DuplicateElement {
                parent: String::from(self.parent_name()),
                name: String::from(name),
            });
        }
        if seen == 2 {
            debug!(parent = self.parent_name(), tag = name, "inferring repeatable element");
        }
        Ok(())
    }

    fn close_top(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.top().aggregate.push(frame.aggregate);
        }
    }

    fn open(&mut self, name: &'a str) -> Result<()> {
        self.note_child(name)?;
        if self.is_leaf_context(name) {
            self.top().aggregate.push(Leaf::new(name, ""));
        } else {
            self.stack.push(Frame::new(name));
        }
        Ok(())
    }

    fn value(&mut self, name: &'a str, text: &str) -> Result<()> {
        self.note_child(name)?;
        if text.is_empty() && self.stack.is_empty() {
            // `<OFX></OFX>` is an empty document, not a leaf root
            self.stack.push(Frame::new(name));
        } else {
            self.top().aggregate.push(Leaf::new(name, text));
        }
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        match self.stack.iter().rposition(|f| f.aggregate.name() == name) {
            Some(i) => {
                while self.stack.len() > i + 1 {
                    let inner = self.parent_name().to_owned();
                    if self.options.strict {
                        return Err(Error::UnbalancedStructure(format!(
                            "<{inner}> closed implicitly by </{name}>"
                        )));
                    }
                    debug!(tag = inner.as_str(), by = name, "closing aggregate implicitly");
                    self.close_top();
                }
                self.close_top();
                Ok(())
            }
            None => {
                let closes_leaf = matches!(
                    self.top().aggregate.children().last(),
                    Some(Node::Leaf(leaf)) if leaf.name() == name
                );
                if closes_leaf {
                    Ok(())
                } else if self.options.strict {
                    Err(Error::UnbalancedStructure(format!("unmatched </{name}>")))
                } else {
                    warn!(tag = name, "ignoring unmatched end tag");
                    Ok(())
                }
            }
        }
    }

    fn finish(mut self) -> Result<Aggregate> {
        while let Some(open) = self.stack.last() {
            if self.options.strict {
                return Err(Error::UnbalancedStructure(format!(
                    "<{}> left open at end of input",
                    open.aggregate.name()
                )));
            }
            debug!(tag = open.aggregate.name(), "closing aggregate at end of input");
            self.close_top();
        }

        let mut top_level = self.root.aggregate.children_mut().drain(..);
        match (top_level.next(), top_level.next()) {
            (Some(Node::Aggregate(root)), None) => Ok(root),
            (None, _) => Err(Error::InvalidRoot(String::from("empty body"))),
            (Some(Node::Leaf(leaf)), _) => Err(Error::InvalidRoot(format!(
                "expected an aggregate, found <{}>{}",
                leaf.name(),
                leaf.value()
            ))),
            (Some(first), Some(second)) => Err(Error::InvalidRoot(format!(
                "expected a single root element, found <{}> followed by <{}>",
                first.name(),
                second.name()
            ))),
        }
    }
}

/// Builds the root aggregate of a document from a token stream.
pub(crate) fn build<'a, I>(tokens: I, options: &ParseOptions) -> Result<Aggregate>
where
    I: IntoIterator<Item = Result<Token<'a>>>,
{
    let tokens = tokens.into_iter().collect::<Result<Vec<_>>>()?;
    let inline = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Value(name, _) => Some(*name),
            _ => None,
        })
        .collect();

    let mut builder = TreeBuilder::new(options, inline);
    for token in tokens {
        match token {
            Token::Open(name) => builder.open(name)?,
            Token::Value(name, text) => builder.value(name, text)?,
            Token::Close(name) => builder.close(name)?,
        }
    }
    builder.finish()
}

//! State that is scoped to the construct being parsed: the range variables
//! in scope and the nesting depth.

use core::ops::{Deref, DerefMut};

use super::ast::{Binding, BindingId};
use super::{ExpressionParser, PResult};
use crate::types::SequenceType;
use crate::xdm::ExpandedName;

/// Stack of live range-variable bindings, innermost last.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    bindings: Vec<Binding>,
    next_id: u32,
}

impl ScopeStack {
    /// Push a new binding typed `item()` and return a copy of it.
    pub(crate) fn declare(&mut self, name: ExpandedName) -> Binding {
        let binding = Binding {
            id: BindingId(self.next_id),
            name,
            required_type: SequenceType::single_item(),
        };
        self.next_id += 1;
        tracing::trace!(variable = %binding.name, depth = self.bindings.len() + 1, "range variable bound");
        self.bindings.push(binding.clone());
        binding
    }

    /// Innermost binding with this name.
    pub(crate) fn find(&self, name: &ExpandedName) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| &b.name == name)
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    fn truncate(&mut self, depth: usize) {
        while self.bindings.len() > depth {
            if let Some(b) = self.bindings.pop() {
                tracing::trace!(variable = %b.name, "range variable out of scope");
            }
        }
    }
}

/// Holds the parser while a binding construct is parsed and pops every
/// binding declared through it when dropped, on success and error alike.
pub(crate) struct RangeScope<'p, 'a> {
    parser: &'p mut ExpressionParser<'a>,
    depth: usize,
}

impl<'p, 'a> RangeScope<'p, 'a> {
    pub(crate) fn enter(parser: &'p mut ExpressionParser<'a>) -> Self {
        let depth = parser.range_variables.len();
        Self { parser, depth }
    }
}

impl<'a> Deref for RangeScope<'_, 'a> {
    type Target = ExpressionParser<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.parser
    }
}

impl DerefMut for RangeScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.parser
    }
}

impl Drop for RangeScope<'_, '_> {
    fn drop(&mut self) {
        self.parser.range_variables.truncate(self.depth);
    }
}

/// Upper bound on [`ExpressionParser::depth`].
pub(crate) const MAX_DEPTH: usize = 512;

/// What entering a parenthesised expression, predicate, argument or branch
/// costs against [`MAX_DEPTH`]. Operators, steps, predicates and signs
/// applied on top of an operand cost one each.
pub(crate) const NESTED_EXPRESSION_COST: usize = 8;

/// Holds the parser while a construct that adds levels to the tree is parsed,
/// and gives the levels back when dropped.
pub(crate) struct DepthGuard<'p, 'a> {
    parser: &'p mut ExpressionParser<'a>,
    depth: usize,
}

impl<'p, 'a> DepthGuard<'p, 'a> {
    pub(crate) fn enter(parser: &'p mut ExpressionParser<'a>) -> Self {
        let depth = parser.depth;
        Self { parser, depth }
    }

    /// Account for `levels` more levels, failing once the budget is spent.
    pub(crate) fn descend(&mut self, levels: usize) -> PResult<()> {
        self.parser.depth += levels;
        if self.parser.depth > MAX_DEPTH {
            return self.parser.grumble("Expression is nested too deeply");
        }
        Ok(())
    }
}

impl<'a> Deref for DepthGuard<'_, 'a> {
    type Target = ExpressionParser<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.parser
    }
}

impl DerefMut for DepthGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.parser
    }
}

impl Drop for DepthGuard<'_, '_> {
    fn drop(&mut self) {
        self.parser.depth = self.depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_innermost_first() {
        let mut stack = ScopeStack::default();
        let outer = stack.declare(ExpandedName::local("x"));
        let inner = stack.declare(ExpandedName::local("x"));
        assert_ne!(outer.id, inner.id);
        assert_eq!(stack.find(&ExpandedName::local("x")).map(|b| b.id), Some(inner.id));
        stack.truncate(1);
        assert_eq!(stack.find(&ExpandedName::local("x")).map(|b| b.id), Some(outer.id));
        assert!(stack.find(&ExpandedName::local("y")).is_none());
    }
}

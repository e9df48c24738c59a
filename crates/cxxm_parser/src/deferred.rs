//! Deferred member function bodies.
//!
//! Bodies of member functions defined inside a class are captured as token
//! slices while the class body is parsed and run through a nested grammar
//! once the closing brace is reached, so a body can refer to members
//! declared after it.

use crate::builders::Builder;
use crate::cursor::TokenCursor;
use crate::error::ActionFault;
use crate::grammar::Grammar;
use crate::session::ParseSession;
use tracing::{debug, warn};

impl ParseSession {
    /// Parse every body queued on the class on top of the builder stack and
    /// put the finished functions back in member order.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn parse_deferred_bodies(&mut self) -> Result<(), ActionFault> {
        let deferred = std::mem::take(&mut self.builders.class_mut()?.deferred);
        if deferred.is_empty() {
            return Ok(());
        }
        let mut finished = Vec::with_capacity(deferred.len());
        for body in deferred {
            let depth = self.builders.depth();
            let scopes = self.symtab.depth();
            let end = body.tokens.last().map_or(body.function.start, |t| t.end);
            debug!(name = %body.function.name, tokens = body.tokens.len(), "deferred body");

            self.builders.push(Builder::Function(body.function));
            let cursor = TokenCursor::from_tokens(body.tokens, &self.interner);
            Grammar::new(self, cursor).function_body_after_declarator();

            let dropped = self.builders.truncate(depth + 1);
            if dropped > 0 {
                warn!(dropped, "unbalanced builders after deferred body");
            }
            self.leftover.builders += dropped;
            while self.symtab.depth() > scopes {
                self.symtab.pop()?;
                self.leftover.scopes += 1;
            }
            let function = self.builders.pop_function()?;
            finished.push((body.slot, function.create(end)));
        }
        self.deferred_parsed += finished.len();
        self.builders.class_mut()?.restore_deferred(finished);
        Ok(())
    }
}

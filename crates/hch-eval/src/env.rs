//! Evaluator nodes.
//!
//! An [`Env`] is one conversational turn's context: the respondent snapshot
//! answering it, the scope its pointers resolve against, and the template
//! that fresh sub-conversations start from. Nodes are immutable; every turn
//! builds a successor.

use crate::respondent::Respondent;
use hch_types::{Message, Referent};
use std::fmt;
use std::rc::Rc;

/// Scope entries as seen by the evaluator.
pub type Scope = Vec<Referent<Env>>;

/// Shared starting point for every sub-conversation of a tree.
struct ChildTemplate {
    respondent: Rc<dyn Respondent>,
}

struct Node {
    respondent: Rc<dyn Respondent>,
    args: Scope,
    template: Rc<ChildTemplate>,
}

/// Handle to one evaluator node. Channels carry these.
///
/// Two handles are equal only when they name the same node.
#[derive(Clone)]
pub struct Env(Rc<Node>);

impl Env {
    /// Root of a fresh tree. Every child starts from this respondent.
    pub fn root(respondent: Rc<dyn Respondent>) -> Self {
        let template = Rc::new(ChildTemplate {
            respondent: Rc::clone(&respondent),
        });
        Self(Rc::new(Node {
            respondent,
            args: Vec::new(),
            template,
        }))
    }

    /// A brand-new conversation with no history and an empty scope.
    pub fn child(&self) -> Self {
        Self(Rc::new(Node {
            respondent: Rc::clone(&self.0.template.respondent),
            args: Vec::new(),
            template: Rc::clone(&self.0.template),
        }))
    }

    /// The node after `message` has been shown and answered.
    ///
    /// The scope grows by the message's arguments; the respondent is
    /// replaced by its updated snapshot.
    pub fn successor(&self, message: &Message<Env>, respondent: Rc<dyn Respondent>) -> Self {
        let mut args = self.0.args.clone();
        args.extend(message.args().iter().cloned());
        Self(Rc::new(Node {
            respondent,
            args,
            template: Rc::clone(&self.0.template),
        }))
    }

    pub fn args(&self) -> &[Referent<Env>] {
        &self.0.args
    }

    pub fn respondent(&self) -> &Rc<dyn Respondent> {
        &self.0.respondent
    }
}

impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("scope", &self.0.args.len())
            .finish_non_exhaustive()
    }
}

//! Integration tests for the budgeted evaluator.
//!
//! Covers:
//! - the end-to-end scenarios (direct reply, delegation, exhausted budget,
//!   malformed commands, addressing a conversation through a channel)
//! - time accounting and forced termination
//! - budget monotonicity across nested asks
//! - fatal reference errors and declined answers
//! - the fixed-budget adapter

use hch_eval::{
    respondent, run, Accounting, Budgeter, EvalConfig, EvalError, Evaluator, Flow, Respondent,
    Response, Transcript, HELP_TEXT,
};
use hch_types::{Budget, ReferentError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Every observation the respondent was shown, in order.
type Log = Rc<RefCell<Vec<String>>>;

/// A respondent that logs what it sees and answers with `script`.
fn scripted<F>(script: F) -> (Rc<dyn Respondent>, Log)
where
    F: Fn(&Transcript) -> String + 'static,
{
    let log: Log = Rc::default();
    let seen = Rc::clone(&log);
    let r = respondent(move |t: &Transcript| {
        if let Some(obs) = t.observations.last() {
            seen.borrow_mut().push(obs.text.clone());
        }
        Some(Response::new(script(t)))
    });
    (r, log)
}

fn first_text(t: &Transcript) -> &str {
    t.observations.first().map(|o| o.text.as_str()).unwrap_or("")
}

fn last_text(t: &Transcript) -> &str {
    t.observations.last().map(|o| o.text.as_str()).unwrap_or("")
}

fn evaluate(config: EvalConfig, root: &str, budget: Budget, r: Rc<dyn Respondent>) -> String {
    match Evaluator::new(config).run(root, budget, r) {
        Ok(Flow::Ready(text)) => text,
        Ok(Flow::Suspended(t)) => panic!("unexpected suspension at:\n{t}"),
        Err(e) => panic!("evaluation failed: {e}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_direct_reply() {
    let (r, log) = scripted(|_| "reply 4".into());
    assert_eq!(run("What is 2 + 2", 10, r).unwrap(), "4");
    assert_eq!(*log.borrow(), vec!["What is 2 + 2\n[Remaining budget is 10]"]);
}

#[test]
fn test_delegation_to_child() {
    let (r, log) = scripted(|t| {
        if first_text(t).starts_with("@0: What is 7 * 6") {
            "reply 42".into()
        } else if t.responses.is_empty() {
            "ask (What is 7 * 6)".into()
        } else {
            "reply the answer is 42".into()
        }
    });
    assert_eq!(run("compute six sevens", 10, r).unwrap(), "the answer is 42");
    assert_eq!(
        *log.borrow(),
        vec![
            "compute six sevens\n[Remaining budget is 10]",
            "@0: What is 7 * 6\n[Remaining budget is 3]",
            "@0: 42\n[Remaining budget is 10]",
        ]
    );
}

#[test]
fn test_exhausted_child_answers_verbatim() {
    let (r, log) = scripted(|t| {
        if first_text(t).starts_with("@0: anything") {
            "whatever you like".into()
        } else if t.responses.is_empty() {
            "ask (anything)".into()
        } else {
            "reply done".into()
        }
    });
    assert_eq!(run("root", 1, r).unwrap(), "done");
    assert_eq!(
        *log.borrow(),
        vec![
            "root\n[Remaining budget is 1]",
            "@0: anything\n[You have no budget, your next message is returned as-is]",
            "@0: whatever you like\n[Remaining budget is 1]",
        ]
    );
}

#[test]
fn test_malformed_command_shows_help_and_costs_nothing() {
    let (r, log) = scripted(|t| {
        if t.responses.is_empty() {
            "foo bar".into()
        } else {
            "reply ok".into()
        }
    });
    assert_eq!(run("hi", 5, r).unwrap(), "ok");
    assert_eq!(log.borrow()[1], format!("{HELP_TEXT}\n[Remaining budget is 5]"));
}

#[test]
fn test_reflected_channel_reaches_same_conversation() {
    let (r, _log) = scripted(|t| {
        if !first_text(t).starts_with("start") {
            return "reply wrong conversation".into();
        }
        let last = last_text(t);
        if last.starts_with("you are @0") {
            "ask@0 (follow-up)".into()
        } else if last.starts_with("@0: follow-up") {
            assert_eq!(t.observations.len(), 2);
            assert_eq!(t.responses[0].text, "reflect");
            "reply echoed".into()
        } else if last.starts_with("@1: echoed") {
            "reply fine".into()
        } else {
            "reflect".into()
        }
    });
    assert_eq!(run("start", 10, r).unwrap(), "fine");
}

#[test]
fn test_follow_up_to_child_keeps_its_history() {
    let (r, log) = scripted(|t| {
        if first_text(t).starts_with("@0: hello") {
            return format!("reply turn {}", t.observations.len());
        }
        match t.responses.len() {
            0 => "ask hello".into(),
            1 => "ask@0 again".into(),
            _ => "reply finished".into(),
        }
    });
    assert_eq!(run("go", 9, r).unwrap(), "finished");
    assert_eq!(
        *log.borrow(),
        vec![
            "go\n[Remaining budget is 9]",
            "@0: hello\n[Remaining budget is 3]",
            "@0: turn 1\n[Remaining budget is 9]",
            "@1: again\n[Remaining budget is 3]",
            "@1: turn 2\n[Remaining budget is 9]",
        ]
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Messages and scope
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reply_with_pointer_to_question_argument() {
    let (r, log) = scripted(|_| "reply it was #0".into());
    assert_eq!(run("repeat (the secret)", 4, r).unwrap(), "it was (the secret)");
    assert_eq!(log.borrow()[0], "repeat #0\n[Remaining budget is 4]");
}

#[test]
fn test_child_receives_instantiated_argument() {
    let (r, log) = scripted(|t| {
        if last_text(t).starts_with("the payload") {
            "reply seen".into()
        } else if first_text(t).starts_with("@0: check") {
            "view #1".into()
        } else if t.responses.is_empty() {
            "ask (check #0)".into()
        } else {
            "reply done".into()
        }
    });
    let out = run("use (the payload)", 10, r).unwrap();
    assert_eq!(out, "done");
    let log = log.borrow();
    assert_eq!(log[1], "@0: check #1\n[Remaining budget is 3]");
    assert_eq!(log[2], "the payload\n[Remaining budget is 3]");
}

#[test]
fn test_note_is_not_instantiated() {
    let (r, log) = scripted(|t| match t.responses.len() {
        0 => "note remember #0".into(),
        _ => "reply ok".into(),
    });
    run("q (x)", 5, r).unwrap();
    assert_eq!(log.borrow()[1], "remember #->1\n[Remaining budget is 5]");
}

#[test]
fn test_out_of_range_pointer_is_fatal() {
    let (r, _) = scripted(|_| "reply #5".into());
    let err = run("q", 5, r).unwrap_err();
    assert!(matches!(
        err,
        EvalError::Reference(ReferentError::OutOfRange { index: 5, len: 0 })
    ));
}

#[test]
fn test_declined_answer_is_an_error_for_run() {
    let r = respondent(|_: &Transcript| None);
    assert!(matches!(run("q", 5, r), Err(EvalError::RespondentDeclined)));
}

#[test]
fn test_malformed_root_becomes_sentinel() {
    let (r, log) = scripted(|_| "reply ok".into());
    run("broken (paren", 3, r).unwrap();
    assert_eq!(log.borrow()[0], "<<malformed message>>\n[Remaining budget is 3]");
}

// ══════════════════════════════════════════════════════════════════════════════
// Budget accounting
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_explicit_budget_is_capped_below_callers() {
    let (r, log) = scripted(|t| {
        if first_text(t).starts_with("@0:") {
            "reply sub".into()
        } else if t.responses.is_empty() {
            "ask$50 (big)".into()
        } else {
            "reply top".into()
        }
    });
    run("q", 6, r).unwrap();
    assert_eq!(log.borrow()[1], "@0: big\n[Remaining budget is 5]");
}

#[test]
fn test_child_spending_is_charged_to_caller() {
    let config = EvalConfig::default().with_command_cost(1);
    let (r, log) = scripted(|t| {
        if first_text(t).starts_with("@0:") {
            match t.responses.len() {
                0 => "note thinking".into(),
                _ => "reply sub".into(),
            }
        } else if t.responses.is_empty() {
            "ask$4 (work)".into()
        } else {
            "reply top".into()
        }
    });
    assert_eq!(evaluate(config, "q", 10, r), "top");
    // the child spent 2 of its 4 units
    assert_eq!(log.borrow()[3], "@0: sub\n[Remaining budget is 8]");
}

#[test]
fn test_surcharge_charges_each_ask() {
    let config = EvalConfig::default().with_ask_surcharge(1);
    let (r, log) = scripted(|t| {
        if first_text(t).starts_with("@0:") {
            "reply sub".into()
        } else if t.responses.is_empty() {
            "ask (work)".into()
        } else {
            "reply top".into()
        }
    });
    evaluate(config, "q", 9, r);
    assert_eq!(log.borrow()[2], "@0: sub\n[Remaining budget is 8]");
}

#[test]
fn test_time_accounting_forces_verbatim_answer() {
    let config = EvalConfig::default().with_accounting(Accounting::Time);
    let r = respondent(|t: &Transcript| {
        let text = match t.responses.len() {
            0 => "note thinking",
            _ => "reply (too slow)",
        };
        Some(Response::timed(text, 60))
    });
    assert_eq!(evaluate(config, "q", 100, r), "reply (too slow)");
}

#[test]
fn test_time_accounting_hides_budget() {
    let config = EvalConfig::default().with_accounting(Accounting::Time);
    let log: Log = Rc::default();
    let seen = Rc::clone(&log);
    let r = respondent(move |t: &Transcript| {
        seen.borrow_mut().push(last_text(t).to_string());
        Some(Response::timed("reply fast", 1))
    });
    assert_eq!(evaluate(config, "q", 100, r), "fast");
    assert_eq!(*log.borrow(), vec!["q"]);
}

#[test]
fn test_stubborn_asker_terminates_with_surcharge() {
    let config = EvalConfig::default().with_ask_surcharge(1);
    let (r, log) = scripted(|_| "ask deeper".into());
    assert_eq!(evaluate(config, "q", 12, r), "ask deeper");
    assert!(log.borrow().len() > 1);
}

#[test]
fn test_depth_limit_stops_runaway_nesting() {
    let config = EvalConfig::default()
        .with_default_fraction(1)
        .with_max_depth(3);
    let (r, _) = scripted(|_| "ask deeper".into());
    let err = Evaluator::new(config).run("q", 100, r).unwrap_err();
    assert!(matches!(err, EvalError::DepthLimit { depth: 4, limit: 3 }));
}

#[test]
fn test_runaway_asker_stops_at_default_depth_limit() {
    let config = EvalConfig::default().with_default_fraction(1);
    let (r, log) = scripted(|_| "ask deeper".into());
    let err = Evaluator::new(config).run("q", 5000, r).unwrap_err();
    assert!(matches!(
        err,
        EvalError::DepthLimit {
            depth: 1025,
            limit: 1024
        }
    ));
    assert_eq!(log.borrow().len(), 1025);
}

#[test]
fn test_stubborn_asker_with_tiny_budget_hits_turn_limit() {
    let (r, log) = scripted(|_| "ask deeper".into());
    let err = Evaluator::default().run("q", 2, r).unwrap_err();
    assert!(matches!(
        err,
        EvalError::TurnLimit {
            turns: 1000,
            limit: 1000
        }
    ));
    // every root turn spawns one child that answers at zero budget
    assert_eq!(log.borrow().len(), 2000);
}

#[test]
fn test_turn_limit_is_configurable() {
    let config = EvalConfig::default().with_max_turns(3);
    let (r, _) = scripted(|_| "note again".into());
    let err = Evaluator::new(config).run("q", 5, r).unwrap_err();
    assert!(matches!(err, EvalError::TurnLimit { turns: 3, limit: 3 }));
}

#[test]
fn test_invalid_config_is_rejected_by_run() {
    let config = EvalConfig::default().with_ask_surcharge(2);
    let (r, _) = scripted(|_| "reply ok".into());
    assert!(matches!(
        Evaluator::new(config).run("q", 3, r),
        Err(EvalError::InvalidConfig(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Each new conversation starts with strictly less budget than the
    /// turn that asked for it.
    #[test]
    fn prop_sub_budget_below_caller(budget in 1u64..40, fraction in 1u64..5) {
        let config = EvalConfig::default()
            .with_ask_surcharge(1)
            .with_default_fraction(fraction);
        let events: Rc<RefCell<Vec<(usize, Budget)>>> = Rc::default();
        let seen = Rc::clone(&events);
        let r = respondent(move |t: &Transcript| {
            if let Some(obs) = t.observations.last() {
                seen.borrow_mut().push((t.observations.len(), obs.budget));
            }
            let verb = if t.responses.len() % 2 == 0 { "ask deeper" } else { "note pause" };
            Some(Response::new(verb))
        });
        let flow = Evaluator::new(config).run("q", budget, r);
        prop_assert!(matches!(flow, Ok(Flow::Ready(_))));
        let events = events.borrow();
        for pair in events.windows(2) {
            let ((_, asked_at), (len, started_with)) = (pair[0], pair[1]);
            if len == 1 {
                prop_assert!(started_with < asked_at);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Adapters and determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_budgeter_lets_a_tree_answer_for_another() {
    let inner = respondent(|_: &Transcript| Some(Response::new("reply reply 4")));
    let outer = Budgeter::hch(inner, 5, Evaluator::default());
    assert_eq!(outer.budget(), 5);
    assert_eq!(run("What is 2 + 2", 10, outer.into_shared()).unwrap(), "4");
}

#[test]
fn test_budgeter_starts_each_question_fresh() {
    let (inner, log) = scripted(|t| {
        assert_eq!(t.observations.len(), 1);
        if first_text(t).starts_with("q") {
            "reply note step".into()
        } else {
            "reply reply done".into()
        }
    });
    let outer = Budgeter::hch(inner, 5, Evaluator::default()).into_shared();
    assert_eq!(run("q", 10, outer).unwrap(), "done");
    assert_eq!(
        *log.borrow(),
        vec![
            "q\n[Remaining budget is 10]\n[Remaining budget is 5]",
            "step\n[Remaining budget is 10]\n[Remaining budget is 5]",
        ]
    );
}

#[test]
fn test_evaluation_determinism_100_iterations() {
    let script = |t: &Transcript| {
        if first_text(t).starts_with("@0:") {
            "reply 42".to_string()
        } else if t.responses.is_empty() {
            "ask (What is 7 * 6)".to_string()
        } else {
            "reply got it".to_string()
        }
    };
    let (r, _) = scripted(script);
    let first = run("root", 10, Rc::clone(&r)).unwrap();
    for _ in 0..100 {
        assert_eq!(run("root", 10, Rc::clone(&r)).unwrap(), first);
    }
}

//! Integration tests for the evaluation engine
//!
//! These tests cover:
//! - Memoization of (parser, position) pairs
//! - Match accumulation and listener replay
//! - Error recording and cycle safety
//! - Left-recursive and mutually recursive grammars

use std::sync::{Arc, Mutex};
use std::thread;

use lingwah::{
    Choice, DefaultListener, GrammarBuilder, Listener, Match, ParseContext, ParseError,
    ParseResults, Parser, ParserId,
};

/// Never matches or fails on its own
struct Silent;

impl Parser for Silent {
    fn start_matching(&self, _ctx: &ParseContext, _start: usize, _results: &Arc<ParseResults>) {}

    fn label(&self) -> String {
        "silent".to_string()
    }
}

/// Records the length of every match and the position of every error
#[derive(Default)]
struct Recorder {
    found: Mutex<Vec<usize>>,
    errors: Mutex<Vec<usize>>,
}

impl Listener for Recorder {
    fn on_match_found(&self, _results: &ParseResults, found: &Arc<Match>) {
        self.found.lock().unwrap().push(found.length());
    }

    fn on_match_error(&self, _results: &ParseResults, error: &ParseError) {
        self.errors.lock().unwrap().push(error.position);
    }
}

fn sorted_lengths(results: &ParseResults) -> Vec<usize> {
    let mut lengths: Vec<usize> = results.matches().iter().map(|m| m.length()).collect();
    lengths.sort_unstable();
    lengths
}

// ============================================================================
// Terminal Scenarios
// ============================================================================

#[test]
fn test_regex_match_at_start() {
    let mut b = GrammarBuilder::new();
    let ab = b.regex("ab").unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "abc").unwrap();

    let results = ctx.results_for(ab, 0);
    let matches = results.matches();
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].start(), matches[0].end()), (0, 2));
    assert!(results.success());
    assert_eq!(results.longest_match().unwrap().length(), 2);
}

#[test]
fn test_regex_no_match() {
    let mut b = GrammarBuilder::new();
    let ab = b.regex("ab").unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "xyz").unwrap();

    let results = ctx.results_for(ab, 0);
    assert!(!results.success());
    assert_eq!(results.error_position(), "0");
    assert_eq!(results.error_message(), "Expected ab");
    assert_eq!(results.error().unwrap().context, ctx.id());
}

#[test]
fn test_regex_later_match_is_failure() {
    let mut b = GrammarBuilder::new();
    let ab = b.regex("ab").unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "xab").unwrap();

    assert!(!ctx.results_for(ab, 0).success());
}

// ============================================================================
// Memoization
// ============================================================================

#[test]
fn test_same_accumulator_for_same_pair() {
    let mut b = GrammarBuilder::new();
    let word = b.regex("[a-z]+").unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "hello world").unwrap();

    for pos in [0, 3, 6] {
        let first = ctx.results_for(word, pos);
        let second = ctx.results_for(word, pos);
        assert!(Arc::ptr_eq(&first, &second));
    }
    assert!(!Arc::ptr_eq(
        &ctx.results_for(word, 0),
        &ctx.results_for(word, 6)
    ));
}

#[test]
fn test_shared_subparser_evaluated_once() {
    let mut b = GrammarBuilder::new();
    let digit = b.regex("[0-9]").unwrap();
    let left = b.sequence([digit, digit]);
    let right = b.sequence([digit]);
    let both = b.choice([left, right]);
    let ctx = ParseContext::new(b.build().unwrap(), "12").unwrap();

    ctx.results_for(both, 0);

    // digit@0 is requested by both alternatives but created once
    let (hits, _misses, _) = ctx.cache_stats();
    assert!(hits >= 1);
    assert_eq!(
        ctx.cached(digit, 0).unwrap().matches().len(),
        1,
        "digit evaluated at 0 once"
    );
}

// ============================================================================
// Accumulation and Listeners
// ============================================================================

#[test]
fn test_two_lengths_into_one_composite() {
    let mut b = GrammarBuilder::new();
    let two = b.literal("ab");
    let three = b.literal("abc");
    let composite = b.add(Silent);
    let ctx = ParseContext::new(b.build().unwrap(), "abcd").unwrap();

    let target = ctx.results_for(composite, 0);
    ctx.results_for(two, 0)
        .add_listener(Arc::new(DefaultListener::new(&target)));
    ctx.results_for(three, 0)
        .add_listener(Arc::new(DefaultListener::new(&target)));

    assert_eq!(target.matches().len(), 2);
    assert_eq!(target.longest_match().unwrap().length(), 3);
    assert!(target.matches().iter().all(|m| m.parser() == composite));
}

#[test]
fn test_second_match_of_same_length_not_broadcast() {
    let mut b = GrammarBuilder::new();
    let p = b.add(Silent);
    let other = b.add(Silent);
    let ctx = ParseContext::new(b.build().unwrap(), "abcdef").unwrap();

    let results = ctx.results_for(p, 0);
    let recorder = Arc::new(Recorder::default());
    results.add_listener(recorder.clone());

    results.add_match_end(3);
    results.add_match(Match::terminal(other, 0, 3));

    assert_eq!(results.matches().len(), 1);
    assert_eq!(*recorder.found.lock().unwrap(), vec![3]);
}

#[test]
fn test_late_listener_replay_order() {
    let mut b = GrammarBuilder::new();
    let p = b.add(Silent);
    let ctx = ParseContext::new(b.build().unwrap(), "abcdef").unwrap();

    let results = ctx.results_for(p, 0);
    for end in [4, 2, 6] {
        results.add_match_end(end);
    }

    let recorder = Arc::new(Recorder::default());
    results.add_listener(recorder.clone());
    results.add_match_end(1);
    results.add_match_end(2);

    assert_eq!(*recorder.found.lock().unwrap(), vec![4, 2, 6, 1]);
}

#[test]
fn test_errors_not_replayed_to_late_listener() {
    let mut b = GrammarBuilder::new();
    let p = b.add(Silent);
    let ctx = ParseContext::new(b.build().unwrap(), "abc").unwrap();

    let results = ctx.results_for(p, 0);
    results.set_error_message("early");

    let recorder = Arc::new(Recorder::default());
    results.add_listener(recorder.clone());
    results.set_error_at("late", 2);

    assert_eq!(*recorder.errors.lock().unwrap(), vec![2]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_best_error_never_moves_back() {
    let mut b = GrammarBuilder::new();
    let p = b.add(Silent);
    let ctx = ParseContext::new(b.build().unwrap(), "abcdefgh").unwrap();

    let results = ctx.results_for(p, 0);
    let mut last = 0;
    for pos in [3, 1, 5, 5, 2, 7, 0] {
        results.set_error_at(format!("at {}", pos), pos);
        let best = results.error().unwrap().position;
        assert!(best >= last);
        last = best;
    }
    assert_eq!(last, 7);
}

#[test]
fn test_equal_error_delivered_once() {
    let mut b = GrammarBuilder::new();
    let p = b.add(Silent);
    let ctx = ParseContext::new(b.build().unwrap(), "abc").unwrap();

    let results = ctx.results_for(p, 0);
    let recorder = Arc::new(Recorder::default());
    results.add_listener(recorder.clone());

    let error = ParseError::new(ctx.id(), p, "Expected x", 1);
    results.set_error(error.clone());
    results.set_error(error);

    // same position, different message: a distinct error
    results.set_error_at("Expected y", 1);

    assert_eq!(*recorder.errors.lock().unwrap(), vec![1, 1]);
}

#[test]
fn test_self_choice_failure_terminates() {
    // R ::= R | 'x'   over "y"
    let mut b = GrammarBuilder::new();
    let r = b.declare("R");
    let x = b.literal("x");
    b.define(r, Choice::new([r, x])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "y").unwrap();

    let results = ctx.results_for(r, 0);
    assert!(!results.success());
    assert_eq!(results.error_message(), "Expected 'x'");
}

/// Evaluates its partner at the same position, forwards the partner's
/// results into its own and then fails with a fixed message
struct Echo {
    partner: ParserId,
}

impl Parser for Echo {
    fn start_matching(&self, ctx: &ParseContext, start: usize, results: &Arc<ParseResults>) {
        ctx.results_for(self.partner, start).forward_to(results);
        results.set_error_message("echo failed");
    }

    fn label(&self) -> String {
        "echo".to_string()
    }
}

#[test]
fn test_mutual_error_cycle_terminates() {
    let mut b = GrammarBuilder::new();
    let p = b.declare("P");
    let q = b.declare("Q");
    b.define(p, Echo { partner: q }).unwrap();
    b.define(q, Echo { partner: p }).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "anything").unwrap();

    let results = ctx.results_for(p, 0);
    assert!(!results.success());
    assert_eq!(results.error_message(), "echo failed");

    let q_results = ctx.cached(q, 0).unwrap();
    assert!(Arc::ptr_eq(&q_results, &ctx.results_for(q, 0)));
    assert_eq!(q_results.error_message(), "echo failed");
}

#[test]
fn test_furthest_error_across_run() {
    let mut b = GrammarBuilder::new();
    let a = b.literal("a");
    let bee = b.literal("b");
    let c = b.literal("c");
    let abc = b.sequence([a, bee, c]);
    let ctx = ParseContext::new(b.build().unwrap(), "abx").unwrap();

    let err = ctx.parse_complete(abc).unwrap_err();
    assert_eq!(err.position, 2);
    assert_eq!(err.message, "Expected 'c'");
    assert_eq!(err.format_with_source(ctx.document()), "Error at line 1, column 3: Expected 'c'");
}

// ============================================================================
// Recursive Grammars
// ============================================================================

#[test]
fn test_left_recursion() {
    // R ::= R 'a' | 'a'
    let mut b = GrammarBuilder::new();
    let r = b.declare("R");
    let a = b.literal("a");
    let r_a = b.sequence([r, a]);
    b.define(r, Choice::new([r_a, a])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "aaa").unwrap();

    let results = ctx.results_for(r, 0);
    assert_eq!(sorted_lengths(&results), vec![1, 2, 3]);
    assert!(ctx.parse_complete(r).is_ok());
}

#[test]
fn test_left_recursion_tree_shape() {
    // R ::= R 'a' | 'a'; the 3-byte match nests to the left
    let mut b = GrammarBuilder::new();
    let r = b.declare("R");
    let a = b.literal("a");
    let r_a = b.sequence([r, a]);
    b.define(r, Choice::new([r_a, a])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "aaa").unwrap();

    let full = ctx.parse_complete(r).unwrap();
    assert_eq!(full.parser(), r);
    // R -> seq -> [R(0..2), 'a'(2..3)]
    let seq = &full.children()[0];
    assert_eq!(seq.parser(), r_a);
    assert_eq!(seq.children()[0].length(), 2);
    assert_eq!(seq.children()[1].start(), 2);
    assert_eq!(full.find_all(a).len(), 3);
}

#[test]
fn test_mutual_left_recursion() {
    // A ::= B 'a' | 'a'
    // B ::= A 'b' | 'b'
    let mut b = GrammarBuilder::new();
    let rule_a = b.declare("A");
    let rule_b = b.declare("B");
    let lit_a = b.literal("a");
    let lit_b = b.literal("b");
    let b_a = b.sequence([rule_b, lit_a]);
    let a_b = b.sequence([rule_a, lit_b]);
    b.define(rule_a, Choice::new([b_a, lit_a])).unwrap();
    b.define(rule_b, Choice::new([a_b, lit_b])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "aba").unwrap();

    assert_eq!(sorted_lengths(&ctx.results_for(rule_a, 0)), vec![1, 3]);
    assert_eq!(sorted_lengths(&ctx.results_for(rule_b, 0)), vec![2]);
}

#[test]
fn test_right_recursion() {
    // L ::= 'x' L | 'x'
    let mut b = GrammarBuilder::new();
    let l = b.declare("L");
    let x = b.literal("x");
    let x_l = b.sequence([x, l]);
    b.define(l, Choice::new([x_l, x])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "xxxx").unwrap();

    assert_eq!(sorted_lengths(&ctx.results_for(l, 0)), vec![1, 2, 3, 4]);
}

#[test]
fn test_left_recursive_expression_grammar() {
    // expr ::= expr '+' num | num
    let mut b = GrammarBuilder::new();
    let expr = b.declare("expr");
    let num = b.regex("[0-9]+").unwrap();
    let plus = b.literal("+");
    let sum = b.sequence([expr, plus, num]);
    b.define(expr, Choice::new([sum, num])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "1+22+333").unwrap();

    let full = ctx.parse_complete(expr).unwrap();
    assert_eq!(ctx.text(&full), "1+22+333");
    let nums: Vec<&str> = full.find_all(num).iter().map(|m| ctx.text(m)).collect();
    assert_eq!(nums, vec!["1", "22", "333"]);

    let again = ctx.parse_complete(expr).unwrap();
    assert_eq!(again.end(), full.end());
}

#[test]
fn test_incomplete_left_recursive_parse() {
    let mut b = GrammarBuilder::new();
    let expr = b.declare("expr");
    let num = b.regex("[0-9]+").unwrap();
    let plus = b.literal("+");
    let sum = b.sequence([expr, plus, num]);
    b.define(expr, Choice::new([sum, num])).unwrap();
    let ctx = ParseContext::new(b.build().unwrap(), "1+2+").unwrap();

    let err = ctx.parse_complete(expr).unwrap_err();
    assert_eq!(err.position, 4);
    assert_eq!(err.message, "Expected [0-9]+");
}

#[test]
fn test_deep_left_recursion_on_large_stack() {
    const LEN: usize = 3000;

    let handle = thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(|| {
            let mut b = GrammarBuilder::new();
            let r = b.declare("R");
            let a = b.literal("a");
            let r_a = b.sequence([r, a]);
            b.define(r, Choice::new([r_a, a])).unwrap();
            let ctx = ParseContext::new(b.build().unwrap(), "a".repeat(LEN)).unwrap();

            let results = ctx.results_for(r, 0);
            (results.matches().len(), results.longest_length())
        })
        .unwrap();

    assert_eq!(handle.join().unwrap(), (LEN, LEN));
}

use std::sync::{Arc, Mutex};

use http::Method;

use super::{Callback, Chain, ChainExecutor, DispatchOutcome, FaultPolicy};
use crate::request::Request;
use crate::response::{MemorySink, Response};

fn executor() -> ChainExecutor {
    ChainExecutor::new(FaultPolicy::Convert)
}

fn request() -> Request {
    Request::new(Method::GET, "/".to_string())
}

type Log = Arc<Mutex<Vec<&'static str>>>;

fn mark(log: &Log, label: &'static str) {
    log.lock().expect("log lock poisoned").push(label);
}

fn entries(log: &Log) -> Vec<&'static str> {
    log.lock().expect("log lock poisoned").clone()
}

#[test]
fn test_callbacks_run_in_order_with_proceed() {
    let log: Log = Arc::default();
    let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
    let chain: Chain = vec![
        Callback::new(move |_req, _res, next| {
            mark(&l1, "first");
            next.proceed();
        }),
        Callback::new(move |_req, _res, _next| mark(&l2, "second")),
    ];

    let outcome = executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(entries(&log), vec!["first", "second"]);
}

#[test]
fn test_chain_stops_without_a_signal() {
    let log: Log = Arc::default();
    let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
    let chain: Chain = vec![
        Callback::new(move |_req, _res, _next| mark(&l1, "first")),
        Callback::new(move |_req, _res, _next| mark(&l2, "second")),
    ];

    let outcome = executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(entries(&log), vec!["first"]);
}

#[test]
fn test_unconsumed_error_escalates_with_auto_next() {
    // c1 attaches an error and sets no signal; the following error handler
    // must still be reached within the same chain.
    let log: Log = Arc::default();
    let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
    let chain: Chain = vec![
        Callback::new(move |_req, _res, next| {
            mark(&l1, "thrower");
            next.throw(anyhow::anyhow!("kaput"));
        }),
        Callback::error_handler(move |err, _req, _res, _next| {
            assert_eq!(err.to_string(), "kaput");
            mark(&l2, "handler");
        }),
    ];

    let outcome = executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(entries(&log), vec!["thrower", "handler"]);
}

#[test]
fn test_plain_callback_skipped_while_error_attached() {
    let log: Log = Arc::default();
    let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    let chain: Chain = vec![
        Callback::new(move |_req, _res, next| {
            mark(&l1, "thrower");
            next.throw(anyhow::anyhow!("kaput"));
        }),
        Callback::new(move |_req, _res, _next| mark(&l2, "plain")),
        Callback::error_handler(move |_err, _req, _res, _next| mark(&l3, "handler")),
    ];

    executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(entries(&log), vec!["thrower", "handler"]);
}

#[test]
fn test_error_escalates_across_chain_boundary() {
    // The thrower is the last callback of its chain: the error auto-routes
    // into the next chain of the set, where the handler picks it up.
    let log: Log = Arc::default();
    let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
    let first: Chain = vec![Callback::new(move |_req, _res, next| {
        mark(&l1, "thrower");
        next.throw(anyhow::anyhow!("kaput"));
    })];
    let second: Chain = vec![Callback::error_handler(move |_err, _req, _res, _next| {
        mark(&l2, "handler");
    })];

    let outcome = executor().execute(
        &[first, second],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(entries(&log), vec!["thrower", "handler"]);
}

#[test]
fn test_route_signal_terminates_chain_immediately() {
    let log: Log = Arc::default();
    let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    let first: Chain = vec![
        Callback::new(move |_req, _res, next| {
            mark(&l1, "reroute");
            next.reroute();
        }),
        Callback::new(move |_req, _res, _next| mark(&l2, "unreachable")),
    ];
    let second: Chain = vec![Callback::new(move |_req, _res, _next| mark(&l3, "fallback"))];

    executor().execute(
        &[first, second],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(entries(&log), vec!["reroute", "fallback"]);
}

#[test]
fn test_route_takes_precedence_over_next() {
    let log: Log = Arc::default();
    let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    let first: Chain = vec![
        Callback::new(move |_req, _res, next| {
            mark(&l1, "both");
            next.proceed();
            next.reroute();
        }),
        Callback::new(move |_req, _res, _next| mark(&l2, "unreachable")),
    ];
    let second: Chain = vec![Callback::new(move |_req, _res, _next| mark(&l3, "fallback"))];

    executor().execute(
        &[first, second],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(entries(&log), vec!["both", "fallback"]);
}

#[test]
fn test_next_on_final_callback_is_ignored() {
    let chain: Chain = vec![Callback::new(|_req, _res, next| next.proceed())];

    let outcome = executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
}

#[test]
fn test_route_past_last_chain_is_unresolved() {
    let chain: Chain = vec![Callback::new(|_req, _res, next| next.reroute())];
    let mut sink = MemorySink::new();

    let outcome = executor().execute(&[chain], &mut request(), &mut Response::new(), &mut sink);
    assert_eq!(outcome, DispatchOutcome::Unresolved);
    // An unresolved request produces no response activity.
    assert_eq!(sink, MemorySink::new());
}

#[test]
fn test_ended_response_stops_the_chain_set() {
    let log: Log = Arc::default();
    let l2 = Arc::clone(&log);
    let first: Chain = vec![Callback::new(|_req, res, next| {
        res.send("done");
        // Signals are irrelevant once the response has ended.
        next.proceed();
        next.reroute();
    })];
    let second: Chain = vec![Callback::new(move |_req, _res, _next| mark(&l2, "unreachable"))];
    let mut sink = MemorySink::new();

    let outcome = executor().execute(
        &[first, second],
        &mut request(),
        &mut Response::new(),
        &mut sink,
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert!(entries(&log).is_empty());
    assert_eq!(sink.body, "done");
    assert_eq!(sink.status, Some(200));
}

#[test]
fn test_header_append_after_send_does_not_reach_the_wire() {
    let chain: Chain = vec![Callback::new(|_req, res, _next| {
        res.send("payload");
        res.append("X-Too-Late", "yes");
    })];
    let mut sink = MemorySink::new();

    executor().execute(&[chain], &mut request(), &mut Response::new(), &mut sink);
    assert_eq!(sink.body, "payload");
    assert_eq!(sink.header("X-Too-Late"), None);
}

#[test]
fn test_error_handler_consumes_error_and_stops() {
    let log: Log = Arc::default();
    let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    let chain: Chain = vec![
        Callback::new(move |_req, _res, next| {
            mark(&l1, "thrower");
            next.throw(anyhow::anyhow!("kaput"));
        }),
        Callback::error_handler(move |_err, req, _res, _next| {
            mark(&l2, "handler");
            assert!(req.error().is_none(), "handler entry clears the error");
        }),
        Callback::new(move |_req, _res, _next| mark(&l3, "after")),
    ];

    executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    // The handler set no signal, so the chain stops after it.
    assert_eq!(entries(&log), vec!["thrower", "handler"]);
}

#[test]
fn test_error_handler_may_rethrow() {
    let log: Log = Arc::default();
    let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
    let first: Chain = vec![
        Callback::new(|_req, _res, next| next.throw(anyhow::anyhow!("original"))),
        Callback::error_handler(move |err, _req, _res, next| {
            mark(&l1, "first_handler");
            next.throw(anyhow::anyhow!("wrapped: {err}"));
        }),
    ];
    let second: Chain = vec![Callback::error_handler(move |err, _req, _res, _next| {
        assert_eq!(err.to_string(), "wrapped: original");
        mark(&l2, "second_handler");
    })];

    executor().execute(
        &[first, second],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(entries(&log), vec!["first_handler", "second_handler"]);
}

#[test]
fn test_skipped_error_handler_is_transparent() {
    // No error attached: the leading error handler is skipped and the
    // request falls through to the plain callback.
    let log: Log = Arc::default();
    let (l1, l2) = (Arc::clone(&log), Arc::clone(&log));
    let chain: Chain = vec![
        Callback::error_handler(move |_err, _req, _res, _next| mark(&l1, "handler")),
        Callback::new(move |_req, _res, _next| mark(&l2, "plain")),
    ];

    executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(entries(&log), vec!["plain"]);
}

#[test]
fn test_skipped_error_chain_falls_through_to_next_chain() {
    let log: Log = Arc::default();
    let l2 = Arc::clone(&log);
    let error_chain: Chain = vec![Callback::error_handler(|_err, _req, _res, _next| {})];
    let route_chain: Chain = vec![Callback::new(move |_req, _res, _next| mark(&l2, "route"))];

    let outcome = executor().execute(
        &[error_chain, route_chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(entries(&log), vec!["route"]);
}

#[test]
fn test_panic_is_converted_to_request_error() {
    let log: Log = Arc::default();
    let l1 = Arc::clone(&log);
    let chain: Chain = vec![
        Callback::new(|_req, _res, _next| panic!("boom")),
        Callback::error_handler(move |err, _req, _res, _next| {
            assert!(err.to_string().contains("boom"));
            mark(&l1, "handler");
        }),
    ];

    let outcome = executor().execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(entries(&log), vec!["handler"]);
}

#[test]
#[should_panic(expected = "boom")]
fn test_panic_propagates_in_development_mode() {
    let chain: Chain = vec![Callback::new(|_req, _res, _next| panic!("boom"))];

    let _ = ChainExecutor::new(FaultPolicy::Propagate).execute(
        &[chain],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
}

#[test]
fn test_empty_chain_completes() {
    let outcome = executor().execute(
        &[Chain::new()],
        &mut request(),
        &mut Response::new(),
        &mut MemorySink::new(),
    );
    assert_eq!(outcome, DispatchOutcome::Completed);
}

#[test]
fn test_unconsumed_error_terminates_silently() {
    // No error handler anywhere: the error escalates off the end of the
    // chain set and the request sees no response activity.
    let chain: Chain = vec![Callback::new(|_req, _res, next| {
        next.throw(anyhow::anyhow!("nobody listens"));
    })];
    let mut sink = MemorySink::new();

    let outcome = executor().execute(&[chain], &mut request(), &mut Response::new(), &mut sink);
    assert_eq!(outcome, DispatchOutcome::Unresolved);
    assert_eq!(sink, MemorySink::new());
}

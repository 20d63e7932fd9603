use reactor::{Interest, LoopFlags, Reactor, ReactorConfig};
use std::cell::RefCell;
use std::os::unix::io::AsRawFd;
use std::rc::Rc;
use std::time::Duration;

fn test_reactor() -> Reactor {
    Reactor::with_config(ReactorConfig::default().backend_override("poll")).unwrap()
}

/// Scenario 1: a readable pipe fires its READ callback and `dispatch(ONCE)`
/// returns 0.
#[test]
fn readable_pipe_fires_once() {
    let (reader, writer) = nix::unistd::pipe().unwrap();
    let mut r = test_reactor();

    let fired = Rc::new(RefCell::new(None));
    let fired2 = fired.clone();

    let id = r.init(None);
    r.set_fd(id, reader.as_raw_fd()).unwrap();
    r.set_callback(id, move |r, id, interest| {
        *fired2.borrow_mut() = Some(interest);
        let _ = r.del(id);
        let _ = r.destroy(id);
    })
    .unwrap();
    r.add(id, Interest::READ, None).unwrap();

    nix::unistd::write(&writer, b"x").unwrap();

    let code = r.dispatch(LoopFlags::ONCE);
    assert_eq!(code, 0);
    assert_eq!(*fired.borrow(), Some(Interest::READ));
}

/// Scenario 3: a priority-0 callback cancels a still-queued priority-2
/// event in the same batch; the priority-2 callback must never run.
#[test]
fn higher_priority_callback_cancels_lower_priority_peer() {
    let mut r = test_reactor();
    let levels = r.priority_levels();
    assert!(levels >= 3, "default config must provide at least 3 priority levels");

    let low_ran = Rc::new(RefCell::new(false));
    let low_ran2 = low_ran.clone();

    let low = r.init(Some(2));
    r.set_callback(low, move |_, _, _| *low_ran2.borrow_mut() = true)
        .unwrap();
    r.add(low, Interest::TIMEOUT | Interest::PERSIST, Some(Duration::from_secs(10)))
        .unwrap();

    let high = r.init(Some(0));
    r.set_callback(high, move |r, _, _| {
        r.del(low).unwrap();
    })
    .unwrap();

    r.active(high, Interest::TIMEOUT).unwrap();
    r.active(low, Interest::TIMEOUT).unwrap();

    // high's priority queue drains first; inside its callback it cancels
    // `low` before `low`'s own (still-queued) batch would run.
    r.dispatch(LoopFlags::ONCE);

    assert!(!*low_ran.borrow());
}

/// Scenario 4: an event that deletes itself from within its own callback
/// leaves no trace in any queue, and the loop continues normally.
#[test]
fn self_deleting_callback_leaves_no_residue() {
    let mut r = test_reactor();
    let id = r.init(None);
    r.set_callback(id, |r, id, _| {
        r.del(id).unwrap();
    })
    .unwrap();
    r.add(id, Interest::TIMEOUT, Some(Duration::from_millis(1))).unwrap();

    // dispatch(ONCE) blocks for at most the timer's deadline, fires the
    // self-deleting callback, then returns — it must not hang even
    // though the event's slot (not yet destroyed) keeps the arena
    // non-empty.
    assert_eq!(r.dispatch(LoopFlags::ONCE), 0);
    assert!(!r.pending(id, Interest::TIMEOUT, None));
    r.destroy(id).unwrap();
}

/// Scenario 5: `once` with a timeout and no fd fires on the very next
/// iteration, exactly once, and its slot is freed without the caller
/// ever touching an `EventId`.
#[test]
fn once_fires_exactly_once_next_iteration() {
    let mut r = test_reactor();
    let count = Rc::new(RefCell::new(0u32));
    let count2 = count.clone();

    r.once(None, Interest::TIMEOUT, Some(Duration::ZERO), move |_, interest| {
        assert!(interest.contains(Interest::TIMEOUT));
        *count2.borrow_mut() += 1;
    })
    .unwrap();

    assert_eq!(r.run(), 1);
    assert_eq!(*count.borrow(), 1);
}

/// Scenario 7: after `reinit`, a previously-registered I/O event still
/// fires on subsequent readiness.
#[test]
fn io_event_survives_reinit() {
    let (reader, writer) = nix::unistd::pipe().unwrap();
    let mut r = test_reactor();

    let fired = Rc::new(RefCell::new(false));
    let fired2 = fired.clone();

    let id = r.init(None);
    r.set_fd(id, reader.as_raw_fd()).unwrap();
    r.set_callback(id, move |r, id, _| {
        *fired2.borrow_mut() = true;
        let _ = r.del(id);
        let _ = r.destroy(id);
    })
    .unwrap();
    r.add(id, Interest::READ, None).unwrap();

    r.reinit().unwrap();

    nix::unistd::write(&writer, b"x").unwrap();
    let code = r.dispatch(LoopFlags::ONCE);

    assert_eq!(code, 0);
    assert!(*fired.borrow());
}

/// Property 8 (persist vs. non-persist teardown timing): a PERSIST timer
/// is still INSERTED/TIMEOUT-pending when its callback runs; a
/// non-PERSIST timer has already been fully torn down by then.
#[test]
fn persist_stays_pending_through_callback_non_persist_does_not() {
    let mut r = test_reactor();

    let persist_pending_during_callback = Rc::new(RefCell::new(false));
    let p2 = persist_pending_during_callback.clone();
    let persist_id = r.init(None);
    r.set_callback(persist_id, move |r, id, _| {
        *p2.borrow_mut() = r.pending(id, Interest::TIMEOUT, None);
        let _ = r.del(id);
    })
    .unwrap();
    r.add(
        persist_id,
        Interest::TIMEOUT | Interest::PERSIST,
        Some(Duration::from_millis(1)),
    )
    .unwrap();

    let oneshot_pending_during_callback = Rc::new(RefCell::new(true));
    let o2 = oneshot_pending_during_callback.clone();
    let oneshot_id = r.init(None);
    r.set_callback(oneshot_id, move |r, id, _| {
        *o2.borrow_mut() = r.pending(id, Interest::TIMEOUT, None);
        let _ = r.destroy(id);
    })
    .unwrap();
    r.add(oneshot_id, Interest::TIMEOUT, Some(Duration::from_millis(1))).unwrap();

    r.dispatch(LoopFlags::ONCE);

    assert!(*persist_pending_during_callback.borrow());
    assert!(!*oneshot_pending_during_callback.borrow());

    r.del(persist_id).unwrap();
    r.destroy(persist_id).unwrap();
}

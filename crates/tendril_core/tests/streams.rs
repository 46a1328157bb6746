use std::cell::RefCell;
use std::rc::Rc;

use tendril_core::{Source, StreamExt, Subscription};

#[test]
fn test_mapped_source_releases_upstream() {
    let count = Source::with_value(0u32);
    let label = count.stream().map(|n| format!("Count is: {n}"));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut sub = label.observe(move |s: &String| sink.borrow_mut().push(s.clone()));
    assert_eq!(count.subscriber_count(), 1);

    count.update(|n| n + 1);
    count.update(|n| n + 1);
    sub.unsubscribe();
    count.update(|n| n + 1);

    assert_eq!(
        *seen.borrow(),
        vec!["Count is: 0", "Count is: 1", "Count is: 2"]
    );
    assert_eq!(count.subscriber_count(), 0);
    assert_eq!(count.get(), Some(3));
}

#[test]
fn test_many_subscribers_share_one_source() {
    let source = Source::<String>::new();
    let a = Rc::new(RefCell::new(String::new()));
    let b = Rc::new(RefCell::new(String::new()));

    let sink_a = a.clone();
    let sink_b = b.clone();
    let mut subs: Vec<Subscription> = vec![
        source.stream().observe(move |v: &String| sink_a.borrow_mut().push_str(v)),
        source.stream().observe(move |v: &String| sink_b.borrow_mut().push_str(v)),
    ];

    source.emit("x".into());
    subs[0].unsubscribe();
    source.emit("y".into());

    assert_eq!(*a.borrow(), "x");
    assert_eq!(*b.borrow(), "xy");

    for sub in &mut subs {
        sub.unsubscribe();
    }
    assert_eq!(source.subscriber_count(), 0);
}

use std::time::Duration;
use suitewalk::{
    ArgPosition, BlockKind, Body, BodyKind, DescribeOptions, ProgrammerError, RunOptions, Suite,
};

fn noop() -> Body {
    Body::sync(|| Ok(()))
}

#[test]
fn test_describe_runs_body_immediately() {
    let mut suite = Suite::new();
    let mut ran = false;

    suite
        .describe("A", |t| {
            ran = true;
            t.it("x", noop())
        })
        .unwrap();

    assert!(ran);
    let roots = suite.root_blocks();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name_path(), ["A".to_string()]);
    assert_eq!(roots[0].test_blocks().len(), 1);
    assert_eq!(roots[0].test_blocks()[0].concat_name(":"), "A:x");
}

#[test]
fn test_registration_order_is_preserved() {
    let mut suite = Suite::new();
    suite
        .describe("A", |t| {
            t.it("first", noop())?;
            t.describe("B", |t| t.it("nested", noop()))?;
            t.it("second", noop())?;
            t.describe("C", |_| Ok(()))
        })
        .unwrap();
    suite.describe("D", |_| Ok(())).unwrap();

    let roots = suite.root_blocks();
    assert_eq!(roots.len(), 2);

    let a = &roots[0];
    let tests: Vec<String> = a.test_blocks().iter().map(|b| b.concat_name(":")).collect();
    assert_eq!(tests, vec!["A:first", "A:second"]);

    let children: Vec<String> = a
        .child_blocks()
        .iter()
        .map(|b| b.descriptor().concat_name(":"))
        .collect();
    assert_eq!(children, vec!["A:B", "A:C"]);
    assert_eq!(a.child_blocks()[0].test_blocks()[0].concat_name(" - "), "A - B - nested");
    assert_eq!(suite.runnable_count(), 3);
}

#[test]
fn test_hook_labels_and_kinds() {
    let mut suite = Suite::new();
    suite
        .describe("A", |t| {
            t.before(noop());
            t.after(noop());
            t.before(Body::future(|| async { Ok(()) }));
            Ok(())
        })
        .unwrap();

    let a = &suite.root_blocks()[0];
    let befores: Vec<String> = a.before_blocks().iter().map(|b| b.concat_name(":")).collect();
    assert_eq!(befores, vec!["A:before[0]", "A:before[1]"]);
    assert_eq!(a.before_blocks()[1].kind(), BlockKind::Before);
    assert_eq!(a.before_blocks()[1].body_kind(), Some(BodyKind::Awaitable));
    assert_eq!(a.after_blocks()[0].concat_name(":"), "A:after[0]");
    assert_eq!(a.after_blocks()[0].kind(), BlockKind::After);
}

#[test]
fn test_it_without_body_is_pending() {
    let mut suite = Suite::new();
    suite.describe("A", |t| t.it("todo", None)).unwrap();

    let test = &suite.root_blocks()[0].test_blocks()[0];
    assert!(test.is_disabled());
    assert!(!test.has_body());
}

#[test]
fn test_xit_discards_body() {
    let mut suite = Suite::new();
    suite.describe("A", |t| t.xit("skipped", noop())).unwrap();

    let test = &suite.root_blocks()[0].test_blocks()[0];
    assert!(test.is_disabled());
    assert!(!test.has_body());
}

#[test]
fn test_disabled_describe_disables_descendants() {
    let mut suite = Suite::new();
    suite
        .describe_with("A", DescribeOptions::new().disabled(), |t| {
            t.before(noop());
            t.it("x", noop())?;
            t.describe("B", |t| {
                t.after(noop());
                t.it("y", noop())
            })
        })
        .unwrap();

    let a = &suite.root_blocks()[0];
    assert!(a.is_disabled());
    assert!(a.before_blocks()[0].is_disabled());
    assert!(a.test_blocks()[0].is_disabled());

    let b = &a.child_blocks()[0];
    assert!(b.is_disabled());
    assert!(b.after_blocks()[0].is_disabled());
    assert!(!b.test_blocks()[0].has_body());
}

#[test]
fn test_xdescribe_still_collects_declarations() {
    let mut suite = Suite::new();
    suite
        .xdescribe("A", |t| {
            t.it("x", noop())?;
            t.it("y", noop())
        })
        .unwrap();

    let a = &suite.root_blocks()[0];
    assert!(a.is_disabled());
    assert_eq!(a.test_blocks().len(), 2);
    assert!(a.test_blocks().iter().all(|b| b.is_disabled()));
}

#[test]
fn test_describe_pending_has_no_content() {
    let mut suite = Suite::new();
    suite.describe_pending("Later").unwrap();

    let block = &suite.root_blocks()[0];
    assert!(block.is_disabled());
    assert_eq!(block.runnable_count(), 0);
}

#[test]
fn test_empty_xdescribe_matches_describe_pending() {
    let mut suite = Suite::new();
    suite.xdescribe("Skipped", |_| Ok(())).unwrap();
    suite.describe_pending("Later").unwrap();

    let roots = suite.root_blocks();
    for block in roots {
        assert!(block.is_disabled());
        assert_eq!(block.runnable_count(), 0);
        assert!(block.child_blocks().is_empty());
    }
}

#[test]
fn test_timeout_is_inherited_and_overridable() {
    let mut suite = Suite::new();
    suite
        .describe_with(
            "A",
            DescribeOptions::new().with_timeout(Duration::from_millis(250)),
            |t| {
                t.before(noop());
                t.it("inherits", noop())?;
                t.it("overrides", noop().with_timeout(Duration::from_millis(40)))?;
                t.describe("B", |t| t.it("deep", noop()))?;
                t.describe_with(
                    "C",
                    DescribeOptions::new().with_timeout(Duration::from_millis(900)),
                    |t| t.it("own", noop()),
                )
            },
        )
        .unwrap();

    let a = &suite.root_blocks()[0];
    let ms = |d: Option<Duration>| d.map(|d| d.as_millis() as u64);

    assert_eq!(ms(a.timeout()), Some(250));
    assert_eq!(ms(a.before_blocks()[0].timeout()), Some(250));
    assert_eq!(ms(a.test_blocks()[0].timeout()), Some(250));
    assert_eq!(ms(a.test_blocks()[1].timeout()), Some(40));
    assert_eq!(ms(a.child_blocks()[0].test_blocks()[0].timeout()), Some(250));
    assert_eq!(ms(a.child_blocks()[1].test_blocks()[0].timeout()), Some(900));
    assert_eq!(a.test_blocks()[1].descriptor().timeout_ms, Some(40));
}

#[test]
fn test_invalid_names_are_programmer_errors() {
    let mut suite = Suite::new();

    let err = suite.describe("", |_| Ok(())).unwrap_err();
    assert_eq!(
        err,
        ProgrammerError::InvalidArgument {
            function: "describe",
            position: ArgPosition::First,
            expected: "a non-empty string",
        }
    );

    let err = suite.describe("A", |t| t.it("", noop())).unwrap_err();
    assert_eq!(err.to_string(), "First argument to it() must be a non-empty string");
}

#[test]
fn test_run_twice_is_rejected_until_reset() {
    let mut suite = Suite::new();
    suite.describe("A", |t| t.it("x", noop())).unwrap();

    let run = suite.run(RunOptions::default()).unwrap();
    assert_eq!(run.roots().len(), 1);
    assert!(suite.has_run());
    assert!(suite.root_blocks().is_empty());

    let err = suite.run(RunOptions::default()).unwrap_err();
    assert_eq!(err, ProgrammerError::AlreadyRun);

    suite.reset();
    assert!(!suite.has_run());
    assert!(suite.run(RunOptions::default()).is_ok());
}

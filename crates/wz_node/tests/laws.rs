use pretty_assertions::assert_eq;
use proptest::prelude::*;

use wz_node::link::resolve_link;
use wz_node::path::resolve;
use wz_node::{diff, Container, DifferenceKind, LinkOutcome, Node, UnitPath, Vector2};

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        Just(Node::Null),
        any::<i16>().prop_map(Node::Int16),
        (0..4i32).prop_map(Node::Int32),
        "[a-z]{0,4}".prop_map(Node::String),
        (0..3i32, 0..3i32).prop_map(|(x, y)| Node::Vector2(Vector2::new(x, y))),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop::collection::vec(("[a-d]", inner), 0..5)
            .prop_map(|entries| Node::Container(entries.into_iter().collect::<Container>()))
    })
}

fn arb_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-d]", 0..5)
}

proptest! {
    #[test]
    fn resolving_a_path_composes(root in arb_node(), path in arb_path(), split in 0usize..5) {
        let split = split.min(path.len());
        let full = path.join("/");
        let (head, tail) = path.split_at(split);

        let direct = resolve(&root, &full);
        let stepwise = resolve(&root, &head.join("/")).and_then(|n| resolve(n, &tail.join("/")));

        prop_assert_eq!(direct, stepwise);
    }

    #[test]
    fn diff_is_symmetric(first in arb_node(), second in arb_node(), depth in 0usize..6) {
        let mut forward = diff(&first, &second, depth)
            .into_iter()
            .map(|d| d.swap())
            .collect::<Vec<_>>();
        let mut backward = diff(&second, &first, depth);

        forward.sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.to_string().cmp(&b.kind.to_string())));
        backward.sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.to_string().cmp(&b.kind.to_string())));

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn a_tree_never_differs_from_itself(root in arb_node()) {
        prop_assert!(diff(&root, &root, 20).is_empty());
    }
}

#[test]
fn link_to_sibling_of_parent() {
    let root: Node = Container::new()
        .with("hp", Node::Int32(100))
        .with(
            "skills",
            Container::new()
                .with("0", Node::Link("../hp".into()))
                .into(),
        )
        .into();

    let link = resolve(&root, "skills/0");
    assert_eq!(link, Some(&Node::Link("../hp".into())));

    let resolution = resolve_link(&root, &UnitPath::new("Skill", "000.img", "skills/0"));
    let outcome = resolution.map(|r| r.outcome);
    assert_eq!(outcome, Some(LinkOutcome::Resolved { path: "hp".into() }));
    assert_eq!(
        outcome.and_then(|o| o.target(&root).cloned()),
        Some(Node::Int32(100))
    );
}

#[test]
fn swapping_only_in_first() {
    let first: Node = Container::new().with("a", Node::Null).into();
    let second: Node = Container::new().into();

    let forward = diff(&first, &second, 1);
    let backward = diff(&second, &first, 1);

    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].kind, DifferenceKind::OnlyInFirst);
    assert_eq!(backward[0].kind, DifferenceKind::OnlyInSecond);
    assert_eq!(forward[0].clone().swap(), backward[0]);
}

//! Linear rebase scenarios: divergent edits to one file, identity,
//! unrelated histories, and determinism.

mod common;

use common::*;
use regraft::{rebase, RebaseOptions, RebaseOutcome};
use regraft_object::ObjectId;
use regraft_store::Repository;

const INITIAL: &str =
    "Hello world\n\nThis is the initial commit of the file\n\nWrapping up the file\n";
const MIDDLE_CHANGED: &str =
    "Hello world\n\nWe are modifying the middle of the file\n\nWrapping up the file\n";
const END_CHANGED: &str =
    "Hello world\n\nThis is the initial commit of the file\n\nWe are modifying the end of the file\n";
const BOTH_CHANGED: &str =
    "Hello world\n\nWe are modifying the middle of the file\n\nWe are modifying the end of the file\n";

fn completed(outcome: RebaseOutcome) -> ObjectId {
    match outcome {
        RebaseOutcome::Completed(id) => id,
        other => panic!("expected a completed rebase, got {other:?}"),
    }
}

/// Build the diverged history:
///
/// ```text
/// * main   (middle paragraph changed)
/// | * other (end paragraph changed)
/// |/
/// * base
/// ```
fn build(repo: &Repository) -> (ObjectId, ObjectId) {
    let mut tree = TestTree::new();
    tree.blob("hello_world.txt", INITIAL);
    let base = commit_tree(repo, &tree, "hello world: initial commit\n", vec![], 100);

    tree.blob("hello_world.txt", MIDDLE_CHANGED);
    let main = commit_tree(
        repo,
        &tree,
        "hello world: modifying the middle of the file\n",
        vec![base],
        200,
    );

    let mut tree = TestTree::new();
    tree.blob("hello_world.txt", END_CHANGED);
    let other = commit_tree(
        repo,
        &tree,
        "hello world: modifying the end of the file\n",
        vec![base],
        300,
    );

    (main, other)
}

#[test]
fn simple_linear_rebase_combines_both_edits() {
    let (_dir, repo) = create_repository();
    let (main, other) = build(&repo);

    let mut conflicts = Vec::new();
    let options = RebaseOptions::new(main, other);
    let result = completed(rebase(&repo, options, &mut conflicts).unwrap());

    assert!(conflicts.is_empty());
    assert_ne!(result, main);
    assert_ne!(result, other);
    assert_eq!(blob_text(&repo, &result, "hello_world.txt"), BOTH_CHANGED);

    let commit = repo.find_commit(&result).unwrap();
    assert_eq!(commit.parents, vec![main]);
}

#[test]
fn author_and_message_survive_committer_is_fresh() {
    let (_dir, repo) = create_repository();
    let (main, other) = build(&repo);

    let mut conflicts = Vec::new();
    let mut options = RebaseOptions::new(main, other);
    options.committer = Some(signature(9999));
    let result = completed(rebase(&repo, options, &mut conflicts).unwrap());

    let original = repo.find_commit(&other).unwrap();
    let rebased = repo.find_commit(&result).unwrap();
    assert_eq!(rebased.author, original.author);
    assert_eq!(rebased.message, original.message);
    assert_eq!(rebased.committer, signature(9999));
}

#[test]
fn rebasing_a_tip_onto_itself_returns_the_tip() {
    let (_dir, repo) = create_repository();
    let (main, _other) = build(&repo);

    let mut conflicts = Vec::new();
    let options = RebaseOptions::new(main, main);
    let result = completed(rebase(&repo, options, &mut conflicts).unwrap());
    assert_eq!(result, main);
    assert!(conflicts.is_empty());
}

#[test]
fn unrelated_histories_report_no_merge_base() {
    let (_dir, repo) = create_repository();

    let mut tree = TestTree::new();
    tree.blob("a.txt", "a\n");
    let one = commit_tree(&repo, &tree, "one\n", vec![], 100);

    let mut tree = TestTree::new();
    tree.blob("b.txt", "b\n");
    let two = commit_tree(&repo, &tree, "two\n", vec![], 200);

    let mut conflicts = Vec::new();
    let outcome = rebase(&repo, RebaseOptions::new(one, two), &mut conflicts).unwrap();
    assert!(matches!(outcome, RebaseOutcome::NoMergeBase));
    assert!(conflicts.is_empty());
}

#[test]
fn identical_inputs_produce_identical_commit_ids() {
    let (_dir, repo) = create_repository();
    let (main, other) = build(&repo);

    let mut run = || {
        let mut conflicts = Vec::new();
        let mut options = RebaseOptions::new(main, other);
        options.committer = Some(signature(7777));
        options.force_rebase = true;
        completed(rebase(&repo, options, &mut conflicts).unwrap())
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
}

#[test]
fn incompatible_edits_stop_with_a_conflict_record() {
    let (_dir, repo) = create_repository();

    let mut tree = TestTree::new();
    tree.blob("hello_world.txt", INITIAL);
    let base = commit_tree(&repo, &tree, "initial\n", vec![], 100);

    tree.blob("hello_world.txt", MIDDLE_CHANGED);
    let main = commit_tree(&repo, &tree, "middle one way\n", vec![base], 200);

    let mut other_tree = TestTree::new();
    other_tree.blob(
        "hello_world.txt",
        "Hello world\n\nThe middle changed incompatibly\n\nWrapping up the file\n",
    );
    let other = commit_tree(&repo, &other_tree, "middle another way\n", vec![base], 300);

    let mut conflicts = Vec::new();
    let outcome = rebase(&repo, RebaseOptions::new(main, other), &mut conflicts).unwrap();

    match outcome {
        RebaseOutcome::Conflicted {
            commit,
            commits_map,
        } => {
            assert_eq!(commit, other);
            assert_eq!(commits_map.get(&base), Some(&main));
        }
        other => panic!("expected conflicts, got {other:?}"),
    }
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].path, "hello_world.txt");
    assert!(conflicts[0].item.is_some());
}

#[test]
fn onto_overrides_the_planting_point() {
    // Rebasing other with upstream=main but onto=base replants the range
    // onto base: the result is equivalent to other itself, recreated.
    let (_dir, repo) = create_repository();
    let (main, other) = build(&repo);
    let base = repo.find_commit(&main).unwrap().parents[0];

    let mut conflicts = Vec::new();
    let mut options = RebaseOptions::new(main, other);
    options.onto = Some(base);
    let result = completed(rebase(&repo, options, &mut conflicts).unwrap());

    assert!(conflicts.is_empty());
    // Parents unchanged by the remap: the commit is reused as-is.
    assert_eq!(result, other);
}

//! The merge base of the rebased merge commit's parents moves during the
//! replay; its hand-made resolution must still survive, combined with the
//! deletions introduced below the new base.

mod common;

use common::*;
use regraft::{rebase, RebaseOptions, RebaseOutcome};

fn numbers(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[test]
fn moved_merge_base_keeps_the_hand_resolution() {
    let (_dir, repo) = create_repository();

    // root: lines 1..20
    let initial: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
    let initial: Vec<&str> = initial.iter().map(String::as_str).collect();
    let mut tree = TestTree::new();
    tree.blob("hello_world.txt", &numbers(&initial));
    let root = commit_tree(&repo, &tree, "hello world: numbers 1-20\n", vec![], 100);

    // main: 7=27, 8 gone, 9=29
    let mut main_tree = tree.clone();
    main_tree.blob(
        "hello_world.txt",
        &numbers(&[
            "1", "2", "3", "4", "5", "6", "27", "29", "10", "11", "12", "13", "14", "15",
            "16", "17", "18", "19", "20",
        ]),
    );
    let main1 = commit_tree(
        &repo,
        &main_tree,
        "hello world: 7=27, 8 is gone, 9=29\n",
        vec![root],
        200,
    );

    // A (from root): 16 gone, 17=37
    let mut a_tree = tree.clone();
    a_tree.blob(
        "hello_world.txt",
        &numbers(&[
            "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14",
            "15", "37", "18", "19", "20",
        ]),
    );
    let branch_a = commit_tree(&repo, &a_tree, "16 is gone, 17=37\n", vec![root], 300);

    // main again: 17 is gone — this clashes with A's edit.
    main_tree.blob(
        "hello_world.txt",
        &numbers(&[
            "1", "2", "3", "4", "5", "6", "27", "29", "10", "11", "12", "13", "14", "15",
            "16", "18", "19", "20",
        ]),
    );
    let main2 = commit_tree(&repo, &main_tree, "hello world: 17 is gone\n", vec![main1], 400);

    // The merge of main and A is resolved by hand.
    main_tree.blob(
        "hello_world.txt",
        &numbers(&[
            "1", "2", "3", "4", "5", "6", "27", "29", "10", "11", "12", "13", "14", "15",
            "16", "Something different", "18", "19", "20",
        ]),
    );
    let merge = commit_tree(
        &repo,
        &main_tree,
        "merging branch A\n",
        vec![main2, branch_a],
        500,
    );

    // B (from root): lines 2 and 3 removed.
    let mut b_tree = tree.clone();
    b_tree.blob(
        "hello_world.txt",
        &numbers(&[
            "1", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
            "17", "18", "19", "20",
        ]),
    );
    let branch_b = commit_tree(&repo, &b_tree, "Removed 2 and 3\n", vec![root], 600);

    let mut conflicts = Vec::new();
    let mut options = RebaseOptions::new(branch_b, merge);
    options.onto = Some(branch_b);
    let outcome = rebase(&repo, options, &mut conflicts).unwrap();

    let result = match outcome {
        RebaseOutcome::Completed(id) => id,
        other => panic!("expected a completed rebase, got {other:?}"),
    };
    assert!(conflicts.is_empty());
    assert_ne!(result, merge);
    assert_ne!(result, branch_b);

    let rebased = repo.find_commit(&result).unwrap();
    assert_eq!(rebased.parents.len(), 2);

    // B's deletions combined with main's whole edit sequence, with the
    // hand resolution intact.
    assert_eq!(
        blob_text(&repo, &result, "hello_world.txt"),
        numbers(&[
            "1", "4", "5", "6", "27", "29", "10", "11", "12", "13", "14", "15", "16",
            "Something different", "18", "19", "20",
        ])
    );
}

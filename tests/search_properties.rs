use cohesion_solver::engine::BoardState;
use cohesion_solver::heuristics::{multi_heuristic, Heuristic, TermKind};
use cohesion_solver::puzzles;
use cohesion_solver::solver::{
    a_star, bfs, greedy_search, weighted_a_star, SearchOptions, SearchOutcome,
};
use std::collections::HashSet;

fn seeded_boards() -> Vec<BoardState> {
    let mut boards = Vec::new();
    for seed in 0..12 {
        boards.push(BoardState::generate_random_with_seed(3, 3, 2.0, seed).unwrap());
        boards.push(BoardState::generate_random_with_seed(4, 4, 4.0, seed).unwrap());
    }
    boards
}

fn pieces_only() -> impl Heuristic {
    multi_heuristic(vec![TermKind::Pieces.term(1.0)])
}

fn solution_depth(outcome: &SearchOutcome) -> Option<usize> {
    outcome.solution().map(|node| node.depth())
}

fn assert_path_is_legal(outcome: &SearchOutcome) {
    let path = outcome.path();
    assert!(!path.is_empty());
    for pair in path.windows(2) {
        let children = pair[0].board().children();
        assert!(
            children.contains(pair[1].board()),
            "path step is not a single move:\n{}\n->\n{}",
            pair[0].board(),
            pair[1].board()
        );
        assert_eq!(pair[1].depth(), pair[0].depth() + 1);
    }
    let last = path.last().unwrap();
    assert!(last.board().is_win());
}

#[test]
fn random_boards_and_their_children_are_valid() {
    for board in seeded_boards() {
        assert_eq!(board.validate(), Ok(()));
        for child in board.children() {
            assert_eq!(child.validate(), Ok(()));
            assert!(child.num_pieces() >= child.num_colors());
            assert!(child.num_pieces() <= board.num_pieces());
            assert_eq!(child.num_colors(), board.num_colors());
            assert_eq!(child.is_win(), child.num_pieces() == child.num_colors());
        }
    }
}

#[test]
fn informed_searches_agree_with_bfs_on_solvability() {
    let heuristic = pieces_only();
    let weighted = multi_heuristic(vec![
        TermKind::Pieces.term(100.0),
        TermKind::Distance.term(1.0),
    ]);

    for board in seeded_boards() {
        let breadth = bfs(&board, SearchOptions::new());
        let best = a_star(&board, &heuristic, SearchOptions::new());
        let greedy = greedy_search(&board, &heuristic, SearchOptions::new());
        let fast = weighted_a_star(&board, &weighted, 1.5, SearchOptions::new()).unwrap();

        assert_eq!(breadth.is_solved(), best.is_solved(), "board:\n{}", board);
        assert_eq!(breadth.is_solved(), greedy.is_solved(), "board:\n{}", board);
        assert_eq!(breadth.is_solved(), fast.is_solved(), "board:\n{}", board);

        if let Some(shortest) = solution_depth(&breadth) {
            for outcome in [&best, &greedy, &fast] {
                assert!(solution_depth(outcome).unwrap() >= shortest);
                assert_path_is_legal(outcome);
            }
            assert_path_is_legal(&breadth);
        }
    }
}

#[test]
fn a_star_on_pieces_alone_can_miss_the_shortest_solution() {
    // Dense boards allow a single move to join three reds.
    let board = BoardState::generate_random_with_seed(4, 4, 1.6, 181).unwrap();
    assert_eq!(board, BoardState::from_text(".R..\nR.GY\n..RG\nYB..").unwrap());

    let shortest = solution_depth(&bfs(&board, SearchOptions::new())).unwrap();
    let outcome = a_star(&board, &pieces_only(), SearchOptions::new());
    assert_eq!(shortest, 7);
    assert!(solution_depth(&outcome).unwrap() > shortest);
    assert_path_is_legal(&outcome);
}

#[test]
fn easy_preset_is_solved_by_bfs() {
    let board = puzzles::by_name("easy_1").unwrap();
    let outcome = bfs(&board, SearchOptions::new());
    assert!(outcome.is_solved());
    assert_path_is_legal(&outcome);
    assert!(outcome.stats.expanded >= 1);
    assert!(outcome.stats.visited <= outcome.stats.generated);
}

#[test]
fn equal_layouts_deduplicate() {
    let text = "
        R.G
        ...
        G.R
    ";
    let first: BoardState = text.parse().unwrap();
    let second = BoardState::from_text(text).unwrap();

    let mut seen = HashSet::new();
    assert!(seen.insert(first));
    assert!(!seen.insert(second));
}

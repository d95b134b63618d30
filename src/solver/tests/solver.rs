use kilominx_core::moves::parse_sequence;
use kilominx_core::{KilominxState, validate};
use solver::{SolveError, Solution, SolverConfig, Stage, solve};

/// Replaying a solution against its input must land on the solved state,
/// and the stage slices must tile the whole sequence.
fn assert_solves(input: &KilominxState, solution: &Solution) {
    assert!(input.after(solution.moves()).is_solved());
    let tiled: Vec<_> = [
        Stage::Centers,
        Stage::EdgePairing,
        Stage::Reduction,
        Stage::Verification,
    ]
    .into_iter()
    .flat_map(|stage| solution.stage_moves(stage).iter().copied())
    .collect();
    assert_eq!(tiled, solution.moves());
}

#[test]
fn solved_state_needs_no_moves() {
    let solution = solve(&KilominxState::solved(), &SolverConfig::default()).unwrap();
    assert!(solution.is_empty());
}

#[test_log::test]
fn face_turn_scramble_round_trips() {
    let scramble =
        parse_sequence("F U2 R' B L BD2' U BR D2 UL' F2 B2' UR' L2 BU2 D BL' UR2 R2 BD").unwrap();
    assert_eq!(scramble.len(), 20);
    let scrambled = KilominxState::solved().after(&scramble);
    let state = validate(scrambled.facelets()).expect("a scrambled puzzle is reachable");
    let solution = solve(&state, &SolverConfig::default()).unwrap();
    assert_solves(&state, &solution);
    assert!(
        solution.len() <= 1500,
        "a 20 move scramble should not need {} moves",
        solution.len()
    );
}

#[test_log::test]
fn slice_scramble_round_trips_deterministically() {
    let scramble = parse_sequence(
        "F U2 R' Bs L BD2' Us BR D2 UL' Fs2 B UR' Ls2' BU2 D BL' URs R2 Bs2'",
    )
    .unwrap();
    assert_eq!(scramble.len(), 20);
    let scrambled = KilominxState::solved().after(&scramble);
    let state = validate(scrambled.facelets()).expect("a scrambled puzzle is reachable");
    let solution = solve(&state, &SolverConfig::default()).unwrap();
    assert_solves(&state, &solution);
    assert!(solution.len() <= 1500);

    let again = solve(&state, &SolverConfig::default()).unwrap();
    assert_eq!(again, solution);
}

#[test]
fn a_cancelled_token_stops_the_solve() {
    let scrambled = KilominxState::solved().after(&parse_sequence("F Us R'").unwrap());
    let config = SolverConfig::default();
    config.cancel.cancel();
    assert_eq!(
        solve(&scrambled, &config),
        Err(SolveError::Cancelled)
    );
}

#[test]
fn an_empty_node_budget_names_the_stage() {
    let scrambled = KilominxState::solved().after(&parse_sequence("F Us R'").unwrap());
    let config = SolverConfig {
        max_search_nodes: 0,
        ..SolverConfig::default()
    };
    assert_eq!(
        solve(&scrambled, &config),
        Err(SolveError::SolverTimeout {
            stage: Stage::Centers
        })
    );
}

#[test]
fn solution_tokens_mirror_the_moves() {
    let scrambled = KilominxState::solved().after(&parse_sequence("F U2 R' BL BD2'").unwrap());
    let solution = solve(&scrambled, &SolverConfig::default()).unwrap();
    let from_tokens: Vec<_> = solution
        .tokens()
        .into_iter()
        .map(kilominx_core::Move::from_token)
        .collect();
    assert_eq!(from_tokens, solution.moves());
}

//! Turns solver move tokens into human-readable instructions.
//!
//! The solver emits structured move tokens; collaborators display one
//! instruction line per token and export the same lines as flat text.
//! Scripts — whitespace-separated move notation with `#` comments — parse
//! back into moves with the comments preserved, so an exported solution
//! with its stage banners survives a round trip.

use itertools::Itertools;
use kilominx_core::moves::{Direction, Layer, MoveToken, ParseMoveError};
use kilominx_core::Move;

/// One item of a solution script: a move or a comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem {
    Move(Move),
    Comment(String),
}

/// The instruction for one move token, e.g. `Turn the Front face 144°
/// counter-clockwise`.
#[must_use]
pub fn instruction(token: MoveToken) -> String {
    let degrees = u16::from(token.rotation_amount) * 72;
    let direction = match token.direction {
        Direction::Clockwise => "clockwise",
        Direction::CounterClockwise => "counter-clockwise",
    };
    match token.layer {
        Layer::Outer => format!(
            "Turn the {} face {degrees}\u{b0} {direction}",
            token.face.long_name()
        ),
        Layer::Slice => format!(
            "Turn the inner layer under the {} face {degrees}\u{b0} {direction}",
            token.face.long_name()
        ),
    }
}

/// One instruction line per move, in order.
#[must_use]
pub fn narrate(moves: &[Move]) -> Vec<String> {
    moves.iter().map(|mv| instruction(mv.token())).collect()
}

/// Render a script as flat text: one instruction per line, comments as
/// `# `-prefixed lines.
#[must_use]
pub fn render(items: &[ScriptItem]) -> String {
    let mut text = items
        .iter()
        .map(|item| match item {
            ScriptItem::Move(mv) => instruction(mv.token()),
            ScriptItem::Comment(comment) => format!("# {comment}"),
        })
        .join("\n");
    text.push('\n');
    text
}

/// Parse a script of whitespace-separated move tokens. A `#` starts a
/// comment running to the end of the line; comments come back as items in
/// reading order rather than being dropped.
///
/// # Errors
///
/// On the first token that is not a move.
pub fn parse_script(text: &str) -> Result<Vec<ScriptItem>, ParseMoveError> {
    let mut items = Vec::new();
    for line in text.lines() {
        let (algorithm, comment) = match line.split_once('#') {
            Some((algorithm, comment)) => (algorithm, Some(comment)),
            None => (line, None),
        };
        for token in algorithm.split_whitespace() {
            items.push(ScriptItem::Move(token.parse()?));
        }
        if let Some(comment) = comment {
            items.push(ScriptItem::Comment(comment.trim().to_owned()));
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::{ScriptItem, instruction, narrate, parse_script, render};
    use kilominx_core::Move;
    use kilominx_core::moves::parse_sequence;

    #[test]
    fn instructions_name_the_face_and_angle() {
        let turn: Move = "F2'".parse().unwrap();
        assert_eq!(
            instruction(turn.token()),
            "Turn the Front face 144\u{b0} counter-clockwise"
        );
        let slice: Move = "Rs".parse().unwrap();
        assert_eq!(
            instruction(slice.token()),
            "Turn the inner layer under the Right face 72\u{b0} clockwise"
        );
    }

    #[test]
    fn every_move_gets_a_distinct_instruction() {
        let mut seen = std::collections::HashSet::new();
        for mv in Move::all() {
            assert!(seen.insert(instruction(mv.token())), "duplicate for {mv}");
        }
    }

    #[test]
    fn narration_is_one_line_per_move() {
        let moves = parse_sequence("F U2 Rs' BL2'").unwrap();
        let lines = narrate(&moves);
        assert_eq!(lines.len(), moves.len());
        assert!(lines[2].contains("inner layer under the Right face"));
    }

    #[test]
    fn scripts_round_trip_with_comments() {
        let text = "# pair the edges\nF U2 # setup\nRs'\n";
        let items = parse_script(text).unwrap();
        assert_eq!(
            items,
            vec![
                ScriptItem::Comment("pair the edges".to_owned()),
                ScriptItem::Move("F".parse().unwrap()),
                ScriptItem::Move("U2".parse().unwrap()),
                ScriptItem::Comment("setup".to_owned()),
                ScriptItem::Move("Rs'".parse().unwrap()),
            ]
        );
        let rendered = render(&items);
        assert!(rendered.starts_with("# pair the edges\n"));
        assert!(rendered.ends_with("\n"));
        assert_eq!(rendered.lines().count(), items.len());
    }

    #[test]
    fn bad_tokens_are_rejected() {
        assert!(parse_script("F X2").is_err());
    }
}

use crate::pos::Pos;
use crate::session::Snapshot;
use crate::snake::Dir;

const APPLE: char = '●';
const BODY: char = 'o';
const EMPTY: char = '·';

fn head_glyph(dir: Dir) -> char {
    match dir {
        Dir::Up => '▲',
        Dir::Down => '▼',
        Dir::Left => '◄',
        Dir::Right => '►',
    }
}

/// Render a snapshot as lines of text: a status header, the framed board and
/// the counters.
pub fn render(snap: &Snapshot) -> Vec<String> {
    let mut lines = Vec::with_capacity(snap.length + 5);

    let status = if snap.paused { "PAUSED" } else { "RUNNING" };
    lines.push(format!(
        "Generation {}  |  Snake {}/{}  |  {}",
        snap.generation, snap.individual, snap.population, status
    ));

    lines.push(format!("╔{}╗", "═".repeat(snap.length)));
    for y in 0..snap.length as i32 {
        let mut row = String::from("║");
        for x in 0..snap.length as i32 {
            row.push(cell_glyph(snap, Pos::new(x, y)));
        }
        row.push('║');
        lines.push(row);
    }
    lines.push(format!("╚{}╝", "═".repeat(snap.length)));

    lines.push(format!(
        "Length: {}  |  Food: {}  |  Score: {}  |  Health: {}",
        snap.segments.len(),
        snap.food_eaten,
        snap.score,
        snap.health
    ));
    lines
}

fn cell_glyph(snap: &Snapshot, p: Pos) -> char {
    if snap.segments.first() == Some(&p) {
        head_glyph(snap.heading)
    } else if snap.segments.contains(&p) {
        BODY
    } else if snap.apple == Some(p) {
        APPLE
    } else {
        EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            length: 4,
            cells: vec![false; 16],
            segments: vec![Pos::new(1, 1), Pos::new(1, 2)],
            heading: Dir::Up,
            apple: Some(Pos::new(3, 0)),
            generation: 2,
            individual: 5,
            population: 45,
            score: 1,
            health: 4,
            food_eaten: 0,
            paused: false,
        }
    }

    #[test]
    fn test_render_board() {
        let lines = render(&snapshot());
        assert_eq!(lines.len(), 4 + 4);
        assert_eq!(lines[0], "Generation 2  |  Snake 5/45  |  RUNNING");
        assert_eq!(lines[1], "╔════╗");
        assert_eq!(lines[2], "║···●║");
        assert_eq!(lines[3], "║·▲··║");
        assert_eq!(lines[4], "║·o··║");
        assert_eq!(lines[6], "╚════╝");
    }

    #[test]
    fn test_render_paused_and_counters() {
        let mut snap = snapshot();
        snap.paused = true;
        let lines = render(&snap);
        assert!(lines[0].ends_with("PAUSED"));
        assert_eq!(
            lines[7],
            "Length: 2  |  Food: 0  |  Score: 1  |  Health: 4"
        );
    }
}

//! The static geometry of the Master Kilominx.
//!
//! Everything here is derived once from [`NEIGHBORS`] and kept behind a
//! process-wide [`LazyLock`]: the facelet index scheme, the piece slot
//! tables, and the facelet permutation table for every move. A malformed
//! table is a programming fault, so construction asserts its own
//! consistency and panics at startup rather than surfacing errors.
//!
//! Facelets are indexed `face * 20 + local`, with local positions arranged
//! in rings of five: `0..5` corner stickers, `5..10` outer wing stickers,
//! `10..15` inner wing stickers, `15..20` center petals. Side `s` of a face
//! borders `NEIGHBORS[face][s]`; corner sticker `s` sits on the vertex
//! between sides `s - 1` and `s`; the outer wing sticker of side `s` sits at
//! the sticker-`s` end of that side and the inner wing sticker at the other
//! end.

use crate::faces::{ColorLabel, Face, NEIGHBORS};
use crate::moves::{Layer, Move};
use std::sync::LazyLock;

pub const FACE_COUNT: usize = 12;
pub const SIDES: usize = 5;
pub const FACELETS_PER_FACE: usize = 20;
pub const FACELET_COUNT: usize = FACE_COUNT * FACELETS_PER_FACE;
pub const FACELETS_PER_COLOR: usize = FACELET_COUNT / 12;

pub const CORNER_RING: usize = 0;
pub const OUTER_WING_RING: usize = 5;
pub const INNER_WING_RING: usize = 10;
pub const PETAL_RING: usize = 15;

pub const CORNER_SLOTS: usize = 20;
pub const WING_SLOTS: usize = 60;
pub const EDGE_SLOTS: usize = 30;

/// Global facelet index of a local position on a face.
#[must_use]
pub fn facelet(face: Face, local: usize) -> usize {
    debug_assert!(local < FACELETS_PER_FACE);
    face.index() * FACELETS_PER_FACE + local
}

/// The face a facelet index belongs to.
#[must_use]
pub fn face_of_facelet(index: usize) -> Face {
    Face::from_index(index / FACELETS_PER_FACE)
}

/// A corner position: three corner stickers on three faces meeting at a
/// vertex, listed clockwise viewed from outside the vertex.
#[derive(Debug, Clone)]
pub struct CornerSlot {
    pub faces: [Face; 3],
    pub stickers: [usize; 3],
}

/// A wing position: the outer wing sticker on one face paired with the
/// inner wing sticker on the adjacent face. Move tables keep outer stickers
/// on outer positions and inner on inner, so a wing has no orientation of
/// its own and is identified by its ordered face pair.
#[derive(Debug, Clone)]
pub struct WingSlot {
    pub faces: (Face, Face),
    pub outer: usize,
    pub inner: usize,
}

/// One dodecahedron edge: the two wing slots that must hold sibling wings
/// for the edge to count as paired.
#[derive(Debug, Clone)]
pub struct EdgeSlot {
    pub faces: (Face, Face),
    pub wings: [usize; 2],
}

const NO_SLOT: u8 = u8::MAX;
const MOVE_TABLES: usize = FACE_COUNT * 2 * 4;

pub struct Topology {
    corners: Box<[CornerSlot]>,
    wings: Box<[WingSlot]>,
    edges: Box<[EdgeSlot]>,
    edge_of_wing: [usize; WING_SLOTS],
    slice_axis_of_wing: [Face; WING_SLOTS],
    corner_by_faces: Box<[u8]>,
    wing_by_faces: [u8; FACE_COUNT * FACE_COUNT],
    move_tables: Box<[[u16; FACELET_COUNT]]>,
    solved: [ColorLabel; FACELET_COUNT],
}

static TOPOLOGY: LazyLock<Topology> = LazyLock::new(Topology::build);

/// The process-wide, read-only puzzle topology.
pub fn topology() -> &'static Topology {
    &TOPOLOGY
}

fn identity_table() -> [u16; FACELET_COUNT] {
    let mut table = [0; FACELET_COUNT];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = i as u16;
    }
    table
}

/// `a` then `b`, in destination form: `combined[i] = b[a[i]]`.
fn compose_tables(a: &[u16; FACELET_COUNT], b: &[u16; FACELET_COUNT]) -> [u16; FACELET_COUNT] {
    let mut combined = [0; FACELET_COUNT];
    for i in 0..FACELET_COUNT {
        combined[i] = b[a[i] as usize];
    }
    combined
}

/// One clockwise click of the outer layer of `face`: the face's four rings
/// rotate one side, and on each neighbor the bordering strip (two corner
/// stickers and both wing stickers of that side) carries to the next
/// neighbor.
fn outer_click(face: Face) -> [u16; FACELET_COUNT] {
    let mut t = identity_table();
    let ring = face.neighbors();
    for s in 0..SIDES {
        let sn = (s + 1) % SIDES;
        for base in [CORNER_RING, OUTER_WING_RING, INNER_WING_RING, PETAL_RING] {
            t[facelet(face, base + s)] = facelet(face, base + sn) as u16;
        }
        let g = ring[s];
        let gn = ring[sn];
        let a = g.side_facing(face);
        let an = gn.side_facing(face);
        t[facelet(g, CORNER_RING + a)] = facelet(gn, CORNER_RING + an) as u16;
        t[facelet(g, CORNER_RING + (a + 1) % SIDES)] =
            facelet(gn, CORNER_RING + (an + 1) % SIDES) as u16;
        t[facelet(g, OUTER_WING_RING + a)] = facelet(gn, OUTER_WING_RING + an) as u16;
        t[facelet(g, INNER_WING_RING + a)] = facelet(gn, INNER_WING_RING + an) as u16;
    }
    t
}

/// One clockwise click of the inner slice under `face`: the ring of five
/// wings on the edges between consecutive neighbors of `face` (the wing of
/// each such edge nearer to `face`) cycles one step. Center petals are
/// pinned to their faces in this model, so a slice touches wings only.
fn slice_click(face: Face) -> [u16; FACELET_COUNT] {
    let mut t = identity_table();
    let ring = face.neighbors();
    for s in 0..SIDES {
        let g = ring[s];
        let gn = ring[(s + 1) % SIDES];
        let a = g.side_facing(face);
        let an = gn.side_facing(face);
        t[facelet(g, INNER_WING_RING + (a + 4) % SIDES)] =
            facelet(gn, INNER_WING_RING + (an + 4) % SIDES) as u16;
        t[facelet(g, OUTER_WING_RING + (a + 1) % SIDES)] =
            facelet(gn, OUTER_WING_RING + (an + 1) % SIDES) as u16;
    }
    t
}

fn move_table_index(mv: Move) -> usize {
    let layer = match mv.layer() {
        Layer::Outer => 0,
        Layer::Slice => 1,
    };
    (mv.face().index() * 2 + layer) * 4 + (mv.clicks() as usize - 1)
}

impl Topology {
    fn build() -> Topology {
        let mut corners = Vec::with_capacity(CORNER_SLOTS);
        let mut corner_by_faces = vec![NO_SLOT; FACE_COUNT * FACE_COUNT * FACE_COUNT];
        for face in Face::ALL {
            for s in 0..SIDES {
                let g = face.neighbors()[(s + 4) % SIDES];
                let h = face.neighbors()[s];
                if face.index() > g.index() || face.index() > h.index() {
                    continue;
                }
                let slot = CornerSlot {
                    faces: [face, g, h],
                    stickers: [
                        facelet(face, CORNER_RING + s),
                        facelet(g, CORNER_RING + g.side_facing(face)),
                        facelet(h, CORNER_RING + h.side_facing(g)),
                    ],
                };
                let mut key = [face.index(), g.index(), h.index()];
                key.sort_unstable();
                let flat = (key[0] * FACE_COUNT + key[1]) * FACE_COUNT + key[2];
                assert_eq!(corner_by_faces[flat], NO_SLOT, "vertex listed twice");
                corner_by_faces[flat] = corners.len() as u8;
                corners.push(slot);
            }
        }
        assert_eq!(corners.len(), CORNER_SLOTS);

        let mut wings = Vec::with_capacity(WING_SLOTS);
        let mut wing_by_faces = [NO_SLOT; FACE_COUNT * FACE_COUNT];
        for face in Face::ALL {
            for s in 0..SIDES {
                let q = face.neighbors()[s];
                wing_by_faces[face.index() * FACE_COUNT + q.index()] = wings.len() as u8;
                wings.push(WingSlot {
                    faces: (face, q),
                    outer: facelet(face, OUTER_WING_RING + s),
                    inner: facelet(q, INNER_WING_RING + q.side_facing(face)),
                });
            }
        }
        assert_eq!(wings.len(), WING_SLOTS);

        let mut edges = Vec::with_capacity(EDGE_SLOTS);
        let mut edge_of_wing = [0; WING_SLOTS];
        for face in Face::ALL {
            for &q in face.neighbors() {
                if face.index() > q.index() {
                    continue;
                }
                let forward = wing_by_faces[face.index() * FACE_COUNT + q.index()] as usize;
                let backward = wing_by_faces[q.index() * FACE_COUNT + face.index()] as usize;
                edge_of_wing[forward] = edges.len();
                edge_of_wing[backward] = edges.len();
                edges.push(EdgeSlot {
                    faces: (face, q),
                    wings: [forward, backward],
                });
            }
        }
        assert_eq!(edges.len(), EDGE_SLOTS);

        // The wing slot (p, q) is carried by exactly one slice: the one
        // whose axis is the third face of the vertex where q precedes p.
        let mut slice_axis_of_wing = [Face::F; WING_SLOTS];
        for (wing_index, wing) in wings.iter().enumerate() {
            let (p, q) = wing.faces;
            let mut axis = None;
            for candidate in Face::ALL {
                let ring = candidate.neighbors();
                for s in 0..SIDES {
                    if ring[s] == q && ring[(s + 1) % SIDES] == p {
                        assert!(axis.is_none(), "wing carried by two slices");
                        axis = Some(candidate);
                    }
                }
            }
            slice_axis_of_wing[wing_index] = axis.expect("wing not on any slice ring");
        }

        let mut move_tables = vec![identity_table(); MOVE_TABLES].into_boxed_slice();
        for face in Face::ALL {
            for (layer, click) in [
                (Layer::Outer, outer_click(face)),
                (Layer::Slice, slice_click(face)),
            ] {
                let mut acc = click;
                for clicks in 1..=4 {
                    move_tables[move_table_index(Move::new(face, layer, clicks))] = acc;
                    acc = compose_tables(&acc, &click);
                }
                // Five clicks must close the loop.
                assert_eq!(acc, identity_table(), "click of {face} has order != 5");
            }
        }

        let mut solved = [ColorLabel::White; FACELET_COUNT];
        for (i, color) in solved.iter_mut().enumerate() {
            *color = ColorLabel::from_index(i / FACELETS_PER_FACE);
        }

        let topology = Topology {
            corners: corners.into_boxed_slice(),
            wings: wings.into_boxed_slice(),
            edges: edges.into_boxed_slice(),
            edge_of_wing,
            slice_axis_of_wing,
            corner_by_faces: corner_by_faces.into_boxed_slice(),
            wing_by_faces,
            move_tables,
            solved,
        };
        topology.verify();
        topology
    }

    /// Structural self-checks, run once at startup. A failure here means the
    /// seed adjacency table does not describe a twisty puzzle, which is not
    /// recoverable.
    fn verify(&self) {
        for table in self.move_tables.iter() {
            let mut seen = [false; FACELET_COUNT];
            for &dest in table {
                assert!(!seen[dest as usize], "move table is not a permutation");
                seen[dest as usize] = true;
            }
        }

        // Every move must map pieces onto piece slots, never split one.
        for table in self.move_tables.iter() {
            for slot in self.corners.iter() {
                let image: Vec<usize> = slot
                    .stickers
                    .iter()
                    .map(|&s| table[s] as usize)
                    .collect();
                let mut key: Vec<usize> = image
                    .iter()
                    .map(|&s| face_of_facelet(s).index())
                    .collect();
                key.sort_unstable();
                let flat = (key[0] * FACE_COUNT + key[1]) * FACE_COUNT + key[2];
                let target = self.corner_by_faces[flat];
                assert_ne!(target, NO_SLOT, "corner stickers scattered by a move");
                let target = &self.corners[target as usize];
                // The image must be a cyclic rotation of the target slot's
                // sticker list; a reversal would mean a mirrored twist.
                let rotation = (0..3).find(|&r| {
                    (0..3).all(|j| image[j] == target.stickers[(j + r) % 3])
                });
                assert!(rotation.is_some(), "corner arrived mirrored");
            }
            for slot in self.wings.iter() {
                let outer_to = table[slot.outer] as usize;
                let inner_to = table[slot.inner] as usize;
                let target = self
                    .wings
                    .iter()
                    .find(|w| w.outer == outer_to)
                    .expect("outer wing sticker left the outer ring");
                assert_eq!(target.inner, inner_to, "wing stickers scattered by a move");
            }
            // Petals never change face.
            for i in 0..FACELET_COUNT {
                if i % FACELETS_PER_FACE >= PETAL_RING {
                    assert_eq!(face_of_facelet(table[i] as usize), face_of_facelet(i));
                }
            }
        }
    }

    #[must_use]
    pub fn corners(&self) -> &[CornerSlot] {
        &self.corners
    }

    #[must_use]
    pub fn wings(&self) -> &[WingSlot] {
        &self.wings
    }

    #[must_use]
    pub fn edges(&self) -> &[EdgeSlot] {
        &self.edges
    }

    /// The edge a wing slot belongs to.
    #[must_use]
    pub fn edge_of_wing(&self, wing: usize) -> usize {
        self.edge_of_wing[wing]
    }

    /// The face whose slice move carries the given wing slot.
    #[must_use]
    pub fn slice_axis_of_wing(&self, wing: usize) -> Face {
        self.slice_axis_of_wing[wing]
    }

    /// Corner slot holding exactly this set of faces, if the three faces
    /// meet at a vertex.
    #[must_use]
    pub fn corner_slot_by_faces(&self, faces: [Face; 3]) -> Option<usize> {
        let mut key = faces.map(Face::index);
        key.sort_unstable();
        let flat = (key[0] * FACE_COUNT + key[1]) * FACE_COUNT + key[2];
        match self.corner_by_faces[flat] {
            NO_SLOT => None,
            slot => Some(slot as usize),
        }
    }

    /// Wing slot whose outer sticker is on `outer` and inner sticker on
    /// `inner`, if the faces are adjacent.
    #[must_use]
    pub fn wing_slot_by_faces(&self, outer: Face, inner: Face) -> Option<usize> {
        match self.wing_by_faces[outer.index() * FACE_COUNT + inner.index()] {
            NO_SLOT => None,
            slot => Some(slot as usize),
        }
    }

    /// The precomputed facelet permutation of a move, in destination form:
    /// the sticker at `i` moves to `table[i]`.
    #[must_use]
    pub fn move_table(&self, mv: Move) -> &[u16; FACELET_COUNT] {
        &self.move_tables[move_table_index(mv)]
    }

    /// Facelet colors of the canonical solved state.
    #[must_use]
    pub fn solved_colors(&self) -> &[ColorLabel; FACELET_COUNT] {
        &self.solved
    }
}

#[cfg(test)]
mod tests {
    use super::{facelet, topology, OUTER_WING_RING, PETAL_RING};
    use crate::faces::Face;
    use crate::moves::{Layer, Move};

    #[test]
    fn builds_and_counts_pieces() {
        let topo = topology();
        assert_eq!(topo.corners().len(), 20);
        assert_eq!(topo.wings().len(), 60);
        assert_eq!(topo.edges().len(), 30);
    }

    #[test]
    fn wing_slots_pair_up_into_edges() {
        let topo = topology();
        for edge in topo.edges() {
            let forward = &topo.wings()[edge.wings[0]];
            let backward = &topo.wings()[edge.wings[1]];
            assert_eq!(forward.faces.0, backward.faces.1);
            assert_eq!(forward.faces.1, backward.faces.0);
        }
    }

    #[test]
    fn known_corner_slot() {
        let topo = topology();
        let slot = topo
            .corner_slot_by_faces([Face::F, Face::R, Face::U])
            .expect("F, R and U meet at a vertex");
        let faces = topo.corners()[slot].faces;
        assert!(faces.contains(&Face::F));
        assert!(faces.contains(&Face::R));
        assert!(faces.contains(&Face::U));
        assert!(
            topo.corner_slot_by_faces([Face::F, Face::B, Face::U])
                .is_none(),
            "F and B are not adjacent"
        );
    }

    #[test]
    fn outer_twist_rotates_own_face() {
        let topo = topology();
        let table = topo.move_table(Move::new(Face::F, Layer::Outer, 1));
        assert_eq!(
            table[facelet(Face::F, OUTER_WING_RING)] as usize,
            facelet(Face::F, OUTER_WING_RING + 1)
        );
        assert_eq!(
            table[facelet(Face::F, PETAL_RING + 4)] as usize,
            facelet(Face::F, PETAL_RING)
        );
    }

    #[test]
    fn slice_leaves_the_axis_face_alone() {
        let topo = topology();
        let table = topo.move_table(Move::new(Face::U, Layer::Slice, 1));
        for local in 0..20 {
            let i = facelet(Face::U, local);
            assert_eq!(table[i] as usize, i);
        }
        // A slice moves exactly ten stickers.
        let moved = table
            .iter()
            .enumerate()
            .filter(|&(i, &d)| i != d as usize)
            .count();
        assert_eq!(moved, 10);
    }
}

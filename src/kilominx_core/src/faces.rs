//! Face and color identities, plus the static dodecahedron adjacency.

use std::fmt;

/// One of the 12 pentagonal faces of the puzzle, named the way the move
/// notation names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Face {
    F = 0,
    U = 1,
    R = 2,
    D = 3,
    L = 4,
    Br = 5,
    Bl = 6,
    Bu = 7,
    Bd = 8,
    B = 9,
    Ul = 10,
    Ur = 11,
}

/// A sticker color from the fixed 12-color palette. In the canonical solved
/// state, face `i` carries color `i`; arbitrary center-to-color assignments
/// are still accepted by the validator as long as centers stay unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ColorLabel {
    White = 0,
    Yellow = 1,
    Red = 2,
    Orange = 3,
    Green = 4,
    Blue = 5,
    Purple = 6,
    Pink = 7,
    LightBlue = 8,
    LightGreen = 9,
    Brown = 10,
    Gray = 11,
}

/// The five neighbors of every face, in clockwise order viewed from outside
/// that face. Every move table is derived from this one table, so its cyclic
/// orders must describe a consistently oriented dodecahedron: consecutive
/// neighbors in any row are themselves adjacent, and each vertex appears as a
/// consistent 3-cycle from all three of its faces.
pub const NEIGHBORS: [[Face; 5]; 12] = {
    use Face::{B, Bd, Bl, Br, Bu, D, F, L, R, U, Ul, Ur};
    [
        [R, U, L, Bd, Bu],  // F
        [F, R, Br, Bl, L],  // U
        [Br, U, F, Bu, Ur], // R
        [Ul, B, Ur, Bu, Bd], // D
        [F, U, Bl, Ul, Bd], // L
        [Bl, U, R, Ur, B],  // BR
        [L, U, Br, B, Ul],  // BL
        [Ur, R, F, Bd, D],  // BU
        [Bu, F, L, Ul, D],  // BD
        [Ul, Bl, Br, Ur, D], // B
        [Bd, L, Bl, B, D],  // UL
        [B, Br, R, Bu, D],  // UR
    ]
};

static FACE_BY_NAME: phf::Map<&'static str, Face> = phf::phf_map! {
    "F" => Face::F,
    "U" => Face::U,
    "R" => Face::R,
    "D" => Face::D,
    "L" => Face::L,
    "BR" => Face::Br,
    "BL" => Face::Bl,
    "BU" => Face::Bu,
    "BD" => Face::Bd,
    "B" => Face::B,
    "UL" => Face::Ul,
    "UR" => Face::Ur,
};

static COLOR_BY_NAME: phf::Map<&'static str, ColorLabel> = phf::phf_map! {
    "white" => ColorLabel::White,
    "yellow" => ColorLabel::Yellow,
    "red" => ColorLabel::Red,
    "orange" => ColorLabel::Orange,
    "green" => ColorLabel::Green,
    "blue" => ColorLabel::Blue,
    "purple" => ColorLabel::Purple,
    "pink" => ColorLabel::Pink,
    "lightblue" => ColorLabel::LightBlue,
    "lightgreen" => ColorLabel::LightGreen,
    "brown" => ColorLabel::Brown,
    "gray" => ColorLabel::Gray,
};

impl Face {
    pub const ALL: [Face; 12] = {
        use Face::{B, Bd, Bl, Br, Bu, D, F, L, R, U, Ul, Ur};
        [F, U, R, D, L, Br, Bl, Bu, Bd, B, Ul, Ur]
    };

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// # Panics
    ///
    /// If `index` is not below 12.
    #[must_use]
    pub fn from_index(index: usize) -> Face {
        Face::ALL[index]
    }

    /// The five adjacent faces, clockwise viewed from outside this face.
    #[must_use]
    pub fn neighbors(self) -> &'static [Face; 5] {
        &NEIGHBORS[self.index()]
    }

    /// The side of `self` that borders `other`, as an index into
    /// [`Face::neighbors`].
    ///
    /// # Panics
    ///
    /// If the faces are not adjacent.
    #[must_use]
    pub fn side_facing(self, other: Face) -> usize {
        self.neighbors()
            .iter()
            .position(|&n| n == other)
            .expect("faces must be adjacent")
    }

    #[must_use]
    pub fn is_adjacent(self, other: Face) -> bool {
        self.neighbors().contains(&other)
    }

    /// Short notation name, e.g. `"BR"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        ["F", "U", "R", "D", "L", "BR", "BL", "BU", "BD", "B", "UL", "UR"][self.index()]
    }

    /// Spelled-out name used in instructions, e.g. `"Back-Right"`.
    #[must_use]
    pub fn long_name(self) -> &'static str {
        [
            "Front",
            "Up",
            "Right",
            "Down",
            "Left",
            "Back-Right",
            "Back-Left",
            "Back-Up",
            "Back-Down",
            "Back",
            "Up-Left",
            "Up-Right",
        ][self.index()]
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Face> {
        FACE_BY_NAME.get(name).copied()
    }
}

impl ColorLabel {
    pub const ALL: [ColorLabel; 12] = {
        use ColorLabel::{
            Blue, Brown, Gray, Green, LightBlue, LightGreen, Orange, Pink, Purple, Red, White,
            Yellow,
        };
        [
            White, Yellow, Red, Orange, Green, Blue, Purple, Pink, LightBlue, LightGreen, Brown,
            Gray,
        ]
    };

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// # Panics
    ///
    /// If `index` is not below 12.
    #[must_use]
    pub fn from_index(index: usize) -> ColorLabel {
        ColorLabel::ALL[index]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        [
            "White",
            "Yellow",
            "Red",
            "Orange",
            "Green",
            "Blue",
            "Purple",
            "Pink",
            "Light Blue",
            "Light Green",
            "Brown",
            "Gray",
        ][self.index()]
    }

    /// Case- and whitespace-insensitive label lookup ("light blue",
    /// "LightBlue", "LIGHTBLUE" all parse).
    #[must_use]
    pub fn parse(name: &str) -> Option<ColorLabel> {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        COLOR_BY_NAME.get(key.as_str()).copied()
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

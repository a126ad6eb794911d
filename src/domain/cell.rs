/// Cell types and their properties.
/// Glyph parsing and formatting live here,
/// so the level codec never matches on raw chars.
///
/// ## Glyph legend (level files):
///   '-' = Air          '#' = Wall        '=' = Dark wall
///   '^' = Spike        '*' = Coin        'E' = Exit
///   '@' = Player spawn '&' = Enemy spawn

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Cell {
    Air,
    Wall,     // Solid
    WallDark, // Decorative background wall, passable
    Spike,    // Kills on contact
    Coin,     // Pickup target
    Exit,     // Level goal, opens when the timer runs out
    Player,   // Spawn marker, consumed on spawn
    Enemy,    // Spawn marker, consumed on spawn
}

impl Cell {
    pub const ALL: [Cell; 8] = [
        Cell::Air,
        Cell::Wall,
        Cell::WallDark,
        Cell::Spike,
        Cell::Coin,
        Cell::Exit,
        Cell::Player,
        Cell::Enemy,
    ];

    /// Single-character representation used by the encoded level format.
    pub fn glyph(self) -> char {
        match self {
            Cell::Air => '-',
            Cell::Wall => '#',
            Cell::WallDark => '=',
            Cell::Spike => '^',
            Cell::Coin => '*',
            Cell::Exit => 'E',
            Cell::Player => '@',
            Cell::Enemy => '&',
        }
    }

    /// Parse a glyph. Inverse of `glyph()`.
    pub fn from_glyph(ch: char) -> Option<Cell> {
        match ch {
            '-' => Some(Cell::Air),
            '#' => Some(Cell::Wall),
            '=' => Some(Cell::WallDark),
            '^' => Some(Cell::Spike),
            '*' => Some(Cell::Coin),
            'E' => Some(Cell::Exit),
            '@' => Some(Cell::Player),
            '&' => Some(Cell::Enemy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_mapping_is_bijective() {
        for cell in Cell::ALL {
            assert_eq!(Cell::from_glyph(cell.glyph()), Some(cell));
        }
        let mut glyphs: Vec<char> = Cell::ALL.iter().map(|c| c.glyph()).collect();
        glyphs.sort();
        glyphs.dedup();
        assert_eq!(glyphs.len(), Cell::ALL.len());
    }

    #[test]
    fn air_has_one_glyph() {
        assert_eq!(Cell::from_glyph('-'), Some(Cell::Air));
        assert_eq!(Cell::from_glyph(' '), None);
        assert_eq!(Cell::Air.glyph(), '-');
    }

    #[test]
    fn unknown_glyph_rejected() {
        assert_eq!(Cell::from_glyph('W'), None);
        assert_eq!(Cell::from_glyph('|'), None);
        assert_eq!(Cell::from_glyph('3'), None);
    }
}
